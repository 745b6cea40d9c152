use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// One field of a partial JSON update.
///
/// `Absent` means the key was not sent and the stored value stays, `Null`
/// means the client sent `null` and wants an optional field cleared, `Value`
/// overwrites. Fields using it must carry `#[serde(default)]` so a missing
/// key lands on `Absent`.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

impl<T> Patch<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Absent => Patch::Absent,
            Patch::Null => Patch::Null,
            Patch::Value(value) => Patch::Value(f(value)),
        }
    }

    /// Converts the carried value, keeping `Absent`/`Null` as they are.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Patch<U>, E> {
        Ok(match self {
            Patch::Absent => Patch::Absent,
            Patch::Null => Patch::Null,
            Patch::Value(value) => Patch::Value(f(value)?),
        })
    }

    /// Applies the patch to a nullable field.
    pub fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Patch::Absent => {}
            Patch::Null => *slot = None,
            Patch::Value(value) => *slot = Some(value),
        }
    }

    /// Applies the patch to a non-nullable field; `null` is rejected.
    pub fn apply_required(self, slot: &mut T, field: &str) -> Result<(), AppError> {
        match self {
            Patch::Absent => Ok(()),
            Patch::Null => Err(AppError::bad_request(format!("{field} cannot be null"))),
            Patch::Value(value) => {
                *slot = value;
                Ok(())
            }
        }
    }
}
