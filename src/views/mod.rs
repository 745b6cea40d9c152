//! Pure projections over activity lists. Nothing in here touches the database.

pub mod grouping;
pub mod map;
pub mod weekly;
