pub mod activity;
pub mod category;
pub mod formats;
pub mod patch;
pub mod todo;
pub mod trip;
