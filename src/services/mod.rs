//! SQL access. Every function borrows the request's connection; none of them
//! holds on to a pool.

pub mod activities;
pub mod import;
pub mod todos;
pub mod trips;
