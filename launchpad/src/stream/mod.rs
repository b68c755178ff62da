//! Log streaming module

pub mod connection;
pub mod payload;
pub mod socket;
