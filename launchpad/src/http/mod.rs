//! Build backend HTTP module

pub mod client;
pub mod projects;
