//! Build backend wire models

pub mod models;
