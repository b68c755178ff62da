//! Control server wire models

pub mod models;
