//! Deployment session module

pub mod backend;
pub mod controller;
pub mod phase;
pub mod projects;
pub mod reference;
pub mod session;
