//! Launchpad library
//!
//! Deployment session controller: validates a repository reference, asks the
//! build backend for a job, follows the job's log channel on a shared stream
//! connection and turns the streamed lines into a deployment phase.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod server;
pub mod storage;
pub mod stream;
pub mod utils;
