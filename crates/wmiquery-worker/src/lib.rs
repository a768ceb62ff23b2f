//! # wmiquery-worker
//!
//! Providers such as COM connections must be created and used on a single
//! OS thread. [`AffinityWorker`] owns that thread and runs submitted jobs on
//! it one at a time; [`QueryService`] layers query execution and batch
//! loading on top.

pub mod config;
pub mod error;
pub mod service;
pub mod worker;

pub use config::ServiceConfig;
pub use error::WorkerError;
pub use service::{Provider, QueryService};
pub use worker::AffinityWorker;
