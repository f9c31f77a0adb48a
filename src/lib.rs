pub mod app;
pub mod catalog;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod outcome;
pub mod storage;
pub mod usecases;

pub use config::Config;
pub use error::{Error, Result};
pub use outcome::{Failure, FailureKind, Outcome};
