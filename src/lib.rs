pub mod catalog;
pub mod config;
pub mod env;
pub mod error;
pub mod executor;
pub mod logging;
pub mod pipeline;
pub mod session;

pub use error::{ProbeError, Result, Stage};
pub use pipeline::{execute, run_pair, PairRequest};
