mod clock;
mod models;
mod printer;
mod runner;
mod writer;

pub use clock::{Clock, SystemClock};
pub use models::{
    retains_response, CallOutcome, CallRecord, CallResults, ResultFiles, RunReport, RunSummary,
    StatusBucket, StatusLog, ENV_TAG, MICROSERVICE_TAG,
};
pub use printer::{print_pair_failure, print_run_summary};
pub use runner::Runner;
pub use writer::{responses_file_name, status_file_name, to_pretty_json, write_results};
