//! One smoke-test run for a (microservice, environment) pair.
//!
//! Settings and the catalog are loaded before any request is sent, so a bad
//! configuration never reaches the network. Authentication and session
//! failures abort the pair; individual endpoint failures only degrade their
//! own record.

use std::path::PathBuf;

use tracing::{info, info_span, Instrument};

use crate::{
    catalog::{load_catalog, EndpointDescriptor},
    config::{HttpOptions, RunConfig},
    env::{load_pair_env, EnvMap},
    error::Result,
    executor::{write_results, Clock, RunReport, RunSummary, Runner, SystemClock},
    session::{authenticate, create_session},
};

#[derive(Debug, Clone)]
pub struct PairRequest {
    pub microservice: String,
    pub env: String,
    /// Directory holding the `.env.{microservice}.{env}` files.
    pub config_dir: PathBuf,
    pub catalog_dir: PathBuf,
    pub results_dir: PathBuf,
    pub http: HttpOptions,
}

pub async fn run_pair(request: &PairRequest) -> Result<RunSummary> {
    let span = info_span!("pair", microservice = %request.microservice, env = %request.env);
    run_pair_inner(request).instrument(span).await
}

async fn run_pair_inner(request: &PairRequest) -> Result<RunSummary> {
    let values = load_pair_env(&request.config_dir, &request.microservice, &request.env)?;
    let config = RunConfig::from_env_map(&request.microservice, &request.env, &values)?;
    let catalog = load_catalog(&request.catalog_dir, config.flavor()).await?;

    let report = execute(&config, &catalog, &values, &request.http, &SystemClock).await?;

    let files = write_results(
        &request.results_dir,
        &report,
        &config.microservice,
        &config.env,
    )?;
    info!(
        total_time_sec = report.total_elapsed_secs(),
        failures = report.failures,
        "pair completed"
    );
    Ok(RunSummary::new(&config.microservice, &config.env, &report, files))
}

/// Authenticates, opens a session and calls the catalog.
pub async fn execute(
    config: &RunConfig,
    catalog: &[EndpointDescriptor],
    values: &EnvMap,
    http: &HttpOptions,
    clock: &dyn Clock,
) -> Result<RunReport> {
    let client = http.build_client()?;

    info!("authenticating");
    let authenticated = authenticate(&client, config).await?;

    info!(protocol = ?config.flavor(), "establishing session");
    let session_id = create_session(&client, config, &authenticated).await?;
    let context = authenticated.with_session(session_id);

    info!(endpoints = catalog.len(), "calling endpoints");
    let report = Runner::new(&client, &config.base_url, &context)
        .with_env(values)
        .with_default_headers(&http.default_headers)
        .with_clock(clock)
        .run(catalog)
        .await;

    Ok(report)
}
