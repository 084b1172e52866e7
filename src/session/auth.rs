use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use tracing::{debug, info};

use crate::{
    config::RunConfig,
    error::{ProbeError, Result, Stage},
};

use super::{
    context::CallContext,
    response::{identifier, network, success_body},
};

/// Exchanges the configured form credentials for a bearer token.
pub async fn authenticate(client: &Client, config: &RunConfig) -> Result<CallContext> {
    let url = config.auth_url.as_str();
    debug!(url, "requesting access token");

    let response = client
        .post(url)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(AUTHORIZATION, config.auth_basic_header.as_str())
        .form(&config.auth_payload)
        .send()
        .await
        .map_err(network(Stage::Authentication, url))?;

    let body = success_body(response, Stage::Authentication, url).await?;
    let token = identifier(&body, "access_token").ok_or_else(|| ProbeError::MissingCredential {
        url: url.to_string(),
    })?;

    info!("authentication successful, bearer token obtained");
    Ok(CallContext::new(token))
}
