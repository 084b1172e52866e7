use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    config::{RunConfig, SessionProtocol},
    error::{ProbeError, Result, Stage},
};

use super::{
    context::CallContext,
    response::{identifier, network, success_body},
};

/// Opens an application session using the protocol configured for the
/// microservice and returns its id.
pub async fn create_session(
    client: &Client,
    config: &RunConfig,
    context: &CallContext,
) -> Result<String> {
    let session_id = match &config.session {
        SessionProtocol::Simple { payload } => {
            simple_session(client, &config.session_manager_url, payload, context).await?
        }
        SessionProtocol::TwoStep {
            create_payload,
            update_payload,
        } => {
            two_step_session(
                client,
                &config.session_manager_url,
                create_payload,
                update_payload,
                context,
            )
            .await?
        }
    };

    info!(session_id = %session_id, "session established");
    Ok(session_id)
}

async fn simple_session(
    client: &Client,
    url: &str,
    payload: &Map<String, Value>,
    context: &CallContext,
) -> Result<String> {
    let mut body = payload.clone();
    body.insert(
        "sessionId".to_string(),
        Value::String(Uuid::new_v4().to_string()),
    );

    let body = post_json(client, url, &body, context, Stage::SessionCreate).await?;
    identifier(&body, "sessionId").ok_or_else(|| ProbeError::MissingSession {
        url: url.to_string(),
        field: "sessionId",
    })
}

async fn two_step_session(
    client: &Client,
    base_url: &str,
    create_payload: &Map<String, Value>,
    update_payload: &Map<String, Value>,
    context: &CallContext,
) -> Result<String> {
    let base = base_url.trim_end_matches('/');

    let create_url = format!("{base}/api/session");
    let created = post_json(
        client,
        &create_url,
        create_payload,
        context,
        Stage::SessionCreate,
    )
    .await?;
    let session_id = identifier(&created, "payload").ok_or_else(|| ProbeError::MissingSession {
        url: create_url.clone(),
        field: "payload",
    })?;

    let update_url = format!("{base}/api/session/customer/{session_id}");
    post_json(
        client,
        &update_url,
        update_payload,
        context,
        Stage::SessionUpdate,
    )
    .await?;

    Ok(session_id)
}

async fn post_json(
    client: &Client,
    url: &str,
    body: &Map<String, Value>,
    context: &CallContext,
    stage: Stage,
) -> Result<Map<String, Value>> {
    debug!(url, %stage, "posting to session manager");
    let response = context
        .apply(client.post(url))
        .json(body)
        .send()
        .await
        .map_err(network(stage, url))?;
    success_body(response, stage, url).await
}
