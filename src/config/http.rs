use std::{collections::BTreeMap, time::Duration};

use reqwest::Client;

use crate::error::{ProbeError, Result};

pub const DEFAULT_USER_AGENT: &str = concat!("apiprobe/", env!("CARGO_PKG_VERSION"));

/// Transport settings shared by every request of a run.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub timeout: Option<Duration>,
    pub accept_invalid_certs: bool,
    pub user_agent: String,
    pub default_headers: BTreeMap<String, String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            accept_invalid_certs: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_headers: BTreeMap::new(),
        }
    }
}

impl HttpOptions {
    pub fn build_client(&self) -> Result<Client> {
        let mut builder = Client::builder()
            .user_agent(self.user_agent.clone())
            .danger_accept_invalid_certs(self.accept_invalid_certs);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(|err| ProbeError::InvalidSetting {
            key: "http client".to_string(),
            message: err.to_string(),
        })
    }
}
