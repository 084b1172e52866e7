use std::collections::BTreeMap;

use serde_json::{Map, Value};
use url::Url;

use crate::{
    env::EnvMap,
    error::{ProbeError, Result},
};

pub const BASE_URL: &str = "BASE_URL";
pub const AUTH_URL: &str = "AUTH_URL";
pub const SESSION_MANAGER_URL: &str = "SESSION_MANAGER_URL";
pub const AUTH_PAYLOAD: &str = "AUTH_PAYLOAD";
pub const AUTH_BASIC_AUTH_HEADER: &str = "AUTH_BASIC_AUTH_HEADER";
pub const SESSION_MANAGER_PAYLOAD: &str = "SESSION_MANAGER_PAYLOAD";
pub const GOLIA_SESSION_MANAGER_CREATE_PAYLOAD: &str = "GOLIA_SESSION_MANAGER_CREATE_PAYLOAD";
pub const GOLIA_SESSION_MANAGER_UPDATE_PAYLOAD: &str = "GOLIA_SESSION_MANAGER_UPDATE_PAYLOAD";

const GOLIA: &str = "golia";

/// Which catalog and session protocol a microservice uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceFlavor {
    Standard,
    Golia,
}

impl ServiceFlavor {
    pub fn for_microservice(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case(GOLIA) {
            ServiceFlavor::Golia
        } else {
            ServiceFlavor::Standard
        }
    }

    pub fn required_keys(self) -> Vec<&'static str> {
        let mut keys = vec![
            BASE_URL,
            AUTH_URL,
            SESSION_MANAGER_URL,
            AUTH_PAYLOAD,
            AUTH_BASIC_AUTH_HEADER,
        ];
        match self {
            ServiceFlavor::Standard => keys.push(SESSION_MANAGER_PAYLOAD),
            ServiceFlavor::Golia => keys.extend([
                GOLIA_SESSION_MANAGER_CREATE_PAYLOAD,
                GOLIA_SESSION_MANAGER_UPDATE_PAYLOAD,
            ]),
        }
        keys
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionProtocol {
    /// One POST to the session manager; the id comes back as `sessionId`.
    Simple { payload: Map<String, Value> },
    /// Create at `/api/session` (id in `payload`), then bind the customer at
    /// `/api/session/customer/{id}`.
    TwoStep {
        create_payload: Map<String, Value>,
        update_payload: Map<String, Value>,
    },
}

/// Everything one pipeline run needs, resolved once per pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub microservice: String,
    pub env: String,
    pub base_url: String,
    pub auth_url: String,
    pub session_manager_url: String,
    pub auth_payload: BTreeMap<String, String>,
    pub auth_basic_header: String,
    pub session: SessionProtocol,
}

impl RunConfig {
    pub fn flavor(&self) -> ServiceFlavor {
        ServiceFlavor::for_microservice(&self.microservice)
    }

    pub fn from_env_map(microservice: &str, env: &str, values: &EnvMap) -> Result<Self> {
        let flavor = ServiceFlavor::for_microservice(microservice);

        let missing: Vec<String> = flavor
            .required_keys()
            .into_iter()
            .filter(|key| lookup(values, key).is_none())
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(ProbeError::MissingSettings { keys: missing });
        }

        let session = match flavor {
            ServiceFlavor::Standard => SessionProtocol::Simple {
                payload: json_object(values, SESSION_MANAGER_PAYLOAD)?,
            },
            ServiceFlavor::Golia => SessionProtocol::TwoStep {
                create_payload: json_object(values, GOLIA_SESSION_MANAGER_CREATE_PAYLOAD)?,
                update_payload: json_object(values, GOLIA_SESSION_MANAGER_UPDATE_PAYLOAD)?,
            },
        };

        Ok(RunConfig {
            microservice: microservice.to_string(),
            env: env.to_string(),
            base_url: absolute_url(values, BASE_URL)?,
            auth_url: absolute_url(values, AUTH_URL)?,
            session_manager_url: absolute_url(values, SESSION_MANAGER_URL)?,
            auth_payload: form_fields(json_object(values, AUTH_PAYLOAD)?),
            auth_basic_header: required(values, AUTH_BASIC_AUTH_HEADER)?.to_string(),
            session,
        })
    }
}

fn lookup<'a>(values: &'a EnvMap, key: &str) -> Option<&'a str> {
    values
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn required<'a>(values: &'a EnvMap, key: &str) -> Result<&'a str> {
    lookup(values, key).ok_or_else(|| ProbeError::MissingSettings {
        keys: vec![key.to_string()],
    })
}

fn absolute_url(values: &EnvMap, key: &str) -> Result<String> {
    let raw = required(values, key)?;
    Url::parse(raw).map_err(|err| ProbeError::InvalidSetting {
        key: key.to_string(),
        message: format!("{raw:?} is not an absolute URL ({err})"),
    })?;
    Ok(raw.to_string())
}

fn json_object(values: &EnvMap, key: &str) -> Result<Map<String, Value>> {
    let raw = required(values, key)?;
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ProbeError::InvalidSetting {
            key: key.to_string(),
            message: "expected a JSON object".to_string(),
        }),
        Err(err) => Err(ProbeError::InvalidSetting {
            key: key.to_string(),
            message: err.to_string(),
        }),
    }
}

fn form_fields(map: Map<String, Value>) -> BTreeMap<String, String> {
    map.into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(text) => text,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect()
}
