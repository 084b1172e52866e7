use std::path::PathBuf;

use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::{Map, Value};

use super::clock::millis_to_secs;

/// Outcome bucket of a call that produced an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBucket {
    Ok,
    ServerError,
    Other,
}

impl StatusBucket {
    pub fn classify(status: u16) -> Self {
        match status {
            200 => StatusBucket::Ok,
            500 => StatusBucket::ServerError,
            _ => StatusBucket::Other,
        }
    }
}

/// Statuses whose response body is worth keeping in the results.
pub fn retains_response(status: u16) -> bool {
    matches!(status, 200 | 400 | 500)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    pub query_param: Map<String, Value>,
    pub request_body: Value,
    pub status_code: u16,
    pub response_time_sec: f64,
    pub response: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CallOutcome {
    Completed(CallRecord),
    Failed { error: String },
}

impl CallOutcome {
    pub fn record(&self) -> Option<&CallRecord> {
        match self {
            CallOutcome::Completed(record) => Some(record),
            CallOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CallOutcome::Completed(_) => None,
            CallOutcome::Failed { error } => Some(error),
        }
    }
}

/// Call outcomes keyed by route, in catalog order. Writing a route twice
/// replaces the earlier outcome but keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallResults {
    entries: Vec<(String, CallOutcome)>,
}

impl CallResults {
    pub fn insert(&mut self, route: &str, outcome: CallOutcome) {
        match self.entries.iter_mut().find(|(existing, _)| existing == route) {
            Some((_, slot)) => *slot = outcome,
            None => self.entries.push((route.to_string(), outcome)),
        }
    }

    pub fn get(&self, route: &str) -> Option<&CallOutcome> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == route)
            .map(|(_, outcome)| outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CallOutcome)> {
        self.entries
            .iter()
            .map(|(route, outcome)| (route.as_str(), outcome))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CallResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (route, outcome) in &self.entries {
            map.serialize_entry(route, outcome)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusLog {
    #[serde(rename = "200")]
    pub ok: Vec<String>,
    #[serde(rename = "500")]
    pub server_error: Vec<String>,
    #[serde(rename = "Other")]
    pub other: Map<String, Value>,
}

impl StatusLog {
    pub fn record(&mut self, route: &str, status: u16) {
        match StatusBucket::classify(status) {
            StatusBucket::Ok => self.ok.push(route.to_string()),
            StatusBucket::ServerError => self.server_error.push(route.to_string()),
            StatusBucket::Other => {
                self.other
                    .insert(route.to_string(), Value::String(status.to_string()));
            }
        }
    }
}

/// Everything one pass over the catalog produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub results: CallResults,
    pub status_log: StatusLog,
    pub total_elapsed_ms: u64,
    pub failures: usize,
}

impl RunReport {
    pub fn total_elapsed_secs(&self) -> f64 {
        millis_to_secs(self.total_elapsed_ms)
    }

    pub fn responses_document(&self, microservice: &str, env: &str) -> Value {
        tagged(&self.results, microservice, env)
    }

    pub fn status_document(&self, microservice: &str, env: &str) -> Value {
        tagged(&self.status_log, microservice, env)
    }
}

/// Keys added next to the routes in both result documents.
pub const MICROSERVICE_TAG: &str = "microservice";
pub const ENV_TAG: &str = "env";

fn tagged<T: Serialize>(value: &T, microservice: &str, env: &str) -> Value {
    let mut document = match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    document.insert(
        MICROSERVICE_TAG.to_string(),
        Value::String(microservice.to_string()),
    );
    document.insert(ENV_TAG.to_string(), Value::String(env.to_string()));
    Value::Object(document)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFiles {
    pub responses: PathBuf,
    pub status: PathBuf,
}

/// What the console and the batch loop see of a finished pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub microservice: String,
    pub env: String,
    pub total_elapsed_secs: f64,
    pub ok: usize,
    pub server_error: usize,
    pub other: usize,
    pub failures: usize,
    pub files: ResultFiles,
}

impl RunSummary {
    pub fn new(microservice: &str, env: &str, report: &RunReport, files: ResultFiles) -> Self {
        Self {
            microservice: microservice.to_string(),
            env: env.to_string(),
            total_elapsed_secs: report.total_elapsed_secs(),
            ok: report.status_log.ok.len(),
            server_error: report.status_log.server_error.len(),
            other: report.status_log.other.len(),
            failures: report.failures,
            files,
        }
    }
}
