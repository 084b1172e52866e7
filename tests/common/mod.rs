#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU32, Ordering},
    time::{Duration, Instant},
};

use apiprobe::{
    config::{RunConfig, SessionProtocol},
    executor::Clock,
};
use serde_json::{Map, Value};

pub const BASIC_HEADER: &str = "Basic dXNlcjpwYXNz";

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

pub fn run_config(base_url: &str, auth_url: &str, session_url: &str) -> RunConfig {
    let mut auth_payload = BTreeMap::new();
    auth_payload.insert("username".to_string(), "user".to_string());
    auth_payload.insert("password".to_string(), "pass".to_string());

    RunConfig {
        microservice: "orders".to_string(),
        env: "dev".to_string(),
        base_url: base_url.to_string(),
        auth_url: auth_url.to_string(),
        session_manager_url: session_url.to_string(),
        auth_payload,
        auth_basic_header: BASIC_HEADER.to_string(),
        session: SessionProtocol::Simple {
            payload: object(serde_json::json!({"channel": "web"})),
        },
    }
}

/// Advances by a fixed step on every reading.
pub struct SteppingClock {
    origin: Instant,
    step: Duration,
    ticks: AtomicU32,
}

impl SteppingClock {
    pub fn new(step: Duration) -> Self {
        Self {
            origin: Instant::now(),
            step,
            ticks: AtomicU32::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Instant {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.origin + self.step * tick
    }
}
