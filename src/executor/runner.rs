use std::{collections::BTreeMap, error::Error as _};

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client, Method, RequestBuilder,
};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::{
    catalog::EndpointDescriptor,
    env::EnvMap,
    session::CallContext,
};

use super::{
    clock::{elapsed_millis, millis_to_secs, Clock, SystemClock},
    models::{retains_response, CallOutcome, CallRecord, RunReport},
};

/// Calls every catalog entry in order against one deployment.
pub struct Runner<'a> {
    client: &'a Client,
    base_url: &'a str,
    context: &'a CallContext,
    default_headers: &'a BTreeMap<String, String>,
    env: Option<&'a EnvMap>,
    clock: &'a dyn Clock,
}

struct Completed {
    status: u16,
    elapsed_ms: u64,
    record: CallRecord,
}

static NO_HEADERS: BTreeMap<String, String> = BTreeMap::new();

impl<'a> Runner<'a> {
    pub fn new(client: &'a Client, base_url: &'a str, context: &'a CallContext) -> Self {
        Self {
            client,
            base_url,
            context,
            default_headers: &NO_HEADERS,
            env: None,
            clock: &SystemClock,
        }
    }

    /// Values used to expand `{KEY}` placeholders in descriptors.
    pub fn with_env(mut self, env: &'a EnvMap) -> Self {
        self.env = Some(env);
        self
    }

    /// Headers sent on every call. The call context and then the descriptor's
    /// own headers replace entries with the same name.
    pub fn with_default_headers(mut self, headers: &'a BTreeMap<String, String>) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    pub async fn run(&self, catalog: &[EndpointDescriptor]) -> RunReport {
        let mut report = RunReport::default();

        for descriptor in catalog {
            let route = descriptor.route.as_str();
            match self.call(descriptor).await {
                Ok(completed) => {
                    info!(
                        route,
                        method = %descriptor.method,
                        status = completed.status,
                        time_sec = completed.record.response_time_sec,
                        "endpoint called"
                    );
                    report.status_log.record(route, completed.status);
                    report.total_elapsed_ms += completed.elapsed_ms;
                    report
                        .results
                        .insert(route, CallOutcome::Completed(completed.record));
                }
                Err(error) => {
                    warn!(route, method = %descriptor.method, %error, "endpoint call failed");
                    report.failures += 1;
                    report.results.insert(route, CallOutcome::Failed { error });
                }
            }
        }

        report
    }

    async fn call(&self, descriptor: &EndpointDescriptor) -> Result<Completed, String> {
        let resolved = match self.env {
            Some(env) => descriptor.resolve(env).map_err(|err| err.to_string())?,
            None => descriptor.clone(),
        };
        let method = resolved
            .http_method()
            .ok_or_else(|| format!("unsupported HTTP method {}", resolved.method))?;
        let request = self.request(method, &resolved)?;

        let start = self.clock.now();
        let response = request.send().await.map_err(|err| describe(&err))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|err| describe(&err))?;
        let elapsed_ms = elapsed_millis(start, self.clock.now());

        let response = if retains_response(status.as_u16()) {
            parse_body(&bytes)
        } else {
            Value::Object(Map::new())
        };

        Ok(Completed {
            status: status.as_u16(),
            elapsed_ms,
            record: CallRecord {
                query_param: resolved.query_params,
                request_body: resolved.body.unwrap_or(Value::Null),
                status_code: status.as_u16(),
                response_time_sec: millis_to_secs(elapsed_ms),
                response,
            },
        })
    }
}

impl Runner<'_> {
    fn request(
        &self,
        method: Method,
        resolved: &EndpointDescriptor,
    ) -> Result<RequestBuilder, String> {
        let mut headers = HeaderMap::new();
        insert_headers(&mut headers, self.default_headers)?;
        self.context
            .insert_into(&mut headers)
            .map_err(|err| format!("invalid credential header: {err}"))?;
        insert_headers(&mut headers, &resolved.headers)?;

        let url = join_url(self.base_url, &resolved.route);
        let mut request = self.client.request(method, &url).headers(headers);
        if !resolved.query_params.is_empty() {
            request = request.query(&resolved.query_pairs());
        }
        if let Some(body) = resolved.payload() {
            request = request.json(body);
        }
        Ok(request)
    }
}

fn insert_headers(
    target: &mut HeaderMap,
    headers: &BTreeMap<String, String>,
) -> Result<(), String> {
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| format!("invalid header name {name:?}"))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| format!("invalid value for header {name}"))?;
        target.insert(header_name, header_value);
    }
    Ok(())
}

fn join_url(base_url: &str, route: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        route.trim_start_matches('/')
    )
}

fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Object(Map::new());
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Flattens an error and its sources into one line.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(
            join_url("https://api.example.com/", "/v1/items"),
            "https://api.example.com/v1/items"
        );
        assert_eq!(
            join_url("https://api.example.com", "v1/items"),
            "https://api.example.com/v1/items"
        );
        assert_eq!(
            join_url("https://api.example.com/base/", "/x"),
            "https://api.example.com/base/x"
        );
    }

    #[test]
    fn descriptor_headers_replace_defaults_and_credentials() {
        use reqwest::header::{ACCEPT, AUTHORIZATION};

        let client = Client::new();
        let context = CallContext::new("tok").with_session("abc");
        let defaults: BTreeMap<String, String> = [
            ("Accept".to_string(), "application/json".to_string()),
            ("X-Bear-Session-Token".to_string(), "from-settings".to_string()),
        ]
        .into_iter()
        .collect();
        let descriptor: EndpointDescriptor = serde_json::from_value(json!({
            "route": "/items",
            "headers": {"accept": "text/plain", "Authorization": "Bearer override"}
        }))
        .unwrap();

        let request = Runner::new(&client, "http://localhost", &context)
            .with_default_headers(&defaults)
            .request(Method::GET, &descriptor)
            .unwrap()
            .build()
            .unwrap();
        let headers = request.headers();

        assert_eq!(
            headers.get_all(ACCEPT).iter().collect::<Vec<_>>(),
            vec!["text/plain"]
        );
        assert_eq!(
            headers.get_all(AUTHORIZATION).iter().collect::<Vec<_>>(),
            vec!["Bearer override"]
        );
        assert_eq!(
            headers.get_all("x-bear-session-token").iter().collect::<Vec<_>>(),
            vec!["abc"]
        );
    }

    #[test]
    fn query_follows_catalog_order() {
        let client = Client::new();
        let context = CallContext::new("tok");
        let descriptor: EndpointDescriptor = serde_json::from_str(
            r#"{"route": "/search", "query_params": {"q": "rust", "page": 2, "after": "x"}}"#,
        )
        .unwrap();

        let request = Runner::new(&client, "http://localhost/", &context)
            .request(Method::GET, &descriptor)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "http://localhost/search?q=rust&page=2&after=x"
        );
    }

    #[test]
    fn invalid_descriptor_header_is_reported() {
        let client = Client::new();
        let context = CallContext::new("tok");
        let mut descriptor = EndpointDescriptor::get("/x");
        descriptor
            .headers
            .insert("bad header".to_string(), "v".to_string());

        let err = Runner::new(&client, "http://localhost", &context)
            .request(Method::GET, &descriptor)
            .unwrap_err();
        assert!(err.contains("bad header"));
    }

    #[test]
    fn parse_body_handles_json_text_and_empty() {
        assert_eq!(parse_body(br#"{"ok":true}"#), json!({"ok": true}));
        assert_eq!(parse_body(b"  \n"), json!({}));
        assert_eq!(parse_body(b"Internal Error"), json!("Internal Error"));
    }
}
