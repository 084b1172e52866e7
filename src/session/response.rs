use reqwest::Response;
use serde_json::{Map, Value};

use crate::error::{ProbeError, Result, Stage};

/// Fails with `Http` on a non-2xx status, otherwise returns the body as a JSON
/// object. A body that is not a JSON object reads as empty.
pub(super) async fn success_body(
    response: Response,
    stage: Stage,
    url: &str,
) -> Result<Map<String, Value>> {
    let status = response.status();
    let text = response.text().await.map_err(|source| ProbeError::Network {
        stage,
        url: url.to_string(),
        source,
    })?;

    if !status.is_success() {
        return Err(ProbeError::Http {
            stage,
            url: url.to_string(),
            status: status.as_u16(),
            body: text,
        });
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Ok(Map::new()),
    }
}

/// Reads an identifier field: non-empty strings as-is, numbers as their text.
pub(super) fn identifier(body: &Map<String, Value>, field: &str) -> Option<String> {
    match body.get(field)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

pub(super) fn network(stage: Stage, url: &str) -> impl FnOnce(reqwest::Error) -> ProbeError + '_ {
    move |source| ProbeError::Network {
        stage,
        url: url.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identifier_accepts_strings_and_numbers() {
        let body = json!({"a": "abc", "b": 42, "c": "", "d": null, "e": {"x": 1}});
        let body = body.as_object().unwrap();

        assert_eq!(identifier(body, "a").as_deref(), Some("abc"));
        assert_eq!(identifier(body, "b").as_deref(), Some("42"));
        assert_eq!(identifier(body, "c"), None);
        assert_eq!(identifier(body, "d"), None);
        assert_eq!(identifier(body, "e"), None);
        assert_eq!(identifier(body, "missing"), None);
    }
}
