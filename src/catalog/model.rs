use std::collections::BTreeMap;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::env::{expand_placeholders, EnvMap, PlaceholderError};

const SUPPORTED_METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];

/// One entry of an endpoint catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub route: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Kept in file order; scalar values are sent as their text.
    #[serde(default)]
    pub query_params: Map<String, Value>,
    #[serde(default)]
    pub body: Option<Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl EndpointDescriptor {
    pub fn get(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            method: default_method(),
            headers: BTreeMap::new(),
            query_params: Map::new(),
            body: None,
        }
    }

    pub fn http_method(&self) -> Option<Method> {
        let upper = self.method.trim().to_ascii_uppercase();
        if SUPPORTED_METHODS.contains(&upper.as_str()) {
            Method::from_bytes(upper.as_bytes()).ok()
        } else {
            None
        }
    }

    /// Query pairs as sent on the wire, in catalog order.
    pub fn query_pairs(&self) -> Vec<(&str, String)> {
        self.query_params
            .iter()
            .map(|(name, value)| {
                let text = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                (name.as_str(), text)
            })
            .collect()
    }

    /// Body to send, if any. `null` and `{}` mean "no body".
    pub fn payload(&self) -> Option<&Value> {
        match &self.body {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) if map.is_empty() => None,
            Some(value) => Some(value),
        }
    }

    /// Expands `{KEY}` placeholders in the route, header and query values and
    /// every string inside the body. The route used as the results key stays
    /// the catalog's literal route; only the copy sent on the wire changes.
    pub fn resolve(&self, env: &EnvMap) -> Result<EndpointDescriptor, PlaceholderError> {
        Ok(EndpointDescriptor {
            route: expand_placeholders(&self.route, env)?,
            method: self.method.clone(),
            headers: expand_map(&self.headers, env)?,
            query_params: expand_object(&self.query_params, env)?,
            body: self
                .body
                .as_ref()
                .map(|body| expand_value(body, env))
                .transpose()?,
        })
    }
}

fn expand_map(
    map: &BTreeMap<String, String>,
    env: &EnvMap,
) -> Result<BTreeMap<String, String>, PlaceholderError> {
    map.iter()
        .map(|(key, value)| Ok((key.clone(), expand_placeholders(value, env)?)))
        .collect()
}

fn expand_value(value: &Value, env: &EnvMap) -> Result<Value, PlaceholderError> {
    Ok(match value {
        Value::String(text) => Value::String(expand_placeholders(text, env)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| expand_value(item, env))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => Value::Object(expand_object(map, env)?),
        other => other.clone(),
    })
}

fn expand_object(
    map: &Map<String, Value>,
    env: &EnvMap,
) -> Result<Map<String, Value>, PlaceholderError> {
    map.iter()
        .map(|(key, item)| Ok((key.clone(), expand_value(item, env)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn missing_fields_take_defaults() {
        let descriptor: EndpointDescriptor =
            serde_json::from_value(json!({"route": "/health"})).unwrap();
        assert_eq!(descriptor, EndpointDescriptor::get("/health"));
        assert_eq!(descriptor.http_method(), Some(Method::GET));
        assert!(descriptor.payload().is_none());
    }

    #[test]
    fn http_method_accepts_lowercase_and_rejects_unknown() {
        let mut descriptor = EndpointDescriptor::get("/x");
        descriptor.method = "patch".to_string();
        assert_eq!(descriptor.http_method(), Some(Method::PATCH));

        descriptor.method = "TRACE".to_string();
        assert_eq!(descriptor.http_method(), None);
    }

    #[test]
    fn empty_object_body_is_not_sent() {
        let mut descriptor = EndpointDescriptor::get("/x");
        descriptor.body = Some(json!({}));
        assert!(descriptor.payload().is_none());

        descriptor.body = Some(json!({"a": 1}));
        assert_eq!(descriptor.payload(), Some(&json!({"a": 1})));
    }

    #[test]
    fn resolve_expands_nested_strings() {
        let env: EnvMap = [("TENANT".to_string(), "acme".to_string())]
            .into_iter()
            .collect();
        let descriptor: EndpointDescriptor = serde_json::from_value(json!({
            "route": "/tenants/{TENANT}",
            "method": "POST",
            "headers": {"X-Tenant": "{TENANT}"},
            "query_params": {"tenant": "{TENANT}"},
            "body": {"owner": {"tenant": "{TENANT}"}, "tags": ["{TENANT}", 1]}
        }))
        .unwrap();

        let resolved = descriptor.resolve(&env).unwrap();
        assert_eq!(resolved.route, "/tenants/acme");
        assert_eq!(resolved.headers["X-Tenant"], "acme");
        assert_eq!(resolved.query_params["tenant"], "acme");
        assert_eq!(
            resolved.body,
            Some(json!({"owner": {"tenant": "acme"}, "tags": ["acme", 1]}))
        );
    }

    #[test]
    fn query_pairs_follow_file_order() {
        let descriptor: EndpointDescriptor = serde_json::from_str(
            r#"{"route": "/search", "query_params": {"z": "last", "a": 1, "m": true}}"#,
        )
        .unwrap();

        assert_eq!(
            descriptor.query_pairs(),
            vec![
                ("z", "last".to_string()),
                ("a", "1".to_string()),
                ("m", "true".to_string())
            ]
        );
    }
}
