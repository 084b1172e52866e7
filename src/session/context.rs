use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue, AUTHORIZATION},
    RequestBuilder,
};

pub const SESSION_HEADER: &str = "X-BEAR-SESSION-TOKEN";

/// Credential and session id bound to every endpoint call of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    bearer_token: String,
    session_id: Option<String>,
}

impl CallContext {
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            bearer_token: bearer_token.into(),
            session_id: None,
        }
    }

    pub fn with_session(&self, session_id: impl Into<String>) -> Self {
        Self {
            bearer_token: self.bearer_token.clone(),
            session_id: Some(session_id.into()),
        }
    }

    pub fn bearer_token(&self) -> &str {
        &self.bearer_token
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Sets the bearer and session headers, replacing any values already in
    /// `headers`.
    pub fn insert_into(&self, headers: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", self.bearer_token))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        if let Some(id) = &self.session_id {
            headers.insert(
                HeaderName::from_static("x-bear-session-token"),
                HeaderValue::from_str(id)?,
            );
        }
        Ok(())
    }

    pub fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.bearer_auth(&self.bearer_token);
        match &self.session_id {
            Some(id) => builder.header(SESSION_HEADER, id),
            None => builder,
        }
    }
}
