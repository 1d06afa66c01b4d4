use serde_json::Value;
use tracing::debug;

use crate::error::CidError;
use crate::transport::{Transport, Verb, WireRequest};

/// Header carrying the raw session token (no scheme prefix).
pub const AUTHORIZATION: &str = "Authorization";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    NoContent,
    Body(String),
}

impl Reply {
    pub fn is_no_content(&self) -> bool {
        matches!(self, Reply::NoContent)
    }

    pub fn json(&self) -> Result<Value, CidError> {
        match self {
            Reply::NoContent => Err(CidError::InvalidResponse(
                "expected a JSON body, got no content".to_string(),
            )),
            Reply::Body(body) => serde_json::from_str(body)
                .map_err(|err| CidError::InvalidResponse(err.to_string())),
        }
    }
}

pub fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('/').to_string()
}

pub struct Dispatcher<T: Transport> {
    host: String,
    transport: T,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(host: &str, transport: T) -> Self {
        Self {
            host: normalize_host(host),
            transport,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.host, resource.trim_start_matches('/'))
    }

    // `token` is `None` only for the login exchange.
    pub fn send(
        &self,
        resource: &str,
        verb: Verb,
        params: &[(&str, &str)],
        token: Option<&str>,
    ) -> Result<Reply, CidError> {
        let mut headers = Vec::new();
        if let Some(token) = token {
            headers.push((AUTHORIZATION.to_string(), token.to_string()));
        }
        let request = WireRequest {
            verb,
            url: self.url(resource),
            headers,
            form: params
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        };

        let response = self.transport.execute(&request)?;
        debug!(
            verb = %request.verb,
            url = %request.url,
            status = response.status,
            authenticated = token.is_some(),
            "CID request"
        );

        if !(200..300).contains(&response.status) {
            return Err(CidError::Status {
                status: response.status,
            });
        }
        if response.status == 204 {
            return Ok(Reply::NoContent);
        }
        Ok(Reply::Body(response.body))
    }
}
