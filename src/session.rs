use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::dispatch::{Dispatcher, Reply, normalize_host};
use crate::domain::Credentials;
use crate::error::CidError;
use crate::formats::FormatRegistry;
use crate::service::CidMetadataService;
use crate::transport::{Transport, Verb};
use crate::workspace::Workspace;

pub const AUTHENTICATE_RESOURCE: &str = "authenticate.php";
pub const TOKEN_FIELD: &str = "httpHeaderValue";

#[derive(Clone)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn open<T: Transport>(
        dispatcher: &Dispatcher<T>,
        credentials: &Credentials,
    ) -> Result<Self, CidError> {
        info!(host = dispatcher.host(), username = %credentials.username, "CID connect");
        let params = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ];
        let reply = dispatcher
            .send(AUTHENTICATE_RESOURCE, Verb::Post, &params, None)
            .map_err(|err| {
                warn!(host = dispatcher.host(), error = %err, "CID login rejected");
                CidError::Connect(err.to_string())
            })?;
        let token = extract_token(&reply)?;
        Ok(Self { token })
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

fn extract_token(reply: &Reply) -> Result<String, CidError> {
    let body = reply
        .json()
        .map_err(|err| CidError::Connect(err.to_string()))?;
    match body.get(TOKEN_FIELD) {
        Some(Value::String(token)) => Ok(token.clone()),
        Some(_) => Err(CidError::Connect(format!("{TOKEN_FIELD} is not a string"))),
        None => Err(CidError::Connect(format!(
            "login response has no {TOKEN_FIELD}"
        ))),
    }
}

/// One connected service per (host, username, password). Failed logins are not cached.
pub struct CidServiceBuilder<T: Transport + Clone> {
    transport: T,
    workspace: Workspace,
    formats: Arc<dyn FormatRegistry>,
    services: Mutex<HashMap<Credentials, Arc<CidMetadataService<T>>>>,
}

impl<T: Transport + Clone> CidServiceBuilder<T> {
    pub fn new(transport: T, workspace: Workspace, formats: Arc<dyn FormatRegistry>) -> Self {
        Self {
            transport,
            workspace,
            formats,
            services: Mutex::new(HashMap::new()),
        }
    }

    pub fn build(
        &self,
        host: &str,
        username: &str,
        password: &str,
    ) -> Result<Arc<CidMetadataService<T>>, CidError> {
        let credentials = Credentials::new(normalize_host(host), username, password);
        // Held across the login: one caller per builder is assumed, so a slow
        // login stalls builds for every other triple until the transport times out.
        let mut services = self
            .services
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(service) = services.get(&credentials) {
            debug!(host, username, "reusing CID session");
            return Ok(Arc::clone(service));
        }

        let service = Arc::new(CidMetadataService::connect(
            self.transport.clone(),
            credentials.clone(),
            self.workspace.clone(),
            Arc::clone(&self.formats),
        )?);
        services.insert(credentials, Arc::clone(&service));
        Ok(service)
    }

    pub fn session_count(&self) -> usize {
        self.services
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
