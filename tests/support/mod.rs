use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cid_metadata::error::CidError;
use cid_metadata::transport::{Transport, WireRequest, WireResponse};

pub const HOST: &str = "https://cid.example.org/api";

#[derive(Default)]
struct Script {
    routes: HashMap<String, Result<WireResponse, String>>,
    requests: Vec<WireRequest>,
}

/// In-memory transport answering by resource name and recording every request.
/// Clones share their script, so a builder's copies can be observed from the test.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose login succeeds with `token`.
    pub fn logged_in(token: &str) -> Self {
        let transport = Self::new();
        transport.respond(
            "authenticate.php",
            200,
            &serde_json::json!({ "httpHeaderValue": token }).to_string(),
        );
        transport
    }

    pub fn respond(&self, resource: &str, status: u16, body: &str) {
        self.script.lock().unwrap().routes.insert(
            resource.to_string(),
            Ok(WireResponse {
                status,
                body: body.to_string(),
            }),
        );
    }

    pub fn fail(&self, resource: &str, message: &str) {
        self.script
            .lock()
            .unwrap()
            .routes
            .insert(resource.to_string(), Err(message.to_string()));
    }

    pub fn requests(&self) -> Vec<WireRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn count(&self, resource: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.url.ends_with(&format!("/{resource}")))
            .count()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &WireRequest) -> Result<WireResponse, CidError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());
        let resource = request.url.rsplit('/').next().unwrap_or_default();
        match script.routes.get(resource) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(message)) => Err(CidError::Http(message.clone())),
            None => Ok(WireResponse {
                status: 404,
                body: String::new(),
            }),
        }
    }
}
