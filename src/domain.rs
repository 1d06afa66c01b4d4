use std::collections::BTreeMap;
use std::fmt;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::CidError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub builder: &'static str,
}

pub const PLUGIN_INFO: PluginInfo = PluginInfo {
    name: "CID",
    kind: "data",
    builder: "CidServiceBuilder",
};

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credentials {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Raw,
    Processed,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Raw => write!(f, "raw"),
            DataKind::Processed => write!(f, "processed"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    pub uuid: String,
    pub md_uri: String,
    pub name: String,
    pub author: String,
    pub date: String,
    pub keys: Vec<String>,
    pub datasets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub md_uri: String,
    pub name: String,
    pub experiment: String,
    pub data: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInput {
    pub name: String,
    pub dataset: String,
    pub query: String,
    pub origin_output_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParameter {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Assigned by the service on creation.
    pub md_uri: String,
    pub process_name: String,
    pub process_uri: String,
    pub processed_dataset: String,
    pub inputs: Vec<RunInput>,
    pub parameters: Vec<RunParameter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawData {
    pub md_uri: String,
    pub uri: String,
    pub name: String,
    pub author: String,
    pub format: String,
    pub date: String,
    pub key_value_pairs: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedDataInput {
    pub name: String,
    pub uri: String,
    pub kind: DataKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedDataOutput {
    pub name: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedData {
    pub md_uri: String,
    /// Derived from `name` and the format extension, see `create_data_uri`.
    pub uri: String,
    pub name: String,
    pub author: String,
    pub format: String,
    pub date: String,
    pub run: String,
    pub inputs: Vec<ProcessedDataInput>,
    pub output: ProcessedDataOutput,
}

pub trait DataContainer {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
}

impl DataContainer for RawData {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> &str {
        &self.format
    }
}

impl DataContainer for ProcessedData {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> &str {
        &self.format
    }
}

/// Turns the `"now"` placeholder into today's local date; other values pass through.
pub fn resolve_date(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("now") {
        return Local::now().format("%Y-%m-%d").to_string();
    }
    trimmed.to_string()
}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), CidError> {
    if value.trim().is_empty() {
        return Err(CidError::InvalidArgument {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}
