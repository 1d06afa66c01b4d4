use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CidError {
    #[error("unable to connect to the CID database: {0}")]
    Connect(String),

    #[error("CID communication error: {status}")]
    Status { status: u16 },

    #[error("CID request failed: {0}")]
    Http(String),

    #[error("invalid CID response: {0}")]
    InvalidResponse(String),

    #[error("unable to find the {entity} {md_uri}")]
    NotFound { entity: &'static str, md_uri: String },

    #[error("invalid {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    #[error("unknown data format: {0}")]
    UnknownFormat(String),

    #[error("invalid import filter: {0}")]
    InvalidFilter(String),

    #[error("missing config file cid.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("{0} is not implemented by the CID metadata service")]
    NotImplemented(&'static str),
}

impl CidError {
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, CidError::NotImplemented(_))
    }

    pub fn is_data_service(&self) -> bool {
        matches!(
            self,
            CidError::Connect(_)
                | CidError::Status { .. }
                | CidError::Http(_)
                | CidError::InvalidResponse(_)
                | CidError::NotFound { .. }
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            CidError::Status { status } => Some(*status),
            _ => None,
        }
    }
}
