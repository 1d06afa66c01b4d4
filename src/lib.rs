pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod formats;
pub mod output;
pub mod service;
pub mod session;
pub mod transport;
pub mod workspace;

pub use domain::PLUGIN_INFO;
pub use error::CidError;
pub use service::CidMetadataService;
pub use session::CidServiceBuilder;
