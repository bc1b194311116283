//! Auto Analyst client library (config, wire types, HTTP calls).
//! Used by the `analyst` CLI and the panel command layer.

pub mod client;
pub mod config;
pub mod logging;
pub mod messages;

pub use client::{
    ApiClient, ApiError, Credentials, LoginOutcome, ServerReply, Session, UploadFile,
};
pub use config::{default_config_path, BackendSection, Config, ConfigError, LogSection};
pub use messages::render_record;
