//! HTTP client for the Auto Analyst backend: login, register, upload, query, results.
//!
//! Every call is a single request with no retry. Authenticated calls take the
//! [`Session`] explicitly; only [`ApiClient::login`] writes to it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::messages::{CredentialsBody, MessageBody, QueryBody, TokenBody};

pub const LOGIN_SUCCEEDED: &str = "Login successful!";
pub const LOGIN_FAILED: &str = "Login failed.";
pub const UPLOAD_FAILED: &str = "Upload failed.";
pub const QUERY_FAILED: &str = "Query submission failed.";
pub const REGISTER_FAILED: &str = "Registration failed.";

/// Username/password pair. Not validated before sending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn body(&self) -> CredentialsBody<'_> {
        CredentialsBody {
            username: &self.username,
            password: &self.password,
        }
    }
}

/// Bearer token issued by the last successful login. Memory only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// `Authorization` header value. Without a token this is the literal
    /// `Bearer null`; the request is still sent and the server decides.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token.as_deref().unwrap_or("null"))
    }
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read `path` fully into memory. The file name part is sent as the
    /// multipart file name.
    pub async fn read(path: &Path) -> Result<Self, ApiError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| ApiError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }
}

/// Result of a login attempt that reached the server and got a JSON answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,
    Rejected {
        status: u16,
        message: Option<String>,
    },
}

impl LoginOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, LoginOutcome::Authenticated)
    }

    /// Text for the login message slot.
    pub fn display_text(&self) -> String {
        match self {
            LoginOutcome::Authenticated => LOGIN_SUCCEEDED.to_string(),
            LoginOutcome::Rejected { message, .. } => non_empty(message.as_deref())
                .unwrap_or(LOGIN_FAILED)
                .to_string(),
        }
    }
}

/// A `{message}` reply from upload, query or register, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerReply {
    pub status: u16,
    pub body: MessageBody,
}

impl ServerReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Server message if it sent a non-empty one, `fallback` otherwise.
    /// The status is not consulted.
    pub fn display_text(&self, fallback: &str) -> String {
        non_empty(self.body.message.as_deref())
            .unwrap_or(fallback)
            .to_string()
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Transport and decoding failures. A well-formed non-ok reply is not an
/// error, except on `/results` which has no failure envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("results request failed with status {status}{}", detail(.message))]
    Rejected {
        status: u16,
        message: Option<String>,
    },
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn detail(message: &Option<String>) -> String {
    match non_empty(message.as_deref()) {
        Some(m) => format!(": {}", m),
        None => String::new(),
    }
}

/// Client bound to one backend base URL for its whole life.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Client with the transport's default timeouts (none).
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::with_timeout(config.base_url(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /login`. On an ok status the returned token replaces whatever
    /// `session` held; otherwise `session` is left as it was.
    pub async fn login(
        &self,
        session: &mut Session,
        credentials: &Credentials,
    ) -> Result<LoginOutcome, ApiError> {
        tracing::debug!(username = %credentials.username, "POST /login");
        let resp = self
            .http
            .post(self.url("/login"))
            .json(&credentials.body())
            .send()
            .await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if status.is_success() {
            let body: TokenBody = serde_json::from_slice(&bytes)?;
            session.token = Some(body.access_token);
            return Ok(LoginOutcome::Authenticated);
        }

        let body: MessageBody = serde_json::from_slice(&bytes)?;
        tracing::warn!(status = status.as_u16(), "login rejected");
        Ok(LoginOutcome::Rejected {
            status: status.as_u16(),
            message: body.message,
        })
    }

    /// `POST /register`. No session involved.
    pub async fn register(&self, credentials: &Credentials) -> Result<ServerReply, ApiError> {
        tracing::debug!(username = %credentials.username, "POST /register");
        let resp = self
            .http
            .post(self.url("/register"))
            .json(&credentials.body())
            .send()
            .await?;
        read_reply(resp).await
    }

    /// `POST /upload` as multipart field `file`. With no file the field is
    /// sent empty.
    pub async fn upload_file(
        &self,
        session: &Session,
        file: Option<UploadFile>,
    ) -> Result<ServerReply, ApiError> {
        let form = match file {
            Some(f) => {
                tracing::debug!(file = %f.file_name, bytes = f.bytes.len(), "POST /upload");
                Form::new().part("file", Part::bytes(f.bytes).file_name(f.file_name))
            }
            None => {
                tracing::debug!("POST /upload without a file");
                Form::new().text("file", "")
            }
        };
        let resp = self
            .http
            .post(self.url("/upload"))
            .header(AUTHORIZATION, session.authorization())
            .multipart(form)
            .send()
            .await?;
        read_reply(resp).await
    }

    /// `POST /query`. `file_key` is sent only when given.
    pub async fn submit_query(
        &self,
        session: &Session,
        query: &str,
        file_key: Option<&str>,
    ) -> Result<ServerReply, ApiError> {
        tracing::debug!(file_key = ?file_key, "POST /query");
        let resp = self
            .http
            .post(self.url("/query"))
            .header(AUTHORIZATION, session.authorization())
            .json(&QueryBody { query, file_key })
            .send()
            .await?;
        read_reply(resp).await
    }

    /// `GET /results`. Records come back in response order.
    pub async fn fetch_results(
        &self,
        session: &Session,
    ) -> Result<Vec<serde_json::Value>, ApiError> {
        tracing::debug!("GET /results");
        let resp = self
            .http
            .get(self.url("/results"))
            .header(AUTHORIZATION, session.authorization())
            .send()
            .await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<MessageBody>(&bytes)
                .ok()
                .and_then(|b| b.message.or(b.error));
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        decode(&bytes)
    }
}

async fn read_reply(resp: reqwest::Response) -> Result<ServerReply, ApiError> {
    let status: StatusCode = resp.status();
    let bytes = resp.bytes().await?;
    let body: MessageBody = decode(&bytes)?;
    if let Some(error) = body.error.as_deref() {
        tracing::warn!(status = status.as_u16(), error, "backend reported an error");
    }
    Ok(ServerReply {
        status: status.as_u16(),
        body,
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    Ok(serde_json::from_slice(bytes)?)
}
