//! Command handlers behind the panels: login, register, upload, query, results.
//! Each handler runs one request and writes the outcome into the view.
//!
//! Transport and decoding failures are logged and returned as
//! [`CommandStatus::TransportError`]; they never touch the view.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use analyst_client::client::{QUERY_FAILED, REGISTER_FAILED, UPLOAD_FAILED};
use analyst_client::{render_record, ApiClient, ApiError, Config, Credentials, Session, UploadFile};
use serde::{Deserialize, Serialize};

use crate::panels::{PanelView, Slot};

/// Login panel form values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl From<&LoginForm> for Credentials {
    fn from(f: &LoginForm) -> Self {
        Credentials::new(f.username.clone(), f.password.clone())
    }
}

/// What a command did to the view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandStatus {
    /// A message slot now shows `text`.
    Displayed { text: String },
    /// The results list was replaced with `count` lines.
    Listed { count: usize },
    /// The request failed below the application level; view unchanged.
    TransportError { message: String },
}

/// One page worth of state: client, session and view. Independent
/// workbenches share nothing.
pub struct Workbench {
    client: ApiClient,
    session: RwLock<Session>,
    view: Mutex<PanelView>,
    file_key: Mutex<Option<String>>,
}

impl Workbench {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            session: RwLock::new(Session::new()),
            view: Mutex::new(PanelView::new()),
            file_key: Mutex::new(None),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Ok(Self::new(ApiClient::from_config(config)?))
    }

    /// Snapshot of the view.
    pub fn view(&self) -> PanelView {
        self.lock_view().clone()
    }

    /// Snapshot of the session.
    pub fn session(&self) -> Session {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Key of the last file the backend accepted, sent along with queries.
    pub fn file_key(&self) -> Option<String> {
        self.lock_file_key().clone()
    }

    fn lock_view(&self) -> MutexGuard<'_, PanelView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_file_key(&self) -> MutexGuard<'_, Option<String>> {
        self.file_key.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn display(&self, slot: Slot, text: String) -> CommandStatus {
        self.lock_view().set_message(slot, text.clone());
        CommandStatus::Displayed { text }
    }

    pub async fn login(&self, form: &LoginForm) -> CommandStatus {
        let mut session = self.session();
        let outcome = match self.client.login(&mut session, &Credentials::from(form)).await {
            Ok(o) => o,
            Err(e) => return transport_failure("login", e),
        };

        if outcome.is_authenticated() {
            *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
            if self.lock_view().authenticate() {
                tracing::info!(username = %form.username, "authenticated");
            }
        }
        self.display(Slot::LoginMessage, outcome.display_text())
    }

    /// Registration answers land in the login message slot.
    pub async fn register(&self, form: &LoginForm) -> CommandStatus {
        match self.client.register(&Credentials::from(form)).await {
            Ok(reply) => self.display(Slot::LoginMessage, reply.display_text(REGISTER_FAILED)),
            Err(e) => transport_failure("register", e),
        }
    }

    /// Upload `file`, or an empty field when nothing was picked.
    pub async fn upload_file(&self, file: Option<UploadFile>) -> CommandStatus {
        let session = self.session();
        match self.client.upload_file(&session, file).await {
            Ok(reply) => {
                if reply.is_success() {
                    if let Some(key) = &reply.body.file_key {
                        *self.lock_file_key() = Some(key.clone());
                    }
                }
                self.display(Slot::UploadMessage, reply.display_text(UPLOAD_FAILED))
            }
            Err(e) => transport_failure("upload", e),
        }
    }

    /// Read `path` and upload it. A read failure is reported like a
    /// transport failure.
    pub async fn upload_path(&self, path: Option<&Path>) -> CommandStatus {
        let file = match path {
            Some(p) => match UploadFile::read(p).await {
                Ok(f) => Some(f),
                Err(e) => return transport_failure("upload", e),
            },
            None => None,
        };
        self.upload_file(file).await
    }

    /// Submit `query`. With several in flight, the last to resolve decides
    /// the displayed text.
    pub async fn submit_query(&self, query: &str) -> CommandStatus {
        let session = self.session();
        let file_key = self.file_key();
        match self
            .client
            .submit_query(&session, query, file_key.as_deref())
            .await
        {
            Ok(reply) => self.display(Slot::QueryMessage, reply.display_text(QUERY_FAILED)),
            Err(e) => transport_failure("query", e),
        }
    }

    /// Replace the results list with one line per record.
    pub async fn fetch_results(&self) -> CommandStatus {
        let session = self.session();
        match self.client.fetch_results(&session).await {
            Ok(records) => {
                let lines: Vec<String> = records.iter().map(render_record).collect();
                let count = lines.len();
                self.lock_view().replace_results(lines);
                CommandStatus::Listed { count }
            }
            Err(e) => transport_failure("results", e),
        }
    }
}

fn transport_failure(action: &'static str, err: ApiError) -> CommandStatus {
    tracing::error!(action, error = %err, "request failed");
    CommandStatus::TransportError {
        message: err.to_string(),
    }
}
