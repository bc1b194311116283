//! Panel view-state: which panels are visible and what each slot shows.
//! Panel and slot names are the element ids of the page this state backs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Login,
    Upload,
    Query,
    Results,
}

impl Panel {
    pub const ALL: [Panel; 4] = [Panel::Login, Panel::Upload, Panel::Query, Panel::Results];

    pub fn element_id(self) -> &'static str {
        match self {
            Panel::Login => "login",
            Panel::Upload => "upload",
            Panel::Query => "query",
            Panel::Results => "results",
        }
    }
}

/// Text slots written by commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    LoginMessage,
    UploadMessage,
    QueryMessage,
}

impl Slot {
    pub fn element_id(self) -> &'static str {
        match self {
            Slot::LoginMessage => "loginMessage",
            Slot::UploadMessage => "uploadMessage",
            Slot::QueryMessage => "queryMessage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Only the login panel is visible.
    #[default]
    Unauthenticated,
    /// Upload, query and results are visible; login is hidden. Final.
    Authenticated,
}

/// Snapshot-able state of the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    phase: Phase,
    login_message: String,
    upload_message: String,
    query_message: String,
    results_list: Vec<String>,
}

impl PanelView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_visible(&self, panel: Panel) -> bool {
        match self.phase {
            Phase::Unauthenticated => panel == Panel::Login,
            Phase::Authenticated => panel != Panel::Login,
        }
    }

    pub fn visible_panels(&self) -> Vec<Panel> {
        Panel::ALL
            .into_iter()
            .filter(|p| self.is_visible(*p))
            .collect()
    }

    pub fn message(&self, slot: Slot) -> &str {
        match slot {
            Slot::LoginMessage => &self.login_message,
            Slot::UploadMessage => &self.upload_message,
            Slot::QueryMessage => &self.query_message,
        }
    }

    /// Lines of `resultsList`, one per record.
    pub fn results(&self) -> &[String] {
        &self.results_list
    }

    pub(crate) fn set_message(&mut self, slot: Slot, text: String) {
        match slot {
            Slot::LoginMessage => self.login_message = text,
            Slot::UploadMessage => self.upload_message = text,
            Slot::QueryMessage => self.query_message = text,
        }
    }

    /// Switch to the authenticated layout. Returns whether anything changed;
    /// there is no way back.
    pub(crate) fn authenticate(&mut self) -> bool {
        let changed = self.phase == Phase::Unauthenticated;
        self.phase = Phase::Authenticated;
        changed
    }

    pub(crate) fn replace_results(&mut self, lines: Vec<String>) {
        self.results_list = lines;
    }
}
