//! Panel state and command handlers for the Auto Analyst client.
//! A host page binds panels and slots by element id and calls the commands.

pub mod commands;
pub mod panels;

pub use commands::{CommandStatus, LoginForm, Workbench};
pub use panels::{Panel, PanelView, Phase, Slot};
