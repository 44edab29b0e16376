//! Workspace configuration (`labelsFinder.json`)
//!
//! The config file lives at the workspace root under a fixed name and
//! points at the label data file. Its `documentSelector` decides which
//! open documents receive suggestions; entries are matched against the
//! `language_id` the client reports on `textDocument/didOpen` and are
//! otherwise opaque to the server.

use serde::Deserialize;

/// Fixed name of the configuration file, resolved against the workspace root.
pub const CONFIG_FILE_NAME: &str = "labelsFinder.json";

/// A single language identifier or a list of them.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DocumentSelector {
    One(String),
    Many(Vec<String>),
}

impl DocumentSelector {
    /// Whether a document with the given language id is covered by this
    /// selector. An empty list matches nothing.
    pub fn matches(&self, language_id: &str) -> bool {
        match self {
            DocumentSelector::One(id) => id == language_id,
            DocumentSelector::Many(ids) => ids.iter().any(|id| id == language_id),
        }
    }
}

/// Parsed contents of `labelsFinder.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinderConfig {
    /// Path to the label data file, relative to the workspace root.
    pub labels_path: String,
    /// Optional here so a missing selector surfaces as its own warning
    /// instead of a generic parse failure.
    #[serde(default)]
    pub document_selector: Option<DocumentSelector>,
}
