use thiserror::Error;

/// Failures while loading or reloading the label workspace.
///
/// Every variant renders as the warning text shown to the user via
/// `window/showMessage`; none of them is fatal to the server. Unreadable
/// and malformed files share a warning message but stay distinct variants
/// so logs and tests can tell them apart.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("No workspace folder found.")]
    NoWorkspaceRoot,

    #[error("Configuration file \"labelsFinder.json\" not found on root of your project.")]
    ConfigUnreadable(#[source] std::io::Error),

    #[error("Configuration file \"labelsFinder.json\" not found on root of your project.")]
    ConfigMalformed(#[source] serde_json::Error),

    #[error("Source file not found on specified \"labelsPath\".")]
    DataUnreadable(#[source] std::io::Error),

    #[error("Source file not found on specified \"labelsPath\".")]
    DataMalformed(#[source] serde_json::Error),

    #[error("\"documentSelector\" not found on config file \"labelsFinder.json\"")]
    MissingDocumentSelector,
}
