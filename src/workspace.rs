//! Reload orchestration for the label workspace
//!
//! `LabelWorkspace` owns the validated config, the resolved labels path
//! and the currently served [`ProviderSet`]. Loads happen in the order
//! config, data file, selector presence; any failure aborts the sequence
//! with a [`LoadError`] and leaves previous state untouched. A reload
//! builds its full replacement `ProviderSet` before swapping it in, so a
//! reader holding the workspace lock only ever observes one consistent
//! generation of suggestions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tower_lsp::lsp_types::CompletionItem;
use tracing::{debug, info};

use crate::config::{CONFIG_FILE_NAME, DocumentSelector, FinderConfig};
use crate::error::LoadError;
use crate::labels::{self, LabelTree};

/// One fully built generation of suggestions over a tree snapshot.
///
/// Top-level and flat items are position-independent and precomputed once
/// per load; the nested builder needs the cursor context, so it keeps the
/// tree snapshot it was built from.
#[derive(Debug, Clone)]
pub struct ProviderSet {
    pub tree: Arc<LabelTree>,
    pub top_level: Vec<CompletionItem>,
    pub flat: Vec<CompletionItem>,
}

impl ProviderSet {
    fn build(tree: LabelTree) -> Self {
        let top_level = labels::top_level_items(&tree);
        let flat = labels::flat_items(&tree);
        ProviderSet {
            tree: Arc::new(tree),
            top_level,
            flat,
        }
    }
}

#[derive(Debug)]
pub struct LabelWorkspace {
    root: PathBuf,
    config_path: PathBuf,
    labels_path: PathBuf,
    selector: DocumentSelector,
    providers: Arc<ProviderSet>,
}

impl LabelWorkspace {
    /// Runs the full activation sequence against a workspace root.
    pub async fn load(root: impl Into<PathBuf>) -> Result<Self, LoadError> {
        let root = root.into();
        let config_path = root.join(CONFIG_FILE_NAME);

        let config = Self::load_config(&config_path).await?;
        let labels_path = root.join(&config.labels_path);
        let tree = Self::load_tree(&labels_path).await?;
        let selector = config
            .document_selector
            .ok_or(LoadError::MissingDocumentSelector)?;

        let providers = Arc::new(ProviderSet::build(tree));
        info!(
            "Loaded {} top-level and {} flat label suggestions from {:?}",
            providers.top_level.len(),
            providers.flat.len(),
            labels_path
        );

        Ok(LabelWorkspace {
            root,
            config_path,
            labels_path,
            selector,
            providers,
        })
    }

    async fn load_config(path: &Path) -> Result<FinderConfig, LoadError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(LoadError::ConfigUnreadable)?;
        serde_json::from_str(&content).map_err(LoadError::ConfigMalformed)
    }

    async fn load_tree(path: &Path) -> Result<LabelTree, LoadError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(LoadError::DataUnreadable)?;
        serde_json::from_str(&content).map_err(LoadError::DataMalformed)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn labels_path(&self) -> &Path {
        &self.labels_path
    }

    pub fn selector(&self) -> &DocumentSelector {
        &self.selector
    }

    /// The currently served suggestion generation.
    pub fn providers(&self) -> Arc<ProviderSet> {
        Arc::clone(&self.providers)
    }

    /// Data file changed: re-read the labels only. On failure the previous
    /// providers keep serving.
    pub async fn reload_labels(&mut self) -> Result<(), LoadError> {
        let tree = Self::load_tree(&self.labels_path).await?;
        self.providers = Arc::new(ProviderSet::build(tree));
        debug!("Rebuilt label suggestions from {:?}", self.labels_path);
        Ok(())
    }

    /// Config file changed: re-run both loads. Both must succeed before
    /// the selector, labels path, or providers change.
    pub async fn reload_config(&mut self) -> Result<(), LoadError> {
        let config = Self::load_config(&self.config_path).await?;
        let labels_path = self.root.join(&config.labels_path);
        let tree = Self::load_tree(&labels_path).await?;
        let selector = config
            .document_selector
            .ok_or(LoadError::MissingDocumentSelector)?;

        self.labels_path = labels_path;
        self.selector = selector;
        self.providers = Arc::new(ProviderSet::build(tree));
        debug!("Rebuilt label suggestions from {:?}", self.labels_path);
        Ok(())
    }
}
