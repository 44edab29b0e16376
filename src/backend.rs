//! LSP backend for the labels finder
//!
//! Implements the `tower_lsp::LanguageServer` lifecycle: activation loads
//! `labelsFinder.json` and the label data file from the workspace root,
//! a `notify` watcher re-runs the relevant loads when either file
//! changes, and `textDocument/completion` merges the three suggestion
//! builders for documents matched by the configured selector. Every load
//! failure is reported as a non-blocking warning; none of them crashes
//! the server.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedReceiver;
use tower_lsp::{Client, LanguageServer, jsonrpc};
use tower_lsp::lsp_types::{
    CompletionOptions, CompletionParams, CompletionResponse,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DidSaveTextDocumentParams, InitializeParams,
    InitializeResult, InitializedParams, MessageType, ServerCapabilities,
    TextDocumentSyncCapability, TextDocumentSyncKind, Url,
};
use tracing::{debug, info, warn};

use crate::document::LspDocument;
use crate::error::LoadError;
use crate::labels;
use crate::workspace::LabelWorkspace;

/// The labels finder language server backend.
///
/// `workspace` is `None` both before activation and after a failed one
/// (the degraded state); the watcher is only wired up on a successful
/// activation, so a degraded boot serves nothing until restart.
#[derive(Clone)]
pub struct LabelsBackend {
    client: Client,
    documents_by_uri: Arc<DashMap<Url, Arc<LspDocument>>>,
    serial_document_id: Arc<AtomicU32>,
    root_dir: Arc<RwLock<Option<PathBuf>>>,
    workspace: Arc<RwLock<Option<LabelWorkspace>>>,
    file_watcher: Arc<Mutex<Option<RecommendedWatcher>>>,
}

impl LabelsBackend {
    pub fn new(client: Client) -> Self {
        LabelsBackend {
            client,
            documents_by_uri: Arc::new(DashMap::new()),
            serial_document_id: Arc::new(AtomicU32::new(0)),
            root_dir: Arc::new(RwLock::new(None)),
            workspace: Arc::new(RwLock::new(None)),
            file_watcher: Arc::new(Mutex::new(None)),
        }
    }

    fn next_document_id(&self) -> u32 {
        self.serial_document_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Reports a load failure to the user without interrupting anything.
    async fn report(&self, error: &LoadError) {
        warn!("{error}");
        self.client
            .show_message(MessageType::WARNING, error.to_string())
            .await;
    }

    /// Runs the activation sequence. On failure the backend stays
    /// degraded: one warning, no suggestions, no watcher.
    async fn activate(&self) {
        let root = self.root_dir.read().await.clone();
        let Some(root) = root else {
            self.report(&LoadError::NoWorkspaceRoot).await;
            return;
        };

        match LabelWorkspace::load(&root).await {
            Ok(workspace) => {
                *self.workspace.write().await = Some(workspace);
                info!("Label workspace activated at {:?}", root);
                self.start_watcher(&root);
            }
            Err(e) => self.report(&e).await,
        }
    }

    /// Watches the workspace root and routes change events for the config
    /// and data files to the matching reload. The root is watched
    /// recursively so a relocated `labelsPath` is picked up after a
    /// config reload without rewiring the watcher.
    fn start_watcher(&self, root: &PathBuf) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let mut watcher = match RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            notify::Config::default(),
        ) {
            Ok(watcher) => watcher,
            Err(e) => {
                warn!("Failed to create file watcher: {}", e);
                return;
            }
        };
        if let Err(e) = watcher.watch(root, RecursiveMode::Recursive) {
            warn!("Failed to watch workspace root {:?}: {}", root, e);
            return;
        }
        *self.file_watcher.lock().unwrap() = Some(watcher);

        let backend = self.clone();
        tokio::spawn(async move {
            backend.watch_loop(rx).await;
        });
    }

    async fn watch_loop(&self, mut rx: UnboundedReceiver<notify::Result<notify::Event>>) {
        while let Some(res) = rx.recv().await {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    warn!("File watcher error: {}", e);
                    continue;
                }
            };
            if !matches!(
                event.kind,
                notify::EventKind::Create(_) | notify::EventKind::Modify(_)
            ) {
                continue;
            }
            for path in &event.paths {
                self.handle_file_change(path.clone()).await;
            }
        }
        debug!("File watcher channel closed");
    }

    /// Each change notification runs to completion before the next one is
    /// considered, so a reload never observes a half-applied predecessor.
    async fn handle_file_change(&self, path: PathBuf) {
        let result = {
            let mut guard = self.workspace.write().await;
            let Some(workspace) = guard.as_mut() else {
                return;
            };

            if path == workspace.config_path() {
                info!("Config file changed: {:?}", path);
                workspace.reload_config().await
            } else if path == workspace.labels_path() {
                info!("Label data file changed: {:?}", path);
                workspace.reload_labels().await
            } else {
                return;
            }
        };

        // A failed reload keeps the previous generation serving.
        if let Err(e) = result {
            self.report(&e).await;
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for LabelsBackend {
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        info!("Received initialize: {:?}", params);

        #[allow(deprecated)]
        let root_uri = params.root_uri;
        if let Some(root_uri) = root_uri {
            if let Ok(root_path) = root_uri.to_file_path() {
                *self.root_dir.write().await = Some(root_path);
            } else {
                warn!("Failed to convert root_uri to path: {}", root_uri);
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string()]),
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, params: InitializedParams) {
        info!("Initialized: {:?}", params);
        self.activate().await;
    }

    async fn shutdown(&self) -> jsonrpc::Result<()> {
        info!("Received shutdown request");
        *self.file_watcher.lock().unwrap() = None;
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri.clone();
        info!(
            "Opening document: URI={}, language={}, version={}",
            uri, params.text_document.language_id, params.text_document.version
        );
        let document = Arc::new(LspDocument::new(
            self.next_document_id(),
            uri.clone(),
            params.text_document.language_id,
            &params.text_document.text,
            params.text_document.version,
        ));
        self.documents_by_uri.insert(uri, document);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        if let Some(document) = self.documents_by_uri.get(&uri).map(|doc| Arc::clone(&doc)) {
            if document.apply(params.content_changes, version).await.is_none() {
                warn!("Failed to apply changes to document with URI={}", uri);
            }
        } else {
            warn!("Failed to find document with URI={}", uri);
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        debug!("textDocument/didSave: {}", params.text_document.uri);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Some((_, document)) = self.documents_by_uri.remove(&uri) {
            info!("Closed document: {}, id: {}", uri, document.id);
        } else {
            warn!("Failed to find document with URI={}", uri);
        }
    }

    async fn completion(
        &self,
        params: CompletionParams,
    ) -> jsonrpc::Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        debug!("Completion request at {}:{:?}", uri, position);

        let Some(document) = self.documents_by_uri.get(&uri).map(|doc| Arc::clone(&doc)) else {
            debug!("Document not found: {}", uri);
            return Ok(None);
        };

        let language_id = document.language_id().await;
        let providers = {
            let guard = self.workspace.read().await;
            let Some(workspace) = guard.as_ref() else {
                return Ok(None);
            };
            if !workspace.selector().matches(&language_id) {
                return Ok(None);
            }
            workspace.providers()
        };

        let line_prefix = document.line_prefix(position).await;

        // Provider order mirrors registration order: top-level keys,
        // children at the cursor path (when one matches), then the flat
        // value-to-path listing.
        let mut items = providers.top_level.clone();
        if let Some(children) = labels::child_items(&providers.tree, &line_prefix) {
            items.extend(children);
        }
        items.extend(providers.flat.iter().cloned());

        Ok(Some(CompletionResponse::Array(items)))
    }
}
