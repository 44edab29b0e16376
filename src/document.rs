//! Open-document tracking
//!
//! Completion needs the text of the current line up to the cursor, so the
//! server mirrors open documents with a rope and applies the client's
//! incremental edits. The `language_id` reported on `didOpen` is kept for
//! matching against the configured document selector.

use ropey::Rope;
use tokio::sync::RwLock;
use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};
use tracing::warn;

pub fn lsp_position_to_offset(position: &Position, text: &Rope) -> usize {
    let line = (position.line as usize).min(text.len_lines().saturating_sub(1));
    let char = (position.character as usize).min(text.line(line).len_chars());
    text.line_to_char(line) + char
}

#[derive(Debug)]
pub struct LspDocumentState {
    pub uri: Url,
    pub language_id: String,
    pub text: Rope,
    pub version: i32,
}

#[derive(Debug)]
pub struct LspDocument {
    pub id: u32,
    pub state: RwLock<LspDocumentState>,
}

impl LspDocument {
    pub fn new(id: u32, uri: Url, language_id: String, text: &str, version: i32) -> Self {
        LspDocument {
            id,
            state: RwLock::new(LspDocumentState {
                uri,
                language_id,
                text: Rope::from_str(text),
                version,
            }),
        }
    }

    pub async fn uri(&self) -> Url {
        self.state.read().await.uri.clone()
    }

    pub async fn language_id(&self) -> String {
        self.state.read().await.language_id.clone()
    }

    pub async fn text(&self) -> String {
        self.state.read().await.text.to_string()
    }

    pub async fn version(&self) -> i32 {
        self.state.read().await.version
    }

    /// Applies incremental or full-text changes for a newer version.
    /// Changes for an older version than the current one are dropped.
    pub async fn apply(
        &self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Option<String> {
        let mut state = self.state.write().await;
        if version < state.version {
            warn!(
                "Dropping outdated changes for URI={} (version {} < {})",
                state.uri, version, state.version
            );
            return None;
        }
        for change in &changes {
            if let Some(range) = change.range {
                let start = lsp_position_to_offset(&range.start, &state.text);
                let end = lsp_position_to_offset(&range.end, &state.text);
                state.text.remove(start..end);
                state.text.insert(start, &change.text);
            } else {
                state.text = Rope::from_str(&change.text);
            }
        }
        state.version = version;
        Some(state.text.to_string())
    }

    /// Text of the cursor's line from its start up to the cursor column.
    pub async fn line_prefix(&self, position: Position) -> String {
        let state = self.state.read().await;
        let line_idx = position.line as usize;
        if line_idx >= state.text.len_lines() {
            return String::new();
        }
        let line = state.text.line(line_idx);
        let end = (position.character as usize).min(line.len_chars());
        line.slice(..end).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Range;

    fn create_test_document(text: &str) -> LspDocument {
        LspDocument::new(
            1,
            Url::parse("file:///test.ts").unwrap(),
            "typescript".to_string(),
            text,
            0,
        )
    }

    #[tokio::test]
    async fn test_apply_full_change() {
        let doc = create_test_document("initial text");
        let changes = vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new text".to_string(),
        }];

        let result = doc.apply(changes, 1).await;
        assert_eq!(result.as_deref(), Some("new text"));
        assert_eq!(doc.version().await, 1);
    }

    #[tokio::test]
    async fn test_apply_incremental_change() {
        let doc = create_test_document("hello world");
        let changes = vec![TextDocumentContentChangeEvent {
            range: Some(Range {
                start: Position { line: 0, character: 6 },
                end: Position { line: 0, character: 11 },
            }),
            range_length: None,
            text: "labels.".to_string(),
        }];

        let result = doc.apply(changes, 1).await;
        assert_eq!(result.as_deref(), Some("hello labels."));
    }

    #[tokio::test]
    async fn test_apply_outdated_version() {
        let doc = create_test_document("initial text");
        let changes = vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new text".to_string(),
        }];

        let _ = doc.apply(changes.clone(), 1).await;
        let result = doc.apply(changes, -1).await;
        assert!(result.is_none());
        assert_eq!(doc.text().await, "new text");
        assert_eq!(doc.version().await, 1);
    }

    #[tokio::test]
    async fn test_line_prefix() {
        let doc = create_test_document("first line\nconst label = colors.red;");
        let prefix = doc
            .line_prefix(Position { line: 1, character: 21 })
            .await;
        assert_eq!(prefix, "const label = colors.");
    }

    #[tokio::test]
    async fn test_line_prefix_out_of_range() {
        let doc = create_test_document("only line");
        assert_eq!(doc.line_prefix(Position { line: 5, character: 0 }).await, "");
        // Column past end of line is clamped to the full line.
        assert_eq!(
            doc.line_prefix(Position { line: 0, character: 100 }).await,
            "only line"
        );
    }
}
