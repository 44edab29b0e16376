//! Label tree model and suggestion builders
//!
//! The label data file is an arbitrary-depth JSON object whose leaves are
//! strings. Three independent builders turn a tree snapshot into
//! completion items:
//!
//! 1. Top-level: one generic item per root key, committed by `.`.
//! 2. Children: the keys under whichever node the cursor is navigating
//!    into via dot notation (requires a path match; `None` means no match,
//!    which is distinct from a matched node with no children).
//! 3. Flat: every leaf in the tree, labeled by its value and inserting its
//!    dotted path.
//!
//! Key iteration order is the JSON file's insertion order throughout,
//! which is why the tree is backed by `IndexMap`.

use indexmap::IndexMap;
use serde::Deserialize;
use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind};
use tracing::debug;

/// Root of a label data file: keys map to nested trees or leaf strings.
pub type LabelTree = IndexMap<String, LabelNode>;

/// A node in the label tree, decided at parse time so traversal can match
/// exhaustively instead of type-checking ad hoc.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum LabelNode {
    Branch(IndexMap<String, LabelNode>),
    Leaf(String),
}

/// Locates the node the user is navigating into via dot notation.
///
/// Visits the tree depth-first in key order and returns the first node
/// whose dotted path, followed by `.`, is a suffix of `line_prefix`.
/// Returns the matched path together with the node; `None` if no path
/// matches.
pub fn find_at_cursor<'a>(
    tree: &'a LabelTree,
    line_prefix: &str,
) -> Option<(String, &'a LabelNode)> {
    fn search<'a>(
        node: &'a LabelNode,
        path: String,
        line_prefix: &str,
    ) -> Option<(String, &'a LabelNode)> {
        if line_prefix.ends_with(&format!("{path}.")) {
            return Some((path, node));
        }
        if let LabelNode::Branch(children) = node {
            for (key, child) in children {
                if let Some(found) = search(child, format!("{path}.{key}"), line_prefix) {
                    return Some(found);
                }
            }
        }
        None
    }

    for (key, node) in tree {
        if let Some(found) = search(node, key.clone(), line_prefix) {
            debug!("Cursor matched label path {}", found.0);
            return Some(found);
        }
    }
    None
}

/// One generic suggestion per top-level key. Typing `.` right after
/// committing one re-triggers completion for its children.
pub fn top_level_items(tree: &LabelTree) -> Vec<CompletionItem> {
    tree.keys()
        .map(|key| CompletionItem {
            label: key.clone(),
            commit_characters: Some(vec![".".to_string()]),
            ..Default::default()
        })
        .collect()
}

/// Suggestions for the children of the node the cursor is navigating into.
///
/// `None` signals that no label path matches the cursor context, so the
/// caller must not contribute items at all. A match on a leaf node yields
/// `Some` with no items: the path is valid but has nothing underneath.
pub fn child_items(tree: &LabelTree, line_prefix: &str) -> Option<Vec<CompletionItem>> {
    let (_, node) = find_at_cursor(tree, line_prefix)?;
    let mut items = Vec::new();
    if let LabelNode::Branch(children) = node {
        for (key, child) in children {
            let item = match child {
                LabelNode::Branch(_) => CompletionItem {
                    label: key.clone(),
                    kind: Some(CompletionItemKind::PROPERTY),
                    commit_characters: Some(vec![".".to_string()]),
                    ..Default::default()
                },
                LabelNode::Leaf(value) => CompletionItem {
                    label: key.clone(),
                    kind: Some(CompletionItemKind::FIELD),
                    detail: Some(value.clone()),
                    ..Default::default()
                },
            };
            items.push(item);
        }
    }
    Some(items)
}

/// One suggestion per leaf anywhere in the tree, independent of cursor
/// position. The label is the leaf's value and the insert text is the
/// dotted path, so picking a label by its text inserts its path.
pub fn flat_items(tree: &LabelTree) -> Vec<CompletionItem> {
    fn walk(node: &LabelNode, path: String, items: &mut Vec<CompletionItem>) {
        match node {
            LabelNode::Branch(children) => {
                for (key, child) in children {
                    walk(child, format!("{path}.{key}"), items);
                }
            }
            LabelNode::Leaf(value) => items.push(CompletionItem {
                label: value.clone(),
                kind: Some(CompletionItemKind::FIELD),
                detail: Some(format!("{path}: {value}")),
                insert_text: Some(path),
                ..Default::default()
            }),
        }
    }

    let mut items = Vec::new();
    for (key, node) in tree {
        walk(node, key.clone(), &mut items);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn colors_tree() -> LabelTree {
        serde_json::from_str(indoc! {r#"
            {
                "colors": {
                    "red": "FF0000",
                    "green": "00FF00"
                }
            }
        "#})
        .unwrap()
    }

    fn deep_tree() -> LabelTree {
        serde_json::from_str(indoc! {r#"
            {
                "a": {
                    "b": {
                        "x": "Label X",
                        "y": "Label Y"
                    },
                    "c": "Label C"
                },
                "b": {
                    "z": "Label Z"
                }
            }
        "#})
        .unwrap()
    }

    #[test]
    fn top_level_lists_root_keys_in_order() {
        let tree = deep_tree();
        let labels: Vec<_> = top_level_items(&tree)
            .into_iter()
            .map(|item| item.label)
            .collect();
        assert_eq!(labels, ["a", "b"]);
    }

    #[test]
    fn top_level_items_commit_on_dot() {
        let tree = colors_tree();
        let items = top_level_items(&tree);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "colors");
        assert_eq!(items[0].commit_characters, Some(vec![".".to_string()]));
        assert_eq!(items[0].kind, None);
        assert_eq!(items[0].detail, None);
    }

    quickcheck::quickcheck! {
        fn top_level_yields_every_root_key(keys: Vec<String>) -> bool {
            let tree: LabelTree = keys
                .into_iter()
                .map(|key| (key, LabelNode::Leaf(String::new())))
                .collect();
            let labels: Vec<_> = top_level_items(&tree)
                .into_iter()
                .map(|item| item.label)
                .collect();
            labels == tree.keys().cloned().collect::<Vec<_>>()
        }
    }

    #[test]
    fn children_for_matched_path() {
        let tree = colors_tree();
        let items = child_items(&tree, "x.colors.").expect("path should match");
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].label, "red");
        assert_eq!(items[0].kind, Some(CompletionItemKind::FIELD));
        assert_eq!(items[0].detail.as_deref(), Some("FF0000"));
        assert_eq!(items[0].commit_characters, None);

        assert_eq!(items[1].label, "green");
        assert_eq!(items[1].detail.as_deref(), Some("00FF00"));
    }

    #[test]
    fn branch_children_keep_dot_commit() {
        let tree = deep_tree();
        let items = child_items(&tree, "a.").unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].label, "b");
        assert_eq!(items[0].kind, Some(CompletionItemKind::PROPERTY));
        assert_eq!(items[0].commit_characters, Some(vec![".".to_string()]));
        assert_eq!(items[0].detail, None);

        assert_eq!(items[1].label, "c");
        assert_eq!(items[1].kind, Some(CompletionItemKind::FIELD));
        assert_eq!(items[1].detail.as_deref(), Some("Label C"));
    }

    #[test]
    fn no_match_is_not_found() {
        let tree = deep_tree();
        assert!(child_items(&tree, "nothing here").is_none());
        assert!(child_items(&tree, "a.b").is_none()); // no trailing dot
        assert!(child_items(&tree, "a.missing.").is_none());
        assert!(child_items(&tree, "").is_none());
    }

    #[test]
    fn leaf_match_yields_empty_items() {
        // A valid path with nothing underneath is a match, not NotFound.
        let tree = deep_tree();
        let items = child_items(&tree, "a.c.").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn first_match_wins_in_depth_first_key_order() {
        // "a.b." is a suffix match for both the nested path "a.b" and the
        // root key "b"; depth-first key order reaches "a.b" first.
        let tree = deep_tree();
        let (path, _) = find_at_cursor(&tree, "a.b.").unwrap();
        assert_eq!(path, "a.b");

        let labels: Vec<_> = child_items(&tree, "a.b.")
            .unwrap()
            .into_iter()
            .map(|item| item.label)
            .collect();
        assert_eq!(labels, ["x", "y"]);
    }

    #[test]
    fn match_only_requires_suffix() {
        let tree = colors_tree();
        let items = child_items(&tree, "const label = t(colors.").unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn flat_emits_path_for_every_leaf() {
        let tree = colors_tree();
        let items = flat_items(&tree);
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].label, "FF0000");
        assert_eq!(items[0].insert_text.as_deref(), Some("colors.red"));
        assert_eq!(items[0].detail.as_deref(), Some("colors.red: FF0000"));
        assert_eq!(items[0].kind, Some(CompletionItemKind::FIELD));

        assert_eq!(items[1].label, "00FF00");
        assert_eq!(items[1].insert_text.as_deref(), Some("colors.green"));
        assert_eq!(items[1].detail.as_deref(), Some("colors.green: 00FF00"));
    }

    #[test]
    fn flat_traverses_depth_first_in_key_order() {
        let tree = deep_tree();
        let paths: Vec<_> = flat_items(&tree)
            .into_iter()
            .map(|item| item.insert_text.unwrap())
            .collect();
        assert_eq!(paths, ["a.b.x", "a.b.y", "a.c", "b.z"]);
    }

    #[test]
    fn flat_of_empty_tree_is_empty() {
        let tree = LabelTree::new();
        assert!(flat_items(&tree).is_empty());
        assert!(top_level_items(&tree).is_empty());
        assert!(find_at_cursor(&tree, "anything.").is_none());
    }

    #[test]
    fn rejects_non_string_leaves() {
        let result: Result<LabelTree, _> =
            serde_json::from_str(r#"{ "a": { "b": 42 } }"#);
        assert!(result.is_err());
    }
}
