//! View state: expansion, hover, view mode and scope.
//!
//! Expansion is tracked by id, apart from the tree data. Every expanded id
//! refers to a node of the currently loaded tree; a reload replaces the set
//! with just the new root.

use std::collections::HashSet;

use serde::Serialize;

use crate::flatten::find_node;
use crate::types::{OrgNode, Scope, UserId, ViewMode};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub expanded: HashSet<UserId>,
    pub hovered: Option<UserId>,
    pub view_mode: ViewMode,
    pub scope: Scope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    ToggleExpand(UserId),
    SetHovered(Option<UserId>),
    SetViewMode(ViewMode),
}

impl ViewState {
    /// Reducer: old state + event -> new state. `tree` is the loaded tree,
    /// needed to know whether a node has children.
    pub fn apply(&self, event: &ViewEvent, tree: Option<&OrgNode>) -> ViewState {
        let mut next = self.clone();
        match event {
            ViewEvent::ToggleExpand(id) => {
                let expandable = tree
                    .and_then(|root| find_node(root, id))
                    .map(OrgNode::has_children)
                    .unwrap_or(false);
                if !expandable {
                    return next;
                }
                if !next.expanded.remove(id) {
                    next.expanded.insert(id.clone());
                }
            }
            ViewEvent::SetHovered(id) => next.hovered = id.clone(),
            ViewEvent::SetViewMode(mode) => next.view_mode = *mode,
        }
        next
    }

    /// State after a tree load completes: only the root expanded, scope set,
    /// view mode kept. Hover is dropped since the old node may be gone.
    pub fn reloaded(&self, root: &OrgNode, scope: Scope) -> ViewState {
        let mut expanded = HashSet::new();
        expanded.insert(root.id.clone());
        ViewState {
            expanded,
            hovered: None,
            view_mode: self.view_mode,
            scope,
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn is_hovered(&self, id: &str) -> bool {
        self.hovered.as_deref() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::tests::{node, sample_tree};

    fn loaded(tree: &OrgNode) -> ViewState {
        ViewState::default().reloaded(tree, Scope::Company)
    }

    #[test]
    fn test_reload_expands_only_root() {
        let tree = sample_tree();
        let mut state = loaded(&tree);
        state.expanded.insert("stale".to_string());
        state.hovered = Some("b".to_string());
        state.view_mode = ViewMode::Grid;

        let next = state.reloaded(&tree, Scope::Subtree);
        assert_eq!(next.expanded, HashSet::from(["a".to_string()]));
        assert_eq!(next.scope, Scope::Subtree);
        assert_eq!(next.view_mode, ViewMode::Grid);
        assert_eq!(next.hovered, None);
    }

    #[test]
    fn test_toggle_leaf_is_noop() {
        let tree = node("a", vec![node("b", vec![]), node("c", vec![])]);
        let state = loaded(&tree);
        let next = state.apply(&ViewEvent::ToggleExpand("b".into()), Some(&tree));
        assert_eq!(next.expanded, HashSet::from(["a".to_string()]));
    }

    #[test]
    fn test_toggle_node_with_children_flips() {
        let tree = node("a", vec![node("b", vec![node("d", vec![])]), node("c", vec![])]);
        let state = loaded(&tree);
        let next = state.apply(&ViewEvent::ToggleExpand("b".into()), Some(&tree));
        assert_eq!(next.expanded, HashSet::from(["a".to_string(), "b".to_string()]));
        let back = next.apply(&ViewEvent::ToggleExpand("b".into()), Some(&tree));
        assert_eq!(back.expanded, HashSet::from(["a".to_string()]));
    }

    #[test]
    fn test_toggle_root_collapses() {
        let tree = sample_tree();
        let next = loaded(&tree).apply(&ViewEvent::ToggleExpand("a".into()), Some(&tree));
        assert!(next.expanded.is_empty());
    }

    #[test]
    fn test_toggle_unknown_or_without_tree_is_noop() {
        let tree = sample_tree();
        let state = loaded(&tree);
        assert_eq!(state.apply(&ViewEvent::ToggleExpand("zz".into()), Some(&tree)), state);
        assert_eq!(state.apply(&ViewEvent::ToggleExpand("b".into()), None), state);
    }

    #[test]
    fn test_hover_and_view_mode_are_plain_updates() {
        let state = ViewState::default()
            .apply(&ViewEvent::SetHovered(Some("c".into())), None)
            .apply(&ViewEvent::SetViewMode(ViewMode::Grid), None);
        assert!(state.is_hovered("c"));
        assert_eq!(state.view_mode, ViewMode::Grid);
        let state = state.apply(&ViewEvent::SetHovered(None), None);
        assert!(!state.is_hovered("c"));
    }
}
