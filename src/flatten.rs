//! Tree traversals used by the grid and tree views.
//!
//! All walks are pre-order (parent before children, children in their given
//! order) and carry a visited-id set, so a malformed response that repeats
//! an id or links back to an ancestor still terminates. A repeated id is
//! emitted once, at its first position.

use std::collections::HashSet;

use crate::types::{OrgNode, OrgUser};

/// One row of the tree view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRow<'a> {
    pub node: &'a OrgNode,
    pub depth: usize,
}

/// Every node below `root`, excluding `root` itself.
pub fn descendants(root: &OrgNode) -> Vec<OrgUser> {
    let mut seen = HashSet::new();
    seen.insert(root.id.as_str());
    let mut out = Vec::new();
    for child in &root.children {
        collect(child, &mut seen, &mut out);
    }
    out
}

/// `[root] + descendants(root)`: the full grid listing.
pub fn all_nodes(root: &OrgNode) -> Vec<OrgUser> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    collect(root, &mut seen, &mut out);
    out
}

fn collect<'a>(node: &'a OrgNode, seen: &mut HashSet<&'a str>, out: &mut Vec<OrgUser>) {
    if !seen.insert(node.id.as_str()) {
        return;
    }
    out.push(node.to_user());
    for child in &node.children {
        collect(child, seen, out);
    }
}

/// Rows shown by the tree view. Only expanded nodes contribute their
/// children; the root sits at depth 0.
pub fn visible_rows<'a>(root: &'a OrgNode, expanded: &HashSet<String>) -> Vec<VisibleRow<'a>> {
    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    push_visible(root, 0, expanded, &mut seen, &mut rows);
    rows
}

fn push_visible<'a>(
    node: &'a OrgNode,
    depth: usize,
    expanded: &HashSet<String>,
    seen: &mut HashSet<&'a str>,
    rows: &mut Vec<VisibleRow<'a>>,
) {
    if !seen.insert(node.id.as_str()) {
        return;
    }
    rows.push(VisibleRow { node, depth });
    if expanded.contains(&node.id) {
        for child in &node.children {
            push_visible(child, depth + 1, expanded, seen, rows);
        }
    }
}

/// Find a node by id anywhere in the tree.
pub fn find_node<'a>(root: &'a OrgNode, id: &str) -> Option<&'a OrgNode> {
    let mut seen = HashSet::new();
    find_inner(root, id, &mut seen)
}

fn find_inner<'a>(
    node: &'a OrgNode,
    id: &str,
    seen: &mut HashSet<&'a str>,
) -> Option<&'a OrgNode> {
    if node.id == id {
        return Some(node);
    }
    if !seen.insert(node.id.as_str()) {
        return None;
    }
    node.children
        .iter()
        .find_map(|child| find_inner(child, id, seen))
}

pub fn contains_id(root: &OrgNode, id: &str) -> bool {
    find_node(root, id).is_some()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn node(id: &str, children: Vec<OrgNode>) -> OrgNode {
        OrgNode {
            id: id.to_string(),
            display_name: format!("Person {}", id.to_uppercase()),
            job_title: "Engineer".to_string(),
            office_location: None,
            mail: Some(format!("{}@acme.com", id)),
            user_principal_name: Some(format!("{}@acme.com", id)),
            photo_url: None,
            children,
        }
    }

    /// a -> [b -> [d, e], c -> [f]]
    pub(crate) fn sample_tree() -> OrgNode {
        node(
            "a",
            vec![
                node("b", vec![node("d", vec![]), node("e", vec![])]),
                node("c", vec![node("f", vec![])]),
            ],
        )
    }

    fn ids(users: &[OrgUser]) -> Vec<&str> {
        users.iter().map(|u| u.id.as_str()).collect()
    }

    #[test]
    fn test_descendants_preorder_excludes_root() {
        let tree = sample_tree();
        assert_eq!(ids(&descendants(&tree)), vec!["b", "d", "e", "c", "f"]);
    }

    #[test]
    fn test_all_nodes_is_root_plus_descendants() {
        let tree = sample_tree();
        let all = all_nodes(&tree);
        assert_eq!(all.len(), 1 + descendants(&tree).len());
        assert_eq!(ids(&all), vec!["a", "b", "d", "e", "c", "f"]);
        let unique: HashSet<&str> = all.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(unique.len(), all.len());
    }

    #[test]
    fn test_leaf_root() {
        let tree = node("solo", vec![]);
        assert!(descendants(&tree).is_empty());
        assert_eq!(ids(&all_nodes(&tree)), vec!["solo"]);
    }

    #[test]
    fn test_duplicate_ids_emitted_once() {
        // Malformed response: "b" reports to both a and c, and c repeats the root.
        let tree = node(
            "a",
            vec![
                node("b", vec![]),
                node("c", vec![node("b", vec![]), node("a", vec![])]),
            ],
        );
        assert_eq!(ids(&all_nodes(&tree)), vec!["a", "b", "c"]);
        assert_eq!(ids(&descendants(&tree)), vec!["b", "c"]);
    }

    #[test]
    fn test_visible_rows_follow_expansion() {
        let tree = sample_tree();
        let mut expanded = HashSet::new();
        expanded.insert("a".to_string());

        let rows = visible_rows(&tree, &expanded);
        let shown: Vec<(&str, usize)> = rows.iter().map(|r| (r.node.id.as_str(), r.depth)).collect();
        assert_eq!(shown, vec![("a", 0), ("b", 1), ("c", 1)]);

        expanded.insert("b".to_string());
        let rows = visible_rows(&tree, &expanded);
        let shown: Vec<(&str, usize)> = rows.iter().map(|r| (r.node.id.as_str(), r.depth)).collect();
        assert_eq!(shown, vec![("a", 0), ("b", 1), ("d", 2), ("e", 2), ("c", 1)]);
    }

    #[test]
    fn test_visible_rows_collapsed_root_shows_only_root() {
        let tree = sample_tree();
        let rows = visible_rows(&tree, &HashSet::new());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].node.id, "a");
    }

    #[test]
    fn test_find_node() {
        let tree = sample_tree();
        assert_eq!(find_node(&tree, "f").map(|n| n.display_name.as_str()), Some("Person F"));
        assert!(find_node(&tree, "zzz").is_none());
        assert!(contains_id(&tree, "a"));
    }
}
