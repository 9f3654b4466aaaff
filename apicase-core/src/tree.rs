//! Local category tree mirrored from catalog categories.
//!
//! The tree is append-only: catalog changes add leaves but never rename,
//! move or remove existing nodes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTreeNode {
    pub id: i64,
    /// Catalog category this node mirrors; `None` for nodes created locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<i64>,
    pub label: String,
    #[serde(default)]
    pub children: Vec<CategoryTreeNode>,
}

impl CategoryTreeNode {
    pub fn leaf(id: i64, catalog_id: Option<i64>, label: impl Into<String>) -> Self {
        Self {
            id,
            catalog_id,
            label: label.into(),
            children: Vec::new(),
        }
    }

    fn walk<'a>(&'a self, out: &mut Vec<&'a CategoryTreeNode>) {
        out.push(self);
        for child in &self.children {
            child.walk(out);
        }
    }
}

/// A forest of category nodes, stored as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTree {
    pub nodes: Vec<CategoryTreeNode>,
}

impl CategoryTree {
    pub fn new(nodes: Vec<CategoryTreeNode>) -> Self {
        Self { nodes }
    }

    fn all_nodes(&self) -> Vec<&CategoryTreeNode> {
        let mut out = Vec::new();
        for node in &self.nodes {
            node.walk(&mut out);
        }
        out
    }

    /// Largest node id at any depth, or 0 for an empty tree.
    pub fn max_id(&self) -> i64 {
        self.all_nodes().iter().map(|n| n.id).max().unwrap_or(0)
    }

    /// `{catalog category id -> node id}` at any depth.
    pub fn catalog_index(&self) -> BTreeMap<i64, i64> {
        self.all_nodes()
            .into_iter()
            .filter_map(|n| n.catalog_id.map(|catalog_id| (catalog_id, n.id)))
            .collect()
    }

    /// Node id mirroring `catalog_id`, or 0 when no node does.
    pub fn node_for(&self, catalog_id: i64) -> i64 {
        self.all_nodes()
            .into_iter()
            .find(|n| n.catalog_id == Some(catalog_id))
            .map(|n| n.id)
            .unwrap_or(0)
    }

    /// Appends a top-level leaf for each catalog category not yet mirrored.
    ///
    /// New ids continue from the current maximum in ascending category-id
    /// order. Returns the number of nodes added.
    pub fn merge_categories(&mut self, categories: &BTreeMap<i64, String>) -> usize {
        let known = self.catalog_index();
        let mut next_id = self.max_id();
        let mut added = 0;

        for (&catalog_id, name) in categories {
            if known.contains_key(&catalog_id) {
                continue;
            }
            next_id += 1;
            self.nodes
                .push(CategoryTreeNode::leaf(next_id, Some(catalog_id), name.clone()));
            added += 1;
        }

        added
    }
}
