//! Per-document anchor table.

use std::fmt;

use ahash::AHashMap;

use crate::shape::Shape;
use crate::value::Value;

/// Where an anchored node sits inside its collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Address {
    /// The document root.
    Root,
    Index(usize),
    /// The node is a mapping key.
    Key,
    /// The node is the value of this key.
    Value(String),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Root => f.write_str("root"),
            Address::Index(i) => write!(f, "index {i}"),
            Address::Key => f.write_str("key"),
            Address::Value(k) => write!(f, "value of '{k}'"),
        }
    }
}

/// A finished anchored node.
#[derive(Clone, Debug)]
pub struct AnchorEntry {
    pub value: Value,
    /// Declared shape of the slot the node was bound into.
    pub slot: Shape,
    /// Path of the collection that holds the node.
    pub collection: String,
    pub address: Address,
    /// Nodes in `value`; every alias to this anchor copies that many.
    pub nodes: usize,
}

#[derive(Debug, Default)]
pub struct AnchorTable {
    entries: AHashMap<String, AnchorEntry>,
}

impl AnchorTable {
    pub fn new() -> Self {
        AnchorTable::default()
    }

    /// Record a finished anchored node. A later anchor with the same name replaces it.
    pub fn register_anchor(&mut self, name: &str, entry: AnchorEntry) {
        tracing::trace!(anchor = name, collection = %entry.collection, address = %entry.address, "registered anchor");
        if let Some(previous) = self.entries.insert(name.to_string(), entry) {
            tracing::debug!(
                anchor = name,
                previous = %previous.address,
                "anchor redefined; aliases now refer to the latest definition"
            );
        }
    }

    pub fn find_reference(&self, name: &str) -> Option<&AnchorEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(v: i64) -> AnchorEntry {
        AnchorEntry {
            value: Value::from(v),
            slot: Shape::Any,
            collection: "/".into(),
            address: Address::Index(0),
            nodes: 1,
        }
    }

    #[test]
    fn last_definition_wins() {
        let mut table = AnchorTable::new();
        table.register_anchor("a", entry(1));
        table.register_anchor("a", entry(2));
        assert_eq!(table.len(), 1);
        assert_eq!(table.find_reference("a").map(|e| &e.value), Some(&Value::from(2i64)));
        assert!(table.find_reference("b").is_none());
    }
}
