//! Position of the engine in the document tree.
//!
//! The path is a stack with one node per open collection, on top of a root node.
//! Every node carries a handle to the binding that fills it. The path never owns
//! bindings: the handles index the engine's arena.

use std::fmt;

use smallvec::SmallVec;

/// Non-owning handle to a binding in the engine arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BindingId(pub(crate) usize);

/// Position inside one open collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathComponent {
    /// `index` is the item being bound, or the next one when `in_item` is false.
    Sequence { index: usize, in_item: bool },
    /// `key` holds the text of the finished key while its value is being bound.
    Mapping {
        in_key: bool,
        in_item: bool,
        key: Option<String>,
    },
}

impl PathComponent {
    pub fn is_sequence(&self) -> bool {
        matches!(self, PathComponent::Sequence { .. })
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, PathComponent::Mapping { .. })
    }

    pub fn sequence_index(&self) -> Option<usize> {
        match self {
            PathComponent::Sequence { index, .. } => Some(*index),
            PathComponent::Mapping { .. } => None,
        }
    }

    /// Text of the key whose value is being bound.
    pub fn mapping_key(&self) -> Option<&str> {
        match self {
            PathComponent::Mapping { key, .. } => key.as_deref(),
            PathComponent::Sequence { .. } => None,
        }
    }

    fn in_item(&self) -> bool {
        match self {
            PathComponent::Sequence { in_item, .. } | PathComponent::Mapping { in_item, .. } => {
                *in_item
            }
        }
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathComponent::Sequence { index, .. } => write!(f, "{index}"),
            PathComponent::Mapping { key: Some(key), .. } => f.write_str(key),
            PathComponent::Mapping { key: None, .. } => Ok(()),
        }
    }
}

#[derive(Clone, Debug)]
struct PathNode {
    // None for the root node.
    component: Option<PathComponent>,
    slot: Option<BindingId>,
}

/// Stack of (component, binding handle) pairs from the document root down.
#[derive(Clone, Debug)]
pub struct Path {
    nodes: SmallVec<[PathNode; 16]>,
}

impl Default for Path {
    fn default() -> Self {
        Path::new()
    }
}

impl Path {
    pub fn new() -> Self {
        let mut nodes = SmallVec::new();
        nodes.push(PathNode {
            component: None,
            slot: None,
        });
        Path { nodes }
    }

    /// Number of open collections.
    pub fn depth(&self) -> usize {
        self.nodes.len() - 1
    }

    /// No collection is open: the next node is the document root.
    pub fn in_root(&self) -> bool {
        self.depth() == 0
    }

    pub fn in_sequence(&self) -> bool {
        self.last_component().is_some_and(PathComponent::is_sequence)
    }

    pub fn in_mapping(&self) -> bool {
        self.last_component().is_some_and(PathComponent::is_mapping)
    }

    /// The node being bound (or about to be) is a mapping key.
    pub fn in_mapping_key(&self) -> bool {
        matches!(
            self.last_component(),
            Some(PathComponent::Mapping { in_key: true, .. })
        )
    }

    pub fn in_mapping_value(&self) -> bool {
        matches!(
            self.last_component(),
            Some(PathComponent::Mapping { in_key: false, .. })
        )
    }

    /// The innermost collection has just been opened and no child is in progress.
    pub fn in_collection_root(&self) -> bool {
        self.last_component().is_some_and(|c| !c.in_item())
    }

    pub fn last_component(&self) -> Option<&PathComponent> {
        self.nodes.last().and_then(|n| n.component.as_ref())
    }

    /// Binding of the innermost open collection, or of the root.
    pub fn last_slot(&self) -> Option<BindingId> {
        self.nodes.last().and_then(|n| n.slot)
    }

    pub fn root_slot(&self) -> Option<BindingId> {
        self.nodes[0].slot
    }

    pub(crate) fn set_root_slot(&mut self, slot: Option<BindingId>) {
        self.nodes[0].slot = slot;
    }

    /// Open a collection node owned by `slot`.
    pub(crate) fn push_sequence(&mut self, slot: BindingId) {
        self.nodes.push(PathNode {
            component: Some(PathComponent::Sequence {
                index: 0,
                in_item: false,
            }),
            slot: Some(slot),
        });
    }

    pub(crate) fn push_mapping(&mut self, slot: BindingId) {
        self.nodes.push(PathNode {
            component: Some(PathComponent::Mapping {
                in_key: true,
                in_item: false,
                key: None,
            }),
            slot: Some(slot),
        });
    }

    /// Close the innermost collection node and release its slot.
    pub(crate) fn pop(&mut self) -> Option<BindingId> {
        if self.nodes.len() <= 1 {
            return None;
        }
        self.nodes.pop().and_then(|n| n.slot)
    }

    /// A child node of the innermost collection starts.
    pub(crate) fn enter_child(&mut self) {
        if let Some(node) = self.nodes.last_mut() {
            match &mut node.component {
                Some(PathComponent::Sequence { in_item, .. })
                | Some(PathComponent::Mapping { in_item, .. }) => *in_item = true,
                None => {}
            }
        }
    }

    /// The current child of the innermost collection is finished.
    ///
    /// `key_text` is the text of the child when it was a mapping key; it labels the
    /// value that follows.
    pub(crate) fn leave_child(&mut self, key_text: Option<String>) {
        if let Some(node) = self.nodes.last_mut() {
            match &mut node.component {
                Some(PathComponent::Sequence { index, in_item }) => {
                    *index += 1;
                    *in_item = false;
                }
                Some(PathComponent::Mapping {
                    in_key,
                    in_item,
                    key,
                }) => {
                    if *in_key {
                        *key = key_text;
                        *in_key = false;
                    } else {
                        *key = None;
                        *in_key = true;
                    }
                    *in_item = false;
                }
                None => {}
            }
        }
    }
}

/// `/` for the root, `/servers/0/name` below it.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        for node in &self.nodes[1..] {
            if let Some(component) = &node.component {
                let text = component.to_string();
                if text.is_empty() {
                    continue;
                }
                write!(f, "/{text}")?;
                wrote = true;
            }
        }
        if !wrote {
            f.write_str("/")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_sequence_and_mapping_positions() {
        let mut path = Path::new();
        assert!(path.in_root());
        assert_eq!(path.to_string(), "/");

        path.push_mapping(BindingId(1));
        assert!(path.in_mapping_key());
        assert!(path.in_collection_root());

        path.enter_child();
        assert!(!path.in_collection_root());
        path.leave_child(Some("servers".into()));
        assert!(path.in_mapping_value());
        assert_eq!(path.to_string(), "/servers");

        path.enter_child();
        path.push_sequence(BindingId(2));
        assert!(path.in_sequence());
        assert_eq!(path.depth(), 2);
        path.enter_child();
        path.leave_child(None);
        path.enter_child();
        assert_eq!(path.to_string(), "/servers/1");
        assert_eq!(path.last_component().and_then(PathComponent::sequence_index), Some(1));

        assert_eq!(path.pop(), Some(BindingId(2)));
        assert_eq!(path.last_slot(), Some(BindingId(1)));
        path.leave_child(None);
        assert!(path.in_mapping_key());
        assert_eq!(path.to_string(), "/");
    }

    #[test]
    fn root_cannot_be_popped() {
        let mut path = Path::new();
        path.set_root_slot(Some(BindingId(0)));
        assert_eq!(path.pop(), None);
        assert_eq!(path.root_slot(), Some(BindingId(0)));
        assert_eq!(path.last_slot(), Some(BindingId(0)));
    }
}
