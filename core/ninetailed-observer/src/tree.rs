//! Element tree abstraction.

use crate::error::{ObserverError, ObserverResult};
use ninetailed_types::ElementId;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Read access to the host's element tree.
///
/// Only what click attribution needs: ancestry, tag names and attributes.
pub trait ElementTree: Send + Sync {
    /// Returns true if `element` is part of the tree.
    fn contains(&self, element: ElementId) -> bool;

    /// The parent of `element`, or `None` for roots and unknown handles.
    fn parent(&self, element: ElementId) -> Option<ElementId>;

    /// Lowercase tag name.
    fn tag_name(&self, element: ElementId) -> Option<String>;

    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    attributes: HashMap<String, String>,
}

/// In-memory element arena.
///
/// Elements can be created, changed and removed through a shared
/// reference, so a host keeps mutating the tree after handing an `Arc` of
/// it to the instance.
#[derive(Debug, Default)]
pub struct Document {
    inner: RwLock<Nodes>,
}

#[derive(Debug, Default)]
struct Nodes {
    nodes: HashMap<ElementId, Node>,
    next_id: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Nodes> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Nodes> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Creates an element under `parent` (or as a root) and returns its handle.
    pub fn create_element(
        &self,
        tag: &str,
        parent: Option<ElementId>,
    ) -> ObserverResult<ElementId> {
        let mut tree = self.write();
        if let Some(p) = parent {
            if !tree.nodes.contains_key(&p) {
                return Err(ObserverError::UnknownElement(p));
            }
        }

        tree.next_id += 1;
        let id = ElementId::from_raw(tree.next_id);
        tree.nodes.insert(
            id,
            Node {
                tag: tag.to_ascii_lowercase(),
                parent,
                children: Vec::new(),
                attributes: HashMap::new(),
            },
        );
        if let Some(node) = parent.and_then(|p| tree.nodes.get_mut(&p)) {
            node.children.push(id);
        }
        Ok(id)
    }

    pub fn set_attribute(
        &self,
        element: ElementId,
        name: &str,
        value: &str,
    ) -> ObserverResult<()> {
        let mut tree = self.write();
        let node = tree
            .nodes
            .get_mut(&element)
            .ok_or(ObserverError::UnknownElement(element))?;
        node.attributes.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Removes `element` and its whole subtree. Returns the removed handles.
    pub fn remove(&self, element: ElementId) -> ObserverResult<Vec<ElementId>> {
        let mut tree = self.write();
        let parent = tree
            .nodes
            .get(&element)
            .ok_or(ObserverError::UnknownElement(element))?
            .parent;
        if let Some(parent) = parent.and_then(|p| tree.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != element);
        }

        let mut removed = Vec::new();
        let mut stack = vec![element];
        while let Some(id) = stack.pop() {
            if let Some(node) = tree.nodes.remove(&id) {
                stack.extend(node.children);
                removed.push(id);
            }
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().nodes.is_empty()
    }
}

impl ElementTree for Document {
    fn contains(&self, element: ElementId) -> bool {
        self.read().nodes.contains_key(&element)
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.read().nodes.get(&element).and_then(|n| n.parent)
    }

    fn tag_name(&self, element: ElementId) -> Option<String> {
        self.read().nodes.get(&element).map(|n| n.tag.clone())
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.read()
            .nodes
            .get(&element)
            .and_then(|n| n.attributes.get(name).cloned())
    }
}
