//! Persistent append-only annotation sequence.
//!
//! Committing pushes one node that shares every earlier node with the
//! previous version, so taking a history snapshot is O(1) instead of a deep
//! copy of the whole sequence.

use std::sync::Arc;

use crate::annotation::Annotation;

#[derive(Debug)]
struct Node {
    annotation: Annotation,
    prev: Option<Arc<Node>>,
}

/// Ordered annotations; insertion order is z-order.
#[derive(Debug, Clone, Default)]
pub struct AnnotationList {
    head: Option<Arc<Node>>,
    len: usize,
}

impl AnnotationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// New version with `annotation` on top; `self` is unchanged.
    pub fn pushed(&self, annotation: Annotation) -> Self {
        Self {
            head: Some(Arc::new(Node {
                annotation,
                prev: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    pub fn last(&self) -> Option<&Annotation> {
        self.head.as_deref().map(|node| &node.annotation)
    }

    /// Annotations bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Annotation> + '_ {
        let mut items = Vec::with_capacity(self.len);
        let mut cursor = self.head.as_deref();
        while let Some(node) = cursor {
            items.push(&node.annotation);
            cursor = node.prev.as_deref();
        }
        items.into_iter().rev()
    }

    pub fn to_vec(&self) -> Vec<Annotation> {
        self.iter().cloned().collect()
    }

    /// True when both versions share the same top node.
    #[cfg(test)]
    pub(crate) fn same_version(&self, other: &Self) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl FromIterator<Annotation> for AnnotationList {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        iter.into_iter()
            .fold(AnnotationList::new(), |list, ann| list.pushed(ann))
    }
}

impl Drop for AnnotationList {
    fn drop(&mut self) {
        // Unlink uniquely owned nodes one at a time so long chains do not
        // recurse on drop.
        let mut cursor = self.head.take();
        while let Some(node) = cursor {
            match Arc::try_unwrap(node) {
                Ok(mut owned) => cursor = owned.prev.take(),
                Err(_) => break,
            }
        }
    }
}
