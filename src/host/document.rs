use std::fmt;
use std::sync::Mutex;

/// What kind of reference a resource occupies in the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A `<script src=..>`-like element.
    Script,
    /// A `<link rel="stylesheet" href=..>`-like element.
    Style,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script => f.write_str("script"),
            Self::Style => f.write_str("style"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub href: String,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, href: impl Into<String>) -> Self {
        Self {
            kind,
            href: href.into(),
        }
    }
}

/// A document that script and stylesheet references can be appended to and
/// queried by attribute.
pub trait HostDocument: Send + Sync {
    fn has_reference(&self, kind: ResourceKind, href: &str) -> bool;

    fn append_reference(&self, reference: ResourceRef);
}

/// In-memory host document, used by the terminal host and in tests.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    references: Mutex<Vec<ResourceRef>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every appended reference, in insertion order.
    pub fn references(&self) -> Vec<ResourceRef> {
        match self.references.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of references matching `kind` and `href`.
    pub fn count(&self, kind: ResourceKind, href: &str) -> usize {
        self.references()
            .iter()
            .filter(|r| r.kind == kind && r.href == href)
            .count()
    }
}

impl HostDocument for MemoryDocument {
    fn has_reference(&self, kind: ResourceKind, href: &str) -> bool {
        self.count(kind, href) > 0
    }

    fn append_reference(&self, reference: ResourceRef) {
        let mut guard = match self.references.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(reference);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_document_tracks_references_by_kind() {
        let doc = MemoryDocument::new();
        doc.append_reference(ResourceRef::new(ResourceKind::Style, "https://cdn.test/a.css"));
        assert!(doc.has_reference(ResourceKind::Style, "https://cdn.test/a.css"));
        assert!(!doc.has_reference(ResourceKind::Script, "https://cdn.test/a.css"));
        assert_eq!(doc.references().len(), 1);
    }
}
