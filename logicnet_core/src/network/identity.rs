//! Run scoped identifiers for the nodes of a logic network
use indexmap::IndexMap;
use uuid::Uuid;

/// Assigns every entity source id one opaque identifier, and hands back the same
/// identifier every time that source id is seen again
///
/// Identifiers are UUIDs derived (v5) from the cache's namespace and the source id. A new
/// cache draws a random namespace, so identifiers are only stable within one run, unless
/// the namespace is fixed with [`IdentityCache::with_namespace`].
#[derive(Clone, Debug)]
pub struct IdentityCache {
    namespace: Uuid,
    ids: IndexMap<String, String>,
    /// Source id of every allocated identifier
    sources: IndexMap<String, String>,
}

impl IdentityCache {
    /// Create a cache with a random namespace
    pub fn new() -> Self {
        Self::with_namespace(Uuid::new_v4())
    }

    /// Create a cache with a fixed namespace
    pub fn with_namespace(namespace: Uuid) -> Self {
        IdentityCache {
            namespace,
            ids: IndexMap::new(),
            sources: IndexMap::new(),
        }
    }

    pub fn namespace(&self) -> Uuid {
        self.namespace
    }

    /// Get the identifier of an entity, allocating it on first request
    ///
    /// # Examples
    /// ```rust
    /// use logicnet_core::network::identity::IdentityCache;
    /// let mut cache = IdentityCache::new();
    /// let first = cache.id_for("R-HSA-113592").to_string();
    /// assert_eq!(cache.id_for("R-HSA-113592"), first);
    /// assert_eq!(cache.len(), 1);
    /// ```
    pub fn id_for(&mut self, source_id: &str) -> &str {
        let namespace = self.namespace;
        let sources = &mut self.sources;
        self.ids.entry(source_id.to_string()).or_insert_with(|| {
            let id = Uuid::new_v5(&namespace, source_id.as_bytes()).to_string();
            sources.insert(id.clone(), source_id.to_string());
            id
        })
    }

    /// Identifier of an entity, if one was already allocated
    pub fn get(&self, source_id: &str) -> Option<&str> {
        self.ids.get(source_id).map(String::as_str)
    }

    /// Source id an identifier was allocated for
    pub fn source_for(&self, id: &str) -> Option<&str> {
        self.sources.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// (source id, identifier) pairs in allocation order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.ids.iter().map(|(s, i)| (s.as_str(), i.as_str()))
    }
}

impl Default for IdentityCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_reused() {
        let mut cache = IdentityCache::new();
        let a = cache.id_for("A").to_string();
        let b = cache.id_for("B").to_string();
        assert_ne!(a, b);
        assert_ne!(a, "A");
        assert_eq!(cache.id_for("A"), a);
        assert_eq!(cache.get("B"), Some(b.as_str()));
        assert_eq!(cache.get("C"), None);
        assert_eq!(cache.source_for(&a), Some("A"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn fixed_namespace_is_reproducible() {
        let namespace = Uuid::new_v5(&Uuid::NAMESPACE_OID, b"logicnet-test");
        let mut first = IdentityCache::with_namespace(namespace);
        let mut second = IdentityCache::with_namespace(namespace);
        second.id_for("B");
        assert_eq!(first.id_for("A").to_string(), second.id_for("A"));
    }

    #[test]
    fn runs_do_not_share_ids() {
        let mut first = IdentityCache::new();
        let mut second = IdentityCache::new();
        assert_ne!(first.id_for("A").to_string(), second.id_for("A"));
    }

    #[test]
    fn allocation_order() {
        let mut cache = IdentityCache::default();
        for id in ["C", "A", "C", "B"] {
            cache.id_for(id);
        }
        let sources: Vec<&str> = cache.iter().map(|(s, _)| s).collect();
        assert_eq!(sources, vec!["C", "A", "B"]);
    }

    #[test]
    fn every_id_maps_back_to_its_source() {
        let mut cache = IdentityCache::new();
        for source in ["A", "B", "A", "C"] {
            cache.id_for(source);
        }
        for (source, id) in cache.iter() {
            assert_eq!(cache.source_for(id), Some(source));
        }
        assert_eq!(cache.source_for("A"), None);
        assert_eq!(cache.source_for("not-an-id"), None);
    }
}
