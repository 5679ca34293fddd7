use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use adhelm_core::OrganizationId;

/// Organization-isolated in-memory key/value store.
///
/// Backs the concrete port implementations in this module. `update` holds
/// the write lock across the whole read-modify-write, which is the
/// serialization the persistence contract asks for (single-row RMW; no
/// cross-row transaction).
#[derive(Debug)]
pub struct InMemoryOrgStore<K, V> {
    inner: RwLock<HashMap<(OrganizationId, K), V>>,
}

impl<K, V> InMemoryOrgStore<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, organization_id: OrganizationId, key: &K) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(&(organization_id, key.clone())).cloned()
    }

    pub fn upsert(&self, organization_id: OrganizationId, key: K, value: V) {
        if let Ok(mut map) = self.inner.write() {
            map.insert((organization_id, key), value);
        }
    }

    /// Serialized read-modify-write of a single row.
    ///
    /// Returns `false` when the row does not exist.
    pub fn update(&self, organization_id: OrganizationId, key: &K, f: impl FnOnce(&mut V)) -> bool {
        let Ok(mut map) = self.inner.write() else {
            return false;
        };
        match map.get_mut(&(organization_id, key.clone())) {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        }
    }

    pub fn list(&self, organization_id: OrganizationId) -> Vec<V> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        map.iter()
            .filter_map(|((org, _k), v)| {
                if *org == organization_id {
                    Some(v.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn clear_organization(&self, organization_id: OrganizationId) {
        if let Ok(mut map) = self.inner.write() {
            map.retain(|(org, _k), _v| *org != organization_id);
        }
    }
}

impl<K, V> Default for InMemoryOrgStore<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organizations_are_isolated() {
        let store = InMemoryOrgStore::<u32, String>::new();
        let a = OrganizationId::new();
        let b = OrganizationId::new();

        store.upsert(a, 1, "a1".to_string());
        store.upsert(b, 1, "b1".to_string());

        assert_eq!(store.get(a, &1).as_deref(), Some("a1"));
        assert_eq!(store.get(b, &1).as_deref(), Some("b1"));
        assert_eq!(store.list(a).len(), 1);

        store.clear_organization(a);
        assert!(store.get(a, &1).is_none());
        assert_eq!(store.get(b, &1).as_deref(), Some("b1"));
    }

    #[test]
    fn update_mutates_existing_rows_only() {
        let store = InMemoryOrgStore::<u32, u64>::new();
        let org = OrganizationId::new();

        assert!(!store.update(org, &1, |v| *v += 1));
        store.upsert(org, 1, 10);
        assert!(store.update(org, &1, |v| *v += 1));
        assert_eq!(store.get(org, &1), Some(11));
    }
}
