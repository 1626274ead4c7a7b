//! Entity metadata cache and the catalog that owns both caches

use super::accessor::{Accessor, AccessorCache};
use super::info::EntityInfo;
use super::Entity;
use crate::Result;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Memoizes one `EntityInfo` per mapped type
#[derive(Default)]
pub struct EntityCache {
    entries: RwLock<HashMap<TypeId, Arc<EntityInfo>>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata for `E`, built from `E::mapping()` on first access.
    ///
    /// Racing first accesses may each build the metadata, but only the first
    /// one stored is ever handed out.
    pub fn get<E: Entity>(&self) -> Result<Arc<EntityInfo>> {
        let type_id = TypeId::of::<E>();
        {
            let entries = self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(info) = entries.get(&type_id) {
                return Ok(info.clone());
            }
        }

        let built = Arc::new(EntityInfo::from_mapping(E::entity_name(), E::mapping())?);
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let info = entries.entry(type_id).or_insert(built).clone();
        log::trace!(
            "cached metadata for {} (table {})",
            info.entity(),
            info.table()
        );
        Ok(info)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Metadata and accessor caches for one application lifetime
#[derive(Default)]
pub struct Catalog {
    entities: EntityCache,
    accessors: AccessorCache,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog ready to be shared between sessions
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn entity<E: Entity>(&self) -> Result<Arc<EntityInfo>> {
        self.entities.get::<E>()
    }

    pub fn accessor<E: Entity>(&self, member: &str) -> Result<Arc<Accessor<E>>> {
        self.accessors.get::<E>(member)
    }

    pub fn accessors<'a, E, I>(&self, members: I) -> Result<Vec<Arc<Accessor<E>>>>
    where
        E: Entity,
        I: IntoIterator<Item = &'a str>,
    {
        self.accessors.get_many::<E, I>(members)
    }

    pub fn entity_cache(&self) -> &EntityCache {
        &self.entities
    }

    pub fn accessor_cache(&self) -> &AccessorCache {
        &self.accessors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mapping;
    use std::sync::Barrier;

    #[derive(Default)]
    struct Account {
        id: i32,
        owner: String,
    }

    impl Entity for Account {
        fn mapping() -> Mapping<Self> {
            Mapping::<Self>::table("accounts")
                .key("id", "id", |a| &a.id, |a| &mut a.id)
                .field("owner", |a| &a.owner, |a| &mut a.owner)
        }
    }

    #[derive(Default)]
    struct Broken {
        a: i32,
    }

    impl Entity for Broken {
        fn mapping() -> Mapping<Self> {
            Mapping::<Self>::table("")
                .field("a", |b| &b.a, |b| &mut b.a)
        }
    }

    #[test]
    fn test_memoized_instance() {
        let cache = EntityCache::new();
        let first = cache.get::<Account>().unwrap();
        let second = cache.get::<Account>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalid_mapping_is_not_cached() {
        let cache = EntityCache::new();
        assert!(cache.get::<Broken>().is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_first_access_yields_one_instance() {
        let cache = EntityCache::new();
        let barrier = Barrier::new(8);
        let infos: Vec<Arc<EntityInfo>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        cache.get::<Account>().unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let stored = cache.get::<Account>().unwrap();
        assert!(infos.iter().all(|info| Arc::ptr_eq(info, &stored)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_catalogs_are_independent() {
        let first = Catalog::new();
        let second = Catalog::new();
        let a = first.entity::<Account>().unwrap();
        let b = second.entity::<Account>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(first.accessor::<Account>("owner").is_ok());
        assert!(second.accessor_cache().is_empty());
    }
}
