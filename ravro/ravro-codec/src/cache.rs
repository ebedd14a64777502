use std::{any::TypeId, collections::HashMap, sync::Arc};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

/// Schema identity and native type identity.
pub(crate) type CacheKey = (u64, TypeId);

/// Copy-on-write map of built codecs.
///
/// Lookups are a lock-free load. Insertion clones the map under a mutex, and
/// the first codec stored for a key wins: a racing builder gets the stored one
/// back and drops its own.
pub(crate) struct CodecCache<C: ?Sized> {
    map: ArcSwap<HashMap<CacheKey, Arc<C>>>,
    write: Mutex<()>,
}

impl<C: ?Sized> Default for CodecCache<C> {
    fn default() -> Self {
        Self {
            map: ArcSwap::from_pointee(HashMap::new()),
            write: Mutex::new(()),
        }
    }
}

impl<C: ?Sized> CodecCache<C> {
    pub(crate) fn get(&self, key: &CacheKey) -> Option<Arc<C>> {
        self.map.load().get(key).cloned()
    }

    pub(crate) fn insert(&self, key: CacheKey, codec: Arc<C>) -> Arc<C> {
        let _guard = self.write.lock();
        let current = self.map.load_full();
        if let Some(existing) = current.get(&key) {
            return Arc::clone(existing);
        }
        let mut next = HashMap::clone(&current);
        next.insert(key, Arc::clone(&codec));
        self.map.store(Arc::new(next));
        codec
    }

    pub(crate) fn len(&self) -> usize {
        self.map.load().len()
    }
}
