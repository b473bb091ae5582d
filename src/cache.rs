// src/cache.rs
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

/// Decompressed clusters of one archive, evicted oldest-first
pub struct ClusterCache {
    capacity: usize,
    inner: RwLock<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    clusters: HashMap<u32, Arc<Vec<u8>>>,
    order: VecDeque<u32>,
}

impl ClusterCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(CacheInner::default()),
        }
    }

    pub fn get(&self, cluster: u32) -> Option<Arc<Vec<u8>>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.clusters.get(&cluster).cloned()
    }

    pub fn insert(&self, cluster: u32, data: Arc<Vec<u8>>) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if inner.clusters.contains_key(&cluster) {
            return;
        }
        while inner.clusters.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.clusters.remove(&oldest);
                }
                None => break,
            }
        }
        inner.order.push_back(cluster);
        inner.clusters.insert(cluster, data);
    }

    #[cfg(test)]
    pub fn contains(&self, cluster: u32) -> bool {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.clusters.contains_key(&cluster)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.clusters.len()
    }

}
