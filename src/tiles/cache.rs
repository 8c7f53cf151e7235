use crate::core::constants::DEFAULT_CACHE_ENTRIES;
use crate::data::geojson::{FeatureSet, GeoJsonFeature};
use crate::projection::transform::project_features;
use crate::projection::{Projection, ProjectionType};
use crate::tiles::TileKey;
use instant::Instant;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Transformed features of one tile
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub features: Arc<Vec<GeoJsonFeature>>,
    pub created_at: Instant,
    pub last_accessed: Instant,
    /// Approximate serialized size
    pub size_bytes: usize,
}

impl CacheEntry {
    fn new(features: Vec<GeoJsonFeature>) -> Self {
        let size_bytes = features
            .iter()
            .map(|f| serde_json::to_vec(f).map(|v| v.len()).unwrap_or(0))
            .sum();
        let now = Instant::now();
        Self {
            features: Arc::new(features),
            created_at: now,
            last_accessed: now,
            size_bytes,
        }
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub max_size: usize,
    pub evictions: u64,
    /// Hit percentage, two decimals
    pub hit_rate: f64,
    pub estimated_bytes: usize,
}

/// Bounded LRU cache of projected tile features.
///
/// Owned by the map session rather than shared globally. Methods take
/// `&mut self`; wrap the cache in a mutex if several threads need it.
#[derive(Debug)]
pub struct ProjectionCache {
    entries: LruCache<TileKey, CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl ProjectionCache {
    /// Create a cache holding at most `max_entries` tiles (at least one)
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Looks up a tile; a hit marks it most recently used
    pub fn get_cached_tile(&mut self, key: &TileKey) -> Option<Arc<Vec<GeoJsonFeature>>> {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.last_accessed = Instant::now();
                self.hits += 1;
                log::debug!("projection cache hit {}", key);
                Some(Arc::clone(&entry.features))
            }
            None => {
                self.misses += 1;
                log::debug!("projection cache miss {}", key);
                None
            }
        }
    }

    /// Stores the features of a tile, replacing any previous value.
    ///
    /// Only a new key inserted into a full cache evicts an entry.
    pub fn set_cached_tile(&mut self, key: TileKey, features: impl Into<FeatureSet>) {
        let entry = CacheEntry::new(features.into().into_inner());
        if let Some((evicted, _)) = self.entries.push(key, entry) {
            if evicted != key {
                self.evictions += 1;
                log::debug!("projection cache evicted {}", evicted);
            }
        }
    }

    /// Checks for a tile without touching recency or counters
    pub fn contains(&self, key: &TileKey) -> bool {
        self.entries.contains(key)
    }

    /// Cached tile for `key`, projecting and storing `features` on a miss
    pub fn get_or_transform(
        &mut self,
        key: TileKey,
        features: &[GeoJsonFeature],
        projection: &dyn Projection,
    ) -> Arc<Vec<GeoJsonFeature>> {
        if let Some(cached) = self.get_cached_tile(&key) {
            return cached;
        }
        let projected = project_features(projection, features);
        self.set_cached_tile(key, projected);
        self.entries
            .peek(&key)
            .map(|entry| Arc::clone(&entry.features))
            .unwrap_or_default()
    }

    /// Drops every tile transformed with `projection_type`
    pub fn clear_projection_cache(&mut self, projection_type: ProjectionType) -> usize {
        self.clear_where(|key| key.projection_type == projection_type)
    }

    /// Drops every tile whose key matches `predicate`; returns how many went
    pub fn clear_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&TileKey) -> bool,
    {
        let doomed: Vec<TileKey> = self
            .entries
            .iter()
            .filter(|(key, _)| predicate(key))
            .map(|(key, _)| *key)
            .collect();
        for key in &doomed {
            self.entries.pop(key);
        }
        if !doomed.is_empty() {
            log::debug!("projection cache cleared {} tiles", doomed.len());
        }
        doomed.len()
    }

    /// Empties the cache; counters are kept
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn get_stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            (self.hits as f64 / lookups as f64 * 10_000.0).round() / 100.0
        };
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.entries.len(),
            max_size: self.capacity(),
            evictions: self.evictions,
            hit_rate,
            estimated_bytes: self.entries.iter().map(|(_, e)| e.size_bytes).sum(),
        }
    }
}

impl Default for ProjectionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geojson::{GeoJson, GeoJsonGeometry};
    use crate::projection::factory::create_projection;
    use crate::projection::ProjectionOptions;

    fn point_feature(lng: f64, lat: f64) -> GeoJsonFeature {
        GeoJsonFeature::new(GeoJsonGeometry::Point {
            coordinates: [lng, lat],
        })
    }

    fn key(x: u32) -> TileKey {
        TileKey::new(ProjectionType::Mercator, 5, x, 1)
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let mut cache = ProjectionCache::default();
        let feature = point_feature(10.0, 20.0);
        cache.set_cached_tile(key(1), vec![feature.clone()]);

        let hit = cache.get_cached_tile(&key(1)).unwrap();
        assert_eq!(hit.as_slice(), &[feature]);
        assert!(cache.get_cached_tile(&key(2)).is_none());

        let stats = cache.get_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 50.0);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.max_size, 100);
        assert!(stats.estimated_bytes > 0);
    }

    #[test]
    fn test_hit_rate_without_lookups() {
        let stats = ProjectionCache::default().get_stats();
        assert_eq!((stats.hits, stats.misses), (0, 0));
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[test]
    fn test_hit_rate_rounds_to_two_decimals() {
        let mut cache = ProjectionCache::default();
        cache.set_cached_tile(key(1), vec![point_feature(0.0, 0.0)]);
        assert!(cache.get_cached_tile(&key(1)).is_some());
        assert!(cache.get_cached_tile(&key(2)).is_none());
        assert!(cache.get_cached_tile(&key(3)).is_none());

        let stats = cache.get_stats();
        assert_eq!((stats.hits, stats.misses), (1, 2));
        assert_eq!(stats.hit_rate, 33.33);
    }

    #[test]
    fn test_capacity_eviction() {
        let mut cache = ProjectionCache::new(3);
        for x in 0..4 {
            cache.set_cached_tile(key(x), vec![point_feature(0.0, 0.0)]);
        }
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains(&key(0)));
        assert_eq!(cache.get_stats().evictions, 1);
    }

    #[test]
    fn test_update_does_not_evict() {
        let mut cache = ProjectionCache::new(2);
        cache.set_cached_tile(key(0), Vec::new());
        cache.set_cached_tile(key(1), Vec::new());
        cache.set_cached_tile(key(1), vec![point_feature(1.0, 1.0)]);

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&key(0)));
        assert_eq!(cache.get_stats().evictions, 0);
        assert_eq!(cache.get_cached_tile(&key(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_accepts_feature_collection() {
        let mut cache = ProjectionCache::default();
        let collection = GeoJson::FeatureCollection {
            features: vec![point_feature(1.0, 2.0), point_feature(3.0, 4.0)],
        };
        cache.set_cached_tile(key(7), collection);
        assert_eq!(cache.get_cached_tile(&key(7)).unwrap().len(), 2);
    }

    #[test]
    fn test_clear_by_projection() {
        let mut cache = ProjectionCache::default();
        cache.set_cached_tile(TileKey::new(ProjectionType::Mercator, 1, 0, 0), Vec::new());
        cache.set_cached_tile(TileKey::new(ProjectionType::Mercator, 1, 1, 0), Vec::new());
        cache.set_cached_tile(TileKey::new(ProjectionType::EqualEarth, 1, 0, 0), Vec::new());

        assert_eq!(cache.clear_projection_cache(ProjectionType::Mercator), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&TileKey::new(ProjectionType::EqualEarth, 1, 0, 0)));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_or_transform() {
        let mut cache = ProjectionCache::default();
        let projection =
            create_projection(ProjectionType::Mercator, &ProjectionOptions::default()).unwrap();
        let source = vec![point_feature(0.0, 0.0)];

        let first = cache.get_or_transform(key(3), &source, projection.as_ref());
        let second = cache.get_or_transform(key(3), &source, projection.as_ref());

        assert!(Arc::ptr_eq(&first, &second));
        match first[0].geometry.as_ref().unwrap() {
            GeoJsonGeometry::Point { coordinates } => {
                assert!((coordinates[0] - 480.0).abs() < 1e-9);
                assert!((coordinates[1] - 250.0).abs() < 1e-9);
            }
            other => panic!("unexpected geometry {}", other.type_name()),
        }
        let stats = cache.get_stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut cache = ProjectionCache::new(0);
        cache.set_cached_tile(key(0), Vec::new());
        cache.set_cached_tile(key(1), Vec::new());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.capacity(), 1);
    }
}
