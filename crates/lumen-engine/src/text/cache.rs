use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::coords::Matrix;
use crate::error::Result;
use crate::sync::ReentrantRwLock;

use super::backend::{FontId, GlyphData, GlyphFormat, GlyphId};

/// A cached glyph: metrics plus outline or coverage, with any embedded
/// transform already applied.
pub type CachedGlyph = GlyphData;

/// Identity of a cached glyph. The size is keyed by its bit pattern and the
/// embedded transform by [`Matrix::linear_hash`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GlyphKey {
    pub font: FontId,
    pub glyph: GlyphId,
    pub size_bits: u32,
    pub transform_hash: u64,
    pub mode: GlyphFormat,
}

impl GlyphKey {
    pub fn new(font: FontId, glyph: GlyphId, size: f32, transform: &Matrix, mode: GlyphFormat) -> Self {
        Self {
            font,
            glyph,
            size_bits: size.to_bits(),
            transform_hash: transform.linear_hash(),
            mode,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

struct Entry {
    glyph: Arc<CachedGlyph>,
    /// Second-chance bit for clock eviction; set by readers.
    referenced: AtomicBool,
}

#[derive(Default)]
struct Slots {
    map: HashMap<GlyphKey, Entry>,
    /// Insertion ring walked by the clock hand.
    ring: Vec<GlyphKey>,
    hand: usize,
}

impl Slots {
    /// Inserts unless another writer got there first. Returns the stored glyph
    /// and whether an entry was evicted.
    fn insert(&mut self, key: GlyphKey, glyph: Arc<CachedGlyph>, capacity: usize) -> (Arc<CachedGlyph>, bool) {
        if let Some(existing) = self.map.get(&key) {
            existing.referenced.store(true, Ordering::Relaxed);
            return (existing.glyph.clone(), false);
        }

        let entry = Entry { glyph: glyph.clone(), referenced: AtomicBool::new(false) };
        if self.ring.len() < capacity {
            self.ring.push(key);
            self.map.insert(key, entry);
            return (glyph, false);
        }

        // Every entry gets a second chance, so this ends within two laps.
        loop {
            let victim = self.ring[self.hand];
            let spared = self
                .map
                .get(&victim)
                .is_some_and(|e| e.referenced.swap(false, Ordering::Relaxed));
            if spared {
                self.hand = (self.hand + 1) % self.ring.len();
                continue;
            }
            self.map.remove(&victim);
            log::debug!("glyph cache evicted {:?} glyph {}", victim.font, victim.glyph);
            self.ring[self.hand] = key;
            self.hand = (self.hand + 1) % self.ring.len();
            self.map.insert(key, entry);
            return (glyph, true);
        }
    }
}

/// Bounded glyph store shared by every canvas that renders text.
///
/// Lookups take the read lock and proceed in parallel; a miss loads the glyph
/// outside any lock and then publishes it under the write lock, so a slow
/// backend never blocks readers. Eviction follows the clock algorithm.
pub struct GlyphCache {
    slots: ReentrantRwLock<Slots>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl GlyphCache {
    /// `capacity == 0` disables caching: every lookup loads afresh.
    pub fn new(capacity: usize) -> Self {
        Self::with_strict_locks(capacity, false)
    }

    pub fn with_strict_locks(capacity: usize, strict: bool) -> Self {
        Self {
            slots: ReentrantRwLock::with_strict(Slots::default(), strict),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached glyph for `key`, if present. Counts as a hit when found.
    pub fn get(&self, key: &GlyphKey) -> Result<Option<Arc<CachedGlyph>>> {
        let slots = self.slots.read()?;
        let found = slots.map.get(key).map(|e| {
            e.referenced.store(true, Ordering::Relaxed);
            e.glyph.clone()
        });
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        Ok(found)
    }

    /// Returns the cached glyph for `key`, calling `load` on a miss.
    ///
    /// If `load` fails nothing is cached and the error is returned.
    pub fn get_or_insert_with(
        &self,
        key: GlyphKey,
        load: impl FnOnce() -> Result<CachedGlyph>,
    ) -> Result<Arc<CachedGlyph>> {
        if let Some(hit) = self.get(&key)? {
            return Ok(hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        log::debug!("glyph cache miss: {:?} glyph {} ({:?})", key.font, key.glyph, key.mode);
        let glyph = Arc::new(load()?);
        if self.capacity == 0 {
            return Ok(glyph);
        }

        let slots = self.slots.write()?;
        let (stored, evicted) = slots.with_mut(|s| s.insert(key, glyph, self.capacity))?;
        if evicted {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        Ok(stored)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.slots.read()?.map.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn clear(&self) -> Result<()> {
        let slots = self.slots.write()?;
        slots.with_mut(|s| *s = Slots::default())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len().unwrap_or(0),
        }
    }
}

impl std::fmt::Debug for GlyphCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphCache")
            .field("capacity", &self.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}
