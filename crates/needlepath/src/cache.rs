//! Stitch plan cache.
//!
//! Generating a satin is cheap-ish, but a design can have hundreds of them
//! and most don't change between runs. Each element is fingerprinted from
//! everything that can affect its stitches; identical fingerprints reuse the
//! stored groups.
//!
//! ## Rust Lesson #31: Hashing floats
//!
//! `f64` doesn't implement `Hash` (NaN != NaN), so we feed the raw bits from
//! `to_bits()` into the key. Two coordinates that print the same but differ
//! in the last bit get different keys, which only costs a cache miss.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use crate::geometry::Point;
use crate::stitch::StitchGroup;

/// Fingerprint of an element's stitch-relevant inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(pub u64);

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Feeds inputs into a [`CacheKey`].
///
/// 64-bit FNV-1a over little-endian bytes, so a key means the same thing on
/// every platform and toolchain and can be stored on disk.
///
/// Every `update_*` call is prefixed with a type tag and lengths are hashed
/// before sequences, so `["ab"]` and `["a", "b"]` don't collide.
pub struct CacheKeyBuilder {
    state: u64,
}

impl Default for CacheKeyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheKeyBuilder {
    pub fn new() -> Self {
        Self { state: FNV_OFFSET }
    }

    fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        for &b in bytes {
            self.state ^= u64::from(b);
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
        self
    }

    fn length(&mut self, len: usize) -> &mut Self {
        self.bytes(&(len as u64).to_le_bytes())
    }

    pub fn update_str(&mut self, value: &str) -> &mut Self {
        self.bytes(&[0]).length(value.len()).bytes(value.as_bytes())
    }

    pub fn update_f64(&mut self, value: f64) -> &mut Self {
        self.bytes(&[1]).bytes(&value.to_bits().to_le_bytes())
    }

    pub fn update_point(&mut self, point: Point) -> &mut Self {
        self.update_f64(point.x).update_f64(point.y)
    }

    pub fn update_points(&mut self, points: &[Point]) -> &mut Self {
        self.bytes(&[2]).length(points.len());
        for &p in points {
            self.update_point(p);
        }
        self
    }

    /// An optional point; `None` hashes differently from any point.
    pub fn update_opt_point(&mut self, point: Option<Point>) -> &mut Self {
        match point {
            Some(p) => self.bytes(&[3]).update_point(p),
            None => self.bytes(&[4]),
        }
    }

    pub fn update_pairs(&mut self, pairs: &[(String, String)]) -> &mut Self {
        self.bytes(&[5]).length(pairs.len());
        for (k, v) in pairs {
            self.update_str(k).update_str(v);
        }
        self
    }

    pub fn finish(&self) -> CacheKey {
        CacheKey(self.state)
    }
}

/// Storage for generated stitch groups.
///
/// Implementations must be shareable across threads so elements can be
/// embroidered in parallel.
pub trait StitchCache: Send + Sync {
    fn get(&self, key: CacheKey) -> Option<Vec<StitchGroup>>;

    /// Store `groups` unless something is already stored under `key`.
    fn put_if_absent(&self, key: CacheKey, groups: &[StitchGroup]);
}

/// In-process cache backed by a `HashMap`.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, Vec<StitchGroup>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StitchCache for MemoryCache {
    fn get(&self, key: CacheKey) -> Option<Vec<StitchGroup>> {
        // A poisoned lock just means another thread panicked mid-insert;
        // treat it as a miss.
        self.entries.lock().ok()?.get(&key).cloned()
    }

    fn put_if_absent(&self, key: CacheKey, groups: &[StitchGroup]) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.entry(key).or_insert_with(|| groups.to_vec());
        }
    }
}

/// A cache that never stores anything.
pub struct NoCache;

impl StitchCache for NoCache {
    fn get(&self, _key: CacheKey) -> Option<Vec<StitchGroup>> {
        None
    }

    fn put_if_absent(&self, _key: CacheKey, _groups: &[StitchGroup]) {}
}
