//! Shared, size-bounded cache of rendered shadow layers
//!
//! Entries are keyed by every value that affects the pixels of a layer and
//! are immutable once stored: callers receive an `Arc<Pixmap>` and never
//! write through it. Eviction is least-recently-used under both a byte
//! budget and an entry limit.
//!
//! A factory always runs outside the lock. The first caller to miss a key
//! claims it with an in-flight slot; callers arriving while that factory
//! runs wait on the slot and receive its result, so each missing key is
//! computed once. If the factory fails (or panics) the slot is released,
//! the key stays absent and the waiters race to claim it again.

use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::{Condvar, Mutex};
use rustc_hash::{FxBuildHasher, FxHashMap, FxHasher};
use tiny_skia::Pixmap;

use crate::render::ShadowLayer;
use crate::render::defaults;
use crate::style::{Appearance, CornerFamily, LightSource, Style, Theme};
use crate::types::Bounds;

/// Structural fingerprint of one shadow layer.
///
/// Radii are the effective (clamped) radii for the bounds, so two
/// appearances that render identically share a key. Floats are compared by
/// their bit patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    family: CornerFamily,
    radii: [u32; 4],
    light: u32,
    dark: u32,
    elevation: u32,
    blur_radius: u32,
    light_source: LightSource,
    layer: ShadowLayer,
    width: u32,
    height: u32,
}

impl CacheKey {
    pub fn new(
        bounds: Bounds,
        appearance: &Appearance,
        theme: Theme,
        style: Style,
        light_source: LightSource,
        layer: ShadowLayer,
    ) -> Self {
        Self {
            family: appearance.family(),
            radii: appearance.effective_radii(bounds).to_array().map(f32::to_bits),
            light: theme.light.0,
            dark: theme.dark.0,
            elevation: style.elevation().to_bits(),
            blur_radius: style.blur_radius().to_bits(),
            light_source,
            layer,
            width: bounds.width.max(0) as u32,
            height: bounds.height.max(0) as u32,
        }
    }

    pub fn layer(&self) -> ShadowLayer {
        self.layer
    }

    /// Stable 64-bit hash, used in log output.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Cache budget
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Total pixel bytes kept. 0 disables storage.
    pub max_bytes: usize,
    /// Number of layers kept. 0 disables storage.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: defaults::CACHE_MAX_BYTES,
            max_entries: defaults::CACHE_MAX_ENTRIES,
        }
    }
}

impl CacheConfig {
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Lookups that waited for another caller's factory instead of running their own.
    pub coalesced: u64,
    pub insertions: u64,
    pub evictions: u64,
}

#[derive(Clone)]
enum Outcome {
    Pending,
    Ready(Arc<Pixmap>),
    Failed,
}

/// A factory currently running for one key.
struct InFlight {
    outcome: Mutex<Outcome>,
    settled: Condvar,
}

impl InFlight {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(Outcome::Pending),
            settled: Condvar::new(),
        }
    }

    fn wait(&self) -> Outcome {
        let mut outcome = self.outcome.lock();
        while matches!(*outcome, Outcome::Pending) {
            self.settled.wait(&mut outcome);
        }
        outcome.clone()
    }

    fn settle(&self, outcome: Outcome) {
        *self.outcome.lock() = outcome;
        self.settled.notify_all();
    }
}

/// Ownership of an in-flight slot. Dropping it unsettled (the factory
/// failed or unwound) releases the key and wakes the waiters.
struct Claim<'a> {
    cache: &'a ShadowCache,
    key: CacheKey,
    flight: Arc<InFlight>,
    settled: bool,
}

impl Claim<'_> {
    fn complete(mut self, pixmap: Arc<Pixmap>) -> Arc<Pixmap> {
        {
            let mut state = self.cache.state.lock();
            state.in_flight.remove(&self.key);
            self.cache.store(&mut state, self.key, Arc::clone(&pixmap));
        }
        self.flight.settle(Outcome::Ready(Arc::clone(&pixmap)));
        self.settled = true;
        pixmap
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        self.cache.state.lock().in_flight.remove(&self.key);
        self.flight.settle(Outcome::Failed);
    }
}

enum Lookup<'a> {
    Hit(Arc<Pixmap>),
    Wait(Arc<InFlight>),
    Claimed(Claim<'a>),
}

struct State {
    lru: LruCache<CacheKey, Arc<Pixmap>, FxBuildHasher>,
    in_flight: FxHashMap<CacheKey, Arc<InFlight>>,
    bytes: usize,
    stats: CacheStats,
}

impl State {
    fn evict_to(&mut self, max_bytes: usize, max_entries: usize) {
        while self.bytes > max_bytes || self.lru.len() > max_entries {
            let Some((key, evicted)) = self.lru.pop_lru() else {
                break;
            };
            self.bytes = self.bytes.saturating_sub(evicted.data().len());
            self.stats.evictions += 1;
            crate::log::debug!(
                "evicted shadow layer {:016x} ({} bytes, {} left)",
                key.fingerprint(),
                evicted.data().len(),
                self.bytes
            );
        }
    }
}

pub struct ShadowCache {
    config: CacheConfig,
    state: Mutex<State>,
}

impl Default for ShadowCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl fmt::Debug for ShadowCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ShadowCache")
            .field("config", &self.config)
            .field("entries", &state.lru.len())
            .field("in_flight", &state.in_flight.len())
            .field("bytes", &state.bytes)
            .field("stats", &state.stats)
            .finish()
    }
}

impl ShadowCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State {
                lru: LruCache::unbounded_with_hasher(FxBuildHasher),
                in_flight: FxHashMap::default(),
                bytes: 0,
                stats: CacheStats::default(),
            }),
        }
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Return the entry for `key`, building it with `factory` on a miss.
    ///
    /// Concurrent callers on the same missing key wait for the first
    /// caller's factory and share its result. If `factory` fails nothing is
    /// stored and the error is returned; the next caller retries.
    pub fn get_or_try_create<E>(
        &self,
        key: &CacheKey,
        factory: impl FnOnce() -> Result<Pixmap, E>,
    ) -> Result<Arc<Pixmap>, E> {
        let claim = loop {
            match self.lookup(key) {
                Lookup::Hit(hit) => return Ok(hit),
                Lookup::Claimed(claim) => break claim,
                Lookup::Wait(flight) => match flight.wait() {
                    Outcome::Ready(pixmap) => return Ok(pixmap),
                    // The other factory failed; try to claim the key ourselves
                    Outcome::Failed | Outcome::Pending => continue,
                },
            }
        };

        match factory() {
            Ok(pixmap) => Ok(claim.complete(Arc::new(pixmap))),
            Err(err) => {
                crate::log::warn!("shadow layer {:016x} failed to render", key.fingerprint());
                Err(err)
            }
        }
    }

    pub fn get_or_create(&self, key: &CacheKey, factory: impl FnOnce() -> Pixmap) -> Arc<Pixmap> {
        match self.get_or_try_create(key, || Ok::<_, Infallible>(factory())) {
            Ok(pixmap) => pixmap,
            Err(never) => match never {},
        }
    }

    /// Evict least-recently-used entries until at most `max_bytes` remain.
    pub fn trim_to(&self, max_bytes: usize) {
        let mut state = self.state.lock();
        state.evict_to(max_bytes, usize::MAX);
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.lru.clear();
        state.bytes = 0;
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.state.lock().lru.contains(key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pixel bytes currently held.
    pub fn bytes(&self) -> usize {
        self.state.lock().bytes
    }

    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }

    fn lookup(&self, key: &CacheKey) -> Lookup<'_> {
        let mut state = self.state.lock();
        if let Some(hit) = state.lru.get(key).cloned() {
            state.stats.hits += 1;
            crate::log::trace!("shadow cache hit {:016x}", key.fingerprint());
            return Lookup::Hit(hit);
        }
        if let Some(flight) = state.in_flight.get(key).cloned() {
            state.stats.coalesced += 1;
            crate::log::trace!(
                "shadow layer {:016x} is being rendered, waiting",
                key.fingerprint()
            );
            return Lookup::Wait(flight);
        }

        state.stats.misses += 1;
        crate::log::debug!("shadow cache miss {:016x} ({:?})", key.fingerprint(), key.layer());
        let flight = Arc::new(InFlight::new());
        state.in_flight.insert(*key, Arc::clone(&flight));
        Lookup::Claimed(Claim {
            cache: self,
            key: *key,
            flight,
            settled: false,
        })
    }

    fn store(&self, state: &mut State, key: CacheKey, pixmap: Arc<Pixmap>) {
        let size = pixmap.data().len();
        if self.config.max_entries == 0 || size > self.config.max_bytes {
            crate::log::debug!(
                "shadow layer {:016x} ({} bytes) exceeds the cache budget, not stored",
                key.fingerprint(),
                size
            );
            return;
        }

        if let Some(replaced) = state.lru.put(key, pixmap) {
            state.bytes = state.bytes.saturating_sub(replaced.data().len());
        }
        state.bytes += size;
        state.stats.insertions += 1;
        state.evict_to(self.config.max_bytes, self.config.max_entries);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::types::Color;

    fn key(width: i32, layer: ShadowLayer) -> CacheKey {
        CacheKey::new(
            Bounds::new(width, 10),
            &Appearance::rounded(4.0),
            Theme::default(),
            Style::new(2.0, 2.0).unwrap(),
            LightSource::TopLeft,
            layer,
        )
    }

    // 10x10 RGBA: 400 bytes
    fn pixmap() -> Pixmap {
        Pixmap::new(10, 10).unwrap()
    }

    #[test]
    fn hit_skips_the_factory() {
        let cache = ShadowCache::default();
        let calls = Cell::new(0);
        let make = || {
            calls.set(calls.get() + 1);
            pixmap()
        };

        let first = cache.get_or_create(&key(10, ShadowLayer::Outer), make);
        let second = cache.get_or_create(&key(10, ShadowLayer::Outer), make);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.get(), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                coalesced: 0,
                insertions: 1,
                evictions: 0
            }
        );
        assert_eq!(cache.bytes(), 400);
    }

    #[test]
    fn failed_factory_leaves_key_absent() {
        let cache = ShadowCache::default();
        let k = key(10, ShadowLayer::Inner);

        let err = cache.get_or_try_create(&k, || Err("boom")).unwrap_err();
        assert_eq!(err, "boom");
        assert!(!cache.contains(&k));
        assert!(cache.is_empty());

        let retried = cache.get_or_try_create(&k, || Ok::<_, &str>(pixmap()));
        assert!(retried.is_ok());
        assert!(cache.contains(&k));
    }

    #[test]
    fn evicts_least_recently_used_entry() {
        let cache = ShadowCache::new(CacheConfig::default().with_max_entries(2));
        let (a, b, c) = (
            key(1, ShadowLayer::Outer),
            key(2, ShadowLayer::Outer),
            key(3, ShadowLayer::Outer),
        );

        cache.get_or_create(&a, pixmap);
        cache.get_or_create(&b, pixmap);
        cache.get_or_create(&a, pixmap);
        cache.get_or_create(&c, pixmap);

        assert!(cache.contains(&a));
        assert!(!cache.contains(&b));
        assert!(cache.contains(&c));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn byte_budget_bounds_the_cache() {
        let cache = ShadowCache::new(CacheConfig::default().with_max_bytes(1000));
        for width in 1..=5 {
            cache.get_or_create(&key(width, ShadowLayer::Outer), pixmap);
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.bytes(), 800);
    }

    #[test]
    fn zero_budget_stores_nothing() {
        let cache = ShadowCache::new(CacheConfig::default().with_max_bytes(0));
        let k = key(10, ShadowLayer::Outer);
        let a = cache.get_or_create(&k, pixmap);
        let b = cache.get_or_create(&k, pixmap);
        assert_eq!(a.data(), b.data());
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn trim_and_clear() {
        let cache = ShadowCache::default();
        for width in 1..=4 {
            cache.get_or_create(&key(width, ShadowLayer::Outer), pixmap);
        }
        cache.trim_to(900);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&key(4, ShadowLayer::Outer)));

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.bytes(), 0);
    }

    #[test]
    fn keys_use_effective_radii() {
        let bounds = Bounds::new(40, 40);
        let make = |appearance: Appearance| {
            CacheKey::new(
                bounds,
                &appearance,
                Theme::default(),
                Style::default(),
                LightSource::TopLeft,
                ShadowLayer::Outer,
            )
        };
        assert_eq!(make(Appearance::rounded(1000.0)), make(Appearance::rounded(20.0)));
        assert_eq!(
            make(Appearance::rounded(1000.0)).fingerprint(),
            make(Appearance::rounded(20.0)).fingerprint()
        );
        assert_ne!(make(Appearance::rounded(10.0)), make(Appearance::rounded(20.0)));
        assert_ne!(key(10, ShadowLayer::Outer), key(10, ShadowLayer::Inner));
    }

    #[test]
    fn theme_is_part_of_the_key() {
        let base = |theme: Theme| {
            CacheKey::new(
                Bounds::new(10, 10),
                &Appearance::oval(),
                theme,
                Style::default(),
                LightSource::TopLeft,
                ShadowLayer::Outer,
            )
        };
        assert_ne!(
            base(Theme::default()),
            base(Theme::new(Color::WHITE, Color::rgb(0x30, 0x30, 0x30)))
        );
    }

    #[test]
    fn concurrent_misses_run_the_factory_once() {
        const CALLERS: usize = 8;
        let cache = ShadowCache::default();
        let k = key(10, ShadowLayer::Outer);
        let calls = AtomicUsize::new(0);
        let start = Barrier::new(CALLERS);

        let results: Vec<Arc<Pixmap>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..CALLERS)
                .map(|_| {
                    scope.spawn(|| {
                        start.wait();
                        cache.get_or_create(&k, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(50));
                            pixmap()
                        })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits + stats.coalesced, CALLERS as u64 - 1);
    }

    #[test]
    fn waiter_retries_after_a_failed_factory() {
        let cache = ShadowCache::default();
        let k = key(10, ShadowLayer::Inner);
        let claimed = Barrier::new(2);
        let calls = AtomicUsize::new(0);

        let (first, second) = std::thread::scope(|scope| {
            let failing = scope.spawn(|| {
                cache.get_or_try_create(&k, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    claimed.wait();
                    thread::sleep(Duration::from_millis(50));
                    Err("boom")
                })
            });
            let waiting = scope.spawn(|| {
                claimed.wait();
                cache.get_or_try_create(&k, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, &str>(pixmap())
                })
            });
            (failing.join().unwrap(), waiting.join().unwrap())
        });

        assert_eq!(first.unwrap_err(), "boom");
        assert!(second.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.contains(&k));
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn panicking_factory_releases_the_key() {
        let cache = ShadowCache::default();
        let k = key(10, ShadowLayer::Outer);

        let unwound = panic::catch_unwind(AssertUnwindSafe(|| {
            cache.get_or_create(&k, || panic!("raster failed"))
        }));
        assert!(unwound.is_err());
        assert!(!cache.contains(&k));

        let pixmap = cache.get_or_create(&k, pixmap);
        assert_eq!(pixmap.data().len(), 400);
        assert!(cache.contains(&k));
    }
}
