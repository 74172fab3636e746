//! Heap profiling for instrumented calls
//!
//! Peak memory is measured with a counting wrapper around the system
//! allocator. The binary installs it once:
//!
//! ```no_run
//! use sig_bench::profiler::TrackingAllocator;
//! use std::alloc::System;
//!
//! static SYSTEM_ALLOC: System = System;
//!
//! #[global_allocator]
//! static GLOBAL: TrackingAllocator<System> = TrackingAllocator::new(&SYSTEM_ALLOC);
//! ```
//!
//! Counting is process-global, so the counters are only reachable through a
//! [`MemoryProfiler`] handle. At most one handle exists at a time, and every
//! [`ProfilingSession`] stops tracking when it goes out of scope, including
//! during unwinding.
//!
//! Every block carries a small header recording the session that allocated
//! it. A session is charged for blocks allocated on its own thread while it
//! is active, and only frees of those blocks lower its live byte count. Blocks
//! allocated before the session, or by other threads, never move its numbers.

use std::alloc::{GlobalAlloc, Layout};
use std::cell::Cell;
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Id of the active session, 0 when stopped
static ACTIVE_SESSION: AtomicU64 = AtomicU64::new(0);
static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);
static INSTALLED: AtomicBool = AtomicBool::new(false);
static CURRENT_BYTES: AtomicUsize = AtomicUsize::new(0);
static PEAK_BYTES: AtomicUsize = AtomicUsize::new(0);

static PROFILER_LOCK: Mutex<()> = Mutex::new(());

thread_local! {
    static PROFILED_THREAD: Cell<bool> = const { Cell::new(false) };
}

const TAG_SIZE: usize = mem::size_of::<u64>();

fn on_profiled_thread() -> bool {
    PROFILED_THREAD.try_with(Cell::get).unwrap_or(false)
}

/// Session id to stamp on a block allocated now, 0 if untracked
#[inline]
fn current_tag() -> u64 {
    let session = ACTIVE_SESSION.load(Ordering::Relaxed);
    if session != 0 && on_profiled_thread() {
        session
    } else {
        0
    }
}

#[inline]
fn charge(tag: u64, size: usize) {
    if tag != 0 {
        let now = CURRENT_BYTES.fetch_add(size, Ordering::Relaxed) + size;
        PEAK_BYTES.fetch_max(now, Ordering::Relaxed);
    }
}

#[inline]
fn release(tag: u64, size: usize) {
    if tag != 0 && tag == ACTIVE_SESSION.load(Ordering::Relaxed) {
        let _ = CURRENT_BYTES.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
            Some(current.saturating_sub(size))
        });
    }
}

/// Header size in front of a block; keeps the user pointer aligned
#[inline]
fn header_size(layout: Layout) -> usize {
    layout.align().max(TAG_SIZE)
}

#[inline]
fn inner_layout(layout: Layout, size: usize) -> Option<Layout> {
    let header = header_size(layout);
    let total = size.checked_add(header)?;
    Layout::from_size_align(total, layout.align().max(TAG_SIZE)).ok()
}

/// Allocator wrapper that feeds the profiler counters
pub struct TrackingAllocator<A: 'static> {
    inner: &'static A,
}

impl<A: 'static> TrackingAllocator<A> {
    pub const fn new(inner: &'static A) -> Self {
        Self { inner }
    }
}

impl<A: GlobalAlloc + 'static> TrackingAllocator<A> {
    /// Stamp `tag` into the header of `base` and return the user pointer
    unsafe fn finish(base: *mut u8, layout: Layout, tag: u64) -> *mut u8 {
        let user = base.add(header_size(layout));
        ptr::write(user.sub(TAG_SIZE) as *mut u64, tag);
        user
    }

    unsafe fn read_tag(user: *mut u8) -> u64 {
        ptr::read(user.sub(TAG_SIZE) as *const u64)
    }

    unsafe fn allocate(&self, layout: Layout, zeroed: bool) -> *mut u8 {
        if !INSTALLED.load(Ordering::Relaxed) {
            INSTALLED.store(true, Ordering::Relaxed);
        }
        let Some(inner) = inner_layout(layout, layout.size()) else {
            return ptr::null_mut();
        };
        let base = if zeroed {
            self.inner.alloc_zeroed(inner)
        } else {
            self.inner.alloc(inner)
        };
        if base.is_null() {
            return base;
        }
        let tag = current_tag();
        charge(tag, layout.size());
        Self::finish(base, layout, tag)
    }
}

// SAFETY: every block is forwarded to the wrapped allocator with a layout
// grown by an aligned header, and the same layout is rebuilt on free. The
// counters are plain atomics and a const thread-local, neither allocates.
unsafe impl<A: GlobalAlloc + 'static> GlobalAlloc for TrackingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        self.allocate(layout, false)
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        self.allocate(layout, true)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        let tag = Self::read_tag(ptr);
        let base = ptr.sub(header_size(layout));
        if let Some(inner) = inner_layout(layout, layout.size()) {
            self.inner.dealloc(base, inner);
        }
        release(tag, layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let (Some(old_inner), Some(new_inner)) = (
            inner_layout(layout, layout.size()),
            inner_layout(layout, new_size),
        ) else {
            return ptr::null_mut();
        };
        let old_tag = Self::read_tag(ptr);
        let base = ptr.sub(header_size(layout));

        let new_base = self.inner.realloc(base, old_inner, new_inner.size());
        if new_base.is_null() {
            return new_base;
        }

        // A resized block counts as a fresh allocation of the new size.
        release(old_tag, layout.size());
        let tag = current_tag();
        charge(tag, new_size);
        Self::finish(new_base, layout, tag)
    }
}

/// Exclusive handle on the process-wide allocation counters
///
/// Acquiring blocks until no other handle is alive. The handle is not `Send`
/// and must not be acquired twice on the same thread.
pub struct MemoryProfiler {
    _exclusive: MutexGuard<'static, ()>,
}

impl MemoryProfiler {
    /// Acquire the profiler, leaving it in the stopped state
    pub fn acquire() -> Self {
        let guard = PROFILER_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        stop_tracking();
        Self { _exclusive: guard }
    }

    /// Whether a [`TrackingAllocator`] has served at least one allocation
    ///
    /// When this is `false` every session reports a peak of 0 bytes.
    pub fn allocator_installed(&self) -> bool {
        INSTALLED.load(Ordering::Relaxed)
    }

    pub fn is_tracking(&self) -> bool {
        ACTIVE_SESSION.load(Ordering::SeqCst) != 0
    }

    /// Start a new session on the calling thread
    ///
    /// Any previous tracking state is stopped and the counters are reset
    /// before tracking begins.
    pub fn start(&mut self) -> ProfilingSession<'_> {
        stop_tracking();
        CURRENT_BYTES.store(0, Ordering::SeqCst);
        PEAK_BYTES.store(0, Ordering::SeqCst);

        let session = NEXT_SESSION.fetch_add(1, Ordering::SeqCst);
        let _ = PROFILED_THREAD.try_with(|flag| flag.set(true));
        ACTIVE_SESSION.store(session, Ordering::SeqCst);
        ProfilingSession { _profiler: self }
    }
}

fn stop_tracking() {
    ACTIVE_SESSION.store(0, Ordering::SeqCst);
    let _ = PROFILED_THREAD.try_with(|flag| flag.set(false));
}

impl Drop for MemoryProfiler {
    fn drop(&mut self) {
        stop_tracking();
    }
}

/// An active tracking window; tracking stops when it is dropped
pub struct ProfilingSession<'a> {
    _profiler: &'a mut MemoryProfiler,
}

impl ProfilingSession<'_> {
    /// Peak bytes allocated since the session started
    pub fn peak_bytes(&self) -> usize {
        PEAK_BYTES.load(Ordering::SeqCst)
    }

    /// Bytes currently attributed to the session
    pub fn current_bytes(&self) -> usize {
        CURRENT_BYTES.load(Ordering::SeqCst)
    }

    /// Stop tracking and return the peak
    pub fn stop(self) -> usize {
        let peak = self.peak_bytes();
        drop(self);
        peak
    }
}

impl Drop for ProfilingSession<'_> {
    fn drop(&mut self) {
        stop_tracking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hint::black_box;

    const MIB: usize = 1 << 20;

    #[test]
    fn test_allocator_installed_in_tests() {
        let _warm = black_box(vec![0u8; 16]);
        let profiler = MemoryProfiler::acquire();
        assert!(profiler.allocator_installed());
        assert!(!profiler.is_tracking());
    }

    #[test]
    fn test_peak_covers_allocation() {
        let mut profiler = MemoryProfiler::acquire();
        let session = profiler.start();
        let buffer = black_box(vec![1u8; MIB]);
        let peak = session.stop();
        drop(buffer);

        assert!(peak >= MIB, "peak {} < 1 MiB", peak);
        assert!(!profiler.is_tracking());
    }

    #[test]
    fn test_start_resets_previous_peak() {
        let mut profiler = MemoryProfiler::acquire();

        let session = profiler.start();
        let big = black_box(vec![0u8; 4 * MIB]);
        let first = session.stop();
        drop(big);

        let session = profiler.start();
        let small = black_box(vec![0u8; 1024]);
        let second = session.stop();
        drop(small);

        assert!(first >= 4 * MIB);
        assert!(second < first, "second peak {} not reset (first {})", second, first);
    }

    #[test]
    fn test_allocations_outside_session_ignored() {
        let mut profiler = MemoryProfiler::acquire();
        let before = black_box(vec![0u8; 8 * MIB]);

        let session = profiler.start();
        drop(before);
        let current = session.current_bytes();
        let peak = session.stop();

        assert_eq!(current, 0);
        assert!(peak < 8 * MIB);
    }

    #[test]
    fn test_freeing_older_block_keeps_session_bytes() {
        let mut profiler = MemoryProfiler::acquire();
        let older = black_box(vec![1u8; MIB]);

        let session = profiler.start();
        let first = black_box(vec![2u8; MIB]);
        drop(older);
        let second = black_box(vec![3u8; MIB]);
        let live = session.current_bytes();
        let peak = session.stop();
        drop((first, second));

        assert!(live >= 2 * MIB, "live {} < 2 MiB", live);
        assert!(peak >= 2 * MIB, "peak {} < 2 MiB", peak);
    }

    #[test]
    fn test_other_threads_not_charged() {
        let mut profiler = MemoryProfiler::acquire();

        let session = profiler.start();
        std::thread::spawn(|| black_box(vec![0u8; 8 * MIB]).len())
            .join()
            .unwrap();
        let peak = session.stop();

        assert!(peak < 8 * MIB, "peak {} includes another thread", peak);
    }

    #[test]
    fn test_realloc_tracks_new_size() {
        let mut profiler = MemoryProfiler::acquire();

        let session = profiler.start();
        let mut grown = black_box(Vec::<u8>::with_capacity(1024));
        grown.reserve_exact(2 * MIB);
        let live = session.current_bytes();
        let peak = session.stop();
        drop(grown);

        assert!(live >= 2 * MIB);
        assert!(live < 3 * MIB, "resized block counted twice: {}", live);
        assert!(peak >= 2 * MIB);
    }

    #[test]
    fn test_aligned_allocations_round_trip() {
        #[repr(align(64))]
        struct Wide([u8; 64]);

        let mut profiler = MemoryProfiler::acquire();
        let session = profiler.start();
        let blocks: Vec<Box<Wide>> = (0..32).map(|i| Box::new(Wide([i as u8; 64]))).collect();
        let peak = session.stop();

        for (i, block) in blocks.iter().enumerate() {
            assert_eq!(&**block as *const Wide as usize % 64, 0);
            assert_eq!(block.0[63], i as u8);
        }
        assert!(peak >= 32 * 64);
    }

    #[test]
    fn test_session_stops_on_unwind() {
        let mut profiler = MemoryProfiler::acquire();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _session = profiler.start();
            panic!("operation blew up");
        }));

        assert!(result.is_err());
        assert!(!profiler.is_tracking());
    }
}
