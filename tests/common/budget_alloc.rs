use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Global allocator wrapper that records live bytes, the high-water mark
/// since the last [`BudgetAlloc::measure`], and the allocation count.
pub struct BudgetAlloc {
    live: AtomicUsize,
    high_water: AtomicUsize,
    allocs: AtomicUsize,
}

/// Heap usage of one measured closure, relative to the live bytes at entry.
#[derive(Clone, Copy, Debug)]
pub struct HeapUsage {
    pub peak_bytes: usize,
    pub allocs: usize,
}

impl HeapUsage {
    pub fn peak_kib(&self) -> f64 {
        self.peak_bytes as f64 / 1024.0
    }
}

impl BudgetAlloc {
    pub const fn new() -> Self {
        Self {
            live: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            allocs: AtomicUsize::new(0),
        }
    }

    /// Run `op` and report the extra heap it needed at its peak.
    pub fn measure<R>(&self, op: impl FnOnce() -> R) -> (R, HeapUsage) {
        let baseline = self.live.load(Ordering::SeqCst);
        self.high_water.store(baseline, Ordering::SeqCst);
        let allocs_before = self.allocs.load(Ordering::SeqCst);
        let out = op();
        let usage = HeapUsage {
            peak_bytes: self
                .high_water
                .load(Ordering::SeqCst)
                .saturating_sub(baseline),
            allocs: self
                .allocs
                .load(Ordering::SeqCst)
                .saturating_sub(allocs_before),
        };
        (out, usage)
    }

    fn grow(&self, bytes: usize) {
        let live = self.live.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.high_water.fetch_max(live, Ordering::SeqCst);
    }

    fn shrink(&self, bytes: usize) {
        let _ = self
            .live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                Some(live.saturating_sub(bytes))
            });
    }
}

unsafe impl GlobalAlloc for BudgetAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            self.grow(layout.size());
            self.allocs.fetch_add(1, Ordering::SeqCst);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        self.shrink(layout.size());
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            self.grow(layout.size());
            self.allocs.fetch_add(1, Ordering::SeqCst);
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            if new_size >= layout.size() {
                self.grow(new_size - layout.size());
            } else {
                self.shrink(layout.size() - new_size);
            }
            self.allocs.fetch_add(1, Ordering::SeqCst);
        }
        new_ptr
    }
}
