use std::alloc::{GlobalAlloc, Layout, System};
use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use richlabel::{
    extract_plain_text, scan_events, InterpretOptions, MarkPlacement, MarkupInterpreter,
};
use richlabel_render::{LabelLayout, LayoutConfig};

const STATUS_LABEL: &str =
    "<html><bg \"#202020\"><b>Build</b> <c green>passed</c> in <i>42s</i><mark shape=\"Circle\" fill=\"green\"></html>";
const FORMULA_LABEL: &str =
    "H<sub>2</sub>O + CO<sub>2</sub> and E=mc<sup>2</sup> <u>underlined</u> <a>gone</a>";

fn plain_fixture(words: usize) -> String {
    let mut out = String::with_capacity(words * 6);
    for i in 0..words {
        if i > 0 {
            out.push(' ');
        }
        out.push_str("label");
    }
    out
}

fn nested_fixture(depth: usize) -> String {
    let mut out = String::with_capacity(depth * 40);
    for i in 0..depth {
        out.push_str(&format!(
            "<b><c \"#{:06x}\"><size {}>w{} ",
            (i * 4099) % 0xFF_FFFF,
            10 + i % 12,
            i
        ));
    }
    for _ in 0..depth {
        out.push_str("</size></c></b>");
    }
    out.push_str("<br>tail &amp; more");
    out
}

/// Counts live heap bytes and the high-water mark between resets.
struct TrackingAllocator {
    live: AtomicUsize,
    high_water: AtomicUsize,
}

#[global_allocator]
static GLOBAL_ALLOCATOR: TrackingAllocator = TrackingAllocator {
    live: AtomicUsize::new(0),
    high_water: AtomicUsize::new(0),
};

impl TrackingAllocator {
    fn grow(&self, bytes: usize) {
        let live = self.live.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.high_water.fetch_max(live, Ordering::Relaxed);
    }

    fn shrink(&self, bytes: usize) {
        let _ = self
            .live
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |live| {
                Some(live.saturating_sub(bytes))
            });
    }

    /// Peak bytes allocated by `op` on top of what was live before it.
    fn peak_during<R>(&self, op: impl FnOnce() -> R) -> (R, usize) {
        let baseline = self.live.load(Ordering::Relaxed);
        self.high_water.store(baseline, Ordering::Relaxed);
        let out = op();
        let peak = self.high_water.load(Ordering::Relaxed);
        (out, peak.saturating_sub(baseline))
    }
}

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            self.grow(layout.size());
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
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            match new_size.checked_sub(layout.size()) {
                Some(extra) => self.grow(extra),
                None => self.shrink(layout.size() - new_size),
            }
        }
        new_ptr
    }
}

/// min / median / mean / max of one sample set.
#[derive(Clone, Copy, Debug)]
struct Summary {
    min: u128,
    median: u128,
    mean: u128,
    max: u128,
}

impl Summary {
    fn of(mut samples: Vec<u128>) -> Self {
        samples.sort_unstable();
        let last = samples.len().saturating_sub(1);
        let sum: u128 = samples.iter().sum();
        Self {
            min: samples.first().copied().unwrap_or(0),
            median: samples.get(last / 2).copied().unwrap_or(0),
            mean: sum / samples.len().max(1) as u128,
            max: samples.get(last).copied().unwrap_or(0),
        }
    }
}

#[derive(Clone, Debug)]
struct CaseResult {
    fixture: String,
    case: &'static str,
    iterations: usize,
    time_ns: Summary,
    peak_heap_bytes: Summary,
}

fn run_case<F>(
    fixture: &str,
    case: &'static str,
    warmup_iters: usize,
    measure_iters: usize,
    mut op: F,
) -> CaseResult
where
    F: FnMut() -> usize,
{
    for _ in 0..warmup_iters {
        black_box(op());
    }

    let mut times = Vec::with_capacity(measure_iters);
    let mut peaks = Vec::with_capacity(measure_iters);
    for _ in 0..measure_iters {
        let start = Instant::now();
        let (out, peak) = GLOBAL_ALLOCATOR.peak_during(&mut op);
        times.push(start.elapsed().as_nanos());
        black_box(out);
        peaks.push(peak as u128);
    }

    CaseResult {
        fixture: fixture.to_string(),
        case,
        iterations: measure_iters,
        time_ns: Summary::of(times),
        peak_heap_bytes: Summary::of(peaks),
    }
}

fn main() {
    let quick = std::env::args().any(|arg| arg == "--quick");
    let warmup_iters = if quick { 1 } else { 2 };
    let measure_iters = if quick { 3 } else { 10 };
    let reps = if quick { 200 } else { 2_000 };

    println!("# richlabel benchmark");
    println!(
        "# mode={} warmup_iters={} measure_iters={} reps={}",
        if quick { "quick" } else { "full" },
        warmup_iters,
        measure_iters,
        reps
    );
    println!(
        "fixture,case,iterations,min_ns,median_ns,mean_ns,max_ns,min_peak_heap_bytes,median_peak_heap_bytes,mean_peak_heap_bytes,max_peak_heap_bytes"
    );

    let fixtures: Vec<(&str, String)> = vec![
        ("status", STATUS_LABEL.to_string()),
        ("formula", FORMULA_LABEL.to_string()),
        ("plain-200", plain_fixture(200)),
        ("nested-64", nested_fixture(64)),
    ];
    let interpreter = MarkupInterpreter::new(
        InterpretOptions::default().with_mark_placement(MarkPlacement::Trailing),
    );
    let layout = LabelLayout::new(LayoutConfig::default());

    let mut results = Vec::new();
    for (fixture_key, markup) in &fixtures {
        results.push(run_case(fixture_key, "scan_events", warmup_iters, measure_iters, || {
            (0..reps).map(|_| scan_events(markup).count()).sum()
        }));

        results.push(run_case(fixture_key, "interpret", warmup_iters, measure_iters, || {
            (0..reps)
                .map(|_| interpreter.interpret(markup).items().len())
                .sum()
        }));

        results.push(run_case(fixture_key, "plain_text", warmup_iters, measure_iters, || {
            (0..reps).map(|_| extract_plain_text(markup).len()).sum()
        }));

        results.push(run_case(
            fixture_key,
            "interpret_and_layout",
            warmup_iters,
            measure_iters,
            || {
                (0..reps)
                    .map(|_| {
                        let content = interpreter.interpret(markup);
                        layout.layout(&content).commands.len()
                    })
                    .sum()
            },
        ));
    }

    for result in &results {
        let (t, m) = (result.time_ns, result.peak_heap_bytes);
        println!(
            "{},{},{},{},{},{},{},{},{},{},{}",
            result.fixture,
            result.case,
            result.iterations,
            t.min,
            t.median,
            t.mean,
            t.max,
            m.min,
            m.median,
            m.mean,
            m.max
        );
    }
}
