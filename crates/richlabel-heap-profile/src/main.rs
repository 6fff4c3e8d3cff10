//! DHAT heap profiler for richlabel.
//!
//! Profiles allocation patterns across the label pipeline:
//! interpret -> layout -> render.
//!
//! Usage:
//!   cargo run -p richlabel-heap-profile --release -- [OPTIONS] [MARKUP_FILES...]
//!
//! Each markup file holds one label per line. With no files, a built-in
//! corpus of status-line labels is profiled.
//!
//! Outputs dhat-<phase>.json files in the output directory (default: target/memory).
//! Open in https://nnethercote.github.io/dh_view/dh_view.html

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::{Path, PathBuf};
use std::process::Command;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use richlabel::{extract_plain_text, InterpretOptions, MarkPlacement, MarkupInterpreter};
use richlabel_embedded_graphics::{EgRenderConfig, EgRenderer, EgTextMeasurer};
use richlabel_render::{LabelLayout, LayoutConfig};

const DISPLAY_WIDTH: u32 = 480;
const DISPLAY_HEIGHT: u32 = 800;

/// Passes over the corpus per profile, so per-label churn dominates setup.
const PASSES: usize = 50;

const BUILTIN_LABELS: &[&str] = &[
    "plain status text without any markup at all",
    "<html><b>Build</b> <c green>passed</c> in <i>42s</i></html>",
    "<bg \"#202020\"><c white>CPU</c> <size 10>load</size> <c \"#ff8800\">87%</c>",
    "H<sub>2</sub>O and E=mc<sup>2</sup> on one <u>line</u>",
    "<font Monospace>0x1F</font> <a>deprecated</a> <mark shape=\"Circle\" fill=\"red\"> alert",
    "first line<br><size 24>second</size><br><c random>third</c>",
    "<img src=\"icon.png\" width=16 alt=\"icon\"> with &amp; entities &lt;ok&gt;",
];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Interpret,
    Plain,
    Layout,
    Render,
    Full,
}

impl Phase {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "interpret" => Some(Self::Interpret),
            "plain" => Some(Self::Plain),
            "layout" => Some(Self::Layout),
            "render" => Some(Self::Render),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Interpret => "interpret",
            Self::Plain => "plain",
            Self::Layout => "layout",
            Self::Render => "render",
            Self::Full => "full",
        }
    }
}

/// Draw target that discards pixels, so only pipeline allocations show up.
struct NullDisplay {
    pixels: usize,
}

impl OriginDimensions for NullDisplay {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

impl DrawTarget for NullDisplay {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.pixels = self.pixels.saturating_add(pixels.into_iter().count());
        Ok(())
    }
}

fn read_labels(path: &Path) -> Vec<String> {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("read {}: {}", path.display(), e));
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_owned)
        .collect()
}

fn profile_labels(labels: &[String], phase: Phase) {
    let interpreter = MarkupInterpreter::new(
        InterpretOptions::default().with_mark_placement(MarkPlacement::Trailing),
    );
    let layout = LabelLayout::with_measurer(LayoutConfig::default(), EgTextMeasurer::new());
    let mut renderer = EgRenderer::new(EgRenderConfig::default());
    let mut display = NullDisplay { pixels: 0 };

    for _pass in 0..PASSES {
        for markup in labels {
            match phase {
                Phase::Interpret => {
                    let _content = interpreter.interpret(markup);
                }
                Phase::Plain => {
                    let _text = extract_plain_text(markup);
                }
                Phase::Layout => {
                    let content = interpreter.interpret(markup);
                    let _label = layout.layout(&content);
                }
                Phase::Render | Phase::Full => {
                    let content = interpreter.interpret(markup);
                    let label = layout.layout(&content);
                    let _ = renderer.render(&label, &mut display);
                    if phase == Phase::Full {
                        let _text = extract_plain_text(markup);
                        let _json = label.to_json();
                    }
                }
            }
        }
    }

    if matches!(phase, Phase::Render | Phase::Full) && display.pixels == 0 {
        panic!("render produced zero pixels");
    }
}

/// Extract a short name from a file path for use in output filenames.
fn short_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

fn usage() {
    eprintln!("Usage: heap-profile [OPTIONS] [MARKUP_FILES...]");
    eprintln!();
    eprintln!("Options:");
    eprintln!(
        "  --phase <interpret|plain|layout|render|full>  Pipeline phase to profile (default: render)"
    );
    eprintln!("  --out-dir <DIR>                      Output directory for dhat JSON (default: target/memory)");
    eprintln!(
        "  --aggregate                          Single profile for all files (default: per-file)"
    );
    eprintln!();
    eprintln!("By default, each file gets its own clean DHAT profile (separate process).");
    eprintln!("If no files are given, profiles the built-in label corpus.");
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut phase = Phase::Render;
    let mut out_dir = PathBuf::from("target/memory");
    let mut files: Vec<PathBuf> = Vec::with_capacity(8);
    let mut aggregate = false;
    // Internal flag: when set, we're a child process profiling a single file.
    let mut single_file_mode = false;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--phase" => {
                i += 1;
                let value = args.get(i).map(String::as_str).unwrap_or("");
                phase = Phase::from_str(value).unwrap_or_else(|| {
                    eprintln!("Unknown phase: {}", value);
                    usage();
                    std::process::exit(1);
                });
            }
            "--out-dir" => {
                i += 1;
                match args.get(i) {
                    Some(dir) => out_dir = PathBuf::from(dir),
                    None => {
                        usage();
                        std::process::exit(1);
                    }
                }
            }
            "--aggregate" => {
                aggregate = true;
            }
            "--single-file" => {
                single_file_mode = true;
            }
            "--help" | "-h" => {
                usage();
                std::process::exit(0);
            }
            other => {
                files.push(PathBuf::from(other));
            }
        }
        i += 1;
    }

    std::fs::create_dir_all(&out_dir).unwrap_or_else(|e| {
        eprintln!("Failed to create output dir {}: {}", out_dir.display(), e);
        std::process::exit(1);
    });

    let phase_name = phase.name();

    if files.is_empty() {
        let json_path = out_dir.join(format!("dhat-{phase_name}-builtin.json"));
        eprintln!(
            "heap-profile: phase={}, labels={} (builtin), out={}",
            phase_name,
            BUILTIN_LABELS.len(),
            out_dir.display()
        );
        let labels: Vec<String> = BUILTIN_LABELS.iter().map(|s| (*s).to_owned()).collect();
        let _profiler = dhat::Profiler::builder()
            .file_name(json_path.clone())
            .build();
        profile_labels(&labels, phase);
        eprintln!(
            "Done. Open {} in https://nnethercote.github.io/dh_view/dh_view.html",
            json_path.display()
        );
        return;
    }

    // Child process mode: profile exactly the one file with DHAT active.
    if single_file_mode {
        assert!(files.len() == 1, "--single-file expects exactly one file");
        let file = &files[0];
        let labels = read_labels(file);
        let name = short_name(file);
        let json_path = out_dir.join(format!("dhat-{phase_name}-{name}.json"));

        let _profiler = dhat::Profiler::builder().file_name(json_path).build();

        profile_labels(&labels, phase);
        return;
    }

    if aggregate {
        let labels: Vec<String> = files.iter().flat_map(|f| read_labels(f)).collect();
        let json_path = out_dir.join(format!("dhat-{phase_name}.json"));
        eprintln!(
            "heap-profile: phase={}, files={} (aggregate), out={}",
            phase_name,
            files.len(),
            out_dir.display()
        );

        let _profiler = dhat::Profiler::builder()
            .file_name(json_path.clone())
            .build();

        profile_labels(&labels, phase);

        eprintln!(
            "Done. Open {} in https://nnethercote.github.io/dh_view/dh_view.html",
            json_path.display()
        );
        return;
    }

    // Per-file mode (default): spawn a child process per file for clean DHAT sessions.
    let self_exe = std::env::current_exe().unwrap_or_else(|e| {
        eprintln!("Failed to determine own executable path: {}", e);
        std::process::exit(1);
    });

    eprintln!(
        "heap-profile: phase={}, files={} (per-file), out={}",
        phase_name,
        files.len(),
        out_dir.display()
    );

    let mut any_failed = false;
    for file in &files {
        let name = short_name(file);
        eprintln!(
            "  profiling: {} -> dhat-{}-{}.json",
            file.display(),
            phase_name,
            name
        );

        let status = Command::new(&self_exe)
            .arg("--single-file")
            .arg("--phase")
            .arg(phase_name)
            .arg("--out-dir")
            .arg(&out_dir)
            .arg(file)
            .status();

        match status {
            Ok(s) if s.success() => {}
            Ok(s) => {
                eprintln!("    FAILED (exit {})", s.code().unwrap_or(-1));
                any_failed = true;
            }
            Err(e) => {
                eprintln!("    FAILED to spawn: {}", e);
                any_failed = true;
            }
        }
    }

    eprintln!();
    eprintln!("Profiles saved to {}:", out_dir.display());
    eprintln!("Open in https://nnethercote.github.io/dh_view/dh_view.html");

    if any_failed {
        std::process::exit(1);
    }
}
