mod common;

use core::convert::Infallible;

use common::budget_alloc::BudgetAlloc;
use common::labels::{nested_label, CORE_LABELS};
use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    pixelcolor::Rgb888,
    Pixel,
};
use richlabel::{InterpretOptions, MarkPlacement, MarkupInterpreter};
use richlabel_embedded_graphics::{EgRenderConfig, EgRenderer, EgTextMeasurer};
use richlabel_render::{LabelLayout, LayoutConfig};

const DISPLAY_WIDTH: u32 = 480;
const DISPLAY_HEIGHT: u32 = 800;
// Core labels peak well under 16KiB through interpret->layout->render.
// Keep a guardrail at 64KiB and tighten as the pipeline gets leaner.
const LABEL_BUDGET_BYTES: usize = 64 * 1024;
const NESTED_BUDGET_BYTES: usize = 256 * 1024;

#[global_allocator]
static ALLOC: BudgetAlloc = BudgetAlloc::new();

struct CountingDisplay {
    pixels: usize,
}

impl OriginDimensions for CountingDisplay {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

impl DrawTarget for CountingDisplay {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.pixels += pixels.into_iter().count();
        Ok(())
    }
}

fn run_pipeline(markup: &str) -> usize {
    let interpreter = MarkupInterpreter::new(
        InterpretOptions::default().with_mark_placement(MarkPlacement::Trailing),
    );
    let layout = LabelLayout::with_measurer(LayoutConfig::default(), EgTextMeasurer::new());
    let mut renderer = EgRenderer::new(EgRenderConfig::default());
    let mut display = CountingDisplay { pixels: 0 };

    let content = interpreter.interpret(markup);
    let label = layout.layout(&content);
    renderer
        .render(&label, &mut display)
        .unwrap_or_else(|e| match e {});
    display.pixels
}

#[test]
fn label_pipeline_stays_under_budget() {
    let nested = nested_label(64);
    let cases = CORE_LABELS
        .iter()
        .map(|markup| (*markup, LABEL_BUDGET_BYTES))
        .chain(core::iter::once((nested.as_str(), NESTED_BUDGET_BYTES)));

    for (markup, budget) in cases {
        let (pixels, usage) = ALLOC.measure(|| run_pipeline(markup));
        assert!(pixels > 0, "label {:?} drew nothing", markup);
        assert!(
            usage.peak_bytes <= budget,
            "pipeline peak over budget for {:?}: {} bytes ({:.1}KB), budget: {}KB",
            markup,
            usage.peak_bytes,
            usage.peak_kib(),
            budget / 1024
        );
        println!(
            "label_len={} peak_kib={:.1} allocs={}",
            markup.len(),
            usage.peak_kib(),
            usage.allocs
        );
    }
}
