use std::env;
use std::fmt::Write as _;
use std::io::Read;
use std::process::ExitCode;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use richlabel::{
    extract_plain_text, Color, DefaultStyle, ErrorPhase, FontSpec, ImageState, InterpretOptions,
    LabelContent, LabelError, LabelItem, MarkPlacement, MarkSpec, MarkupInterpreter,
    MemoryImageCache, StandardShapes, StyledRun,
};

#[derive(Clone, Debug)]
struct Args {
    markup: Option<String>,
    plain: bool,
    require_html: bool,
    font_size_px: f32,
    family: String,
    marks: MarkPlacement,
    seed: Option<u64>,
}

fn main() -> ExitCode {
    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.code == "CLI_HELP" => {
            println!("{}", help_text());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {}", err);
            eprintln!("{}", help_text());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), LabelError> {
    let cli = parse_args(args)?;
    let (markup, source) = match cli.markup.clone() {
        Some(markup) => (markup, "argument"),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).map_err(|e| {
                LabelError::new(ErrorPhase::Input, "INPUT_READ", e.to_string())
                    .with_source("stdin")
            })?;
            (buf.trim_end_matches(['\r', '\n']).to_string(), "stdin")
        }
    };
    log::debug!("read {} bytes of markup from {}", markup.len(), source);

    if cli.plain {
        println!("{}", extract_plain_text(&markup));
        return Ok(());
    }

    let options = InterpretOptions::default()
        .with_default_style(DefaultStyle::new(FontSpec::new(
            cli.family.clone(),
            cli.font_size_px,
        )))
        .with_require_html_tag(cli.require_html)
        .with_mark_placement(cli.marks);
    let interpreter = MarkupInterpreter::new(options);
    let mut cache = MemoryImageCache::new();
    let content = match cli.seed {
        Some(seed) => interpreter.interpret_with(
            &markup,
            &mut cache,
            &StandardShapes,
            &mut SmallRng::seed_from_u64(seed),
        ),
        None => interpreter.interpret_with_cache(&markup, &mut cache),
    };
    print!("{}", dump(&content));
    Ok(())
}

fn dump(content: &LabelContent) -> String {
    let mut out = String::new();
    if let Some(bg) = content.background() {
        let _ = writeln!(out, "background {}", bg.to_hex());
    }
    for item in content.iter() {
        match item {
            LabelItem::Run(run) => dump_run(&mut out, run),
            LabelItem::Mark(mark) => dump_mark(&mut out, "mark", mark),
            LabelItem::Image(image) => {
                let state = match image.state {
                    ImageState::Pending => "pending",
                    ImageState::Ready(_) => "ready",
                };
                let _ = writeln!(
                    out,
                    "image {:?} {} size={}x{} shift={:.2}",
                    image.src,
                    state,
                    dimension(image.width),
                    dimension(image.height),
                    image.baseline_shift
                );
            }
        }
    }
    for mark in content.trailing_marks() {
        dump_mark(&mut out, "trailing-mark", mark);
    }
    for request in content.image_requests() {
        let _ = writeln!(out, "request {:?} at {}", request.src, request.position);
    }
    out
}

fn dump_run(out: &mut String, run: &StyledRun) {
    let style = &run.style;
    let _ = write!(
        out,
        "run {:?} family={:?} size={:.2} weight={}",
        run.text, style.family, style.size_px, style.weight
    );
    if style.italic {
        out.push_str(" italic");
    }
    if style.strikethrough {
        out.push_str(" strike");
    }
    if style.underline {
        out.push_str(" underline");
    }
    if let Some(color) = style.color {
        let _ = write!(out, " color={}", color.to_hex());
    }
    if style.baseline_shift != 0.0 {
        let _ = write!(out, " shift={:.2}", style.baseline_shift);
    }
    out.push('\n');
}

fn dump_mark(out: &mut String, label: &str, mark: &MarkSpec) {
    let _ = writeln!(
        out,
        "{} {} {:.2}x{:.2} fill={} stroke={}",
        label,
        mark.shape.name(),
        mark.width,
        mark.height,
        hex_or_none(mark.fill),
        hex_or_none(mark.stroke)
    );
}

fn hex_or_none(color: Option<Color>) -> String {
    color.map_or_else(|| "none".to_string(), Color::to_hex)
}

fn dimension(value: Option<f32>) -> String {
    value.map_or_else(|| "?".to_string(), |v| format!("{:.0}", v))
}

fn usage_error(message: String) -> LabelError {
    LabelError::new(ErrorPhase::Input, "CLI_ARGS", message).with_source("argv")
}

fn parse_args(args: Vec<String>) -> Result<Args, LabelError> {
    let mut cfg = Args {
        markup: None,
        plain: false,
        require_html: false,
        font_size_px: 13.0,
        family: "System".to_string(),
        marks: MarkPlacement::Inline,
        seed: None,
    };

    let mut i = 1usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                return Err(LabelError::new(
                    ErrorPhase::Input,
                    "CLI_HELP",
                    "help requested",
                ));
            }
            "--plain" => {
                cfg.plain = true;
                i += 1;
            }
            "--require-html" => {
                cfg.require_html = true;
                i += 1;
            }
            "--font-size" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| usage_error("--font-size requires a value".to_string()))?;
                cfg.font_size_px = v
                    .parse::<f32>()
                    .ok()
                    .filter(|size| size.is_finite() && *size > 0.0)
                    .ok_or_else(|| usage_error(format!("invalid --font-size value '{}'", v)))?;
                i += 2;
            }
            "--family" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| usage_error("--family requires a value".to_string()))?;
                cfg.family = v.clone();
                i += 2;
            }
            "--marks" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| usage_error("--marks requires a value".to_string()))?;
                cfg.marks = match v.as_str() {
                    "inline" => MarkPlacement::Inline,
                    "trailing" => MarkPlacement::Trailing,
                    other => {
                        return Err(usage_error(format!("invalid --marks value '{}'", other)))
                    }
                };
                i += 2;
            }
            "--seed" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| usage_error("--seed requires a value".to_string()))?;
                cfg.seed = Some(
                    v.parse::<u64>()
                        .map_err(|_| usage_error(format!("invalid --seed value '{}'", v)))?,
                );
                i += 2;
            }
            other if other.starts_with("--") => {
                return Err(usage_error(format!("unknown option '{}'", other)));
            }
            positional => {
                if cfg.markup.is_some() {
                    return Err(usage_error(
                        "only one markup argument is accepted".to_string(),
                    ));
                }
                cfg.markup = Some(positional.to_string());
                i += 1;
            }
        }
    }
    Ok(cfg)
}

fn help_text() -> &'static str {
    r#"richlabel - interpret rich label markup and dump the styled items

USAGE:
  richlabel [markup] [options]
  echo '<b>hi</b>' | richlabel [options]

OPTIONS:
  --plain                 print the plain-text extraction instead of items
  --require-html          treat input without a leading <html> as plain text
  --font-size <px>        default font size (default: 13)
  --family <name>         default font family (default: System)
  --marks <mode>          inline|trailing (default: inline)
  --seed <n>              seed for `random` colors
  -h, --help              show this help
"#
}
