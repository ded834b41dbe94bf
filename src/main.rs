//! # glyphflow CLI
//!
//! Usage:
//!   glyphflow request.json -o layout.json
//!   echo '{ ... }' | glyphflow
//!   glyphflow request.json --font NotoSans-Regular.ttf --font NotoNaskhArabic-Regular.ttf
//!   glyphflow --example > request.json
//!
//! Without `--font`, text is shaped with the built-in fixed-pitch service
//! (every glyph half an em wide). Fonts given with `--font` get ids in the
//! order they are listed. Set `RUST_LOG=debug` to trace the pipeline.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use glyphflow::{FixedPitchService, FontService, LayoutResult};

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_request_json());
        return;
    }

    let input = match read_input(&args) {
        Ok(input) => input,
        Err(e) => fail(&format!("Failed to read input: {}", e)),
    };

    let output_path = args
        .windows(2)
        .find(|w| w[0] == "-o")
        .map(|w| w[1].clone());
    let font_paths: Vec<&String> = args
        .windows(2)
        .filter(|w| w[0] == "--font")
        .map(|w| &w[1])
        .collect();

    let result = if font_paths.is_empty() {
        glyphflow::layout_json(&input, &FixedPitchService::new())
    } else {
        let mut service = FontService::new();
        for path in &font_paths {
            if let Err(e) = service.load_file(path) {
                fail(&e.to_string());
            }
        }
        glyphflow::layout_json(&input, &service)
    };

    let result = match result {
        Ok(result) => result,
        Err(e) => fail(&format!("Layout failed: {}", e)),
    };
    report(&result);

    let json = match serde_json::to_string_pretty(&result) {
        Ok(json) => json,
        Err(e) => fail(&format!("Failed to serialize layout: {}", e)),
    };
    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(&path, json.as_bytes()) {
                fail(&format!("Failed to write {}: {}", path, e));
            }
            eprintln!("✓ Written {} bytes to {}", json.len(), path);
        }
        None => println!("{}", json),
    }
}

/// First positional argument as a file, or stdin.
fn read_input(args: &[String]) -> io::Result<String> {
    let positional = args
        .iter()
        .enumerate()
        .skip(1)
        .find(|(i, a)| !a.starts_with('-') && !matches!(args[i - 1].as_str(), "-o" | "--font"))
        .map(|(_, a)| a);
    match positional {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn report(result: &LayoutResult) {
    let outcome = &result.outcome;
    eprintln!(
        "✓ {} lines, {} glyph runs",
        outcome.lines.len(),
        outcome.glyph_runs
    );
    if !outcome.is_complete() {
        eprintln!(
            "! {} chars did not fit on the page",
            outcome.text_remaining
        );
    }
    let stats = &result.stats;
    if stats.shaping_failures > 0 || stats.analysis_anomalies > 0 || stats.format_anomalies > 0 {
        eprintln!(
            "! {} shaping failures, {} analysis anomalies, {} format anomalies",
            stats.shaping_failures, stats.analysis_anomalies, stats.format_anomalies
        );
    }
}

fn fail(message: &str) -> ! {
    eprintln!("✗ {}", message);
    process::exit(1);
}

fn example_request_json() -> &'static str {
    r##"{
  "text": "Flowing text into areas, one line at a time.\nThe second paragraph mixes in עברית and 123 digits.",
  "formats": [
    { "start": 8, "len": 4, "format": { "font": 0, "locale": "en-GB" } }
  ],
  "defaultFormat": { "font": 0 },
  "direction": "LeftToRight",
  "locale": "en-US",
  "fontSize": 12,
  "size": { "width": 180, "height": 120 },
  "alignment": "Justified",
  "numberSubstitution": "None",
  "fallback": "Disabled",
  "lineSpacing": 1.2,
  "columns": 2,
  "columnGap": 12
}
"##
}
