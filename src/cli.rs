// ============================================================================
// Lingens CLI — headless card rendering via command-line arguments
// ============================================================================
//
// Usage examples:
//   lingens --input snapshot.json --output card.png
//   lingens -i snapshot.json -o card.png --template bold
//
// The input is a JSON snapshot: either a history item exported from the GUI
// or a bare `{ "template": ..., "visual": ... }` pair. No window is opened;
// rendering runs synchronously on the current thread.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use serde::Deserialize;

use crate::assets::FontLibrary;
use crate::components::history::HistoryItem;
use crate::ops::render::render_card;
use crate::visual::{TemplateStyle, VisualState};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Lingens headless card renderer.
///
/// Composite a saved card snapshot to PNG without opening the GUI.
#[derive(Parser, Debug)]
#[command(
    name = "lingens",
    about = "Lingens headless card renderer",
    long_about = "Render a saved card snapshot (history item JSON) to a 500x625 PNG\n\
                  without opening the GUI.\n\n\
                  Example:\n  \
                  lingens --input snapshot.json --output card.png\n  \
                  lingens -i snapshot.json -o card.png --template minimal"
)]
pub struct CliArgs {
    /// Snapshot JSON file: a history item or a {template, visual} pair.
    #[arg(short, long, required = true, value_name = "SNAPSHOT.json")]
    pub input: PathBuf,

    /// Output PNG path. Defaults to a timestamped name next to the input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Override the snapshot's template: minimal, bold, bottom.
    #[arg(short, long, value_name = "TEMPLATE")]
    pub template: Option<String>,

    /// Print timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process
    /// arguments. Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

/// Bare snapshot form, for callers that script the renderer directly
/// instead of exporting a history item.
#[derive(Deserialize)]
struct CardSnapshot {
    template: TemplateStyle,
    visual: VisualState,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Render the snapshot and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    let start = Instant::now();

    let json = match std::fs::read_to_string(&args.input) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("error: could not read '{}': {}", args.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let (template, visual) = match parse_snapshot(&json) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("error: invalid snapshot: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let template = match args.template.as_deref().map(parse_template) {
        Some(Ok(t)) => t,
        Some(Err(e)) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
        None => template,
    };

    let output = args.output.unwrap_or_else(|| {
        let parent = args.input.parent().unwrap_or(std::path::Path::new("."));
        parent.join(crate::io::export_filename())
    });

    let rendered = render_card(template, &visual, &FontLibrary::new());
    if let Err(e) = crate::io::write_card_png(&rendered.image, &output) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    if args.verbose {
        println!(
            "{} ({:.0}ms)",
            output.display(),
            start.elapsed().as_secs_f64() * 1000.0
        );
    } else {
        println!("{}", output.display());
    }
    ExitCode::SUCCESS
}

// ============================================================================
// Helpers
// ============================================================================

/// Accept either a full history item or the bare {template, visual} form.
fn parse_snapshot(json: &str) -> Result<(TemplateStyle, VisualState), String> {
    if let Ok(item) = serde_json::from_str::<HistoryItem>(json) {
        return Ok((item.template, item.visual));
    }
    serde_json::from_str::<CardSnapshot>(json)
        .map(|s| (s.template, s.visual))
        .map_err(|e| e.to_string())
}

fn parse_template(name: &str) -> Result<TemplateStyle, String> {
    match name.to_lowercase().as_str() {
        "minimal" => Ok(TemplateStyle::MinimalTypography),
        "bold" => Ok(TemplateStyle::BoldTextOverlay),
        "bottom" => Ok(TemplateStyle::BottomTextImage),
        other => Err(format!(
            "unknown template '{}': expected minimal, bold, or bottom",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bare_snapshot_parses() {
        let visual = VisualState::default();
        let json = serde_json::json!({
            "template": "BottomTextImage",
            "visual": serde_json::to_value(&visual).unwrap(),
        })
        .to_string();

        let (template, parsed) = parse_snapshot(&json).expect("parse");
        assert_eq!(template, TemplateStyle::BottomTextImage);
        assert_eq!(parsed.headline, visual.headline);
    }

    #[test]
    fn history_item_snapshot_parses() {
        let item = HistoryItem::new(
            "post".to_string(),
            VisualState::default(),
            TemplateStyle::MinimalTypography,
        );
        let json = serde_json::to_string(&item).expect("serialize");

        let (template, visual) = parse_snapshot(&json).expect("parse");
        assert_eq!(template, TemplateStyle::MinimalTypography);
        assert_eq!(visual, item.visual);
    }

    #[test]
    fn template_names_resolve_case_insensitively() {
        assert_eq!(parse_template("Minimal"), Ok(TemplateStyle::MinimalTypography));
        assert_eq!(parse_template("BOLD"), Ok(TemplateStyle::BoldTextOverlay));
        assert_eq!(parse_template("bottom"), Ok(TemplateStyle::BottomTextImage));
        assert!(parse_template("fancy").is_err());
    }
}
