use anyhow::Context;
use clap::{Parser, Subcommand};
use scrip_core::Money;
use scrip_ocr::{parse_receipt_date, Config, Detection, Extractor, FieldResult, OcrBackend, ReceiptPipeline};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "scrip")]
#[command(about = "Extract totals, vendors and dates from receipt images")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML). Defaults to the platform config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run OCR on an image and print the extracted fields as JSON
    Extract {
        image: PathBuf,
        #[arg(long)]
        pretty: bool,
    },

    /// Run OCR on an image and print only the recognized text
    Text { image: PathBuf },

    /// Extract fields from recorded detections (a JSON array) without running OCR
    Replay {
        detections: PathBuf,
        #[arg(long)]
        pretty: bool,
        /// Print a short human-readable summary instead of JSON
        #[arg(long)]
        summary: bool,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract { image, pretty } => {
            let pipeline = ReceiptPipeline::with_config(ocr_backend(&config)?, &config);
            tracing::info!("Processing receipt: {}", image.display());
            let result = pipeline.extract_fields_from_path(&image).await;
            print_json(&result, pretty)?;
        }
        Commands::Text { image } => {
            let pipeline = ReceiptPipeline::with_config(ocr_backend(&config)?, &config);
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("Failed to read {}", image.display()))?;
            println!("{}", pipeline.extract_text(&bytes));
        }
        Commands::Replay { detections, pretty, summary } => {
            let raw = tokio::fs::read_to_string(&detections)
                .await
                .with_context(|| format!("Failed to read {}", detections.display()))?;
            let result = replay(&raw, &config)?;
            if summary {
                println!("{}", summarize(&result));
            } else {
                print_json(&result, pretty)?;
            }
        }
    }
    Ok(())
}

// ── Configuration ─────────────────────────────────────────────────────────────

fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "scrip", "scrip").map(|d| d.config_dir().join("config.toml"))
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(Config::default()),
        },
    };
    tracing::debug!("Loading config: {}", path.display());
    Config::load(&path).with_context(|| format!("Invalid config file {}", path.display()))
}

// ── OCR backend selection ─────────────────────────────────────────────────────

#[cfg(feature = "tesseract")]
fn ocr_backend(config: &Config) -> anyhow::Result<Box<dyn OcrBackend>> {
    use scrip_ocr::recognizer::tesseract_backend::TesseractRecognizer;
    let recognizer = TesseractRecognizer::from_config(&config.tesseract)
        .context("Failed to initialise the Tesseract engine")?;
    Ok(Box::new(recognizer))
}

#[cfg(not(feature = "tesseract"))]
fn ocr_backend(_config: &Config) -> anyhow::Result<Box<dyn OcrBackend>> {
    anyhow::bail!("scrip was built without an OCR backend; rebuild with `--features tesseract` or use `scrip replay`")
}

// ── Output ────────────────────────────────────────────────────────────────────

fn replay(raw: &str, config: &Config) -> anyhow::Result<FieldResult> {
    let detections: Vec<Detection> =
        serde_json::from_str(raw).context("Detections must be a JSON array of {polygon, text, confidence}")?;
    Ok(Extractor::new(config.extraction.clone()).extract(&detections))
}

fn print_json(result: &FieldResult, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{out}");
    Ok(())
}

fn summarize(result: &FieldResult) -> String {
    if result.is_degraded() {
        return result.text.clone();
    }
    let f = &result.fields;
    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };

    let date = match parse_receipt_date(&f.date) {
        Some(d) => format!("{} ({d})", f.date),
        None => or_dash(&f.date),
    };
    let total = match &f.total {
        Some(t) => format!("{} ({})", Money::from_f64(t.amount), t.strategy),
        None => "-".to_string(),
    };

    format!(
        "vendor: {}\ndate:   {}\ntotal:  {}\ntype:   {} ({:?})",
        or_dash(&f.vendor),
        date,
        total,
        f.receipt_type.primary,
        f.receipt_type.confidence,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RECORDED: &str = r#"[
        {"polygon": [[10, 10], [200, 10], [200, 30], [10, 30]], "text": "CORNER PHARMACY", "confidence": 0.97},
        {"polygon": [[10, 40], [120, 40], [120, 60], [10, 60]], "text": "2024-02-29", "confidence": 0.91},
        {"polygon": [[10, 70], [90, 70], [90, 90], [10, 90]], "text": "Subtotal", "confidence": 0.9},
        {"polygon": [[200, 70], [260, 70], [260, 90], [200, 90]], "text": "18.00", "confidence": 0.9},
        {"polygon": [[10, 100], [90, 100], [90, 120], [10, 120]], "text": "TOTAL", "confidence": 0.9},
        {"polygon": [[200, 101], [260, 101], [260, 121], [200, 121]], "text": "19.44", "confidence": 0.9}
    ]"#;

    #[test]
    fn replay_extracts_from_recorded_detections() {
        let r = replay(RECORDED, &Config::default()).unwrap();
        assert_eq!(r.lines.len(), 4);
        assert_eq!(r.fields.vendor, "CORNER PHARMACY");
        assert_eq!(r.fields.total.as_ref().unwrap().amount, 19.44);
    }

    #[test]
    fn replay_rejects_non_array_input() {
        assert!(replay(r#"{"text": "x"}"#, &Config::default()).is_err());
    }

    #[test]
    fn summary_lists_every_field() {
        let r = replay(RECORDED, &Config::default()).unwrap();
        assert_eq!(
            summarize(&r),
            "vendor: CORNER PHARMACY\ndate:   2024-02-29 (2024-02-29)\ntotal:  19.44 (keyword_bottommost)\ntype:   pharmacy (High)"
        );
    }

    #[test]
    fn summary_of_degraded_result_is_the_marker() {
        assert_eq!(summarize(&FieldResult::degraded("boom")), "Error: boom");
    }

    #[test]
    fn summary_uses_dashes_for_missing_fields() {
        let r = replay("[]", &Config::default()).unwrap();
        assert!(summarize(&r).starts_with("vendor: -\ndate:   -\ntotal:  -"));
    }

    #[test]
    fn explicit_config_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[extraction]\nvendor_scan_lines = 1").unwrap();
        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.extraction.vendor_scan_lines, 1);
    }

    #[test]
    fn broken_explicit_config_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/scrip.toml"))).is_err());
    }

    #[test]
    fn cli_parses_replay_flags() {
        let cli = Cli::try_parse_from(["scrip", "--config", "c.toml", "replay", "d.json", "--summary"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("c.toml")));
        assert!(matches!(cli.command, Commands::Replay { summary: true, pretty: false, .. }));
    }
}
