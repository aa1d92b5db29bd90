//! CLI binary for vehicle-lens.
//!
//! A thin shim over the library crate that maps CLI flags to `SearchConfig`
//! and prints one JSON outcome per input image.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vehicle_lens::{search_many, PipelineOutcome, SearchConfig};

const AFTER_HELP: &str = r#"EXAMPLES:
  # Identify one photo
  vehicle-lens car.jpg

  # Several photos, pretty-printed
  vehicle-lens --pretty front.jpg side.png

  # From a URL
  vehicle-lens https://example.com/listing/123.jpg

  # Through another provider
  vehicle-lens --provider openai --model gpt-4.1-mini car.jpg

OUTPUT:
  One JSON document per input, in input order:
    {"success":true,"data":{"make":"Toyota","bodyType":"SUV","color":"Red","confidence":0.9}}
    {"success":false,"error":"Failed to parse AI response. Please try with a clearer image."}
  Inputs that cannot be processed at all are reported on stderr and make the
  exit status non-zero.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Gemini API key (also read from ./.env)
  VEHICLE_LENS_MODEL      Override model ID
  VEHICLE_LENS_PROVIDER   Route through an edgequake-llm provider instead of Gemini
  RUST_LOG                Log filter, e.g. vehicle_lens=debug
"#;

/// Identify make, body type and color from vehicle photos using a Vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "vehicle-lens",
    version,
    about = "Identify make, body type and color from vehicle photos using a Vision LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image file paths or HTTP/HTTPS URLs.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model ID (default: gemini-flash-latest for Gemini, the provider's own
    /// default otherwise).
    #[arg(long, env = "VEHICLE_LENS_MODEL")]
    model: Option<String>,

    /// edgequake-llm provider name: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "VEHICLE_LENS_PROVIDER")]
    provider: Option<String>,

    /// Maximum upload size in bytes.
    #[arg(long, env = "VEHICLE_LENS_MAX_BYTES", default_value_t = 5 * 1024 * 1024)]
    max_bytes: u64,

    /// Number of images processed concurrently.
    #[arg(short, long, env = "VEHICLE_LENS_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "VEHICLE_LENS_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Per-call model API timeout in seconds (default: none).
    #[arg(long, env = "VEHICLE_LENS_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, env = "VEHICLE_LENS_DOWNLOAD_TIMEOUT", default_value_t = 60)]
    download_timeout: u64,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "VEHICLE_LENS_VERBOSE")]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, env = "VEHICLE_LENS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;

    // ── Run searches ─────────────────────────────────────────────────────
    let results = search_many(cli.inputs.as_slice(), &config)
        .await
        .context("Image search could not start")?;

    let mut hard_failures = 0usize;
    for (input, result) in cli.inputs.iter().zip(results) {
        match result {
            Ok(outcome) => println!("{}", render(&outcome, cli.pretty)?),
            Err(e) => {
                hard_failures += 1;
                eprintln!("{input}: {e}");
            }
        }
    }

    Ok(if hard_failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn build_config(cli: &Cli) -> Result<SearchConfig> {
    let mut builder = SearchConfig::builder()
        .max_upload_bytes(cli.max_bytes)
        .concurrency(cli.concurrency)
        .temperature(cli.temperature)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }

    builder.build().context("Invalid configuration")
}

fn render(outcome: &PipelineOutcome, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(outcome)
    } else {
        serde_json::to_string(outcome)
    };
    json.context("Failed to serialize outcome")
}
