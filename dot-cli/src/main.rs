//! dot - generate a dashboard spec from a JSON data snapshot
//!
//! Reads host data from a file, asks the configured backend for a dashboard,
//! and prints the validated spec.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dot_core::{create_client, Config, DashboardSpec, DotContext, DotSession, HostValue};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "dot")]
#[command(about = "Generate a dashboard from JSON data with an LLM")]
#[command(version)]
struct Args {
    /// JSON file holding the data snapshot
    #[arg(short, long)]
    data: PathBuf,

    /// Application description (overrides config)
    #[arg(long)]
    app: Option<String>,

    /// Data field description for the prompt (repeatable)
    #[arg(long = "describe")]
    describe: Vec<String>,

    /// Config file (default: $XDG_CONFIG_HOME/dot/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum widgets kept from the generated spec
    #[arg(long)]
    max_widgets: Option<usize>,

    /// Maximum rows per top-level sequence sent to the backend
    #[arg(long)]
    max_rows: Option<usize>,

    /// Byte budget before only a data profile is sent
    #[arg(long)]
    max_bytes: Option<usize>,

    /// Print the messages that would be sent, without calling a backend
    #[arg(long)]
    dry_run: bool,

    /// Output format for the generated spec
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// What the dashboard should show
    message: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Json,
    Summary,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::load().context("failed to load configuration")?,
    };
    let _log_guard = dot_core::logging::init(&config.logging).ok();

    if let Some(app) = &args.app {
        config.app.description = app.clone();
    }
    if let Some(n) = args.max_widgets {
        config.generation.max_widgets = n;
    }
    if let Some(n) = args.max_rows {
        config.generation.max_rows = n;
    }
    if let Some(n) = args.max_bytes {
        config.generation.max_bytes = n;
    }
    config.validate().context("invalid options")?;

    let text = std::fs::read_to_string(&args.data)
        .with_context(|| format!("failed to read data file {}", args.data.display()))?;
    let data: serde_json::Value =
        serde_json::from_str(&text).context("data file is not valid JSON")?;
    let data = Arc::new(data);

    let mut context =
        DotContext::new(config.app.description.clone()).with_options(config.dot_options());
    if !args.dry_run {
        if let Some(llm) = &config.llm {
            context = context.with_client(create_client(llm).context("failed to create LLM client")?);
        }
    }

    let mut session = DotSession::new(Arc::new(context), move || {
        HostValue::from(data.as_ref().clone())
    });
    for description in &args.describe {
        session.descriptions_mut().add(description.clone());
    }
    tracing::info!(session_id = %session.id(), dry_run = args.dry_run, "Starting dot");

    if args.dry_run {
        let messages = session.preview(&args.message);
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    match session.generate(args.message.clone()).await {
        Ok(spec) => {
            match args.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&spec)?),
                OutputFormat::Summary => print_summary(&spec),
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Generation failed");
            match session.error() {
                Some(shown) => anyhow::bail!("{shown}"),
                None => Err(e.into()),
            }
        }
    }
}

fn print_summary(spec: &DashboardSpec) {
    println!("{}", spec.display_title());
    if let Some(layout) = &spec.layout {
        println!("  layout: {} column(s)", layout.columns);
    }
    for widget in &spec.widgets {
        match widget.title() {
            Some(title) => println!("  - {}: {}", widget.kind(), title),
            None => println!("  - {}", widget.kind()),
        }
    }
}
