//! Terminal front end for PatentGuard prior-art analysis.
//!
//! Usage:
//!     patentguard analyze "A smart water bottle that tracks hydration"
//!     patentguard analyze --file idea.txt --format json
//!     patentguard interactive
//!     patentguard health

mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use patentguard_client::{AnalysisBackend, ClientConfig, HttpAnalysisClient};
use patentguard_lifecycle::{PhaseKind, RequestLifecycle, RequestPhase};
use patentguard_validate::MIN_DESCRIPTION_CHARS;
use std::io::{BufRead, Read, Write};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "patentguard")]
#[command(about = "Assess an invention idea against prior-art patents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Analysis API base URL
    #[arg(long, env = "PATENTGUARD_API_URL", default_value = "http://localhost:8000/api")]
    api_url: String,

    /// Transport timeout in seconds (unset: no transport timeout)
    #[arg(long, env = "PATENTGUARD_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one invention description
    Analyze {
        /// Description text, or "-" to read stdin
        #[arg(required_unless_present = "file")]
        text: Option<String>,

        /// Read the description from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Give up on the analysis after this many seconds
        #[arg(long)]
        deadline_secs: Option<u64>,
    },

    /// Analyze descriptions line by line until an empty line
    Interactive {
        /// Give up on each analysis after this many seconds
        #[arg(long)]
        deadline_secs: Option<u64>,
    },

    /// Check analysis service health
    Health,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("patentguard=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = ClientConfig {
        base_url: cli.api_url,
        timeout_secs: cli.timeout_secs,
    };
    let client = HttpAnalysisClient::new(config)?;

    match cli.command {
        Commands::Analyze {
            text,
            file,
            format,
            deadline_secs,
        } => {
            let description = read_description(text, file)?;
            run_analyze(client, &description, format, deadline_secs).await?;
        }
        Commands::Interactive { deadline_secs } => {
            run_interactive(client, deadline_secs).await?;
        }
        Commands::Health => {
            run_health(&client).await?;
        }
    }

    Ok(())
}

fn read_description(text: Option<String>, file: Option<String>) -> Result<String> {
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read description from {}", path));
    }

    match text.as_deref() {
        Some("-") | None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read description from stdin")?;
            Ok(buffer)
        }
        Some(text) => Ok(text.to_string()),
    }
}

fn build_lifecycle(
    client: HttpAnalysisClient,
    deadline_secs: Option<u64>,
) -> RequestLifecycle<HttpAnalysisClient> {
    let lifecycle = RequestLifecycle::new(client).with_observer(|kind| {
        tracing::debug!(phase = ?kind, "Lifecycle transition");
        if kind == PhaseKind::InFlight {
            eprintln!("Analyzing with AI...");
        }
    });

    match deadline_secs {
        Some(secs) => lifecycle.with_deadline(Duration::from_secs(secs)),
        None => lifecycle,
    }
}

async fn run_analyze(
    client: HttpAnalysisClient,
    description: &str,
    format: OutputFormat,
    deadline_secs: Option<u64>,
) -> Result<()> {
    let mut lifecycle = build_lifecycle(client, deadline_secs);

    match lifecycle.run(description).await {
        RequestPhase::Success(result) => {
            let view = patentguard_view::format(result);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
                OutputFormat::Text => print!("{}", render::render_text(&view)),
            }
            Ok(())
        }
        RequestPhase::Failed(message) => {
            eprintln!("{}", render::render_error(message));
            std::process::exit(1);
        }
        other => anyhow::bail!("analysis ended in unexpected phase {:?}", other.kind()),
    }
}

async fn run_interactive(client: HttpAnalysisClient, deadline_secs: Option<u64>) -> Result<()> {
    let mut lifecycle = build_lifecycle(client, deadline_secs);
    let stdin = std::io::stdin();

    println!(
        "Describe your invention idea (at least {} characters). Empty line to quit.",
        MIN_DESCRIPTION_CHARS
    );

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }

        match lifecycle.run(&line).await {
            RequestPhase::Success(result) => {
                print!("{}", render::render_text(&patentguard_view::format(result)));
            }
            RequestPhase::Failed(message) => println!("{}", render::render_error(message)),
            _ => {}
        }
        println!();
    }

    Ok(())
}

async fn run_health(client: &HttpAnalysisClient) -> Result<()> {
    print!("Checking {} backend at {}... ", client.name(), client.config().base_url);

    match client.health_check().await {
        Ok(status) => {
            match status.service {
                Some(service) => println!("OK ({}: {})", service, status.status),
                None => println!("OK ({})", status.status),
            }
            Ok(())
        }
        Err(e) => {
            println!("FAILED: {}", e.user_message());
            tracing::debug!(error = %e, "Health check failed");
            std::process::exit(1);
        }
    }
}
