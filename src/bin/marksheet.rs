//! CLI binary for marksheet-relay.
//!
//! `serve` runs the relay, `extract` is a terminal front-end for a running
//! relay, and `probe` checks that the webhook answers.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use marksheet_relay::client::DEFAULT_SERVER;
use marksheet_relay::ui::{
    transition, Band, Effect, FileCandidate, Notice, NoticeKind, StudentCard, UiEvent, UploadState,
};
use marksheet_relay::{
    AcceptedType, ProbeReport, Relay, RelayClient, RelayConfig, Server, WebhookMode,
};
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the relay against the n8n editor's test webhook
  marksheet serve

  # Run against the activated workflow
  N8N_PROD=true marksheet serve --port 8080

  # Extract a marksheet through a running relay
  marksheet extract scan.jpg

  # Print the raw JSON and keep a copy
  marksheet extract scan.pdf --json --save marksheet-data.json

  # Check that the webhook is reachable
  marksheet probe

ENVIRONMENT VARIABLES:
  N8N_PROD                  true → production webhook, otherwise test webhook
  MARKSHEET_HOST            Listen address (default 0.0.0.0)
  MARKSHEET_PORT            Listen port (default 3000)
  MARKSHEET_TEST_URL        Override the test webhook URL
  MARKSHEET_PRODUCTION_URL  Override the production webhook URL
  MARKSHEET_UPLOAD_DIR      Where uploads are staged (default: system temp dir)
  MARKSHEET_SERVER          Relay used by `extract` (default http://localhost:3000)
  RUST_LOG                  Log filter, overrides --verbose/--quiet
"#;

/// Relay marksheet uploads to an extraction webhook.
#[derive(Parser, Debug)]
#[command(
    name = "marksheet",
    version,
    about = "Relay marksheet uploads to an extraction webhook and show the results",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MARKSHEET_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MARKSHEET_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the relay and serve the upload page.
    Serve(ServeArgs),
    /// Upload a marksheet to a running relay and print the students.
    Extract(ExtractArgs),
    /// POST a test payload to the webhook and report the answer.
    Probe(ProbeArgs),
}

/// Webhook selection, shared by `serve` and `probe`.
#[derive(Args, Debug)]
struct WebhookArgs {
    /// Forward to the production webhook instead of the test one.
    #[arg(long, env = "N8N_PROD")]
    production: bool,

    /// Test webhook URL.
    #[arg(long, env = "MARKSHEET_TEST_URL")]
    test_url: Option<String>,

    /// Production webhook URL.
    #[arg(long, env = "MARKSHEET_PRODUCTION_URL")]
    production_url: Option<String>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[command(flatten)]
    webhook: WebhookArgs,

    /// Listen address.
    #[arg(long, env = "MARKSHEET_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Listen port.
    #[arg(short, long, env = "MARKSHEET_PORT", default_value_t = 3000)]
    port: u16,

    /// Directory for staged uploads.
    #[arg(long, env = "MARKSHEET_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Marksheet image (JPEG, PNG, WebP) or PDF.
    file: PathBuf,

    /// Base URL of the relay.
    #[arg(long, env = "MARKSHEET_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Print the extracted JSON instead of student cards.
    #[arg(long)]
    json: bool,

    /// Also write the extracted JSON to this file (or directory).
    #[arg(long)]
    save: Option<PathBuf>,

    /// Disable the spinner.
    #[arg(long, env = "MARKSHEET_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct ProbeArgs {
    #[command(flatten)]
    webhook: WebhookArgs,

    /// Ask this relay to run the probe instead of calling the webhook directly.
    #[arg(long)]
    server: Option<String>,
}

impl WebhookArgs {
    fn to_config(&self, upload_dir: Option<&PathBuf>) -> Result<RelayConfig> {
        let mut builder =
            RelayConfig::builder().mode(WebhookMode::from_production_flag(self.production));
        if let Some(ref url) = self.test_url {
            builder = builder.test_url(url);
        }
        if let Some(ref url) = self.production_url {
            builder = builder.production_url(url);
        }
        if let Some(dir) = upload_dir {
            builder = builder.upload_dir(dir);
        }
        builder.build().context("Invalid configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner is the feedback for `extract`; keep INFO logs out of its way.
    let show_progress = match &cli.command {
        Command::Extract(args) => !cli.quiet && !args.no_progress,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve(args) => serve(args, cli.quiet).await,
        Command::Extract(args) => extract(args, cli.quiet, show_progress).await,
        Command::Probe(args) => probe(args).await,
    }
}

async fn serve(args: ServeArgs, quiet: bool) -> Result<()> {
    let config = args.webhook.to_config(args.upload_dir.as_ref())?;
    let endpoint = config.endpoint().to_string();
    let mode = config.mode;

    let server = Server::bind(config, &args.host, args.port)
        .await
        .context("Failed to start relay")?;
    let addr = server.local_addr()?;

    if !quiet {
        eprintln!("{} {}", cyan("◆"), bold("Marksheet relay running"));
        eprintln!("   Frontend:  {}", bold(&format!("http://localhost:{}", addr.port())));
        eprintln!("   Webhook:   {} {}", endpoint, dim(&format!("({mode})")));
        eprintln!("   {}", dim("Press Ctrl-C to stop"));
    }

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Relay stopped with an error")?;

    if !quiet {
        eprintln!("{} Relay stopped", green("✔"));
    }
    Ok(())
}

/// Drive the upload state machine from the terminal.
async fn extract(args: ExtractArgs, quiet: bool, show_progress: bool) -> Result<()> {
    let meta = tokio::fs::metadata(&args.file)
        .await
        .with_context(|| format!("Failed to read {:?}", args.file))?;
    let name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "marksheet".to_string());
    let content_type = AcceptedType::from_path(&args.file)
        .map(|k| k.mime())
        .unwrap_or("application/octet-stream");

    let client = RelayClient::new(&args.server)?;
    let mut state = UploadState::default();
    let mut events = VecDeque::from([
        UiEvent::FileChosen(FileCandidate {
            name,
            content_type: content_type.to_string(),
            size: meta.len(),
        }),
        UiEvent::ExtractRequested,
    ]);

    while let Some(event) = events.pop_front() {
        let step = transition(state, event);
        state = step.state;

        for effect in step.effects {
            match effect {
                Effect::Notify(notice) => print_notice(&notice, quiet),
                Effect::SendExtract(file) => {
                    let spinner = show_progress.then(|| spinner(&file.name));
                    let bytes = tokio::fs::read(&args.file)
                        .await
                        .with_context(|| format!("Failed to read {:?}", args.file))?;
                    let outcome = client.extract(&file.name, file.kind, bytes).await;
                    if let Some(bar) = spinner {
                        bar.finish_and_clear();
                    }
                    events.push_back(match outcome {
                        Ok(data) => UiEvent::ExtractSucceeded(data),
                        Err(e) => UiEvent::ExtractFailed(e.to_string()),
                    });
                }
                Effect::ScrollToResults => {
                    if !args.json {
                        if let Some(result) = state.result() {
                            print_cards(&marksheet_relay::ui::student_cards(result));
                        }
                    }
                    if args.json {
                        events.push_back(UiEvent::CopyRequested);
                    }
                    if args.save.is_some() {
                        events.push_back(UiEvent::DownloadRequested);
                    }
                }
                Effect::CopyToClipboard(text) => println!("{text}"),
                Effect::Download {
                    file_name,
                    contents,
                } => {
                    let Some(ref target) = args.save else { continue };
                    let path = if target.is_dir() {
                        target.join(&file_name)
                    } else {
                        target.clone()
                    };
                    tokio::fs::write(&path, contents)
                        .await
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    if !quiet {
                        eprintln!("   {}", dim(&path.display().to_string()));
                    }
                }
            }
        }
    }

    if state.result().is_none() {
        anyhow::bail!("No data extracted from {:?}", args.file);
    }
    Ok(())
}

async fn probe(args: ProbeArgs) -> Result<()> {
    let report = match args.server {
        Some(ref server) => RelayClient::new(server)?
            .probe()
            .await
            .context("Relay did not answer")?,
        None => {
            let relay = Relay::new(args.webhook.to_config(None)?)?;
            eprintln!("{} Probing {}", cyan("◆"), relay.endpoint());
            relay.probe().await
        }
    };

    match &report {
        ProbeReport::Reached { status, ok, response } => {
            let mark = if *ok { green("✔") } else { red("✘") };
            eprintln!("{mark} Webhook answered HTTP {status}");
            if !response.is_empty() {
                eprintln!("   {}", dim(response));
            }
        }
        ProbeReport::Failed { error } => eprintln!("{} {}", red("✘"), red(error)),
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialise probe report")?
    );

    match report {
        ProbeReport::Reached { ok: true, .. } => Ok(()),
        _ => anyhow::bail!("Webhook probe failed"),
    }
}

fn spinner(file_name: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Extracting");
    bar.set_message(file_name.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn print_notice(notice: &Notice, quiet: bool) {
    match notice.kind {
        NoticeKind::Error => eprintln!("{} {}", red("✘"), red(&notice.message)),
        NoticeKind::Success if !quiet => eprintln!("{} {}", green("✔"), notice.message),
        NoticeKind::Info if !quiet => eprintln!("{} {}", cyan("ℹ"), notice.message),
        _ => {}
    }
}

fn print_cards(cards: &[StudentCard]) {
    if cards.is_empty() {
        println!("{}", dim("No student data found"));
        return;
    }
    for card in cards {
        println!(
            "{} {}  {}",
            cyan(&format!("[{}]", card.initials)),
            bold(&card.name),
            dim(&format!("Roll No: {}", card.roll))
        );
        if card.marks.is_empty() {
            println!("    {}", dim("No marks data"));
        }
        let width = card.marks.iter().map(|m| m.subject.len()).max().unwrap_or(0);
        for mark in &card.marks {
            let value = match mark.band {
                Band::High => green(&mark.value),
                Band::Medium => yellow(&mark.value),
                Band::Low => red(&mark.value),
            };
            println!("    {:<width$}  {}", mark.subject, value);
        }
        println!();
    }
}
