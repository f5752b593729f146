use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use cam_scan_rs::config::{self, ProxyConfig, ScraperConfig};
use cam_scan_rs::countries::{self, COUNTRIES};
use cam_scan_rs::extract::ExtractMode;
use cam_scan_rs::scraper::ScrapeOrchestrator;
use cam_scan_rs::types::{ResourceQuery, ScrapeOutcome, ScrapeState, ScrapeWarning};
use cam_scan_rs::{proxy, telemetry};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// cam-scan-rs — page through a public webcam directory and list camera endpoints.
#[derive(Debug, Parser)]
#[command(
    name = "cam-scan-rs",
    version,
    about = "Page through a public webcam directory by country and list camera endpoints.",
    long_about = None
)]
struct Cli {
    /// More log output (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scrape every result page for one country.
    Scrape(ScrapeArgs),
    /// Print the numbered country list.
    Countries,
    /// Run the allowlisted chat proxy.
    Serve(ServeArgs),
}

#[derive(Debug, Clone, Args)]
struct ScrapeArgs {
    /// Country code (e.g. US). If omitted, pick from the numbered menu.
    #[arg(long)]
    country: Option<String>,

    /// Directory site base URL.
    #[arg(long = "base-url", default_value = config::DEFAULT_BASE_URL)]
    base_url: String,

    /// User-Agent header sent with every request.
    #[arg(long = "user-agent", default_value = config::DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Per-request timeout in seconds.
    #[arg(long = "timeout-secs", default_value_t = 10)]
    timeout_secs: u64,

    /// Max pages fetched at once. 1 scans pages strictly in order.
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Drop matches with octets above 255 or ports outside 1-65535.
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Write the outcome as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: String,

    /// Upstream API key.
    #[arg(long = "api-key", env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model used when a request does not name one.
    #[arg(long, env = "GEMINI_MODEL", default_value = config::DEFAULT_MODEL)]
    model: String,

    /// Comma separated caller IPs allowed to use /api/chat.
    #[arg(long = "allowed-ips", env = "ALLOWED_IPS", default_value = "127.0.0.1,::1")]
    allowed_ips: String,

    /// Upstream API base URL.
    #[arg(long = "upstream-url", env = "GEMINI_UPSTREAM_URL", default_value = config::DEFAULT_UPSTREAM_URL)]
    upstream_url: String,

    /// Directory served for non-API paths.
    #[arg(long = "static-dir", default_value = ".")]
    static_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_telemetry(cli.verbose);

    match cli.command {
        Command::Scrape(args) => run_scrape(args).await,
        Command::Countries => {
            for line in countries::menu_lines() {
                println!("{line}");
            }
            Ok(())
        }
        Command::Serve(args) => {
            let cfg = ProxyConfig {
                api_key: args.api_key,
                default_model: args.model,
                allowed_ips: config::parse_allowlist(&args.allowed_ips),
                upstream_url: args.upstream_url,
                static_dir: args.static_dir,
                ..ProxyConfig::default()
            };
            if cfg.api_key.is_none() {
                warn!("GEMINI_API_KEY is not set; /api/chat will answer 500");
            }
            println!("Chat proxy on http://{} (Ctrl+C to stop)", args.bind);
            proxy::spawn_server(&args.bind, cfg).await
        }
    }
}

async fn run_scrape(args: ScrapeArgs) -> Result<()> {
    let (name, code) = match args.country.as_deref() {
        Some(code) => match countries::find_by_code(code) {
            Some((name, code)) => (name.to_string(), code.to_string()),
            None => {
                warn!("{code} is not in the country list, trying it anyway");
                (code.to_string(), code.trim().to_string())
            }
        },
        None => {
            let (name, code) = tokio::task::spawn_blocking(prompt_country).await??;
            (name.to_string(), code.to_string())
        }
    };
    println!("\n[*] You selected: {name} ({code})");
    println!("[*] Searching for cameras...\n");

    let cfg = ScraperConfig {
        base_url: args.base_url,
        user_agent: args.user_agent,
        timeout: Duration::from_secs(args.timeout_secs),
        concurrency: args.concurrency,
        extract_mode: if args.strict {
            ExtractMode::Strict
        } else {
            ExtractMode::Lax
        },
    };
    let mut orchestrator = ScrapeOrchestrator::new(cfg).context("failed to set up scraper")?;

    // Ctrl-C stops the run; whatever was collected is still reported.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        cancel_ctrlc.cancel();
    });

    let outcome = orchestrator
        .run_with_cancel(&ResourceQuery::new(code), cancel)
        .await;
    print_outcome(&outcome);

    if let Some(path) = args.output.as_deref() {
        if let Err(e) = write_outcome_json(path, &outcome) {
            eprintln!("Failed to write JSON to {}: {}", path.display(), e);
        } else {
            println!("Wrote JSON results to {}", path.display());
        }
    }
    Ok(())
}

fn prompt_country() -> Result<(&'static str, &'static str)> {
    for line in countries::menu_lines() {
        println!("{line}");
    }
    println!();

    let stdin = io::stdin();
    let mut input = String::new();
    loop {
        print!("OPTIONS : ");
        io::stdout().flush()?;
        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            bail!("no country selected");
        }
        match countries::parse_choice(&input, COUNTRIES.len()) {
            Ok(idx) => return Ok(COUNTRIES[idx]),
            Err(e) => eprintln!("Error: {e}"),
        }
    }
}

fn print_outcome(outcome: &ScrapeOutcome) {
    let s = &outcome.summary;
    if outcome.warnings.contains(&ScrapeWarning::PageCountUnknown) {
        println!("[!] Could not determine the number of pages. Checked the first page only.");
    }
    for e in &outcome.endpoints {
        println!("[+] Found: {e}");
    }
    println!(
        "\nPages scanned: {}/{}  endpoints: {}",
        s.pages_scanned, s.pages_total, s.endpoints_found
    );
    match &s.state {
        ScrapeState::Completed => {
            println!("[*] Search complete. Found {} total cameras.", s.endpoints_found)
        }
        ScrapeState::Failed { cause } => {
            println!("[!] Network error: {cause}");
            println!("[!] Stopped early. Partial results above.");
        }
        ScrapeState::Interrupted => println!("[!] User interrupted. Partial results above."),
        other => println!("[?] Unexpected final state: {other:?}"),
    }
}

fn write_outcome_json(path: &Path, outcome: &ScrapeOutcome) -> anyhow::Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, outcome)?;
    Ok(())
}
