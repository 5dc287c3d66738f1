//! # Email Hunter CLI
//!
//! Command-line interface for the Email Hunter library (`email_hunter_core`).
//! This binary parses arguments, builds the configuration, initializes the
//! hunter, runs one operation (or a batch of lookups) and writes JSON output.

use email_hunter_core::{
    check_smtp_connectivity, domain_profile, find_bulk, find_one, initialize_hunter,
    process_lookups, verify_email, Config, ConfigBuilder, EmailHunter, FindOneRequest,
    LookupResult, Verdict,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Discovers and verifies professional email addresses for a domain.",
    long_about = "Email Hunter crawls a domain's public pages for addresses, infers the organisation's naming pattern, and checks candidates against DNS and, optionally, the domain's mail servers."
)]
struct AppArgs {
    #[command(flatten)]
    settings: SettingsArgs,

    /// Write JSON output to this file instead of standard output.
    #[arg(short, long, global = true, env = "EMAIL_HUNTER_OUTPUT")]
    output: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the most likely address of one person.
    Find {
        /// Domain or website URL of the organisation.
        domain: String,
        #[arg(long)]
        first: Option<String>,
        #[arg(long)]
        last: Option<String>,
        /// Job title, copied onto the result.
        #[arg(long)]
        position: Option<String>,
        /// Address pattern to use instead of detecting one, e.g. "{first}.{last}".
        #[arg(long)]
        pattern: Option<String>,
    },
    /// List every address published on a domain's own pages.
    Bulk {
        domain: String,
    },
    /// Check a single address.
    Verify {
        address: String,
    },
    /// Detected pattern, company name and WHOIS data for a domain.
    Profile {
        domain: String,
    },
    /// Run `find` for every request in a JSON file.
    Batch {
        /// JSON array of objects with `domain`, `first_name`, `last_name`,
        /// `position` and `pattern` fields.
        #[arg(short, long, env = "EMAIL_HUNTER_INPUT")]
        input: String,
    },
}

#[derive(Args, Debug)]
struct SettingsArgs {
    /// Path to a configuration file (TOML format). CLI args override file settings.
    #[arg(long, global = true, env = "EMAIL_HUNTER_CONFIG")]
    config_file: Option<String>,

    /// Probe mail servers with RCPT TO. Off by default.
    #[arg(long, global = true, action = clap::ArgAction::SetTrue, env = "EMAIL_HUNTER_MAILBOX_CHECK")]
    mailbox_check: Option<bool>,

    /// Skip the WHOIS lookup in `profile`.
    #[arg(long, global = true, action = clap::ArgAction::SetTrue, env = "EMAIL_HUNTER_NO_WHOIS")]
    no_whois: Option<bool>,

    /// Maximum number of concurrent lookups in `batch`.
    #[arg(short, long, global = true, env = "EMAIL_HUNTER_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Concurrent page fetches within one crawl.
    #[arg(long, global = true, env = "EMAIL_HUNTER_CRAWL_CONCURRENCY")]
    crawl_concurrency: Option<usize>,

    /// Overall crawl deadline in seconds.
    #[arg(long, global = true, env = "EMAIL_HUNTER_CRAWL_TIMEOUT")]
    crawl_timeout: Option<u64>,

    /// Maximum pages fetched per operation.
    #[arg(long, global = true, env = "EMAIL_HUNTER_MAX_PAGES")]
    max_pages: Option<usize>,

    /// Sender email address for SMTP verification checks.
    #[arg(long, global = true, env = "EMAIL_HUNTER_SMTP_SENDER")]
    smtp_sender: Option<String>,

    /// SMTP connection/command timeout in seconds.
    #[arg(long, global = true, env = "EMAIL_HUNTER_SMTP_TIMEOUT")]
    smtp_timeout: Option<u64>,

    /// HTTP request timeout in seconds.
    #[arg(long, global = true, env = "EMAIL_HUNTER_REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    /// DNS resolution timeout in seconds.
    #[arg(long, global = true, env = "EMAIL_HUNTER_DNS_TIMEOUT")]
    dns_timeout: Option<u64>,

    /// Comma-separated list of DNS servers to use for lookups.
    #[arg(long, global = true, value_delimiter = ',', env = "EMAIL_HUNTER_DNS_SERVERS")]
    dns_servers: Option<Vec<String>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Setting up tracing subscriber failed")?;

    tracing::info!("Email Hunter CLI v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = AppArgs::parse();
    tracing::debug!("Parsed CLI arguments: {:?}", args);

    let config = build_config(&args.settings)?;
    tracing::debug!("Effective configuration loaded: {:?}", config);

    if config.enable_mailbox_check {
        match check_smtp_connectivity(&config).await {
            Ok(()) => tracing::info!("SMTP connectivity test passed (outbound port 25 likely open)."),
            Err(e) => {
                tracing::error!("SMTP connectivity test failed: {}", e);
                tracing::warn!("Mailbox probing (port 25) may fail or be unreliable.");
                tracing::warn!("Check firewall rules or ISP restrictions if mailbox checks are needed.");
            }
        }
    }

    let hunter = initialize_hunter(config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize EmailHunter core: {}", e))?;

    let start_time = Instant::now();
    let output = args.output.as_deref();
    match args.command {
        Command::Find {
            domain,
            first,
            last,
            position,
            pattern,
        } => {
            let request = FindOneRequest {
                domain,
                first_name: first,
                last_name: last,
                position,
                pattern,
            };
            let candidate = find_one(&hunter, &request).await?;
            tracing::info!(
                "Best candidate: {} ({}, confidence {:.2})",
                candidate.address,
                candidate.source,
                candidate.confidence
            );
            write_json(&candidate, output)?;
        }
        Command::Bulk { domain } => {
            let candidates = find_bulk(&hunter, &domain).await?;
            tracing::info!("{} address(es) found on {}", candidates.len(), domain);
            write_json(&candidates, output)?;
        }
        Command::Verify { address } => {
            let result = verify_email(&hunter, &address).await;
            match result.verdict {
                Verdict::Valid => tracing::info!("{} looks valid: {}", result.address, result.message),
                Verdict::Invalid => tracing::warn!("{} is invalid: {}", result.address, result.message),
                Verdict::Unknown => tracing::warn!("{} is unknown: {}", result.address, result.message),
            }
            write_json(&result, output)?;
        }
        Command::Profile { domain } => {
            let profile = domain_profile(&hunter, &domain).await?;
            write_json(&profile, output)?;
        }
        Command::Batch { input } => {
            process_batch(&hunter, &input, output).await?;
        }
    }

    tracing::info!("Finished. Duration: {:.2?}", start_time.elapsed());
    Ok(())
}

fn build_config(settings: &SettingsArgs) -> Result<Config> {
    let mut config_builder = ConfigBuilder::new();

    if let Some(ref path) = settings.config_file {
        config_builder = config_builder.config_file(path);
    }
    if settings.mailbox_check == Some(true) {
        config_builder = config_builder.enable_mailbox_check(true);
    }
    if settings.no_whois == Some(true) {
        config_builder = config_builder.enable_whois(false);
    }
    if let Some(c) = settings.concurrency {
        config_builder = config_builder.max_concurrency(c);
    }
    if let Some(c) = settings.crawl_concurrency {
        config_builder = config_builder.crawl_concurrency(c);
    }
    if let Some(t) = settings.crawl_timeout {
        config_builder = config_builder.crawl_timeout(Duration::from_secs(t));
    }
    if let Some(p) = settings.max_pages {
        config_builder = config_builder.max_pages(p);
    }
    if let Some(ref s) = settings.smtp_sender {
        config_builder = config_builder.smtp_sender_email(s);
    }
    if let Some(t) = settings.smtp_timeout {
        config_builder = config_builder.smtp_timeout(Duration::from_secs(t));
    }
    if let Some(t) = settings.request_timeout {
        config_builder = config_builder.request_timeout(Duration::from_secs(t));
    }
    if let Some(t) = settings.dns_timeout {
        config_builder = config_builder.dns_timeout(Duration::from_secs(t));
    }
    if let Some(ref servers) = settings.dns_servers {
        if !servers.is_empty() {
            config_builder = config_builder.dns_servers(servers.clone());
        }
    }

    config_builder.build().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to build configuration: {}", e)
    })
}

async fn process_batch(hunter: &EmailHunter, input: &str, output: Option<&str>) -> Result<()> {
    let input_path = Path::new(input);
    if !input_path.is_file() {
        return Err(anyhow::anyhow!("Input file not found or is not a file: {}", input));
    }
    if let Some(parent_dir) = output.and_then(|o| Path::new(o).parent()) {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            tracing::debug!("Creating output directory: {}", parent_dir.display());
            std::fs::create_dir_all(parent_dir).with_context(|| {
                format!("Failed to create output directory '{}'", parent_dir.display())
            })?;
        }
    }

    tracing::info!("Loading lookup requests from '{}'...", input);
    let requests = load_requests(input)?;
    let total = requests.len();
    if total == 0 {
        tracing::warn!("Input file '{}' contains no requests. Writing empty results.", input);
        return write_json(&Vec::<LookupResult>::new(), output);
    }

    tracing::info!(
        "Starting lookups for {} request(s) (Concurrency: {})...",
        total,
        hunter.config().max_concurrency
    );
    let pb = ProgressBar::new(total as u64);
    pb.set_style(ProgressStyle::default_bar()
         .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) | ETA: {eta} | {msg}")
         .context("Failed to set progress bar template")?
         .progress_chars("=> "));
    pb.enable_steady_tick(Duration::from_millis(200));
    pb.set_message("Looking up addresses...");

    let start_time = Instant::now();
    let results = process_lookups(hunter, requests).await;

    pb.set_position(results.len() as u64);
    pb.finish_with_message(format!("Processed {} requests", results.len()));

    write_json(&results, output)?;
    log_summary(&results, start_time.elapsed());
    Ok(())
}

fn load_requests(file_path: &str) -> Result<Vec<FindOneRequest>> {
    let file = File::open(file_path)
        .with_context(|| format!("Failed to open input file '{}'", file_path))?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse JSON from '{}'. Ensure it's an array of lookup objects.",
            file_path
        )
    })
}

/// Pretty-prints `value` as JSON to `output`, or to standard output.
fn write_json<T: Serialize + ?Sized>(value: &T, output: Option<&str>) -> Result<()> {
    match output {
        Some(file_path) => {
            let file = File::create(file_path)
                .with_context(|| format!("Failed to create/truncate output file '{}'", file_path))?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, value)
                .with_context(|| format!("Failed to serialize results to JSON for '{}'", file_path))?;
            tracing::info!("Results saved to '{}'.", file_path);
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, value)
                .context("Failed to serialize results to JSON")?;
            writeln!(handle).context("Failed to write to standard output")?;
        }
    }
    Ok(())
}

fn log_summary(results: &[LookupResult], duration: Duration) {
    let found = results.iter().filter(|r| r.candidate.is_some()).count();
    let verified = results
        .iter()
        .filter(|r| r.candidate.as_ref().is_some_and(|c| c.verified))
        .count();
    let failed = results.iter().filter(|r| r.error.is_some()).count();

    tracing::info!("-------------------- Batch Summary --------------------");
    tracing::info!("Requests                    : {}", results.len());
    tracing::info!("  - Candidates Returned     : {}", found);
    tracing::info!("  - Passed Domain Check     : {}", verified);
    tracing::info!("  - Rejected / Failed       : {}", failed);
    tracing::info!("Total Time Taken            : {:.2?}", duration);
    if duration.as_secs_f64() > 0.01 && !results.is_empty() {
        let rate = (results.len() as f64) / duration.as_secs_f64();
        tracing::info!("Processing Rate             : {:.2} requests/sec", rate);
    }
    tracing::info!("-------------------------------------------------------");
}
