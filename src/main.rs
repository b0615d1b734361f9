use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hcf_async::init::init_tracing;
use hcf_async::{Destination, Driver, Frontier, HcfConfig, Link, QueuedLink, ReqwestHttpClient};
use std::io::BufRead;
use std::path::PathBuf;
use tracing::info;

/// Read, write and re-queue links in a Hubstorage Crawl Frontier
#[derive(Parser)]
#[command(name = "hcf")]
#[command(version)]
#[command(about = "Read, write and re-queue links in a Hubstorage Crawl Frontier", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    /// Never delete consumed batches; read at most one batch
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch links and print them to stdout, one JSON object per line
    Drain {
        /// Number of links to read (overrides fetch.links_to_fetch)
        #[arg(short = 'n', long)]
        count: Option<u64>,

        /// Slot to read from (overrides fetch.consume_from)
        #[arg(long, value_name = "FRONTIER/SLOT")]
        from: Option<Destination>,
    },
    /// Add links read from stdin: a fingerprint or a JSON link object per line
    Push {
        #[arg(long, value_name = "FRONTIER/SLOT")]
        to: Destination,
    },
    /// Fetch links from one slot and add them to another
    Move {
        #[arg(long, value_name = "FRONTIER/SLOT")]
        from: Destination,

        #[arg(long, value_name = "FRONTIER/SLOT")]
        to: Destination,

        #[arg(short = 'n', long)]
        count: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Step 1: Load base configuration
    let mut config = if let Some(config_path) = &cli.config {
        HcfConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        HcfConfig::load_or_default().context("Failed to load configuration")?
    };

    // Step 2: Apply CLI overrides (highest priority)
    apply_cli_overrides(&mut config, &cli);
    config.validate()?;

    init_tracing(&config);

    let frontier = Frontier::new(config.frontier_settings())?;
    let http = ReqwestHttpClient::new()?;
    let max_failed_rounds = config.driver.max_failed_rounds;

    match cli.command {
        Command::Drain { .. } => {
            let consumer = |links: Vec<QueuedLink>| links;
            let mut driver =
                Driver::new(frontier, http, consumer).with_max_failed_rounds(max_failed_rounds);
            let summary = driver
                .run(|_, link: QueuedLink| {
                    println!("{}", serde_json::to_string(&link)?);
                    Ok(None)
                })
                .await?;
            info!(links = summary.links_fetched, "drain complete");
        }
        Command::Push { to } => {
            let links = read_links(std::io::stdin().lock())?;
            let consumer = |_: Vec<QueuedLink>| Vec::<()>::new();
            let mut driver =
                Driver::new(frontier, http, consumer).with_max_failed_rounds(max_failed_rounds);
            for link in links {
                driver.add_link(to.clone(), link)?;
            }
            let summary = driver.run(|_, _| Ok(None)).await?;
            info!(
                sent = summary.links_sent,
                accepted = summary.links_accepted,
                "push complete"
            );
        }
        Command::Move { to, .. } => {
            let consumer = |links: Vec<QueuedLink>| links;
            let mut driver =
                Driver::new(frontier, http, consumer).with_max_failed_rounds(max_failed_rounds);
            let summary = driver
                .run(|frontier: &mut Frontier, link: QueuedLink| {
                    Ok(frontier.add_link(to.clone(), Link::from(link))?)
                })
                .await?;
            info!(
                fetched = summary.links_fetched,
                accepted = summary.links_accepted,
                "move complete"
            );
        }
    }

    Ok(())
}

fn apply_cli_overrides(config: &mut HcfConfig, cli: &Cli) {
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.debug {
        config.debug_mode = true;
    }

    match &cli.command {
        Command::Drain { count, from } => {
            if let Some(count) = count {
                config.fetch.links_to_fetch = *count;
            }
            if let Some(from) = from {
                config.fetch.consume_from = Some(from.clone());
            }
        }
        Command::Push { .. } => {
            // Write-only session
            config.fetch.links_to_fetch = 0;
        }
        Command::Move { from, count, .. } => {
            config.fetch.consume_from = Some(from.clone());
            if let Some(count) = count {
                config.fetch.links_to_fetch = *count;
            }
        }
    }
}

/// One link per line; lines starting with `{` are full link objects.
fn read_links(input: impl BufRead) -> Result<Vec<Link>> {
    let mut links = Vec::new();
    for (n, line) in input.lines().enumerate() {
        let line = line.context("Failed to read stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let link = if line.starts_with('{') {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid link on line {}", n + 1))?
        } else {
            Link::new(line)
        };
        links.push(link);
    }
    Ok(links)
}
