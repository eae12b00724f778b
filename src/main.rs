use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use proxy_validator::{
    display::{print_banner, print_summary, ConsoleReporter, NoopSink, StatusSink, TitleUpdater},
    proxy::{
        checker::{DEFAULT_OUTPUT_PATH, DEFAULT_TEST_URL, DEFAULT_TIMEOUT_SECS},
        fetcher::{self, DEFAULT_SOURCE_URL},
        CheckerConfig, FetcherConfig, ProxyChecker, ProxyFetcher, RunSummary,
    },
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// A concurrent HTTP/HTTPS proxy validator
#[derive(Parser)]
#[command(name = "proxy-validator")]
#[command(about = "A concurrent HTTP/HTTPS proxy validator with live throughput statistics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxies and append valid ones to a list
    Check {
        /// URL to download the proxy list from
        #[arg(short, long, default_value = DEFAULT_SOURCE_URL, conflicts_with = "file")]
        url: String,
        /// Local file containing proxies, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Number of concurrent workers (prompted for when omitted)
        #[arg(short = 'n', long)]
        threads: Option<usize>,
        /// Timeout in seconds for each probe
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,
        /// URL requested through every proxy
        #[arg(long, default_value = DEFAULT_TEST_URL)]
        test_url: String,
        /// File valid proxies are appended to
        #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
        output: PathBuf,
        /// Do not update the terminal title
        #[arg(long)]
        no_title: bool,
        /// Print the final summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download a proxy list
    Fetch {
        /// URL to download the proxy list from
        #[arg(short, long, default_value = DEFAULT_SOURCE_URL)]
        url: String,
        /// Output file for fetched proxies
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Timeout in seconds for the download
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            url,
            file,
            threads,
            timeout,
            test_url,
            output,
            no_title,
            json,
        } => {
            let threads = match threads {
                Some(n) => n,
                None => prompt_threads()?,
            };
            if threads == 0 {
                return Err(anyhow!("Thread count must be at least 1"));
            }

            let proxies = match file {
                Some(path) => ProxyFetcher::from_file(&path)?,
                None => ProxyFetcher::new()?.fetch(&url).await?,
            };

            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Unable to create {:?}", parent))?;
            }

            let config = CheckerConfig::new()
                .with_workers(threads)
                .with_timeout(Duration::from_secs(timeout))
                .with_test_url(test_url)
                .with_output_path(output);
            let checker = ProxyChecker::with_config(config);

            print_banner(&mut io::stdout(), threads)?;

            let summary = if no_title {
                run_check(&checker, proxies, NoopSink).await?.0
            } else {
                let (summary, updater) = run_check(&checker, proxies, TitleUpdater::start()).await?;
                updater.stop().await;
                summary
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&mut io::stdout(), &summary)?;
            }
        }
        Commands::Fetch {
            url,
            output,
            timeout,
        } => {
            let fetcher =
                ProxyFetcher::with_config(FetcherConfig::new().with_timeout(Duration::from_secs(timeout)))?;
            let proxies = fetcher.fetch(&url).await?;

            println!("Fetched {} proxies from {}", proxies.len(), url);

            if let Some(output_path) = output {
                fetcher::save_to_file(&proxies, &output_path)?;
                println!("Saved proxies to {:?}", output_path);
            } else {
                for proxy in &proxies {
                    println!("{}", proxy);
                }
            }
        }
    }

    Ok(())
}

async fn run_check<S: StatusSink>(
    checker: &ProxyChecker,
    proxies: Vec<String>,
    sink: S,
) -> Result<(RunSummary, S)> {
    let mut reporter = ConsoleReporter::stdout(sink);
    let summary = checker.check_proxies(proxies, &mut reporter).await?;
    let (_, sink) = reporter.into_parts();
    Ok((summary, sink))
}

fn prompt_threads() -> Result<usize> {
    print!("    ↪ Threads: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    line.trim()
        .parse()
        .with_context(|| format!("Invalid thread count: {:?}", line.trim()))
}
