use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use twitter_scraper::{Error, Scraper, ScraperConfig, SearchMode, TimelineSource};

#[derive(Parser)]
#[command(version, about = "Scrape tweets and profiles from the Twitter/X web API")]
struct Args {
    /// Max number of results to return
    #[arg(short, long, default_value_t = 100)]
    limit: usize,

    /// HTTP(S) or SOCKS5 proxy URL
    #[arg(long)]
    proxy: Option<String>,

    /// Minimum delay between API calls, in milliseconds
    #[arg(long)]
    delay: Option<u64>,

    /// Request timeout, in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Backend serving user timelines
    #[arg(long, value_enum, default_value_t = TimelineSource::GraphQl)]
    source: TimelineSource,

    /// Search tab for tweet searches
    #[arg(long, value_enum, default_value_t = SearchMode::Top)]
    mode: SearchMode,

    /// Include replies in user timelines
    #[arg(long)]
    replies: bool,

    /// Log in with TWITTER_USERNAME, TWITTER_PASSWORD and optionally
    /// TWITTER_CONFIRMATION before querying
    #[arg(long, conflicts_with = "open_account")]
    login: bool,

    /// Sign requests with an anonymous open-account token pair
    #[arg(long)]
    open_account: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tweets of a user timeline
    Tweets { username: String },
    /// Tweets matching a search query (requires --login)
    Search { query: String },
    /// Accounts matching a search query (requires --login)
    Profiles { query: String },
    /// A single profile
    Profile { username: String },
    /// A single tweet
    Tweet { id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => exit_code(&e),
    }
}

async fn run(args: Args) -> Result<(), Error> {
    let mut config = ScraperConfig::builder()
        .timeout(Duration::from_secs(args.timeout))
        .search_mode(args.mode)
        .timeline_source(args.source)
        .include_replies(args.replies)
        .build();
    config.proxy = args.proxy;
    config.delay = args.delay.map(Duration::from_millis);
    let scraper = Scraper::new(config)?;

    if args.login {
        let username = std::env::var("TWITTER_USERNAME").unwrap_or_default();
        let password = std::env::var("TWITTER_PASSWORD").unwrap_or_default();
        let confirmation = std::env::var("TWITTER_CONFIRMATION").ok();
        scraper
            .login(&username, &password, confirmation.as_deref())
            .await?;
    } else if args.open_account {
        scraper.login_open_account().await?;
    }

    match args.command {
        Command::Tweets { username } => print_stream(scraper.get_tweets(&username, args.limit)).await,
        Command::Search { query } => print_stream(scraper.search_tweets(&query, args.limit)).await,
        Command::Profiles { query } => {
            print_stream(scraper.search_profiles(&query, args.limit)).await
        }
        Command::Profile { username } => {
            print_one(&scraper.get_profile(&username).await?);
            Ok(())
        }
        Command::Tweet { id } => {
            print_one(&scraper.get_tweet(&id).await?);
            Ok(())
        }
    }
}

async fn print_stream<T, S>(stream: S) -> Result<(), Error>
where
    T: Serialize,
    S: Stream<Item = Result<T, Error>>,
{
    futures_util::pin_mut!(stream);
    while let Some(item) = stream.next().await {
        if !print_one(&item?) {
            break;
        }
    }
    Ok(())
}

/// Write one NDJSON line. Returns false once stdout is gone.
fn print_one<T: Serialize>(item: &T) -> bool {
    let line = match serde_json::to_string(item) {
        Ok(line) => line,
        Err(e) => {
            tracing::error!(error = %e, "unable to serialize result");
            return true;
        }
    };
    match writeln!(std::io::stdout(), "{line}") {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => false,
        Err(e) => {
            tracing::error!(error = %e, "unable to write result");
            false
        }
    }
}

fn exit_code(e: &Error) -> ExitCode {
    match e {
        Error::NotFound(name) => {
            eprintln!("not found: {name}");
            ExitCode::from(10)
        }
        Error::Suspended(name) => {
            eprintln!("account suspended: {name}");
            ExitCode::from(10)
        }
        Error::ConfirmationRequired(subtask) => {
            eprintln!("login needs confirmation ({subtask}), set TWITTER_CONFIRMATION");
            ExitCode::from(11)
        }
        Error::NotLoggedIn => {
            eprintln!("this query needs --login");
            ExitCode::from(11)
        }
        e => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
