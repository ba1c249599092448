use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tweetfetch::{
    Config, DirectorySink, FetchConfig, FetchRequest, FetchResults, FixtureSource, Settings,
    SyndicationSource, TweetSource, TwitterFetcher,
};

#[derive(Parser)]
#[command(name = "tweetfetch")]
#[command(about = "Fetch Twitter widget timelines and render them as HTML")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/tweetfetch/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory that output targets are written to
    #[arg(short, long, global = true)]
    out_dir: Option<PathBuf>,

    /// Serve timelines from a JSON fixture file instead of the network
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every [[fetch]] job in the config file
    Run,
    /// Fetch a profile timeline
    Profile {
        screen_name: String,
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Fetch tweets a user liked
    Likes {
        screen_name: String,
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Fetch a list timeline
    List {
        screen_name: String,
        list_slug: String,
        #[command(flatten)]
        display: DisplayArgs,
    },
}

#[derive(Args)]
struct DisplayArgs {
    /// Write into <out-dir>/<DOM_ID>.html instead of printing
    #[arg(long)]
    dom_id: Option<String>,
    /// Number of tweets (1-20)
    #[arg(short = 'n', long, default_value_t = 20, allow_negative_numbers = true)]
    max_tweets: i64,
    #[arg(long)]
    no_links: bool,
    #[arg(long)]
    hide_user: bool,
    #[arg(long)]
    hide_time: bool,
    #[arg(long)]
    hide_retweets: bool,
    #[arg(long)]
    hide_interaction: bool,
    #[arg(long)]
    show_images: bool,
    /// Open links in the same window
    #[arg(long)]
    same_window: bool,
    #[arg(long)]
    no_permalinks: bool,
    #[arg(long, default_value = "en")]
    lang: String,
    /// Print records as JSON instead of HTML
    #[arg(long, conflicts_with = "dom_id")]
    data_only: bool,
}

impl DisplayArgs {
    fn apply(self, mut config: FetchConfig) -> FetchConfig {
        config.dom_id = self.dom_id;
        config.max_tweets = self.max_tweets;
        config.enable_links = !self.no_links;
        config.show_user = !self.hide_user;
        config.show_time = !self.hide_time;
        config.show_retweet = !self.hide_retweets;
        config.show_interaction = !self.hide_interaction;
        config.show_images = self.show_images;
        config.links_in_new_window = !self.same_window;
        config.show_permalinks = !self.no_permalinks;
        config.lang = self.lang;
        config.data_only = self.data_only;
        config
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tweetfetch=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_source(settings: &Settings) -> Box<dyn TweetSource> {
    match &settings.fixture {
        Some(path) => Box::new(FixtureSource::new(path)),
        None => Box::new(SyndicationSource::from_settings(settings)),
    }
}

/// Jobs without a `domId` print to stdout, the way a custom callback would
/// populate its own template.
fn into_request(config: FetchConfig) -> FetchRequest {
    if let Some(dom_id) = &config.dom_id {
        if config.data_only {
            tracing::warn!(dom_id = %dom_id, "dataOnly has no effect when writing to a target");
        }
        return FetchRequest::new(config);
    }
    FetchRequest::new(config).custom_callback(print_results)
}

fn print_results(results: FetchResults) {
    match results {
        FetchResults::Data(records) => match serde_json::to_string_pretty(&records) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!(error = %e, "failed to encode tweets"),
        },
        FetchResults::Html(fragments) => {
            for fragment in fragments {
                println!("{}", fragment);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config)?;
    if let Some(out_dir) = cli.out_dir {
        config.settings.output_dir = out_dir;
    }
    if let Some(fixture) = cli.fixture {
        config.settings.fixture = Some(fixture);
    }

    let jobs = match cli.command {
        Commands::Run => {
            if config.fetches.is_empty() {
                tracing::warn!("config has no [[fetch]] jobs");
            }
            std::mem::take(&mut config.fetches)
        }
        Commands::Profile {
            screen_name,
            display,
        } => vec![display.apply(FetchConfig::profile(screen_name))],
        Commands::Likes {
            screen_name,
            display,
        } => vec![display.apply(FetchConfig::likes(screen_name))],
        Commands::List {
            screen_name,
            list_slug,
            display,
        } => vec![display.apply(FetchConfig::list(screen_name, list_slug))],
    };

    let fetcher = TwitterFetcher::new(build_source(&config.settings))
        .with_policy(config.settings.max_tweets_policy);
    let sink = DirectorySink::new(&config.settings.output_dir);

    // jobs are independent; jobs sharing a domId are last-write-wins
    let results: Vec<_> = stream::iter(
        jobs.into_iter()
            .map(|job| fetcher.fetch(into_request(job), &sink)),
    )
    .buffer_unordered(4)
    .collect()
    .await;

    let mut failures = 0;
    for result in results {
        match result {
            Ok(report) if report.retrieval_error.is_some() => failures += 1,
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "fetch failed");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} fetch job(s) failed", failures);
    }
    Ok(())
}
