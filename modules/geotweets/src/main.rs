use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use geotweets::Config;
use social_search_client::{encode_credentials, GeoPoint, SearchRadius};

#[derive(Parser)]
#[command(name = "geotweets")]
#[command(about = "Posts near a location")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search posts around a coordinate
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Search term (defaults to SEARCH_QUERY)
        #[arg(short, long)]
        query: Option<String>,

        /// Radius such as 30mi or 50km (defaults to SEARCH_RADIUS)
        #[arg(short, long)]
        radius: Option<SearchRadius>,
    },

    /// Print the Basic credential derived from TWITTER_API_KEY / TWITTER_API_SECRET
    EncodeCredentials,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("geotweets=info".parse()?)
                .add_directive("social_search_client=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Nearby {
            lat,
            lon,
            query,
            radius,
        } => {
            let center = GeoPoint::new(lat, lon)
                .ok_or_else(|| anyhow::anyhow!("--lat and --lon must be finite numbers"))?;
            if let Some(query) = query {
                config.search_query = query;
            }
            if let Some(radius) = radius {
                config.search_radius = radius;
            }
            config.log_redacted();

            let client = config.build_client()?;
            let posts = client.fetch_nearby(&config.credentials(), center).await?;
            info!(count = posts.len(), "Search complete");

            if posts.is_empty() {
                println!("No posts found near {lat},{lon}.");
            }
            for post in posts {
                println!("{} (@{})", post.author, post.handle.trim_start_matches('@'));
                println!("  {}", post.content);
                if !post.icon_url.is_empty() {
                    println!("  avatar: {}", post.icon_url);
                }
            }
        }
        Commands::EncodeCredentials => {
            println!(
                "{}",
                encode_credentials(&config.twitter_api_key, &config.twitter_api_secret)
            );
        }
    }

    Ok(())
}
