use chakram::catalog::{
    CatalogSource, ContentTypeFilter, LicenseChallenge, ListRequest, StaticListing,
};
use chakram::device::new_device_id;
use chakram::{
    CatalogClient, ChakramError, Config, FindOptions, ProgressEvent, Title, TitleType, TitleView,
    find_titles,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chakram")]
#[command(about = "Find, list and play titles from the Amazon Video catalog", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Cookie header of a logged-in browser session
    #[arg(long, env = "CHAKRAM_COOKIES", global = true, hide_env_values = true)]
    cookies: Option<String>,

    /// File containing the cookie header
    #[arg(long, global = true)]
    cookies_file: Option<PathBuf>,

    /// Device id to present instead of a generated one
    #[arg(long, env = "CHAKRAM_DEVICE_ID", global = true)]
    device_id: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log more detail to stderr (repeat for trace output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the titles best matching a query
    Find {
        /// What to search for
        query: String,

        /// Only return titles of this kind
        #[arg(short = 't', long = "type", value_enum)]
        title_type: Option<TitleType>,

        /// Rank a saved catalog listing instead of querying the catalog
        #[arg(long)]
        from: Option<PathBuf>,

        /// Restrict the catalog listing to a content type
        #[arg(long, value_enum)]
        content_type: Option<ContentTypeFilter>,

        /// Number of catalog results to rank
        #[arg(long, default_value_t = 50)]
        results: u32,

        /// Choose one result interactively and print its watch URL
        #[arg(long, conflicts_with = "json")]
        pick: bool,
    },

    /// List the episodes of one or more seasons
    Episodes {
        /// Season title ids
        #[arg(required = true)]
        season_ids: Vec<String>,
    },

    /// Show details for one or more titles
    Info {
        #[arg(required = true)]
        title_ids: Vec<String>,
    },

    /// Resolve the license URL and DASH manifests of a movie or episode
    Playback { title_id: String },

    /// Exchange a Widevine challenge for a license
    License {
        /// License URL as printed by `playback`
        license_url: String,

        /// File holding the challenge
        challenge: PathBuf,

        /// The challenge file already holds base64 text
        #[arg(long)]
        base64: bool,
    },

    /// Guess which title and position to resume
    Resume { title_id: String },

    /// Generate a fresh device id
    DeviceId,
}

/// Handles progress events by logging them
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::FetchingListing { query } => {
            info!("Fetching catalog listing for '{}'...", query);
        }
        ProgressEvent::ListingFetched { record_count } => {
            info!("Received {} catalog record(s)", record_count);
        }
        ProgressEvent::RecordsNormalized {
            title_count,
            skipped,
        } => {
            if skipped > 0 {
                info!("Skipped {} malformed record(s)", skipped);
            }
            debug!("{} usable title(s)", title_count);
        }
        ProgressEvent::Complete { match_count } => {
            info!("Found {} match(es)", match_count);
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Layers command-line settings over the configuration file
fn load_config(cli: &Cli) -> Result<Config, ChakramError> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(cookies) = &cli.cookies {
        config.cookies = Some(cookies.clone());
    }
    if let Some(path) = &cli.cookies_file {
        config.cookies = None;
        config.cookies_file = Some(path.clone());
    }
    if let Some(device_id) = &cli.device_id {
        config.device_id = Some(device_id.clone());
    }

    config.resolve_cookies()?;
    Ok(config)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), ChakramError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

fn print_titles(titles: &[Title], json: bool) -> Result<(), ChakramError> {
    let views: Vec<TitleView> = titles.iter().map(TitleView::from).collect();

    if json {
        return print_json(&views);
    }

    if views.is_empty() {
        println!("No titles found.");
        return Ok(());
    }

    for (index, view) in views.iter().enumerate() {
        println!("{}. [{}] {} ({})", index + 1, view.title_type, view.title, view.id);
        println!("   {}", view.watch_url);
    }

    Ok(())
}

fn pick_title(titles: &[Title]) -> Result<(), ChakramError> {
    if titles.is_empty() {
        println!("No titles found.");
        return Ok(());
    }

    let items: Vec<String> = titles
        .iter()
        .map(|t| format!("[{}] {}", t.title_type(), t.title()))
        .collect();

    let selection = dialoguer::Select::new()
        .with_prompt("Which title did you mean?")
        .items(&items)
        .default(0)
        .interact_opt()?;

    if let Some(index) = selection {
        println!("{}", titles[index].watch_url());
    }

    Ok(())
}

/// Loads configuration and builds the catalog client
fn connect(cli: &Cli) -> Result<CatalogClient, ChakramError> {
    let config = load_config(cli)?;
    let client = CatalogClient::new(&config)?;
    debug!(device_id = %client.device_id(), "catalog client ready");
    Ok(client)
}

fn run(cli: Cli) -> Result<(), ChakramError> {
    match &cli.command {
        Commands::Find {
            query,
            title_type,
            from: Some(path),
            pick,
            ..
        } => {
            let listing = StaticListing::from_file(path)?;
            let options = FindOptions {
                type_filter: *title_type,
                ..FindOptions::default()
            };
            report_find(&listing, query, &options, *pick, cli.json)
        }
        Commands::Find {
            query,
            title_type,
            content_type,
            results,
            pick,
            from: None,
        } => {
            let client = connect(&cli)?;
            let options = FindOptions {
                request: ListRequest {
                    content_type: *content_type,
                    results_count: Some(*results),
                    roll_up_to_season: *content_type == Some(ContentTypeFilter::TvSeason),
                    ..ListRequest::default()
                },
                type_filter: *title_type,
            };
            report_find(&client, query, &options, *pick, cli.json)
        }
        Commands::Episodes { season_ids } => {
            let episodes = connect(&cli)?.get_episodes(season_ids)?;
            let titles: Vec<Title> = episodes.into_iter().map(Title::Episode).collect();
            print_titles(&titles, cli.json)
        }
        Commands::Info { title_ids } => {
            let titles = connect(&cli)?.get_title_info(title_ids)?;
            print_titles(&titles, cli.json)
        }
        Commands::Playback { title_id } => {
            let info = connect(&cli)?.get_playback_info(title_id)?;
            if cli.json {
                return print_json(&info);
            }

            println!("License URL: {}", info.license_url);
            if info.manifests.is_empty() {
                println!("No DASH manifests available.");
            }
            for manifest in &info.manifests {
                println!("  {}: {}", manifest.cdn, manifest.url);
            }
            Ok(())
        }
        Commands::License {
            license_url,
            challenge,
            base64,
        } => {
            let client = connect(&cli)?;
            let data = fs::read(challenge)?;
            let text;
            let challenge = if *base64 {
                text = String::from_utf8_lossy(&data).trim().to_string();
                LicenseChallenge::Base64(&text)
            } else {
                LicenseChallenge::Bytes(&data)
            };

            let license = client.fetch_license(license_url, challenge)?;
            println!("{}", license);
            Ok(())
        }
        Commands::Resume { title_id } => {
            let resume = connect(&cli)?.guess_resume_info(title_id)?;
            if cli.json {
                return print_json(&resume);
            }

            println!(
                "Resume {} at {:.1}s",
                resume.id,
                resume.start_time_millis as f64 / 1000.0
            );
            Ok(())
        }
        Commands::DeviceId => {
            // Cookies are irrelevant here, so only the file layer is read
            let config = Config::load(cli.config.as_deref())?;
            println!("{}", new_device_id(&config.user_agent));
            Ok(())
        }
    }
}

fn report_find<S: CatalogSource>(
    source: &S,
    query: &str,
    options: &FindOptions,
    pick: bool,
    json: bool,
) -> Result<(), ChakramError> {
    let titles = find_titles(source, query, options, handle_progress_event)?;

    if pick {
        pick_title(&titles)
    } else {
        print_titles(&titles, json)
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_runs_without_catalog_settings() {
        let path = std::env::temp_dir().join(format!("chakram_{}_config.toml", ulid::Ulid::new()));
        fs::write(&path, "cookies_file = \"/nonexistent/cookies.txt\"\n").unwrap();

        let cli = Cli::parse_from([
            "chakram",
            "--config",
            path.to_str().unwrap(),
            "device-id",
        ]);
        let result = run(cli);
        fs::remove_file(&path).unwrap();

        assert!(result.is_ok());
    }
}
