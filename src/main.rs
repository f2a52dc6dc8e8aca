use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use geolocator::config::{AppConfig, InstanceConfig};
use geolocator::host::HostClock;
use geolocator::location::FallbackResolver;
use geolocator::server;
use geolocator::store::{LoggingObserver, SnapshotStore};
use geolocator::telemetry;
use geolocator::updater::{Geolocator, Updater};

/// Geolocator: reverse geocoding and time zone resolution for a home location.
///
/// Resolves a coordinate to an address and an IANA time zone through an
/// online provider, falling back to bundled time zone boundaries.
///
/// Examples:
///   geolocator once --lat 48.8566 --lon 2.3522
///   geolocator once --lat 40.7128 --lon -74.0060 --provider osm --public-lands
///   geolocator once --lat 35.6762 --lon 139.6503 --provider google --api-key KEY --language de
///   geolocator serve --config ./config.toml --port 8686
#[derive(Parser)]
#[command(name = "geolocator", version, about, long_about = None)]
struct Cli {
    /// Log filter when RUST_LOG is unset (e.g. "debug", "geolocator=trace").
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service for every configured instance.
    Serve {
        /// Config file. Defaults to <config dir>/geolocator/config.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured listen address.
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a single update cycle and print the attributes as JSON.
    Once {
        /// Latitude (-90 to 90).
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude (-180 to 180).
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// google, geonames, bigdatacloud, opencage, osm or offline.
        #[arg(long, default_value = "offline")]
        provider: String,

        /// API key (GeoNames: username).
        #[arg(long)]
        api_key: Option<String>,

        /// Language for addresses and time zone names.
        #[arg(long, default_value = "en")]
        language: String,

        /// Also query the US public-land overlay.
        #[arg(long)]
        public_lands: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    telemetry::init(cli.log_level.as_deref());

    match cli.command {
        Command::Serve { config, host, port } => serve(config, host, port).await,
        Command::Once {
            lat,
            lon,
            provider,
            api_key,
            language,
            public_lands,
        } => {
            let config = InstanceConfig {
                id: "once".to_string(),
                provider,
                api_key,
                language,
                latitude: lat,
                longitude: lon,
                enable_public_lands: public_lands,
                user_agent: None,
            };
            once(config).await
        }
    }
}

fn new_updater(fallback: Arc<FallbackResolver>) -> Updater {
    Updater::new(Arc::new(SnapshotStore::new()), Arc::new(HostClock::new()), fallback)
}

async fn serve(config_path: Option<PathBuf>, host: Option<String>, port: Option<u16>) {
    let config = AppConfig::load_or_default(config_path.as_deref()).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    // Decode the boundary polygons while the server starts.
    let fallback = Arc::new(FallbackResolver::new());
    let warming = Arc::clone(&fallback);
    tokio::task::spawn_blocking(move || warming.warm());

    let geolocator = Arc::new(
        Geolocator::new(new_updater(fallback))
            .with_observer(Arc::new(LoggingObserver))
            .with_refresh_interval(Duration::from_secs(config.update_interval_secs)),
    );

    for instance in &config.instances {
        if let Err(e) = geolocator.activate(instance) {
            eprintln!("Error: cannot activate '{}': {}", instance.id, e);
            std::process::exit(1);
        }
    }

    // Without scheduled refresh, run the first cycle here.
    if config.update_interval_secs == 0 {
        geolocator.update_all().await;
    }

    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);
    if let Err(e) = server::start(geolocator, &host, port).await {
        eprintln!("Error: server on {}:{} failed: {}", host, port, e);
        std::process::exit(1);
    }
}

async fn once(config: InstanceConfig) {
    let geolocator = Geolocator::new(new_updater(Arc::new(FallbackResolver::new())));
    if let Err(e) = geolocator.activate(&config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let snapshot = match geolocator.update_now(&config.id).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!(
        "  {} ({}) via {}",
        snapshot.timezone.timezone_id.as_deref().unwrap_or("no time zone"),
        snapshot.timezone.full_display_name.as_deref().unwrap_or("-"),
        snapshot.timezone.source,
    );

    match serde_json::to_string_pretty(&snapshot.attributes()) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: cannot encode attributes: {}", e);
            std::process::exit(1);
        }
    }
}
