use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fotomapa::config::Config;
use fotomapa::controller::{GalleryController, StdinPrompter, SystemUrlOpener};
use fotomapa::gallery::{CommandCamera, PhotoRecord, PhotoStore};
use fotomapa::location::{CommandPositionSource, LocationService, NoFixSource, PositionSource};
use fotomapa::logging;
use fotomapa::prefs::Preferences;

enum Command {
    Add,
    List,
    Delete(usize),
    Open(usize),
    Log,
}

fn parse_args() -> (Option<PathBuf>, Command) {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;
    let mut command = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("fotomapa {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            "add" => command = Some(Command::Add),
            "list" => command = Some(Command::List),
            "log" => command = Some(Command::Log),
            "delete" | "open" => {
                let Some(index) = args.get(i + 1).and_then(|a| a.parse::<usize>().ok()) else {
                    eprintln!("Error: {} requires a photo index", args[i]);
                    std::process::exit(1);
                };
                command = Some(if args[i] == "delete" {
                    Command::Delete(index)
                } else {
                    Command::Open(index)
                });
                i += 1;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    (config_path, command.unwrap_or(Command::List))
}

fn print_help() {
    println!(
        r#"fotomapa - geotagged photo gallery

USAGE:
    fotomapa [OPTIONS] [COMMAND]

COMMANDS:
    add             Capture a new photo and add it to the gallery
    list            List the saved photos, newest first (default)
    delete INDEX    Delete the photo at INDEX (asks for confirmation)
    open INDEX      Open the photo's location in the map viewer
    log             Print the location log

OPTIONS:
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    FOTOMAPA_CONFIG     Path to config file (overrides default location)
    FOTOMAPA_LOG        Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/fotomapa/config.toml"#
    );
}

fn print_photo_list(photos: &[PhotoRecord]) {
    if photos.is_empty() {
        println!("The gallery is empty.");
        return;
    }

    for (index, photo) in photos.iter().enumerate() {
        let when = photo
            .taken_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown time".to_string());
        let place = if photo.location.is_no_fix() {
            "no location".to_string()
        } else {
            format!(
                "{}, {} (±{} m)",
                photo.location.latitude, photo.location.longitude, photo.location.accuracy
            )
        };
        println!("{index:3}  {}  {when}  {place}", photo.filepath);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let (config_path, command) = parse_args();

    // Initialize logging (uses journald on Linux, file fallback otherwise)
    let _ = logging::init(Some(Config::config_dir().join("logs")));

    // Load configuration
    let config = match config_path {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };

    let prefs = Preferences::open(&config.storage.prefs_path)?;

    let source: Arc<dyn PositionSource> = match &config.location.fix_command {
        Some(fix_command) => Arc::new(CommandPositionSource::new(fix_command.clone())),
        None => Arc::new(NoFixSource),
    };
    let log_path = config.storage.documents_dir.join(&config.location.log_filename);
    let location = LocationService::new(
        source,
        log_path.clone(),
        Duration::from_millis(config.location.fix_timeout_ms),
    );

    let camera = Arc::new(CommandCamera::new(config.camera.command.clone()));
    let store = PhotoStore::new(prefs, config.storage.data_dir.clone(), camera, location);
    let mut controller =
        GalleryController::new(store, Arc::new(StdinPrompter), Arc::new(SystemUrlOpener));

    controller.load_saved_photos().await?;

    let ok = match command {
        Command::Add => controller.add_photo().await,
        Command::List => {
            print_photo_list(controller.store().photos());
            true
        }
        Command::Delete(index) => controller.delete_photo(index).await,
        Command::Open(index) => match controller.store().photos().get(index) {
            Some(photo) => {
                let reading = photo.location;
                controller
                    .open_location(reading.latitude, reading.longitude)
                    .await
            }
            None => {
                eprintln!("There is no photo at index {index}");
                false
            }
        },
        Command::Log => {
            match std::fs::read_to_string(&log_path) {
                Ok(content) => print!("{content}"),
                Err(_) => println!("No locations have been logged yet."),
            }
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
