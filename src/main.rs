use clap::Parser;
use photoscan::output::{self, EventKind, EventSink, ScanEvent};
use photoscan::scan::{self, ScanError};
use photoscan::{config, logging, signal};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "photoscan")]
#[command(version)]
#[command(about = "Index a photo tree into JSON album documents and JPEG thumbnails")]
#[command(long_about = "\
Index a photo tree into JSON album documents and JPEG thumbnails

Every directory under ALBUM_PATH that holds photos (directly or deeper)
becomes an album. CACHE_PATH receives, in one flat directory:

  root.json, <album-key>.json      one document per non-empty album
  all_photos.json                  sorted list of every photo path
  <photo-key>_<size>[s].jpg        one thumbnail per configured size

Re-running is incremental: unchanged directories are taken from their
cached document, unchanged photos keep their metadata and thumbnails, and
cache files the tree no longer accounts for are deleted at the end.

Thumbnail sizes, JPEG quality and thread count come from
ALBUM_PATH/.photoscan.toml (or --config).")]
struct Cli {
    /// Root of the photo tree to scan
    album_path: PathBuf,

    /// Directory for album documents and thumbnails (created if missing)
    cache_path: PathBuf,

    /// Config file to use instead of ALBUM_PATH/.photoscan.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// More diagnostics on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors on stderr
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage mistakes are not failures.
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
    };

    logging::init_logging(cli.verbose, cli.quiet);
    let shutdown = signal::install_handler().unwrap_or_else(|e| {
        log::warn!("{e}; Ctrl+C will terminate without cleanup");
        signal::ShutdownHandler::new()
    });

    let loaded = match &cli.config {
        Some(path) => config::load_config_file(path),
        None => config::load_config(&cli.album_path),
    };
    let scan_config = match loaded {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    init_thread_pool(&scan_config.processing);

    let (tx, rx) = std::sync::mpsc::channel::<ScanEvent>();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_event(&event);
        }
    });

    let result = scan::scan(
        &cli.album_path,
        &cli.cache_path,
        &scan_config,
        &shutdown,
        EventSink::new(tx),
    );
    // The sink is dropped with the scan, which closes the channel.
    if printer.join().is_err() {
        log::warn!("progress printer panicked");
    }

    match result {
        Ok(report) => {
            log::info!("{report}");
            ExitCode::SUCCESS
        }
        Err(ScanError::Interrupted) => {
            output::print_event(&ScanEvent::new(
                0,
                EventKind::Keyboard,
                "CTRL+C pressed, quitting.",
            ));
            ExitCode::from(signal::EXIT_CODE_INTERRUPTED)
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
