//! imgharvest CLI
//!
//! Scrapes image search results for a list of keywords and downloads the
//! images, or downloads a single image URL directly.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{ArgGroup, Parser};
use imgharvest::{
    error::{AppError, Result},
    models::{Browser, Color, Config, ContentType, FileType, ImageSize, Orientation, SearchFilters},
    pipeline::{Downloader, DownloaderSettings, download_single_image},
    services::{CaptchaGate, HttpSession, ImageFetcher, StdinPrompt, strategy_for},
    storage,
    utils::{Interrupt, parse_keyword_lines, parse_keyword_list},
};

const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// imgharvest - Keyword Image Search Downloader
#[derive(Parser, Debug)]
#[command(
    name = "imgharvest",
    version,
    about = "Downloads image search results by keyword"
)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["keywords", "keywords_from_file", "single_image"])
))]
struct Cli {
    /// Browser profile presented by the search session
    #[arg(value_enum)]
    browser: Browser,

    /// Comma-delimited list of keywords
    #[arg(short, long)]
    keywords: Option<String>,

    /// File with one keyword per line
    #[arg(short = 'f', long)]
    keywords_from_file: Option<PathBuf>,

    /// Download a single image URL
    #[arg(short = 'x', long)]
    single_image: Option<String>,

    /// Directory the images are saved to
    #[arg(short, long, default_value = "downloads")]
    output_directory: PathBuf,

    /// Maximum number of images per keyword
    #[arg(short, long, default_value_t = 100)]
    limit: usize,

    /// Image size
    #[arg(long = "isize", value_enum, conflicts_with = "exact_isize")]
    image_size: Option<ImageSize>,

    /// Exact image size as WIDTH HEIGHT
    #[arg(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
    exact_isize: Option<Vec<u32>>,

    /// Image orientation
    #[arg(long, value_enum)]
    iorient: Option<Orientation>,

    /// Image content type
    #[arg(long, value_enum)]
    itype: Option<ContentType>,

    /// Dominant color
    #[arg(long, value_enum)]
    color: Option<Color>,

    /// Image file format
    #[arg(long, value_enum)]
    extension: Option<FileType>,

    /// Only images free for commercial use
    #[arg(long)]
    commercial: bool,

    /// Only images from the last week
    #[arg(long)]
    recent: bool,

    /// Save the result tree as JSON under the output directory
    #[arg(long)]
    json: Option<String>,

    /// Number of download workers; 0 downloads inline
    #[arg(long, default_value_t = 0)]
    num_workers: usize,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet_mode: bool,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn filters(&self) -> SearchFilters {
        SearchFilters {
            size: self.image_size,
            exact_size: self.exact_isize.as_deref().and_then(|dims| match dims {
                [width, height] => Some((*width, *height)),
                _ => None,
            }),
            orientation: self.iorient,
            file_type: self.extension,
            color: self.color,
            content_type: self.itype,
            commercial: self.commercial,
            recent: self.recent,
        }
    }

    async fn keyword_list(&self) -> Result<Vec<String>> {
        if let Some(list) = &self.keywords {
            return Ok(parse_keyword_list(list));
        }
        if let Some(path) = &self.keywords_from_file {
            let text = tokio::fs::read_to_string(path).await?;
            return Ok(parse_keyword_lines(&text));
        }
        Ok(Vec::new())
    }
}

/// Initialize logging based on verbosity flags.
fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet_mode);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start the async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let code = match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    };
    // A pending stdin read must not keep the process alive.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    code
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => Config::load_or_default(path),
        None => Config::default(),
    };
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    let interrupt = Interrupt::install_ctrl_c();
    let started = Instant::now();

    if let Some(url) = &cli.single_image {
        let fetcher = ImageFetcher::new(&config.fetch)?;
        let result =
            download_single_image(&fetcher, url, &cli.output_directory, &interrupt).await?;
        log::info!("Elapsed time: {:.2}s", started.elapsed().as_secs_f64());
        return Ok(if result.status.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let keywords = cli.keyword_list().await?;
    if keywords.is_empty() {
        return Err(AppError::validation("no keywords given"));
    }

    let session = HttpSession::new(cli.browser, &config.search)?;
    let gate = CaptchaGate::new(
        Box::new(session),
        Box::new(StdinPrompt::new()),
        interrupt.clone(),
    );
    let dispatch = strategy_for(cli.num_workers, &config.fetch)?;
    let settings = DownloaderSettings::from_config(&config, &cli.output_directory)?;
    let mut downloader = Downloader::new(gate, dispatch, &cli.filters(), settings, interrupt);

    let outcome = downloader.run(&keywords, cli.limit).await;

    if let Err(e) = downloader.shutdown(config.pool.drain_timeout()).await {
        log::warn!("Failed to release the search session: {e}");
    }

    if let Some(name) = &cli.json {
        storage::save_run_result(&cli.output_directory.join(name), &outcome.result).await?;
    }

    log::info!("Total errors: {}", outcome.result.total_errors());
    log::info!(
        "Total files downloaded: {}",
        outcome.result.downloaded_count()
    );
    log::info!("Elapsed time: {:.2}s", started.elapsed().as_secs_f64());

    if let Some(abort) = outcome.abort {
        log::error!("{abort}");
        return Ok(ExitCode::FAILURE);
    }
    log::info!("{}", outcome.result.message);
    Ok(ExitCode::SUCCESS)
}
