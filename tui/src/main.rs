//! SudoSolve TUI Entry Point
//!
//! Launches the terminal for SudoSolve: type `start`, `upload` a photo of a
//! sudoku, `download` the solved grid.
//!
//! Usage:
//!   sudosolve [OPTIONS]
//!
//! Options:
//!   --config <PATH>            Config file (default: ~/.config/sudosolve/config.toml)
//!   --backend-url <URL>        Solver base URL
//!   --auto-solve               Solve right after upload instead of on `solve`
//!   --keep-session-on-clear    `clear` only empties the log
//!   --download-dir <DIR>       Where `download` writes the solved image
//!   --log-file <PATH>          Log destination

use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sudosolve_core::{load_config_from_path, ConductorConfig, ConfigOverrides};
use sudosolve_tui::App;

/// Default log filter when RUST_LOG is unset
const DEFAULT_LOG_FILTER: &str = "sudosolve=info,sudosolve_core=info,sudosolve_tui=info";

#[derive(Debug, Parser)]
#[command(name = "sudosolve", version, about = "Solve sudoku photos from your terminal")]
struct Args {
    /// Config file path
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Solver base URL
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,

    /// Solve automatically after each upload
    #[arg(long)]
    auto_solve: bool,

    /// Keep the session (staged and solved images) when clearing the log
    #[arg(long)]
    keep_session_on_clear: bool,

    /// Directory solved images are written to
    #[arg(long, value_name = "DIR")]
    download_dir: Option<PathBuf>,

    /// Log file path
    #[arg(long, value_name = "PATH", env = "SUDOSOLVE_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(url) = &self.backend_url {
            overrides = overrides.with_backend_url(url.clone());
        }
        if self.auto_solve {
            overrides = overrides.with_manual_solve(false);
        }
        if self.keep_session_on_clear {
            overrides = overrides.with_clear_resets_session(false);
        }
        if let Some(dir) = &self.download_dir {
            overrides = overrides.with_download_dir(dir.clone());
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Check if we have a TTY before attempting initialization
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: sudosolve requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means:");
        eprintln!("  - Running in a non-interactive environment (CI, container)");
        eprintln!("  - SSH without -t flag");
        eprintln!("  - Piped stdin/stdout");
        std::process::exit(1);
    }

    init_logging(args.log_file.clone())?;
    let config = build_config(&args)?;
    tracing::info!(
        backend = %config.backend.url,
        manual_solve = config.manual_solve,
        source = ?config.source(),
        "Starting SudoSolve"
    );

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the app
    let result = run_app(&mut terminal, config).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Propagate any errors
    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: ConductorConfig,
) -> anyhow::Result<()> {
    let mut app = App::new(config)?;
    app.run(terminal).await?;

    // Show goodbye message after TUI closes
    if let Some(goodbye) = app.goodbye() {
        println!("\n\x1b[32mSudoSolve:\x1b[0m {goodbye}\n");
    }

    Ok(())
}

/// Config file < environment < command line
fn build_config(args: &Args) -> anyhow::Result<ConductorConfig> {
    let mut config = load_config_from_path(args.config.clone())?;
    let overrides = args.overrides();
    if !overrides.is_empty() {
        overrides.apply(&mut config);
        config.validate()?;
    }
    Ok(config)
}

/// Log to a file; the terminal belongs to the UI
fn init_logging(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(default_log_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        )
        .with(filter)
        .init();
    Ok(())
}

fn default_log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("sudosolve")
        .join("sudosolve.log")
}
