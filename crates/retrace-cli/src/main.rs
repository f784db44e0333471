// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! retrace: replay recorded graph-algorithm runs from the terminal.
//!
//! Runs are `*.mcg` documents. A run argument is either a path or a bare
//! name looked up as `<run_dir>/<name>.mcg`, where `run_dir` comes from
//! `--dir`, the saved preferences, or the current directory.

mod play;
mod report;
mod verify;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use retrace_app_core::config::ConfigService;
use retrace_app_core::config_port::PrefsPort;
use retrace_app_core::prefs::PlaybackPrefs;
use retrace_config_fs::FsConfigStore;
use retrace_core::{run_path, AutoPlayConfig, ReplaySession, RunCatalog, RunFile, RUN_EXTENSION};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay recorded graph-algorithm runs")]
struct Args {
    /// Log at debug level (RUST_LOG still applies on top)
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Directory holding saved preferences (defaults to the platform config dir)
    #[arg(long, global = true, env = "RETRACE_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the runs in a directory
    List {
        /// Directory to scan (defaults to the saved run dir)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Show a run's metadata, sizes and opcode histogram
    Inspect {
        /// Run path or name
        run: String,
    },
    /// Auto-play a run headless, printing progress
    Play {
        /// Run path or name
        run: String,
        /// Milliseconds between firings
        #[arg(long)]
        speed: Option<u64>,
        /// Milliseconds before the first firing
        #[arg(long)]
        initial_delay: Option<u64>,
        /// Advance by step (true) or by frame (false); overrides the saved pref
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        stepwise: Option<bool>,
        /// Fast-forward to the end, then play backwards
        #[arg(long)]
        reverse: bool,
        /// After reaching the end, play back to the start
        #[arg(long, conflicts_with = "reverse")]
        bounce: bool,
    },
    /// Replay to the end and back, checking every boundary restores the same graph
    Verify {
        /// Run path or name
        run: String,
    },
    /// Show or update saved playback preferences
    Prefs {
        /// Milliseconds between firings
        #[arg(long)]
        speed: Option<u64>,
        /// Milliseconds before the first firing
        #[arg(long)]
        initial_delay: Option<u64>,
        /// Auto-play by step (true) or by frame (false)
        #[arg(long)]
        stepwise: Option<bool>,
        /// Directory searched for run names
        #[arg(long)]
        run_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let config = ConfigService::new(open_store(args.config_dir.as_deref())?);
    let prefs = config.load_prefs();
    debug!(?prefs, "loaded prefs");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.cmd {
        Command::List { dir } => {
            let dir = dir.unwrap_or_else(|| prefs.run_dir_or_cwd());
            let catalog = RunCatalog::scan(&dir)
                .with_context(|| format!("cannot list runs in {}", dir.display()))?;
            report::list(&mut out, &dir, &catalog)?;
        }
        Command::Inspect { run } => {
            let path = resolve_run(&run, &prefs);
            let run = load(&path)?;
            report::inspect(&mut out, &path, &run)?;
        }
        Command::Play {
            run,
            speed,
            initial_delay,
            stepwise,
            reverse,
            bounce,
        } => {
            let mut cfg = prefs.autoplay_config();
            if let Some(ms) = speed {
                cfg.speed = std::time::Duration::from_millis(ms);
            }
            if let Some(ms) = initial_delay {
                cfg.initial_delay = std::time::Duration::from_millis(ms);
            }
            cfg.stepwise = stepwise.unwrap_or(cfg.stepwise);
            let session = open_session(&resolve_run(&run, &prefs), cfg)?;
            let mode = if reverse {
                play::Mode::Reverse
            } else if bounce {
                play::Mode::Bounce
            } else {
                play::Mode::Forward
            };
            play::run(&mut out, session, mode)?;
        }
        Command::Verify { run } => {
            let mut session = open_session(&resolve_run(&run, &prefs), AutoPlayConfig::default())?;
            let report = verify::verify(&mut session)?;
            verify::print(&mut out, &report)?;
            anyhow::ensure!(
                report.mismatches.is_empty(),
                "{} boundary mismatches",
                report.mismatches.len()
            );
        }
        Command::Prefs {
            speed,
            initial_delay,
            stepwise,
            run_dir,
        } => {
            let mut prefs = prefs;
            let changed = speed.is_some()
                || initial_delay.is_some()
                || stepwise.is_some()
                || run_dir.is_some();
            prefs.speed_ms = speed.unwrap_or(prefs.speed_ms);
            prefs.initial_delay_ms = initial_delay.unwrap_or(prefs.initial_delay_ms);
            prefs.stepwise = stepwise.unwrap_or(prefs.stepwise);
            if run_dir.is_some() {
                prefs.run_dir = run_dir;
            }
            if changed {
                config.save_prefs(&prefs).context("cannot save prefs")?;
            }
            report::prefs(&mut out, &prefs, &config.locate_stored::<PlaybackPrefs>())?;
        }
    }
    out.flush()?;
    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn open_store(dir: Option<&Path>) -> Result<FsConfigStore> {
    let store = match dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    };
    store.context("cannot open config store")
}

// A run argument that names an existing file, or looks like a path, is
// taken literally; anything else is a name inside the run directory.
fn resolve_run(run: &str, prefs: &PlaybackPrefs) -> PathBuf {
    let literal = Path::new(run);
    let looks_like_path = literal.exists()
        || literal.components().count() > 1
        || literal.extension().is_some_and(|e| e == RUN_EXTENSION);
    if looks_like_path {
        literal.to_path_buf()
    } else {
        run_path(&prefs.run_dir_or_cwd(), run)
    }
}

fn load(path: &Path) -> Result<RunFile> {
    RunFile::load(path).with_context(|| format!("cannot open run {}", path.display()))
}

fn open_session(path: &Path, cfg: AutoPlayConfig) -> Result<ReplaySession> {
    Ok(ReplaySession::new(load(path)?, cfg))
}
