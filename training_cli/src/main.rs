mod render;

use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use training_core::controller::{SessionController, ViewState};
use training_core::protocol::load_protocol_file;
use training_core::runner::BlockRunner;
use training_core::section::SectionIndex;
use training_core::sink::{AudioCue, SilentCue, TerminalBell};
use training_core::*;

#[derive(Parser)]
#[command(name = "train")]
#[command(about = "Workout session runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Args, Clone, Default)]
struct ProtocolArgs {
    /// Protocol day, e.g. "monday" or "push" (defaults to today)
    #[arg(long, conflicts_with = "file")]
    day: Option<String>,

    /// Load a protocol file directly
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workout session (default)
    Run {
        #[command(flatten)]
        protocol: ProtocolArgs,

        /// Auto-complete (for testing) - finish every block without input
        #[arg(long, conflicts_with = "auto_skip")]
        auto: bool,

        /// Auto-skip (for testing) - skip every block without input
        #[arg(long, conflicts_with = "auto")]
        auto_skip: bool,
    },

    /// Show the sections of a protocol
    Sections {
        #[command(flatten)]
        protocol: ProtocolArgs,
    },

    /// List available protocol days
    Days,

    /// Show recent completion records
    History {
        /// How many days back to look
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// Roll up the completion log to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

/// Files under the data directory
struct DataPaths {
    wal_dir: PathBuf,
    wal: PathBuf,
    csv: PathBuf,
    log: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &Path) -> Self {
        let wal_dir = data_dir.join("wal");
        Self {
            wal: wal_dir.join("xp_log.wal"),
            wal_dir,
            csv: data_dir.join("history.csv"),
            log: data_dir.join("logs").join("train.log"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = cli.data_dir {
        config.data.data_dir = dir;
    }
    let paths = DataPaths::new(&config.data.data_dir);

    let command = cli.command.unwrap_or(Commands::Run {
        protocol: ProtocolArgs::default(),
        auto: false,
        auto_skip: false,
    });

    // Interactive sessions own the terminal, so logs go to a file
    match &command {
        Commands::Run {
            auto: false,
            auto_skip: false,
            ..
        } => training_core::logging::init_to_file(&paths.log, "info"),
        _ => training_core::logging::init(),
    }

    match command {
        Commands::Run {
            protocol,
            auto,
            auto_skip,
        } => cmd_run(&config, &paths, &protocol, auto, auto_skip),
        Commands::Sections { protocol } => cmd_sections(&config, &protocol),
        Commands::Days => cmd_days(&config),
        Commands::History { days } => cmd_history(&paths, days),
        Commands::Rollup { cleanup } => cmd_rollup(&paths, cleanup),
    }
}

fn load_blocks(config: &Config, protocol: &ProtocolArgs) -> Result<Vec<Block>> {
    let blocks = match &protocol.file {
        Some(path) => load_protocol_file(path)?,
        None => DirectoryProtocolSource::new(config.protocol_dir())
            .load_protocol(protocol.day.as_deref())?,
    };

    let warnings = validate_blocks(&blocks);
    if !warnings.is_empty() {
        eprintln!("Protocol warnings:");
        for warning in warnings {
            eprintln!("  - {}", warning);
        }
    }

    Ok(blocks)
}

fn cmd_run(
    config: &Config,
    paths: &DataPaths,
    protocol: &ProtocolArgs,
    auto: bool,
    auto_skip: bool,
) -> Result<()> {
    let blocks = load_blocks(config, protocol)?;
    if blocks.is_empty() {
        println!("No workout scheduled. Nothing to do today.");
        return Ok(());
    }

    // History only powers drill-downs; losing it is not fatal
    let history = match load_recent_records(&paths.wal, &paths.csv, 90) {
        Ok(records) => HistoryIndex::from_records(records),
        Err(e) => {
            tracing::warn!("History unavailable: {}", e);
            HistoryIndex::default()
        }
    };
    if history.is_empty() {
        tracing::debug!("No recent history for drill-downs");
    }

    let cue: Box<dyn AudioCue> = if auto || auto_skip {
        Box::new(SilentCue)
    } else {
        Box::new(TerminalBell)
    };

    let sink = BackgroundSink::spawn(JsonlSink::new(&paths.wal));
    let mut session = SessionController::new(blocks, config, sink)
        .with_cue(cue)
        .with_catalog(default_catalog().clone())
        .with_history(history);

    if auto || auto_skip {
        drive_auto(&mut session, auto_skip)?;
    } else {
        drive_interactive(&mut session)?;
    }

    let finished = session.state() == ViewState::AllComplete;
    let xp = session.xp_awarded();
    render::notices(&mut session);
    let report = session.into_sink().finish();
    for failure in &report.failures {
        eprintln!(
            "  ! Could not save {} XP for {}: {}",
            failure.xp, failure.label, failure.reason
        );
    }

    println!();
    if finished {
        println!("✓ Session complete!");
    } else {
        println!("Session ended early.");
    }
    println!("  Total XP: {}", xp);
    tracing::info!(
        "Session over: {} XP, {} record(s) written, {} lost",
        xp,
        report.written,
        report.failures.len()
    );

    Ok(())
}

/// Drive the session without input: sections in hub order, every block
/// completed (or skipped), timers ticked as fast as possible.
fn drive_auto<S: CompletionSink>(session: &mut SessionController<S>, skip: bool) -> Result<()> {
    loop {
        render::notices(session);
        match session.state() {
            ViewState::Empty | ViewState::AllComplete => return Ok(()),
            ViewState::Hub => {
                let next = session
                    .section_summaries()
                    .into_iter()
                    .find(|s| !s.done)
                    .map(|s| s.name);
                match next {
                    Some(name) => session.select_section(&name)?,
                    None => return Ok(()),
                }
            }
            ViewState::Running(index) => {
                let name = session.blocks()[index].name.clone();
                let before = session.xp_awarded();
                if skip {
                    session.skip_block()?;
                    println!("  – {} skipped", name);
                } else {
                    auto_complete_block(session, index)?;
                    println!("  ✓ {} (+{} XP)", name, session.xp_awarded() - before);
                }
            }
        }
    }
}

fn auto_complete_block<S: CompletionSink>(
    session: &mut SessionController<S>,
    index: usize,
) -> Result<()> {
    let pending: Vec<(usize, usize)> = match session.runner() {
        Some(BlockRunner::Exercise(r)) => (0..r.sets())
            .filter(|set| !r.is_set_done(*set))
            .map(|set| (set, 0))
            .collect(),
        Some(BlockRunner::Superset(r)) => (0..r.rounds())
            .flat_map(|round| (0..r.spec().exercises.len()).map(move |e| (e, round)))
            .filter(|(e, round)| !r.is_done(*e, *round))
            .collect(),
        _ => Vec::new(),
    };

    match session.runner().map(BlockRunner::type_name) {
        Some("exercise") => {
            for (set, _) in pending {
                session.toggle_set(set)?;
            }
            session.complete_block()
        }
        Some("superset") => {
            for (exercise, round) in pending {
                session.toggle_cell(exercise, round)?;
            }
            session.complete_block()
        }
        Some("timed") => {
            while session.state() == ViewState::Running(index) {
                let on_card = matches!(
                    session.runner(),
                    Some(BlockRunner::Timed(r))
                        if r.current_interval().is_some_and(|i| i.kind == IntervalKind::Card)
                );
                if on_card {
                    session.advance_interval()?;
                } else {
                    session.tick();
                }
            }
            Ok(())
        }
        _ => session.complete_block(),
    }
}

/// Interactive loop: stdin lines arrive from a reader thread, and the
/// session ticks once per second between them.
fn drive_interactive<S: CompletionSink>(session: &mut SessionController<S>) -> Result<()> {
    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    render::view(session);
    let tick = Duration::from_secs(1);
    let mut next_tick = Instant::now() + tick;

    loop {
        match session.state() {
            ViewState::Empty | ViewState::AllComplete => return Ok(()),
            ViewState::Hub | ViewState::Running(_) => {}
        }

        let timeout = next_tick.saturating_duration_since(Instant::now());
        match rx.recv_timeout(timeout) {
            Ok(line) => {
                let before = session.state();
                match handle_line(session, line.trim()) {
                    Ok(Flow::Quit) => return Ok(()),
                    Ok(Flow::Continue) => {}
                    Err(e @ (Error::InvalidIntent(_) | Error::UnknownSection(_))) => {
                        session.note_rejection(&e)
                    }
                    Err(e) => return Err(e),
                }
                render::notices(session);
                if session.state() != before || line.trim().is_empty() {
                    render::view(session);
                } else {
                    render::timer_status(session);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                next_tick += tick;
                let before = session.state();
                session.tick();
                render::notices(session);
                if session.state() != before {
                    println!();
                    render::view(session);
                } else {
                    render::timer_status(session);
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracing::info!("Input closed; ending session");
                return Ok(());
            }
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

fn handle_line<S: CompletionSink>(session: &mut SessionController<S>, line: &str) -> Result<Flow> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("").to_lowercase();
    let args: Vec<&str> = parts.collect();

    if command == "q" || command == "quit" {
        return Ok(Flow::Quit);
    }

    if session.state() == ViewState::Hub {
        if command.is_empty() {
            return Ok(Flow::Continue);
        }
        let name = match line.parse::<usize>() {
            Ok(n) => session
                .section_summaries()
                .get(n.wrapping_sub(1))
                .map(|s| s.name.clone())
                .unwrap_or_else(|| line.to_string()),
            Err(_) => line.to_string(),
        };
        session.select_section(&name)?;
        return Ok(Flow::Continue);
    }

    match command.as_str() {
        "" | "?" | "h" | "help" => {}
        "d" | "done" => session.complete_block()?,
        "s" | "skip" => session.skip_block()?,
        "n" | "next" | "c" => session.advance_interval()?,
        "b" | "back" | "hub" => session.back_to_hub()?,
        "p" | "pause" => session.pause()?,
        "r" | "resume" => session.resume()?,
        "rs" | "restart" => session.restart_timer()?,
        "x" | "rest" => session.skip_rest()?,
        "t" | "toggle" => match (index_arg(&args, 0)?, args.get(1)) {
            (exercise, Some(_)) => session.toggle_cell(exercise, index_arg(&args, 1)?)?,
            (n, None) => {
                if matches!(session.runner(), Some(BlockRunner::Checklist(_))) {
                    session.toggle_item(n)?
                } else {
                    session.toggle_set(n)?
                }
            }
        },
        "w" | "weight" => match args.len() {
            2 => session.set_weight(index_arg(&args, 0)?, args[1])?,
            3 => session.set_cell_weight(index_arg(&args, 0)?, index_arg(&args, 1)?, args[2])?,
            _ => return Err(Error::InvalidIntent("usage: w N KG or w E R KG".into())),
        },
        other => {
            return Err(Error::InvalidIntent(format!(
                "unknown command '{}' (press Enter for help)",
                other
            )))
        }
    }

    Ok(Flow::Continue)
}

/// 1-based index argument, returned 0-based
fn index_arg(args: &[&str], position: usize) -> Result<usize> {
    args.get(position)
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .map(|n| n - 1)
        .ok_or_else(|| Error::InvalidIntent(format!("expected a number at argument {}", position + 1)))
}

fn cmd_sections(config: &Config, protocol: &ProtocolArgs) -> Result<()> {
    let blocks = load_blocks(config, protocol)?;
    if blocks.is_empty() {
        println!("No workout scheduled.");
        return Ok(());
    }

    let index = SectionIndex::build(&blocks);
    for (n, section) in index.sections().iter().enumerate() {
        println!("{}. {} ({} blocks)", n + 1, section.name, section.members.len());
        for member in &section.members {
            let block = &blocks[*member];
            println!("     {} [{}]", block.name, block.type_name());
        }
    }

    Ok(())
}

fn cmd_days(config: &Config) -> Result<()> {
    let source = DirectoryProtocolSource::new(config.protocol_dir());
    let days = source.list_days()?;

    if days.is_empty() {
        println!("No protocols found in {}", source.dir().display());
        return Ok(());
    }

    for day in days {
        println!("{}", day);
    }
    Ok(())
}

fn cmd_history(paths: &DataPaths, days: i64) -> Result<()> {
    let records = load_recent_records(&paths.wal, &paths.csv, days)?;

    if records.is_empty() {
        println!("No records in the last {} days.", days);
        return Ok(());
    }

    for record in &records {
        println!(
            "{}  {:<24} {:>4} XP  {:<9}  {}",
            record.recorded_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
            record.label,
            record.xp,
            record.category,
            record.details
        );
    }

    let total: u32 = records.iter().map(|r| r.xp).sum();
    println!();
    println!("Total: {} XP over {} record(s)", total, records.len());
    Ok(())
}

fn cmd_rollup(paths: &DataPaths, cleanup: bool) -> Result<()> {
    if !paths.wal.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = training_core::csv_rollup::rollup_to_csv(&paths.wal, &paths.csv)?;

    println!("✓ Rolled up {} records to CSV", count);
    println!("  CSV: {}", paths.csv.display());

    if cleanup {
        let cleaned = training_core::csv_rollup::cleanup_processed_logs(&paths.wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}
