//! kilnctl: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimulatedKiln      LogEventSink   JsonConfigFile  SystemClock │
//! │  (Temp+Heater)      RunHistory     JsonProfileFile (ClockPort) │
//! │                     (EventSink)    (Config/Profile)            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              KilnService (pure logic)                  │    │
//! │  │  FSM · Safety · Scheduler · PID                        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ControlLink (mailbox + status) ◀── console on stdin           │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use tracing_subscriber::filter::LevelFilter;

use kilnctl::adapters::config_file::JsonConfigFile;
use kilnctl::adapters::log_sink::LogEventSink;
use kilnctl::adapters::profile_file::JsonProfileFile;
use kilnctl::adapters::simulated::SimulatedKiln;
use kilnctl::adapters::time::SystemClock;
use kilnctl::app::commands::OvenCommand;
use kilnctl::app::events::StatusSnapshot;
use kilnctl::app::history::RunHistory;
use kilnctl::app::link::ControlLink;
use kilnctl::app::ports::{ConfigError, ConfigPort, ProfileSource};
use kilnctl::app::runner::run_control_loop;
use kilnctl::app::service::KilnService;
use kilnctl::config::{KilnConfig, LogLevel, TempScale};
use kilnctl::error::Error;

static LINK: ControlLink = ControlLink::new();
static STOP: AtomicBool = AtomicBool::new(false);

/// Closed-loop kiln firing controller.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON configuration file. Defaults apply when it does not exist.
    #[arg(long, default_value = "kiln.json")]
    config: PathBuf,

    /// Directory holding JSON firing profiles.
    #[arg(long, default_value = "profiles")]
    profiles: PathBuf,

    /// Start this profile (name or file path) immediately.
    #[arg(long)]
    profile: Option<String>,

    /// Begin the profile this many minutes in.
    #[arg(long, default_value_t = 0.0)]
    start_at_minute: f32,

    /// Run against the thermal simulator regardless of the config file.
    #[arg(long)]
    simulate: bool,
}

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}

/// The config, or defaults plus `true` when the file does not exist.
fn load_config(path: PathBuf) -> Result<(KilnConfig, bool)> {
    let file = JsonConfigFile::new(path);
    match file.load() {
        Ok(cfg) => Ok((cfg, false)),
        Err(ConfigError::NotFound) => Ok((KilnConfig::default(), true)),
        Err(e) => Err(Error::from(e))
            .with_context(|| format!("loading {}", file.path().display())),
    }
}

fn start_command(
    profiles: &JsonProfileFile,
    name: &str,
    start_at_minute: f32,
) -> Result<OvenCommand> {
    let profile = profiles
        .load_profile(name)
        .map_err(Error::from)
        .with_context(|| format!("profile '{name}'"))?;
    Ok(OvenCommand::Start {
        profile,
        start_at_secs: start_at_minute * 60.0,
    })
}

fn print_status(s: &StatusSnapshot, scale: TempScale, currency: &str) {
    let temp = s
        .celsius()
        .map_or_else(|| "--".to_string(), |c| format!("{:.1}", scale.in_scale(c)));
    println!(
        "{:?}: {}{} (target {:.1}) duty {:.0}% | {:.0}/{:.0}s{} | {}{:.2}{}",
        s.run_state,
        temp,
        scale.symbol(),
        scale.in_scale(s.target),
        s.duty * 100.0,
        s.profile_time,
        s.profile_duration,
        if s.catching_up { " catching up" } else { "" },
        currency,
        s.cost,
        s.abort_reason
            .map(|r| format!(" | aborted: {r}"))
            .unwrap_or_default(),
    );
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    // ── 1. Configuration ──────────────────────────────────────
    let (mut config, config_missing) = load_config(args.config.clone())?;
    if args.simulate {
        config.simulated = true;
    }

    // ── 2. Logging ────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_max_level(level_filter(config.log_level))
        .with_target(false)
        .init();

    info!("kilnctl v{}", env!("CARGO_PKG_VERSION"));
    if config_missing {
        warn!("{} not found, running with defaults", args.config.display());
    }

    if !config.simulated {
        bail!("no thermocouple backend is built into this binary; run with --simulate");
    }

    // ── 3. Adapters + service ─────────────────────────────────
    let profiles = JsonProfileFile::new(&args.profiles, config.temp_scale);
    let mut service = KilnService::new(config.clone()).context("invalid configuration")?;
    let mut kiln = SimulatedKiln::new(config.simulate.clone(), SystemClock::new());
    let clock = SystemClock::scaled(config.simulate.speed);

    if let Some(name) = args.profile.as_deref() {
        LINK.send(start_command(&profiles, name, args.start_at_minute)?)?;
    }

    // ── 4. Control thread ─────────────────────────────────────
    let sink_config = config.clone();
    let control = std::thread::Builder::new()
        .name("control".into())
        .spawn(move || {
            let mut history = Box::new(RunHistory::new());
            let mut sink = (LogEventSink::new(&sink_config), &mut *history);
            run_control_loop(&mut service, &mut kiln, &LINK, &clock, &mut sink, &STOP);
            history.subset(12)
        })
        .context("spawning control thread")?;

    // ── 5. Console ────────────────────────────────────────────
    info!("Commands: start <profile> [minute] | pause | resume | abort | reset | status | quit");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let mut words = line.split_whitespace();
        let cmd = match words.next() {
            None => continue,
            Some("start") => {
                let Some(name) = words.next() else {
                    warn!("usage: start <profile> [minute]");
                    continue;
                };
                let minute = match words.next().map(str::parse::<f32>) {
                    None => 0.0,
                    Some(Ok(m)) => m,
                    Some(Err(_)) => {
                        warn!("start minute must be a number");
                        continue;
                    }
                };
                match start_command(&profiles, name, minute) {
                    Ok(cmd) => cmd,
                    Err(e) => {
                        warn!("{e:#}");
                        continue;
                    }
                }
            }
            Some("pause") => OvenCommand::Pause,
            Some("resume") => OvenCommand::Resume,
            Some("abort") => OvenCommand::Abort,
            Some("reset") => OvenCommand::Reset,
            Some("status") => {
                print_status(&LINK.status(), config.temp_scale, &config.currency_type);
                continue;
            }
            Some("quit" | "exit") => break,
            Some(other) => {
                warn!("unknown command '{other}'");
                continue;
            }
        };
        if let Err(e) = LINK.send(cmd) {
            warn!("{e}");
        }
    }

    // ── 6. Shutdown ───────────────────────────────────────────
    STOP.store(true, Ordering::Relaxed);
    let curve = control
        .join()
        .map_err(|_| anyhow::anyhow!("control thread panicked"))?;
    if !curve.is_empty() {
        println!("Last run:");
        for s in &curve {
            print_status(s, config.temp_scale, &config.currency_type);
        }
    }
    info!("Bye");
    Ok(())
}
