//! Standing Desk Tracker CLI
//!
//! Record standing and sitting sessions and report totals.

use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use standing_desk_tracker::{
    config::Config,
    format_duration,
    session::{state_label, DeskState, SessionError, SessionStore},
    stats::{period_stats, sessions_for_period, summarize, Period},
    FileStore, StatusSnapshot, VERSION,
};
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "desk")]
#[command(version = VERSION)]
#[command(about = "Track standing and sitting time at a standing desk", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current state and today's totals
    Status,

    /// Start standing (ends the current session if any)
    Stand,

    /// Start sitting (ends the current session if any)
    Sit,

    /// Switch to the opposite state
    Switch,

    /// End the current session and stop tracking
    Stop,

    /// Show totals for a period
    Stats {
        /// Period to report
        #[arg(long, short, value_enum, default_value_t = Period::Day)]
        period: Period,
    },

    /// List recorded sessions
    Log {
        /// Number of most recent sessions to show
        #[arg(long, short, default_value = "20")]
        limit: usize,
    },

    /// Keep printing the current status until Ctrl+C
    Watch {
        /// Refresh interval in seconds (defaults to the configured interval)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Show or update configuration
    Config {
        /// IANA time zone used for day and month boundaries
        #[arg(long)]
        timezone: Option<String>,

        /// Refresh interval for `watch`, in seconds
        #[arg(long)]
        refresh_interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    let config = Config::load().context("could not load configuration")?;
    let tz = config.tz()?;
    debug!(data_path = %config.data_path.display(), timezone = %tz, "loaded configuration");
    let store = SessionStore::new(FileStore::new(&config.data_path));

    match command {
        Commands::Status => cmd_status(&store, tz).await,
        Commands::Stand => cmd_start(&store, DeskState::Standing).await,
        Commands::Sit => cmd_start(&store, DeskState::Sitting).await,
        Commands::Switch => cmd_switch(&store).await,
        Commands::Stop => cmd_stop(&store).await,
        Commands::Stats { period } => cmd_stats(&store, period, tz).await,
        Commands::Log { limit } => cmd_log(&store, limit, tz).await,
        Commands::Watch { interval } => {
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or(config.refresh_interval);
            cmd_watch(&store, interval, tz).await
        }
        Commands::Config {
            timezone,
            refresh_interval,
        } => cmd_config(config, timezone, refresh_interval),
    }
}

async fn cmd_status(store: &SessionStore<FileStore>, tz: Tz) -> Result<()> {
    let snapshot = StatusSnapshot::capture(store, Utc::now(), tz).await?;

    println!("Standing Desk Tracker");
    println!("=====================");
    println!();
    println!("{}", snapshot.report());
    Ok(())
}

async fn cmd_start(store: &SessionStore<FileStore>, state: DeskState) -> Result<()> {
    let toggle = match store.toggle(state, Utc::now()).await {
        Ok(toggle) => toggle,
        Err(SessionError::AlreadyTracking(state)) => {
            println!("Already {state}. Run `desk switch` or `desk stop` to change.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(closed) = toggle.closed {
        println!(
            "Ended {} after {}",
            closed.state,
            format_duration(closed.duration_secs(toggle.started.start_time))
        );
    }
    println!("Started {}", toggle.started.state);
    Ok(())
}

async fn cmd_switch(store: &SessionStore<FileStore>) -> Result<()> {
    match store.switch(Utc::now()).await {
        Ok(toggle) => {
            println!("Switched to {}", toggle.started.state);
            Ok(())
        }
        Err(SessionError::NotTracking) => {
            println!("Not tracking. Run `desk stand` or `desk sit` to start.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn cmd_stop(store: &SessionStore<FileStore>) -> Result<()> {
    match store.end_current_session(None).await? {
        Some(closed) => println!(
            "Stopped tracking. {} for {}",
            closed.state,
            format_duration(closed.duration_secs(Utc::now()))
        ),
        None => println!("Not tracking; nothing to stop."),
    }
    Ok(())
}

async fn cmd_stats(store: &SessionStore<FileStore>, period: Period, tz: Tz) -> Result<()> {
    let now = Utc::now();
    let sessions = store.sessions().await?;
    let stats = period_stats(&sessions, period, now, tz);
    let clipped = sessions_for_period(&sessions, period, now, tz);

    println!("{} ({})", period.heading(), tz);
    println!(
        "Since {}",
        stats.window_start.with_timezone(&tz).format("%Y-%m-%d %H:%M")
    );
    println!();
    println!("  Standing: {}", format_duration(stats.stats.total_standing));
    println!("  Sitting:  {}", format_duration(stats.stats.total_sitting));
    println!("  Total:    {}", format_duration(stats.total()));
    if let Some(ratio) = stats.standing_ratio() {
        println!("  Standing share: {:.0}%", ratio * 100.0);
    }
    println!();

    for state in [DeskState::Standing, DeskState::Sitting] {
        let summary = summarize(&clipped, state, now);
        if summary.count == 0 {
            continue;
        }
        println!(
            "{} sessions: {} | average {} | longest {}",
            state,
            summary.count,
            format_duration(summary.mean_secs.round() as u64),
            format_duration(summary.longest_secs)
        );
    }
    Ok(())
}

async fn cmd_log(store: &SessionStore<FileStore>, limit: usize, tz: Tz) -> Result<()> {
    let now = Utc::now();
    let sessions = store.sessions().await?;

    if sessions.is_empty() {
        println!("No sessions recorded yet.");
        println!("Run `desk stand` or `desk sit` to begin tracking.");
        return Ok(());
    }

    let skip = sessions.len().saturating_sub(limit);
    for session in &sessions[skip..] {
        let start = session.start_time.with_timezone(&tz);
        let end = match session.end_time {
            Some(end) => end.with_timezone(&tz).format("%H:%M").to_string(),
            None => "now".to_string(),
        };
        println!(
            "{}  {} - {:>5}  {} {:<8} {}",
            start.format("%Y-%m-%d"),
            start.format("%H:%M"),
            end,
            session.state.symbol(),
            session.state.label(),
            format_duration(session.duration_secs(now))
        );
    }
    Ok(())
}

async fn cmd_watch(store: &SessionStore<FileStore>, interval: Duration, tz: Tz) -> Result<()> {
    let interval = interval.max(Duration::from_secs(1));
    println!("Refreshing every {}s. Press Ctrl+C to stop", interval.as_secs());
    println!();

    let mut ticker = tokio::time::interval(interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {
                let now = Utc::now();
                match StatusSnapshot::capture(store, now, tz).await {
                    Ok(snapshot) => println!(
                        "[{}] {} | today: standing {}, sitting {}",
                        now.with_timezone(&tz).format("%H:%M:%S"),
                        snapshot.title(),
                        format_duration(snapshot.today.stats.total_standing),
                        format_duration(snapshot.today.stats.total_sitting),
                    ),
                    // Keep watching; the next tick retries the read.
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
        }
    }

    println!();
    let state = store.current_state().await?;
    println!("Stopped watching. Current state: {}", state_label(state));
    Ok(())
}

fn cmd_config(
    mut config: Config,
    timezone: Option<String>,
    refresh_interval: Option<u64>,
) -> Result<()> {
    let changed = timezone.is_some() || refresh_interval.is_some();
    if let Some(name) = timezone {
        config.set_timezone(&name)?;
    }
    if let Some(secs) = refresh_interval {
        config.refresh_interval = Duration::from_secs(secs.max(1));
    }
    if changed {
        config.save().context("could not save configuration")?;
        println!("Configuration saved.");
        println!();
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
