// Binary includes library modules - some public API items are only for library consumers
#![allow(unused)]

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use serde::Deserialize;

mod app;
mod data;
mod events;
mod source;
mod ui;

use app::{App, View};
use data::groups::group_rollups;
use data::order::{display_order, prefix_group};
use data::{DeviceStore, FleetSummary, LivenessPolicy};
use source::{EventSource, FileSource, StreamSource};

#[derive(Parser, Debug)]
#[command(name = "aquawatch")]
#[command(about = "Live TUI for monitoring water-quality sensor telemetry")]
struct Args {
    /// Path to an NDJSON telemetry log, one event per line
    #[arg(short, long, conflicts_with = "connect")]
    file: Option<PathBuf>,

    /// Connect to a TCP endpoint streaming telemetry (host:port)
    #[arg(short, long)]
    connect: Option<String>,

    /// Path to a TOML config file (AQUAWATCH_* environment variables override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// File poll interval in seconds (only used with --file)
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Silence before a device is marked Offline (e.g. "30s", "500ms")
    #[arg(long)]
    offline_after: Option<String>,

    /// How often liveness is reclassified (e.g. "5s")
    #[arg(long)]
    sweep_interval: Option<String>,

    /// Track at most this many devices, evicting the longest silent at the cap
    #[arg(long)]
    max_devices: Option<usize>,

    /// Export fleet state to a JSON file and exit
    #[arg(short, long, conflicts_with = "connect")]
    export: Option<PathBuf>,
}

/// Optional settings from a config file and AQUAWATCH_* environment
/// variables. Command line arguments take precedence over all of these.
#[derive(Debug, Default, Deserialize)]
struct Settings {
    /// TCP endpoint to stream telemetry from (host:port).
    endpoint: Option<String>,
    /// Silence threshold before a device is marked Offline (e.g. "30s").
    offline_after: Option<String>,
    /// How often liveness is reclassified (e.g. "5s").
    sweep_interval: Option<String>,
    /// Cap on tracked devices.
    max_devices: Option<usize>,
    /// File poll interval in seconds.
    refresh: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging();

    let settings = load_settings(args.config.as_deref())?;

    let policy = LivenessPolicy {
        offline_after: resolve_duration(
            args.offline_after.as_deref(),
            settings.offline_after.as_deref(),
            Duration::from_secs(30),
        )
        .context("Invalid offline-after duration")?,
        sweep_interval: resolve_duration(
            args.sweep_interval.as_deref(),
            settings.sweep_interval.as_deref(),
            Duration::from_secs(5),
        )
        .context("Invalid sweep interval")?,
    };
    policy.validate()?;

    let mut store = DeviceStore::new(policy);
    if let Some(cap) = args.max_devices.or(settings.max_devices) {
        store = store.with_max_devices(cap);
    }

    let refresh = Duration::from_secs(args.refresh.or(settings.refresh).unwrap_or(1));
    let telemetry_file = args.file.clone().unwrap_or_else(|| PathBuf::from("telemetry.ndjson"));

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        return export_to_file(&telemetry_file, export_path, store);
    }

    // Handle TCP connection mode
    if let Some(ref addr) = args.connect {
        return run_with_tcp(addr, store);
    }

    // An endpoint from the config file also selects streaming, unless a
    // file was given explicitly on the command line
    if let (None, Some(addr)) = (&args.file, &settings.endpoint) {
        return run_with_tcp(addr, store);
    }

    // Default: file-based mode
    run_with_file(&telemetry_file, store, refresh)
}

/// Route tracing output to a file when AQUAWATCH_LOG is set.
///
/// The TUI owns the terminal, so logs never go to stdout. With the
/// variable unset, tracing events are simply dropped.
fn init_logging() {
    let Ok(path) = std::env::var("AQUAWATCH_LOG") else {
        return;
    };
    if path.trim().is_empty() {
        return;
    }
    let Ok(file) = std::fs::File::create(&path) else {
        eprintln!("Could not open log file: {}", path);
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Load settings from a config file and the environment.
///
/// With no explicit path, an `aquawatch.toml` in the working directory is
/// picked up if present.
fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    let builder = match config_path {
        Some(path) => Config::builder().add_source(File::from(path)),
        None => Config::builder().add_source(File::with_name("aquawatch").required(false)),
    };
    let config = builder
        .add_source(Environment::with_prefix("AQUAWATCH"))
        .build()
        .context("Could not load configuration")?;
    Ok(config.try_deserialize()?)
}

fn resolve_duration(cli: Option<&str>, file: Option<&str>, default: Duration) -> Result<Duration> {
    match cli.or(file) {
        Some(text) => data::duration::parse_duration(text),
        None => Ok(default),
    }
}

/// Run with a file-based event source
fn run_with_file(path: &PathBuf, store: DeviceStore, refresh: Duration) -> Result<()> {
    let source = Box::new(FileSource::new(path));
    run_tui(source, store, refresh)
}

/// Run with a TCP stream event source
fn run_with_tcp(addr: &str, store: DeviceStore) -> Result<()> {
    // Build a tokio runtime for the TCP connection
    let rt = tokio::runtime::Runtime::new()?;

    let source = rt.block_on(async {
        use tokio::net::TcpStream;

        println!("Connecting to {}...", addr);
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                println!("Connected!");
                Ok(Box::new(StreamSource::spawn(stream, addr)) as Box<dyn EventSource>)
            }
            Err(e) => Err(anyhow::anyhow!("Failed to connect to {}: {}", addr, e)),
        }
    })?;

    // The reader task keeps running on the runtime while the TUI loop
    // polls the channel; poll continuously rather than on a file cadence
    run_tui(source, store, Duration::from_millis(100))
}

/// Run the TUI with the given event source
fn run_tui(source: Box<dyn EventSource>, store: DeviceStore, refresh_interval: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    // Create app and apply whatever telemetry is already waiting
    let mut app = App::new(source, store);
    app.pump_source();

    // Run the main loop
    let result = run_app(&mut terminal, &mut app, refresh_interval);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();
    let mut last_sweep = Instant::now();

    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        // Draw UI
        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let y = (area.height / 2).saturating_sub(2);
                let centered = ratatui::layout::Rect::new(0, y, area.width, 5).intersection(area);
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            // Render header with fleet summary
            ui::common::render_header(frame, app, chunks[0]);

            // Render tabs
            ui::common::render_tabs(frame, app, chunks[1]);

            // Render current view
            match app.current_view {
                View::Devices => ui::devices::render(frame, app, chunks[2]),
                View::Offline => ui::offline::render(frame, app, chunks[2]),
                View::Groups => ui::groups::render(frame, app, chunks[2]),
            }

            // Render status bar
            ui::common::render_status_bar(frame, app, chunks[3]);

            // Render detail overlay if active
            if app.show_detail_overlay {
                ui::detail::render_overlay(frame, app, area);
            }

            // Render help overlay if active
            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    // Content starts after header (1) + tabs (1) + table header (1)
                    events::handle_mouse_event(app, mouse, 3);
                }
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        // Apply pending telemetry on the refresh cadence
        if last_refresh.elapsed() >= refresh_interval {
            app.pump_source();
            last_refresh = Instant::now();
        }

        // Reclassify liveness on the sweep cadence
        if last_sweep.elapsed() >= app.sweep_interval() {
            app.run_sweep();
            last_sweep = Instant::now();
        }
    }

    Ok(())
}

/// Replay a telemetry log into a fresh store and write the fleet state as JSON
fn export_to_file(
    telemetry_path: &Path,
    export_path: &Path,
    mut store: DeviceStore,
) -> Result<()> {
    use std::io::Write;

    let mut source = FileSource::new(telemetry_path);
    let mut applied = 0usize;
    while let Some(event) = source.poll() {
        store.apply(event, Instant::now());
        applied += 1;
    }
    if applied == 0 {
        if let Some(err) = source.error() {
            anyhow::bail!("Could not read {}: {}", telemetry_path.display(), err);
        }
        anyhow::bail!("No telemetry events in {}", telemetry_path.display());
    }

    let now = Instant::now();
    store.sweep(now);
    let summary = FleetSummary::of(&store);

    // Build export structure
    let mut export = serde_json::Map::new();
    export.insert(
        "summary".to_string(),
        serde_json::json!({
            "total": summary.total,
            "online": summary.online,
            "offline": summary.offline,
        }),
    );

    // Devices in display order, with the full retained history
    let devices: Vec<serde_json::Value> = display_order(store.devices().keys().cloned())
        .into_iter()
        .filter_map(|id| {
            let state = store.get(&id)?;
            Some(serde_json::json!({
                "address": id,
                "name": state.display_name,
                "group": prefix_group(&id),
                "liveness": state.liveness.label(),
                "first_seen": state.first_seen.to_rfc3339(),
                "events_seen": state.events_seen,
                "silent_for_secs": state.silence(now).as_secs_f64(),
                "history": state.history.iter().map(|entry| serde_json::json!({
                    "observed_at": entry.observed_at.to_rfc3339(),
                    "sample": entry.sample,
                })).collect::<Vec<_>>(),
            }))
        })
        .collect();
    export.insert("devices".to_string(), serde_json::Value::Array(devices));

    let groups: Vec<serde_json::Value> = group_rollups(&store, now)
        .into_iter()
        .map(|rollup| {
            serde_json::json!({
                "group": rollup.group,
                "devices": rollup.devices,
                "online": rollup.online,
                "offline": rollup.offline,
                "freshest_silence_secs": rollup.freshest_silence.as_secs_f64(),
                "events_seen": rollup.events_seen,
            })
        })
        .collect();
    export.insert("groups".to_string(), serde_json::Value::Array(groups));

    // Write to file
    let json = serde_json::to_string_pretty(&serde_json::Value::Object(export))?;
    let mut file = std::fs::File::create(export_path)?;
    file.write_all(json.as_bytes())?;

    println!("Exported {} devices to: {}", summary.total, export_path.display());
    Ok(())
}
