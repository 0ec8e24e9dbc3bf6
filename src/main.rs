use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
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
use tracing::info;

use fleetwatch::config::ApplianceEntry;
use fleetwatch::credentials::PlainEncoding;
use fleetwatch::data::{Credentials, DeviceSet, ProviderCatalog};
use fleetwatch::{events, source, ui, App, Monitor, Settings, TerminalCharts};

#[derive(Parser, Debug)]
#[command(name = "fleetwatch")]
#[command(about = "Live status charts for a fleet of network appliances")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "fleetwatch.toml")]
    config: PathBuf,

    /// Poll interval in milliseconds (overrides charts.interval)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Samples kept per chart (overrides charts.datapoints)
    #[arg(short, long)]
    datapoints: Option<usize>,

    /// Start monitoring immediately
    #[arg(short, long)]
    start: bool,

    /// Use synthetic data instead of the status endpoint
    #[arg(long)]
    demo: bool,

    /// Log file ("-" disables logging)
    #[arg(long, default_value = "fleetwatch.log")]
    log_file: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_file)?;

    let mut settings = Settings::load(Some(args.config.as_path()))
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(interval) = args.interval {
        settings.charts.interval = interval;
    }
    if let Some(datapoints) = args.datapoints {
        settings.charts.datapoints = datapoints;
    }
    if args.start {
        settings.charts.start_on_load = true;
    }
    let demo = args.demo || settings.endpoint.url.is_none();
    if demo && settings.appliances.is_empty() {
        settings.appliances = demo_appliances();
    }
    settings.validate()?;

    // Fetches run on the runtime's worker threads; the UI loop stays on main
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let fetcher = source::from_settings(&settings.endpoint, demo)?;
    info!(source = fetcher.description(), "fleetwatch starting");

    let mut monitor = Monitor::new(
        settings.monitor_settings(),
        TerminalCharts::new(),
        Box::new(PlainEncoding),
        DeviceSet::new(settings.monitored_devices())?,
        settings.selection(),
    );
    monitor.init(Instant::now());

    let app = App::new(
        monitor,
        fetcher,
        rt.handle().clone(),
        ProviderCatalog::with_extra(&settings.providers),
        settings.all_devices(),
        ui::Theme::auto_detect(),
        ui::Palette::new(&settings.colors),
    );

    run_tui(app)
}

/// Send logs to a file; the terminal belongs to the UI.
fn init_logging(log_file: &str) -> Result<()> {
    if log_file == "-" {
        return Ok(());
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(Path::new(log_file))
        .with_context(|| format!("opening log file {}", log_file))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fleetwatch=info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Appliances charted by the synthetic source when none are configured.
fn demo_appliances() -> Vec<ApplianceEntry> {
    ["dp-east", "dp-west", "dp-lab"]
        .iter()
        .map(|hostname| ApplianceEntry {
            hostname: hostname.to_string(),
            credentials: Credentials::new("admin:admin"),
            monitored: true,
        })
        .collect()
}

/// Run the TUI until the user quits
fn run_tui(mut app: App) -> Result<()> {
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

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("fleetwatch exiting");
    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 16;
    const SIDEBAR_WIDTH: u16 = 36;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let top = (area.height / 2).saturating_sub(2);
                let centered = ratatui::layout::Rect::new(0, top, area.width, 5);
                frame.render_widget(paragraph, centered);
                return;
            }

            let rows = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Min(8),    // Lists and charts
                Constraint::Length(1), // Status bar
            ])
            .split(area);
            let columns =
                Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
                    .split(rows[1]);

            ui::common::render_header(frame, app, rows[0]);
            ui::panels::render(frame, app, columns[0]);
            ui::charts::render(frame, app, columns[1]);
            ui::common::render_status_bar(frame, app, rows[2]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout so ticks stay on time
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    // Lists start right below the header bar
                    if mouse.column < SIDEBAR_WIDTH {
                        events::handle_mouse_event(app, mouse, 1);
                    }
                }
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        app.tick(Instant::now());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_parse() {
        let args = Args::parse_from([
            "fleetwatch",
            "--interval",
            "2000",
            "--datapoints",
            "30",
            "--start",
            "--demo",
            "--log-file",
            "-",
        ]);
        assert_eq!(args.interval, Some(2000));
        assert_eq!(args.datapoints, Some(30));
        assert!(args.start && args.demo);
        assert_eq!(args.log_file, "-");
        assert_eq!(args.config, PathBuf::from("fleetwatch.toml"));
    }

    #[test]
    fn test_demo_appliances_are_unique() {
        let hosts: Vec<String> = demo_appliances().into_iter().map(|a| a.hostname).collect();
        let devices = DeviceSet::new(
            hosts.iter().map(|h| fleetwatch::data::Device::new(h.clone(), Credentials::new("x"))).collect(),
        );
        assert!(devices.is_ok());
    }
}
