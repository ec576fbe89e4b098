mod config;
mod events;
mod server;
mod simulation;
mod track;
mod tui;

use std::io;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use config::ServerConfig;
use events::ServerEvent;
use kartline::{ReadyMode, WinPolicy};
use server::RaceServer;
use tui::TuiState;

#[derive(Clone, Copy, ValueEnum)]
enum ReadyModeArg {
    OneShot,
    Toggle,
}

impl From<ReadyModeArg> for ReadyMode {
    fn from(value: ReadyModeArg) -> Self {
        match value {
            ReadyModeArg::OneShot => ReadyMode::OneShot,
            ReadyModeArg::Toggle => ReadyMode::Toggle,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum WinPolicyArg {
    EndSession,
    FinishParticipant,
}

impl From<WinPolicyArg> for WinPolicy {
    fn from(value: WinPolicyArg) -> Self {
        match value {
            WinPolicyArg::EndSession => WinPolicy::EndSession,
            WinPolicyArg::FinishParticipant => WinPolicy::FinishParticipant,
        }
    }
}

#[derive(Parser)]
#[command(name = "kartline-server")]
#[command(about = "Authoritative kart race host")]
struct Args {
    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(long, help = "TOML file with race settings")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Laps required to win")]
    laps: Option<u32>,

    #[arg(short, long, default_value_t = 3)]
    npcs: usize,

    #[arg(long, default_value_t = 12.0, help = "Base NPC speed in units per second")]
    npc_speed: f32,

    #[arg(long, value_enum)]
    ready_mode: Option<ReadyModeArg>,

    #[arg(long, value_enum)]
    win_policy: Option<WinPolicyArg>,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Allowed crossing headings, e.g. forward,right"
    )]
    gate_directions: Vec<String>,

    #[arg(long, help = "Do not seat a host player")]
    no_host: bool,

    #[arg(long, default_value_t = 3, help = "Seconds to keep running after the race ends")]
    linger_secs: u64,

    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut race = match &args.config {
        Some(path) => config::load_race_settings(path)?,
        None => Default::default(),
    };
    if let Some(laps) = args.laps {
        race.required_laps = laps;
    }
    if let Some(mode) = args.ready_mode {
        race.ready_mode = mode.into();
    }
    if let Some(policy) = args.win_policy {
        race.win_policy = policy.into();
    }

    let config = ServerConfig {
        tick_rate: args.tick_rate,
        race,
        npc_count: args.npcs,
        npc_speed: args.npc_speed,
        // Nobody can press ready without a terminal.
        host_player: !args.no_host && !args.headless,
        gate_directions: config::parse_directions(&args.gate_directions)?,
        linger_secs: args.linger_secs,
        ..Default::default()
    };

    let mut server = RaceServer::new(config).context("failed to seat the starting grid")?;

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        log::info!(
            "Race host started: {} laps, {} participants",
            server.session().required_laps(),
            server.session().participants().len()
        );
        run_headless(&mut server)?;
        log::info!("Race host shutting down");
    } else {
        run_with_tui(&mut server)?;
    }

    Ok(())
}

fn run_headless(server: &mut RaceServer) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;

    runtime.block_on(drive(server, async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => log::info!("Interrupted"),
            Err(e) => {
                log::warn!("Ctrl-C handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }));

    server.shutdown();
    for event in server.drain_events() {
        log_event(&event);
    }
    Ok(())
}

async fn drive(server: &mut RaceServer, shutdown: impl Future<Output = ()>) {
    let mut interval = tokio::time::interval(server.tick_duration());
    let running = server.running();
    tokio::pin!(shutdown);

    while running.load(Ordering::SeqCst) {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => break,
        }

        server.tick_once();
        for event in server.drain_events() {
            log_event(&event);
        }

        if server.should_exit() {
            break;
        }
    }
}

fn log_event(event: &ServerEvent) {
    if event.is_warning() {
        log::warn!("{}", event);
    } else {
        log::info!("{}", event);
    }
}

fn run_with_tui(server: &mut RaceServer) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let running = server.running();
    let mut tui_state = TuiState::new();

    tui_state.log_info(format!(
        "Race host started: {} laps to win",
        server.session().required_laps()
    ));

    while running.load(Ordering::SeqCst) {
        server.tick_once();

        for event in server.drain_events() {
            match event {
                ServerEvent::Warning { message } => tui_state.log_warn(message),
                event => tui_state.log_info(event.to_string()),
            }
        }

        if event::poll(Duration::from_millis(1))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            running.store(false, Ordering::SeqCst);
                        }
                        KeyCode::Char('r') => server.ready_host(),
                        KeyCode::Char('n') => server.reset_or_spawn_npc(),
                        KeyCode::Char('g') => server.restart_race(),
                        KeyCode::Char('x') => server.remove_newest_npc(),
                        KeyCode::Char('c') => server.cancel_countdown(),
                        KeyCode::Char('b') => server.toggle_npc_movement(),
                        KeyCode::PageUp => tui_state.scroll_up(),
                        KeyCode::PageDown => tui_state.scroll_down(),
                        KeyCode::End => tui_state.scroll_to_bottom(),
                        _ => {}
                    }
                }
            }
        }

        let stats = server.stats();
        terminal.draw(|frame| {
            tui::render(frame, &tui_state, &stats);
        })?;
    }

    server.shutdown();

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(())
}
