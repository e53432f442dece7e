use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use aptmart::app::{App, InputMode, PromptKind, Screen, StatusLevel};
use aptmart::config::{self, Overrides};
use aptmart::infrastructure::runtime::{RuntimeBridge, RuntimeCommand};
use aptmart::{logging, ui};

#[derive(Debug, Parser)]
#[command(
    name = "aptmart",
    version,
    about = "Aptmart: a terminal NFT marketplace for Aptos"
)]
struct Args {
    /// Config file (default: $XDG_CONFIG_HOME/aptmart/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fullnode REST endpoint (e.g. https://fullnode.testnet.aptoslabs.com/v1)
    #[arg(long)]
    node: Option<String>,

    /// Address the marketplace module is published under
    #[arg(long)]
    marketplace: Option<String>,

    /// Marketplace module name
    #[arg(long)]
    module: Option<String>,

    /// Connected account address (enables My Collection)
    #[arg(long)]
    account: Option<String>,

    /// Wallet signer endpoint
    #[arg(long)]
    wallet: Option<String>,

    /// Log file (default: <data dir>/aptmart.log)
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_path = logging::init(args.log.clone()).unwrap_or_else(|err| {
        eprintln!("logging disabled: {err:#}");
        None
    });

    let (file_config, warning) = config::load(args.config.as_deref());
    let market_config = file_config
        .apply(Overrides {
            node_url: args.node,
            marketplace_address: args.marketplace,
            module_name: args.module,
            account: args.account,
            wallet_url: args.wallet,
        })
        .resolve()?;
    tracing::info!(
        node = %market_config.node_url,
        marketplace = %market_config.marketplace,
        module = %market_config.module,
        log = ?log_path,
        "starting aptmart"
    );

    let runtime = RuntimeBridge::new(market_config.clone())?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(market_config);
    match warning {
        Some(warning) => app.set_status(warning, StatusLevel::Warn),
        None => app.set_status("Loading marketplace…", StatusLevel::Info),
    }

    let res = run_app(&mut terminal, app, runtime);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("{:#}", err);
        eprintln!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runtime: RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_background(&mut app, &runtime);
        terminal.draw(|f| ui::draw(f, &app))?;
        if app.should_quit {
            let _ = runtime.send(RuntimeCommand::Shutdown);
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut app, key);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

/// Forward queued commands to the runtime and fold in its events
fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for command in app.take_commands() {
        if let Err(err) = runtime.send(command) {
            app.set_status(format!("Runtime unavailable: {err}"), StatusLevel::Error);
        }
    }
    for event in runtime.poll_events() {
        app.apply_runtime_event(event);
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if app.show_help {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.show_help = false;
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
        InputMode::Prompt(PromptKind::ConfirmBuy) => handle_confirm_mode(app, key),
        InputMode::Prompt(kind) => handle_prompt_mode(app, key, kind),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('c') {
            app.should_quit = true;
        }
        return;
    }

    // The offers panel captures accept/decline and Esc
    if app.offers.is_some() {
        match key.code {
            KeyCode::Esc => {
                app.close_offers();
                return;
            }
            KeyCode::Char('a') => {
                app.resolve_offer(true, None);
                return;
            }
            KeyCode::Char('d') => {
                app.resolve_offer(false, None);
                return;
            }
            _ => {}
        }
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char(':') => app.enter_command(),
        KeyCode::Char('/') => app.enter_prompt(PromptKind::Search, None),
        KeyCode::Char('1') => app.switch_screen(Screen::Market),
        KeyCode::Char('2') => app.switch_screen(Screen::Collection),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('f') => app.cycle_category(),
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection_down(),
        KeyCode::Left | KeyCode::Char('p') => app.prev_page(),
        KeyCode::Right | KeyCode::Char('n') => app.next_page(),
        KeyCode::Char('b') => app.begin_purchase(),
        KeyCode::Char('o') => match app.screen {
            Screen::Market => app.begin_offer(None),
            Screen::Collection => app.open_offers(),
        },
        KeyCode::Char('S') => app.begin_sell(None),
        KeyCode::Char('T') => app.begin_transfer(None),
        KeyCode::Char('t') => app.begin_tip(None),
        KeyCode::Char('l') => app.like_selected(),
        KeyCode::Esc => app.status = None,
        _ => {}
    }
}

fn handle_command_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_command(),
        KeyCode::Enter => app.apply_command(),
        KeyCode::Backspace => {
            app.command.input.pop();
        }
        KeyCode::Up => {
            if let Some(last) = app.command.last.clone() {
                app.command.input = last;
            }
        }
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.command.input.push(ch);
        }
        _ => {}
    }
}

fn handle_prompt_mode(app: &mut App, key: KeyEvent, kind: PromptKind) {
    match key.code {
        KeyCode::Esc => app.exit_prompt(),
        KeyCode::Enter => app.apply_prompt(kind),
        KeyCode::Backspace => {
            app.command.input.pop();
        }
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.command.input.push(ch);
        }
        _ => {}
    }
}

fn handle_confirm_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            app.apply_prompt(PromptKind::ConfirmBuy)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.exit_prompt();
            app.set_status("Purchase cancelled", StatusLevel::Info);
        }
        _ => {}
    }
}
