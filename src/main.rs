mod app;
mod config;
mod dispatch;
mod error;
mod gateway;
mod logging;
mod transport;
mod ui;

use anyhow::Result;
use app::*;
use config::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dispatch::ActionDispatcher;
use gateway::hubtel::HubtelClient;
use gateway::mock::MockTransport;
use gateway::slydepay::SlydepayClient;
use ratatui::prelude::*;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};
use transport::{HttpTransport, ReqwestTransport};

/// Builds one long-lived client per configured gateway and wires their
/// actions. Hubtel is skipped when it has no base URI.
fn build_dispatcher(config: &AppConfig) -> Result<ActionDispatcher> {
    let transport: Arc<dyn HttpTransport> = if config.demo {
        info!("Demo mode: using the offline mock transport");
        Arc::new(MockTransport::new())
    } else {
        Arc::new(ReqwestTransport::new(config.timeout())?)
    };

    let mut dispatcher = ActionDispatcher::new();

    if let Some(hubtel_config) = config.hubtel_config()? {
        let base_uri = hubtel_config.base_uri().to_string();
        let hubtel = Arc::new(HubtelClient::new(hubtel_config, Arc::clone(&transport)));
        hubtel.register(&mut dispatcher);
        info!("Registered {} actions against {}", hubtel.name(), base_uri);
    }

    let slydepay_config = config.slydepay_config()?;
    let base_uri = slydepay_config.base_uri().to_string();
    let slydepay = Arc::new(SlydepayClient::new(slydepay_config, transport));
    slydepay.register(&mut dispatcher);
    info!("Registered {} actions against {}", slydepay.name(), base_uri);

    Ok(dispatcher)
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_path = logging::init_tracing()?;
    let config = load_config()?;
    let dispatcher = Arc::new(build_dispatcher(&config)?);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, config, dispatcher).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        error!("Console exited with error: {}", e);
        eprintln!("Error: {} (log: {})", e, log_path.display());
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    config: AppConfig,
    dispatcher: Arc<ActionDispatcher>,
) -> Result<()> {
    let registered = dispatcher.action_names().into_iter().map(String::from).collect();
    let mut app = App::new(config, registered);

    let (tx, mut rx) = mpsc::unbounded_channel::<(String, Vec<Value>)>();

    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        // Results from the in-flight action
        while let Ok((action, results)) = rx.try_recv() {
            app.record_result(action, results);
        }

        app.tick = app.tick.wrapping_add(1);

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match handle_key(&mut app, key.code) {
            KeyOutcome::Quit => break,
            KeyOutcome::Fire(action, args) => {
                fire_action(Arc::clone(&dispatcher), tx.clone(), action, args)
            }
            KeyOutcome::Continue => {}
        }
    }

    Ok(())
}

#[derive(Debug, PartialEq)]
enum KeyOutcome {
    Continue,
    Quit,
    Fire(&'static str, Value),
}

fn handle_key(app: &mut App, key: KeyCode) -> KeyOutcome {
    match app.phase {
        AppPhase::GatewaySelect => match key {
            KeyCode::Up => app.move_cursor(false),
            KeyCode::Down => app.move_cursor(true),
            KeyCode::Enter => {
                app.choose_gateway();
            }
            KeyCode::Char('q') | KeyCode::Esc => return KeyOutcome::Quit,
            _ => {}
        },
        AppPhase::OperationSelect => match key {
            KeyCode::Up => app.move_cursor(false),
            KeyCode::Down => app.move_cursor(true),
            KeyCode::Enter => app.choose_operation(),
            KeyCode::Esc => app.back(),
            KeyCode::Char('q') => return KeyOutcome::Quit,
            _ => {}
        },
        AppPhase::Input => match key {
            KeyCode::Char(c) => app.input.push(c),
            KeyCode::Backspace => {
                app.input.pop();
            }
            KeyCode::Esc => app.back(),
            KeyCode::Enter => match app.parse_input() {
                Ok((action, args)) => {
                    app.error_message = None;
                    app.phase = AppPhase::Waiting;
                    return KeyOutcome::Fire(action, args);
                }
                Err(msg) => app.error_message = Some(msg),
            },
            _ => {}
        },
        // The request may never return when no timeout is set.
        AppPhase::Waiting => {
            if matches!(key, KeyCode::Char('q') | KeyCode::Esc) {
                return KeyOutcome::Quit;
            }
        }
        AppPhase::Result => match key {
            KeyCode::Enter | KeyCode::Esc => app.back(),
            KeyCode::Char('q') => return KeyOutcome::Quit,
            _ => {}
        },
    }
    KeyOutcome::Continue
}

/// Runs the action off the UI loop; the result comes back over `tx`.
fn fire_action(
    dispatcher: Arc<ActionDispatcher>,
    tx: mpsc::UnboundedSender<(String, Vec<Value>)>,
    action: &'static str,
    args: Value,
) {
    info!("Firing action {}", action);
    tokio::spawn(async move {
        let results = dispatcher.do_action(action, args).await;
        if tx.send((action.to_string(), results)).is_err() {
            error!("Console closed before {} finished", action);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn console() -> App {
        let actions = operations().iter().map(|op| op.action.to_string()).collect();
        App::new(AppConfig::default(), actions)
    }

    #[test]
    fn test_enter_on_input_fires_and_waits() {
        let mut app = console();
        assert_eq!(handle_key(&mut app, KeyCode::Enter), KeyOutcome::Continue);
        assert_eq!(handle_key(&mut app, KeyCode::Down), KeyOutcome::Continue);
        assert_eq!(handle_key(&mut app, KeyCode::Enter), KeyOutcome::Continue);
        assert_eq!(app.phase, AppPhase::Input);

        for c in "INV-1".chars() {
            handle_key(&mut app, KeyCode::Char(c));
        }
        assert_eq!(
            handle_key(&mut app, KeyCode::Enter),
            KeyOutcome::Fire(gateway::hubtel::ACTION_INVOICE_STATUS, json!("INV-1"))
        );
        assert_eq!(app.phase, AppPhase::Waiting);
    }

    #[test]
    fn test_quit_while_waiting() {
        let mut app = console();
        app.phase = AppPhase::Waiting;
        assert_eq!(handle_key(&mut app, KeyCode::Enter), KeyOutcome::Continue);
        assert_eq!(handle_key(&mut app, KeyCode::Char('q')), KeyOutcome::Quit);
        assert_eq!(handle_key(&mut app, KeyCode::Esc), KeyOutcome::Quit);
    }

    #[test]
    fn test_q_is_typed_text_in_input() {
        let mut app = console();
        app.phase = AppPhase::Input;
        app.input.clear();
        assert_eq!(handle_key(&mut app, KeyCode::Char('q')), KeyOutcome::Continue);
        assert_eq!(app.input, "q");
    }
}
