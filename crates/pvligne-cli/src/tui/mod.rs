//! Two-thread TUI orchestration.
//!
//! Terminal I/O runs on a dedicated OS thread; timers and lookups stay on the
//! tokio runtime. Both report to the UI loop through `tokio::sync::mpsc`
//! channels.

mod input;

pub use input::handle_term_event;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use pvligne_core::{Config, UserDirectory};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::app::{App, MINUTES_FORM};
use crate::autocomplete::{AutocompleteFactory, WidgetEvent};
use crate::ui;

/// Terminal events forwarded from the UI reader thread.
#[derive(Debug, Clone)]
pub enum TermEvent {
    Key(crossterm::event::KeyEvent),
    Mouse(crossterm::event::MouseEvent),
    Resize(u16, u16),
}

/// Run the minutes form until the user quits.
///
/// Returns the captured minutes when the user saved with Ctrl+S.
pub async fn run(
    config: Config,
    directory: Arc<dyn UserDirectory>,
) -> anyhow::Result<Option<serde_json::Value>> {
    // 1. Widgets and their completion channel
    let (widget_tx, mut widget_rx) = mpsc::channel::<WidgetEvent>(64);
    let factory = AutocompleteFactory::new(config, directory, widget_tx);
    let mut app = App::new(MINUTES_FORM, Some(&factory));
    drop(factory);

    // 2. Enter raw mode, create terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // 3. Dedicated OS thread for crossterm::event::read()
    let cancel = CancellationToken::new();
    let (term_tx, mut term_rx) = mpsc::channel::<TermEvent>(64);
    let cancel_clone = cancel.clone();
    let ui_thread = std::thread::spawn(move || {
        loop {
            if cancel_clone.is_cancelled() {
                break;
            }
            // Poll with 50ms timeout so we can check cancellation
            if !event::poll(Duration::from_millis(50)).unwrap_or(false) {
                continue;
            }
            let forwarded = match event::read() {
                // Windows emits Press + Release per keystroke
                Ok(Event::Key(key))
                    if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) =>
                {
                    TermEvent::Key(key)
                }
                Ok(Event::Mouse(mouse)) if !matches!(mouse.kind, MouseEventKind::Drag(_)) => {
                    TermEvent::Mouse(mouse)
                }
                Ok(Event::Resize(w, h)) => TermEvent::Resize(w, h),
                _ => continue,
            };
            if term_tx.blocking_send(forwarded).is_err() {
                break;
            }
        }
    });

    info!("Minutes form ready");
    let mut tick = tokio::time::interval(Duration::from_millis(50));

    let result: anyhow::Result<()> = loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Err(e) = terminal.draw(|f| ui::draw(f, &mut app)) {
                    break Err(e.into());
                }
            }
            Some(term_event) = term_rx.recv() => {
                input::handle_term_event(&mut app, term_event);
            }
            Some(widget_event) = widget_rx.recv() => {
                app.route_widget_event(widget_event);
            }
        }
        if app.should_quit {
            break Ok(());
        }
    };

    // 4. Shutdown: stop the reader thread, tear down every widget
    cancel.cancel();
    let _ = ui_thread.join(); // fast, <50ms due to poll timeout
    app.teardown();
    debug!("Widgets torn down");

    // 5. Restore terminal
    let _ = disable_raw_mode();
    let _ = execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    );
    let _ = terminal.show_cursor();

    result?;
    Ok(app.save_on_exit.then(|| app.to_json()))
}
