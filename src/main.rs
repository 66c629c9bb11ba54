use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use std::{error::Error, io, sync::Arc};
use tracing::{error, info, warn};

mod actions;
mod app;
mod board;
mod config;
mod input;
mod integrations;
mod logging;
mod models;
mod runtime;
#[cfg(test)]
mod testing;
mod ui;
mod view;

use app::App;
use config::Config;
use integrations::backend::HttpGateway;
use runtime::dispatch::{Dispatcher, Execution};

fn main() -> Result<(), Box<dyn Error>> {
    let (config, config_warnings) = Config::load();
    let _logging_guard = logging::init(&config.logging);
    for warning in &config_warnings {
        warn!(%warning, "config problem");
    }
    info!(server = %config.server.base_url, "starting");

    let gateway = HttpGateway::new(&config.server)?;
    let sync_on_start = config.server.sync_on_start;
    let mut app = App::new(config, Dispatcher::new(Arc::new(gateway), Execution::Threaded));
    if sync_on_start {
        actions::sync_tasks(&mut app);
    }

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    // Unsupported terminals reject the enhancement flags; that is harmless.
    let _ = execute!(
        stdout,
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
    );

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    let _ = execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags);
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = %err, "terminal loop failed");
        println!("{:?}", err);
    }

    info!("stopped");
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        runtime::tick(app);

        terminal.draw(|f| ui::ui(f, app))?;

        if event::poll(std::time::Duration::from_millis(250))? {
            let event = event::read()?;
            input::handle_event(app, event);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
