mod app;
mod ui;

use crate::utils::AppConfig;
use anyhow::Result;
use app::App;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Event loop tick; shard completions are picked up at this rate
const TICK: Duration = Duration::from_millis(50);

pub fn run(docs_dir: PathBuf, config: &AppConfig, initial_query: Option<String>) -> Result<()> {
    // Open the docs tree before touching the terminal so errors print normally
    let mut app = App::new(docs_dir, config)?;

    if let Some(query) = initial_query {
        app.set_query(&query);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Clear the terminal to prevent any artifacts from previous content
    terminal.clear()?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Pick up finished shard loads (non-blocking)
        app.poll();

        terminal.draw(|f| ui::draw(f, app))?;

        if !event::poll(TICK)? {
            continue;
        }

        // Only handle key press events, not release or repeat
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        // Global keybindings
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Ok(()),
            (KeyModifiers::CONTROL, KeyCode::Char('q')) => return Ok(()),
            _ => {}
        }

        if app.mode == app::Mode::Help {
            // Any key closes help
            app.hide_help();
            continue;
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('j'))
            | (KeyModifiers::CONTROL, KeyCode::Char('n')) => app.select_next(),
            (KeyModifiers::CONTROL, KeyCode::Char('k'))
            | (KeyModifiers::CONTROL, KeyCode::Char('p')) => app.select_prev(),
            (KeyModifiers::CONTROL, KeyCode::Char('d')) => app.select_page_down(),
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => app.select_page_up(),
            (KeyModifiers::CONTROL, KeyCode::Char('w')) => app.delete_word(),
            (KeyModifiers::CONTROL, KeyCode::Char('h')) => app.pop_char(),
            (KeyModifiers::CONTROL, KeyCode::Char('a')) => app.select_first(),
            (KeyModifiers::CONTROL, KeyCode::Char('e')) => app.select_last(),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, code) => match code {
                KeyCode::Esc => {
                    if app.query.is_empty() {
                        return Ok(());
                    }
                    app.clear_query();
                }
                KeyCode::Enter => app.open_selected(),
                KeyCode::Down | KeyCode::Tab => app.select_next(),
                KeyCode::Up | KeyCode::BackTab => app.select_prev(),
                KeyCode::PageDown => app.select_page_down(),
                KeyCode::PageUp => app.select_page_up(),
                KeyCode::Home => app.select_first(),
                KeyCode::End => app.select_last(),
                KeyCode::F(1) => app.show_help(),
                KeyCode::Char(c) => app.push_char(c),
                KeyCode::Backspace => app.pop_char(),
                _ => {}
            },
            _ => {}
        }
    }
}
