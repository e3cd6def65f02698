//! Host: the live terminal session.
//!
//! Owns the engine and the fixed-rate loop that drives it: wait for input
//! until the next tick deadline, tick with the measured delta, render,
//! rasterize and paint only the cells that changed.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use tracing::{debug, info, warn};

use crate::command::{KeywordMatcher, TouchZones};
use crate::config::{Config, KeyBindings};
use crate::engine::{Command, Engine};
use crate::menubar::render_menubar;
use crate::renderer::Renderer;
use crate::terminal::{self, CANVAS_OFFSET};
use crate::types::{Grid, TerminalContract};

/// Rows taken by the menu bar and the status line.
pub const CHROME_ROWS: u16 = 2;

/// Menu bar items with the hints taken from the configured bindings.
pub fn menu_items(bindings: &KeyBindings) -> Vec<String> {
    let hint = |keys: &[String], label: &str| {
        let mut item: String = keys
            .iter()
            .map(|k| match k.as_str() {
                "Up" => "[↑]".to_string(),
                "Down" => "[↓]".to_string(),
                "Left" => "[←]".to_string(),
                "Right" => "[→]".to_string(),
                other => format!("[{other}]"),
            })
            .collect();
        item.push(' ');
        item.push_str(label);
        item
    };
    vec![
        hint(&bindings.jump, "jump"),
        hint(&bindings.shoot, "shoot"),
        hint(&bindings.explode, "explode"),
        hint(&bindings.say, "say"),
        "[click] touch zones".to_string(),
        hint(&bindings.quit, "quit"),
    ]
}

/// What the loop should do after an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Redraw,
    Quit,
}

pub struct Host {
    config: Config,
    engine: Engine,
    matcher: KeywordMatcher,
    contract: TerminalContract,
    menu: Vec<String>,
    grid: Grid,
    /// Text typed so far while in "say" mode.
    say: Option<String>,
}

impl Host {
    pub fn new(config: Config, contract: TerminalContract) -> Self {
        let viewport = config.raster.viewport(contract);
        let engine = Engine::new(viewport, config.tuning.clone(), config.render.clone())
            .with_title(config.title());
        let matcher = KeywordMatcher::new(&config.keywords);
        let menu = menu_items(&config.key_bindings);
        Host {
            config,
            engine,
            matcher,
            contract,
            menu,
            grid: Vec::new(),
            say: None,
        }
    }

    /// Canvas size for a terminal of `cols` × `rows`.
    pub fn contract_for(cols: u16, rows: u16) -> TerminalContract {
        TerminalContract {
            width: cols,
            height: rows.saturating_sub(CHROME_ROWS).max(1),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn run(&mut self) -> Result<()> {
        info!(
            width = self.contract.width,
            height = self.contract.height,
            tick_ms = self.config.host.tick_ms,
            "session started"
        );
        let result = terminal::with_terminal(true, |stdout| self.main_loop(stdout));
        info!("session ended");
        result
    }

    fn main_loop(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        let tick = Duration::from_millis(self.config.host.tick_ms);
        let mut last = Instant::now();
        let mut deadline = last + tick;

        self.full_redraw(stdout)?;

        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            if event::poll(timeout)? {
                match self.handle_event(event::read()?) {
                    Flow::Quit => break,
                    Flow::Redraw => self.full_redraw(stdout)?,
                    Flow::Continue => self.render_status(stdout)?,
                }
            }

            let now = Instant::now();
            if now >= deadline {
                let dt = (now - last).as_secs_f32().min(self.config.host.max_dt);
                last = now;
                deadline = now + tick;
                self.engine.tick(dt);
                self.draw_frame(stdout)?;
            }
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    pub fn handle_event(&mut self, event: Event) -> Flow {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(cols, rows) => {
                self.contract = Self::contract_for(cols, rows);
                self.engine.resize(self.config.raster.viewport(self.contract));
                self.grid.clear();
                Flow::Redraw
            }
            _ => Flow::Continue,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if let Some(buffer) = &mut self.say {
            match key.code {
                KeyCode::Enter => {
                    let transcript = std::mem::take(buffer);
                    self.say = None;
                    self.hear(&transcript);
                }
                KeyCode::Esc => {
                    self.say = None;
                    self.engine.set_status(None);
                }
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            }
            return Flow::Continue;
        }

        let bindings = &self.config.key_bindings;
        if bindings.is_quit(&key) {
            return Flow::Quit;
        }
        if let Some(command) = bindings.command_for(&key) {
            self.engine.set_status(None);
            self.engine.apply(command);
        } else if bindings.is_say(&key) {
            self.say = Some(String::new());
            self.engine
                .set_status(Some("Listening... (Enter to send, Esc to cancel)".into()));
        }
        Flow::Continue
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Flow {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Flow::Continue;
        }
        let canvas_rows = CANVAS_OFFSET..CANVAS_OFFSET + self.contract.height;
        if !canvas_rows.contains(&mouse.row) {
            return Flow::Continue;
        }

        let viewport = self.engine.viewport();
        let x = (mouse.column as f32 + 0.5) * self.config.raster.width_px;
        let zones = TouchZones {
            width: viewport.width,
        };
        if let Some(command) = zones.command_at(x) {
            debug!(column = mouse.column, ?command, "touch");
            self.engine.set_status(Some(format!("Touch: {command:?}")));
            self.engine.apply(command);
        }
        Flow::Continue
    }

    /// Feed a typed transcript to the keyword matcher. Alternatives may be
    /// separated by `|`, like a recognizer's result list.
    fn hear(&mut self, transcript: &str) {
        let commands: Vec<Command> = self.matcher.match_alternatives(transcript.split('|'));
        if commands.is_empty() {
            warn!(transcript, "no keyword matched");
            self.engine
                .set_status(Some(format!("Not understood: \"{transcript}\"")));
            return;
        }
        debug!(transcript, ?commands, "heard");
        self.engine.set_status(Some(format!("Heard \"{transcript}\"")));
        for command in commands {
            self.engine.apply(command);
        }
    }

    // -----------------------------------------------------------------------
    // Terminal output
    // -----------------------------------------------------------------------

    fn draw_frame(&mut self, stdout: &mut impl Write) -> Result<()> {
        let scene = self.engine.render();
        let grid = Renderer::rasterize(&scene, self.contract, self.config.raster);
        if self.grid.is_empty() {
            terminal::draw_grid(stdout, &grid)?;
        } else {
            terminal::draw_changes(stdout, &Renderer::diff(&self.grid, &grid))?;
        }
        self.grid = grid;
        Ok(())
    }

    fn full_redraw(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        crossterm::execute!(
            stdout,
            crossterm::terminal::Clear(crossterm::terminal::ClearType::All)
        )?;
        render_menubar(stdout, 0, self.menu.as_slice())?;
        self.grid.clear();
        self.draw_frame(stdout)?;
        self.render_status(stdout)
    }

    fn render_status(&self, stdout: &mut impl Write) -> Result<()> {
        let y = self.contract.height + CANVAS_OFFSET;
        let text = match &self.say {
            Some(buffer) => format!(" say> {buffer}_"),
            None => {
                let state = self.engine.state();
                format!(
                    " x {:>5.0} | y {:>5.0} | {} | {:?}",
                    state.position.x,
                    state.position.y,
                    if state.airborne { "airborne" } else { "grounded" },
                    state.action_tag(),
                )
            }
        };
        terminal::draw_status(stdout, y, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyModifiers, MouseEvent};

    fn host() -> Host {
        Host::new(Config::default(), Host::contract_for(80, 26))
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn click(column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn type_text(host: &mut Host, text: &str) {
        for c in text.chars() {
            assert_eq!(host.handle_event(key(KeyCode::Char(c))), Flow::Continue);
        }
    }

    #[test]
    fn menu_follows_key_bindings() {
        assert_eq!(host().menu[0], "[j][↑] jump");

        let mut config = Config::default();
        config.key_bindings.jump = vec!["k".into(), "Ctrl-j".into()];
        config.key_bindings.quit = vec!["x".into()];
        let items = menu_items(&config.key_bindings);
        assert_eq!(items[0], "[k][Ctrl-j] jump");
        assert_eq!(items[5], "[x] quit");
        assert!(items.iter().all(|item| !item.contains("[q]")));
    }

    #[test]
    fn contract_leaves_room_for_chrome() {
        assert_eq!(
            Host::contract_for(80, 26),
            TerminalContract {
                width: 80,
                height: 24
            }
        );
        assert_eq!(Host::contract_for(10, 1).height, 1);
    }

    #[test]
    fn bound_keys_issue_commands() {
        let mut host = host();
        host.handle_event(key(KeyCode::Char('j')));
        assert!(host.engine().state().airborne);

        host.handle_event(key(KeyCode::Char('e')));
        assert_eq!(host.engine().state().action_tag(), Some(Command::Explode));
        assert_eq!(host.handle_event(key(KeyCode::Char('q'))), Flow::Quit);
    }

    #[test]
    fn say_mode_matches_keywords() {
        let mut host = host();
        host.handle_event(key(KeyCode::Char(':')));
        type_text(&mut host, "paf!");
        // 'q' and 'e' are plain text while typing.
        type_text(&mut host, "qe");
        host.handle_event(key(KeyCode::Backspace));
        host.handle_event(key(KeyCode::Enter));

        assert_eq!(host.engine().state().action_tag(), Some(Command::Shoot));
        assert_eq!(
            host.engine().diagnostics().status.as_deref(),
            Some("Heard \"paf!q\"")
        );
    }

    #[test]
    fn say_mode_reports_unmatched_phrase() {
        let mut host = host();
        host.handle_event(key(KeyCode::Char(':')));
        type_text(&mut host, "bonjour");
        host.handle_event(key(KeyCode::Enter));
        assert_eq!(host.engine().state().action_tag(), None);
        assert_eq!(
            host.engine().diagnostics().status.as_deref(),
            Some("Not understood: \"bonjour\"")
        );
    }

    #[test]
    fn alternatives_issue_each_match() {
        let mut host = host();
        host.handle_event(key(KeyCode::Char(':')));
        type_text(&mut host, "hop|boum");
        host.handle_event(key(KeyCode::Enter));
        let state = host.engine().state();
        assert!(state.airborne);
        assert_eq!(state.action_tag(), Some(Command::Explode));
    }

    #[test]
    fn clicks_map_to_touch_zones() {
        let mut host = host();
        host.handle_event(click(75, 5));
        assert_eq!(host.engine().state().action_tag(), Some(Command::Explode));

        host.handle_event(click(40, 5));
        assert_eq!(host.engine().state().action_tag(), Some(Command::Shoot));

        // Menu bar row is not part of the canvas.
        host.handle_event(click(2, 0));
        assert!(!host.engine().state().airborne);

        host.handle_event(click(2, 24));
        assert!(host.engine().state().airborne);
    }

    #[test]
    fn resize_rebuilds_engine_viewport() {
        let mut host = host();
        assert_eq!(host.handle_event(Event::Resize(100, 40)), Flow::Redraw);
        let viewport = host.engine().viewport();
        assert_eq!(viewport.width, 100.0 * 14.0);
        assert_eq!(viewport.height, 38.0 * 28.0);
    }
}
