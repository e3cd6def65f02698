//! Player: replays a recorded session in the terminal.
//!
//! Consumes a `Recording` and drives it to the terminal at the recorded tick
//! rate. The player does not interpret semantics or perform rendering
//! decisions; the recording is an immutable, authoritative visual script.

use std::io;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use crossterm::{event, terminal as ct};
use tracing::info;

use crate::menubar::render_menubar;
use crate::terminal::{self, CANVAS_OFFSET};
use crate::types::{Cell, Frame, Grid, Recording};

const MENU: &[&str] = &[
    "[Space] pause",
    "[←][→] step",
    "[Home] restart",
    "[q][Esc] quit",
];

pub struct Player {
    recording: Recording,
    current_frame: usize,
    grid: Grid,
    paused: bool,
}

impl Player {
    pub fn new(recording: Recording) -> Self {
        let grid = Self::blank(&recording);
        Self {
            recording,
            current_frame: 0,
            grid,
            paused: false,
        }
    }

    fn blank(recording: &Recording) -> Grid {
        let w = recording.contract.width as usize;
        let h = recording.contract.height as usize;
        vec![vec![Cell::default(); w]; h]
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Play the recording in the terminal.
    pub fn play(&mut self) -> Result<()> {
        if self.recording.frames.is_empty() {
            bail!("Recording has no frames");
        }
        let (term_w, term_h) = ct::size()?;
        let need_w = self.recording.contract.width;
        let need_h = self.recording.contract.height;
        // +2: one row for menu bar, one row for status bar
        if term_w < need_w || term_h < need_h + 2 {
            bail!(
                "Terminal too small: need {}x{}, have {}x{}",
                need_w,
                need_h + 2,
                term_w,
                term_h,
            );
        }

        info!(frames = self.recording.frames.len(), "playback started");
        terminal::with_terminal(false, |stdout| self.run_loop(stdout))
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    fn run_loop(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        let tick = Duration::from_millis(self.recording.tick_ms.max(1));
        let mut deadline = Instant::now() + tick;

        self.apply_frame(0);
        render_menubar(stdout, 0, MENU)?;
        terminal::draw_grid(stdout, &self.grid)?;
        self.render_status(stdout)?;

        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            if event::poll(timeout)? {
                match event::read()? {
                    event::Event::Key(key) if key.kind != event::KeyEventKind::Release => {
                        use event::KeyCode::*;
                        match key.code {
                            Char('q') | Esc => break,
                            Char(' ') => self.paused = !self.paused,
                            Right if self.paused => {
                                if self.step_forward() {
                                    self.render_diff(stdout)?;
                                }
                            }
                            Left if self.paused => {
                                if self.current_frame > 0 {
                                    self.seek(self.current_frame - 1);
                                    terminal::draw_grid(stdout, &self.grid)?;
                                }
                            }
                            Home => {
                                self.seek(0);
                                terminal::draw_grid(stdout, &self.grid)?;
                            }
                            _ => {}
                        }
                        self.render_status(stdout)?;
                    }
                    event::Event::Resize(_, _) => {
                        render_menubar(stdout, 0, MENU)?;
                        terminal::draw_grid(stdout, &self.grid)?;
                        self.render_status(stdout)?;
                    }
                    _ => {}
                }
            }

            if Instant::now() >= deadline {
                deadline = Instant::now() + tick;
                if !self.paused && self.step_forward() {
                    self.render_diff(stdout)?;
                    self.render_status(stdout)?;
                }
            }
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Grid management
    // -----------------------------------------------------------------------

    /// Advance one frame. Returns false at the end of the recording.
    pub fn step_forward(&mut self) -> bool {
        let last = self.recording.frames.len().saturating_sub(1);
        if self.current_frame >= last {
            return false;
        }
        self.current_frame += 1;
        self.apply_frame(self.current_frame);
        true
    }

    /// Rebuild the grid for `target` by replaying from the first frame.
    pub fn seek(&mut self, target: usize) {
        let target = target.min(self.recording.frames.len().saturating_sub(1));
        self.grid = Self::blank(&self.recording);
        for i in 0..=target {
            self.apply_frame(i);
        }
        self.current_frame = target;
    }

    fn apply_frame(&mut self, index: usize) {
        let Some(frame) = self.recording.frames.get(index) else {
            return;
        };
        match frame {
            Frame::Full { cells } => {
                self.grid = cells.clone();
            }
            Frame::Diff { changes } => {
                for change in changes {
                    let x = change.x as usize;
                    let y = change.y as usize;
                    if let Some(cell) = self.grid.get_mut(y).and_then(|row| row.get_mut(x)) {
                        *cell = change.cell.clone();
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Terminal output
    // -----------------------------------------------------------------------

    fn render_diff(&self, stdout: &mut io::Stdout) -> Result<()> {
        match &self.recording.frames[self.current_frame] {
            Frame::Diff { changes } => terminal::draw_changes(stdout, changes),
            Frame::Full { .. } => terminal::draw_grid(stdout, &self.grid),
        }
    }

    fn render_status(&self, stdout: &mut io::Stdout) -> Result<()> {
        let status_y = self.recording.contract.height + CANVAS_OFFSET;
        let (_, term_h) = ct::size()?;
        if status_y >= term_h {
            return Ok(()); // No room for status bar.
        }

        let total = self.recording.frames.len();
        let status = format!(
            " Frame {}/{}{} | {} ",
            self.current_frame + 1,
            total,
            if self.paused { " (paused)" } else { "" },
            self.recording
                .marker_at(self.current_frame)
                .unwrap_or("no action yet"),
        );
        terminal::draw_status(stdout, status_y, &status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellChange, Marker, Style, TerminalContract};

    fn cell(ch: char) -> Cell {
        Cell {
            ch,
            style: Style::default(),
        }
    }

    fn recording() -> Recording {
        Recording {
            contract: TerminalContract {
                width: 2,
                height: 1,
            },
            tick_ms: 16,
            frames: vec![
                Frame::Full {
                    cells: vec![vec![cell('a'), cell('b')]],
                },
                Frame::Diff {
                    changes: vec![CellChange {
                        x: 1,
                        y: 0,
                        cell: cell('c'),
                    }],
                },
                Frame::Diff {
                    changes: vec![
                        CellChange {
                            x: 0,
                            y: 0,
                            cell: cell('d'),
                        },
                        // Outside the contract, ignored.
                        CellChange {
                            x: 5,
                            y: 3,
                            cell: cell('z'),
                        },
                    ],
                },
            ],
            markers: vec![Marker {
                frame_index: 1,
                label: "JUMP!".into(),
            }],
        }
    }

    fn chars(player: &Player) -> String {
        player.grid()[0].iter().map(|c| c.ch).collect()
    }

    #[test]
    fn steps_through_diffs_and_stops_at_end() {
        let mut player = Player::new(recording());
        player.seek(0);
        assert_eq!(chars(&player), "ab");
        assert!(player.step_forward());
        assert_eq!(chars(&player), "ac");
        assert!(player.step_forward());
        assert_eq!(chars(&player), "dc");
        assert!(!player.step_forward());
        assert_eq!(player.current_frame(), 2);
    }

    #[test]
    fn seek_rebuilds_from_first_frame() {
        let mut player = Player::new(recording());
        player.seek(2);
        assert_eq!(chars(&player), "dc");
        player.seek(1);
        assert_eq!(chars(&player), "ac");
        player.seek(99);
        assert_eq!(player.current_frame(), 2);
    }

    #[test]
    fn recording_survives_json_round_trip() {
        let json = serde_json::to_string(&recording()).unwrap();
        let decoded: Recording = serde_json::from_str(&json).unwrap();
        let mut player = Player::new(decoded);
        player.seek(2);
        assert_eq!(chars(&player), "dc");
        assert_eq!(player.recording.marker_at(2), Some("JUMP!"));
        assert_eq!(player.recording.marker_at(0), None);
    }
}
