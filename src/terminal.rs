//! Terminal plumbing shared by the live host and the player.

use std::io::{self, Write};

use anyhow::Result;
use crossterm::{cursor, event, execute, queue, style, terminal};

use crate::types::{Cell, CellChange, Color, NamedColor, Style};

/// Rows reserved above the canvas for the menu bar.
pub const CANVAS_OFFSET: u16 = 1;

/// Run `f` inside raw mode on the alternate screen, restoring the terminal
/// on exit (even on error).
pub fn with_terminal<F>(mouse: bool, f: F) -> Result<()>
where
    F: FnOnce(&mut io::Stdout) -> Result<()>,
{
    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    execute!(
        stdout,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::Clear(terminal::ClearType::All),
    )?;
    if mouse {
        execute!(stdout, event::EnableMouseCapture)?;
    }

    let result = f(&mut stdout);

    if mouse {
        let _ = execute!(stdout, event::DisableMouseCapture);
    }
    let _ = execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

/// Paint a whole grid below the menu bar.
pub fn draw_grid(out: &mut impl Write, grid: &[Vec<Cell>]) -> Result<()> {
    for (y, row) in grid.iter().enumerate() {
        queue!(out, cursor::MoveTo(0, y as u16 + CANVAS_OFFSET))?;
        for cell in row {
            let cs = to_content_style(&cell.style);
            queue!(
                out,
                style::PrintStyledContent(style::StyledContent::new(cs, cell.ch))
            )?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Paint only the changed cells.
pub fn draw_changes(out: &mut impl Write, changes: &[CellChange]) -> Result<()> {
    for change in changes {
        let cs = to_content_style(&change.cell.style);
        queue!(
            out,
            cursor::MoveTo(change.x, change.y + CANVAS_OFFSET),
            style::PrintStyledContent(style::StyledContent::new(cs, change.cell.ch)),
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Dimmed one-line status text at row `y`.
pub fn draw_status(out: &mut impl Write, y: u16, text: &str) -> Result<()> {
    let mut cs = style::ContentStyle::default();
    cs.attributes.set(style::Attribute::Dim);
    queue!(
        out,
        cursor::MoveTo(0, y),
        terminal::Clear(terminal::ClearType::CurrentLine),
        style::PrintStyledContent(style::StyledContent::new(cs, text)),
    )?;
    out.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Style conversion
// ---------------------------------------------------------------------------

pub fn to_content_style(s: &Style) -> style::ContentStyle {
    let mut cs = style::ContentStyle::default();
    if let Some(fg) = &s.fg {
        cs.foreground_color = Some(to_ct_color(fg));
    }
    if let Some(bg) = &s.bg {
        cs.background_color = Some(to_ct_color(bg));
    }
    if s.bold {
        cs.attributes.set(style::Attribute::Bold);
    }
    if s.dim {
        cs.attributes.set(style::Attribute::Dim);
    }
    cs
}

pub fn to_ct_color(c: &Color) -> style::Color {
    match c {
        Color::Named(n) => match n {
            NamedColor::Black => style::Color::Black,
            NamedColor::Red => style::Color::Red,
            NamedColor::Green => style::Color::Green,
            NamedColor::Yellow => style::Color::Yellow,
            NamedColor::Blue => style::Color::Blue,
            NamedColor::Magenta => style::Color::Magenta,
            NamedColor::Cyan => style::Color::Cyan,
            NamedColor::White => style::Color::White,
        },
        Color::Rgb { r, g, b } => style::Color::Rgb {
            r: *r,
            g: *g,
            b: *b,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_maps_both_colors() {
        let cs = to_content_style(&Style {
            fg: Some(Color::GRAY),
            bg: Some(Color::BLACK),
            bold: true,
            dim: false,
        });
        assert_eq!(
            cs.foreground_color,
            Some(style::Color::Rgb {
                r: 128,
                g: 128,
                b: 128
            })
        );
        assert_eq!(cs.background_color, Some(style::Color::Black));
        assert!(cs.attributes.has(style::Attribute::Bold));
        assert!(!cs.attributes.has(style::Attribute::Dim));
    }

    #[test]
    fn draw_changes_offsets_below_menubar() {
        let mut buf = Vec::new();
        let change = CellChange {
            x: 3,
            y: 0,
            cell: Cell {
                ch: 'o',
                style: Style::default(),
            },
        };
        draw_changes(&mut buf, &[change]).unwrap();
        let text = String::from_utf8_lossy(&buf);
        // MoveTo is 0-based; ANSI CUP is 1-based row;col.
        assert!(text.contains("\x1b[2;4H"));
        assert!(text.contains('o'));
    }
}
