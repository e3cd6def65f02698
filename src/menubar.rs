use std::io::Write;

use crossterm::{cursor, queue, style, terminal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Bracketed key hint, printed bold.
    Key(&'a str),
    /// Plain text, printed dim.
    Label(&'a str),
}

/// Split a menu item like `"[j] jump"` into key hints and labels. An
/// unterminated `[` is kept as label text.
pub fn segments(item: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = item;
    while !rest.is_empty() {
        let Some(open) = rest.find('[') else {
            out.push(Segment::Label(rest));
            break;
        };
        if open > 0 {
            out.push(Segment::Label(&rest[..open]));
        }
        rest = &rest[open..];
        match rest.find(']') {
            Some(close) => {
                out.push(Segment::Key(&rest[..=close]));
                rest = &rest[close + 1..];
            }
            None => {
                out.push(Segment::Label(rest));
                break;
            }
        }
    }
    out
}

/// Draw a row of menu items on terminal row `y`.
pub fn render_menubar<S: AsRef<str>>(
    out: &mut impl Write,
    y: u16,
    items: &[S],
) -> anyhow::Result<()> {
    queue!(
        out,
        cursor::MoveTo(0, y),
        terminal::Clear(terminal::ClearType::CurrentLine),
        style::Print(" "),
    )?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            queue!(out, style::Print("  "))?;
        }
        for segment in segments(item.as_ref()) {
            let (attr, text) = match segment {
                Segment::Key(t) => (style::Attribute::Bold, t),
                Segment::Label(t) => (style::Attribute::Dim, t),
            };
            queue!(
                out,
                style::SetAttribute(attr),
                style::Print(text),
                style::SetAttribute(style::Attribute::Reset),
            )?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_keys_and_labels() {
        assert_eq!(
            segments("[j][Up] jump"),
            vec![
                Segment::Key("[j]"),
                Segment::Key("[Up]"),
                Segment::Label(" jump")
            ]
        );
        assert_eq!(
            segments("say [:"),
            vec![Segment::Label("say "), Segment::Label("[:")]
        );
        assert!(segments("").is_empty());
    }

    #[test]
    fn renders_into_any_writer() {
        let mut buf = Vec::new();
        render_menubar(&mut buf, 0, &["[q] quit"]).unwrap();
        let text = String::from_utf8_lossy(&buf);
        assert!(text.contains("[q]"));
        assert!(text.contains(" quit"));
    }
}
