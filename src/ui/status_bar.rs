use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMode<'a> {
    Normal,
    Insert { popup_hotkey: &'a str },
    /// The popup has keyboard focus.
    PopupActions,
}

pub struct StatusBar<'a> {
    pub hints: &'a [(String, &'static str)],
    pub message: Option<&'a str>,
    pub mode: StatusMode<'a>,
}

impl<'a> Widget for StatusBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.mode {
            StatusMode::Insert { popup_hotkey } => {
                let line = Line::from(vec![
                    Span::styled(" -- INSERT -- ", Style::default().fg(Color::Green)),
                    Span::styled(
                        format!("Esc to save, {} for popup actions ", popup_hotkey),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]);
                line.render(area, buf);
                return;
            }
            StatusMode::PopupActions => {
                let line = Line::from(vec![
                    Span::styled(" -- ACTIONS -- ", Style::default().fg(Color::Magenta)),
                    Span::styled(
                        "1-9 insert alias, Ctrl+1-9 pick then a/r/o/c/n ",
                        Style::default().fg(Color::DarkGray),
                    ),
                ]);
                line.render(area, buf);
                return;
            }
            StatusMode::Normal => {}
        }

        if let Some(msg) = self.message {
            let line = Line::from(Span::styled(
                format!(" {} ", msg),
                Style::default().fg(Color::Yellow),
            ));
            line.render(area, buf);
            return;
        }

        let mut spans = Vec::new();
        spans.push(Span::raw(" "));

        for (i, (key, action)) in self.hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", Style::default().fg(Color::DarkGray)));
            }
            spans.push(Span::styled(
                format!("[{}]", key),
                Style::default().fg(Color::Cyan),
            ));
            spans.push(Span::styled(
                action.to_string(),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::DIM),
            ));
        }

        let line = Line::from(spans);
        line.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(bar: StatusBar) -> String {
        let area = Rect::new(0, 0, 70, 1);
        let mut buf = Buffer::empty(area);
        bar.render(area, &mut buf);
        (0..area.width)
            .map(|x| {
                buf.cell((x, 0))
                    .unwrap()
                    .symbol()
                    .chars()
                    .next()
                    .unwrap_or(' ')
            })
            .collect()
    }

    #[test]
    fn status_bar_renders_hints() {
        let hints = vec![("q".to_string(), "quit"), ("u".to_string(), "unlink finder")];
        let content = rendered(StatusBar {
            hints: &hints,
            message: None,
            mode: StatusMode::Normal,
        });

        assert!(content.contains("[q]"));
        assert!(content.contains("quit"));
        assert!(content.contains("[u]"));
        assert!(content.contains("unlink finder"));
    }

    #[test]
    fn status_bar_renders_message_when_present() {
        let hints = vec![("q".to_string(), "quit")];
        let content = rendered(StatusBar {
            hints: &hints,
            message: Some("Loading pages and aliases..."),
            mode: StatusMode::Normal,
        });

        assert!(content.contains("Loading pages and aliases..."));
        assert!(!content.contains("[q]"));
    }

    #[test]
    fn status_bar_shows_insert_mode_with_hotkey() {
        let content = rendered(StatusBar {
            hints: &[],
            message: None,
            mode: StatusMode::Insert {
                popup_hotkey: "Ctrl+m",
            },
        });

        assert!(content.contains("INSERT"));
        assert!(content.contains("Ctrl+m"));
    }

    #[test]
    fn status_bar_shows_action_mode() {
        let content = rendered(StatusBar {
            hints: &[],
            message: Some("ignored while acting"),
            mode: StatusMode::PopupActions,
        });

        assert!(content.contains("ACTIONS"));
        assert!(!content.contains("ignored"));
    }
}
