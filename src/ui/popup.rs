use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use roam_assistant::popup::{ActionKind, PopupView};

pub const POPUP_TITLE: &str = "Related Blocks";

/// Lines drawn under the block being edited. `width` is the space left
/// after `indent`.
pub fn popup_lines(
    view: &PopupView,
    hotkey: &str,
    indent: &str,
    width: usize,
) -> Vec<Line<'static>> {
    let frame = |action_mode: bool| {
        Style::default().fg(if action_mode {
            Color::Magenta
        } else {
            Color::DarkGray
        })
    };
    let row = |content: Vec<Span<'static>>, action_mode: bool| {
        let mut spans = vec![
            Span::raw(indent.to_string()),
            Span::styled("┆ ", frame(action_mode)),
        ];
        spans.extend(content);
        Line::from(spans)
    };
    let text_width = width.saturating_sub(2);
    let dim = Style::default().fg(Color::DarkGray);

    match view {
        PopupView::Hidden => vec![],
        PopupView::NoAlgorithms => vec![row(
            vec![Span::styled(
                fit(
                    "No search algorithms set up. Add one under [[algorithms]] in config.toml",
                    text_width,
                ),
                Style::default().fg(Color::Yellow),
            )],
            false,
        )],
        PopupView::Searching => vec![row(vec![Span::styled("Searching...", dim)], false)],
        PopupView::Results {
            items,
            action_mode,
            armed,
        } => {
            let action_mode = *action_mode;
            let hint = if action_mode {
                "1-9 alias, Ctrl+1-9 more actions".to_string()
            } else {
                format!("Hit {} to switch focus", hotkey)
            };
            let mut lines = vec![row(
                vec![
                    Span::styled(
                        POPUP_TITLE,
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(format!("  {}", hint), dim),
                ],
                action_mode,
            )];

            if items.is_empty() {
                lines.push(row(vec![Span::styled("No related blocks", dim)], action_mode));
                return lines;
            }

            for (i, item) in items.iter().enumerate() {
                let marker = if action_mode {
                    format!("{}. ", i + 1)
                } else {
                    "· ".to_string()
                };
                let is_armed = *armed == Some(i);
                let style = if is_armed {
                    Style::default().fg(Color::White).bg(Color::DarkGray)
                } else {
                    Style::default().fg(Color::Gray)
                };
                let body = fit(
                    &item.text.replace('\n', " "),
                    text_width.saturating_sub(marker.chars().count()),
                );
                lines.push(row(
                    vec![
                        Span::styled(marker, Style::default().fg(Color::Cyan)),
                        Span::styled(body, style),
                    ],
                    action_mode,
                ));
                if is_armed {
                    lines.push(row(action_row(), action_mode));
                }
            }
            lines
        }
    }
}

fn action_row() -> Vec<Span<'static>> {
    let mut spans = vec![Span::raw("   ")];
    for kind in ActionKind::ALL {
        spans.push(Span::styled(
            format!("[{}]", kind.glyph()),
            Style::default().fg(Color::Yellow),
        ));
        spans.push(Span::styled(
            format!(" {}  ", kind.label()),
            Style::default().fg(Color::Gray),
        ));
    }
    spans
}

fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let head: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roam_assistant::popup::ResultItem;

    fn text(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    fn results(action_mode: bool, armed: Option<usize>) -> PopupView {
        PopupView::Results {
            items: vec![
                ResultItem {
                    uid: "a".into(),
                    text: "I like apple pie".into(),
                },
                ResultItem {
                    uid: "b".into(),
                    text: "banana bread".into(),
                },
            ],
            action_mode,
            armed,
        }
    }

    #[test]
    fn hidden_popup_draws_nothing() {
        assert!(popup_lines(&PopupView::Hidden, "Ctrl+m", "", 40).is_empty());
    }

    #[test]
    fn results_show_title_hotkey_hint_and_items() {
        let lines = text(&popup_lines(&results(false, None), "Ctrl+m", "  ", 60));
        assert!(lines[0].contains(POPUP_TITLE));
        assert!(lines[0].contains("Hit Ctrl+m to switch focus"));
        assert!(lines[1].contains("I like apple pie"));
        assert!(lines[2].contains("banana bread"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn action_mode_numbers_results() {
        let lines = text(&popup_lines(&results(true, None), "Ctrl+m", "", 60));
        assert!(lines[1].contains("1. I like apple pie"));
        assert!(lines[2].contains("2. banana bread"));
    }

    #[test]
    fn armed_result_lists_action_glyphs() {
        let lines = text(&popup_lines(&results(true, Some(1)), "Ctrl+m", "", 200));
        assert_eq!(lines.len(), 4);
        for kind in ActionKind::ALL {
            assert!(lines[3].contains(&format!("[{}]", kind.glyph())));
        }
    }

    #[test]
    fn no_algorithms_points_at_config() {
        let lines = text(&popup_lines(&PopupView::NoAlgorithms, "Ctrl+m", "", 200));
        assert!(lines[0].contains("config.toml"));
    }

    #[test]
    fn long_items_are_cut_to_width() {
        let view = PopupView::Results {
            items: vec![ResultItem {
                uid: "x".into(),
                text: "x".repeat(100),
            }],
            action_mode: false,
            armed: None,
        };
        let lines = popup_lines(&view, "Ctrl+m", "", 30);
        assert!(lines[1].width() <= 30);
    }
}
