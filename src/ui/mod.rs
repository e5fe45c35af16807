pub mod header;
pub mod main_area;
pub mod popup;
pub mod sidebar;
pub mod status_bar;

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block as WidgetBlock, BorderType, Borders, Clear};
use ratatui::Frame;

use crate::app::AppState;
use crate::error::ErrorPopup;

use header::Header;
use main_area::{EditInfo, MainArea};
use sidebar::Sidebar;
use status_bar::{StatusBar, StatusMode};

pub fn render(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .split(frame.area());

    let title = state
        .page
        .as_ref()
        .map(|p| p.title.as_str())
        .unwrap_or(&state.date_display);
    let legend = state.legend.handle().map(|h| h.entries());
    let header = Header {
        graph_name: &state.graph_name,
        title,
        legend: legend.as_deref(),
    };
    frame.render_widget(header, chunks[0]);

    let (main_rect, side_rect) = if state.show_sidebar {
        let cols = Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[1]);
        (cols[0], Some(cols[1]))
    } else {
        (chunks[1], None)
    };

    let edit_info = state.input_mode.editing().map(|edit| {
        let depth = state
            .page
            .as_ref()
            .and_then(|p| crate::app::resolve_block_at_index(&p.blocks, state.selected_block))
            .map(|info| info.depth)
            .unwrap_or(0);
        let indent = "  ".repeat(depth + 2);
        let width = (main_rect.width as usize).saturating_sub(indent.len());
        EditInfo {
            buffer: &edit.buffer,
            block_index: state.selected_block,
            popup: popup::popup_lines(
                &edit.popup.view(),
                &state.popup_settings.hotkey,
                &indent,
                width,
            ),
        }
    });

    let main = MainArea {
        page: state.page.as_ref(),
        selected_block: state.selected_block,
        loading: state.loading,
        edit_info,
        highlights: &state.highlights,
    };
    frame.render_widget(main, main_rect);

    if let Some(rect) = side_rect {
        frame.render_widget(
            Sidebar {
                pages: &state.sidebar,
            },
            rect,
        );
    }

    if state.show_help {
        render_help_popup(frame, &state.hints, chunks[1]);
    }

    if let Some(err) = &state.error_popup {
        render_error_popup(frame, err, chunks[1]);
    }

    let mode = match state.input_mode.editing() {
        Some(edit) if edit.popup.is_action_mode() => StatusMode::PopupActions,
        Some(_) => StatusMode::Insert {
            popup_hotkey: &state.popup_settings.hotkey,
        },
        None => StatusMode::Normal,
    };
    let status = StatusBar {
        hints: &state.hints,
        message: state.status_message.as_deref(),
        mode,
    };
    frame.render_widget(status, chunks[2]);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Draws a bordered box with `lines` at the top and a close hint on the
/// last row.
fn render_modal(frame: &mut Frame, rect: Rect, title: String, border: Color, lines: Vec<Line>) {
    frame.render_widget(Clear, rect);
    let block = WidgetBlock::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
        .title(title);
    let inner = block.inner(rect);
    frame.render_widget(block, rect);
    if inner.height == 0 {
        return;
    }

    let body_rows = inner.height - 1;
    for (i, line) in lines.into_iter().take(body_rows as usize).enumerate() {
        frame.render_widget(line, Rect::new(inner.x, inner.y + i as u16, inner.width, 1));
    }
    frame.render_widget(
        Line::styled("Press any key to close", Style::default().fg(Color::DarkGray)),
        Rect::new(inner.x, inner.y + body_rows, inner.width, 1),
    );
}

fn render_help_popup(frame: &mut Frame, hints: &[(String, &str)], area: Rect) {
    let width = (area.width * 60 / 100).max(30);
    let rect = centered(area, width, hints.len() as u16 + 3);
    let lines = hints
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(format!("{:>12}", key), Style::default().fg(Color::Yellow)),
                Span::raw("  "),
                Span::styled(*action, Style::default().fg(Color::White)),
            ])
        })
        .collect();
    render_modal(frame, rect, " Help ".to_string(), Color::Cyan, lines);
}

fn render_error_popup(frame: &mut Frame, popup: &ErrorPopup, area: Rect) {
    let width = (area.width * 50 / 100).max(30).min(area.width);
    let text_width = width.saturating_sub(2) as usize;

    let mut lines = vec![Line::raw("")];
    lines.extend(
        wrap_text(&popup.message, text_width)
            .into_iter()
            .map(|l| Line::styled(l, Style::default().fg(Color::White))),
    );
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        popup.hint.clone(),
        Style::default().fg(Color::DarkGray),
    ));
    lines.push(Line::raw(""));

    // borders and the close hint
    let rect = centered(area, width, lines.len() as u16 + 3);
    render_modal(
        frame,
        rect,
        format!(" ! {} ", popup.title),
        Color::Red,
        lines,
    );
}

fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = current.chars().count() + 1 + word.chars().count();
        if !current.is_empty() && max_width > 0 && needed > max_width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_helpers::{editing_state, test_state};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use roam_assistant::search::SearchCandidate;

    fn draw(state: &AppState) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal.draw(|frame| render(frame, state)).unwrap();
        let buf = terminal.backend().buffer().clone();
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf.cell((x, y)).unwrap().symbol().to_string())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn renders_page_title_and_blocks() {
        let screen = draw(&test_state());
        assert!(screen[0].contains("October 18th, 2026"));
        assert!(screen.iter().any(|l| l.contains("Block two")));
    }

    #[test]
    fn popup_appears_under_edited_block() {
        let mut state = editing_state("b1", "x");
        let edit = state.input_mode.editing_mut().unwrap();
        edit.popup.on_text_change("x");
        edit.popup
            .on_search_complete("x".into(), vec![SearchCandidate::new("z", "x marks the spot")]);

        let screen = draw(&state);
        let block_row = screen.iter().position(|l| l.contains("• x")).unwrap();
        assert!(screen[block_row + 1].contains(popup::POPUP_TITLE));
        assert!(screen[block_row + 2].contains("x marks the spot"));
        assert!(screen[11].contains("INSERT"));
    }

    #[test]
    fn error_popup_is_drawn_over_content() {
        let mut state = test_state();
        state.error_popup = Some(ErrorPopup {
            title: "Custom Algorithm Failed".into(),
            message: "script exited with status 3".into(),
            hint: "Fix the algorithm in config.toml".into(),
        });
        let screen = draw(&state);
        assert!(screen.iter().any(|l| l.contains("Custom Algorithm Failed")));
        assert!(screen.iter().any(|l| l.contains("status 3")));
    }

    #[test]
    fn wrap_text_breaks_on_words() {
        assert_eq!(wrap_text("aa bb cc", 5), vec!["aa bb", "cc"]);
        assert_eq!(wrap_text("", 5), vec![String::new()]);
    }
}
