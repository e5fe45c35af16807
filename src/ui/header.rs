use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

use roam_assistant::unlink::LegendEntry;

/// Top bar. While the unlink finder is open its legend sits between the
/// graph name and the page title.
pub struct Header<'a> {
    pub graph_name: &'a str,
    pub title: &'a str,
    pub legend: Option<&'a [LegendEntry]>,
}

impl<'a> Widget for Header<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg = Style::default().bg(Color::DarkGray);
        let mut spans = vec![
            Span::styled(
                " roam-assistant ",
                Style::default()
                    .fg(Color::White)
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" [{}] ", self.graph_name),
                Style::default().fg(Color::Cyan).bg(Color::DarkGray),
            ),
        ];

        if let Some(entries) = self.legend {
            for entry in entries {
                spans.push(Span::styled(format!(" {} ", entry.label), entry.style));
                spans.push(Span::styled(" ", bg));
            }
        }

        let used: usize = spans.iter().map(|s| s.width()).sum();
        let title_width = self.title.chars().count() as u16 + 1;
        let spacer_len = area.width.saturating_sub(used as u16 + title_width);
        spans.push(Span::styled(" ".repeat(spacer_len as usize), bg));
        spans.push(Span::styled(
            format!("{} ", self.title),
            Style::default().fg(Color::Gray).bg(Color::DarkGray),
        ));

        Line::from(spans).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roam_assistant::unlink::legend_entries;

    fn row(buf: &Buffer, width: u16) -> String {
        (0..width)
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
    fn header_renders_graph_name_and_title() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);

        let header = Header {
            graph_name: "my-graph",
            title: "Oct 18, 2026",
            legend: None,
        };
        header.render(area, &mut buf);

        let content = row(&buf, area.width);
        assert!(content.contains("roam-assistant"));
        assert!(content.contains("my-graph"));
        assert!(content.contains("Oct 18, 2026"));
        assert!(!content.contains("Exact"));
    }

    #[test]
    fn header_shows_legend_when_finder_is_open() {
        let area = Rect::new(0, 0, 120, 1);
        let mut buf = Buffer::empty(area);
        let entries = legend_entries();

        let header = Header {
            graph_name: "g",
            title: "Page",
            legend: Some(&entries),
        };
        header.render(area, &mut buf);

        let content = row(&buf, area.width);
        for entry in &entries {
            assert!(content.contains(entry.label), "missing {}", entry.label);
        }
        let x = content.find(entries[0].label).unwrap() as u16;
        assert_eq!(buf.cell((x, 0)).unwrap().bg, entries[0].style.bg.unwrap());
    }
}
