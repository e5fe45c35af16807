use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block as WidgetBlock, Borders, Widget};

use crate::api::types::{Block, PageTree};

/// Pages and blocks opened to the side, newest first.
pub struct Sidebar<'a> {
    pub pages: &'a [PageTree],
}

fn push_blocks(blocks: &[Block], depth: usize, width: usize, rows: &mut Vec<Line<'static>>) {
    for block in blocks {
        let text = format!("{}• {}", "  ".repeat(depth), block.string.replace('\n', " "));
        rows.push(Line::styled(
            text.chars().take(width).collect::<String>(),
            Style::default().fg(Color::Gray),
        ));
        if block.open {
            push_blocks(&block.children, depth + 1, width, rows);
        }
    }
}

impl<'a> Widget for Sidebar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let frame = WidgetBlock::default()
            .borders(Borders::LEFT)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Sidebar ");
        let inner = frame.inner(area);
        frame.render(area, buf);

        let width = inner.width as usize;
        let mut rows = Vec::new();
        if self.pages.is_empty() {
            rows.push(Line::styled(
                "Nothing open",
                Style::default().fg(Color::DarkGray),
            ));
        }
        for page in self.pages {
            rows.push(Line::styled(
                page.title.chars().take(width).collect::<String>(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
            push_blocks(&page.blocks, 1, width, &mut rows);
            rows.push(Line::raw(""));
        }

        for (i, row) in rows.into_iter().take(inner.height as usize).enumerate() {
            row.render(Rect::new(inner.x, inner.y + i as u16, inner.width, 1), buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(buf: &Buffer, area: Rect) -> Vec<String> {
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| {
                        buf.cell((x, y))
                            .unwrap()
                            .symbol()
                            .chars()
                            .next()
                            .unwrap_or(' ')
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn lists_opened_pages_with_blocks() {
        let page = PageTree {
            uid: "z".into(),
            title: "Zettel".into(),
            blocks: vec![Block {
                uid: "c".into(),
                string: "a child".into(),
                order: 0,
                children: vec![],
                open: true,
            }],
        };
        let area = Rect::new(0, 0, 30, 6);
        let mut buf = Buffer::empty(area);
        Sidebar { pages: &[page] }.render(area, &mut buf);

        let lines = read_all(&buf, area);
        assert!(lines.iter().any(|l| l.contains("Zettel")));
        assert!(lines.iter().any(|l| l.contains("• a child")));
    }

    #[test]
    fn empty_sidebar_says_so() {
        let area = Rect::new(0, 0, 30, 4);
        let mut buf = Buffer::empty(area);
        Sidebar { pages: &[] }.render(area, &mut buf);
        assert!(read_all(&buf, area).iter().any(|l| l.contains("Nothing open")));
    }
}
