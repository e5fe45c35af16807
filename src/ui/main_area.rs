use std::collections::HashMap;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

use crate::api::types::{Block, PageTree};
use crate::edit_buffer::EditBuffer;
use crate::markdown;
use roam_assistant::unlink::{segments_to_spans, Segmentation};

pub struct MainArea<'a> {
    pub page: Option<&'a PageTree>,
    pub selected_block: usize,
    pub loading: bool,
    pub edit_info: Option<EditInfo<'a>>,
    /// Unlinked-mention highlighting by block uid; empty while the finder is closed.
    pub highlights: &'a HashMap<String, Segmentation>,
}

pub struct EditInfo<'a> {
    pub buffer: &'a EditBuffer,
    pub block_index: usize,
    /// Popup rows drawn right under the edited block.
    pub popup: Vec<Line<'static>>,
}

#[derive(Debug, Clone)]
enum VisibleLine<'a> {
    PageHeading(String),
    Block {
        depth: usize,
        block: &'a Block,
        block_index: usize,
        collapsed_children: usize,
    },
}

fn build_visible_lines(page: &PageTree) -> Vec<VisibleLine<'_>> {
    let mut lines = vec![VisibleLine::PageHeading(page.title.clone())];
    let mut block_index = 0;
    flatten_blocks(&page.blocks, 0, &mut lines, &mut block_index);
    lines
}

fn flatten_blocks<'a>(
    blocks: &'a [Block],
    depth: usize,
    lines: &mut Vec<VisibleLine<'a>>,
    block_index: &mut usize,
) {
    for block in blocks {
        let collapsed_children = if !block.open && !block.children.is_empty() {
            block.children.len()
        } else {
            0
        };
        lines.push(VisibleLine::Block {
            depth,
            block,
            block_index: *block_index,
            collapsed_children,
        });
        *block_index += 1;
        if block.open {
            flatten_blocks(&block.children, depth + 1, lines, block_index);
        }
    }
}

fn render_centered_message(msg: &str, area: Rect, buf: &mut Buffer) {
    if area.height > 0 {
        let line = Line::styled(msg, Style::default().fg(Color::DarkGray));
        let y = area.y + area.height / 2;
        let render_area = Rect::new(area.x, y, area.width, 1);
        line.render(render_area, buf);
    }
}

/// Block text as spans: the finder's segmentation when there is one,
/// otherwise plain text with links tinted.
fn block_spans(
    block: &Block,
    highlights: &HashMap<String, Segmentation>,
    style: Style,
) -> Vec<Span<'static>> {
    if let Some(segmentation) = highlights.get(&block.uid) {
        return segments_to_spans(segmentation.segments(), style);
    }
    markdown::split_links(&block.string)
        .into_iter()
        .map(|run| {
            if run.is_link {
                Span::styled(run.text, style.fg(Color::Cyan))
            } else {
                Span::styled(run.text, style)
            }
        })
        .collect()
}

/// Rebuilds spans from (char, Style) pairs, merging runs of equal style.
fn chars_to_spans(chars: &[(char, Style)]) -> Vec<Span<'static>> {
    if chars.is_empty() {
        return vec![];
    }
    let mut spans = Vec::new();
    let mut current_text = String::new();
    let mut current_style = chars[0].1;

    for &(ch, style) in chars {
        if style == current_style {
            current_text.push(ch);
        } else {
            spans.push(Span::styled(current_text.clone(), current_style));
            current_text.clear();
            current_text.push(ch);
            current_style = style;
        }
    }
    if !current_text.is_empty() {
        spans.push(Span::styled(current_text, current_style));
    }
    spans
}

fn styled_chars(spans: &[Span<'static>]) -> Vec<(char, Style)> {
    spans
        .iter()
        .flat_map(|s| s.content.chars().map(move |c| (c, s.style)))
        .collect()
}

/// Splits styled text on `\n` into one span list per text line.
fn split_newlines(chars: &[(char, Style)]) -> Vec<Vec<Span<'static>>> {
    chars
        .split(|(c, _)| *c == '\n')
        .map(chars_to_spans)
        .collect()
}

/// Word-wraps styled spans. `first_width` applies to the first visual line,
/// `cont_width` to the rest. Breaks after a space when possible.
fn wrap_spans(
    spans: Vec<Span<'static>>,
    first_width: usize,
    cont_width: usize,
) -> Vec<Vec<Span<'static>>> {
    let first_width = first_width.max(1);
    let cont_width = cont_width.max(1);

    let chars = styled_chars(&spans);
    let total_chars = chars.len();

    if total_chars <= first_width {
        return vec![spans];
    }

    let mut result = Vec::new();
    let mut pos = 0;
    let mut is_first = true;

    while pos < total_chars {
        let width = if is_first { first_width } else { cont_width };
        let remaining = total_chars - pos;

        if remaining <= width {
            result.push(chars_to_spans(&chars[pos..]));
            break;
        }

        let end = pos + width;
        let break_at = chars[pos..end]
            .iter()
            .rposition(|&(c, _)| c == ' ')
            .map(|offset| pos + offset + 1)
            .unwrap_or(end);

        result.push(chars_to_spans(&chars[pos..break_at]));
        pos = break_at;
        is_first = false;
    }

    result
}

/// Styles the edit buffer: selected chars in blue, the caret inverted.
fn edit_chars(buffer: &EditBuffer, base: Style) -> Vec<(char, Style)> {
    let selection = buffer.selection();
    let selected = Style::default().fg(Color::White).bg(Color::Blue);
    let caret = Style::default().fg(Color::Black).bg(Color::White);

    let mut out = Vec::with_capacity(buffer.chars.len() + 1);
    for (i, &ch) in buffer.chars.iter().enumerate() {
        if i == buffer.cursor && !buffer.has_selection() {
            if ch == '\n' {
                out.push((' ', caret));
                out.push(('\n', base));
            } else {
                out.push((ch, caret));
            }
        } else if i >= selection.start && i < selection.end {
            out.push((ch, selected));
        } else {
            out.push((ch, base));
        }
    }
    if buffer.cursor >= buffer.chars.len() && !buffer.has_selection() {
        out.push((' ', caret));
    }
    out
}

impl<'a> Widget for MainArea<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.loading {
            render_centered_message(" Loading...", area, buf);
            return;
        }

        let Some(page) = self.page else {
            render_centered_message(" Nothing loaded", area, buf);
            return;
        };

        let visible_lines = build_visible_lines(page);
        let max_width = area.width as usize;

        // Phase 1: build visual rows; a block may span several
        let mut rows: Vec<Line<'static>> = Vec::new();
        let mut selected_row: usize = 0;

        for vline in &visible_lines {
            match vline {
                VisibleLine::PageHeading(title) => {
                    let text: String = format!("  {}", title).chars().take(max_width).collect();
                    rows.push(Line::styled(
                        text,
                        Style::default()
                            .fg(Color::White)
                            .add_modifier(Modifier::BOLD),
                    ));
                }
                VisibleLine::Block {
                    depth,
                    block,
                    block_index,
                    collapsed_children,
                } => {
                    let indent = "  ".repeat(depth + 1);
                    let is_selected = *block_index == self.selected_block;
                    if is_selected {
                        selected_row = rows.len();
                    }

                    let editing = self
                        .edit_info
                        .as_ref()
                        .filter(|e| e.block_index == *block_index);

                    let mut style = if is_selected {
                        Style::default().fg(Color::White).bg(Color::DarkGray)
                    } else {
                        Style::default().fg(Color::Gray)
                    };
                    if !is_selected && *depth >= 3 {
                        style = style.add_modifier(Modifier::DIM);
                    }

                    let chars = match editing {
                        Some(edit) => edit_chars(edit.buffer, style),
                        None => styled_chars(&block_spans(block, self.highlights, style)),
                    };

                    let bullet = if *collapsed_children > 0 { "▸" } else { "•" };
                    let prefix = format!("{}{} ", indent, bullet);
                    let cont_prefix = format!("{}  ", indent);
                    let first_w = max_width.saturating_sub(prefix.chars().count());
                    let cont_w = max_width.saturating_sub(cont_prefix.chars().count());

                    let mut is_first_row = true;
                    for text_line in split_newlines(&chars) {
                        let w = if is_first_row { first_w } else { cont_w };
                        for wline in wrap_spans(text_line, w, cont_w) {
                            let lead = if is_first_row {
                                Span::styled(prefix.clone(), style)
                            } else {
                                Span::styled(cont_prefix.clone(), style)
                            };
                            let mut full_spans = vec![lead];
                            full_spans.extend(wline);
                            if is_first_row && *collapsed_children > 0 {
                                full_spans.push(Span::styled(
                                    format!(" [{}]", collapsed_children),
                                    Style::default().fg(Color::DarkGray),
                                ));
                            }
                            rows.push(Line::from(full_spans));
                            is_first_row = false;
                        }
                    }

                    if let Some(edit) = editing {
                        rows.extend(edit.popup.iter().cloned());
                    }
                }
            }
        }

        // Phase 2: scroll, keeping the selected block near the middle
        let viewport_height = area.height as usize;
        let half = viewport_height / 2;
        let scroll_offset = if selected_row > half {
            (selected_row - half).min(rows.len().saturating_sub(viewport_height))
        } else {
            0
        };

        // Phase 3: draw
        for (i, row) in rows.into_iter().skip(scroll_offset).enumerate() {
            if i >= viewport_height {
                break;
            }
            let y = area.y + i as u16;
            row.render(Rect::new(area.x, y, area.width, 1), buf);
        }
    }
}
