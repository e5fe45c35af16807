//! Just enough of Roam's inline syntax to tell links apart from plain text.

use std::collections::HashSet;

/// A contiguous piece of block text. `offset` is a byte offset into the block string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub offset: usize,
    pub is_link: bool,
}

/// Extract page names from `[[...]]`, `#[[...]]` and `#tag` links in block text.
///
/// Returns a deduplicated list of page names in order of first appearance.
pub fn extract_page_links(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut links = Vec::new();
    let mut seen = HashSet::new();
    let mut i = 0;

    while i < chars.len() {
        match scan_link(&chars, i) {
            Some((end, Some(name))) => {
                if !name.is_empty() && seen.insert(name.clone()) {
                    links.push(name);
                }
                i = end;
            }
            Some((end, None)) => i = end,
            None => i += 1,
        }
    }

    links
}

/// Splits block text into alternating plain-text and link runs.
pub fn split_links(text: &str) -> Vec<Run> {
    let indexed: Vec<(usize, char)> = text.char_indices().collect();
    let chars: Vec<char> = indexed.iter().map(|(_, c)| *c).collect();
    let byte_at = |i: usize| indexed.get(i).map(|(b, _)| *b).unwrap_or(text.len());

    let mut runs = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;

    while i < chars.len() {
        if let Some((end, _)) = scan_link(&chars, i) {
            if plain_start < i {
                runs.push(Run {
                    text: text[byte_at(plain_start)..byte_at(i)].to_string(),
                    offset: byte_at(plain_start),
                    is_link: false,
                });
            }
            runs.push(Run {
                text: text[byte_at(i)..byte_at(end)].to_string(),
                offset: byte_at(i),
                is_link: true,
            });
            i = end;
            plain_start = end;
        } else {
            i += 1;
        }
    }

    if plain_start < chars.len() {
        runs.push(Run {
            text: text[byte_at(plain_start)..].to_string(),
            offset: byte_at(plain_start),
            is_link: false,
        });
    }
    runs
}

/// Recognises a link-like construct starting at `i`. Returns the char index
/// just past it and, for page links, the linked page name.
fn scan_link(chars: &[char], i: usize) -> Option<(usize, Option<String>)> {
    let len = chars.len();
    let at = |j: usize, c: char| j < len && chars[j] == c;

    // `inline code` is opaque
    if chars[i] == '`' {
        let end = find_single_delimiter(chars, i + 1, '`')?;
        return Some((end + 1, None));
    }

    if chars[i] == '#' && at(i + 1, '[') && at(i + 2, '[') {
        let end = find_double_delimiter(chars, i + 3, ']')?;
        return Some((end + 2, Some(chars[i + 3..end].iter().collect())));
    }

    if chars[i] == '#' && (i == 0 || chars[i - 1].is_whitespace()) {
        let end = (i + 1..len)
            .find(|&j| !is_tag_char(chars[j]))
            .unwrap_or(len);
        if end > i + 1 {
            return Some((end, Some(chars[i + 1..end].iter().collect())));
        }
        return None;
    }

    if chars[i] == '[' && at(i + 1, '[') {
        let end = find_double_delimiter(chars, i + 2, ']')?;
        return Some((end + 2, Some(chars[i + 2..end].iter().collect())));
    }

    if chars[i] == '(' && at(i + 1, '(') {
        let end = find_double_delimiter(chars, i + 2, ')')?;
        return Some((end + 2, None));
    }

    // [label](target), including the `[](((uid)))` alias form
    if chars[i] == '[' {
        let close = find_single_delimiter(chars, i + 1, ']')?;
        if !at(close + 1, '(') {
            return None;
        }
        let end = find_balanced_paren(chars, close + 1)?;
        return Some((end + 1, None));
    }

    None
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '/')
}

fn find_single_delimiter(chars: &[char], start: usize, delim: char) -> Option<usize> {
    (start..chars.len()).find(|&j| chars[j] == delim)
}

fn find_double_delimiter(chars: &[char], start: usize, delim: char) -> Option<usize> {
    (start..chars.len().saturating_sub(1)).find(|&j| chars[j] == delim && chars[j + 1] == delim)
}

fn find_balanced_paren(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (j, &c) in chars.iter().enumerate().skip(open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(j);
                }
            }
            _ => {}
        }
    }
    None
}
