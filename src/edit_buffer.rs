use roam_assistant::popup::SelectionRange;

/// Text of the block being edited. Positions are char indices; `anchor` is
/// the fixed end of a selection while Shift is held.
#[derive(Debug, Clone, PartialEq)]
pub struct EditBuffer {
    pub chars: Vec<char>,
    pub cursor: usize,
    pub anchor: Option<usize>,
}

impl EditBuffer {
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let cursor = chars.len();
        Self {
            chars,
            cursor,
            anchor: None,
        }
    }

    pub fn to_string(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn selection(&self) -> SelectionRange {
        match self.anchor {
            Some(anchor) => SelectionRange::new(anchor.min(self.cursor), anchor.max(self.cursor)),
            None => SelectionRange::caret(self.cursor),
        }
    }

    pub fn has_selection(&self) -> bool {
        self.anchor.is_some_and(|a| a != self.cursor)
    }

    /// Replaces the whole text, e.g. after an action rewrote the block.
    pub fn set_text(&mut self, text: &str, selection: SelectionRange) {
        self.chars = text.chars().collect();
        self.set_selection(selection);
    }

    pub fn set_selection(&mut self, selection: SelectionRange) {
        let len = self.chars.len();
        self.cursor = selection.end.min(len);
        let start = selection.start.min(len);
        self.anchor = (start != self.cursor).then_some(start);
    }

    fn delete_selection(&mut self) -> bool {
        if !self.has_selection() {
            self.anchor = None;
            return false;
        }
        let range = self.selection();
        self.chars.drain(range.start..range.end);
        self.cursor = range.start;
        self.anchor = None;
        true
    }

    pub fn insert_char(&mut self, ch: char) {
        self.delete_selection();
        self.chars.insert(self.cursor, ch);
        self.cursor += 1;
    }

    pub fn delete_back(&mut self) {
        if self.delete_selection() {
            return;
        }
        if self.cursor > 0 {
            self.cursor -= 1;
            self.chars.remove(self.cursor);
        }
    }

    pub fn delete_forward(&mut self) {
        if self.delete_selection() {
            return;
        }
        if self.cursor < self.chars.len() {
            self.chars.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        self.anchor = None;
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.anchor = None;
        if self.cursor < self.chars.len() {
            self.cursor += 1;
        }
    }

    pub fn select_left(&mut self) {
        self.anchor.get_or_insert(self.cursor);
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn select_right(&mut self) {
        self.anchor.get_or_insert(self.cursor);
        if self.cursor < self.chars.len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.anchor = None;
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.anchor = None;
        self.cursor = self.chars.len();
    }

    pub fn move_word_left(&mut self) {
        self.anchor = None;
        while self.cursor > 0 && self.chars[self.cursor - 1].is_whitespace() {
            self.cursor -= 1;
        }
        while self.cursor > 0 && !self.chars[self.cursor - 1].is_whitespace() {
            self.cursor -= 1;
        }
    }

    pub fn move_word_right(&mut self) {
        self.anchor = None;
        let len = self.chars.len();
        while self.cursor < len && !self.chars[self.cursor].is_whitespace() {
            self.cursor += 1;
        }
        while self.cursor < len && self.chars[self.cursor].is_whitespace() {
            self.cursor += 1;
        }
    }
}
