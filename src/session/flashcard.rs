use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardState {
    pub index: usize,
    pub show_answer: bool,
}

impl FlashcardState {
    pub fn flip(&mut self) {
        self.show_answer = !self.show_answer;
    }

    pub fn next(&mut self, len: usize) {
        self.show_answer = false;
        if len > 0 {
            self.index = (self.index + 1) % len;
        }
    }

    pub fn prev(&mut self, len: usize) {
        self.show_answer = false;
        if len > 0 {
            self.index = (self.index % len + len - 1) % len;
        }
    }

    /// Keeps the index inside a list that may have shrunk.
    pub fn clamp(&mut self, len: usize) {
        if self.index >= len {
            self.index = 0;
        }
    }
}
