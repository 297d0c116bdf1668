use crate::domain::traits::KeyboardButton;

/// Outgoing message: text plus an optional inline keyboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Vec<Vec<KeyboardButton>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Vec::new(),
        }
    }

    /// Append a row of buttons
    pub fn with_row(mut self, row: Vec<KeyboardButton>) -> Self {
        self.keyboard.push(row);
        self
    }

    pub fn has_keyboard(&self) -> bool {
        self.keyboard.iter().any(|row| !row.is_empty())
    }
}
