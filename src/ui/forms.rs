use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{BookId, MemberId};

/// One labelled text input.
#[derive(Clone)]
pub(crate) struct FormField {
    pub(crate) label: &'static str,
    pub(crate) value: String,
    /// Only digits are accepted when set.
    pub(crate) numeric: bool,
}

impl FormField {
    fn text(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            numeric: false,
        }
    }

    fn number(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            numeric: true,
        }
    }
}

/// Modal form state shared by the add-book, add-member and issue dialogs.
#[derive(Clone)]
pub(crate) struct Form {
    pub(crate) title: &'static str,
    pub(crate) fields: Vec<FormField>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

impl Form {
    fn new(title: &'static str, fields: Vec<FormField>) -> Self {
        Self {
            title,
            fields,
            active: 0,
            error: None,
        }
    }

    pub(crate) fn add_book() -> Self {
        Self::new(
            "Add Book",
            vec![
                FormField::text("Title"),
                FormField::text("Author"),
                FormField::text("Category"),
            ],
        )
    }

    pub(crate) fn add_member() -> Self {
        Self::new(
            "Add Member",
            vec![FormField::text("Name"), FormField::text("Email")],
        )
    }

    /// Issue dialog, pre-filled with the highlighted book when there is one.
    /// Focus starts on the member id in that case.
    pub(crate) fn issue(book_id: Option<BookId>) -> Self {
        let mut form = Self::new(
            "Issue Book",
            vec![FormField::number("Book ID"), FormField::number("Member ID")],
        );
        if let Some(id) = book_id {
            form.fields[0].value = id.to_string();
            form.active = 1;
        }
        form
    }

    pub(crate) fn next_field(&mut self) {
        self.active = (self.active + 1) % self.fields.len();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = (self.active + self.fields.len() - 1) % self.fields.len();
    }

    /// Append a character to the active field, rejecting control characters
    /// and non-digits in numeric fields.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let field = &mut self.fields[self.active];
        let accepted = if field.numeric {
            ch.is_ascii_digit()
        } else {
            !ch.is_control()
        };
        if accepted {
            field.value.push(ch);
        }
        accepted
    }

    pub(crate) fn backspace(&mut self) {
        self.fields[self.active].value.pop();
    }

    /// Trimmed, non-empty text of field `index`.
    fn required_text(&self, index: usize) -> Result<String> {
        let field = &self.fields[index];
        let value = field.value.trim();
        if value.is_empty() {
            return Err(anyhow!("{} is required.", field.label));
        }
        Ok(value.to_string())
    }

    fn required_id(&self, index: usize) -> Result<u32> {
        let field = &self.fields[index];
        let raw = self.required_text(index)?;
        raw.parse::<u32>()
            .map_err(|_| anyhow!("{} must be a whole number.", field.label))
    }

    /// Title, author, category.
    pub(crate) fn book_inputs(&self) -> Result<(String, String, String)> {
        Ok((
            self.required_text(0)?,
            self.required_text(1)?,
            self.required_text(2)?,
        ))
    }

    /// Name, email.
    pub(crate) fn member_inputs(&self) -> Result<(String, String)> {
        Ok((self.required_text(0)?, self.required_text(1)?))
    }

    pub(crate) fn issue_inputs(&self) -> Result<(BookId, MemberId)> {
        Ok((self.required_id(0)?, self.required_id(1)?))
    }

    /// Render field `index` as `Label: value`, highlighting the focused one.
    pub(crate) fn build_line(&self, index: usize) -> Line<'static> {
        let field = &self.fields[index];
        let is_active = index == self.active;

        let display = if field.value.is_empty() {
            "<required>".to_string()
        } else {
            field.value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if field.value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label)),
            Span::styled(display, style),
        ])
    }

    /// Cursor column offset within the form for the active field.
    pub(crate) fn cursor_offset(&self) -> (u16, u16) {
        let field = &self.fields[self.active];
        let x = field.label.len() + 2 + field.value.chars().count();
        (x as u16, self.active as u16)
    }
}
