//! Domain models shared by the record store, the flat-file codec, and the
//! TUI. These stay plain data holders; the rules about who may hold which
//! book live in `library`.

use std::collections::BTreeSet;
use std::fmt;

/// Catalog number of a book. Books are numbered from 101 upwards.
pub type BookId = u32;
/// Membership number. Members are numbered from 1 upwards.
pub type MemberId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A single catalog entry.
pub struct Book {
    /// Assigned by the store and never reused.
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub category: String,
    /// True while exactly one member holds the book.
    pub issued: bool,
}

impl Book {
    /// Build an unissued book.
    pub fn new(
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
            category: category.into(),
            issued: false,
        }
    }

    /// Case-insensitive substring match against title, author and category.
    /// `needle` must already be lowercase.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.author.to_lowercase().contains(needle)
            || self.category.to_lowercase().contains(needle)
    }

    /// Short status label used in listings.
    pub fn status_label(&self) -> &'static str {
        if self.issued {
            "Issued"
        } else {
            "Available"
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.title, self.author)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A library member and the books they currently hold.
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    /// Ordered so the persisted list and the UI are deterministic.
    pub issued_books: BTreeSet<BookId>,
}

impl Member {
    /// Build a member holding nothing.
    pub fn new(id: MemberId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            issued_books: BTreeSet::new(),
        }
    }

    /// Comma separated issued ids for display, `-` when empty.
    pub fn issued_summary(&self) -> String {
        if self.issued_books.is_empty() {
            return "-".to_string();
        }
        self.issued_books
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Ordering offered by `Library::sort_books`.
pub enum SortCriterion {
    Title,
    Author,
}

impl SortCriterion {
    /// Key the books are compared by, lowercased.
    pub(crate) fn key(self, book: &Book) -> String {
        match self {
            SortCriterion::Title => book.title.to_lowercase(),
            SortCriterion::Author => book.author.to_lowercase(),
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortCriterion::Title => write!(f, "title"),
            SortCriterion::Author => write!(f, "author"),
        }
    }
}
