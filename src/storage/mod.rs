//! Flat-file persistence split across logical submodules: one line codec per
//! record kind plus the file handling that ties them together.
//!
//! Values are written raw. A field containing a `,` or a line break cannot
//! survive a save/load round-trip; callers are warned through
//! [`is_unescapable`] but the value is stored as given.

mod books;
mod files;
mod members;

pub use books::{format_book_line, parse_book_line};
pub use files::{FlatFileStorage, BOOKS_FILE_NAME, MEMBERS_FILE_NAME};
pub use members::{format_member_line, parse_member_line};

/// Separator between the fields of one record.
pub(crate) const FIELD_SEPARATOR: char = ',';
/// Separator between book ids in a member's issued list.
pub(crate) const ID_SEPARATOR: char = ';';
/// Literal written for a member holding no books.
pub(crate) const NO_ISSUED_BOOKS: &str = "none";

/// True when `value` would break the line format if written raw.
pub fn is_unescapable(value: &str) -> bool {
    value.contains(FIELD_SEPARATOR) || value.contains('\n') || value.contains('\r')
}
