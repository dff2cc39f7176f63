use crate::models::{Book, BookId};

use super::FIELD_SEPARATOR;

/// Number of fields in a `books.txt` line.
const BOOK_FIELDS: usize = 5;

/// Decode `id,title,author,category,issued`. The error string describes what
/// was wrong; the caller attaches the file and line number.
pub fn parse_book_line(line: &str) -> Result<Book, String> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() != BOOK_FIELDS {
        return Err(format!(
            "expected {BOOK_FIELDS} fields, found {}",
            fields.len()
        ));
    }

    let id = parse_book_id(fields[0])?;
    let issued = match fields[4] {
        "true" => true,
        "false" => false,
        other => return Err(format!("issued flag must be true or false, found '{other}'")),
    };

    Ok(Book {
        id,
        title: fields[1].to_string(),
        author: fields[2].to_string(),
        category: fields[3].to_string(),
        issued,
    })
}

/// Encode a book as one line, without the trailing newline.
pub fn format_book_line(book: &Book) -> String {
    format!(
        "{}{sep}{}{sep}{}{sep}{}{sep}{}",
        book.id,
        book.title,
        book.author,
        book.category,
        book.issued,
        sep = FIELD_SEPARATOR
    )
}

pub(crate) fn parse_book_id(raw: &str) -> Result<BookId, String> {
    match raw.parse::<BookId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(format!("invalid book id '{raw}'")),
    }
}
