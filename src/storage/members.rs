use std::collections::BTreeSet;

use crate::models::{BookId, Member, MemberId};

use super::books::parse_book_id;
use super::{FIELD_SEPARATOR, ID_SEPARATOR, NO_ISSUED_BOOKS};

/// Number of fields in a `members.txt` line.
const MEMBER_FIELDS: usize = 4;

/// Decode `id,name,email,issued` where `issued` is `none` or a
/// `;`-separated id list. Empty list segments, such as a trailing `;`, are
/// ignored.
pub fn parse_member_line(line: &str) -> Result<Member, String> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() != MEMBER_FIELDS {
        return Err(format!(
            "expected {MEMBER_FIELDS} fields, found {}",
            fields.len()
        ));
    }

    let id = match fields[0].parse::<MemberId>() {
        Ok(id) if id > 0 => id,
        _ => return Err(format!("invalid member id '{}'", fields[0])),
    };

    Ok(Member {
        id,
        name: fields[1].to_string(),
        email: fields[2].to_string(),
        issued_books: parse_issued_list(fields[3])?,
    })
}

fn parse_issued_list(raw: &str) -> Result<BTreeSet<BookId>, String> {
    if raw == NO_ISSUED_BOOKS {
        return Ok(BTreeSet::new());
    }

    let mut ids = BTreeSet::new();
    for segment in raw.split(ID_SEPARATOR).filter(|s| !s.is_empty()) {
        ids.insert(parse_book_id(segment)?);
    }

    if ids.is_empty() {
        return Err(format!(
            "issued list must be '{NO_ISSUED_BOOKS}' or book ids, found '{raw}'"
        ));
    }
    Ok(ids)
}

/// Encode a member as one line, without the trailing newline.
pub fn format_member_line(member: &Member) -> String {
    let issued = if member.issued_books.is_empty() {
        NO_ISSUED_BOOKS.to_string()
    } else {
        member
            .issued_books
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(&ID_SEPARATOR.to_string())
    };

    format!(
        "{}{sep}{}{sep}{}{sep}{}",
        member.id,
        member.name,
        member.email,
        issued,
        sep = FIELD_SEPARATOR
    )
}
