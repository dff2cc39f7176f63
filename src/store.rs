//! In-memory catalog and membership records. The store knows nothing about
//! files; `storage` fills it on load and drains it on save.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::models::{Book, BookId, Member, MemberId};

/// First catalog number handed out by an empty store.
pub const FIRST_BOOK_ID: BookId = 101;
/// First membership number handed out by an empty store.
pub const FIRST_MEMBER_ID: MemberId = 1;

/// Books and members keyed by id. Both maps iterate in ascending id order,
/// which is the order searches and saves observe.
///
/// A counter of `None` means the id space is used up: a record with the
/// largest possible id exists and nothing further can be allocated.
#[derive(Debug, Clone)]
pub struct RecordStore {
    books: BTreeMap<BookId, Book>,
    members: BTreeMap<MemberId, Member>,
    next_book_id: Option<BookId>,
    next_member_id: Option<MemberId>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self {
            books: BTreeMap::new(),
            members: BTreeMap::new(),
            next_book_id: Some(FIRST_BOOK_ID),
            next_member_id: Some(FIRST_MEMBER_ID),
        }
    }
}

impl RecordStore {
    /// Empty store numbering books from 101 and members from 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a book by id.
    pub fn book(&self, id: BookId) -> Option<&Book> {
        self.books.get(&id)
    }

    /// Mutable access for flag changes; the id must not be edited.
    pub fn book_mut(&mut self, id: BookId) -> Option<&mut Book> {
        self.books.get_mut(&id)
    }

    /// Look up a member by id.
    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.get(&id)
    }

    /// Mutable access for issued-set changes.
    pub fn member_mut(&mut self, id: MemberId) -> Option<&mut Member> {
        self.members.get_mut(&id)
    }

    /// Insert or replace a book. The id counter moves past `book.id` so a
    /// later allocation can never collide with it.
    pub fn put_book(&mut self, book: Book) {
        self.next_book_id = advance_past(self.next_book_id, book.id);
        self.books.insert(book.id, book);
    }

    /// Insert or replace a member, advancing the member counter likewise.
    pub fn put_member(&mut self, member: Member) {
        self.next_member_id = advance_past(self.next_member_id, member.id);
        self.members.insert(member.id, member);
    }

    /// Every book in ascending id order.
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    /// Every member in ascending id order.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    /// Every member, mutably, in ascending id order.
    pub fn members_mut(&mut self) -> impl Iterator<Item = &mut Member> {
        self.members.values_mut()
    }

    /// Id the next added book will receive, `None` once ids run out.
    pub fn next_book_id(&self) -> Option<BookId> {
        self.next_book_id
    }

    /// Id the next added member will receive, `None` once ids run out.
    pub fn next_member_id(&self) -> Option<MemberId> {
        self.next_member_id
    }

    /// Number of books in the catalog.
    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    /// Number of registered members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// First member whose issued set contains `book_id`.
    pub fn holder_of(&self, book_id: BookId) -> Option<&Member> {
        self.members
            .values()
            .find(|member| member.issued_books.contains(&book_id))
    }

    /// Check the issued flag against the members' issued sets. An empty
    /// result means every issued book has exactly one holder and every held
    /// book exists and is flagged issued.
    pub fn audit(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut holders: HashMap<BookId, Vec<MemberId>> = HashMap::new();

        for member in self.members.values() {
            for &book_id in &member.issued_books {
                holders.entry(book_id).or_default().push(member.id);
                match self.books.get(&book_id) {
                    None => violations.push(Violation::UnknownBook {
                        member_id: member.id,
                        book_id,
                    }),
                    Some(book) if !book.issued => violations.push(Violation::HeldButNotIssued {
                        member_id: member.id,
                        book_id,
                    }),
                    Some(_) => {}
                }
            }
        }

        for book in self.books.values() {
            let held_by = holders.remove(&book.id).unwrap_or_default();
            if book.issued && held_by.is_empty() {
                violations.push(Violation::IssuedWithoutHolder { book_id: book.id });
            }
            if held_by.len() > 1 {
                violations.push(Violation::HeldByMany {
                    book_id: book.id,
                    members: held_by,
                });
            }
        }

        violations
    }
}

/// Counter value after storing `id`. Never moves backwards and becomes
/// `None` when `id` is the last representable one.
fn advance_past(next: Option<u32>, id: u32) -> Option<u32> {
    match next {
        Some(next) if id < next => Some(next),
        Some(_) => id.checked_add(1),
        None => None,
    }
}

/// A breach of the issued-flag/holder relationship found by
/// [`RecordStore::audit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    IssuedWithoutHolder { book_id: BookId },
    HeldButNotIssued { member_id: MemberId, book_id: BookId },
    HeldByMany { book_id: BookId, members: Vec<MemberId> },
    UnknownBook { member_id: MemberId, book_id: BookId },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::IssuedWithoutHolder { book_id } => {
                write!(f, "book {book_id} is marked issued but no member holds it")
            }
            Violation::HeldButNotIssued { member_id, book_id } => write!(
                f,
                "member {member_id} holds book {book_id} which is not marked issued"
            ),
            Violation::HeldByMany { book_id, members } => {
                write!(f, "book {book_id} is held by members {members:?}")
            }
            Violation::UnknownBook { member_id, book_id } => {
                write!(f, "member {member_id} holds unknown book {book_id}")
            }
        }
    }
}
