//! Library operations. Every rule about issuing and returning books lives
//! here; each mutation is checked against the store first and flushed to
//! disk before the call returns.

use tracing::{info, warn};

use crate::error::{LibraryError, Record, Result};
use crate::models::{Book, BookId, Member, MemberId, SortCriterion};
use crate::storage::{is_unescapable, FlatFileStorage};
use crate::store::{RecordStore, Violation};

/// The catalog, its members, and the files they persist to.
#[derive(Debug)]
pub struct Library {
    store: RecordStore,
    storage: FlatFileStorage,
}

impl Library {
    /// Load the library from `storage`. Missing files give an empty library.
    pub fn open(storage: FlatFileStorage) -> Result<Self> {
        let store = storage.load()?;
        Ok(Self { store, storage })
    }

    /// Wrap an existing store without touching the files.
    pub fn with_store(store: RecordStore, storage: FlatFileStorage) -> Self {
        Self { store, storage }
    }

    /// Files this library reads and writes.
    pub fn storage(&self) -> &FlatFileStorage {
        &self.storage
    }

    /// The in-memory records.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Replace the in-memory records with the file contents. On failure the
    /// current records are kept.
    pub fn load(&mut self) -> Result<()> {
        self.store = self.storage.load()?;
        Ok(())
    }

    /// Write every record to disk.
    pub fn save(&self) -> Result<()> {
        self.storage.save(&self.store)
    }

    /// Catalog a new book on the shelf under the next book id and save.
    /// Fails with [`LibraryError::IdsExhausted`] before touching anything
    /// once the largest id is taken.
    pub fn add_book(&mut self, title: &str, author: &str, category: &str) -> Result<Book> {
        warn_unescapable("title", title);
        warn_unescapable("author", author);
        warn_unescapable("category", category);

        let id = self
            .store
            .next_book_id()
            .ok_or(LibraryError::IdsExhausted("book"))?;
        let book = Book::new(id, title, author, category);
        self.store.put_book(book.clone());
        info!(book_id = book.id, title = %book.title, "added book");
        self.save()?;
        Ok(book)
    }

    /// Register a new member with no books under the next member id and save.
    pub fn add_member(&mut self, name: &str, email: &str) -> Result<Member> {
        warn_unescapable("name", name);
        warn_unescapable("email", email);

        let id = self
            .store
            .next_member_id()
            .ok_or(LibraryError::IdsExhausted("member"))?;
        let member = Member::new(id, name, email);
        self.store.put_member(member.clone());
        info!(member_id = member.id, name = %member.name, "added member");
        self.save()?;
        Ok(member)
    }

    /// Lend `book_id` to `member_id`. Nothing changes unless both exist and
    /// the book is on the shelf.
    pub fn issue_book(&mut self, book_id: BookId, member_id: MemberId) -> Result<()> {
        let book = self
            .store
            .book(book_id)
            .ok_or(LibraryError::NotFound(Record::Book(book_id)))?;
        if self.store.member(member_id).is_none() {
            return Err(LibraryError::NotFound(Record::Member(member_id)));
        }
        if book.issued {
            return Err(LibraryError::AlreadyIssued { book_id });
        }

        if let Some(book) = self.store.book_mut(book_id) {
            book.issued = true;
        }
        if let Some(member) = self.store.member_mut(member_id) {
            member.issued_books.insert(book_id);
        }
        info!(book_id, member_id, "issued book");
        self.save()
    }

    /// Take `book_id` back. The id is removed from every member's issued set,
    /// which also repairs a book recorded against more than one member.
    /// Returning a book that is not issued succeeds.
    pub fn return_book(&mut self, book_id: BookId) -> Result<()> {
        let book = self
            .store
            .book_mut(book_id)
            .ok_or(LibraryError::NotFound(Record::Book(book_id)))?;
        let was_issued = book.issued;
        book.issued = false;

        let mut released = 0usize;
        for member in self.store.members_mut() {
            if member.issued_books.remove(&book_id) {
                released += 1;
            }
        }
        if released > 1 {
            warn!(book_id, holders = released, "book was held by several members");
        }
        info!(book_id, was_issued, "returned book");
        self.save()
    }

    /// Books whose title, author or category contains `keyword`, ignoring
    /// case, in id order.
    pub fn search_books<'a>(&'a self, keyword: &str) -> impl Iterator<Item = &'a Book> + 'a {
        let needle = keyword.to_lowercase();
        self.store
            .books()
            .filter(move |book| book.matches_lowercase(&needle))
    }

    /// Every book ordered by `criterion`, ignoring case. Equal keys keep id
    /// order.
    pub fn sort_books(&self, criterion: SortCriterion) -> Vec<&Book> {
        let mut books: Vec<&Book> = self.store.books().collect();
        books.sort_by_cached_key(|book| criterion.key(book));
        books
    }

    /// Look up a book by id.
    pub fn book(&self, id: BookId) -> Option<&Book> {
        self.store.book(id)
    }

    /// Look up a member by id.
    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.store.member(id)
    }

    /// Every book in id order.
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.store.books()
    }

    /// Every member in id order.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.store.members()
    }

    /// Member currently holding `book_id`, if any.
    pub fn holder_of(&self, book_id: BookId) -> Option<&Member> {
        self.store.holder_of(book_id)
    }

    /// Relationship violations in the current records.
    pub fn audit(&self) -> Vec<Violation> {
        self.store.audit()
    }
}

fn warn_unescapable(field: &str, value: &str) {
    if is_unescapable(value) {
        warn!(field, value, "value contains a separator and will not load back intact");
    }
}
