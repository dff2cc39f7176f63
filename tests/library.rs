use std::fs;

use city_library::{FlatFileStorage, Library, LibraryError, Record, RecordStore, SortCriterion};
use tempfile::TempDir;

fn open(dir: &TempDir) -> Library {
    Library::open(FlatFileStorage::new(dir.path())).unwrap()
}

#[test]
fn issue_and_return_scenario() {
    let dir = TempDir::new().unwrap();
    let mut library = open(&dir);

    let book = library.add_book("Dune", "Herbert", "SciFi").unwrap();
    assert_eq!(book.id, 101);
    assert!(!book.issued);

    let member = library.add_member("Al", "al@x.com").unwrap();
    assert_eq!(member.id, 1);

    library.issue_book(101, 1).unwrap();
    assert!(library.book(101).unwrap().issued);
    assert_eq!(
        library.member(1).unwrap().issued_books.iter().copied().collect::<Vec<_>>(),
        vec![101]
    );
    assert!(library.audit().is_empty());

    library.return_book(101).unwrap();
    assert!(!library.book(101).unwrap().issued);
    assert!(library.member(1).unwrap().issued_books.is_empty());
    assert!(library.audit().is_empty());
}

#[test]
fn every_mutation_is_flushed_to_disk() {
    let dir = TempDir::new().unwrap();
    let mut library = open(&dir);
    let books_path = dir.path().join("books.txt");
    let members_path = dir.path().join("members.txt");

    library.add_book("Dune", "Herbert", "SciFi").unwrap();
    assert_eq!(
        fs::read_to_string(&books_path).unwrap(),
        "101,Dune,Herbert,SciFi,false\n"
    );

    library.add_member("Al", "al@x.com").unwrap();
    assert_eq!(fs::read_to_string(&members_path).unwrap(), "1,Al,al@x.com,none\n");

    library.issue_book(101, 1).unwrap();
    assert_eq!(
        fs::read_to_string(&books_path).unwrap(),
        "101,Dune,Herbert,SciFi,true\n"
    );
    assert_eq!(fs::read_to_string(&members_path).unwrap(), "1,Al,al@x.com,101\n");

    library.return_book(101).unwrap();
    assert_eq!(
        fs::read_to_string(&books_path).unwrap(),
        "101,Dune,Herbert,SciFi,false\n"
    );
    assert_eq!(fs::read_to_string(&members_path).unwrap(), "1,Al,al@x.com,none\n");
}

#[test]
fn save_then_load_reproduces_records() {
    let dir = TempDir::new().unwrap();
    let mut library = open(&dir);
    library.add_book("Dune", "Herbert", "SciFi").unwrap();
    library.add_book("Emma", "Austen", "Classic").unwrap();
    library.add_book("Ubik", "Dick", "SciFi").unwrap();
    library.add_member("Al", "al@x.com").unwrap();
    library.add_member("Bo", "bo@x.com").unwrap();
    library.issue_book(101, 2).unwrap();
    library.issue_book(103, 2).unwrap();
    library.save().unwrap();

    let reopened = open(&dir);
    assert_eq!(
        reopened.books().cloned().collect::<Vec<_>>(),
        library.books().cloned().collect::<Vec<_>>()
    );
    assert_eq!(
        reopened.members().cloned().collect::<Vec<_>>(),
        library.members().cloned().collect::<Vec<_>>()
    );
    assert_eq!(reopened.store().next_book_id(), Some(104));
    assert_eq!(reopened.store().next_member_id(), Some(3));
    assert!(reopened.audit().is_empty());
}

#[test]
fn issuing_an_issued_book_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut library = open(&dir);
    library.add_book("Dune", "Herbert", "SciFi").unwrap();
    library.add_member("Al", "al@x.com").unwrap();
    library.add_member("Bo", "bo@x.com").unwrap();
    library.issue_book(101, 1).unwrap();

    let books_before = fs::read_to_string(dir.path().join("books.txt")).unwrap();
    let members_before = fs::read_to_string(dir.path().join("members.txt")).unwrap();

    let err = library.issue_book(101, 2).unwrap_err();
    assert!(matches!(err, LibraryError::AlreadyIssued { book_id: 101 }));
    assert!(library.member(2).unwrap().issued_books.is_empty());
    assert!(library.member(1).unwrap().issued_books.contains(&101));
    assert_eq!(
        fs::read_to_string(dir.path().join("books.txt")).unwrap(),
        books_before
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("members.txt")).unwrap(),
        members_before
    );
}

#[test]
fn returning_an_unissued_book_succeeds_and_saves() {
    let dir = TempDir::new().unwrap();
    let mut library = open(&dir);
    library.add_book("Dune", "Herbert", "SciFi").unwrap();
    fs::remove_file(dir.path().join("books.txt")).unwrap();

    library.return_book(101).unwrap();
    assert!(!library.book(101).unwrap().issued);
    assert_eq!(
        fs::read_to_string(dir.path().join("books.txt")).unwrap(),
        "101,Dune,Herbert,SciFi,false\n"
    );
}

#[test]
fn unknown_ids_are_not_found() {
    let dir = TempDir::new().unwrap();
    let mut library = open(&dir);
    library.add_member("Al", "al@x.com").unwrap();

    assert!(matches!(
        library.issue_book(101, 1),
        Err(LibraryError::NotFound(Record::Book(101)))
    ));
    assert!(matches!(
        library.return_book(101),
        Err(LibraryError::NotFound(Record::Book(101)))
    ));
}

#[test]
fn sort_by_title_ignores_case() {
    let dir = TempDir::new().unwrap();
    let mut library = open(&dir);
    for title in ["Zen", "apple", "Mango"] {
        library.add_book(title, "Someone", "Misc").unwrap();
    }

    let titles: Vec<_> = library
        .sort_books(SortCriterion::Title)
        .into_iter()
        .map(|b| b.title.clone())
        .collect();
    assert_eq!(titles, vec!["apple", "Mango", "Zen"]);
}

#[test]
fn short_book_line_fails_the_whole_load() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("books.txt"),
        "101,Dune,Herbert,SciFi,false\n102,Emma,Austen,false\n",
    )
    .unwrap();

    let err = Library::open(FlatFileStorage::new(dir.path())).unwrap_err();
    match err {
        LibraryError::Load { line, reason, .. } => {
            assert_eq!(line, 2);
            assert!(reason.contains("found 4"));
        }
        other => panic!("expected load error, got {other:?}"),
    }
}

#[test]
fn failed_reload_keeps_current_records() {
    let dir = TempDir::new().unwrap();
    let mut library = open(&dir);
    library.add_book("Dune", "Herbert", "SciFi").unwrap();

    fs::write(dir.path().join("books.txt"), "garbage\n").unwrap();
    assert!(matches!(library.load(), Err(LibraryError::Load { .. })));
    assert_eq!(library.book(101).unwrap().title, "Dune");
    assert_eq!(library.store().book_count(), 1);
}

#[test]
fn drifted_files_are_repaired_by_return() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("books.txt"), "101,Dune,Herbert,SciFi,true\n").unwrap();
    fs::write(
        dir.path().join("members.txt"),
        "1,Al,al@x.com,101\n2,Bo,bo@x.com,101;\n",
    )
    .unwrap();

    let mut library = open(&dir);
    assert_eq!(library.audit().len(), 1);

    library.return_book(101).unwrap();
    assert!(library.audit().is_empty());
    assert_eq!(
        fs::read_to_string(dir.path().join("members.txt")).unwrap(),
        "1,Al,al@x.com,none\n2,Bo,bo@x.com,none\n"
    );
}

#[test]
fn ids_keep_growing_after_reload() {
    let dir = TempDir::new().unwrap();
    let mut library = open(&dir);
    library.add_book("Dune", "Herbert", "SciFi").unwrap();
    library.add_book("Emma", "Austen", "Classic").unwrap();
    drop(library);

    let mut library = open(&dir);
    let book = library.add_book("Ubik", "Dick", "SciFi").unwrap();
    assert_eq!(book.id, 103);
    let member = library.add_member("Al", "al@x.com").unwrap();
    assert_eq!(member.id, 1);
}

#[test]
fn largest_ids_refuse_further_additions() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("books.txt"), "4294967295,Dune,Herbert,SciFi,true\n").unwrap();
    fs::write(dir.path().join("members.txt"), "1,Al,al@x.com,4294967295\n").unwrap();
    let books_before = fs::read_to_string(dir.path().join("books.txt")).unwrap();

    let mut library = open(&dir);
    assert!(library.audit().is_empty());
    assert_eq!(library.store().next_book_id(), None);

    let err = library.add_book("Emma", "Austen", "Classic").unwrap_err();
    assert!(matches!(err, LibraryError::IdsExhausted("book")));
    assert!(!err.is_recoverable());
    assert_eq!(library.book(u32::MAX).unwrap().title, "Dune");
    assert!(library.book(u32::MAX).unwrap().issued);
    assert_eq!(library.store().book_count(), 1);
    assert!(library.audit().is_empty());
    assert_eq!(
        fs::read_to_string(dir.path().join("books.txt")).unwrap(),
        books_before
    );

    // Member ids are independent and still available.
    let member = library.add_member("Bo", "bo@x.com").unwrap();
    assert_eq!(member.id, 2);
    assert_eq!(library.member(1).unwrap().name, "Al");
}

#[test]
fn largest_member_id_refuses_further_members() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("members.txt"), "4294967295,Al,al@x.com,none\n").unwrap();

    let mut library = open(&dir);
    let err = library.add_member("Bo", "bo@x.com").unwrap_err();
    assert!(matches!(err, LibraryError::IdsExhausted("member")));
    assert_eq!(library.store().member_count(), 1);
    assert_eq!(library.member(u32::MAX).unwrap().name, "Al");

    let book = library.add_book("Dune", "Herbert", "SciFi").unwrap();
    assert_eq!(book.id, 101);
}

#[test]
fn save_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    // A directory where the books file should be makes the write fail.
    let blocked = dir.path().join("books.txt");
    fs::create_dir(&blocked).unwrap();

    let mut library = library_without_loading(&dir);
    let err = library.add_book("Dune", "Herbert", "SciFi").unwrap_err();
    assert!(matches!(err, LibraryError::Save { .. }));
    assert!(!err.is_recoverable());
    // The in-memory change stands and is flushed by the next good save.
    assert_eq!(library.book(101).unwrap().title, "Dune");
}

fn library_without_loading(dir: &TempDir) -> Library {
    let storage = FlatFileStorage::with_paths(
        dir.path().join("books.txt"),
        dir.path().join("members.txt"),
    );
    Library::with_store(RecordStore::new(), storage)
}
