use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{LibraryError, Result};
use crate::store::RecordStore;

use super::books::{format_book_line, parse_book_line};
use super::members::{format_member_line, parse_member_line};

/// Catalog file name inside the data directory.
pub const BOOKS_FILE_NAME: &str = "books.txt";
/// Membership file name inside the data directory.
pub const MEMBERS_FILE_NAME: &str = "members.txt";

/// The pair of flat files backing a [`RecordStore`].
#[derive(Debug, Clone)]
pub struct FlatFileStorage {
    books_path: PathBuf,
    members_path: PathBuf,
}

impl FlatFileStorage {
    /// Use `books.txt` and `members.txt` inside `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self::with_paths(
            data_dir.join(BOOKS_FILE_NAME),
            data_dir.join(MEMBERS_FILE_NAME),
        )
    }

    pub fn with_paths(books_path: impl Into<PathBuf>, members_path: impl Into<PathBuf>) -> Self {
        Self {
            books_path: books_path.into(),
            members_path: members_path.into(),
        }
    }

    pub fn books_path(&self) -> &Path {
        &self.books_path
    }

    pub fn members_path(&self) -> &Path {
        &self.members_path
    }

    /// Read both files into a fresh store. A missing file counts as empty.
    /// The first malformed line aborts the whole load.
    pub fn load(&self) -> Result<RecordStore> {
        let mut store = RecordStore::new();

        for book in read_records(&self.books_path, parse_book_line)? {
            store.put_book(book);
        }
        for member in read_records(&self.members_path, parse_member_line)? {
            store.put_member(member);
        }

        debug!(
            books = store.book_count(),
            members = store.member_count(),
            "loaded records"
        );

        for violation in store.audit() {
            warn!(%violation, "persisted records disagree");
        }

        Ok(store)
    }

    /// Overwrite both files with the full contents of `store`. The books
    /// file is written first; a failure on the members file leaves the new
    /// books file in place.
    pub fn save(&self, store: &RecordStore) -> Result<()> {
        write_records(&self.books_path, store.books().map(format_book_line))?;
        write_records(&self.members_path, store.members().map(format_member_line))?;

        debug!(
            books = store.book_count(),
            members = store.member_count(),
            "saved records"
        );
        Ok(())
    }
}

/// Decode every non-blank line of `path` with `parse`.
fn read_records<T>(
    path: &Path,
    parse: fn(&str) -> std::result::Result<T, String>,
) -> Result<Vec<T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "data file missing, starting empty");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(LibraryError::Io {
                path: path.to_path_buf(),
                operation: "open",
                source,
            })
        }
    };

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| LibraryError::Io {
            path: path.to_path_buf(),
            operation: "read",
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = parse(&line).map_err(|reason| LibraryError::load(path, index + 1, reason))?;
        records.push(record);
    }

    Ok(records)
}

/// Truncate `path` and write one line per item.
fn write_records(path: &Path, lines: impl Iterator<Item = String>) -> Result<()> {
    let save_err = |source: io::Error| LibraryError::Save {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(save_err)?;
    }

    let mut writer = BufWriter::new(File::create(path).map_err(save_err)?);
    for line in lines {
        writeln!(writer, "{line}").map_err(save_err)?;
    }
    writer.flush().map_err(save_err)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::{Book, Member};

    #[test]
    fn missing_files_load_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FlatFileStorage::new(dir.path()).load().unwrap();
        assert_eq!(store.book_count(), 0);
        assert_eq!(store.member_count(), 0);
        assert_eq!(store.next_book_id(), Some(101));
    }

    #[test]
    fn save_writes_one_line_per_record() {
        let dir = TempDir::new().unwrap();
        let storage = FlatFileStorage::new(dir.path());

        let mut store = RecordStore::new();
        let mut dune = Book::new(101, "Dune", "Herbert", "SciFi");
        dune.issued = true;
        store.put_book(dune);
        store.put_book(Book::new(102, "Emma", "Austen", "Classic"));
        let mut al = Member::new(1, "Al", "al@x.com");
        al.issued_books.insert(101);
        store.put_member(al);
        store.put_member(Member::new(2, "Bo", "bo@x.com"));

        storage.save(&store).unwrap();

        let books = fs::read_to_string(storage.books_path()).unwrap();
        assert_eq!(
            books,
            "101,Dune,Herbert,SciFi,true\n102,Emma,Austen,Classic,false\n"
        );
        let members = fs::read_to_string(storage.members_path()).unwrap();
        assert_eq!(members, "1,Al,al@x.com,101\n2,Bo,bo@x.com,none\n");
    }

    #[test]
    fn save_creates_the_data_directory() {
        let dir = TempDir::new().unwrap();
        let storage = FlatFileStorage::new(dir.path().join("nested").join("library"));
        storage.save(&RecordStore::new()).unwrap();
        assert!(storage.books_path().exists());
        assert!(storage.members_path().exists());
    }

    #[test]
    fn malformed_line_reports_file_and_line() {
        let dir = TempDir::new().unwrap();
        let storage = FlatFileStorage::new(dir.path());
        fs::write(
            storage.books_path(),
            "101,Dune,Herbert,SciFi,false\n102,Emma,Austen,false\n",
        )
        .unwrap();

        match storage.load() {
            Err(LibraryError::Load { path, line, .. }) => {
                assert_eq!(path, storage.books_path());
                assert_eq!(line, 2);
            }
            other => panic!("expected load error, got {other:?}"),
        }
    }

    #[test]
    fn blank_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let storage = FlatFileStorage::new(dir.path());
        fs::write(storage.books_path(), "101,Dune,Herbert,SciFi,false\n\n").unwrap();
        fs::write(storage.members_path(), "\n1,Al,al@x.com,none\n").unwrap();

        let store = storage.load().unwrap();
        assert_eq!(store.book_count(), 1);
        assert_eq!(store.member_count(), 1);
    }

    #[test]
    fn load_keeps_counters_past_the_highest_id() {
        let dir = TempDir::new().unwrap();
        let storage = FlatFileStorage::new(dir.path());
        fs::write(storage.books_path(), "105,Dune,Herbert,SciFi,false\n").unwrap();
        fs::write(storage.members_path(), "3,Al,al@x.com,none\n").unwrap();

        let store = storage.load().unwrap();
        assert_eq!(store.next_book_id(), Some(106));
        assert_eq!(store.next_member_id(), Some(4));
    }
}
