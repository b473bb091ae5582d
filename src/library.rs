// src/library.rs
//! Book catalog shared between managers and servers
use crate::archive::Archive;
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Catalog record for one archive. Always handed out as an owned copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Book {
    pub id: String,
    pub path: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub language: String,
    pub creator: String,
    pub publisher: String,
    pub name: String,
    pub date: String,
    pub tags: String,
    pub article_count: u64,
    pub media_count: u64,
    pub size: u64,
}

impl Book {
    /// Describe an opened archive from its metadata
    pub fn from_archive(archive: &Archive) -> Self {
        let meta = |name: &str| archive.metadata_string(name).unwrap_or_default();

        let mut title = meta("Title");
        if title.is_empty() {
            title = archive
                .path()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        let mut date = meta("Date");
        if date.is_empty() {
            date = archive.created_at().chars().take(10).collect();
        }

        Self {
            id: archive.uuid().to_string(),
            path: absolute(archive.path()),
            url: String::new(),
            title,
            description: meta("Description"),
            language: meta("Language"),
            creator: meta("Creator"),
            publisher: meta("Publisher"),
            name: meta("Name"),
            date,
            tags: meta("Tags"),
            article_count: archive.article_count(),
            media_count: archive.media_count(),
            size: archive.filesize(),
        }
    }

    pub fn is_local(&self) -> bool {
        !self.path.is_empty()
    }

    pub fn is_remote(&self) -> bool {
        !self.url.is_empty()
    }

    pub fn open_archive(&self) -> Result<Archive> {
        if !self.is_local() {
            anyhow::bail!("Book {} has no local archive", self.id);
        }
        Archive::open(&self.path)
    }
}

fn absolute(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

/// The catalog. Handled as `Arc<Library>`; lookups copy books out.
#[derive(Debug, Default)]
pub struct Library {
    books: RwLock<BTreeMap<String, Book>>,
    revision: AtomicU64,
}

impl Library {
    pub fn create() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Insert or replace a book; returns true when the id was new
    pub fn add_book(&self, book: Book) -> bool {
        let mut books = self.books.write().unwrap_or_else(|e| e.into_inner());
        let added = books.insert(book.id.clone(), book).is_none();
        self.revision.fetch_add(1, Ordering::Relaxed);
        added
    }

    pub fn remove_book_by_id(&self, id: &str) -> bool {
        let mut books = self.books.write().unwrap_or_else(|e| e.into_inner());
        let removed = books.remove(id).is_some();
        if removed {
            self.revision.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Count books with a local path and/or a remote url
    pub fn book_count(&self, local: bool, remote: bool) -> usize {
        let books = self.books.read().unwrap_or_else(|e| e.into_inner());
        books
            .values()
            .filter(|b| (local && b.is_local()) || (remote && b.is_remote()))
            .count()
    }

    pub fn book_by_id(&self, id: &str) -> Option<Book> {
        let books = self.books.read().unwrap_or_else(|e| e.into_inner());
        books.get(id).cloned()
    }

    /// Lookup by id first, then by the `Name` metadata
    pub fn book_by_id_or_name(&self, key: &str) -> Option<Book> {
        let books = self.books.read().unwrap_or_else(|e| e.into_inner());
        books
            .get(key)
            .or_else(|| books.values().find(|b| !b.name.is_empty() && b.name == key))
            .cloned()
    }

    pub fn book_ids(&self) -> Vec<String> {
        let books = self.books.read().unwrap_or_else(|e| e.into_inner());
        books.keys().cloned().collect()
    }

    pub fn books(&self) -> Vec<Book> {
        let books = self.books.read().unwrap_or_else(|e| e.into_inner());
        books.values().cloned().collect()
    }

    /// Bumped on every mutation
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Relaxed)
    }
}
