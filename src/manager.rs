// src/manager.rs
//! Populates a library from archive files and directories
use crate::archive::Archive;
use crate::constants;
use crate::library::{Book, Library};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Adds books to one library. Does not own the library beyond its `Arc`.
#[derive(Debug, Clone)]
pub struct Manager {
    library: Arc<Library>,
    verbose: bool,
}

impl Manager {
    pub fn new(library: Arc<Library>) -> Self {
        Self {
            library,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn library(&self) -> &Arc<Library> {
        &self.library
    }

    /// Open one archive and add it; returns the book id
    pub fn add_book_from_path(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let book = read_book(path)?;
        let id = book.id.clone();
        self.library.add_book(book);
        if self.verbose {
            log::info!("Added book {} from {}", id, path.display());
        }
        Ok(id)
    }

    /// Recursively add every archive under `dir`, skipping anything unreadable.
    /// Returns how many books were added.
    pub fn add_books_from_directory(&self, dir: impl AsRef<Path>) -> usize {
        let dir = dir.as_ref();
        let started = Instant::now();

        let mut paths = Vec::new();
        collect_archive_paths(dir, &mut paths);

        let books: Vec<Book> = paths
            .par_iter()
            .filter_map(|path| match read_book(path) {
                Ok(book) => Some(book),
                Err(e) => {
                    log::debug!("Skipping {}: {:#}", path.display(), e);
                    None
                }
            })
            .collect();

        let added = books.into_iter().filter(|book| self.library.add_book(book.clone())).count();

        if self.verbose {
            log::info!(
                "Scanned {}: {} archive files, {} added in {:?}",
                dir.display(),
                paths.len(),
                added,
                started.elapsed()
            );
        }
        added
    }
}

fn read_book(path: &Path) -> Result<Book> {
    let archive = Archive::open(path).with_context(|| format!("Cannot add book from {}", path.display()))?;
    Ok(Book::from_archive(&archive))
}

fn collect_archive_paths(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Cannot read directory {}: {}", dir.display(), e);
            return;
        }
    };
    let mut children: Vec<(PathBuf, std::fs::FileType)> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_type().ok().map(|t| (e.path(), t)))
        .collect();
    children.sort_by(|a, b| a.0.cmp(&b.0));

    // Symlinked directories are not descended into; symlinked files still count
    for (path, file_type) in children {
        if file_type.is_dir() {
            collect_archive_paths(&path, out);
        } else if constants::is_archive_path(&path) && (file_type.is_file() || path.is_file()) {
            out.push(path);
        }
    }
}
