#![allow(dead_code)]

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zimbridge::{Creator, WriterItem};

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-illustration";

pub fn setup_temp_dir() -> Result<TempDir> {
    tempfile::tempdir().map_err(anyhow::Error::from)
}

fn html(title: &str, body: &str) -> String {
    format!("<html><head><title>{}</title></head><body><p>{}</p></body></html>", title, body)
}

/// A small wiki: three articles, a main page, a redirect, a stylesheet, an
/// image, metadata and an illustration. Full-text and title indexes included.
pub fn build_wiki(dir: &Path, file_name: &str) -> Result<PathBuf> {
    let path = dir.join(file_name);
    let mut creator = Creator::new();
    creator.start_zim_creation(&path)?;

    let articles = [
        (
            "index.html",
            "Welcome",
            "Welcome to the test wiki. Read about programming languages here.",
        ),
        (
            "A/Rust",
            "Rust programming language",
            "Rust is a systems programming language focused on memory safety. \
             Rust ownership rules make rust programs fast and safe.",
        ),
        (
            "A/Python",
            "Python language",
            "Python is a dynamic programming language with garbage collection.",
        ),
        (
            "A/Rusty_Nail",
            "Rusty nail",
            "A rusty nail is a cocktail made with whisky and honey liqueur.",
        ),
    ];
    for (item_path, title, body) in articles {
        creator.add_item(WriterItem::string_item(item_path, "text/html", title, html(title, body), true))?;
    }
    creator.add_item(WriterItem::string_item("style.css", "text/css", "", "body { margin: 0 }", false))?;
    creator.add_item(WriterItem::string_item("I/logo.png", "image/png", "", PNG_BYTES, false))?;
    creator.add_redirection("A/Rust_lang", "Rust lang", "A/Rust")?;

    creator.add_metadata("Title", "Test Wiki")?;
    creator.add_metadata("Description", "A wiki for tests")?;
    creator.add_metadata("Language", "eng")?;
    creator.add_metadata("Name", "test_wiki")?;
    creator.add_illustration(48, PNG_BYTES)?;
    creator.set_main_path("index.html")?;
    creator.finish_zim_creation()?;
    Ok(path)
}

/// Plain archive without front articles: no title index and, with
/// `indexing` off, no full-text index either
pub fn build_plain(dir: &Path, file_name: &str, title: &str, indexing: bool) -> Result<PathBuf> {
    let path = dir.join(file_name);
    let mut creator = Creator::new();
    creator.config_indexing(indexing)?;
    creator.start_zim_creation(&path)?;
    creator.add_item(WriterItem::string_item(
        "page/alpha",
        "text/plain",
        "Alpha page",
        "alpha text",
        false,
    ))?;
    creator.add_item(WriterItem::string_item(
        "page/alphabet",
        "text/plain",
        "Alphabet soup",
        "letters in a soup",
        false,
    ))?;
    creator.add_item(WriterItem::string_item("page/beta", "text/plain", "Beta page", "beta text", false))?;
    creator.add_metadata("Title", title)?;
    creator.finish_zim_creation()?;
    Ok(path)
}
