// Library command - scan for archives and list the resulting catalog
use anyhow::Result;
use clap::{Args, ValueHint};
use std::path::PathBuf;
use zimbridge::format::{format_bytes, format_number};
use zimbridge::{Library, Manager};

#[derive(Args)]
#[command(about = "Scan a directory for archives and list their books")]
pub struct LibraryCommand {
    /// Directories or archive files
    #[arg(required = true, value_hint = ValueHint::AnyPath)]
    pub paths: Vec<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Register every path: directories are scanned, files are added directly
pub(crate) fn populate(manager: &Manager, paths: &[PathBuf]) -> usize {
    let mut added = 0;
    for path in paths {
        if path.is_dir() {
            added += manager.add_books_from_directory(path);
        } else {
            match manager.add_book_from_path(path) {
                Ok(_) => added += 1,
                Err(e) => log::warn!("Skipping {}: {:#}", path.display(), e),
            }
        }
    }
    added
}

pub fn run(cmd: LibraryCommand, verbose: bool) -> Result<()> {
    let library = Library::create();
    let manager = Manager::new(library.clone()).with_verbose(verbose);
    populate(&manager, &cmd.paths);

    let books = library.books();
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&books)?);
        return Ok(());
    }

    for book in &books {
        println!("{}", book.title);
        println!("  id:        {}", book.id);
        if !book.name.is_empty() {
            println!("  name:      {}", book.name);
        }
        if !book.language.is_empty() {
            println!("  language:  {}", book.language);
        }
        println!("  articles:  {}", format_number(book.article_count));
        println!("  size:      {}", format_bytes(book.size));
        println!("  path:      {}", book.path);
    }
    eprintln!("{} books", books.len());
    Ok(())
}
