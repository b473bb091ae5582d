mod common;

use anyhow::Result;
use std::sync::Arc;
use zimbridge::{Archive, Book, Library, Manager};

#[test]
fn test_add_book_from_path() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let path = common::build_wiki(dir.path(), "wiki.zim")?;
    let library = Library::create();
    let manager = Manager::new(Arc::clone(&library));

    let id = manager.add_book_from_path(&path)?;
    assert_eq!(library.book_count(true, false), 1);
    assert_eq!(library.book_count(false, true), 0);

    let book = library.book_by_id(&id).expect("book registered");
    assert_eq!(book.id, Archive::open(&path)?.uuid());
    assert_eq!(book.title, "Test Wiki");
    assert_eq!(book.description, "A wiki for tests");
    assert_eq!(book.language, "eng");
    assert_eq!(book.name, "test_wiki");
    assert_eq!(book.article_count, 4);
    assert_eq!(book.size, std::fs::metadata(&path)?.len());
    assert_eq!(library.book_by_id_or_name("test_wiki").map(|b| b.id), Some(id));
    Ok(())
}

#[test]
fn test_missing_file_is_rejected_and_catalog_unchanged() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let library = Library::create();
    let manager = Manager::new(Arc::clone(&library));

    assert!(manager.add_book_from_path(dir.path().join("missing.zim")).is_err());
    assert_eq!(library.book_count(true, true), 0);
    Ok(())
}

#[test]
fn test_directory_scan_adds_only_archives() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let nested = dir.path().join("nested/deeper");
    std::fs::create_dir_all(&nested)?;

    common::build_plain(dir.path(), "one.zim", "One", true)?;
    common::build_plain(&dir.path().join("nested"), "two.zim", "Two", true)?;
    common::build_plain(&nested, "three.zim", "Three", false)?;
    std::fs::write(dir.path().join("notes.txt"), "not an archive")?;
    std::fs::write(nested.join("broken.zim"), "not an archive either")?;

    let library = Library::create();
    let manager = Manager::new(Arc::clone(&library)).with_verbose(true);
    assert_eq!(manager.add_books_from_directory(dir.path()), 3);
    assert_eq!(library.book_count(true, true), 3);

    let mut titles: Vec<String> = library.books().into_iter().map(|b| b.title).collect();
    titles.sort();
    assert_eq!(titles, vec!["One", "Three", "Two"]);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_directory_scan_skips_symlink_loops() -> Result<()> {
    use std::os::unix::fs::symlink;
    use std::sync::mpsc;
    use std::time::Duration;

    let dir = common::setup_temp_dir()?;
    let archive = common::build_plain(dir.path(), "one.zim", "One", true)?;
    symlink(dir.path(), dir.path().join("l1"))?;
    symlink(dir.path(), dir.path().join("l2"))?;
    symlink(&archive, dir.path().join("alias.zim"))?;

    let library = Library::create();
    let manager = Manager::new(Arc::clone(&library));
    let root = dir.path().to_path_buf();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(manager.add_books_from_directory(&root));
    });

    // The looping directories are not entered; the linked file is the same book
    let added = rx.recv_timeout(Duration::from_secs(20))?;
    assert_eq!(added, 1);
    assert_eq!(library.book_count(true, true), 1);
    Ok(())
}

#[test]
fn test_missing_directory_adds_nothing() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let manager = Manager::new(Library::create());
    assert_eq!(manager.add_books_from_directory(dir.path().join("nope")), 0);
    assert_eq!(manager.library().book_count(true, true), 0);
    Ok(())
}

#[test]
fn test_books_are_snapshots() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let path = common::build_wiki(dir.path(), "wiki.zim")?;
    let library = Library::create();
    let id = Manager::new(Arc::clone(&library)).add_book_from_path(&path)?;

    let first = library.book_by_id(&id).expect("book");
    let second = library.book_by_id(&id).expect("book");
    assert_eq!(first, second);

    assert!(library.remove_book_by_id(&id));
    assert!(library.book_by_id(&id).is_none());
    assert_eq!(first.title, "Test Wiki");

    let replacement = Book {
        title: "Renamed".to_string(),
        ..first.clone()
    };
    assert!(library.add_book(replacement));
    assert!(!library.add_book(first.clone()));
    assert_eq!(library.book_by_id(&id).map(|b| b.title), Some("Test Wiki".to_string()));
    Ok(())
}

#[test]
fn test_concurrent_lookup_during_mutation() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let path = common::build_wiki(dir.path(), "wiki.zim")?;
    let library = Library::create();
    let id = Manager::new(Arc::clone(&library)).add_book_from_path(&path)?;
    let template = library.book_by_id(&id).expect("book");

    let writer = {
        let library = Arc::clone(&library);
        std::thread::spawn(move || {
            for i in 0..200 {
                library.add_book(Book {
                    id: format!("extra-{}", i),
                    ..template.clone()
                });
            }
        })
    };
    for _ in 0..200 {
        let book = library.book_by_id(&id).expect("original book stays");
        assert_eq!(book.title, "Test Wiki");
    }
    writer.join().map_err(|_| anyhow::anyhow!("writer panicked"))?;
    assert_eq!(library.book_count(true, false), 201);
    Ok(())
}
