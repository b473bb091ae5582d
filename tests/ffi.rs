mod common;

use anyhow::Result;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;
use zimbridge::ffi::archive::*;
use zimbridge::ffi::creator::*;
use zimbridge::ffi::library::*;
use zimbridge::ffi::search::*;
use zimbridge::ffi::{zim_free_buffer, zim_free_string};

fn c(s: &str) -> CString {
    CString::new(s).expect("no interior NUL")
}

fn c_path(path: &Path) -> CString {
    c(&path.to_string_lossy())
}

/// Copy out and release a returned string; None for null
unsafe fn take_string(s: *mut c_char) -> Option<String> {
    if s.is_null() {
        return None;
    }
    let out = unsafe { CStr::from_ptr(s) }.to_string_lossy().into_owned();
    unsafe { zim_free_string(s) };
    Some(out)
}

/// Copy out and release a returned buffer
unsafe fn take_buffer(ptr: *mut c_char, len: u64) -> Option<Vec<u8>> {
    if ptr.is_null() {
        return None;
    }
    let out = unsafe { std::slice::from_raw_parts(ptr as *const u8, len as usize) }.to_vec();
    unsafe { zim_free_buffer(ptr, len) };
    Some(out)
}

#[test]
fn test_null_handles_yield_sentinels() {
    unsafe {
        assert!(zim_archive_new(ptr::null()).is_null());
        assert_eq!(zim_archive_get_entry_count(ptr::null()), 0);
        assert!(zim_archive_get_uuid(ptr::null()).is_null());
        assert!(!zim_archive_has_entry_by_path(ptr::null(), c("A/Rust").as_ptr()));
        assert!(!zim_archive_check_integrity(ptr::null()));
        assert!(zim_entry_get_path(ptr::null()).is_null());
        assert_eq!(zim_item_get_size(ptr::null()), 0);

        let mut size = 42u64;
        assert!(zim_item_get_data(ptr::null(), &mut size).is_null());
        assert_eq!(size, 0);

        assert!(zim_searcher_new(ptr::null()).is_null());
        assert_eq!(zim_search_result_set_get_size(ptr::null()), 0);
        assert!(zim_search_iterator_get_title(ptr::null()).is_null());
        zim_search_iterator_next(ptr::null_mut());

        assert_eq!(kiwix_library_get_book_count(ptr::null(), true, true), 0);
        assert!(kiwix_manager_new(ptr::null()).is_null());
        assert!(kiwix_book_get_title(ptr::null()).is_null());
        assert!(!zim_creator_add_item(ptr::null_mut(), ptr::null()));

        // Releasing null is a no-op everywhere
        zim_archive_free(ptr::null_mut());
        zim_entry_free(ptr::null_mut());
        zim_item_free(ptr::null_mut());
        zim_free_string(ptr::null_mut());
        zim_free_buffer(ptr::null_mut(), 0);
        kiwix_book_free(ptr::null_mut());
        zim_creator_free(ptr::null_mut());
    }
}

#[test]
fn test_archive_entry_and_item_handles() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let path = common::build_wiki(dir.path(), "wiki.zim")?;

    unsafe {
        let archive = zim_archive_new(c_path(&path).as_ptr());
        assert!(!archive.is_null());
        assert_eq!(zim_archive_get_entry_count(archive), 7);
        assert_eq!(zim_archive_get_article_count(archive), 4);
        assert!(zim_archive_has_fulltext_index(archive));
        assert!(zim_archive_has_entry_by_path(archive, c("A/Rust").as_ptr()));
        assert!(!zim_archive_has_entry_by_path(archive, c("A/Nope").as_ptr()));
        assert!(zim_archive_get_entry_by_path(archive, c("A/Nope").as_ptr()).is_null());

        // Each call hands out a fresh allocation
        let a = zim_archive_get_uuid(archive);
        let b = zim_archive_get_uuid(archive);
        assert_ne!(a, b);
        assert_eq!(take_string(a), take_string(b));

        let entry = zim_archive_get_entry_by_path(archive, c("A/Rust_lang").as_ptr());
        assert!(zim_entry_is_redirect(entry));
        assert!(zim_entry_get_item(entry, false).is_null());
        let item = zim_entry_get_item(entry, true);
        let first = zim_item_get_path(item);
        let second = zim_item_get_path(item);
        assert_ne!(first, second);
        assert_eq!(take_string(first).as_deref(), Some("A/Rust"));
        assert_eq!(take_string(second).as_deref(), Some("A/Rust"));
        assert_eq!(take_string(zim_item_get_mimetype(item)).as_deref(), Some("text/html"));

        let mut size = 0u64;
        let data = zim_item_get_data(item, &mut size);
        assert_eq!(size, zim_item_get_size(item));
        let body = take_buffer(data, size).expect("item data");
        assert!(String::from_utf8_lossy(&body).contains("memory safety"));
        zim_item_free(item);
        zim_entry_free(entry);

        let main = zim_archive_get_main_entry(archive);
        assert_eq!(take_string(zim_entry_get_path(main)).as_deref(), Some("index.html"));
        zim_entry_free(main);

        let mut size = 0u64;
        let title = zim_archive_get_metadata(archive, c("Title").as_ptr(), &mut size);
        assert_eq!(take_buffer(title, size).as_deref(), Some(&b"Test Wiki"[..]));
        let missing = zim_archive_get_metadata(archive, c("Nope").as_ptr(), &mut size);
        assert!(missing.is_null());
        assert_eq!(size, 0);

        assert!(zim_archive_check_integrity(archive));
        zim_archive_free(archive);
    }
    Ok(())
}

#[test]
fn test_search_iteration_advances_size_times() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let path = common::build_wiki(dir.path(), "wiki.zim")?;

    unsafe {
        let archive = zim_archive_new(c_path(&path).as_ptr());
        let searcher = zim_searcher_new(archive);
        assert!(!searcher.is_null());
        let query = zim_query_new(c("language").as_ptr());
        let search = zim_searcher_search(searcher, query);
        assert!(zim_search_get_estimated_matches(search) >= 2);

        let set = zim_search_get_results(search, 0, 10);
        let size = zim_search_result_set_get_size(set);
        assert!(size >= 2);

        let it = zim_search_result_set_begin(set);
        let end = zim_search_result_set_end(set);
        // The set may go away while its iterators live on
        zim_search_result_set_free(set);

        let mut steps = 0;
        while !zim_search_iterator_equal(it, end) {
            assert!(take_string(zim_search_iterator_get_path(it)).is_some());
            assert!((0..=100).contains(&zim_search_iterator_get_score(it)));
            zim_search_iterator_next(it);
            steps += 1;
        }
        assert_eq!(steps, size);
        assert!(zim_search_iterator_get_path(it).is_null());
        assert_eq!(zim_search_iterator_get_score(it), 0);

        // Null on either side never compares equal
        assert!(!zim_search_iterator_equal(ptr::null(), ptr::null()));
        assert!(!zim_search_iterator_equal(end, ptr::null()));

        zim_search_iterator_free(it);
        zim_search_iterator_free(end);
        zim_search_free(search);
        zim_query_free(query);
        zim_searcher_free(searcher);
        zim_archive_free(archive);
    }
    Ok(())
}

#[test]
fn test_suggestions_and_null_equality() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let path = common::build_wiki(dir.path(), "wiki.zim")?;

    unsafe {
        let archive = zim_archive_new(c_path(&path).as_ptr());
        let searcher = zim_suggestion_searcher_new(archive);
        zim_suggestion_searcher_set_verbose(searcher, true);

        let search = zim_suggestion_searcher_suggest(searcher, c("rus").as_ptr());
        let set = zim_suggestion_search_get_results(search, 0, 10);
        assert_eq!(zim_suggestion_result_set_get_size(set), 2);

        let it = zim_suggestion_result_set_begin(set);
        let end = zim_suggestion_result_set_end(set);
        let mut titles = Vec::new();
        while !zim_suggestion_iterator_equal(it, end) {
            assert!(zim_suggestion_iterator_has_snippet(it));
            let snippet = take_string(zim_suggestion_iterator_get_snippet(it)).unwrap_or_default();
            assert!(snippet.contains("<b>"));
            titles.extend(take_string(zim_suggestion_iterator_get_title(it)));
            zim_suggestion_iterator_next(it);
        }
        titles.sort();
        assert_eq!(titles, vec!["Rust programming language", "Rusty nail"]);
        assert!(zim_suggestion_iterator_get_snippet(it).is_null());

        assert!(zim_suggestion_iterator_equal(ptr::null(), ptr::null()));
        assert!(!zim_suggestion_iterator_equal(it, ptr::null()));
        assert!(!zim_suggestion_iterator_equal(ptr::null(), it));

        zim_suggestion_iterator_free(it);
        zim_suggestion_iterator_free(end);
        zim_suggestion_result_set_free(set);
        zim_suggestion_search_free(search);

        // No matches: begin is already at end
        let search = zim_suggestion_searcher_suggest(searcher, c("zzzz").as_ptr());
        assert_eq!(zim_suggestion_search_get_estimated_matches(search), 0);
        let set = zim_suggestion_search_get_results(search, 0, 10);
        assert_eq!(zim_suggestion_result_set_get_size(set), 0);
        let begin = zim_suggestion_result_set_begin(set);
        let end = zim_suggestion_result_set_end(set);
        assert!(zim_suggestion_iterator_equal(begin, end));
        zim_suggestion_iterator_free(begin);
        zim_suggestion_iterator_free(end);
        zim_suggestion_result_set_free(set);
        zim_suggestion_search_free(search);

        zim_suggestion_searcher_free(searcher);
        zim_archive_free(archive);
    }
    Ok(())
}

#[test]
fn test_creator_round_trip() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let out = dir.path().join("made.zim");
    let source = dir.path().join("page.txt");
    std::fs::write(&source, "file backed content")?;

    unsafe {
        let creator = zim_creator_new();
        zim_creator_config_compression(creator, 5);
        zim_creator_config_compression(creator, 99);
        zim_creator_config_indexing(creator, true);
        zim_creator_config_cluster_size(creator, 1024);
        assert!(zim_creator_start_zim_creation(creator, c_path(&out).as_ptr()));

        let body = b"<html><head><title>Home</title></head><body>hello</body></html>";
        let home = zim_writer_string_item_new(
            c("index.html").as_ptr(),
            c("text/html").as_ptr(),
            ptr::null(),
            body.as_ptr() as *const c_char,
            body.len() as u64,
            true,
        );
        assert!(!home.is_null());
        assert!(zim_creator_add_item(creator, home));
        assert!(!zim_creator_add_item(creator, home));
        zim_writer_item_free(home);

        let file = zim_writer_file_item_new(
            c("page.txt").as_ptr(),
            c("text/plain").as_ptr(),
            c("Page").as_ptr(),
            c_path(&source).as_ptr(),
            false,
        );
        assert!(zim_creator_add_item(creator, file));
        zim_writer_item_free(file);

        let missing = zim_writer_file_item_new(
            c("gone").as_ptr(),
            c("text/plain").as_ptr(),
            ptr::null(),
            c_path(&dir.path().join("gone.txt")).as_ptr(),
            false,
        );
        assert!(missing.is_null());

        assert!(zim_creator_add_metadata(creator, c("Title").as_ptr(), c("Made").as_ptr()));
        assert!(zim_creator_add_illustration(
            creator,
            48,
            common::PNG_BYTES.as_ptr() as *const c_char,
            common::PNG_BYTES.len() as u64
        ));
        assert!(zim_creator_add_redirection(
            creator,
            c("home").as_ptr(),
            c("Home").as_ptr(),
            c("index.html").as_ptr()
        ));
        assert!(zim_creator_set_main_path(creator, c("index.html").as_ptr()));
        assert!(zim_creator_finish_zim_creation(creator));
        assert!(!zim_creator_finish_zim_creation(creator));
        zim_creator_free(creator);

        let archive = zim_archive_new(c_path(&out).as_ptr());
        assert!(!archive.is_null());
        assert_eq!(zim_archive_get_entry_count(archive), 3);

        let entry = zim_archive_get_entry_by_path(archive, c("page.txt").as_ptr());
        let item = zim_entry_get_item(entry, true);
        let mut size = 0u64;
        let data = zim_item_get_data(item, &mut size);
        assert_eq!(take_buffer(data, size).as_deref(), Some(&b"file backed content"[..]));
        zim_item_free(item);
        zim_entry_free(entry);

        let main = zim_archive_get_main_entry(archive);
        assert_eq!(take_string(zim_entry_get_path(main)).as_deref(), Some("index.html"));
        zim_entry_free(main);
        zim_archive_free(archive);
    }
    Ok(())
}

#[test]
fn test_creator_failed_start_rejects_items() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let out = dir.path().join("no/such/dir/out.zim");

    unsafe {
        let creator = zim_creator_new();
        assert!(!zim_creator_start_zim_creation(creator, c_path(&out).as_ptr()));

        let body = b"x";
        let item = zim_writer_string_item_new(
            c("a").as_ptr(),
            c("text/plain").as_ptr(),
            c("A").as_ptr(),
            body.as_ptr() as *const c_char,
            1,
            false,
        );
        assert!(!zim_creator_add_item(creator, item));
        assert!(!zim_creator_add_metadata(creator, c("Title").as_ptr(), c("T").as_ptr()));
        assert!(!zim_creator_finish_zim_creation(creator));
        zim_writer_item_free(item);
        zim_creator_free(creator);
    }
    assert!(!out.exists());
    Ok(())
}

#[test]
fn test_library_manager_and_book_snapshots() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let wiki = common::build_wiki(dir.path(), "wiki.zim")?;
    let shelf = dir.path().join("shelf");
    std::fs::create_dir_all(shelf.join("nested"))?;
    common::build_plain(&shelf, "one.zim", "One", true)?;
    common::build_plain(&shelf, "two.zim", "Two", false)?;
    common::build_plain(&shelf.join("nested"), "three.zim", "Three", true)?;
    std::fs::write(shelf.join("readme.txt"), "skip me")?;

    unsafe {
        let lib = kiwix_library_new();
        let mgr = kiwix_manager_new(lib);

        assert!(!kiwix_manager_add_book_from_path(mgr, c_path(&dir.path().join("missing.zim")).as_ptr()));
        assert_eq!(kiwix_library_get_book_count(lib, true, true), 0);

        assert!(kiwix_manager_add_book_from_path(mgr, c_path(&wiki).as_ptr()));
        kiwix_manager_add_books_from_directory(mgr, c_path(&shelf).as_ptr());
        assert_eq!(kiwix_library_get_book_count(lib, true, true), 4);
        assert_eq!(kiwix_library_get_book_count(lib, false, true), 0);

        let archive = zim_archive_new(c_path(&wiki).as_ptr());
        let id = take_string(zim_archive_get_uuid(archive)).unwrap_or_default();
        zim_archive_free(archive);

        let first = kiwix_library_get_book_by_id(lib, c(&id).as_ptr());
        let second = kiwix_library_get_book_by_id(lib, c(&id).as_ptr());
        assert!(!first.is_null());
        assert_ne!(first, second);
        assert_eq!(take_string(kiwix_book_get_title(first)), take_string(kiwix_book_get_title(second)));
        assert_eq!(take_string(kiwix_book_get_id(first)).as_deref(), Some(id.as_str()));
        assert_eq!(take_string(kiwix_book_get_name(first)).as_deref(), Some("test_wiki"));
        assert_eq!(take_string(kiwix_book_get_language(first)).as_deref(), Some("eng"));
        assert_eq!(kiwix_book_get_article_count(first), 4);
        assert_eq!(kiwix_book_get_size(first), std::fs::metadata(&wiki)?.len());
        kiwix_book_free(first);
        kiwix_book_free(second);

        assert!(kiwix_library_get_book_by_id(lib, c("no-such-id").as_ptr()).is_null());

        // The manager keeps the catalog alive after the library handle goes
        kiwix_library_free(lib);
        assert!(kiwix_manager_add_book_from_path(mgr, c_path(&wiki).as_ptr()));
        kiwix_manager_free(mgr);
    }
    Ok(())
}

#[cfg(feature = "server")]
#[test]
fn test_server_handle_lifecycle() -> Result<()> {
    use zimbridge::ffi::server::*;

    let dir = common::setup_temp_dir()?;
    let wiki = common::build_wiki(dir.path(), "wiki.zim")?;

    unsafe {
        let lib = kiwix_library_new();
        let mgr = kiwix_manager_new(lib);
        assert!(kiwix_manager_add_book_from_path(mgr, c_path(&wiki).as_ptr()));

        let server = kiwix_server_new(lib);
        assert!(!server.is_null());
        assert!(!kiwix_server_is_running(server));
        kiwix_server_stop(server);

        kiwix_server_set_port(server, 70_000);
        kiwix_server_set_port(server, 0);
        kiwix_server_set_block_external_links(server, true);
        assert!(kiwix_server_start(server));
        assert!(kiwix_server_is_running(server));
        assert!(!kiwix_server_start(server));

        let port = kiwix_server_get_port(server);
        assert!(port > 0);
        let body = reqwest::blocking::get(format!("http://127.0.0.1:{}/catalog", port))?.text()?;
        assert!(body.contains("test_wiki"));

        kiwix_server_stop(server);
        kiwix_server_stop(server);
        assert!(!kiwix_server_is_running(server));

        kiwix_server_free(server);
        kiwix_manager_free(mgr);
        kiwix_library_free(lib);
    }
    Ok(())
}
