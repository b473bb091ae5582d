#![cfg(feature = "server")]

mod common;

use anyhow::Result;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use std::sync::Arc;
use zimbridge::{Library, Manager, Server};

struct Fixture {
    _dir: tempfile::TempDir,
    library: Arc<Library>,
    book_id: String,
}

fn fixture() -> Result<Fixture> {
    let dir = common::setup_temp_dir()?;
    let path = common::build_wiki(dir.path(), "wiki.zim")?;
    let library = Library::create();
    let book_id = Manager::new(Arc::clone(&library)).add_book_from_path(&path)?;
    Ok(Fixture {
        _dir: dir,
        library,
        book_id,
    })
}

fn start_local(library: &Arc<Library>, block_links: bool) -> Result<(Server, String)> {
    let mut server = Server::new(Arc::clone(library));
    server.set_address("127.0.0.1")?;
    server.set_port(0)?;
    server.set_block_external_links(block_links)?;
    server.start()?;
    let addr = server.local_addr().expect("bound address while running");
    Ok((server, format!("http://{}", addr)))
}

fn no_redirect_client() -> Result<Client> {
    Ok(Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}

#[test]
fn test_start_serves_landing_page_and_catalog() -> Result<()> {
    let fx = fixture()?;
    let (mut server, base) = start_local(&fx.library, false)?;
    assert!(server.is_running());
    assert_ne!(server.port(), 0);

    let body = reqwest::blocking::get(format!("{}/", base))?.text()?;
    assert!(body.starts_with("zimbridge server "));
    assert!(body.contains("Test Wiki"));
    assert!(body.contains("  browse:   /content/test_wiki"));

    let catalog: serde_json::Value = reqwest::blocking::get(format!("{}/catalog", base))?.json()?;
    let books = catalog.as_array().expect("catalog is an array");
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["id"], fx.book_id.as_str());
    assert_eq!(books[0]["article_count"], 4);

    server.stop();
    assert!(!server.is_running());
    Ok(())
}

#[test]
fn test_content_by_name_and_id() -> Result<()> {
    let fx = fixture()?;
    let (mut server, base) = start_local(&fx.library, false)?;
    let client = no_redirect_client()?;

    let resp = client.get(format!("{}/content/test_wiki/A/Rust", base)).send()?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "text/html");
    assert_eq!(resp.headers()["cache-control"], "public, max-age=86400");
    assert!(resp.text()?.contains("memory safety"));

    // Redirect entries resolve to the target's bytes
    let resp = client.get(format!("{}/content/{}/A/Rust_lang", base, fx.book_id)).send()?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text()?.contains("memory safety"));

    let resp = client.get(format!("{}/content/test_wiki/I/logo.png", base)).send()?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.bytes()?.as_ref(), common::PNG_BYTES);

    server.stop();
    Ok(())
}

#[test]
fn test_book_root_redirects_to_main_page() -> Result<()> {
    let fx = fixture()?;
    let (mut server, base) = start_local(&fx.library, false)?;
    let client = no_redirect_client()?;

    let resp = client.get(format!("{}/content/test_wiki", base)).send()?;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()["location"], "/content/test_wiki/index.html");

    let resp = client.get(format!("{}/random?content=test_wiki", base)).send()?;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let location = resp.headers()["location"].to_str()?.to_string();
    assert!(location.starts_with("/content/test_wiki/"));

    server.stop();
    Ok(())
}

#[test]
fn test_missing_book_and_entry_are_404() -> Result<()> {
    let fx = fixture()?;
    let (mut server, base) = start_local(&fx.library, false)?;

    let resp = reqwest::blocking::get(format!("{}/content/test_wiki/A/Nope", base))?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = resp.json()?;
    assert!(body["error"].as_str().unwrap_or_default().contains("Entry not found"));

    let resp = reqwest::blocking::get(format!("{}/content/unknown_book/A/Rust", base))?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = reqwest::blocking::get(format!("{}/search?pattern=rust", base))?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    server.stop();
    Ok(())
}

#[test]
fn test_search_and_suggest_endpoints() -> Result<()> {
    let fx = fixture()?;
    let (mut server, base) = start_local(&fx.library, false)?;

    let body: serde_json::Value =
        reqwest::blocking::get(format!("{}/search?content=test_wiki&pattern=rust&pageLength=5", base))?.json()?;
    assert_eq!(body["book"], fx.book_id.as_str());
    assert_eq!(body["pattern"], "rust");
    assert_eq!(body["start"], 0);
    assert!(body["estimatedMatches"].as_u64().unwrap_or_default() >= 1);
    assert_eq!(body["results"][0]["path"], "A/Rust");
    assert_eq!(body["results"][0]["score"], 100);

    let body: serde_json::Value =
        reqwest::blocking::get(format!("{}/suggest?content=test_wiki&term=rus", base))?.json()?;
    let titles: Vec<&str> = body
        .as_array()
        .expect("suggestions are an array")
        .iter()
        .filter_map(|s| s["title"].as_str())
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"Rust programming language"));
    assert!(titles.contains(&"Rusty nail"));

    // Single-character terms return nothing
    let body: serde_json::Value =
        reqwest::blocking::get(format!("{}/suggest?content=test_wiki&term=r", base))?.json()?;
    assert_eq!(body, serde_json::json!([]));

    server.stop();
    Ok(())
}

#[test]
fn test_block_external_links_injects_script() -> Result<()> {
    let fx = fixture()?;
    let (mut server, base) = start_local(&fx.library, true)?;

    let html = reqwest::blocking::get(format!("{}/content/test_wiki/A/Python", base))?.text()?;
    let script = html.find("External link blocked").expect("script injected");
    let head_end = html.find("</head>").expect("head kept");
    assert!(script < head_end);

    // Non-HTML content is untouched
    let css = reqwest::blocking::get(format!("{}/content/test_wiki/style.css", base))?.text()?;
    assert!(!css.contains("<script>"));

    server.stop();
    Ok(())
}

#[test]
fn test_stop_is_idempotent_and_releases_port() -> Result<()> {
    let fx = fixture()?;

    let mut idle = Server::new(Arc::clone(&fx.library));
    idle.stop();
    assert!(!idle.is_running());

    let (mut server, base) = start_local(&fx.library, false)?;
    let port = server.port();
    server.stop();
    server.stop();
    assert!(!server.is_running());
    assert!(reqwest::blocking::get(format!("{}/", base)).is_err());

    // Same port can be bound again after stop
    let mut again = Server::new(Arc::clone(&fx.library));
    again.set_address("127.0.0.1")?;
    again.set_port(port)?;
    again.start()?;
    assert_eq!(again.port(), port);
    again.stop();
    Ok(())
}

#[test]
fn test_configuration_locked_while_running() -> Result<()> {
    let fx = fixture()?;
    let (mut server, _base) = start_local(&fx.library, false)?;

    assert!(server.set_port(8080).is_err());
    assert!(server.set_block_external_links(false).is_err());
    assert!(server.start().is_err());

    server.stop();
    assert!(server.set_port(0).is_ok());
    server.start()?;
    assert!(server.is_running());
    server.stop();
    Ok(())
}

#[test]
fn test_library_changes_are_visible_to_running_server() -> Result<()> {
    let fx = fixture()?;
    let empty = Library::create();
    let (mut server, base) = start_local(&empty, false)?;

    let body = reqwest::blocking::get(format!("{}/", base))?.text()?;
    assert!(body.contains("No books in the library."));

    for book in fx.library.books() {
        empty.add_book(book);
    }
    let resp = reqwest::blocking::get(format!("{}/content/test_wiki/A/Rust", base))?;
    assert_eq!(resp.status(), StatusCode::OK);

    server.stop();
    Ok(())
}
