mod common;

use anyhow::Result;
use zimbridge::{Archive, Compression, Creator, CreatorConfig, WriterItem};

#[test]
fn test_file_items_and_uncompressed_clusters() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let source = dir.path().join("page.html");
    std::fs::write(&source, "<html><body>Served from disk</body></html>")?;
    let output = dir.path().join("files.zim");

    let mut creator = Creator::with_config(CreatorConfig {
        compression: Compression::None,
        cluster_size: 16,
        ..CreatorConfig::default()
    });
    creator.start_zim_creation(&output)?;
    creator.add_item(WriterItem::file_item("page.html", "text/html", "Page", &source, true)?)?;
    for i in 0..20 {
        let body = format!("note number {} with some filler text", i);
        creator.add_item(WriterItem::string_item(format!("notes/{:02}", i), "text/plain", "", body, false))?;
    }
    creator.set_main_path("page.html")?;
    creator.finish_zim_creation()?;
    assert!(creator.is_finished());

    let archive = Archive::open(&output)?;
    assert_eq!(archive.compression(), Compression::None);
    assert_eq!(archive.entry_count(), 21);
    assert!(archive.check_integrity()?);

    let page = archive.main_entry()?.item(true)?;
    assert_eq!(page.data()?, b"<html><body>Served from disk</body></html>");
    let note = archive.entry_by_path("notes/07")?.item(false)?;
    assert_eq!(note.data()?, b"note number 7 with some filler text");
    // Untitled entries fall back to their path
    assert_eq!(note.title(), "notes/07");
    Ok(())
}

#[test]
fn test_file_item_requires_existing_file() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    assert!(WriterItem::file_item("a", "text/plain", "", dir.path().join("missing"), false).is_err());
    assert!(WriterItem::file_item("a", "text/plain", "", dir.path(), false).is_err());
    Ok(())
}

#[test]
fn test_dangling_redirect_and_main_path_are_dropped() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let output = dir.path().join("dangling.zim");

    let mut creator = Creator::new();
    creator.start_zim_creation(&output)?;
    creator.add_item(WriterItem::string_item("a", "text/plain", "A", "a", false))?;
    creator.add_redirection("to-a", "To A", "a")?;
    creator.add_redirection("to-nowhere", "Nowhere", "missing")?;
    creator.set_main_path("missing")?;
    creator.finish_zim_creation()?;

    let archive = Archive::open(&output)?;
    assert!(archive.has_entry_by_path("to-a"));
    assert!(!archive.has_entry_by_path("to-nowhere"));
    assert!(!archive.has_main_entry());
    Ok(())
}

#[test]
fn test_redirect_chains_are_kept_only_when_they_reach_content() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let output = dir.path().join("chains.zim");

    let mut creator = Creator::new();
    creator.start_zim_creation(&output)?;
    creator.add_item(WriterItem::string_item("c", "text/plain", "C", "content", false))?;
    creator.add_redirection("a", "", "b")?;
    creator.add_redirection("b", "", "c")?;
    creator.add_redirection("x", "", "y")?;
    creator.add_redirection("y", "", "missing")?;
    creator.add_redirection("loop-1", "", "loop-2")?;
    creator.add_redirection("loop-2", "", "loop-1")?;
    creator.finish_zim_creation()?;

    let archive = Archive::open(&output)?;
    assert_eq!(archive.entry_count(), 3);
    assert_eq!(archive.entry_by_path("a")?.item(true)?.path(), "c");
    assert!(archive.has_entry_by_path("b"));
    for dropped in ["x", "y", "loop-1", "loop-2"] {
        assert!(!archive.has_entry_by_path(dropped), "{} should be dropped", dropped);
    }
    Ok(())
}

#[test]
fn test_state_machine_rejects_out_of_order_calls() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let output = dir.path().join("order.zim");
    let item = || WriterItem::string_item("a", "text/plain", "", "a", false);

    let mut creator = Creator::new();
    assert!(creator.add_item(item()).is_err());
    assert!(creator.finish_zim_creation().is_err());

    creator.start_zim_creation(&output)?;
    assert!(creator.is_started());
    assert!(creator.config_verbose(true).is_err());
    assert!(creator.start_zim_creation(&output).is_err());
    creator.add_item(item())?;
    assert!(creator.add_item(item()).is_err(), "duplicate path");
    assert!(creator.add_metadata("", "x").is_err());
    creator.add_metadata("Title", "x")?;
    assert!(creator.add_metadata("Title", "y").is_err());
    assert!(creator.add_illustration(48, &[]).is_err());
    creator.finish_zim_creation()?;

    assert!(creator.add_item(WriterItem::string_item("b", "text/plain", "", "b", false)).is_err());
    assert!(creator.finish_zim_creation().is_err());
    Ok(())
}

#[test]
fn test_failed_start_makes_creator_unusable() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let unwritable = dir.path().join("no/such/dir/out.zim");

    let mut creator = Creator::new();
    assert!(creator.start_zim_creation(&unwritable).is_err());
    assert!(creator.add_item(WriterItem::string_item("a", "text/plain", "", "a", false)).is_err());
    assert!(creator.start_zim_creation(dir.path().join("ok.zim")).is_err());
    assert!(creator.finish_zim_creation().is_err());
    Ok(())
}

#[test]
fn test_indexing_can_be_disabled() -> Result<()> {
    let dir = common::setup_temp_dir()?;
    let indexed = Archive::open(common::build_plain(dir.path(), "on.zim", "On", true)?)?;
    let plain = Archive::open(common::build_plain(dir.path(), "off.zim", "Off", false)?)?;
    assert!(indexed.has_fulltext_index());
    assert!(!plain.has_fulltext_index());
    Ok(())
}
