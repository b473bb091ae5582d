// Info command - archive header, counts and metadata
use anyhow::Result;
use clap::{Args, ValueHint};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use zimbridge::Archive;
use zimbridge::format::{format_bytes, format_number};

#[derive(Args)]
#[command(
    about = "Show archive header and metadata",
    help_template = crate::clap_help!(
        examples: "  # Summary\n  \
                   {bin} info wiki.zim\n\n  \
                   # Machine-readable\n  \
                   {bin} info wiki.zim --json"
    )
)]
pub struct InfoCommand {
    /// Archive file
    #[arg(value_hint = ValueHint::FilePath)]
    pub archive: PathBuf,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ArchiveInfo {
    path: String,
    uuid: String,
    created_at: String,
    compression: String,
    size: u64,
    entry_count: u64,
    article_count: u64,
    media_count: u64,
    main_path: Option<String>,
    fulltext_index: bool,
    title_index: bool,
    metadata: BTreeMap<String, String>,
}

pub fn run(cmd: InfoCommand) -> Result<()> {
    let archive = Archive::open(&cmd.archive)?;

    let mut metadata = BTreeMap::new();
    for key in archive.metadata_keys() {
        if key.starts_with("Illustration_") {
            let size = archive.metadata(&key).map(|d| d.len()).unwrap_or(0);
            metadata.insert(key, format!("<{} bytes>", size));
        } else {
            let value = archive.metadata_string(&key).unwrap_or_default();
            metadata.insert(key, value);
        }
    }

    let info = ArchiveInfo {
        path: archive.path().display().to_string(),
        uuid: archive.uuid().to_string(),
        created_at: archive.created_at().to_string(),
        compression: format!("{:?}", archive.compression()).to_lowercase(),
        size: archive.filesize(),
        entry_count: archive.entry_count(),
        article_count: archive.article_count(),
        media_count: archive.media_count(),
        main_path: archive.main_path().map(str::to_string),
        fulltext_index: archive.has_fulltext_index(),
        title_index: archive.has_title_index(),
        metadata,
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Archive:      {}", info.path);
    println!("UUID:         {}", info.uuid);
    println!("Created:      {}", info.created_at);
    println!("Compression:  {}", info.compression);
    println!("Size:         {}", format_bytes(info.size));
    println!("Entries:      {}", format_number(info.entry_count));
    println!("Articles:     {}", format_number(info.article_count));
    println!("Media:        {}", format_number(info.media_count));
    println!("Main page:    {}", info.main_path.as_deref().unwrap_or("(none)"));
    println!("Full-text:    {}", if info.fulltext_index { "yes" } else { "no" });
    println!("Title index:  {}", if info.title_index { "yes" } else { "no" });

    if !info.metadata.is_empty() {
        println!();
        println!("Metadata:");
        let width = info.metadata.keys().map(|k| k.len()).max().unwrap_or(0);
        for (key, value) in &info.metadata {
            println!("  {:width$}  {}", key, value, width = width);
        }
    }

    Ok(())
}
