// Create command - build an archive from a directory tree
use super::progress::ProgressBar;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum, ValueHint};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Instant;
use zimbridge::format::{format_bytes, format_duration_short, format_number};
use zimbridge::{Archive, Compression, Creator, WriterItem, constants};

#[derive(Clone, Copy, ValueEnum)]
pub enum CompressionArg {
    None,
    Zstd,
}

impl From<CompressionArg> for Compression {
    fn from(value: CompressionArg) -> Self {
        match value {
            CompressionArg::None => Compression::None,
            CompressionArg::Zstd => Compression::Zstd,
        }
    }
}

#[derive(Args)]
#[command(
    about = "Build an archive from a directory",
    long_about = "Build an archive from every file under a directory. Entry paths are the
file paths relative to the directory, with '/' separators. Mimetypes are guessed
from file extensions; HTML files become front articles titled after their
<title> element.",
    help_template = crate::clap_help!(
        examples: "  # Basic\n  \
                   {bin} create ./site site.zim --main index.html\n\n  \
                   # With metadata\n  \
                   {bin} create ./site site.zim --main index.html --title \"My site\" --language eng\n\n  \
                   # Uncompressed, no search index\n  \
                   {bin} create ./site site.zim --compression none --no-index"
    )
)]
pub struct CreateCommand {
    /// Source directory
    #[arg(value_hint = ValueHint::DirPath)]
    pub source: PathBuf,

    /// Output archive
    #[arg(value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Main page path (relative to the source directory)
    #[arg(long)]
    pub main: Option<String>,

    /// Title metadata (defaults to the directory name)
    #[arg(long)]
    pub title: Option<String>,

    /// Description metadata
    #[arg(long)]
    pub description: Option<String>,

    /// Language metadata (ISO 639-3)
    #[arg(long)]
    pub language: Option<String>,

    /// Name metadata (stable book name)
    #[arg(long)]
    pub name: Option<String>,

    /// Creator metadata
    #[arg(long)]
    pub creator: Option<String>,

    /// 48x48 PNG illustration
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub illustration: Option<PathBuf>,

    /// Cluster compression
    #[arg(long, value_enum, default_value = "zstd")]
    pub compression: CompressionArg,

    /// zstd level
    #[arg(long, default_value_t = constants::DEFAULT_COMPRESSION_LEVEL)]
    pub level: i32,

    /// Skip the full-text index
    #[arg(long)]
    pub no_index: bool,
}

pub fn run(cmd: CreateCommand, verbose: bool, quiet: bool) -> Result<()> {
    let start = Instant::now();
    let files = collect_files(&cmd.source)?;
    if files.is_empty() {
        anyhow::bail!("No files found in {}", cmd.source.display());
    }

    let mut creator = Creator::new();
    creator.config_verbose(verbose)?;
    creator.config_compression(cmd.compression.into())?;
    creator.config_compression_level(cmd.level)?;
    creator.config_indexing(!cmd.no_index)?;
    creator.start_zim_creation(&cmd.output)?;

    let mut progress = ProgressBar::with_bytes(files.len(), quiet);
    for file in &files {
        let item = file_item(&cmd.source, file)?;
        let size = std::fs::metadata(file).map(|m| m.len()).unwrap_or(0);
        creator.add_item(item)?;
        progress.inc(size);
    }
    progress.finish();

    let default_title = cmd
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    creator.add_metadata("Title", cmd.title.as_deref().unwrap_or(&default_title))?;
    let optional = [
        ("Description", &cmd.description),
        ("Language", &cmd.language),
        ("Name", &cmd.name),
        ("Creator", &cmd.creator),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            creator.add_metadata(key, value)?;
        }
    }
    creator.add_metadata("Scraper", &constants::created_by())?;

    if let Some(path) = &cmd.illustration {
        let png = std::fs::read(path).with_context(|| format!("Cannot read {}", path.display()))?;
        creator.add_illustration(48, &png)?;
    }
    if let Some(main) = &cmd.main {
        creator.set_main_path(main)?;
    }

    creator.finish_zim_creation()?;

    let archive = Archive::open(&cmd.output)?;
    eprintln!(
        "✓ Created {} ({} entries, {} articles, {}) in {}",
        cmd.output.display(),
        format_number(archive.entry_count()),
        format_number(archive.article_count()),
        format_bytes(archive.filesize()),
        format_duration_short(start.elapsed())
    );
    Ok(())
}

/// Every regular file below `dir`, in sorted order
fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries = std::fs::read_dir(&current).with_context(|| format!("Cannot read {}", current.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn file_item(root: &Path, file: &Path) -> Result<WriterItem> {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let path = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    let mimetype = mime_guess::from_path(file).first_or_octet_stream();
    let is_html = mimetype.type_() == mime_guess::mime::TEXT && mimetype.subtype() == mime_guess::mime::HTML;

    let title = if is_html {
        html_title(file).unwrap_or_else(|| stem(file))
    } else {
        stem(file)
    };
    WriterItem::file_item(path, mimetype.essence_str(), title, file, is_html)
}

fn stem(file: &Path) -> String {
    file.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn html_title(file: &Path) -> Option<String> {
    let html = std::fs::read_to_string(file).ok()?;
    let re = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok()?;
    let title = re.captures(&html)?.get(1)?.as_str().trim().to_string();
    (!title.is_empty()).then_some(title)
}
