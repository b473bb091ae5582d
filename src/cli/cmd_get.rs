// Get command - dump an entry's content
use anyhow::{Context, Result};
use clap::{Args, ValueHint};
use std::io::Write;
use std::path::PathBuf;
use zimbridge::Archive;

#[derive(Args)]
#[command(
    about = "Print or save an entry's content",
    help_template = crate::clap_help!(
        examples: "  # Print an article\n  \
                   {bin} get wiki.zim A/Rust\n\n  \
                   # Save an image\n  \
                   {bin} get wiki.zim I/logo.png -o logo.png\n\n  \
                   # Main page\n  \
                   {bin} get wiki.zim --main"
    )
)]
pub struct GetCommand {
    /// Archive file
    #[arg(value_hint = ValueHint::FilePath)]
    pub archive: PathBuf,

    /// Entry path
    #[arg(required_unless_present = "main")]
    pub path: Option<String>,

    /// Use the main page instead of a path
    #[arg(long, conflicts_with = "path")]
    pub main: bool,

    /// Do not follow redirects
    #[arg(long)]
    pub no_follow: bool,

    /// Write to a file instead of stdout
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

pub fn run(cmd: GetCommand) -> Result<()> {
    let archive = Archive::open(&cmd.archive)?;
    let entry = match &cmd.path {
        Some(path) => archive.entry_by_path(path)?,
        None => archive.main_entry()?,
    };
    let item = entry.item(!cmd.no_follow)?;
    let data = item.data()?;

    log::debug!("{} ({}, {} bytes)", item.path(), item.mimetype(), data.len());

    match cmd.output {
        Some(path) => {
            std::fs::write(&path, &data).with_context(|| format!("Cannot write {}", path.display()))?;
            log::info!("Wrote {} bytes to {}", data.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
