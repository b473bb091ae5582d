// Ls command - list entries (machine-readable)
use anyhow::Result;
use clap::{Args, ValueHint};
use std::path::PathBuf;
use zimbridge::Archive;
use zimbridge::format::format_bytes_compact;

#[derive(Args)]
#[command(
    about = "List entries in path order (machine-readable)",
    after_help = "Columns: index, path, mimetype (or '-> target' for redirects), size, title"
)]
pub struct LsCommand {
    /// Archive file
    #[arg(value_hint = ValueHint::FilePath)]
    pub archive: PathBuf,

    /// Only entries whose path starts with this prefix
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Show at most N entries (0 = all)
    #[arg(short = 'n', long, default_value = "0")]
    pub limit: usize,

    /// Print human-readable sizes
    #[arg(short = 'H', long = "human-readable")]
    pub human_readable: bool,

    /// Field separator
    #[arg(long, default_value = "\t")]
    pub separator: String,
}

pub fn run(cmd: LsCommand) -> Result<()> {
    let archive = Archive::open(&cmd.archive)?;
    let sep = cmd.separator.as_str();

    let entries = archive
        .iter_entries()
        .filter(|e| cmd.prefix.as_deref().is_none_or(|p| e.path().starts_with(p)));
    let limit = if cmd.limit == 0 { usize::MAX } else { cmd.limit };

    for entry in entries.take(limit) {
        let (kind, size) = if entry.is_redirect() {
            (format!("-> {}", entry.redirect_target().unwrap_or("?")), String::new())
        } else {
            let item = entry.item(false)?;
            let size = if cmd.human_readable {
                format_bytes_compact(item.size())
            } else {
                item.size().to_string()
            };
            (item.mimetype().to_string(), size)
        };
        println!(
            "{}{sep}{}{sep}{}{sep}{}{sep}{}",
            entry.index(),
            entry.path(),
            kind,
            size,
            entry.title()
        );
    }

    Ok(())
}
