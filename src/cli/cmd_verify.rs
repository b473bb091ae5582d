// Verify command - checksum and cluster decoding
use super::progress::ProgressBar;
use anyhow::Result;
use clap::{Args, ValueHint};
use std::path::PathBuf;
use std::time::Instant;
use zimbridge::Archive;
use zimbridge::format::format_duration_short;

#[derive(Args)]
#[command(
    about = "Check archive integrity",
    long_about = "Recompute each archive's SHA-256 checksum and decode every cluster.
Exits with an error if any archive fails.",
    help_template = crate::clap_help!(
        examples: "  # One archive\n  \
                   {bin} verify wiki.zim\n\n  \
                   # Several\n  \
                   {bin} verify *.zim"
    )
)]
pub struct VerifyCommand {
    /// Archive files
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    pub archives: Vec<PathBuf>,
}

pub fn run(cmd: VerifyCommand, quiet: bool) -> Result<()> {
    let start = Instant::now();
    let mut progress = ProgressBar::with_bytes(cmd.archives.len(), quiet);
    let mut failed = 0usize;

    for path in &cmd.archives {
        let outcome = Archive::open(path).and_then(|archive| {
            let ok = archive.check_integrity()?;
            Ok((ok, archive.filesize()))
        });
        match outcome {
            Ok((true, size)) => {
                progress.println(format!("✓ {}", path.display()));
                progress.inc(size);
            }
            Ok((false, size)) => {
                failed += 1;
                progress.println(format!("✗ {}: checksum mismatch", path.display()));
                progress.inc(size);
            }
            Err(e) => {
                failed += 1;
                progress.println(format!("✗ {}: {:#}", path.display(), e));
                progress.inc(0);
            }
        }
    }
    progress.finish();

    if failed > 0 {
        anyhow::bail!("{} of {} archives failed verification", failed, cmd.archives.len());
    }
    log::info!(
        "{} archives verified in {}",
        cmd.archives.len(),
        format_duration_short(start.elapsed())
    );
    Ok(())
}
