// Search command - full-text search
use anyhow::Result;
use clap::{Args, ValueHint};
use std::path::PathBuf;
use zimbridge::constants;
use zimbridge::{Archive, Query, Searcher};

#[derive(Args)]
#[command(
    about = "Full-text search",
    help_template = crate::clap_help!(
        examples: "  # First page\n  \
                   {bin} search wiki.zim \"memory safety\"\n\n  \
                   # Second page of 10\n  \
                   {bin} search wiki.zim rust --start 10 -n 10\n\n  \
                   # JSON lines\n  \
                   {bin} search wiki.zim rust --json"
    )
)]
pub struct SearchCommand {
    /// Archive file
    #[arg(value_hint = ValueHint::FilePath)]
    pub archive: PathBuf,

    /// Query words
    pub query: String,

    /// Index of the first result
    #[arg(long, default_value = "0")]
    pub start: usize,

    /// Results per page
    #[arg(short = 'n', long, default_value_t = constants::DEFAULT_SEARCH_PAGE_LENGTH)]
    pub count: usize,

    /// One JSON object per result
    #[arg(long)]
    pub json: bool,
}

pub fn run(cmd: SearchCommand) -> Result<()> {
    let archive = Archive::open(&cmd.archive)?;
    let searcher = Searcher::new(&archive)?;
    let search = searcher.search(&Query::new(cmd.query.as_str()))?;
    let results = search.results(cmd.start, cmd.count);

    if cmd.json {
        for result in results.records() {
            println!("{}", serde_json::to_string(result)?);
        }
        return Ok(());
    }

    println!(
        "{} matches for \"{}\" (showing {}-{})",
        search.estimated_matches(),
        cmd.query,
        cmd.start + usize::from(!results.is_empty()),
        cmd.start + results.size()
    );
    for result in results.records() {
        println!();
        println!("{:>3}%  {}  [{}]", result.score, result.title, result.path);
        if !result.snippet.is_empty() {
            println!("      {}", result.snippet);
        }
    }
    Ok(())
}
