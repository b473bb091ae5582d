// Suggest command - title suggestions
use anyhow::Result;
use clap::{Args, ValueHint};
use std::path::PathBuf;
use zimbridge::constants;
use zimbridge::{Archive, SuggestionSearcher};

#[derive(Args)]
#[command(about = "Title suggestions for a partial query")]
pub struct SuggestCommand {
    /// Archive file
    #[arg(value_hint = ValueHint::FilePath)]
    pub archive: PathBuf,

    /// Partial title; the last word matches as a prefix
    pub query: String,

    /// Maximum suggestions
    #[arg(short = 'n', long, default_value_t = constants::DEFAULT_SUGGESTION_COUNT)]
    pub count: usize,
}

pub fn run(cmd: SuggestCommand, verbose: bool) -> Result<()> {
    let archive = Archive::open(&cmd.archive)?;
    let mut searcher = SuggestionSearcher::new(&archive);
    searcher.set_verbose(verbose);

    let search = searcher.suggest(&cmd.query)?;
    for suggestion in search.results(0, cmd.count).records() {
        match &suggestion.snippet {
            Some(snippet) => println!("{}\t{}\t{}", suggestion.path, suggestion.title, snippet),
            None => println!("{}\t{}", suggestion.path, suggestion.title),
        }
    }
    Ok(())
}
