use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd_create;
mod cmd_get;
mod cmd_info;
mod cmd_library;
mod cmd_ls;
mod cmd_search;
mod cmd_serve;
mod cmd_suggest;
mod cmd_verify;

mod logger;
mod progress;

fn format_help_template() -> &'static str {
    concat!(
        "{about-with-newline}\n\n",
        "{usage-heading}\n  {usage}\n\n",
        "Options:\n{options}\n\n",
        "Reading:\n",
        "  info      Show archive header and metadata\n",
        "  ls        List entries in path order\n",
        "  get       Print or save an entry's content\n",
        "\n",
        "Search:\n",
        "  search    Full-text search\n",
        "  suggest   Title suggestions\n",
        "\n",
        "Authoring:\n",
        "  create    Build an archive from a directory\n",
        "  verify    Check archive integrity\n",
        "\n",
        "Catalog:\n",
        "  library   Scan a directory and list its books\n",
        "  serve     Serve archives over HTTP\n",
        "\n",
        "See 'zimbridge <COMMAND> --help' for more information on a specific command.\n"
    )
}

#[derive(Parser)]
#[command(bin_name = "zimbridge")]
#[command(version = zimbridge::constants::VERSION)]
#[command(about = concat!("zimbridge v", env!("CARGO_PKG_VERSION"), " - offline content archives"))]
#[command(propagate_version = true)]
#[command(help_template = format_help_template())]
pub struct Cli {
    /// Suppress progress output
    #[arg(long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Info(cmd_info::InfoCommand),
    Ls(cmd_ls::LsCommand),
    Get(cmd_get::GetCommand),
    Search(cmd_search::SearchCommand),
    Suggest(cmd_suggest::SuggestCommand),
    Create(cmd_create::CreateCommand),
    Verify(cmd_verify::VerifyCommand),
    Library(cmd_library::LibraryCommand),
    Serve(cmd_serve::ServeCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logger::init_logger(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Info(cmd) => cmd_info::run(cmd)?,
        Commands::Ls(cmd) => cmd_ls::run(cmd)?,
        Commands::Get(cmd) => cmd_get::run(cmd)?,
        Commands::Search(cmd) => cmd_search::run(cmd)?,
        Commands::Suggest(cmd) => cmd_suggest::run(cmd, cli.verbose)?,
        Commands::Create(cmd) => cmd_create::run(cmd, cli.verbose, cli.quiet)?,
        Commands::Verify(cmd) => cmd_verify::run(cmd, cli.quiet)?,
        Commands::Library(cmd) => cmd_library::run(cmd, cli.verbose)?,
        Commands::Serve(cmd) => cmd_serve::run(cmd, cli.verbose)?,
    }

    Ok(())
}

/// Help template with an examples section; `{bin}` expands to the binary name
#[macro_export]
macro_rules! clap_help {
    (examples: $examples:literal) => {{
        const BIN: &str = env!("CARGO_PKG_NAME");
        concat!(
            "{about-with-newline}\n",
            "{usage-heading} {usage}\n\n",
            "{all-args}\n\n",
            "Examples:\n",
            $examples
        )
        .replace("{bin}", BIN)
    }};
}
