// Serve command - HTTP server over a catalog
use anyhow::Result;
use clap::{Args, ValueHint};
use std::path::PathBuf;

#[derive(Args)]
#[command(
    about = "Serve archives over HTTP",
    long_about = "Start the embedded content server over every archive found in the given
paths. Runs until Ctrl+C. Books are reachable under /content/{id or name}/;
/search, /suggest, /random and /catalog take the book as ?content=.",
    help_template = crate::clap_help!(
        examples: "  # Serve a directory on the default port (8080)\n  \
                   {bin} serve ./library\n\n  \
                   # Custom address and port\n  \
                   {bin} serve wiki.zim --host 0.0.0.0 --port 3000\n\n  \
                   # Keep readers inside the archive\n  \
                   {bin} serve ./library --block-external-links"
    )
)]
pub struct ServeCommand {
    /// Directories or archive files
    #[arg(required = true, value_hint = ValueHint::AnyPath)]
    pub paths: Vec<PathBuf>,

    /// HTTP server port
    #[arg(long, default_value_t = zimbridge::constants::DEFAULT_PORT, help_heading = "Server Options")]
    pub port: u16,

    /// HTTP server host
    #[arg(long, default_value = zimbridge::constants::DEFAULT_ADDRESS, help_heading = "Server Options")]
    pub host: String,

    /// Inject a script that blocks navigation to external links
    #[arg(long, help_heading = "Server Options")]
    pub block_external_links: bool,
}

pub fn run(cmd: ServeCommand, verbose: bool) -> Result<()> {
    #[cfg(not(feature = "server"))]
    {
        let _ = (cmd, verbose);
        anyhow::bail!("Server feature is not enabled. Rebuild with --features server");
    }

    #[cfg(feature = "server")]
    {
        run_server(cmd, verbose)
    }
}

#[cfg(feature = "server")]
fn run_server(cmd: ServeCommand, verbose: bool) -> Result<()> {
    use anyhow::Context;
    use zimbridge::{Library, Manager, Server, ServerRuntime};

    let library = Library::create();
    let manager = Manager::new(library.clone()).with_verbose(verbose);
    let added = super::cmd_library::populate(&manager, &cmd.paths);
    if added == 0 {
        log::warn!("No archives found; serving an empty library");
    }

    let mut server = Server::new(library);
    server.set_address(&cmd.host)?;
    server.set_port(cmd.port)?;
    server.set_block_external_links(cmd.block_external_links)?;
    server.set_verbose(verbose)?;
    server.start()?;

    let addr = server.local_addr().context("Server has no bound address")?;
    eprintln!("Serving {} books on http://{}", added, addr);
    eprintln!("Press Ctrl+C to stop");

    let signals = ServerRuntime::new().with_ctrl_c();
    let waiter = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build signal runtime")?;
    waiter.block_on(signals.create_shutdown_future());
    drop(waiter);

    eprintln!("Shutting down...");
    server.stop();
    Ok(())
}
