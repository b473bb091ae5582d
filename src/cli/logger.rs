// Logging setup for the CLI
use std::io::Write;

/// Install env_logger: warnings by default, `-v` adds debug output from this
/// crate, `--quiet` keeps errors only. `RUST_LOG` overrides both.
pub fn init_logger(verbose: bool, quiet: bool) {
    if std::env::var("RUST_LOG").is_ok() {
        env_logger::init();
        return;
    }

    let default_level = if quiet {
        log::LevelFilter::Error
    } else if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level).format(|buf, record| {
        if record.level() >= log::Level::Debug {
            writeln!(buf, "[{}] {}", record.level(), record.args())
        } else {
            writeln!(buf, "{}", record.args())
        }
    });

    if verbose {
        builder.filter_module("zimbridge", log::LevelFilter::Debug);
        builder.filter_module("hyper", log::LevelFilter::Info);
        builder.filter_module("tokio", log::LevelFilter::Info);
        builder.filter_module("tower_http", log::LevelFilter::Info);
    }

    builder.init();
}
