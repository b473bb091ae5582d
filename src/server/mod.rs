// Embedded content server: serves the books of a library over HTTP.
//
// `Server` is a small state machine (configured -> running -> stopped). It owns
// a dedicated tokio runtime so it can be driven from synchronous callers.

mod config;
mod error;
mod handle_content;
mod handle_root;
mod handle_search;
mod routes;
mod utils;

use crate::archive::Archive;
use crate::library::{Book, Library};
use crate::runtime::ServerRuntime;
use anyhow::{Context, Result};
use axum::Router;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

pub use config::ServerConfig;

/// How long `stop` waits for in-flight requests before aborting them
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// State shared by every request handler
#[derive(Clone)]
pub struct ServerState {
    pub library: Arc<Library>,
    pub config: ServerConfig,
    pub start_time: Instant,
    archives: Arc<RwLock<HashMap<String, Archive>>>,
}

impl ServerState {
    pub fn new(library: Arc<Library>, config: ServerConfig) -> Self {
        Self {
            library,
            config,
            start_time: Instant::now(),
            archives: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Resolve a book by id or name and open (or reuse) its archive
    pub fn book_archive(&self, key: &str) -> Result<(Book, Archive)> {
        let book = self
            .library
            .book_by_id_or_name(key)
            .with_context(|| format!("Book not found: {}", key))?;

        if let Some(archive) = self.archives.read().unwrap_or_else(|e| e.into_inner()).get(&book.id) {
            return Ok((book, archive.clone()));
        }

        let archive = book.open_archive()?;
        if self.config.verbose {
            log::debug!("[Server] Opened {} for book {}", archive.path().display(), book.id);
        }
        self.archives
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(book.id.clone(), archive.clone());
        Ok((book, archive))
    }
}

enum Status {
    Configured,
    Running(Box<RunningServer>),
    Stopped,
}

struct RunningServer {
    runtime: tokio::runtime::Runtime,
    control: ServerRuntime,
    task: tokio::task::JoinHandle<std::io::Result<()>>,
    local_addr: SocketAddr,
}

pub struct Server {
    library: Arc<Library>,
    config: ServerConfig,
    status: Status,
}

impl Server {
    pub fn new(library: Arc<Library>) -> Self {
        Self::with_config(library, ServerConfig::default())
    }

    pub fn with_config(library: Arc<Library>, config: ServerConfig) -> Self {
        Self {
            library,
            config,
            status: Status::Configured,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn library(&self) -> &Arc<Library> {
        &self.library
    }

    fn configurable(&mut self) -> Result<&mut ServerConfig> {
        if self.is_running() {
            anyhow::bail!("Server is running; stop it before changing its configuration");
        }
        Ok(&mut self.config)
    }

    pub fn set_address(&mut self, address: &str) -> Result<()> {
        self.configurable()?.address = address.to_string();
        Ok(())
    }

    pub fn set_port(&mut self, port: u16) -> Result<()> {
        self.configurable()?.port = port;
        Ok(())
    }

    pub fn set_block_external_links(&mut self, block: bool) -> Result<()> {
        self.configurable()?.block_external_links = block;
        Ok(())
    }

    pub fn set_verbose(&mut self, verbose: bool) -> Result<()> {
        self.configurable()?.verbose = verbose;
        Ok(())
    }

    /// Router over this server's library; usable without starting the server
    pub fn router(&self) -> Router {
        routes::create_router(ServerState::new(Arc::clone(&self.library), self.config.clone()))
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, Status::Running(_))
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.status {
            Status::Running(running) => Some(running.local_addr),
            _ => None,
        }
    }

    /// Bound port while running, configured port otherwise
    pub fn port(&self) -> u16 {
        self.local_addr().map(|a| a.port()).unwrap_or(self.config.port)
    }

    /// Bind the socket and start serving in the background
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            anyhow::bail!("Server is already running");
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("zim-server")
            .enable_all()
            .build()
            .context("Failed to build server runtime")?;

        let bind_addr = format!("{}:{}", self.config.address, self.config.port);
        let listener = runtime
            .block_on(tokio::net::TcpListener::bind(&bind_addr))
            .with_context(|| format!("Failed to bind to {}", bind_addr))?;
        let local_addr = listener.local_addr().context("Failed to read bound address")?;

        let control = ServerRuntime::new();
        let shutdown = control.create_shutdown_future();
        let app = self.router();
        let task = runtime.spawn(async move { axum::serve(listener, app).with_graceful_shutdown(shutdown).await });

        if self.config.verbose {
            log::info!(
                "[Server] Listening on http://{} ({} books)",
                local_addr,
                self.library.book_count(true, true)
            );
        }

        self.status = Status::Running(Box::new(RunningServer {
            runtime,
            control,
            task,
            local_addr,
        }));
        Ok(())
    }

    /// Stop serving and wait for the socket and in-flight requests to go away.
    /// Safe to call repeatedly or on a server that never started. Must not be
    /// called from inside an async runtime.
    pub fn stop(&mut self) {
        let running = match std::mem::replace(&mut self.status, Status::Stopped) {
            Status::Running(running) => running,
            other => {
                self.status = other;
                return;
            }
        };
        let RunningServer {
            runtime,
            control,
            mut task,
            local_addr,
        } = *running;

        control.trigger_shutdown();
        let joined = runtime.block_on(async { tokio::time::timeout(STOP_TIMEOUT, &mut task).await });
        match joined {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => log::warn!("[Server] {} stopped with error: {}", local_addr, e),
            Ok(Err(e)) => log::warn!("[Server] {} task failed: {}", local_addr, e),
            Err(_) => {
                log::warn!("[Server] {} did not drain in {:?}; aborting", local_addr, STOP_TIMEOUT);
                task.abort();
            }
        }
        runtime.shutdown_timeout(Duration::from_secs(1));

        if self.config.verbose {
            log::info!("[Server] Stopped {}", local_addr);
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}
