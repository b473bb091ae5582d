// src/creator.rs
//! Archive authoring: configure, start, add items/metadata/redirects, finish
//!
//! Items are handed to a background worker which reads their content, packs
//! it into clusters, compresses each cluster into a temporary file and builds
//! the full-text index. `finish_zim_creation` waits for the worker and writes
//! the final archive.
use crate::archive_format::{
    self, ArchiveHeader, BlobRef, Compression, DirEntry, EntryTarget, FulltextIndex, IndexedDocument,
    MetadataEntry, Posting, SectionRef, TitleIndex,
};
use crate::constants;
use crate::text;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::JoinHandle;
use std::time::Instant;

/// Jobs queued for the worker before `add_*` calls block
const WORKER_QUEUE_DEPTH: usize = 256;

const METADATA_MIMETYPE: &str = "text/plain;charset=utf-8";
const ILLUSTRATION_MIMETYPE: &str = "image/png";

/// Options applied when the session starts
#[derive(Debug, Clone)]
pub struct CreatorConfig {
    pub verbose: bool,
    pub compression: Compression,
    pub compression_level: i32,
    pub cluster_size: usize,
    pub indexing: bool,
}

impl Default for CreatorConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            compression: Compression::Zstd,
            compression_level: constants::DEFAULT_COMPRESSION_LEVEL,
            cluster_size: constants::DEFAULT_CLUSTER_SIZE,
            indexing: true,
        }
    }
}

/// Where a writer item's content comes from
#[derive(Debug, Clone)]
pub enum ItemSource {
    Memory(Vec<u8>),
    File(PathBuf),
}

/// A content unit destined for a creator
#[derive(Debug, Clone)]
pub struct WriterItem {
    path: String,
    mimetype: String,
    title: String,
    front_article: bool,
    source: ItemSource,
}

impl WriterItem {
    /// Item whose content is copied into memory now
    pub fn string_item(
        path: impl Into<String>,
        mimetype: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<Vec<u8>>,
        front_article: bool,
    ) -> Self {
        Self {
            path: path.into(),
            mimetype: mimetype.into(),
            title: title.into(),
            front_article,
            source: ItemSource::Memory(content.into()),
        }
    }

    /// Item whose content is read from `filepath` when the archive is written
    pub fn file_item(
        path: impl Into<String>,
        mimetype: impl Into<String>,
        title: impl Into<String>,
        filepath: impl Into<PathBuf>,
        front_article: bool,
    ) -> Result<Self> {
        let filepath = filepath.into();
        let meta = std::fs::metadata(&filepath)
            .with_context(|| format!("Cannot access item source {}", filepath.display()))?;
        if !meta.is_file() {
            anyhow::bail!("Item source {} is not a file", filepath.display());
        }
        Ok(Self {
            path: path.into(),
            mimetype: mimetype.into(),
            title: title.into(),
            front_article,
            source: ItemSource::File(filepath),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_front_article(&self) -> bool {
        self.front_article
    }

    pub fn source(&self) -> &ItemSource {
        &self.source
    }

    /// Content bytes; file items are read here
    pub fn content(&self) -> Result<Vec<u8>> {
        match &self.source {
            ItemSource::Memory(data) => Ok(data.clone()),
            ItemSource::File(path) => {
                let mut data = Vec::new();
                File::open(path)
                    .and_then(|mut f| f.read_to_end(&mut data))
                    .with_context(|| format!("Failed to read item source {}", path.display()))?;
                Ok(data)
            }
        }
    }
}

enum Job {
    Item(Arc<WriterItem>),
    Metadata { name: String, mimetype: String, content: Vec<u8> },
}

enum State {
    Configured,
    Started(Box<Session>),
    Finished,
    Failed,
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Configured => "configured",
            State::Started(_) => "started",
            State::Finished => "finished",
            State::Failed => "failed",
        }
    }
}

struct Session {
    output_path: PathBuf,
    output: File,
    jobs: Option<SyncSender<Job>>,
    worker: Option<JoinHandle<Result<Packed>>>,
    paths: HashSet<String>,
    metadata_names: HashSet<String>,
    redirects: Vec<DirEntry>,
    main_path: Option<String>,
    started_at: Instant,
}

impl Session {
    fn submit(&self, job: Job) -> Result<()> {
        let jobs = self.jobs.as_ref().context("Creator worker is gone")?;
        jobs.send(job)
            .map_err(|_| anyhow::anyhow!("Creator worker stopped; see finish for the error"))
    }
}

/// Single-use authoring session
pub struct Creator {
    config: CreatorConfig,
    state: State,
}

impl Default for Creator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Creator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Creator")
            .field("config", &self.config)
            .field("state", &self.state.name())
            .finish()
    }
}

impl Creator {
    pub fn new() -> Self {
        Self::with_config(CreatorConfig::default())
    }

    pub fn with_config(config: CreatorConfig) -> Self {
        Self {
            config,
            state: State::Configured,
        }
    }

    pub fn config(&self) -> &CreatorConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        matches!(self.state, State::Started(_))
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished)
    }

    fn configurable(&mut self) -> Result<&mut CreatorConfig> {
        match self.state {
            State::Configured => Ok(&mut self.config),
            _ => anyhow::bail!("Creator is {}; configuration must happen before start", self.state.name()),
        }
    }

    pub fn config_verbose(&mut self, verbose: bool) -> Result<()> {
        self.configurable()?.verbose = verbose;
        Ok(())
    }

    pub fn config_compression(&mut self, compression: Compression) -> Result<()> {
        self.configurable()?.compression = compression;
        Ok(())
    }

    pub fn config_compression_level(&mut self, level: i32) -> Result<()> {
        self.configurable()?.compression_level = level;
        Ok(())
    }

    /// Full-text indexing of HTML and plain-text items (on by default)
    pub fn config_indexing(&mut self, indexing: bool) -> Result<()> {
        self.configurable()?.indexing = indexing;
        Ok(())
    }

    /// Uncompressed bytes per cluster
    pub fn config_cluster_size(&mut self, bytes: usize) -> Result<()> {
        if bytes == 0 {
            anyhow::bail!("Cluster size must be positive");
        }
        self.configurable()?.cluster_size = bytes;
        Ok(())
    }

    /// Open the output file and spawn the worker. On failure the creator is unusable.
    pub fn start_zim_creation(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !matches!(self.state, State::Configured) {
            anyhow::bail!("Creator is {}; it can only be started once", self.state.name());
        }

        match self.open_session(path) {
            Ok(session) => {
                if self.config.verbose {
                    log::info!("[Creator] Writing {}", path.display());
                }
                self.state = State::Started(Box::new(session));
                Ok(())
            }
            Err(e) => {
                self.state = State::Failed;
                Err(e)
            }
        }
    }

    fn open_session(&self, path: &Path) -> Result<Session> {
        let output = File::create(path).with_context(|| format!("Cannot create archive {}", path.display()))?;

        let (tx, rx) = mpsc::sync_channel(WORKER_QUEUE_DEPTH);
        let packer = Packer::new(self.config.clone())?;
        let worker = std::thread::Builder::new()
            .name("zim-creator".to_string())
            .spawn(move || run_worker(packer, rx))
            .context("Failed to spawn creator worker")?;

        Ok(Session {
            output_path: path.to_path_buf(),
            output,
            jobs: Some(tx),
            worker: Some(worker),
            paths: HashSet::new(),
            metadata_names: HashSet::new(),
            redirects: Vec::new(),
            main_path: None,
            started_at: Instant::now(),
        })
    }

    fn session(&mut self) -> Result<&mut Session> {
        match &mut self.state {
            State::Started(session) => Ok(session),
            other => anyhow::bail!("Creator is {}; items can only be added after start", other.name()),
        }
    }

    pub fn add_item(&mut self, item: impl Into<Arc<WriterItem>>) -> Result<()> {
        let item = item.into();
        if item.path().is_empty() {
            anyhow::bail!("Item path cannot be empty");
        }
        let session = self.session()?;
        if session.paths.contains(item.path()) {
            anyhow::bail!("Duplicate item path: {}", item.path());
        }
        session.submit(Job::Item(Arc::clone(&item)))?;
        session.paths.insert(item.path().to_string());
        Ok(())
    }

    pub fn add_metadata(&mut self, name: &str, content: &str) -> Result<()> {
        self.add_metadata_with_mimetype(name, METADATA_MIMETYPE, content.as_bytes())
    }

    pub fn add_metadata_with_mimetype(&mut self, name: &str, mimetype: &str, content: &[u8]) -> Result<()> {
        if name.is_empty() {
            anyhow::bail!("Metadata name cannot be empty");
        }
        let session = self.session()?;
        if session.metadata_names.contains(name) {
            anyhow::bail!("Duplicate metadata: {}", name);
        }
        session.submit(Job::Metadata {
            name: name.to_string(),
            mimetype: mimetype.to_string(),
            content: content.to_vec(),
        })?;
        session.metadata_names.insert(name.to_string());
        Ok(())
    }

    /// PNG illustration of `size`x`size` pixels
    pub fn add_illustration(&mut self, size: u32, content: &[u8]) -> Result<()> {
        if content.is_empty() {
            anyhow::bail!("Illustration content cannot be empty");
        }
        self.add_metadata_with_mimetype(&constants::illustration_name(size), ILLUSTRATION_MIMETYPE, content)
    }

    /// Redirect `path` to `target`; a target that never appears is dropped at finish
    pub fn add_redirection(&mut self, path: &str, title: &str, target: &str) -> Result<()> {
        if path.is_empty() || target.is_empty() {
            anyhow::bail!("Redirect path and target cannot be empty");
        }
        let session = self.session()?;
        if session.paths.contains(path) {
            anyhow::bail!("Duplicate item path: {}", path);
        }
        session.paths.insert(path.to_string());
        session.redirects.push(DirEntry {
            path: path.to_string(),
            title: title.to_string(),
            target: EntryTarget::Redirect {
                target: target.to_string(),
            },
        });
        Ok(())
    }

    pub fn set_main_path(&mut self, path: &str) -> Result<()> {
        let session = self.session()?;
        session.main_path = Some(path.to_string());
        Ok(())
    }

    /// Wait for the worker and write the archive; the only durability point
    pub fn finish_zim_creation(&mut self) -> Result<()> {
        let mut session = match std::mem::replace(&mut self.state, State::Failed) {
            State::Started(session) => session,
            other => {
                let name = other.name();
                self.state = other;
                anyhow::bail!("Creator is {}; nothing to finish", name);
            }
        };

        drop(session.jobs.take());
        let packed = match session.worker.take() {
            Some(worker) => worker
                .join()
                .map_err(|_| anyhow::anyhow!("Creator worker panicked"))??,
            None => anyhow::bail!("Creator worker is gone"),
        };

        let summary = write_archive(&session, packed, &self.config)
            .with_context(|| format!("Failed to write archive {}", session.output_path.display()))?;

        if self.config.verbose {
            log::info!(
                "[Creator] Finished {}: {} entries, {} clusters, {} bytes in {:?}",
                session.output_path.display(),
                summary.entry_count,
                summary.cluster_count,
                summary.file_size,
                session.started_at.elapsed()
            );
        }
        self.state = State::Finished;
        Ok(())
    }
}

impl Drop for Creator {
    fn drop(&mut self) {
        if let State::Started(session) = &mut self.state {
            log::debug!("Creator for {} dropped before finish", session.output_path.display());
            drop(session.jobs.take());
            if let Some(worker) = session.worker.take() {
                let _ = worker.join();
            }
        }
    }
}

fn run_worker(mut packer: Packer, jobs: Receiver<Job>) -> Result<Packed> {
    for job in jobs {
        match job {
            Job::Item(item) => packer.add_item(&item)?,
            Job::Metadata { name, mimetype, content } => packer.add_metadata(name, mimetype, &content)?,
        }
    }
    packer.finish()
}

/// Text statistics of one indexed item
struct IndexedText {
    path: String,
    frequencies: HashMap<String, u32>,
    word_count: u32,
}

/// Worker-side state: clusters in a temp file plus directory bookkeeping
struct Packer {
    config: CreatorConfig,
    clusters: File,
    cluster_offsets: Vec<u64>,
    current: Vec<u8>,
    entries: Vec<DirEntry>,
    metadata: Vec<MetadataEntry>,
    documents: Vec<IndexedText>,
}

struct Packed {
    clusters: File,
    cluster_offsets: Vec<u64>,
    entries: Vec<DirEntry>,
    metadata: Vec<MetadataEntry>,
    documents: Vec<IndexedText>,
}

impl Packer {
    fn new(config: CreatorConfig) -> Result<Self> {
        Ok(Self {
            config,
            clusters: tempfile::tempfile().context("Failed to create cluster spool file")?,
            cluster_offsets: vec![0],
            current: Vec::new(),
            entries: Vec::new(),
            metadata: Vec::new(),
            documents: Vec::new(),
        })
    }

    fn push_blob(&mut self, data: &[u8]) -> Result<BlobRef> {
        if !self.current.is_empty() && self.current.len() + data.len() > self.config.cluster_size {
            self.flush_cluster()?;
        }
        let blob = BlobRef {
            cluster: (self.cluster_offsets.len() - 1) as u32,
            offset: self.current.len() as u64,
            size: data.len() as u64,
        };
        self.current.extend_from_slice(data);
        Ok(blob)
    }

    fn flush_cluster(&mut self) -> Result<()> {
        let compressed =
            archive_format::compress(&self.current, self.config.compression, self.config.compression_level)?;
        self.clusters.write_all(&compressed)?;
        let last = self.cluster_offsets.last().copied().unwrap_or(0);
        self.cluster_offsets.push(last + compressed.len() as u64);
        self.current.clear();
        Ok(())
    }

    fn add_item(&mut self, item: &WriterItem) -> Result<()> {
        let data = item.content()?;
        let blob = self.push_blob(&data)?;

        if self.config.indexing && text::is_indexable_mimetype(item.mimetype()) {
            let body = text::tokenize(&text::content_to_text(item.mimetype(), &data));
            let title = text::tokenize(item.title());
            let mut frequencies: HashMap<String, u32> = HashMap::new();
            for word in &body {
                *frequencies.entry(word.clone()).or_default() += 1;
            }
            for word in &title {
                *frequencies.entry(word.clone()).or_default() += constants::TITLE_TERM_WEIGHT;
            }
            if !frequencies.is_empty() {
                self.documents.push(IndexedText {
                    path: item.path().to_string(),
                    frequencies,
                    word_count: (body.len() + title.len()) as u32,
                });
            }
        }

        self.entries.push(DirEntry {
            path: item.path().to_string(),
            title: item.title().to_string(),
            target: EntryTarget::Content {
                mimetype: item.mimetype().to_string(),
                blob,
                front_article: item.is_front_article(),
            },
        });
        Ok(())
    }

    fn add_metadata(&mut self, name: String, mimetype: String, content: &[u8]) -> Result<()> {
        let blob = self.push_blob(content)?;
        self.metadata.push(MetadataEntry { name, mimetype, blob });
        Ok(())
    }

    fn finish(mut self) -> Result<Packed> {
        if !self.current.is_empty() {
            self.flush_cluster()?;
        }
        self.clusters.flush()?;
        Ok(Packed {
            clusters: self.clusters,
            cluster_offsets: self.cluster_offsets,
            entries: self.entries,
            metadata: self.metadata,
            documents: self.documents,
        })
    }
}

struct WriteSummary {
    entry_count: usize,
    cluster_count: usize,
    file_size: u64,
}

fn is_media_mimetype(mimetype: &str) -> bool {
    ["image/", "video/", "audio/"].iter().any(|p| mimetype.starts_with(p))
}

/// Assemble sections, hash the data region and write header + data
fn write_archive(session: &Session, packed: Packed, config: &CreatorConfig) -> Result<WriteSummary> {
    let Packed {
        mut clusters,
        cluster_offsets,
        entries,
        mut metadata,
        documents,
    } = packed;

    // Directory: content entries plus resolvable redirects, sorted by path
    let content: HashSet<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    let redirect_targets: HashMap<&str, &str> = session
        .redirects
        .iter()
        .filter_map(|r| match &r.target {
            EntryTarget::Redirect { target } => Some((r.path.as_str(), target.as_str())),
            EntryTarget::Content { .. } => None,
        })
        .collect();
    let mut directory: Vec<DirEntry> = entries.clone();
    for redirect in &session.redirects {
        if let EntryTarget::Redirect { target } = &redirect.target {
            if redirect_resolves(&redirect.path, &content, &redirect_targets) {
                directory.push(redirect.clone());
            } else {
                log::warn!("Dropping redirect {} -> {}: chain does not reach content", redirect.path, target);
            }
        }
    }
    directory.sort_by(|a, b| a.path.cmp(&b.path));
    let positions: HashMap<&str, u32> = directory
        .iter()
        .enumerate()
        .map(|(idx, e)| (e.path.as_str(), idx as u32))
        .collect();

    let main_path = match &session.main_path {
        Some(path) if positions.contains_key(path.as_str()) => Some(path.clone()),
        Some(path) => {
            log::warn!("Main path {} does not exist in the archive; ignoring", path);
            None
        }
        None => None,
    };

    let fulltext = if config.indexing && !documents.is_empty() {
        let mut index = FulltextIndex::default();
        let mut postings: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
        for doc in &documents {
            let Some(&entry) = positions.get(doc.path.as_str()) else {
                continue;
            };
            let document = index.documents.len() as u32;
            index.documents.push(IndexedDocument {
                entry,
                word_count: doc.word_count,
            });
            for (term, &frequency) in &doc.frequencies {
                postings.entry(term.clone()).or_default().push(Posting { document, frequency });
            }
        }
        index.postings = postings;
        Some(index)
    } else {
        None
    };

    let mut front: Vec<u32> = directory
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_front_article())
        .map(|(idx, _)| idx as u32)
        .collect();
    front.sort_by_cached_key(|&idx| directory[idx as usize].display_title().to_lowercase());
    let titles = (!front.is_empty()).then_some(TitleIndex { entries: front });

    let article_count = directory.iter().filter(|e| e.is_front_article()).count() as u64;
    let media_count = directory
        .iter()
        .filter(|e| matches!(&e.target, EntryTarget::Content { mimetype, .. } if is_media_mimetype(mimetype)))
        .count() as u64;

    metadata.sort_by(|a, b| a.name.cmp(&b.name));

    // Sections follow the clusters in the data region
    let compression = config.compression;
    let level = config.compression_level;
    let clusters_len = cluster_offsets.last().copied().unwrap_or(0);
    let mut sections: Vec<u8> = Vec::new();
    let mut place = |bytes: Vec<u8>| -> SectionRef {
        let r = SectionRef {
            offset: clusters_len + sections.len() as u64,
            length: bytes.len() as u64,
        };
        sections.extend_from_slice(&bytes);
        r
    };
    let directory_ref = place(archive_format::encode_section(&directory, compression, level)?);
    let metadata_ref = place(archive_format::encode_section(&metadata, compression, level)?);
    let fulltext_ref = match &fulltext {
        Some(index) => Some(place(archive_format::encode_section(index, compression, level)?)),
        None => None,
    };
    let titles_ref = match &titles {
        Some(index) => Some(place(archive_format::encode_section(index, compression, level)?)),
        None => None,
    };

    // Hash the data region: spooled clusters then sections
    let mut hasher = Sha256::new();
    clusters.seek(SeekFrom::Start(0))?;
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = clusters.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    hasher.update(&sections);
    let checksum = format!("{:x}", hasher.finalize());

    let created_at = chrono::Utc::now();
    let uuid = uuid::Uuid::new_v4().to_string();

    let header = ArchiveHeader {
        format: constants::FORMAT_NAME.to_string(),
        uuid,
        created_at: created_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        created_by: constants::created_by(),
        compression,
        entry_count: directory.len() as u64,
        article_count,
        media_count,
        main_path,
        cluster_offsets: cluster_offsets.clone(),
        directory: directory_ref,
        metadata: metadata_ref,
        fulltext: fulltext_ref,
        titles: titles_ref,
        data_length: clusters_len + sections.len() as u64,
        checksum,
    };

    let output = session.output.try_clone().context("Cannot reuse archive file handle")?;
    let mut writer = BufWriter::new(output);
    let header_size = archive_format::write_header_frame(&mut writer, &header)?;
    clusters.seek(SeekFrom::Start(0))?;
    std::io::copy(&mut clusters, &mut writer)?;
    writer.write_all(&sections)?;
    let output = writer.into_inner().map_err(|e| e.into_error())?;
    output.sync_all()?;

    Ok(WriteSummary {
        entry_count: directory.len(),
        cluster_count: cluster_offsets.len().saturating_sub(1),
        file_size: header_size as u64 + header.data_length,
    })
}

/// True when the chain from `path` reaches a content entry within the reader's hop limit
fn redirect_resolves(path: &str, content: &HashSet<&str>, redirects: &HashMap<&str, &str>) -> bool {
    let mut current = path;
    for _ in 0..=constants::MAX_REDIRECT_DEPTH {
        if content.contains(current) {
            return true;
        }
        match redirects.get(current) {
            Some(&target) => current = target,
            None => return false,
        }
    }
    false
}
