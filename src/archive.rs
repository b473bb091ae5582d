// src/archive.rs
//! Read-only access to packaged archives: entries sorted by path, redirects, items and metadata
use crate::archive_format::{
    self, ArchiveHeader, BlobRef, Compression, DirEntry, EntryTarget, FulltextIndex, MetadataEntry,
    SectionRef, TitleIndex,
};
use crate::cache::ClusterCache;
use crate::constants;
use anyhow::{Context, Result};
use memmap2::Mmap;
use rand::Rng;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An opened archive. Cloning is cheap and shares the mapping.
#[derive(Clone)]
pub struct Archive {
    inner: Arc<ArchiveInner>,
}

struct ArchiveInner {
    path: PathBuf,
    mmap: Mmap,
    header: ArchiveHeader,
    data_start: u64,
    directory: Vec<DirEntry>,
    metadata: Vec<MetadataEntry>,
    fulltext: Option<FulltextIndex>,
    titles: Option<TitleIndex>,
    clusters: ClusterCache,
}

impl Archive {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Cannot open archive {}", path.display()))?;

        // SAFETY: archives are immutable once finished; the mapping is read-only
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Cannot map archive {}", path.display()))?;

        let mut cursor = std::io::Cursor::new(&mmap[..]);
        let (header, data_start) = archive_format::read_header_frame(&mut cursor)
            .with_context(|| format!("Invalid archive {}", path.display()))?;

        if data_start + header.data_length > mmap.len() as u64 {
            anyhow::bail!(
                "Archive {} is truncated ({} bytes, expected {})",
                path.display(),
                mmap.len(),
                data_start + header.data_length
            );
        }

        let compression = header.compression;
        let section = |r: SectionRef| -> Result<&[u8]> { slice_section(&mmap, data_start, &header, r) };

        let directory: Vec<DirEntry> =
            archive_format::decode_section(section(header.directory)?, compression).context("Malformed directory")?;
        if directory.windows(2).any(|w| w[0].path >= w[1].path) {
            anyhow::bail!("Directory of {} is not sorted by path", path.display());
        }

        let metadata: Vec<MetadataEntry> =
            archive_format::decode_section(section(header.metadata)?, compression).context("Malformed metadata")?;

        let fulltext: Option<FulltextIndex> = match header.fulltext {
            Some(r) => Some(archive_format::decode_section(section(r)?, compression).context("Malformed full-text index")?),
            None => None,
        };
        let titles: Option<TitleIndex> = match header.titles {
            Some(r) => Some(archive_format::decode_section(section(r)?, compression).context("Malformed title index")?),
            None => None,
        };

        log::debug!(
            "Opened archive {} ({} entries, {} clusters)",
            path.display(),
            directory.len(),
            header.cluster_count()
        );

        Ok(Self {
            inner: Arc::new(ArchiveInner {
                path: path.to_path_buf(),
                mmap,
                header,
                data_start,
                directory,
                metadata,
                fulltext,
                titles,
                clusters: ClusterCache::new(constants::CLUSTER_CACHE_CAPACITY),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn uuid(&self) -> &str {
        &self.inner.header.uuid
    }

    pub fn created_at(&self) -> &str {
        &self.inner.header.created_at
    }

    pub fn compression(&self) -> Compression {
        self.inner.header.compression
    }

    /// Size of the archive file in bytes
    pub fn filesize(&self) -> u64 {
        self.inner.mmap.len() as u64
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.directory.len() as u64
    }

    pub fn article_count(&self) -> u64 {
        self.inner.header.article_count
    }

    pub fn media_count(&self) -> u64 {
        self.inner.header.media_count
    }

    pub fn has_entry_by_path(&self, path: &str) -> bool {
        self.find_index(path).is_some()
    }

    pub fn entry_by_path(&self, path: &str) -> Result<Entry> {
        match self.find_index(path) {
            Some(index) => Ok(Entry::new(self.clone(), index)),
            None => anyhow::bail!("Entry not found: {}", path),
        }
    }

    /// The idx'th entry in path order
    pub fn entry_by_index(&self, idx: u32) -> Result<Entry> {
        if idx as usize >= self.inner.directory.len() {
            anyhow::bail!("Entry index {} out of bounds ({} entries)", idx, self.inner.directory.len());
        }
        Ok(Entry::new(self.clone(), idx))
    }

    pub fn iter_entries(&self) -> impl Iterator<Item = Entry> + '_ {
        (0..self.inner.directory.len() as u32).map(move |idx| Entry::new(self.clone(), idx))
    }

    pub fn main_path(&self) -> Option<&str> {
        self.inner.header.main_path.as_deref()
    }

    pub fn has_main_entry(&self) -> bool {
        self.main_path().is_some_and(|p| self.has_entry_by_path(p))
    }

    pub fn main_entry(&self) -> Result<Entry> {
        match self.main_path() {
            Some(path) => self.entry_by_path(path),
            None => anyhow::bail!("Archive has no main entry"),
        }
    }

    pub fn random_entry(&self) -> Result<Entry> {
        let count = self.inner.directory.len();
        if count == 0 {
            anyhow::bail!("Archive has no entries");
        }
        let idx = rand::thread_rng().gen_range(0..count) as u32;
        Ok(Entry::new(self.clone(), idx))
    }

    pub fn has_fulltext_index(&self) -> bool {
        self.inner.fulltext.is_some()
    }

    pub fn has_title_index(&self) -> bool {
        self.inner.titles.is_some()
    }

    pub fn metadata_keys(&self) -> Vec<String> {
        self.inner.metadata.iter().map(|m| m.name.clone()).collect()
    }

    pub fn metadata(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .inner
            .metadata
            .iter()
            .find(|m| m.name == name)
            .with_context(|| format!("Metadata not found: {}", name))?;
        self.read_blob(&entry.blob)
    }

    /// Metadata value decoded as UTF-8 (lossy)
    pub fn metadata_string(&self, name: &str) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.metadata(name)?).into_owned())
    }

    pub fn has_illustration(&self, size: u32) -> bool {
        let name = constants::illustration_name(size);
        self.inner.metadata.iter().any(|m| m.name == name)
    }

    pub fn illustration(&self, size: u32) -> Result<Vec<u8>> {
        self.metadata(&constants::illustration_name(size))
    }

    /// Recompute the data checksum and decode every cluster
    pub fn check_integrity(&self) -> Result<bool> {
        let inner = &self.inner;
        let start = inner.data_start as usize;
        let end = start + inner.header.data_length as usize;
        let actual = archive_format::checksum(&inner.mmap[start..end]);
        if actual != inner.header.checksum {
            log::warn!(
                "Checksum mismatch for {}: expected {}, got {}",
                inner.path.display(),
                inner.header.checksum,
                actual
            );
            return Ok(false);
        }

        for cluster in 0..inner.header.cluster_count() as u32 {
            if let Err(e) = self.load_cluster(cluster) {
                log::warn!("Cluster {} of {} is unreadable: {}", cluster, inner.path.display(), e);
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub(crate) fn find_index(&self, path: &str) -> Option<u32> {
        self.inner
            .directory
            .binary_search_by(|e| e.path.as_str().cmp(path))
            .ok()
            .map(|idx| idx as u32)
    }

    pub(crate) fn dir_entry(&self, idx: u32) -> Option<&DirEntry> {
        self.inner.directory.get(idx as usize)
    }

    pub(crate) fn fulltext(&self) -> Option<&FulltextIndex> {
        self.inner.fulltext.as_ref()
    }

    pub(crate) fn titles(&self) -> Option<&TitleIndex> {
        self.inner.titles.as_ref()
    }

    pub(crate) fn read_blob(&self, blob: &BlobRef) -> Result<Vec<u8>> {
        let cluster = self.load_cluster(blob.cluster)?;
        let start = blob.offset as usize;
        let end = start + blob.size as usize;
        if end > cluster.len() {
            anyhow::bail!(
                "Blob {}..{} exceeds cluster {} ({} bytes)",
                start,
                end,
                blob.cluster,
                cluster.len()
            );
        }
        Ok(cluster[start..end].to_vec())
    }

    fn load_cluster(&self, cluster: u32) -> Result<Arc<Vec<u8>>> {
        let inner = &self.inner;
        if let Some(data) = inner.clusters.get(cluster) {
            return Ok(data);
        }

        let range = inner.header.cluster_range(cluster)?;
        let raw = slice_section(&inner.mmap, inner.data_start, &inner.header, range)?;
        let data = Arc::new(
            archive_format::decompress(raw, inner.header.compression)
                .with_context(|| format!("Failed to decompress cluster {}", cluster))?,
        );
        inner.clusters.insert(cluster, Arc::clone(&data));
        Ok(data)
    }
}

impl fmt::Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("path", &self.inner.path)
            .field("uuid", &self.inner.header.uuid)
            .field("entries", &self.inner.directory.len())
            .finish()
    }
}

fn slice_section<'a>(mmap: &'a Mmap, data_start: u64, header: &ArchiveHeader, r: SectionRef) -> Result<&'a [u8]> {
    if r.end() > header.data_length {
        anyhow::bail!(
            "Section {}..{} exceeds data region ({} bytes)",
            r.offset,
            r.end(),
            header.data_length
        );
    }
    let start = (data_start + r.offset) as usize;
    let end = (data_start + r.end()) as usize;
    Ok(&mmap[start..end])
}

/// A named location inside an archive, possibly a redirect
#[derive(Clone)]
pub struct Entry {
    archive: Archive,
    index: u32,
}

impl Entry {
    fn new(archive: Archive, index: u32) -> Self {
        Self { archive, index }
    }

    fn dir(&self) -> &DirEntry {
        // Entries are only built from in-bounds indexes
        &self.archive.inner.directory[self.index as usize]
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn path(&self) -> &str {
        &self.dir().path
    }

    pub fn title(&self) -> &str {
        self.dir().display_title()
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.dir().target, EntryTarget::Redirect { .. })
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match &self.dir().target {
            EntryTarget::Redirect { target } => Some(target),
            EntryTarget::Content { .. } => None,
        }
    }

    /// The entry this redirect points at (one hop)
    pub fn redirect_entry(&self) -> Result<Entry> {
        match self.redirect_target() {
            Some(target) => self
                .archive
                .entry_by_path(target)
                .with_context(|| format!("Dangling redirect {} -> {}", self.path(), target)),
            None => anyhow::bail!("Entry {} is not a redirect", self.path()),
        }
    }

    /// Resolve to concrete content, chasing redirects when `follow` is set
    pub fn item(&self, follow: bool) -> Result<Item> {
        let mut current = self.clone();
        for _ in 0..=constants::MAX_REDIRECT_DEPTH {
            if !current.is_redirect() {
                return Item::from_entry(&current);
            }
            if !follow {
                anyhow::bail!("Entry {} is a redirect", current.path());
            }
            current = current.redirect_entry()?;
        }
        anyhow::bail!("Redirect chain from {} is too long", self.path())
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("index", &self.index)
            .field("path", &self.path())
            .field("redirect", &self.is_redirect())
            .finish()
    }
}

/// Concrete content reachable from an entry
#[derive(Clone)]
pub struct Item {
    archive: Archive,
    index: u32,
    blob: BlobRef,
}

impl Item {
    fn from_entry(entry: &Entry) -> Result<Self> {
        match &entry.dir().target {
            EntryTarget::Content { blob, .. } => Ok(Self {
                archive: entry.archive.clone(),
                index: entry.index,
                blob: *blob,
            }),
            EntryTarget::Redirect { .. } => anyhow::bail!("Entry {} is a redirect", entry.path()),
        }
    }

    fn dir(&self) -> &DirEntry {
        &self.archive.inner.directory[self.index as usize]
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn path(&self) -> &str {
        &self.dir().path
    }

    pub fn title(&self) -> &str {
        self.dir().display_title()
    }

    pub fn mimetype(&self) -> &str {
        match &self.dir().target {
            EntryTarget::Content { mimetype, .. } => mimetype,
            EntryTarget::Redirect { .. } => "",
        }
    }

    pub fn is_front_article(&self) -> bool {
        self.dir().is_front_article()
    }

    /// Decoded content size in bytes
    pub fn size(&self) -> u64 {
        self.blob.size
    }

    pub fn data(&self) -> Result<Vec<u8>> {
        self.archive
            .read_blob(&self.blob)
            .with_context(|| format!("Failed to read item {}", self.path()))
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("path", &self.path())
            .field("mimetype", &self.mimetype())
            .field("size", &self.blob.size)
            .finish()
    }
}
