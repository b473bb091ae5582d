// src/archive_format.rs
//! Archive file format with a zstd skippable header frame and clustered content
//!
//! Format:
//! - Skippable frame with the JSON header (magic 0x184D2A5A)
//! - Content clusters (one zstd frame each, or raw bytes when uncompressed)
//! - Directory, metadata, full-text and title sections
//! - All offsets in the header are RELATIVE to the first byte after the header frame

use crate::constants;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// Cluster and section compression, encoded as the integers shared with C callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    #[default]
    Zstd,
}

impl Compression {
    pub const NONE_CODE: i32 = 1;
    pub const ZSTD_CODE: i32 = 5;

    pub fn code(self) -> i32 {
        match self {
            Compression::None => Self::NONE_CODE,
            Compression::Zstd => Self::ZSTD_CODE,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            Self::NONE_CODE => Some(Compression::None),
            Self::ZSTD_CODE => Some(Compression::Zstd),
            _ => None,
        }
    }
}

/// Byte range of a section inside the data region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectionRef {
    pub offset: u64,
    pub length: u64,
}

impl SectionRef {
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// Archive header stored in the leading skippable frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveHeader {
    /// Format version
    pub format: String,

    /// Archive identity, also used as the catalog book id
    pub uuid: String,

    /// Creation timestamp (RFC 3339)
    pub created_at: String,

    /// Creator version (e.g., "zimbridge/0.3.0")
    pub created_by: String,

    /// Compression applied to clusters and sections
    pub compression: Compression,

    /// Number of directory entries (content + redirects)
    pub entry_count: u64,

    /// Number of front articles
    pub article_count: u64,

    /// Number of non-text content entries
    pub media_count: u64,

    /// Path of the main page, if one was declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_path: Option<String>,

    /// Cluster byte offsets, one more than the number of clusters
    pub cluster_offsets: Vec<u64>,

    pub directory: SectionRef,
    pub metadata: SectionRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulltext: Option<SectionRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titles: Option<SectionRef>,

    /// Total length of the data region following the header frame
    pub data_length: u64,

    /// SHA-256 of the data region
    pub checksum: String,
}

impl ArchiveHeader {
    pub fn cluster_count(&self) -> usize {
        self.cluster_offsets.len().saturating_sub(1)
    }

    pub fn cluster_range(&self, cluster: u32) -> Result<SectionRef> {
        let idx = cluster as usize;
        if idx + 1 >= self.cluster_offsets.len() {
            anyhow::bail!(
                "Cluster {} out of bounds (total clusters {})",
                cluster,
                self.cluster_count()
            );
        }
        let offset = self.cluster_offsets[idx];
        let end = self.cluster_offsets[idx + 1];
        if end < offset {
            anyhow::bail!("Invalid cluster offsets: {}-{}", offset, end);
        }
        Ok(SectionRef {
            offset,
            length: end - offset,
        })
    }
}

/// Location of a blob inside a decompressed cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    pub cluster: u32,
    pub offset: u64,
    pub size: u64,
}

/// A directory entry, sorted by path in the directory section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub path: String,
    pub title: String,
    #[serde(flatten)]
    pub target: EntryTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryTarget {
    Content {
        mimetype: String,
        blob: BlobRef,
        #[serde(default)]
        front_article: bool,
    },
    Redirect {
        target: String,
    },
}

impl DirEntry {
    /// Title shown to readers, falling back to the path
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.path
        } else {
            &self.title
        }
    }

    pub fn is_front_article(&self) -> bool {
        matches!(
            self.target,
            EntryTarget::Content {
                front_article: true,
                ..
            }
        )
    }
}

/// A metadata value stored in a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub name: String,
    pub mimetype: String,
    pub blob: BlobRef,
}

/// Inverted index over indexed documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FulltextIndex {
    pub documents: Vec<IndexedDocument>,
    pub postings: BTreeMap<String, Vec<Posting>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Index of the entry in the directory section
    pub entry: u32,
    pub word_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    #[serde(rename = "d")]
    pub document: u32,
    #[serde(rename = "f")]
    pub frequency: u32,
}

impl FulltextIndex {
    pub fn average_length(&self) -> f64 {
        if self.documents.is_empty() {
            return 0.0;
        }
        let total: u64 = self.documents.iter().map(|d| d.word_count as u64).sum();
        total as f64 / self.documents.len() as f64
    }
}

/// Front articles eligible for suggestions, as directory indexes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TitleIndex {
    pub entries: Vec<u32>,
}

/// Write a zstd skippable frame
pub fn write_skippable_frame<W: Write>(writer: &mut W, magic: u32, data: &[u8]) -> Result<usize> {
    let frame_size = u32::try_from(data.len()).context("Skippable frame too large")?;

    writer.write_all(&magic.to_le_bytes())?;
    writer.write_all(&frame_size.to_le_bytes())?;
    writer.write_all(data)?;

    Ok(8 + data.len()) // magic(4) + size(4) + data
}

/// Read a zstd skippable frame
pub fn read_skippable_frame<R: Read>(reader: &mut R) -> Result<(u32, Vec<u8>)> {
    let mut magic_buf = [0u8; 4];
    reader.read_exact(&mut magic_buf)?;
    let magic = u32::from_le_bytes(magic_buf);

    // Skippable frames use 0x184D2A50 - 0x184D2A5F
    if !(0x184D2A50..=0x184D2A5F).contains(&magic) {
        anyhow::bail!("Not a skippable frame: magic=0x{:08X}", magic);
    }

    let mut size_buf = [0u8; 4];
    reader.read_exact(&mut size_buf)?;
    let frame_size = u32::from_le_bytes(size_buf);

    let mut data = vec![0u8; frame_size as usize];
    reader.read_exact(&mut data)?;

    Ok((magic, data))
}

/// Write the archive header as a skippable frame
pub fn write_header_frame<W: Write>(writer: &mut W, header: &ArchiveHeader) -> Result<usize> {
    let json_data = serde_json::to_vec(header)?;
    write_skippable_frame(writer, constants::SKIPPABLE_MAGIC_HEADER, &json_data)
}

/// Read the archive header, returning it with the total frame size
pub fn read_header_frame<R: Read>(reader: &mut R) -> Result<(ArchiveHeader, u64)> {
    let (magic, data) = read_skippable_frame(reader)?;

    if magic != constants::SKIPPABLE_MAGIC_HEADER {
        anyhow::bail!(
            "Unexpected magic: 0x{:08X} (expected 0x{:08X})",
            magic,
            constants::SKIPPABLE_MAGIC_HEADER
        );
    }

    let header: ArchiveHeader = serde_json::from_slice(&data).context("Malformed archive header")?;
    if header.format != constants::FORMAT_NAME {
        anyhow::bail!("Unsupported archive format: {}", header.format);
    }

    Ok((header, 8 + data.len() as u64))
}

/// Compress a cluster or section payload
pub fn compress(data: &[u8], compression: Compression, level: i32) -> Result<Vec<u8>> {
    match compression {
        Compression::None => Ok(data.to_vec()),
        Compression::Zstd => Ok(zstd::bulk::compress(data, level)?),
    }
}

/// Decompress a cluster or section payload
pub fn decompress(data: &[u8], compression: Compression) -> Result<Vec<u8>> {
    match compression {
        Compression::None => Ok(data.to_vec()),
        Compression::Zstd => Ok(zstd::stream::decode_all(data)?),
    }
}

/// Serialize a section as (optionally compressed) JSON
pub fn encode_section<T: Serialize>(value: &T, compression: Compression, level: i32) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(value)?;
    compress(&json, compression, level)
}

/// Deserialize a section written by `encode_section`
pub fn decode_section<T: DeserializeOwned>(data: &[u8], compression: Compression) -> Result<T> {
    let json = decompress(data, compression)?;
    Ok(serde_json::from_slice(&json)?)
}

/// Hex SHA-256 of a byte slice
pub fn checksum(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> ArchiveHeader {
        ArchiveHeader {
            format: constants::FORMAT_NAME.to_string(),
            uuid: "0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0".to_string(),
            created_at: "2024-01-02T00:00:00Z".to_string(),
            created_by: constants::created_by(),
            compression: Compression::Zstd,
            entry_count: 3,
            article_count: 2,
            media_count: 1,
            main_path: Some("index.html".to_string()),
            cluster_offsets: vec![0, 120, 300],
            directory: SectionRef { offset: 300, length: 40 },
            metadata: SectionRef { offset: 340, length: 20 },
            fulltext: None,
            titles: None,
            data_length: 360,
            checksum: "abc123".to_string(),
        }
    }

    #[test]
    fn test_skippable_frame_rejects_data_frames() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&0xFD2FB528u32.to_le_bytes()); // regular zstd frame magic
        buffer.extend_from_slice(&[0, 0, 0, 0]);

        let mut cursor = std::io::Cursor::new(&buffer);
        assert!(read_skippable_frame(&mut cursor).is_err());
    }

    #[test]
    fn test_header_frame_reports_frame_size() {
        let header = sample_header();
        let mut buffer = Vec::new();
        let written = write_header_frame(&mut buffer, &header).unwrap();
        buffer.extend_from_slice(b"cluster data follows");

        let mut cursor = std::io::Cursor::new(&buffer);
        let (read_header, frame_size) = read_header_frame(&mut cursor).unwrap();

        assert_eq!(frame_size as usize, written);
        assert_eq!(read_header.main_path.as_deref(), Some("index.html"));
        assert_eq!(read_header.cluster_count(), 2);
        assert_eq!(read_header.cluster_range(1).unwrap(), SectionRef { offset: 120, length: 180 });
        assert!(read_header.cluster_range(2).is_err());
    }

    #[test]
    fn test_header_frame_rejects_foreign_format() {
        let mut header = sample_header();
        header.format = "something-else".to_string();
        let mut buffer = Vec::new();
        write_header_frame(&mut buffer, &header).unwrap();

        let mut cursor = std::io::Cursor::new(&buffer);
        assert!(read_header_frame(&mut cursor).is_err());
    }

    #[test]
    fn test_dir_entry_serialization_shape() {
        let redirect = DirEntry {
            path: "home".to_string(),
            title: String::new(),
            target: EntryTarget::Redirect {
                target: "index.html".to_string(),
            },
        };
        let json = serde_json::to_value(&redirect).unwrap();
        assert_eq!(json["kind"], "redirect");
        assert_eq!(json["target"], "index.html");
        assert_eq!(redirect.display_title(), "home");
        assert!(!redirect.is_front_article());
    }

    #[test]
    fn test_compression_codes() {
        assert_eq!(Compression::from_code(1), Some(Compression::None));
        assert_eq!(Compression::from_code(5), Some(Compression::Zstd));
        assert_eq!(Compression::from_code(4), None);
        assert_eq!(Compression::Zstd.code(), 5);
    }

    #[test]
    fn test_section_with_both_compressions() {
        let index = TitleIndex { entries: vec![3, 1, 2] };
        for compression in [Compression::None, Compression::Zstd] {
            let bytes = encode_section(&index, compression, 3).unwrap();
            let decoded: TitleIndex = decode_section(&bytes, compression).unwrap();
            assert_eq!(decoded.entries, vec![3, 1, 2]);
        }
    }
}
