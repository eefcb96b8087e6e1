//! Forward-index bundles.
//!
//! A bundle holds the analyzed terms of one batch of documents, in the order
//! the documents appeared in the input. On disk it is
//! `BDXF | u16 version | bincode payload | u32 crc32(payload)`, written under
//! a temporary name and renamed into place.

use std::fs;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::error::{BibdexError, Result};
use crate::storage::layout::{ArchiveLayout, FORWARD_EXT};
use crate::storage::writer::write_atomic;

/// Magic bytes opening every bundle.
pub const FORWARD_MAGIC: [u8; 4] = *b"BDXF";

/// Current bundle version.
pub const FORWARD_VERSION: u16 = 1;

const PREFIX_LEN: usize = 6;
const CHECKSUM_LEN: usize = 4;

/// One term occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardTerm {
    pub term: String,
    pub position: Option<u16>,
}

/// The terms of one field of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardField {
    pub name: String,
    pub terms: Vec<ForwardTerm>,
}

/// Every indexed field of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardDocument {
    pub uid: u32,
    pub fields: Vec<ForwardField>,
}

impl ForwardDocument {
    /// Number of (field, term, position) records.
    pub fn record_count(&self) -> usize {
        self.fields.iter().map(|f| f.terms.len()).sum()
    }
}

/// All documents of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardBundle {
    pub batch: String,
    pub documents: Vec<ForwardDocument>,
}

impl ForwardBundle {
    pub fn new<S: Into<String>>(batch: S) -> Self {
        ForwardBundle {
            batch: batch.into(),
            documents: Vec::new(),
        }
    }

    pub fn record_count(&self) -> usize {
        self.documents.iter().map(ForwardDocument::record_count).sum()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)?;
        let mut out = Vec::with_capacity(PREFIX_LEN + payload.len() + CHECKSUM_LEN);
        out.extend_from_slice(&FORWARD_MAGIC);
        let mut version = [0u8; 2];
        LittleEndian::write_u16(&mut version, FORWARD_VERSION);
        out.extend_from_slice(&version);
        out.extend_from_slice(&payload);
        let mut checksum = [0u8; CHECKSUM_LEN];
        LittleEndian::write_u32(&mut checksum, crc32fast::hash(&payload));
        out.extend_from_slice(&checksum);
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PREFIX_LEN + CHECKSUM_LEN || bytes[..4] != FORWARD_MAGIC {
            return Err(BibdexError::format("not a forward bundle"));
        }
        let version = LittleEndian::read_u16(&bytes[4..PREFIX_LEN]);
        if version != FORWARD_VERSION {
            return Err(BibdexError::format(format!(
                "unsupported forward bundle version {version}"
            )));
        }
        let (payload, checksum) = bytes[PREFIX_LEN..].split_at(bytes.len() - PREFIX_LEN - CHECKSUM_LEN);
        if crc32fast::hash(payload) != LittleEndian::read_u32(checksum) {
            return Err(BibdexError::format("forward bundle checksum mismatch"));
        }
        Ok(bincode::deserialize(payload)?)
    }

    /// Write the bundle for its batch into the archive.
    pub fn write(&self, layout: &ArchiveLayout) -> Result<PathBuf> {
        let path = layout.forward_path(&self.batch);
        write_atomic(&path, &self.encode()?)?;
        Ok(path)
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Self::decode(&fs::read(path)?)
            .map_err(|e| BibdexError::format(format!("{}: {e}", path.display())))
    }
}

/// Paths of every completed bundle in an archive, sorted by batch name.
pub fn bundle_paths(layout: &ArchiveLayout) -> Result<Vec<PathBuf>> {
    let dir = layout.forward_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == FORWARD_EXT) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
