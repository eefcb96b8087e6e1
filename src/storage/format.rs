//! Binary layout of shard triplets.
//!
//! A shard is three files sharing a key:
//!
//! - `.trm`: sorted, unique terms, one per line.
//! - `.mst`: an 8-byte header (`BDXM`, u16 version, u16 flags) followed by one
//!   `{term_offset: u32, postings_offset: u32}` record per term and a phantom
//!   trailing record holding the `.trm` and `.pst` lengths, so every real
//!   entry's byte range ends where the next one starts.
//! - `.pst`: per term, either packed u32 identifiers or, for positional
//!   fields, `{uid: u32, count: u16, positions: [u16; count]}` groups.
//!
//! All integers are little-endian. Decoding checks every offset against the
//! buffer it indexes and every ordering invariant, and fails with
//! [`BibdexError::Format`] instead of panicking on a damaged file.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{BibdexError, Result};
use crate::storage::postings::Postings;

/// Magic bytes opening every master index.
pub const MASTER_MAGIC: [u8; 4] = *b"BDXM";

/// Current master index version.
pub const MASTER_VERSION: u16 = 1;

/// Flag bit marking a positional shard.
pub const FLAG_POSITIONAL: u16 = 0x0001;

/// Header size in bytes.
pub const HEADER_LEN: usize = 8;

/// Size of one master record in bytes.
pub const RECORD_LEN: usize = 8;

/// One master index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterRecord {
    pub term_offset: u32,
    pub postings_offset: u32,
}

/// Decoded master index of one shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterIndex {
    positional: bool,
    records: Vec<MasterRecord>,
}

impl MasterIndex {
    /// Build from records that already include the phantom trailing entry.
    pub fn new(positional: bool, records: Vec<MasterRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(BibdexError::format("master index has no phantom record"));
        }
        let ascending = records.windows(2).all(|w| {
            w[0].term_offset < w[1].term_offset && w[0].postings_offset <= w[1].postings_offset
        });
        if !ascending {
            return Err(BibdexError::format("master index offsets are not ascending"));
        }
        Ok(MasterIndex {
            positional,
            records,
        })
    }

    /// Parse a `.mst` file.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(BibdexError::format("master index shorter than its header"));
        }
        if bytes[..4] != MASTER_MAGIC {
            return Err(BibdexError::format("bad master index magic"));
        }
        let mut cursor = Cursor::new(&bytes[4..]);
        let version = cursor.read_u16::<LittleEndian>()?;
        if version != MASTER_VERSION {
            return Err(BibdexError::format(format!(
                "unsupported master index version {version}"
            )));
        }
        let flags = cursor.read_u16::<LittleEndian>()?;

        let body = &bytes[HEADER_LEN..];
        if body.len() % RECORD_LEN != 0 {
            return Err(BibdexError::format("master index has a partial record"));
        }
        let mut cursor = Cursor::new(body);
        let mut records = Vec::with_capacity(body.len() / RECORD_LEN);
        for _ in 0..body.len() / RECORD_LEN {
            records.push(MasterRecord {
                term_offset: cursor.read_u32::<LittleEndian>()?,
                postings_offset: cursor.read_u32::<LittleEndian>()?,
            });
        }
        MasterIndex::new(flags & FLAG_POSITIONAL != 0, records)
    }

    /// Serialize to `.mst` bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.records.len() * RECORD_LEN);
        out.extend_from_slice(&MASTER_MAGIC);
        let flags = if self.positional { FLAG_POSITIONAL } else { 0 };
        // Writes into a Vec cannot fail.
        let _ = out.write_u16::<LittleEndian>(MASTER_VERSION);
        let _ = out.write_u16::<LittleEndian>(flags);
        for record in &self.records {
            let _ = out.write_u32::<LittleEndian>(record.term_offset);
            let _ = out.write_u32::<LittleEndian>(record.postings_offset);
        }
        out
    }

    pub fn is_positional(&self) -> bool {
        self.positional
    }

    /// Number of real terms.
    pub fn len(&self) -> usize {
        self.records.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte range of term `i` in the term list, newline excluded.
    pub fn term_span(&self, i: usize) -> (usize, usize) {
        let start = self.records[i].term_offset as usize;
        let end = self.records[i + 1].term_offset as usize;
        (start, end.saturating_sub(1).max(start))
    }

    /// Byte range of term `i`'s postings.
    pub fn postings_span(&self, i: usize) -> (usize, usize) {
        (
            self.records[i].postings_offset as usize,
            self.records[i + 1].postings_offset as usize,
        )
    }

    /// Offsets of the phantom record: the expected `.trm` and `.pst` lengths.
    pub fn totals(&self) -> (usize, usize) {
        let last = self.records[self.records.len() - 1];
        (last.term_offset as usize, last.postings_offset as usize)
    }
}

/// Split a `.trm` buffer into terms using the master index offsets.
pub fn decode_term_list(bytes: &[u8], master: &MasterIndex) -> Result<Vec<String>> {
    let (term_total, _) = master.totals();
    if term_total != bytes.len() {
        return Err(BibdexError::format(format!(
            "term list is {} bytes but the master index expects {term_total}",
            bytes.len()
        )));
    }

    let mut terms: Vec<String> = Vec::with_capacity(master.len());
    for i in 0..master.len() {
        let (start, end) = master.term_span(i);
        let term = std::str::from_utf8(&bytes[start..end])
            .map_err(|e| BibdexError::format(format!("term {i} is not UTF-8: {e}")))?;
        if let Some(previous) = terms.last() {
            if previous.as_str() >= term {
                return Err(BibdexError::format(format!(
                    "term list is not sorted at '{term}'"
                )));
            }
        }
        terms.push(term.to_string());
    }
    Ok(terms)
}

/// Append one postings list to `out`.
pub fn encode_postings(postings: &Postings, positional: bool, out: &mut Vec<u8>) {
    for (uid, positions) in postings.iter() {
        let _ = out.write_u32::<LittleEndian>(uid);
        if positional {
            let count = positions.len().min(u16::MAX as usize);
            let _ = out.write_u16::<LittleEndian>(count as u16);
            for &position in &positions[..count] {
                let _ = out.write_u16::<LittleEndian>(position);
            }
        }
    }
}

/// Decode one postings list, validating ordering.
pub fn decode_postings(bytes: &[u8], positional: bool) -> Result<Postings> {
    let mut cursor = Cursor::new(bytes);
    let truncated = |_| BibdexError::format("postings entry is truncated");

    let mut uids = Vec::new();
    let mut positions = Vec::new();
    while (cursor.position() as usize) < bytes.len() {
        let uid = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
        if uids.last().is_some_and(|&last| last >= uid) {
            return Err(BibdexError::format(format!(
                "postings identifiers not ascending at {uid}"
            )));
        }
        uids.push(uid);

        if positional {
            let count = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
            let mut list = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let position = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
                if list.last().is_some_and(|&last| last >= position) {
                    return Err(BibdexError::format(format!(
                        "positions of {uid} are not ascending"
                    )));
                }
                list.push(position);
            }
            positions.push(list);
        }
    }

    Ok(if positional {
        Postings::with_positions(uids, positions)
    } else {
        Postings::from_uids(uids)
    })
}

/// Encoded contents of one shard triplet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardBytes {
    pub terms: Vec<u8>,
    pub master: Vec<u8>,
    pub postings: Vec<u8>,
}

/// Encode sorted `(term, postings)` entries into a shard triplet.
pub fn encode_shard(entries: &[(String, Postings)], positional: bool) -> Result<ShardBytes> {
    let mut terms = Vec::new();
    let mut postings = Vec::new();
    let mut records = Vec::with_capacity(entries.len() + 1);

    for (i, (term, list)) in entries.iter().enumerate() {
        if term.is_empty() || term.contains('\n') {
            return Err(BibdexError::format(format!("term {term:?} cannot be stored")));
        }
        if i > 0 && entries[i - 1].0 >= *term {
            return Err(BibdexError::format(format!(
                "shard entries are not sorted at '{term}'"
            )));
        }
        records.push(MasterRecord {
            term_offset: offset(terms.len())?,
            postings_offset: offset(postings.len())?,
        });
        terms.extend_from_slice(term.as_bytes());
        terms.push(b'\n');
        encode_postings(list, positional, &mut postings);
    }
    records.push(MasterRecord {
        term_offset: offset(terms.len())?,
        postings_offset: offset(postings.len())?,
    });

    Ok(ShardBytes {
        master: MasterIndex::new(positional, records)?.encode(),
        terms,
        postings,
    })
}

fn offset(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| BibdexError::format("shard exceeds 4 GiB"))
}
