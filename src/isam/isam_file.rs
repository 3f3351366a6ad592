//! Sorted, block-oriented key/value file with an in-memory block index.
//!
//! Keys may repeat within a block (a block is a multi-map); the
//! in-memory index maps each block's lowest key to its byte offset in
//! the data file, the same shape as the on-disk `address,key` log.

use crate::constants::ISAM_BLOCK_SIZE;
use crate::core::{Error, Result};
use base64::prelude::*;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

type Entry = (Vec<u8>, Vec<u8>);

fn encode_block(entries: &[Entry]) -> Vec<u8> {
    let mut out = Vec::new();
    for (k, v) in entries {
        out.extend_from_slice(BASE64_STANDARD.encode(k).as_bytes());
        out.push(b' ');
        out.extend_from_slice(BASE64_STANDARD.encode(v).as_bytes());
        out.push(b'\n');
    }
    out
}

fn decode_block(raw: &[u8]) -> Vec<Entry> {
    let mut out = Vec::new();
    for line in raw.split(|&b| b == b'\n') {
        if line.is_empty() {
            continue;
        }
        let Some(space) = line.iter().position(|&b| b == b' ') else { continue };
        let (k, v) = line.split_at(space);
        let v = &v[1..];
        let (Ok(key), Ok(value)) = (BASE64_STANDARD.decode(k), BASE64_STANDARD.decode(v)) else {
            continue;
        };
        out.push((key, value));
    }
    out
}

struct State {
    index: BTreeMap<Vec<u8>, u64>,
    next_offset: u64,
}

/// A sorted, block-oriented key/value file.
pub struct IsamFile {
    data: Mutex<File>,
    index_log: Mutex<File>,
    state: RwLock<State>,
}

impl IsamFile {
    /// Open (creating if absent) the data/index-log pair at `base_path`
    /// (suffixed `.isam.dat` / `.isam.idx`), replaying the index log.
    pub fn open(base_path: impl AsRef<Path>) -> Result<Self> {
        let base: PathBuf = base_path.as_ref().to_path_buf();
        let data_path = base.with_extension("isam.dat");
        let index_log_path = base.with_extension("isam.idx");

        let data = OpenOptions::new().create(true).read(true).write(true).open(&data_path)?;
        let index_log = OpenOptions::new().create(true).read(true).append(true).open(&index_log_path)?;

        let mut index = BTreeMap::new();
        let reader = BufReader::new(File::open(&index_log_path)?);
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let Some((addr_str, key_b64)) = line.split_once(',') else { continue };
            let Ok(addr) = addr_str.parse::<u64>() else { continue };
            let Ok(key) = BASE64_STANDARD.decode(key_b64) else { continue };
            index.insert(key, addr);
        }
        let next_offset = data.metadata()?.len();

        Ok(Self {
            data: Mutex::new(data),
            index_log: Mutex::new(index_log),
            state: RwLock::new(State { index, next_offset }),
        })
    }

    fn read_block(&self, offset: u64) -> Result<Vec<Entry>> {
        let mut file = self.data.lock();
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; ISAM_BLOCK_SIZE];
        let read = file.read(&mut buf)?;
        buf.truncate(read);
        Ok(decode_block(&buf))
    }

    fn write_block(&self, offset: u64, entries: &[Entry]) -> Result<()> {
        let mut bytes = encode_block(entries);
        if bytes.len() > ISAM_BLOCK_SIZE {
            return Err(Error::Corrupt("block overflowed after split".to_string()));
        }
        bytes.resize(ISAM_BLOCK_SIZE, 0);
        let mut file = self.data.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(())
    }

    fn append_index_entry(&self, key: &[u8], offset: u64) -> Result<()> {
        let mut log = self.index_log.lock();
        writeln!(log, "{offset},{}", BASE64_STANDARD.encode(key))?;
        log.flush()?;
        Ok(())
    }

    fn block_offset_for(&self, key: &[u8]) -> u64 {
        self.state.read().index.range(..=key.to_vec()).next_back().map(|(_, v)| *v).unwrap_or(0)
    }

    /// Insert `(key, value)`.
    pub fn insert(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let is_empty = self.state.read().index.is_empty();
        if is_empty {
            let offset = 0u64;
            self.write_block(offset, &[(key.to_vec(), value.to_vec())])?;
            let mut state = self.state.write();
            state.index.insert(Vec::new(), offset);
            state.next_offset = ISAM_BLOCK_SIZE as u64;
            drop(state);
            self.append_index_entry(&[], offset)?;
            return Ok(());
        }

        let offset = self.block_offset_for(key);
        let mut entries = self.read_block(offset)?;
        entries.push((key.to_vec(), value.to_vec()));
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let full = encode_block(&entries);
        if full.len() <= ISAM_BLOCK_SIZE {
            self.write_block(offset, &entries)?;
            return Ok(());
        }

        let mut kept = Vec::new();
        let mut kept_len = 0usize;
        let mut split_at = entries.len();
        for (i, entry) in entries.iter().enumerate() {
            let line_len = BASE64_STANDARD.encode(&entry.0).len() + 1 + BASE64_STANDARD.encode(&entry.1).len() + 1;
            if kept_len + line_len > ISAM_BLOCK_SIZE {
                split_at = i;
                break;
            }
            kept.push(entry.clone());
            kept_len += line_len;
        }
        let spilled: Vec<Entry> = entries[split_at..].to_vec();
        kept = entries[..split_at].to_vec();
        let _ = kept_len;

        self.write_block(offset, &kept)?;

        let new_offset = {
            let mut state = self.state.write();
            let new_offset = state.next_offset;
            state.next_offset += ISAM_BLOCK_SIZE as u64;
            new_offset
        };
        self.write_block(new_offset, &spilled)?;
        let spill_key = spilled[0].0.clone();
        self.state.write().index.insert(spill_key.clone(), new_offset);
        self.append_index_entry(&spill_key, new_offset)?;
        Ok(())
    }

    /// All `(key, value)` pairs with `lo <= key <= hi`.
    pub fn fetch(&self, lo: &[u8], hi: &[u8]) -> Result<Vec<Entry>> {
        let starts: Vec<(Vec<u8>, u64)> = self.state.read().index.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let mut out = Vec::new();
        let mut started = false;
        for (idx, (start_key, offset)) in starts.iter().enumerate() {
            let is_last = idx + 1 == starts.len();
            let next_start = if is_last { None } else { Some(&starts[idx + 1].0) };
            let could_contain_lo = next_start.map(|n| n.as_slice() > lo).unwrap_or(true);
            if !started {
                if !could_contain_lo {
                    continue;
                }
                started = true;
            }
            if start_key.as_slice() > hi {
                break;
            }
            for (k, v) in self.read_block(*offset)? {
                if k.as_slice() >= lo && k.as_slice() <= hi {
                    out.push((k, v));
                }
            }
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    /// True iff any entry has exactly this key.
    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        let offset = self.block_offset_for(key);
        Ok(self.read_block(offset)?.iter().any(|(k, _)| k == key))
    }

    /// Physical removal is not implemented; logical deletion is carried
    /// by the owning object repository's litmus bits.
    pub fn delete(&self, _key: &[u8]) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn insert_then_fetch_single_block() {
        let dir = tempdir().unwrap();
        let isam = IsamFile::open(dir.path().join("app")).unwrap();
        isam.insert(b"b", b"2").unwrap();
        isam.insert(b"a", b"1").unwrap();
        isam.insert(b"c", b"3").unwrap();

        let got = isam.fetch(b"a", b"b").unwrap();
        assert_eq!(got, vec![(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec())]);
        assert!(isam.exists(b"c").unwrap());
        assert!(!isam.exists(b"z").unwrap());
    }

    #[test]
    fn spills_to_new_block_when_full() {
        let dir = tempdir().unwrap();
        let isam = IsamFile::open(dir.path().join("app")).unwrap();
        for i in 0..500u32 {
            let key = format!("key-{i:06}");
            isam.insert(key.as_bytes(), b"v").unwrap();
        }
        assert!(isam.state.read().index.len() > 1);
        let all = isam.fetch(b"key-000000", b"key-000499").unwrap();
        assert_eq!(all.len(), 500);
    }

    #[test]
    fn reopen_replays_index_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app");
        {
            let isam = IsamFile::open(&path).unwrap();
            isam.insert(b"a", b"1").unwrap();
        }
        let isam = IsamFile::open(&path).unwrap();
        assert!(isam.exists(b"a").unwrap());
    }
}
