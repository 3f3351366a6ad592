//! Append-only blob repository: a data file of raw bytes and a parallel
//! index file of fixed-size headers, one per blob.

use crate::constants::HZ_BLOCKSIZE;
use crate::core::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const HEADER_BYTES: usize = 24;

#[derive(Debug, Clone, Copy)]
struct BlobHeader {
    address: u64,
    size: u32,
    prev: u32,
    stamp: i64,
}

impl BlobHeader {
    fn to_bytes(self) -> [u8; HEADER_BYTES] {
        let mut buf = [0u8; HEADER_BYTES];
        buf[0..8].copy_from_slice(&self.address.to_le_bytes());
        buf[8..12].copy_from_slice(&self.size.to_le_bytes());
        buf[12..16].copy_from_slice(&self.prev.to_le_bytes());
        buf[16..24].copy_from_slice(&self.stamp.to_le_bytes());
        buf
    }

    fn from_bytes(buf: &[u8; HEADER_BYTES]) -> Self {
        Self {
            address: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            size: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            prev: u32::from_le_bytes(buf[12..16].try_into().unwrap()),
            stamp: i64::from_le_bytes(buf[16..24].try_into().unwrap()),
        }
    }
}

struct Counters {
    blob_count: u32,
    total_size: u64,
}

/// An append-only store of opaque byte blobs, addressed by a 1-based ID.
///
/// Four independent locks (index-read, index-write, data-read,
/// data-write) let a fetch proceed without blocking a concurrent insert
/// on the other file.
pub struct BlobRepository {
    index_read: RwLock<File>,
    index_write: Mutex<File>,
    data_read: RwLock<File>,
    data_write: Mutex<File>,
    counters: Mutex<Counters>,
}

impl BlobRepository {
    /// Open (creating if absent) the data/index file pair at `base_path`
    /// (suffixed `.blob.dat` / `.blob.idx`).
    pub fn open(base_path: impl AsRef<Path>) -> Result<Self> {
        let base: PathBuf = base_path.as_ref().to_path_buf();
        let data_path = base.with_extension("blob.dat");
        let index_path = base.with_extension("blob.idx");

        let open = |path: &Path| -> std::io::Result<File> { OpenOptions::new().create(true).read(true).write(true).open(path) };
        let data_w = open(&data_path)?;
        let index_w = open(&index_path)?;
        let data_r = open(&data_path)?;
        let index_r = open(&index_path)?;

        let index_len = index_r.metadata()?.len();
        let blob_count = (index_len / HEADER_BYTES as u64) as u32;
        let total_size = data_r.metadata()?.len();

        Ok(Self {
            index_read: RwLock::new(index_r),
            index_write: Mutex::new(index_w),
            data_read: RwLock::new(data_r),
            data_write: Mutex::new(data_w),
            counters: Mutex::new(Counters { blob_count, total_size }),
        })
    }

    /// Current number of blobs stored.
    pub fn blob_count(&self) -> u32 {
        self.counters.lock().blob_count
    }

    /// Append `bytes` as a new blob, returning its 1-based ID.
    pub fn insert(&self, bytes: &[u8]) -> Result<u32> {
        self.append(bytes, 0)
    }

    /// Append `bytes` as a new version superseding `prev_id`, returning
    /// the new blob's ID. The old bytes are never reclaimed.
    pub fn update(&self, prev_id: u32, bytes: &[u8]) -> Result<u32> {
        self.append(bytes, prev_id)
    }

    fn append(&self, bytes: &[u8], prev: u32) -> Result<u32> {
        let mut index_file = self.index_write.lock();
        let mut data_file = self.data_write.lock();
        let mut counters = self.counters.lock();

        let header = BlobHeader {
            address: counters.total_size,
            size: bytes.len() as u32,
            prev,
            stamp: now_epoch(),
        };
        index_file.seek(SeekFrom::End(0))?;
        index_file.write_all(&header.to_bytes())?;
        index_file.flush()?;

        data_file.seek(SeekFrom::End(0))?;
        data_file.write_all(bytes)?;
        data_file.flush()?;

        counters.blob_count += 1;
        counters.total_size += bytes.len() as u64;
        Ok(counters.blob_count)
    }

    /// Fetch the bytes stored under `id` (1-based).
    pub fn fetch(&self, id: u32) -> Result<Vec<u8>> {
        if id == 0 || id > self.blob_count() {
            return Err(Error::range(format!("blob id {id} out of range")));
        }
        let header = self.read_header(id)?;
        let mut index = self.data_read.write();
        index.seek(SeekFrom::Start(header.address))?;
        let mut out = Vec::with_capacity(header.size as usize);
        let mut remaining = header.size as usize;
        let mut chunk = vec![0u8; HZ_BLOCKSIZE];
        while remaining > 0 {
            let take = remaining.min(HZ_BLOCKSIZE);
            index.read_exact(&mut chunk[..take])?;
            out.extend_from_slice(&chunk[..take]);
            remaining -= take;
        }
        Ok(out)
    }

    /// Walk the `prev` chain starting at `id`, returning every blob ID in
    /// the chain from newest (`id` itself) to oldest.
    pub fn version_chain(&self, id: u32) -> Result<Vec<u32>> {
        let mut chain = Vec::new();
        let mut current = id;
        while current != 0 {
            chain.push(current);
            current = self.read_header(current)?.prev;
        }
        Ok(chain)
    }

    fn read_header(&self, id: u32) -> Result<BlobHeader> {
        let mut index = self.index_read.write();
        index.seek(SeekFrom::Start((id as u64 - 1) * HEADER_BYTES as u64))?;
        let mut buf = [0u8; HEADER_BYTES];
        index.read_exact(&mut buf)?;
        Ok(BlobHeader::from_bytes(&buf))
    }

    /// Interface-symmetry no-op: succeeds only if `id` is in range. Logical
    /// deletion lives in the owning object repository, not here.
    pub fn delete(&self, id: u32) -> Result<()> {
        if id == 0 || id > self.blob_count() {
            return Err(Error::range(format!("blob id {id} out of range")));
        }
        Ok(())
    }

    /// Sweep the index file verifying monotonic timestamps and that the
    /// sum of blob sizes matches the data file's length.
    pub fn integrity(&self) -> Result<()> {
        let mut index = self.index_read.write();
        index.seek(SeekFrom::Start(0))?;
        let mut last_stamp = i64::MIN;
        let mut total = 0u64;
        let mut buf = [0u8; HEADER_BYTES];
        loop {
            match index.read_exact(&mut buf) {
                Ok(()) => {
                    let header = BlobHeader::from_bytes(&buf);
                    if header.stamp < last_stamp {
                        return Err(Error::Corrupt("blob index timestamps are not monotonic".to_string()));
                    }
                    last_stamp = header.stamp;
                    total += header.size as u64;
                }
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
        }
        let data_len = self.counters.lock().total_size;
        if total != data_len {
            return Err(Error::Corrupt(format!("blob sizes sum to {total}, data file is {data_len} bytes")));
        }
        Ok(())
    }
}

fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn insert_and_fetch_round_trip() {
        let dir = tempdir().unwrap();
        let repo = BlobRepository::open(dir.path().join("app")).unwrap();
        let id = repo.insert(b"hello world").unwrap();
        assert_eq!(id, 1);
        assert_eq!(repo.fetch(id).unwrap(), b"hello world");
    }

    #[test]
    fn update_chains_prev_and_keeps_old_bytes_reachable() {
        let dir = tempdir().unwrap();
        let repo = BlobRepository::open(dir.path().join("app")).unwrap();
        let id1 = repo.insert(b"v1").unwrap();
        let id2 = repo.update(id1, b"v2-longer").unwrap();
        assert_ne!(id1, id2);
        assert_eq!(repo.fetch(id1).unwrap(), b"v1");
        assert_eq!(repo.fetch(id2).unwrap(), b"v2-longer");
    }

    #[test]
    fn fetch_out_of_range_errors() {
        let dir = tempdir().unwrap();
        let repo = BlobRepository::open(dir.path().join("app")).unwrap();
        assert!(repo.fetch(1).is_err());
    }

    #[test]
    fn integrity_passes_on_well_formed_repo() {
        let dir = tempdir().unwrap();
        let repo = BlobRepository::open(dir.path().join("app")).unwrap();
        repo.insert(b"a").unwrap();
        repo.insert(b"bb").unwrap();
        repo.integrity().unwrap();
    }

    #[test]
    fn version_chain_walks_prev_pointers_newest_first() {
        let dir = tempdir().unwrap();
        let repo = BlobRepository::open(dir.path().join("app")).unwrap();
        let id1 = repo.insert(b"v1").unwrap();
        let id2 = repo.update(id1, b"v2").unwrap();
        let id3 = repo.update(id2, b"v3").unwrap();
        assert_eq!(repo.version_chain(id3).unwrap(), vec![id3, id2, id1]);
    }

    #[test]
    fn reopen_recovers_blob_count_from_index_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app");
        {
            let repo = BlobRepository::open(&path).unwrap();
            repo.insert(b"persisted").unwrap();
        }
        let repo = BlobRepository::open(&path).unwrap();
        assert_eq!(repo.blob_count(), 1);
        assert_eq!(repo.fetch(1).unwrap(), b"persisted");
    }
}
