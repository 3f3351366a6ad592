//! Blob-member handling (cross-cutting): binds a `binary`/`text-document`
//! class member to a (possibly shared) Blob Repository and performs the
//! actual byte-level fetch/store behind the 32-bit reference an Object
//! Container carries for such a member.

use crate::blobstore::BlobRepository;
use crate::core::{Error, Result};
use crate::schema::Member;
use crate::types::BaseType;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Which blob-backed base type a member store binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobMemberKind {
    /// Opaque bytes ([`BaseType::Binary`]).
    Binary,
    /// Text document with extractable words ([`BaseType::TextDocument`]).
    TextDocument,
}

impl BlobMemberKind {
    fn matches(self, base: BaseType) -> bool {
        matches!((self, base), (BlobMemberKind::Binary, BaseType::Binary) | (BlobMemberKind::TextDocument, BaseType::TextDocument))
    }
}

/// Table of named Blob Repositories, shared by every member store that
/// binds to the same name. A store absent on first request is created
/// lazily under `base_dir`.
pub struct BlobStoreRegistry {
    base_dir: PathBuf,
    stores: DashMap<String, Arc<BlobRepository>>,
}

impl BlobStoreRegistry {
    /// An empty registry rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            stores: DashMap::new(),
        }
    }

    /// Bind to the Blob Repository named `name`, creating it under
    /// `base_dir` the first time it's requested.
    pub fn store(&self, name: &str) -> Result<Arc<BlobRepository>> {
        if let Some(existing) = self.stores.get(name) {
            return Ok(existing.clone());
        }
        let repo = Arc::new(BlobRepository::open(self.base_dir.join(name))?);
        self.stores.insert(name.to_string(), repo.clone());
        Ok(repo)
    }
}

/// Binds `binary`/`text-document` members to Blob Repositories and
/// performs their value reads/writes on behalf of an owning object
/// repository.
pub struct BlobMemberHandler {
    registry: Arc<BlobStoreRegistry>,
    bindings: DashMap<u16, Arc<BlobRepository>>,
}

impl BlobMemberHandler {
    /// A handler with no member bindings yet, sharing `registry` with
    /// any other handler in the same process that also names a store.
    pub fn new(registry: Arc<BlobStoreRegistry>) -> Self {
        Self {
            registry,
            bindings: DashMap::new(),
        }
    }

    /// `initMemberStore`: bind `member` (whose base type must match
    /// `kind`) to the Blob Repository named `store_name`.
    pub fn init_member_store(&self, member: &Member, base: BaseType, store_name: &str, kind: BlobMemberKind) -> Result<()> {
        if !kind.matches(base) {
            return Err(Error::Type(format!("member {} is not a {kind:?} member", member.name)));
        }
        let member_id = member.member_id.ok_or_else(|| Error::Argument(format!("member {} has no assigned ID", member.name)))?;
        let blobs = self.registry.store(store_name)?;
        self.bindings.insert(member_id, blobs);
        Ok(())
    }

    fn binding(&self, member_id: u16) -> Result<Arc<BlobRepository>> {
        self.bindings
            .get(&member_id)
            .map(|b| b.clone())
            .ok_or_else(|| Error::NotInit(format!("member {member_id} has no blob store bound, call init_member_store first")))
    }

    /// `fetchBin`: fetch the bytes of `blob_id` (the value currently
    /// stored in `member_id`'s atom), appending every version reachable
    /// through the blob's `prev` chain to `out_chain`, newest first.
    pub fn fetch_bin(&self, member_id: u16, blob_id: u32, out_chain: &mut Vec<Vec<u8>>) -> Result<()> {
        let blobs = self.binding(member_id)?;
        for version in blobs.version_chain(blob_id)? {
            out_chain.push(blobs.fetch(version)?);
        }
        Ok(())
    }

    /// Store a new blob value for `member_id`, returning the blob ID the
    /// caller should assign to the owning member's atom.
    pub fn store_bin(&self, member_id: u16, bytes: &[u8]) -> Result<u32> {
        self.binding(member_id)?.insert(bytes)
    }

    /// Update a blob-backed member's value, chaining to its previous blob
    /// ID, returning the new blob ID.
    pub fn update_bin(&self, member_id: u16, prev_blob_id: u32, bytes: &[u8]) -> Result<u32> {
        self.binding(member_id)?.update(prev_blob_id, bytes)
    }

    /// True iff `member_id` has a blob store bound.
    pub fn is_bound(&self, member_id: u16) -> bool {
        self.bindings.contains_key(&member_id)
    }
}
