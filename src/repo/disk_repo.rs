//! Disk object repository: one Blob Repository holds the whole
//! serialized record per object ID. No fixed-slot area exists; fetching
//! one member still requires rehydrating the whole record.

use crate::blobstore::BlobRepository;
use crate::container::ObjectContainer;
use crate::core::{Error, Result};
use crate::delta_client::DeltaClient;
use crate::idset::IdSet;
use crate::index::{key_for, EnumIndex, TextIndex, UniqueIndex};
use crate::repo::blob_member::{BlobMemberHandler, BlobMemberKind, BlobStoreRegistry};
use crate::repo::delta_log::{self, parse_line, DELETE_MARKER_MEMBER_ID};
use crate::repo::ram_repo::IndexKind;
use crate::schema::{AdpRegistry, Class};
use crate::strings::StringTable;
use crate::types::Atom;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

/// A whole-record-per-blob object repository.
pub struct DiskObjectRepository {
    class: Class,
    adp: Arc<AdpRegistry>,
    strings: Arc<StringTable>,
    blobs: BlobRepository,
    object_to_blob: DashMap<u32, u32>,
    tombstones: Mutex<IdSet>,
    unique_indexes: DashMap<u16, UniqueIndex>,
    enum_indexes: DashMap<u16, EnumIndex>,
    text_indexes: DashMap<u16, TextIndex>,
    count: Mutex<u32>,
    mirror: Option<Arc<DeltaClient>>,
    blob_handler: BlobMemberHandler,
}

impl DiskObjectRepository {
    /// Open (creating if absent) the blob store at `base_path`.
    pub fn open(
        base_path: impl Into<PathBuf>,
        class: Class,
        adp: Arc<AdpRegistry>,
        strings: Arc<StringTable>,
        indexed_members: &[(&str, IndexKind)],
        mirror: Option<Arc<DeltaClient>>,
    ) -> Result<Self> {
        if !class.is_frozen() {
            return Err(Error::Argument(format!("class {} is not frozen", class.name)));
        }
        let base_path = base_path.into();
        let unique_indexes = DashMap::new();
        let enum_indexes = DashMap::new();
        let text_indexes = DashMap::new();
        for (name, kind) in indexed_members {
            let member = class.member_by_name(name).ok_or_else(|| Error::NotFound(format!("member {name} not on class {}", class.name)))?;
            let member_id = member.member_id.ok_or_else(|| Error::Argument(format!("member {name} has no assigned ID")))?;
            match kind {
                IndexKind::Unique => {
                    unique_indexes.insert(member_id, UniqueIndex::new());
                }
                IndexKind::Enum => {
                    enum_indexes.insert(member_id, EnumIndex::new());
                }
                IndexKind::Text => {
                    text_indexes.insert(member_id, TextIndex::new());
                }
            }
        }
        let blobs = BlobRepository::open(&base_path)?;
        let object_to_blob = DashMap::new();
        let mut tombstones = IdSet::new();
        let mut max_id: u32 = 0;
        for blob_id in 1..=blobs.blob_count() {
            let bytes = blobs.fetch(blob_id)?;
            let text = String::from_utf8(bytes).map_err(|e| Error::Corrupt(e.to_string()))?;
            let first_line = text.lines().next().ok_or_else(|| Error::Corrupt(format!("empty record blob {blob_id}")))?;
            let parsed = parse_line(first_line)?;
            if parsed.member_id == DELETE_MARKER_MEMBER_ID {
                tombstones.insert(parsed.object_id);
                continue;
            }
            object_to_blob.insert(parsed.object_id, blob_id);
            max_id = max_id.max(parsed.object_id);
        }

        let blob_dir = base_path.parent().map(|p| p.join("blobs")).unwrap_or_else(|| PathBuf::from("blobs"));
        let repo = Self {
            class,
            adp,
            strings,
            blobs,
            object_to_blob,
            tombstones: Mutex::new(tombstones),
            unique_indexes,
            enum_indexes,
            text_indexes,
            count: Mutex::new(max_id),
            mirror,
            blob_handler: BlobMemberHandler::new(Arc::new(BlobStoreRegistry::new(blob_dir))),
        };
        repo.rebuild_indexes()?;
        Ok(repo)
    }

    /// `initMemberStore`: bind `member_name` (a `binary`/`text-document`
    /// member) to the Blob Repository named `store_name`, creating it
    /// lazily under this repository's blob directory on first use.
    pub fn bind_blob_member(&self, member_name: &str, store_name: &str, kind: BlobMemberKind) -> Result<()> {
        let member = self.class.member_by_name(member_name).ok_or_else(|| Error::NotFound(format!("member {member_name} not on class {}", self.class.name)))?;
        let base = self.adp.type_by_name(&member.type_name).ok_or_else(|| Error::NotFound(format!("type {} not registered", member.type_name)))?.base();
        self.blob_handler.init_member_store(member, base, store_name, kind)
    }

    /// `fetchBin`: fetch `member_name`'s blob value for object `id`,
    /// appending every version reachable through the blob's `prev` chain
    /// to `out_chain`, newest first.
    pub fn fetch_bin(&self, id: u32, member_name: &str, out_chain: &mut Vec<Vec<u8>>) -> Result<()> {
        let member = self.class.member_by_name(member_name).ok_or_else(|| Error::NotFound(format!("member {member_name} not on class {}", self.class.name)))?;
        let member_id = member.member_id.ok_or_else(|| Error::Argument(format!("member {member_name} has no assigned ID")))?;
        let base = self.adp.type_by_name(&member.type_name).ok_or_else(|| Error::NotFound(format!("type {} not registered", member.type_name)))?.base();
        if !base.is_blob() {
            return Err(Error::Type(format!("fetch_bin called on non-blob member {member_name}")));
        }
        let container = self.fetch(id)?;
        let atom = container.get_value_by_name(member_name)?;
        let blob_id = match atom.value() {
            Some(crate::types::AtomValue::Binary(b)) | Some(crate::types::AtomValue::TextDocument(b)) => *b,
            _ => return Ok(()),
        };
        self.blob_handler.fetch_bin(member_id, blob_id, out_chain)
    }

    /// Store `bytes` as a new blob value for `member_name` on object
    /// `id`, writing a new whole-record version with the updated 32-bit
    /// reference (mirroring [`Self::update`]'s versioning).
    pub fn store_blob_member(&self, id: u32, member_name: &str, bytes: &[u8]) -> Result<()> {
        let member = self.class.member_by_name(member_name).cloned().ok_or_else(|| Error::NotFound(format!("member {member_name} not on class {}", self.class.name)))?;
        let member_id = member.member_id.ok_or_else(|| Error::Argument(format!("member {member_name} has no assigned ID")))?;
        let base = self.adp.type_by_name(&member.type_name).ok_or_else(|| Error::NotFound(format!("type {} not registered", member.type_name)))?.base();
        if !base.is_blob() {
            return Err(Error::Type(format!("store_blob_member called on non-blob member {member_name}")));
        }

        let mut container = self.fetch(id)?;
        let previous = container.get_value_by_name(member_name)?;
        let blob_id = match previous.value() {
            Some(crate::types::AtomValue::Binary(prev)) | Some(crate::types::AtomValue::TextDocument(prev)) => self.blob_handler.update_bin(member_id, *prev, bytes)?,
            _ => self.blob_handler.store_bin(member_id, bytes)?,
        };
        let mut atom = Atom::new(base);
        atom.set_value_blob(blob_id)?;
        container.set_value_by_member_id(member_id, &atom)?;

        self.update(id, &container)
    }

    fn rebuild_indexes(&self) -> Result<()> {
        for entry in self.object_to_blob.iter() {
            let object_id = *entry.key();
            let blob_id = *entry.value();
            let text = String::from_utf8(self.blobs.fetch(blob_id)?).map_err(|e| Error::Corrupt(e.to_string()))?;
            let container = self.deserialize(object_id, &text)?;
            for (member_id, atom) in container.top_level_values()? {
                self.index_insert(member_id, &atom, object_id);
            }
        }
        Ok(())
    }

    fn class_id(&self) -> u16 {
        self.class.class_id.expect("repository bound to a registered class")
    }

    /// The bound class.
    pub fn class(&self) -> &Class {
        &self.class
    }

    /// Number of object slots ever assigned.
    pub fn population(&self) -> u32 {
        *self.count.lock()
    }

    fn deserialize(&self, object_id: u32, text: &str) -> Result<ObjectContainer> {
        let mut container = ObjectContainer::init(self.adp.clone(), self.class.clone(), None)?;
        for line in text.lines() {
            let parsed = parse_line(line)?;
            if parsed.object_id != object_id {
                continue;
            }
            let member = self
                .class
                .member_by_id(parsed.member_id)
                .ok_or_else(|| Error::Corrupt(format!("disk record references unknown member {}", parsed.member_id)))?;
            let dt = self.adp.type_by_name(&member.type_name).ok_or_else(|| Error::Corrupt(format!("type {} not registered", member.type_name)))?;
            let mut atom = Atom::new(dt.base());
            atom.set_value_text(&parsed.encoded_value)?;
            container.set_value_by_member_id(parsed.member_id, &atom)?;
        }
        Ok(container)
    }

    fn index_insert(&self, member_id: u16, atom: &Atom, object_id: u32) {
        let Some(value) = atom.value() else { return };
        if let Some(idx) = self.unique_indexes.get(&member_id) {
            let _ = idx.insert(key_for(value, &self.strings), object_id);
        }
        if let Some(idx) = self.enum_indexes.get(&member_id) {
            idx.insert(key_for(value, &self.strings), object_id);
        }
        if let Some(idx) = self.text_indexes.get(&member_id) {
            idx.insert(object_id, &atom.str());
        }
    }

    fn index_delete(&self, member_id: u16, atom: &Atom, object_id: u32) {
        let Some(value) = atom.value() else { return };
        if let Some(idx) = self.unique_indexes.get(&member_id) {
            let _ = idx.delete(&key_for(value, &self.strings), object_id);
        }
        if let Some(idx) = self.enum_indexes.get(&member_id) {
            let _ = idx.delete(&key_for(value, &self.strings), object_id);
        }
        if let Some(idx) = self.text_indexes.get(&member_id) {
            idx.delete(object_id, &atom.str());
        }
    }

    /// Insert a new object, returning its assigned object ID.
    pub fn insert(&self, container: &ObjectContainer) -> Result<u32> {
        if container.class().name != self.class.name && !self.adp.is_sub_class(&self.class.name, &container.class().name) {
            return Err(Error::Argument("container is not of this repository's class".to_string()));
        }
        let values = container.top_level_values()?;
        for (member_id, atom) in &values {
            if let (Some(idx), Some(value)) = (self.unique_indexes.get(member_id), atom.value()) {
                if idx.lookup(&key_for(value, &self.strings)).is_some() {
                    return Err(Error::Duplicate(format!("member {member_id} value already present")));
                }
            }
        }

        let mut count = self.count.lock();
        let object_id = *count + 1;
        let lines: Vec<String> = values.iter().map(|(member_id, atom)| delta_log::encode_line(None, self.class_id(), object_id, *member_id, &atom.str())).collect();
        let record = lines.join("\n");
        let blob_id = self.blobs.insert(record.as_bytes())?;
        self.object_to_blob.insert(object_id, blob_id);
        *count = object_id;
        drop(count);

        for (member_id, atom) in &values {
            self.index_insert(*member_id, atom, object_id);
        }

        if let Some(mirror) = &self.mirror {
            for line in &lines {
                if let Err(e) = mirror.send_delta(line.as_bytes()) {
                    tracing::warn!(error = %e, "delta mirror send failed, continuing");
                }
            }
        }
        Ok(object_id)
    }

    /// Rehydrate the object stored under `id`.
    pub fn fetch(&self, id: u32) -> Result<ObjectContainer> {
        if self.tombstones.lock().contains(id) {
            return Err(Error::NotFound(format!("object {id} is deleted")));
        }
        let blob_id = *self.object_to_blob.get(&id).ok_or_else(|| Error::range(format!("object id {id} out of range")))?;
        let bytes = self.blobs.fetch(blob_id)?;
        let text = String::from_utf8(bytes).map_err(|e| Error::Corrupt(e.to_string()))?;
        self.deserialize(id, &text)
    }

    /// Write a new version of the record, chaining to the previous blob.
    pub fn update(&self, id: u32, container: &ObjectContainer) -> Result<()> {
        let old_blob_id = *self.object_to_blob.get(&id).ok_or_else(|| Error::range(format!("object id {id} out of range")))?;
        let old_text = String::from_utf8(self.blobs.fetch(old_blob_id)?).map_err(|e| Error::Corrupt(e.to_string()))?;
        let old_container = self.deserialize(id, &old_text)?;
        let old_values = old_container.top_level_values()?;
        let new_values = container.top_level_values()?;

        for (member_id, atom) in &new_values {
            if let (Some(idx), Some(value)) = (self.unique_indexes.get(member_id), atom.value()) {
                if let Some(existing) = idx.lookup(&key_for(value, &self.strings)) {
                    if existing != id {
                        return Err(Error::Duplicate(format!("member {member_id} value already present")));
                    }
                }
            }
        }

        let lines: Vec<String> = new_values.iter().map(|(member_id, atom)| delta_log::encode_line(None, self.class_id(), id, *member_id, &atom.str())).collect();
        let record = lines.join("\n");
        let new_blob_id = self.blobs.update(old_blob_id, record.as_bytes())?;
        self.object_to_blob.insert(id, new_blob_id);

        for (member_id, atom) in &old_values {
            self.index_delete(*member_id, atom, id);
        }
        for (member_id, atom) in &new_values {
            self.index_insert(*member_id, atom, id);
        }

        if let Some(mirror) = &self.mirror {
            for line in &lines {
                if let Err(e) = mirror.send_delta(line.as_bytes()) {
                    tracing::warn!(error = %e, "delta mirror send failed, continuing");
                }
            }
        }
        Ok(())
    }

    /// Look up the single object carrying `value` on the unique-indexed `member_name`.
    pub fn identify(&self, member_name: &str, atom: &Atom) -> Result<Option<u32>> {
        let member = self.class.member_by_name(member_name).ok_or_else(|| Error::NotFound(format!("member {member_name} not on class {}", self.class.name)))?;
        let member_id = member.member_id.ok_or_else(|| Error::Argument(format!("member {member_name} has no assigned ID")))?;
        let Some(idx) = self.unique_indexes.get(&member_id) else {
            return Err(Error::Type(format!("member {member_name} has no unique-key index")));
        };
        let Some(value) = atom.value() else { return Ok(None) };
        Ok(idx.lookup(&key_for(value, &self.strings)))
    }

    /// Logically tombstone object `id`; the record blob is left in place.
    /// Durable and mirrored: a standalone tombstone marker blob is appended
    /// so reopening (or rebuilding a peer from the mirrored stream)
    /// reproduces the deletion instead of resurrecting `id`.
    pub fn delete(&self, id: u32) -> Result<()> {
        if !self.object_to_blob.contains_key(&id) {
            return Err(Error::range(format!("object id {id} out of range")));
        }

        let line = delta_log::encode_delete_line(None, self.class_id(), id);
        self.blobs.insert(line.as_bytes())?;
        self.tombstones.lock().insert(id);

        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.send_delta(line.as_bytes()) {
                tracing::warn!(error = %e, "delta mirror send failed, continuing");
            }
        }

        Ok(())
    }
}
