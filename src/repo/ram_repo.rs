//! RAM object repository: every object lives in memory, backed by a
//! local append-only delta log for crash recovery and mirroring.
//!
//! The original's fixed-slot-area / litmus-bit cache-block layout is
//! represented here at the container level (a `Vec<Option<ObjectContainer>>`
//! slot per object) rather than as a raw byte layout — see DESIGN.md.

use crate::container::ObjectContainer;
use crate::core::{Error, Result};
use crate::delta_client::DeltaClient;
use crate::idset::IdSet;
use crate::index::{key_for, EnumIndex, TextIndex, UniqueIndex};
use crate::repo::blob_member::{BlobMemberHandler, BlobMemberKind, BlobStoreRegistry};
use crate::repo::delta_log::{self, parse_line, DELETE_MARKER_MEMBER_ID};
use crate::schema::{AdpRegistry, Class};
use crate::strings::StringTable;
use crate::types::{Atom, BaseType};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Which kind of value index, if any, a member carries.
pub enum IndexKind {
    /// Strict one-to-one value -> object-ID.
    Unique,
    /// Categorical value -> Id-Set.
    Enum,
    /// Tokenized word -> Id-Set (over `text`/`text-document` members).
    Text,
}

/// An in-memory repository of one class's objects, durable via a local
/// delta log.
pub struct RamObjectRepository {
    class: Class,
    adp: Arc<AdpRegistry>,
    strings: Arc<StringTable>,
    objects: RwLock<Vec<Option<ObjectContainer>>>,
    tombstones: Mutex<IdSet>,
    unique_indexes: DashMap<u16, UniqueIndex>,
    enum_indexes: DashMap<u16, EnumIndex>,
    text_indexes: DashMap<u16, TextIndex>,
    delta_log: Mutex<std::fs::File>,
    mirror: Option<Arc<DeltaClient>>,
    blob_handler: BlobMemberHandler,
}

impl RamObjectRepository {
    /// Open the repository's delta log at `path` (creating it if absent)
    /// and replay it to rebuild in-memory state. `indexed_members` names
    /// which members carry which index kind (there is no "unique" bit on
    /// [`crate::schema::Member`] itself — callers declare it here).
    pub fn open(
        path: impl Into<PathBuf>,
        class: Class,
        adp: Arc<AdpRegistry>,
        strings: Arc<StringTable>,
        indexed_members: &[(&str, IndexKind)],
        mirror: Option<Arc<DeltaClient>>,
    ) -> Result<Self> {
        if !class.is_frozen() {
            return Err(Error::Argument(format!("class {} is not frozen", class.name)));
        }
        let path = path.into();
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

        let mut objects: Vec<Option<ObjectContainer>> = vec![None];
        let mut tombstones = IdSet::new();
        let mut highest_seen: u32 = 0;
        if path.exists() {
            let reader = BufReader::new(std::fs::File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if line.is_empty() {
                    continue;
                }
                let parsed = parse_line(&line)?;
                let oid = parsed.object_id;
                if oid == 0 {
                    return Err(Error::Sequence(format!("delta log references object id 0 (reserved): {line}")));
                }
                if oid > highest_seen {
                    if oid != highest_seen + 1 {
                        return Err(Error::Sequence(format!(
                            "non-contiguous object id {oid} in delta log, expected {} next: {line}",
                            highest_seen + 1
                        )));
                    }
                    highest_seen = oid;
                }
                let oid = oid as usize;
                while objects.len() <= oid {
                    objects.push(None);
                }

                if parsed.member_id == DELETE_MARKER_MEMBER_ID {
                    if objects[oid].is_none() {
                        return Err(Error::Sequence(format!("delete marker for never-inserted object {oid}: {line}")));
                    }
                    tombstones.insert(oid as u32);
                    continue;
                }

                if objects[oid].is_none() {
                    objects[oid] = Some(ObjectContainer::init(adp.clone(), class.clone(), None)?);
                }
                let member = class
                    .member_by_id(parsed.member_id)
                    .ok_or_else(|| Error::Corrupt(format!("delta line references unknown member {}", parsed.member_id)))?;
                let dt = adp.type_by_name(&member.type_name).ok_or_else(|| Error::Corrupt(format!("type {} not registered", member.type_name)))?;
                let mut atom = Atom::new(dt.base());
                atom.set_value_text(&parsed.encoded_value)?;
                objects[oid].as_mut().unwrap().set_value_by_member_id(parsed.member_id, &atom)?;
            }
        }

        let delta_log = OpenOptions::new().create(true).append(true).open(&path)?;
        let blob_dir = path.parent().map(|p| p.join("blobs")).unwrap_or_else(|| PathBuf::from("blobs"));
        let repo = Self {
            class,
            adp,
            strings,
            objects: RwLock::new(objects),
            tombstones: Mutex::new(tombstones),
            unique_indexes,
            enum_indexes,
            text_indexes,
            delta_log: Mutex::new(delta_log),
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
        let atom = self
            .objects
            .read()
            .get(id as usize)
            .and_then(|o| o.as_ref())
            .ok_or_else(|| Error::range(format!("object id {id} out of range")))?
            .get_value_by_name(member_name)?;
        let blob_id = match atom.value() {
            Some(crate::types::AtomValue::Binary(b)) | Some(crate::types::AtomValue::TextDocument(b)) => *b,
            _ => return Ok(()),
        };
        self.blob_handler.fetch_bin(member_id, blob_id, out_chain)
    }

    /// Store `bytes` as a new blob value for `member_name` on object
    /// `id`, updating (and delta-logging) the member's 32-bit reference.
    pub fn store_blob_member(&self, id: u32, member_name: &str, bytes: &[u8]) -> Result<()> {
        let member = self.class.member_by_name(member_name).cloned().ok_or_else(|| Error::NotFound(format!("member {member_name} not on class {}", self.class.name)))?;
        let member_id = member.member_id.ok_or_else(|| Error::Argument(format!("member {member_name} has no assigned ID")))?;
        let base = self.adp.type_by_name(&member.type_name).ok_or_else(|| Error::NotFound(format!("type {} not registered", member.type_name)))?.base();
        if !base.is_blob() {
            return Err(Error::Type(format!("store_blob_member called on non-blob member {member_name}")));
        }

        let mut objects = self.objects.write();
        let container = objects.get_mut(id as usize).and_then(|o| o.as_mut()).ok_or_else(|| Error::range(format!("object id {id} out of range")))?;
        let previous = container.get_value_by_name(member_name)?;
        let blob_id = match previous.value() {
            Some(crate::types::AtomValue::Binary(prev)) | Some(crate::types::AtomValue::TextDocument(prev)) => self.blob_handler.update_bin(member_id, *prev, bytes)?,
            _ => self.blob_handler.store_bin(member_id, bytes)?,
        };

        let mut atom = Atom::new(base);
        atom.set_value_blob(blob_id)?;
        container.set_value_by_member_id(member_id, &atom)?;
        drop(objects);

        let line = delta_log::encode_line(None, self.class_id(), id, member_id, &atom.str());
        {
            let mut log = self.delta_log.lock();
            writeln!(log, "{line}")?;
            log.flush()?;
        }
        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.send_delta(line.as_bytes()) {
                tracing::warn!(error = %e, "delta mirror send failed, continuing");
            }
        }
        Ok(())
    }

    fn rebuild_indexes(&self) -> Result<()> {
        let objects = self.objects.read();
        for (id, slot) in objects.iter().enumerate() {
            let Some(container) = slot else { continue };
            for (member_id, atom) in container.top_level_values()? {
                self.index_insert(member_id, &atom, id as u32);
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

    /// Number of live (non-tombstoned) object slots ever assigned.
    pub fn population(&self) -> u32 {
        self.objects.read().len() as u32 - 1
    }

    fn index_insert(&self, member_id: u16, atom: &Atom, object_id: u32) {
        let Some(value) = atom.value() else { return };
        if let Some(idx) = self.unique_indexes.get(&member_id) {
            let key = key_for(value, &self.strings);
            let _ = idx.insert(key, object_id);
        }
        if let Some(idx) = self.enum_indexes.get(&member_id) {
            let key = key_for(value, &self.strings);
            idx.insert(key, object_id);
        }
        if let Some(idx) = self.text_indexes.get(&member_id) {
            idx.insert(object_id, &atom.str());
        }
    }

    fn index_delete(&self, member_id: u16, atom: &Atom, object_id: u32) {
        let Some(value) = atom.value() else { return };
        if let Some(idx) = self.unique_indexes.get(&member_id) {
            let key = key_for(value, &self.strings);
            let _ = idx.delete(&key, object_id);
        }
        if let Some(idx) = self.enum_indexes.get(&member_id) {
            let key = key_for(value, &self.strings);
            let _ = idx.delete(&key, object_id);
        }
        if let Some(idx) = self.text_indexes.get(&member_id) {
            idx.delete(object_id, &atom.str());
        }
    }

    fn check_unique(&self, values: &[(u16, Atom)]) -> Result<()> {
        for (member_id, atom) in values {
            if let (Some(idx), Some(value)) = (self.unique_indexes.get(member_id), atom.value()) {
                let key = key_for(value, &self.strings);
                if idx.lookup(&key).is_some() {
                    return Err(Error::Duplicate(format!("member {member_id} value already present")));
                }
            }
        }
        Ok(())
    }

    /// Insert a new object, returning its assigned object ID (`population() + 1`).
    pub fn insert(&self, container: &ObjectContainer) -> Result<u32> {
        if container.class().name != self.class.name && !self.adp.is_sub_class(&self.class.name, &container.class().name) {
            return Err(Error::Argument("container is not of this repository's class".to_string()));
        }
        let values = container.top_level_values()?;

        let mut objects = self.objects.write();
        self.check_unique(&values)?;

        let object_id = objects.len() as u32;
        let lines: Vec<String> = values.iter().map(|(member_id, atom)| delta_log::encode_line(None, self.class_id(), object_id, *member_id, &atom.str())).collect();

        {
            let mut log = self.delta_log.lock();
            for line in &lines {
                writeln!(log, "{line}")?;
            }
            log.flush()?;
        }

        objects.push(Some(container.clone()));
        drop(objects);

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
        self.objects.read().get(id as usize).and_then(|o| o.clone()).ok_or_else(|| Error::range(format!("object id {id} out of range")))
    }

    /// Overwrite the object stored under `id` in place.
    pub fn update(&self, id: u32, container: &ObjectContainer) -> Result<()> {
        let mut objects = self.objects.write();
        if id == 0 || id as usize >= objects.len() || objects[id as usize].is_none() {
            return Err(Error::range(format!("object id {id} out of range")));
        }
        let old_values = objects[id as usize].as_ref().unwrap().top_level_values()?;
        let new_values = container.top_level_values()?;

        for (member_id, atom) in &new_values {
            if let (Some(idx), Some(value)) = (self.unique_indexes.get(member_id), atom.value()) {
                let key = key_for(value, &self.strings);
                if let Some(existing) = idx.lookup(&key) {
                    if existing != id {
                        return Err(Error::Duplicate(format!("member {member_id} value already present")));
                    }
                }
            }
        }

        let lines: Vec<String> = new_values.iter().map(|(member_id, atom)| delta_log::encode_line(None, self.class_id(), id, *member_id, &atom.str())).collect();
        {
            let mut log = self.delta_log.lock();
            for line in &lines {
                writeln!(log, "{line}")?;
            }
            log.flush()?;
        }

        for (member_id, atom) in &old_values {
            self.index_delete(*member_id, atom, id);
        }
        objects[id as usize] = Some(container.clone());
        drop(objects);
        for (member_id, atom) in &new_values {
            self.index_insert(*member_id, atom, id);
        }
        Ok(())
    }

    /// Logically tombstone object `id`; slot data remains in place. Durable
    /// and mirrored: a tombstone marker line is appended to the delta log
    /// (and forwarded to the mirror) so replaying the log, or rebuilding a
    /// peer from it, reproduces the deletion instead of resurrecting `id`.
    pub fn delete(&self, id: u32) -> Result<()> {
        let objects = self.objects.read();
        if id == 0 || id as usize >= objects.len() || objects[id as usize].is_none() {
            return Err(Error::range(format!("object id {id} out of range")));
        }
        drop(objects);

        let line = delta_log::encode_delete_line(None, self.class_id(), id);
        {
            let mut log = self.delta_log.lock();
            writeln!(log, "{line}")?;
            log.flush()?;
        }

        self.tombstones.lock().insert(id);

        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.send_delta(line.as_bytes()) {
                tracing::warn!(error = %e, "delta mirror send failed, continuing");
            }
        }

        Ok(())
    }

    /// True iff `id` has been logically deleted.
    pub fn is_deleted(&self, id: u32) -> bool {
        self.tombstones.lock().contains(id)
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Designation, MaxPopulation, Member, MinPopulation};
    use crate::types::BaseType;
    use tempfile::tempdir;

    fn person_class(adp: &AdpRegistry) -> Class {
        let mut class = Class::new("Person", Designation::User);
        class.add_member(Member::new("name", "string", MinPopulation::Required, MaxPopulation::One, 0)).unwrap();
        class.add_member(Member::new("age", "u16", MinPopulation::Optional, MaxPopulation::One, 1)).unwrap();
        class.freeze().unwrap();
        adp.register_class(class).unwrap();
        let class = adp.class_by_name("Person").unwrap();
        for member in class.members().to_vec() {
            adp.register_member("Person", member).unwrap();
        }
        adp.class_by_name("Person").unwrap()
    }

    #[test]
    fn scenario_s1_register_insert_fetch_duplicate() {
        let adp = Arc::new(AdpRegistry::new("test"));
        adp.init_standard();
        let class = person_class(&adp);
        let strings = Arc::new(StringTable::new());
        let dir = tempdir().unwrap();
        let repo = RamObjectRepository::open(dir.path().join("person.delta"), class.clone(), adp.clone(), strings, &[("name", IndexKind::Unique)], None).unwrap();

        let mut ada = ObjectContainer::init(adp.clone(), class.clone(), None).unwrap();
        ada.set_value_text("name", "Ada").unwrap();
        ada.set_value_text("age", "36").unwrap();
        let id = repo.insert(&ada).unwrap();
        assert_eq!(id, 1);

        let fetched = repo.fetch(1).unwrap();
        assert_eq!(fetched.get_value_by_name("name").unwrap().str(), "Ada");
        assert_eq!(fetched.get_value_by_name("age").unwrap().str(), "36");

        let mut ada2 = ObjectContainer::init(adp.clone(), class.clone(), None).unwrap();
        ada2.set_value_text("name", "Ada").unwrap();
        ada2.set_value_text("age", "11").unwrap();
        assert!(repo.insert(&ada2).is_err());
    }

    #[test]
    fn scenario_s5_delta_replay_after_reopen() {
        let adp = Arc::new(AdpRegistry::new("test"));
        adp.init_standard();
        let class = person_class(&adp);
        let strings = Arc::new(StringTable::new());
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("person.delta");

        {
            let repo = RamObjectRepository::open(&log_path, class.clone(), adp.clone(), strings.clone(), &[("name", IndexKind::Unique)], None).unwrap();
            for (name, age) in [("Ada", "36"), ("Grace", "85"), ("Linus", "54")] {
                let mut o = ObjectContainer::init(adp.clone(), class.clone(), None).unwrap();
                o.set_value_text("name", name).unwrap();
                o.set_value_text("age", age).unwrap();
                repo.insert(&o).unwrap();
            }
        }

        let repo = RamObjectRepository::open(&log_path, class.clone(), adp.clone(), strings, &[("name", IndexKind::Unique)], None).unwrap();
        assert_eq!(repo.population(), 3);
        assert_eq!(repo.fetch(1).unwrap().get_value_by_name("name").unwrap().str(), "Ada");
        assert_eq!(repo.fetch(3).unwrap().get_value_by_name("name").unwrap().str(), "Linus");

        let mut dup = ObjectContainer::init(adp, class, None).unwrap();
        dup.set_value_text("name", "Ada").unwrap();
        assert!(repo.insert(&dup).is_err());
    }

    #[test]
    fn delete_tombstones_without_erasing_slot() {
        let adp = Arc::new(AdpRegistry::new("test"));
        adp.init_standard();
        let class = person_class(&adp);
        let strings = Arc::new(StringTable::new());
        let dir = tempdir().unwrap();
        let repo = RamObjectRepository::open(dir.path().join("person.delta"), class.clone(), adp.clone(), strings, &[], None).unwrap();
        let mut o = ObjectContainer::init(adp, class, None).unwrap();
        o.set_value_text("name", "Ada").unwrap();
        let id = repo.insert(&o).unwrap();
        repo.delete(id).unwrap();
        assert!(repo.is_deleted(id));
        assert!(repo.fetch(id).is_err());
    }

    #[test]
    fn delete_survives_reopen_and_replay() {
        let adp = Arc::new(AdpRegistry::new("test"));
        adp.init_standard();
        let class = person_class(&adp);
        let strings = Arc::new(StringTable::new());
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("person.delta");

        {
            let repo = RamObjectRepository::open(&log_path, class.clone(), adp.clone(), strings.clone(), &[], None).unwrap();
            let mut o = ObjectContainer::init(adp.clone(), class.clone(), None).unwrap();
            o.set_value_text("name", "Ada").unwrap();
            let id = repo.insert(&o).unwrap();
            repo.delete(id).unwrap();
        }

        let repo = RamObjectRepository::open(&log_path, class, adp, strings, &[], None).unwrap();
        assert!(repo.is_deleted(1));
        assert!(repo.fetch(1).is_err());
    }

    #[test]
    fn replay_rejects_non_contiguous_object_ids() {
        let adp = Arc::new(AdpRegistry::new("test"));
        adp.init_standard();
        let class = person_class(&adp);
        let strings = Arc::new(StringTable::new());
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("person.delta");

        let class_id = class.class_id.unwrap();
        let name_member_id = class.member_by_name("name").unwrap().member_id.unwrap();
        let corrupt = format!(
            "{}\n{}\n",
            delta_log::encode_line(None, class_id, 1, name_member_id, "Ada"),
            delta_log::encode_line(None, class_id, 3, name_member_id, "Grace"),
        );
        std::fs::write(&log_path, corrupt).unwrap();

        let result = RamObjectRepository::open(&log_path, class, adp, strings, &[], None);
        assert!(matches!(result, Err(Error::Sequence(_))));
    }

    #[test]
    fn blob_member_store_and_fetch_round_trips_through_bound_store() {
        let adp = Arc::new(AdpRegistry::new("test"));
        adp.init_standard();
        let mut class = Class::new("Document", Designation::User);
        class.add_member(Member::new("title", "string", MinPopulation::Required, MaxPopulation::One, 0)).unwrap();
        class.add_member(Member::new("body", "binary", MinPopulation::Optional, MaxPopulation::One, 1)).unwrap();
        class.freeze().unwrap();
        adp.register_class(class).unwrap();
        let class = adp.class_by_name("Document").unwrap();
        for member in class.members().to_vec() {
            adp.register_member("Document", member).unwrap();
        }
        let class = adp.class_by_name("Document").unwrap();

        let strings = Arc::new(StringTable::new());
        let dir = tempdir().unwrap();
        let repo = RamObjectRepository::open(dir.path().join("document.delta"), class.clone(), adp.clone(), strings, &[], None).unwrap();
        repo.bind_blob_member("body", "document-bodies", crate::repo::BlobMemberKind::Binary).unwrap();

        let mut doc = ObjectContainer::init(adp, class, None).unwrap();
        doc.set_value_text("title", "Notes").unwrap();
        let id = repo.insert(&doc).unwrap();

        repo.store_blob_member(id, "body", b"first draft").unwrap();
        let mut out = Vec::new();
        repo.fetch_bin(id, "body", &mut out).unwrap();
        assert_eq!(out, vec![b"first draft".to_vec()]);

        repo.store_blob_member(id, "body", b"second draft").unwrap();
        let mut out = Vec::new();
        repo.fetch_bin(id, "body", &mut out).unwrap();
        assert_eq!(out, vec![b"second draft".to_vec(), b"first draft".to_vec()]);
    }

    #[test]
    fn identify_looks_up_by_unique_member() {
        let adp = Arc::new(AdpRegistry::new("test"));
        adp.init_standard();
        let class = person_class(&adp);
        let strings = Arc::new(StringTable::new());
        let dir = tempdir().unwrap();
        let repo = RamObjectRepository::open(dir.path().join("person.delta"), class.clone(), adp.clone(), strings, &[("name", IndexKind::Unique)], None).unwrap();
        let mut o = ObjectContainer::init(adp, class, None).unwrap();
        o.set_value_text("name", "Ada").unwrap();
        repo.insert(&o).unwrap();

        let mut probe = Atom::new(BaseType::Str);
        probe.set_value_text("Ada").unwrap();
        assert_eq!(repo.identify("name", &probe).unwrap(), Some(1));
    }
}
