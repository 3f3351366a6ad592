//! End-to-end scenarios and cross-cutting invariants, exercised against
//! the public API the way an application embedding the crate would.

use hadronstore::blobstore::BlobRepository;
use hadronstore::container::ObjectContainer;
use hadronstore::idset::IdSet;
use hadronstore::isam::IsamFile;
use hadronstore::repo::{IndexKind, RamObjectRepository};
use hadronstore::schema::{AdpRegistry, Class, Designation, MaxPopulation, Member, MinPopulation};
use hadronstore::strings::StringTable;
use std::sync::Arc;
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

fn phone_and_person_class(adp: &AdpRegistry) -> Class {
    let mut phone = Class::new("Phone", Designation::User);
    phone.add_member(Member::new("number", "string", MinPopulation::Required, MaxPopulation::One, 0)).unwrap();
    phone.freeze().unwrap();
    adp.register_class(phone).unwrap();
    let phone = adp.class_by_name("Phone").unwrap();
    for member in phone.members().to_vec() {
        adp.register_member("Phone", member).unwrap();
    }

    let mut person = Class::new("Person", Designation::User);
    person.add_member(Member::new("name", "string", MinPopulation::Required, MaxPopulation::One, 0)).unwrap();
    person.add_member(Member::new("phones", "Phone", MinPopulation::Optional, MaxPopulation::Many, 1)).unwrap();
    person.freeze().unwrap();
    adp.register_class(person).unwrap();
    let person = adp.class_by_name("Person").unwrap();
    for member in person.members().to_vec() {
        adp.register_member("Person", member).unwrap();
    }
    adp.class_by_name("Person").unwrap()
}

#[test]
fn s1_register_insert_fetch_duplicate() {
    let adp = Arc::new(AdpRegistry::new("s1"));
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

    let mut dup = ObjectContainer::init(adp, class, None).unwrap();
    dup.set_value_text("name", "Ada").unwrap();
    dup.set_value_text("age", "11").unwrap();
    assert!(repo.insert(&dup).is_err());
}

#[test]
fn s2_blob_round_trip_and_integrity() {
    let dir = tempdir().unwrap();
    let repo = BlobRepository::open(dir.path().join("docs")).unwrap();
    let bytes = vec![0x5Au8; 100_000];
    let id = repo.insert(&bytes).unwrap();
    assert_eq!(id, 1);

    let fetched = repo.fetch(1).unwrap();
    assert_eq!(fetched.len(), 100_000);
    assert_eq!(fetched, bytes);
    assert_eq!(repo.blob_count(), 1);
    repo.integrity().unwrap();
}

#[test]
fn s3_idset_export_import_round_trip() {
    let mut a = IdSet::new();
    for id in [3, 260, 261, 70_000] {
        a.insert(id);
    }
    assert_eq!(a.count(), 4);
    assert_eq!(a.segment_count(), 3);

    let exported = a.export();
    let b = IdSet::import(&exported).unwrap();
    assert_eq!(a.members(), b.members());
    assert_eq!(b.count(), 4);
    assert_eq!(b.segment_count(), 3);
}

#[test]
fn s4_isam_insert_range_fetch_and_exists() {
    let dir = tempdir().unwrap();
    let file = IsamFile::open(dir.path().join("fruit")).unwrap();
    file.insert(b"apple", b"red").unwrap();
    file.insert(b"banana", b"yellow").unwrap();
    file.insert(b"cherry", b"red").unwrap();

    let found = file.fetch(b"a", b"c").unwrap();
    let keys: Vec<_> = found.iter().map(|(k, _)| k.clone()).collect();
    assert!(keys.contains(&b"apple".to_vec()));
    assert!(keys.contains(&b"banana".to_vec()));
    assert!(!keys.contains(&b"cherry".to_vec()));

    assert!(!file.exists(b"durian").unwrap());
}

#[test]
fn s5_delta_replay_reproduces_population_after_reopen() {
    let adp = Arc::new(AdpRegistry::new("s5"));
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
    for (id, name) in [(1u32, "Ada"), (2, "Grace"), (3, "Linus")] {
        assert_eq!(repo.fetch(id).unwrap().get_value_by_name("name").unwrap().str(), name);
    }
}

#[test]
fn s6_json_import_ignores_unknown_members_and_round_trips() {
    let adp = Arc::new(AdpRegistry::new("s6"));
    adp.init_standard();
    let class = person_class(&adp);

    let mut container = ObjectContainer::init(adp, class, None).unwrap();
    let incoming: serde_json::Value = serde_json::from_str(r#"{"name":"Ada","age":36,"email":"a@b.c"}"#).unwrap();
    container.import_json(&incoming).unwrap();

    let exported = container.export_json().unwrap();
    assert_eq!(exported, serde_json::json!({"name": "Ada", "age": 36}));
}

#[test]
fn invariant_3_insert_then_fetch_round_trips_member_by_member() {
    let adp = Arc::new(AdpRegistry::new("inv3"));
    adp.init_standard();
    let class = person_class(&adp);
    let strings = Arc::new(StringTable::new());
    let dir = tempdir().unwrap();
    let repo = RamObjectRepository::open(dir.path().join("person.delta"), class.clone(), adp.clone(), strings, &[], None).unwrap();

    let mut o = ObjectContainer::init(adp, class, None).unwrap();
    o.set_value_text("name", "Grace").unwrap();
    o.set_value_text("age", "85").unwrap();
    let id = repo.insert(&o).unwrap();
    let back = repo.fetch(id).unwrap();

    assert_eq!(o.get_value_by_name("name").unwrap().str(), back.get_value_by_name("name").unwrap().str());
    assert_eq!(o.get_value_by_name("age").unwrap().str(), back.get_value_by_name("age").unwrap().str());
}

#[test]
fn invariant_4_export_then_import_round_trips_through_json() {
    let adp = Arc::new(AdpRegistry::new("inv4"));
    adp.init_standard();
    let class = person_class(&adp);

    let mut original = ObjectContainer::init(adp.clone(), class.clone(), None).unwrap();
    original.set_value_text("name", "Ada").unwrap();
    original.set_value_text("age", "36").unwrap();
    let exported = original.export_json().unwrap();

    let mut reimported = ObjectContainer::init(adp, class, None).unwrap();
    reimported.import_json(&exported).unwrap();

    assert_eq!(original.get_value_by_name("name").unwrap().str(), reimported.get_value_by_name("name").unwrap().str());
    assert_eq!(original.get_value_by_name("age").unwrap().str(), reimported.get_value_by_name("age").unwrap().str());
}

#[test]
fn invariant_9_delta_log_replay_reproduces_state_across_two_independent_repos() {
    let adp = Arc::new(AdpRegistry::new("inv9"));
    adp.init_standard();
    let class = person_class(&adp);
    let dir = tempdir().unwrap();
    let log_a = dir.path().join("a.delta");
    let log_b = dir.path().join("b.delta");

    let strings_a = Arc::new(StringTable::new());
    {
        let repo_a = RamObjectRepository::open(&log_a, class.clone(), adp.clone(), strings_a, &[("name", IndexKind::Unique)], None).unwrap();
        let mut o1 = ObjectContainer::init(adp.clone(), class.clone(), None).unwrap();
        o1.set_value_text("name", "Ada").unwrap();
        o1.set_value_text("age", "36").unwrap();
        repo_a.insert(&o1).unwrap();

        let mut o2 = ObjectContainer::init(adp.clone(), class.clone(), None).unwrap();
        o2.set_value_text("name", "Grace").unwrap();
        o2.set_value_text("age", "85").unwrap();
        let id2 = repo_a.insert(&o2).unwrap();

        let mut o2_updated = ObjectContainer::init(adp.clone(), class.clone(), None).unwrap();
        o2_updated.set_value_text("name", "Grace").unwrap();
        o2_updated.set_value_text("age", "86").unwrap();
        repo_a.update(id2, &o2_updated).unwrap();
    }

    std::fs::copy(&log_a, &log_b).unwrap();
    let strings_b = Arc::new(StringTable::new());
    let repo_b = RamObjectRepository::open(&log_b, class.clone(), adp.clone(), strings_b, &[("name", IndexKind::Unique)], None).unwrap();

    assert_eq!(repo_b.population(), 2);
    assert_eq!(repo_b.fetch(1).unwrap().get_value_by_name("name").unwrap().str(), "Ada");
    assert_eq!(repo_b.fetch(2).unwrap().get_value_by_name("age").unwrap().str(), "86");
}

#[test]
fn invariant_10_sub_class_isolation_lists_embedded_object_ids_ascending() {
    let adp = Arc::new(AdpRegistry::new("inv10"));
    adp.init_standard();
    let class = phone_and_person_class(&adp);
    let phone_class_id = adp.class_by_name("Phone").unwrap().class_id.unwrap();

    let mut container = ObjectContainer::init(adp, class, None).unwrap();
    container.set_value_text("name", "Ada").unwrap();
    let (_, first) = container.add_sub_record("phones").unwrap();
    container.set_sub_value_text(phone_class_id, first, 0, hadronstore::types::BaseType::Str, "555-0100").unwrap();
    let (_, second) = container.add_sub_record("phones").unwrap();
    container.set_sub_value_text(phone_class_id, second, 0, hadronstore::types::BaseType::Str, "555-0101").unwrap();

    let mut ids = container.list_subs(phone_class_id);
    ids.sort_unstable();
    assert_eq!(ids, vec![first, second]);
}
