//! Application Delta Profile registry: the central schema registry for
//! one application. Types, classes, members and repositories are keyed
//! both by name and by a stable numeric ID, assigned once and never
//! reassigned for the life of the application.

use crate::core::{Error, Result};
use crate::schema::class::{Class, ClassState, Designation};
use crate::schema::data_type::DataType;
use crate::schema::enum_type::EnumType;
use crate::schema::member::Member;
use crate::schema::regex_type::RegexType;
use crate::types::base_type::BaseType;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// System class names pre-mapped to their reserved IDs 1..6, matching
/// the partition `registerClass` enforces for the `System` designation.
const SYSTEM_CLASS_IDS: &[(&str, u16)] = &[
    ("__repos", 1),
    ("__class", 2),
    ("__member", 3),
    ("__enum", 4),
    ("__regex", 5),
    ("__type", 6),
];

struct IdCounters {
    next_user_class: u16,
    next_config_class: u16,
    next_composite_class: u16,
    next_system_member: u16,
    next_user_member: u16,
    next_config_member: u16,
    next_repository: u16,
}

impl Default for IdCounters {
    fn default() -> Self {
        Self {
            next_user_class: *crate::constants::CLASS_ID_USER.start(),
            next_config_class: *crate::constants::CLASS_ID_CONFIG.start(),
            next_composite_class: crate::constants::CLASS_ID_COMPOSITE_START,
            next_system_member: *crate::constants::MEMBER_ID_SYSTEM.start(),
            next_user_member: *crate::constants::MEMBER_ID_USER.start(),
            next_config_member: *crate::constants::MEMBER_ID_CONFIG_START,
            next_repository: 1,
        }
    }
}

/// The schema registry for one application.
pub struct AdpRegistry {
    /// Application name this registry belongs to.
    pub app_name: String,
    types: DashMap<String, DataType>,
    classes: DashMap<String, Class>,
    class_ids: DashMap<u16, String>,
    enums: DashMap<String, EnumType>,
    regexes: DashMap<String, RegexType>,
    repositories: DashMap<String, u16>,
    repository_ids: DashMap<u16, String>,
    /// class name -> names of sub-classes that embed it.
    subclasses: DashMap<String, Vec<String>>,
    counters: Mutex<IdCounters>,
}

impl AdpRegistry {
    /// Construct an empty registry for an application.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            types: DashMap::new(),
            classes: DashMap::new(),
            class_ids: DashMap::new(),
            enums: DashMap::new(),
            regexes: DashMap::new(),
            repositories: DashMap::new(),
            repository_ids: DashMap::new(),
            subclasses: DashMap::new(),
            counters: Mutex::new(IdCounters::default()),
        }
    }

    /// Pre-register every built-in primitive type under a fixed name.
    pub fn init_standard(&self) {
        let builtins: &[(&str, BaseType)] = &[
            ("float", BaseType::Float),
            ("i8", BaseType::I8),
            ("i16", BaseType::I16),
            ("i32", BaseType::I32),
            ("i64", BaseType::I64),
            ("u8", BaseType::U8),
            ("u16", BaseType::U16),
            ("u32", BaseType::U32),
            ("u64", BaseType::U64),
            ("bool", BaseType::Bool),
            ("tribool", BaseType::TriBool),
            ("date", BaseType::DateDay),
            ("time", BaseType::TimeOfDay),
            ("datetime", BaseType::DateTime),
            ("timestamp", BaseType::TimeEpoch),
            ("ip", BaseType::IpAddr),
            ("domain", BaseType::Domain),
            ("email", BaseType::Email),
            ("url", BaseType::Url),
            ("string", BaseType::Str),
            ("text", BaseType::Text),
            ("binary", BaseType::Binary),
            ("document", BaseType::TextDocument),
        ];
        for (name, base) in builtins {
            self.types.insert(
                name.to_string(),
                DataType::Builtin {
                    name: name.to_string(),
                    base: *base,
                },
            );
        }
    }

    fn check_type_name_free(&self, name: &str) -> Result<()> {
        if self.types.contains_key(name) {
            return Err(Error::Duplicate(format!("type name {name} already registered")));
        }
        Ok(())
    }

    /// Register an enum type, and the `EnumRef` data type of the same name.
    pub fn register_enum(&self, e: EnumType) -> Result<()> {
        self.check_type_name_free(&e.name)?;
        if self.enums.contains_key(&e.name) {
            return Err(Error::Duplicate(format!("enum {} already registered", e.name)));
        }
        self.types.insert(
            e.name.clone(),
            DataType::EnumRef {
                name: e.name.clone(),
                enum_name: e.name.clone(),
            },
        );
        self.enums.insert(e.name.clone(), e);
        Ok(())
    }

    /// Look up a registered enum by name.
    pub fn enum_by_name(&self, name: &str) -> Option<EnumType> {
        self.enums.get(name).map(|e| e.clone())
    }

    /// Register a regex-validated string type, and the `AppString` data
    /// type of the same name.
    pub fn register_regex(&self, r: RegexType) -> Result<()> {
        self.check_type_name_free(&r.name)?;
        if self.regexes.contains_key(&r.name) {
            return Err(Error::Duplicate(format!("regex type {} already registered", r.name)));
        }
        self.types.insert(
            r.name.clone(),
            DataType::AppString {
                name: r.name.clone(),
                regex_name: r.name.clone(),
            },
        );
        self.regexes.insert(r.name.clone(), r);
        Ok(())
    }

    /// Look up a registered regex type by name.
    pub fn regex_by_name(&self, name: &str) -> Option<RegexType> {
        self.regexes.get(name).map(|r| r.clone())
    }

    /// Look up any registered data type by name.
    pub fn type_by_name(&self, name: &str) -> Option<DataType> {
        self.types.get(name).map(|t| t.clone())
    }

    fn assign_class_id(&self, designation: Designation, name: &str) -> Result<u16> {
        match designation {
            Designation::System => SYSTEM_CLASS_IDS
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, id)| *id)
                .ok_or_else(|| Error::Argument(format!("{name} is not a recognised system class name"))),
            Designation::User => {
                let mut counters = self.counters.lock();
                let id = counters.next_user_class;
                if id > *crate::constants::CLASS_ID_USER.end() {
                    return Err(Error::Memory("user class ID partition exhausted".to_string()));
                }
                counters.next_user_class += 1;
                Ok(id)
            }
            Designation::Config => {
                let mut counters = self.counters.lock();
                let id = counters.next_config_class;
                if id > *crate::constants::CLASS_ID_CONFIG.end() {
                    return Err(Error::Memory("config class ID partition exhausted".to_string()));
                }
                counters.next_config_class += 1;
                Ok(id)
            }
        }
    }

    /// Register a frozen class, assigning its stable class ID by
    /// designation. Refuses an unfrozen class or a duplicate name.
    pub fn register_class(&self, mut class: Class) -> Result<u16> {
        if !class.is_frozen() {
            return Err(Error::Sequence(format!("class {} must be frozen before registration", class.name)));
        }
        if self.classes.contains_key(&class.name) {
            return Err(Error::Duplicate(format!("class {} already registered", class.name)));
        }
        let id = self.assign_class_id(class.designation, &class.name)?;
        class.class_id = Some(id);
        let name = class.name.clone();
        self.class_ids.insert(id, name.clone());
        self.types.insert(
            name.clone(),
            DataType::ClassRef {
                name: name.clone(),
                class_name: name.clone(),
            },
        );
        self.classes.insert(name, class);
        Ok(id)
    }

    /// Register a sub-class-in-context combination (e.g. an embedded
    /// record under a specific outer member) with its own composite
    /// class ID (1001+), and record the embedding in the sub-class
    /// multimap keyed by the embedded class's own name.
    pub fn register_composite(&self, context: &str, mut class: Class) -> Result<u16> {
        if !class.is_frozen() {
            return Err(Error::Sequence(format!("composite class {context} must be frozen before registration")));
        }
        let composite_name = format!("{context}.{}", class.name);
        if self.classes.contains_key(&composite_name) {
            return Err(Error::Duplicate(format!("composite class {composite_name} already registered")));
        }
        let mut counters = self.counters.lock();
        let id = counters.next_composite_class;
        counters.next_composite_class += 1;
        drop(counters);

        let embedded_name = class.name.clone();
        class.class_id = Some(id);
        class.name = composite_name.clone();
        self.class_ids.insert(id, composite_name.clone());
        self.classes.insert(composite_name.clone(), class);
        self.subclasses.entry(embedded_name).or_default().push(composite_name);
        Ok(id)
    }

    /// Register a member on an already-registered class, assigning a
    /// member ID from the partition matching the host class's
    /// designation.
    pub fn register_member(&self, class_name: &str, member: Member) -> Result<u16> {
        let designation = self
            .classes
            .get(class_name)
            .ok_or_else(|| Error::NotFound(format!("class {class_name} not registered")))?
            .designation;

        let id = {
            let mut counters = self.counters.lock();
            match designation {
                Designation::System => {
                    let id = counters.next_system_member;
                    if id > *crate::constants::MEMBER_ID_SYSTEM.end() {
                        return Err(Error::Memory("system member ID partition exhausted".to_string()));
                    }
                    counters.next_system_member += 1;
                    id
                }
                Designation::User => {
                    let id = counters.next_user_member;
                    if id > *crate::constants::MEMBER_ID_USER.end() {
                        return Err(Error::Memory("user member ID partition exhausted".to_string()));
                    }
                    counters.next_user_member += 1;
                    id
                }
                Designation::Config => {
                    let id = counters.next_config_member;
                    counters.next_config_member += 1;
                    id
                }
            }
        };

        let mut class = self
            .classes
            .get_mut(class_name)
            .ok_or_else(|| Error::NotFound(format!("class {class_name} not registered")))?;
        let slot = class
            .members()
            .iter()
            .position(|m| m.name == member.name)
            .ok_or_else(|| Error::NotFound(format!("member {} not declared on class {class_name}", member.name)))?;
        // SAFETY-free: Class exposes members() read-only; mutate via a fresh vec swap.
        let mut members = class.members().to_vec();
        members[slot].member_id = Some(id);
        *class = rebuild_with_members(&class, members);
        Ok(id)
    }

    /// Register a named object repository, returning its stable ID.
    pub fn register_obj_repos(&self, name: &str) -> Result<u16> {
        self.register_repos(name)
    }

    /// Register a named blob repository, returning its stable ID.
    pub fn register_blob_repos(&self, name: &str) -> Result<u16> {
        self.register_repos(name)
    }

    fn register_repos(&self, name: &str) -> Result<u16> {
        if self.repositories.contains_key(name) {
            return Err(Error::Duplicate(format!("repository {name} already registered")));
        }
        let mut counters = self.counters.lock();
        let id = counters.next_repository;
        counters.next_repository += 1;
        drop(counters);
        self.repositories.insert(name.to_string(), id);
        self.repository_ids.insert(id, name.to_string());
        Ok(id)
    }

    /// Look up a registered class by name.
    pub fn class_by_name(&self, name: &str) -> Option<Class> {
        self.classes.get(name).map(|c| c.clone())
    }

    /// Look up a registered class by its stable class ID.
    pub fn class_by_id(&self, id: u16) -> Option<Class> {
        self.class_ids.get(&id).and_then(|name| self.classes.get(name.value()).map(|c| c.clone()))
    }

    /// Answer whether `candidate` is registered as embedding `parent`
    /// somewhere in the sub-class multimap.
    pub fn is_sub_class(&self, parent: &str, candidate: &str) -> bool {
        self.subclasses.get(parent).map(|v| v.iter().any(|n| n == candidate)).unwrap_or(false)
    }

    /// Export the registry to the ADP profile XML file at `path`,
    /// backing up a differing previous file before overwriting.
    pub fn export(&self, path: &std::path::Path) -> Result<()> {
        let profile = self.to_xml_profile();
        let xml = quick_xml::se::to_string(&profile).map_err(|e| Error::Xml(e.to_string()))?;

        if path.exists() {
            let previous = std::fs::read_to_string(path)?;
            if previous != xml {
                let backup = path.with_extension("adp.bak");
                std::fs::rename(path, backup)?;
            }
        }
        std::fs::write(path, xml)?;
        Ok(())
    }

    /// Import an ADP profile XML file, reconstructing classes and enums
    /// into a fresh registry (classes arrive already frozen).
    pub fn import(app_name: impl Into<String>, path: &std::path::Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)?;
        let profile: AdpProfileXml = quick_xml::de::from_str(&xml).map_err(|e| Error::Xml(e.to_string()))?;
        let registry = Self::new(app_name);
        registry.init_standard();

        for enum_xml in profile.enums {
            let mut e = EnumType::new(enum_xml.name);
            for item in enum_xml.items {
                e.add_item_with_code(item.label, item.code)?;
            }
            registry.register_enum(e)?;
        }

        for class_xml in profile.classes {
            let designation = match class_xml.desig.as_str() {
                "sys" => Designation::System,
                "cfg" => Designation::Config,
                _ => Designation::User,
            };
            let mut class = Class::new(class_xml.name, designation);
            for m in class_xml.members {
                use crate::schema::member::{MaxPopulation, MinPopulation};
                let min = if m.min == 0 { MinPopulation::Optional } else { MinPopulation::Required };
                let max = if m.max <= 1 { MaxPopulation::One } else { MaxPopulation::Many };
                class.add_member(Member::new(m.name, m.datatype, min, max, m.posn))?;
            }
            class.freeze()?;
            registry.register_class(class)?;
        }

        Ok(registry)
    }

    fn to_xml_profile(&self) -> AdpProfileXml {
        let mut classes: Vec<ClassXml> = self
            .classes
            .iter()
            .map(|entry| {
                let class = entry.value();
                let desig = match class.designation {
                    Designation::System => "sys",
                    Designation::User => "usr",
                    Designation::Config => "cfg",
                };
                ClassXml {
                    id: class.class_id.unwrap_or(0),
                    desig: desig.to_string(),
                    name: class.name.clone(),
                    members: class
                        .members()
                        .iter()
                        .map(|m| MemberXml {
                            posn: m.position,
                            uid: m.member_id.unwrap_or(0),
                            min: match m.min {
                                crate::schema::member::MinPopulation::Optional => 0,
                                crate::schema::member::MinPopulation::Required => 1,
                            },
                            max: match m.max {
                                crate::schema::member::MaxPopulation::One => 1,
                                crate::schema::member::MaxPopulation::Many => u32::MAX,
                            },
                            datatype: m.type_name.clone(),
                            name: m.name.clone(),
                        })
                        .collect(),
                }
            })
            .collect();
        classes.sort_by_key(|c| c.id);

        let enums = self
            .enums
            .iter()
            .map(|entry| {
                let e = entry.value();
                EnumXml {
                    name: e.name.clone(),
                    items: e.items().iter().map(|i| EnumItemXml { label: i.label.clone(), code: i.code }).collect(),
                }
            })
            .collect();

        AdpProfileXml {
            app: self.app_name.clone(),
            enums,
            classes,
        }
    }
}

fn rebuild_with_members(class: &Class, members: Vec<Member>) -> Class {
    let mut rebuilt = Class::new(class.name.clone(), class.designation);
    for m in members {
        // Members are re-inserted bypassing the under-construction check
        // since the class may already be frozen; registration mutates
        // member IDs only, never structure.
        rebuilt.force_member(m);
    }
    if class.is_frozen() {
        rebuilt.force_freeze();
    }
    rebuilt.class_id = class.class_id;
    rebuilt
}

impl Class {
    /// Append a member bypassing the under-construction lifecycle check.
    /// Used only by [`AdpRegistry::register_member`] to stamp a member
    /// ID onto an already-frozen class without altering its structure.
    pub(crate) fn force_member(&mut self, member: Member) {
        self.add_member_unchecked(member);
    }

    /// Mark frozen bypassing the lifecycle check.
    pub(crate) fn force_freeze(&mut self) {
        self.freeze_unchecked();
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "AppDeltaProfile")]
struct AdpProfileXml {
    #[serde(rename = "@app")]
    app: String,
    #[serde(rename = "enum", default)]
    enums: Vec<EnumXml>,
    #[serde(rename = "class", default)]
    classes: Vec<ClassXml>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EnumXml {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "item", default)]
    items: Vec<EnumItemXml>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EnumItemXml {
    #[serde(rename = "@label")]
    label: String,
    #[serde(rename = "@code")]
    code: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClassXml {
    #[serde(rename = "@id")]
    id: u16,
    #[serde(rename = "@desig")]
    desig: String,
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "member", default)]
    members: Vec<MemberXml>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MemberXml {
    #[serde(rename = "@posn")]
    posn: u16,
    #[serde(rename = "@uid")]
    uid: u16,
    #[serde(rename = "@min")]
    min: u32,
    #[serde(rename = "@max")]
    max: u32,
    #[serde(rename = "@datatype")]
    datatype: String,
    #[serde(rename = "@name")]
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::member::{MaxPopulation, MinPopulation};

    fn person_class() -> Class {
        let mut class = Class::new("Person", Designation::User);
        class.add_member(Member::new("name", "string", MinPopulation::Required, MaxPopulation::One, 0)).unwrap();
        class.add_member(Member::new("age", "u16", MinPopulation::Optional, MaxPopulation::One, 1)).unwrap();
        class.freeze().unwrap();
        class
    }

    #[test]
    fn registers_class_and_assigns_user_id() {
        let adp = AdpRegistry::new("testapp");
        adp.init_standard();
        let id = adp.register_class(person_class()).unwrap();
        assert!(crate::constants::CLASS_ID_USER.contains(&id));
        assert!(adp.class_by_id(id).is_some());
    }

    #[test]
    fn rejects_duplicate_class_name() {
        let adp = AdpRegistry::new("testapp");
        adp.init_standard();
        adp.register_class(person_class()).unwrap();
        assert!(adp.register_class(person_class()).is_err());
    }

    #[test]
    fn rejects_unfrozen_class() {
        let adp = AdpRegistry::new("testapp");
        adp.init_standard();
        let class = Class::new("Draft", Designation::User);
        assert!(adp.register_class(class).is_err());
    }

    #[test]
    fn assigns_member_ids_in_user_partition() {
        let adp = AdpRegistry::new("testapp");
        adp.init_standard();
        adp.register_class(person_class()).unwrap();
        let member = adp.class_by_name("Person").unwrap().members()[0].clone();
        let id = adp.register_member("Person", member).unwrap();
        assert!(crate::constants::MEMBER_ID_USER.contains(&id));
    }

    #[test]
    fn composite_classes_get_ids_from_1001() {
        let adp = AdpRegistry::new("testapp");
        adp.init_standard();
        let id = adp.register_composite("Order.billTo", person_class()).unwrap();
        assert!(id >= crate::constants::CLASS_ID_COMPOSITE_START);
        assert!(adp.is_sub_class("Person", "Order.billTo.Person"));
    }
}
