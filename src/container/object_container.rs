//! One record in hand: a sorted ROMID-keyed multi-map plus side arrays
//! for 64-bit values and owned strings.

use crate::core::{Error, Result};
use crate::schema::{AdpRegistry, Class, DataType, Romid};
use crate::types::{Atom, AtomValue, BaseType};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum ValueCode {
    /// Value fits directly in the 32-bit code (bools, small ints, enum refs).
    Inline(AtomValue),
    /// Index into the large-value side array (64-bit primitives, datetimes).
    Large(usize),
    /// Index into the string side array.
    Str(usize),
}

/// A single record of a bound class, possibly with embedded sub-records
/// under their own (composite) class IDs.
#[derive(Clone)]
pub struct ObjectContainer {
    adp: Arc<AdpRegistry>,
    class: Class,
    /// Caller-chosen name, for server-side transient object tables.
    pub key: Option<String>,
    values: BTreeMap<Romid, ValueCode>,
    large: Vec<AtomValue>,
    strings: Vec<String>,
    /// Next local object-id to assign within each embedded class ID, for
    /// multi-valued sub-class members.
    sub_next_id: BTreeMap<u16, u32>,
}

impl ObjectContainer {
    /// Bind a blank container to a frozen, registered class.
    pub fn init(adp: Arc<AdpRegistry>, class: Class, key: Option<String>) -> Result<Self> {
        if !class.is_frozen() {
            return Err(Error::Argument(format!("class {} is not frozen", class.name)));
        }
        if class.class_id.is_none() {
            return Err(Error::Argument(format!("class {} is not registered", class.name)));
        }
        Ok(Self {
            adp,
            class,
            key,
            values: BTreeMap::new(),
            large: Vec::new(),
            strings: Vec::new(),
            sub_next_id: BTreeMap::new(),
        })
    }

    /// The bound class.
    pub fn class(&self) -> &Class {
        &self.class
    }

    /// True iff no value has ever been set.
    pub fn is_null(&self) -> bool {
        self.values.is_empty()
    }

    fn top_class_id(&self) -> u16 {
        self.class.class_id.expect("container is bound to a registered class")
    }

    /// Non-null top-level member values as `(member_id, atom)` pairs, in
    /// class member order. Used by a repository to drive delta-log lines
    /// and index updates on insert.
    pub fn top_level_values(&self) -> Result<Vec<(u16, Atom)>> {
        let mut out = Vec::new();
        for member in self.class.members() {
            let Some(member_id) = member.member_id else { continue };
            let base = self.member_base(&member.type_name)?;
            let atom = self.get_value(Romid::new(self.top_class_id(), 0, member_id), base)?;
            if !atom.is_null() {
                out.push((member_id, atom));
            }
        }
        Ok(out)
    }

    /// Set a top-level member's value directly, by member ID (used during
    /// delta-log replay).
    pub fn set_value_by_member_id(&mut self, member_id: u16, atom: &Atom) -> Result<()> {
        self.store(Romid::new(self.top_class_id(), 0, member_id), atom.value().cloned())
    }

    /// Set a top-level member's value by name, parsing `text` per the
    /// member's base type.
    pub fn set_value_text(&mut self, member_name: &str, text: &str) -> Result<()> {
        let member = self
            .class
            .member_by_name(member_name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("member {member_name} not on class {}", self.class.name)))?;
        let base = self.member_base(&member.type_name)?;
        let mut atom = Atom::new(base);
        atom.set_value_text(text)?;
        self.store(Romid::new(self.top_class_id(), 0, member.member_id.ok_or_else(|| Error::Argument(format!("member {member_name} has no assigned ID")))?), atom.value().cloned())
    }

    /// Set a top-level member's value directly from an atom, coercing
    /// it to the member's base type.
    pub fn set_value(&mut self, member_name: &str, atom: &Atom) -> Result<()> {
        let member = self
            .class
            .member_by_name(member_name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("member {member_name} not on class {}", self.class.name)))?;
        let expected = self.member_base(&member.type_name)?;
        if atom.base() != expected {
            return Err(Error::Type(format!("member {member_name} expects {expected:?}, atom carries {:?}", atom.base())));
        }
        self.store(
            Romid::new(self.top_class_id(), 0, member.member_id.ok_or_else(|| Error::Argument(format!("member {member_name} has no assigned ID")))?),
            atom.value().cloned(),
        )
    }

    fn member_base(&self, type_name: &str) -> Result<BaseType> {
        let dt = self.adp.type_by_name(type_name).ok_or_else(|| Error::NotFound(format!("type {type_name} not registered")))?;
        Ok(dt.base())
    }

    fn store(&mut self, romid: Romid, value: Option<AtomValue>) -> Result<()> {
        let Some(value) = value else {
            self.values.remove(&romid);
            return Ok(());
        };
        let base = value_base(&value);
        let code = if base.is_large() {
            let idx = self.large.len();
            self.large.push(value);
            ValueCode::Large(idx)
        } else if base.is_string_like() {
            let text = match &value {
                AtomValue::Domain(s) | AtomValue::Email(s) | AtomValue::Url(s) | AtomValue::Str(s) | AtomValue::Text(s) | AtomValue::AppString(s) => s.clone(),
                AtomValue::IpAddr(ip) => ip.to_string(),
                _ => unreachable!(),
            };
            let idx = self.strings.len();
            self.strings.push(text);
            ValueCode::Str(idx)
        } else {
            ValueCode::Inline(value)
        };
        self.values.insert(romid, code);
        Ok(())
    }

    /// Decode the value at `romid` back into an atom of the given base type.
    pub fn get_value(&self, romid: Romid, base: BaseType) -> Result<Atom> {
        let mut atom = Atom::new(base);
        if let Some(code) = self.values.get(&romid) {
            let value = match code {
                ValueCode::Inline(v) => v.clone(),
                ValueCode::Large(idx) => self.large[*idx].clone(),
                ValueCode::Str(idx) => string_value_for_base(base, self.strings[*idx].clone()),
            };
            atom.set_value(value)?;
        }
        Ok(atom)
    }

    /// Get a top-level member's value by name.
    pub fn get_value_by_name(&self, member_name: &str) -> Result<Atom> {
        let member = self
            .class
            .member_by_name(member_name)
            .ok_or_else(|| Error::NotFound(format!("member {member_name} not on class {}", self.class.name)))?;
        let base = self.member_base(&member.type_name)?;
        let member_id = member.member_id.ok_or_else(|| Error::Argument(format!("member {member_name} has no assigned ID")))?;
        self.get_value(Romid::new(self.top_class_id(), 0, member_id), base)
    }

    /// Begin a new embedded sub-record under `member_name`, returning
    /// the local object-ID assigned to it.
    pub fn add_sub_record(&mut self, member_name: &str) -> Result<(u16, u32)> {
        let member = self
            .class
            .member_by_name(member_name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("member {member_name} not on class {}", self.class.name)))?;
        let dt = self.adp.type_by_name(&member.type_name).ok_or_else(|| Error::NotFound(format!("type {} not registered", member.type_name)))?;
        let DataType::ClassRef { class_name, .. } = dt else {
            return Err(Error::Type(format!("member {member_name} is not a class reference")));
        };
        let sub_class = self.adp.class_by_name(&class_name).ok_or_else(|| Error::NotFound(format!("class {class_name} not registered")))?;
        let sub_class_id = sub_class.class_id.ok_or_else(|| Error::NotFound(format!("class {class_name} not registered")))?;
        let next = self.sub_next_id.entry(sub_class_id).or_insert(1);
        let object_id = *next;
        *next += 1;
        Ok((sub_class_id, object_id))
    }

    /// Set a member's value within an embedded sub-record.
    pub fn set_sub_value_text(&mut self, sub_class_id: u16, sub_object_id: u32, member_id: u16, base: BaseType, text: &str) -> Result<()> {
        let mut atom = Atom::new(base);
        atom.set_value_text(text)?;
        self.store(Romid::new(sub_class_id, sub_object_id, member_id), atom.value().cloned())
    }

    /// Object-IDs of all embedded sub-records of the given class ID, in
    /// ascending order.
    pub fn list_subs(&self, class_id: u16) -> Vec<u32> {
        let start = Romid::range_start(class_id);
        let end = Romid::range_end(class_id);
        let mut ids: Vec<u32> = self.values.range(start..end).map(|(romid, _)| romid.object_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Recursively export this record (and any embedded sub-records) as JSON.
    pub fn export_json(&self) -> Result<serde_json::Value> {
        let mut map = serde_json::Map::new();
        for member in self.class.members() {
            let dt = self.adp.type_by_name(&member.type_name).ok_or_else(|| Error::NotFound(format!("type {} not registered", member.type_name)))?;
            if let DataType::ClassRef { class_name, .. } = &dt {
                let sub_class = self.adp.class_by_name(class_name).ok_or_else(|| Error::NotFound(format!("class {class_name} not registered")))?;
                let sub_class_id = sub_class.class_id.ok_or_else(|| Error::NotFound(format!("class {class_name} not registered")))?;
                let ids = self.list_subs(sub_class_id);
                if ids.is_empty() {
                    continue;
                }
                let objects: Vec<serde_json::Value> = ids.iter().map(|id| self.export_sub_json(&sub_class, sub_class_id, *id)).collect::<Result<_>>()?;
                let value = if matches!(member.max, crate::schema::MaxPopulation::Many) {
                    serde_json::Value::Array(objects)
                } else {
                    objects.into_iter().next().unwrap_or(serde_json::Value::Null)
                };
                map.insert(member.name.clone(), value);
                continue;
            }
            let base = dt.base();
            let member_id = match member.member_id {
                Some(id) => id,
                None => continue,
            };
            let atom = self.get_value(Romid::new(self.top_class_id(), 0, member_id), base)?;
            if !atom.is_null() {
                map.insert(member.name.clone(), atom_to_json(&atom));
            }
        }
        Ok(serde_json::Value::Object(map))
    }

    fn export_sub_json(&self, sub_class: &Class, sub_class_id: u16, object_id: u32) -> Result<serde_json::Value> {
        let mut map = serde_json::Map::new();
        for member in sub_class.members() {
            let Some(member_id) = member.member_id else { continue };
            let dt = self.adp.type_by_name(&member.type_name).ok_or_else(|| Error::NotFound(format!("type {} not registered", member.type_name)))?;
            let atom = self.get_value(Romid::new(sub_class_id, object_id, member_id), dt.base())?;
            if !atom.is_null() {
                map.insert(member.name.clone(), atom_to_json(&atom));
            }
        }
        Ok(serde_json::Value::Object(map))
    }

    /// Import top-level scalar members from a JSON object. Unknown member
    /// names are ignored; type mismatches drop just that member, not the
    /// whole import.
    pub fn import_json(&mut self, json: &serde_json::Value) -> Result<()> {
        let Some(obj) = json.as_object() else {
            return Err(Error::Argument("JSON import requires an object".to_string()));
        };
        for (key, value) in obj {
            let Some(member) = self.class.member_by_name(key).cloned() else {
                continue;
            };
            let Ok(dt) = self.member_data_type(&member.type_name) else {
                continue;
            };
            if matches!(dt, DataType::ClassRef { .. }) {
                continue;
            }
            let base = dt.base();
            if let Some(atom_value) = json_to_atom_value(base, value) {
                let member_id = match member.member_id {
                    Some(id) => id,
                    None => continue,
                };
                let _ = self.store(Romid::new(self.top_class_id(), 0, member_id), Some(atom_value));
            }
        }
        Ok(())
    }

    fn member_data_type(&self, type_name: &str) -> Result<DataType> {
        self.adp.type_by_name(type_name).ok_or_else(|| Error::NotFound(format!("type {type_name} not registered")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Designation, MaxPopulation, Member, MinPopulation};

    fn person_registry() -> Arc<AdpRegistry> {
        let adp = AdpRegistry::new("test");
        adp.init_standard();
        let mut phone = Class::new("Phone", Designation::User);
        phone.add_member(Member::new("number", "string", MinPopulation::Required, MaxPopulation::One, 0)).unwrap();
        phone.freeze().unwrap();
        let phone_id = adp.register_class(phone).unwrap();
        let phone = adp.class_by_id(phone_id).unwrap();
        for member in phone.members().to_vec() {
            adp.register_member("Phone", member).unwrap();
        }

        let mut person = Class::new("Person", Designation::User);
        person.add_member(Member::new("name", "string", MinPopulation::Required, MaxPopulation::One, 0)).unwrap();
        person.add_member(Member::new("age", "u8", MinPopulation::Optional, MaxPopulation::One, 1)).unwrap();
        person.add_member(Member::new("phones", "Phone", MinPopulation::Optional, MaxPopulation::Many, 2)).unwrap();
        person.freeze().unwrap();
        adp.register_class(person).unwrap();
        let person = adp.class_by_name("Person").unwrap();
        for member in person.members().to_vec() {
            adp.register_member("Person", member).unwrap();
        }
        Arc::new(adp)
    }

    #[test]
    fn set_and_get_scalar_members() {
        let adp = person_registry();
        let class = adp.class_by_name("Person").unwrap();
        let mut obj = ObjectContainer::init(adp, class, None).unwrap();
        assert!(obj.is_null());
        obj.set_value_text("name", "Ada").unwrap();
        obj.set_value_text("age", "36").unwrap();
        assert!(!obj.is_null());
        assert_eq!(obj.get_value_by_name("name").unwrap().str(), "Ada");
        assert_eq!(obj.get_value_by_name("age").unwrap().str(), "36");
    }

    #[test]
    fn embedded_sub_records_round_trip_through_json() {
        let adp = person_registry();
        let class = adp.class_by_name("Person").unwrap();
        let mut obj = ObjectContainer::init(adp.clone(), class, None).unwrap();
        obj.set_value_text("name", "Ada").unwrap();

        let (sub_class_id, sub_object_id) = obj.add_sub_record("phones").unwrap();
        let phone = adp.class_by_name("Phone").unwrap();
        let number_member = phone.member_by_name("number").unwrap();
        obj.set_sub_value_text(sub_class_id, sub_object_id, number_member.member_id.unwrap(), BaseType::Str, "555-1234").unwrap();

        assert_eq!(obj.list_subs(sub_class_id), vec![sub_object_id]);

        let json = obj.export_json().unwrap();
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["phones"][0]["number"], "555-1234");
    }

    #[test]
    fn import_json_ignores_unknown_members() {
        let adp = person_registry();
        let class = adp.class_by_name("Person").unwrap();
        let mut obj = ObjectContainer::init(adp, class, None).unwrap();
        let payload = serde_json::json!({"name": "Grace", "nonexistent": 1});
        obj.import_json(&payload).unwrap();
        assert_eq!(obj.get_value_by_name("name").unwrap().str(), "Grace");
    }
}

fn value_base(value: &AtomValue) -> BaseType {
    match value {
        AtomValue::Float(_) => BaseType::Float,
        AtomValue::I8(_) => BaseType::I8,
        AtomValue::I16(_) => BaseType::I16,
        AtomValue::I32(_) => BaseType::I32,
        AtomValue::I64(_) => BaseType::I64,
        AtomValue::U8(_) => BaseType::U8,
        AtomValue::U16(_) => BaseType::U16,
        AtomValue::U32(_) => BaseType::U32,
        AtomValue::U64(_) => BaseType::U64,
        AtomValue::Bool(_) => BaseType::Bool,
        AtomValue::TriBool(_) => BaseType::TriBool,
        AtomValue::DateDay(_) => BaseType::DateDay,
        AtomValue::TimeOfDay(_) => BaseType::TimeOfDay,
        AtomValue::DateTime(_) => BaseType::DateTime,
        AtomValue::TimeEpoch(_) => BaseType::TimeEpoch,
        AtomValue::IpAddr(_) => BaseType::IpAddr,
        AtomValue::Domain(_) => BaseType::Domain,
        AtomValue::Email(_) => BaseType::Email,
        AtomValue::Url(_) => BaseType::Url,
        AtomValue::Str(_) => BaseType::Str,
        AtomValue::Text(_) => BaseType::Text,
        AtomValue::Binary(_) => BaseType::Binary,
        AtomValue::TextDocument(_) => BaseType::TextDocument,
        AtomValue::AppString(_) => BaseType::AppString,
        AtomValue::EnumRef(_) => BaseType::EnumRef,
        AtomValue::ClassRef(_) => BaseType::ClassRef,
    }
}

fn string_value_for_base(base: BaseType, s: String) -> AtomValue {
    match base {
        BaseType::Domain => AtomValue::Domain(s),
        BaseType::Email => AtomValue::Email(s),
        BaseType::Url => AtomValue::Url(s),
        BaseType::Text => AtomValue::Text(s),
        BaseType::AppString => AtomValue::AppString(s),
        BaseType::IpAddr => s.parse().map(AtomValue::IpAddr).unwrap_or(AtomValue::Str(s)),
        _ => AtomValue::Str(s),
    }
}

fn atom_to_json(atom: &Atom) -> serde_json::Value {
    match atom.value() {
        None => serde_json::Value::Null,
        Some(v) => match v {
            AtomValue::Float(x) => serde_json::json!(x),
            AtomValue::I8(x) => serde_json::json!(x),
            AtomValue::I16(x) => serde_json::json!(x),
            AtomValue::I32(x) => serde_json::json!(x),
            AtomValue::I64(x) => serde_json::json!(x),
            AtomValue::U8(x) => serde_json::json!(x),
            AtomValue::U16(x) => serde_json::json!(x),
            AtomValue::U32(x) => serde_json::json!(x),
            AtomValue::U64(x) => serde_json::json!(x),
            AtomValue::Bool(x) => serde_json::json!(x),
            AtomValue::TriBool(x) => serde_json::json!(x),
            _ => serde_json::Value::String(atom.str()),
        },
    }
}

fn json_to_atom_value(base: BaseType, value: &serde_json::Value) -> Option<AtomValue> {
    match (base, value) {
        (BaseType::Float, serde_json::Value::Number(n)) => n.as_f64().map(AtomValue::Float),
        (BaseType::I8, serde_json::Value::Number(n)) => n.as_i64().and_then(|v| i8::try_from(v).ok()).map(AtomValue::I8),
        (BaseType::I16, serde_json::Value::Number(n)) => n.as_i64().and_then(|v| i16::try_from(v).ok()).map(AtomValue::I16),
        (BaseType::I32, serde_json::Value::Number(n)) => n.as_i64().and_then(|v| i32::try_from(v).ok()).map(AtomValue::I32),
        (BaseType::I64, serde_json::Value::Number(n)) => n.as_i64().map(AtomValue::I64),
        (BaseType::U8, serde_json::Value::Number(n)) => n.as_u64().and_then(|v| u8::try_from(v).ok()).map(AtomValue::U8),
        (BaseType::U16, serde_json::Value::Number(n)) => n.as_u64().and_then(|v| u16::try_from(v).ok()).map(AtomValue::U16),
        (BaseType::U32, serde_json::Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()).map(AtomValue::U32),
        (BaseType::U64, serde_json::Value::Number(n)) => n.as_u64().map(AtomValue::U64),
        (BaseType::Bool, serde_json::Value::Bool(b)) => Some(AtomValue::Bool(*b)),
        (BaseType::Str, serde_json::Value::String(s)) => Some(AtomValue::Str(s.clone())),
        (BaseType::Text, serde_json::Value::String(s)) => Some(AtomValue::Text(s.clone())),
        (BaseType::Domain, serde_json::Value::String(s)) => Some(AtomValue::Domain(s.clone())),
        (BaseType::Email, serde_json::Value::String(s)) => Some(AtomValue::Email(s.clone())),
        (BaseType::Url, serde_json::Value::String(s)) => Some(AtomValue::Url(s.clone())),
        (BaseType::AppString, serde_json::Value::String(s)) => Some(AtomValue::AppString(s.clone())),
        _ => None,
    }
}
