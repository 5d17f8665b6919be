//! Unit (record) model.
//!
//! # Responsibility
//! - Store raw field values keyed by attribute name.
//! - Cache formatted values until the raw value or the attribute's format changes.
//! - Track which groups the unit currently belongs to.
//!
//! # Invariants
//! - An unset field is absent; a field cleared by the user stores `""`.
//! - The title is the `"title"` field; there is no second copy.
//! - Empty formatted values are never cached.
//! - Group handles are only meaningful inside the owning collection.

use crate::collection::{Collection, CollectionId, CollectionResult};
use crate::format::{split_values, FieldFormatter};
use crate::model::attribute::{AttributeDef, TITLE_ATTRIBUTE};
use crate::model::group::{GroupId, EMPTY_GROUP};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};

/// Identifier of a unit inside its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(pub(crate) u32);

impl UnitId {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl Display for UnitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One record of a collection.
#[derive(Debug, Clone)]
pub struct Unit {
    id: UnitId,
    collection: CollectionId,
    values: BTreeMap<String, String>,
    formatted: RefCell<HashMap<String, String>>,
    groups: Vec<GroupId>,
}

impl Unit {
    pub(crate) fn new(id: UnitId, collection: CollectionId) -> Self {
        Self {
            id,
            collection,
            values: BTreeMap::new(),
            formatted: RefCell::new(HashMap::new()),
            groups: Vec::new(),
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Collection this unit was created for.
    pub fn collection_id(&self) -> CollectionId {
        self.collection
    }

    /// Raw value, `None` if the field was never set.
    pub fn get(&self, attribute_name: &str) -> Option<&str> {
        self.values.get(attribute_name).map(String::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.get(TITLE_ATTRIBUTE)
    }

    /// Raw values ordered by attribute name.
    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Groups the unit currently belongs to, in the order it joined them.
    pub fn groups(&self) -> &[GroupId] {
        &self.groups
    }

    /// Validates, normalizes and stores one value on a unit that is not yet
    /// part of `collection`.
    ///
    /// Units already added to a collection are edited through
    /// `Collection::set_unit_value` so their groups stay current.
    ///
    /// # Errors
    /// - `NoAttributes` when the collection has no attributes.
    /// - `UnknownAttribute` when `attribute_name` is not defined.
    /// - `DisallowedValue` when a Choice value is not allowed.
    pub fn set(
        &mut self,
        collection: &Collection,
        attribute_name: &str,
        value: &str,
    ) -> CollectionResult<()> {
        let normalized = collection.prepare_value(attribute_name, value)?;
        self.store_value(attribute_name, normalized);
        Ok(())
    }

    /// Formatted value for `attribute`, computed on first use and cached.
    pub fn formatted(&self, attribute: &AttributeDef, formatter: &FieldFormatter) -> String {
        if let Some(hit) = self.formatted.borrow().get(attribute.name()) {
            return hit.clone();
        }
        let raw = match self.get(attribute.name()) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return String::new(),
        };
        let value = formatter.format_value(attribute, raw);
        if !value.is_empty() {
            self.formatted
                .borrow_mut()
                .insert(attribute.name().to_string(), value.clone());
        }
        value
    }

    /// Group names this unit belongs to for `attribute`.
    ///
    /// Empty values map to `EMPTY_GROUP`; multi-valued attributes yield one
    /// name per entry.
    pub fn group_keys(&self, attribute: &AttributeDef, formatter: &FieldFormatter) -> Vec<String> {
        let value = self.formatted(attribute, formatter);
        if value.is_empty() {
            return vec![EMPTY_GROUP.to_string()];
        }
        if attribute.allows_multiple() {
            let keys: Vec<String> = split_values(&value)
                .into_iter()
                .map(str::to_string)
                .collect();
            if keys.is_empty() {
                return vec![EMPTY_GROUP.to_string()];
            }
            return keys;
        }
        vec![value]
    }

    pub(crate) fn store_value(&mut self, attribute_name: &str, value: String) {
        self.values.insert(attribute_name.to_string(), value);
        self.invalidate_formatted(attribute_name);
    }

    pub(crate) fn remove_value(&mut self, attribute_name: &str) -> Option<String> {
        self.invalidate_formatted(attribute_name);
        self.values.remove(attribute_name)
    }

    /// Empties the unit, returning its raw values.
    pub(crate) fn take_values(&mut self) -> BTreeMap<String, String> {
        self.invalidate_all_formatted();
        std::mem::take(&mut self.values)
    }

    pub(crate) fn invalidate_formatted(&self, attribute_name: &str) {
        self.formatted.borrow_mut().remove(attribute_name);
    }

    pub(crate) fn invalidate_all_formatted(&self) {
        self.formatted.borrow_mut().clear();
    }

    /// Returns whether a formatted value is currently cached for the field.
    pub fn is_cached(&self, attribute_name: &str) -> bool {
        self.formatted.borrow().contains_key(attribute_name)
    }

    /// Re-homes a copy of this unit into another collection.
    pub(crate) fn adopt(&mut self, id: UnitId, collection: CollectionId) {
        self.id = id;
        self.collection = collection;
        self.groups.clear();
        self.invalidate_all_formatted();
    }

    /// Returns `false` when already a member.
    pub(crate) fn join_group(&mut self, group: GroupId) -> bool {
        if self.groups.contains(&group) {
            return false;
        }
        self.groups.push(group);
        true
    }

    /// Returns `false` when not a member.
    pub(crate) fn leave_group(&mut self, group: GroupId) -> bool {
        match self.groups.iter().position(|member| *member == group) {
            Some(pos) => {
                self.groups.remove(pos);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Unit, UnitId};
    use crate::format::FieldFormatter;
    use crate::model::attribute::{AttributeDef, AttributeFlags, AttributeKind, FormatMode};
    use crate::model::group::{GroupId, EMPTY_GROUP};
    use uuid::Uuid;

    fn authors() -> AttributeDef {
        AttributeDef::new("author", "Author", AttributeKind::FreeText)
            .unwrap()
            .with_flags(AttributeFlags::ALLOW_MULTIPLE | AttributeFlags::ALLOW_GROUPED)
            .with_format(FormatMode::PersonName)
    }

    #[test]
    fn formatted_value_is_cached_until_invalidated() {
        let formatter = FieldFormatter::default();
        let attribute = authors();
        let mut unit = Unit::new(UnitId(0), Uuid::new_v4());
        unit.store_value("author", "Frank Herbert".to_string());

        assert!(!unit.is_cached("author"));
        assert_eq!(unit.formatted(&attribute, &formatter), "Herbert, Frank");
        assert!(unit.is_cached("author"));

        unit.store_value("author", "Brian Herbert".to_string());
        assert!(!unit.is_cached("author"));
        assert_eq!(unit.formatted(&attribute, &formatter), "Herbert, Brian");
    }

    #[test]
    fn empty_values_are_not_cached() {
        let formatter = FieldFormatter::default();
        let attribute = authors();
        let mut unit = Unit::new(UnitId(0), Uuid::new_v4());
        unit.store_value("author", String::new());

        assert_eq!(unit.formatted(&attribute, &formatter), "");
        assert!(!unit.is_cached("author"));
        assert_eq!(unit.get("author"), Some(""));
        assert_eq!(unit.get("title"), None);
    }

    #[test]
    fn group_keys_split_multiple_values() {
        let formatter = FieldFormatter::default();
        let attribute = authors();
        let mut unit = Unit::new(UnitId(0), Uuid::new_v4());
        assert_eq!(unit.group_keys(&attribute, &formatter), vec![EMPTY_GROUP]);

        unit.store_value("author", "Frank Herbert; Brian Herbert".to_string());
        assert_eq!(
            unit.group_keys(&attribute, &formatter),
            vec!["Herbert, Frank", "Herbert, Brian"]
        );
    }

    #[test]
    fn group_membership_is_idempotent() {
        let mut unit = Unit::new(UnitId(0), Uuid::new_v4());
        assert!(unit.join_group(GroupId(4)));
        assert!(!unit.join_group(GroupId(4)));
        assert!(unit.leave_group(GroupId(4)));
        assert!(!unit.leave_group(GroupId(4)));
        assert!(unit.groups().is_empty());
    }
}
