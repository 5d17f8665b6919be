//! Unit groups and per-attribute group indices.
//!
//! # Invariants
//! - A group belongs to exactly one index, named by `attribute_name`.
//! - A group with zero members is removed from its index in the same
//!   operation that emptied it.
//! - Member order is insertion order.

use crate::model::unit::UnitId;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Index name of the synthetic cross-attribute people grouping.
pub const PEOPLE_GROUP: &str = "_people";

/// Group name used for units with no value for the grouped attribute.
pub const EMPTY_GROUP: &str = "(Empty)";

/// Handle of a group inside its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub(crate) u32);

impl Display for GroupId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// Named bucket of units sharing one value of one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitGroup {
    id: GroupId,
    name: String,
    attribute_name: String,
    units: Vec<UnitId>,
}

impl UnitGroup {
    pub(crate) fn new(id: GroupId, name: String, attribute_name: String) -> Self {
        Self {
            id,
            name,
            attribute_name,
            units: Vec::new(),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Display name, e.g. "Herbert, Frank" or `EMPTY_GROUP`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute this group belongs to, or `PEOPLE_GROUP`.
    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    /// Members in insertion order.
    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn contains(&self, unit: UnitId) -> bool {
        self.units.contains(&unit)
    }

    pub fn is_empty_group(&self) -> bool {
        self.name == EMPTY_GROUP
    }

    pub fn is_people_group(&self) -> bool {
        self.attribute_name == PEOPLE_GROUP
    }

    /// Returns `false` when the unit was already a member.
    pub(crate) fn insert(&mut self, unit: UnitId) -> bool {
        if self.contains(unit) {
            return false;
        }
        self.units.push(unit);
        true
    }

    /// Returns `false` when the unit was not a member.
    pub(crate) fn remove(&mut self, unit: UnitId) -> bool {
        match self.units.iter().position(|member| *member == unit) {
            Some(pos) => {
                self.units.remove(pos);
                true
            }
            None => false,
        }
    }
}

/// Group-name to group lookup for one groupable attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupIndex {
    attribute_name: String,
    groups: BTreeMap<String, GroupId>,
}

impl GroupIndex {
    pub(crate) fn new(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            groups: BTreeMap::new(),
        }
    }

    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    pub fn get(&self, group_name: &str) -> Option<GroupId> {
        self.groups.get(group_name).copied()
    }

    /// Group names in sorted order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn group_ids(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.groups.values().copied()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub(crate) fn insert(&mut self, group_name: String, id: GroupId) {
        self.groups.insert(group_name, id);
    }

    pub(crate) fn remove(&mut self, group_name: &str) -> Option<GroupId> {
        self.groups.remove(group_name)
    }

    pub(crate) fn clear(&mut self) -> Vec<GroupId> {
        std::mem::take(&mut self.groups).into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{GroupId, GroupIndex, UnitGroup, EMPTY_GROUP};
    use crate::model::unit::UnitId;

    #[test]
    fn membership_edits_are_idempotent() {
        let mut group = UnitGroup::new(GroupId(1), "Herbert, Frank".into(), "author".into());
        assert!(group.insert(UnitId(0)));
        assert!(!group.insert(UnitId(0)));
        assert!(group.insert(UnitId(3)));
        assert_eq!(group.units(), &[UnitId(0), UnitId(3)]);

        assert!(group.remove(UnitId(0)));
        assert!(!group.remove(UnitId(0)));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn index_lists_names_in_sorted_order() {
        let mut index = GroupIndex::new("author");
        index.insert("Herbert, Frank".into(), GroupId(2));
        index.insert(EMPTY_GROUP.into(), GroupId(1));
        index.insert("Asimov, Isaac".into(), GroupId(3));

        let names: Vec<&str> = index.group_names().collect();
        assert_eq!(names, vec![EMPTY_GROUP, "Asimov, Isaac", "Herbert, Frank"]);
        assert_eq!(index.get("Asimov, Isaac"), Some(GroupId(3)));

        let cleared = index.clear();
        assert_eq!(cleared.len(), 3);
        assert!(index.is_empty());
    }
}
