//! Group index maintenance.
//!
//! Every index mutation collects its effects in a `GroupChanges` and ends
//! with `finish_group_changes`, which drops groups left empty and notifies
//! observers. Dropping empties at the end, not per removal, keeps a unit in
//! the same group across a regroup that yields the same name.

use super::Collection;
use crate::model::attribute::AttributeKind;
use crate::model::group::{GroupId, GroupIndex, UnitGroup, EMPTY_GROUP, PEOPLE_GROUP};
use crate::model::unit::{Unit, UnitId};
use log::debug;
use std::collections::BTreeSet;

/// Effects of one index operation, flushed by `finish_group_changes`.
#[derive(Debug, Default)]
pub(crate) struct GroupChanges {
    touched: Vec<GroupId>,
    emptied: Vec<GroupId>,
    removed: Vec<UnitGroup>,
}

impl GroupChanges {
    fn touch(&mut self, id: GroupId) {
        if !self.touched.contains(&id) {
            self.touched.push(id);
        }
    }

    fn merge(&mut self, other: GroupChanges) {
        for id in other.touched {
            self.touch(id);
        }
        self.emptied.extend(other.emptied);
        self.removed.extend(other.removed);
    }
}

impl Collection {
    /// Index for a groupable attribute or `PEOPLE_GROUP`.
    pub fn group_index(&self, index_name: &str) -> Option<&GroupIndex> {
        self.group_indices.get(index_name)
    }

    /// Names of all group indices, `PEOPLE_GROUP` first when present.
    pub fn group_index_names(&self) -> &[String] {
        &self.group_order
    }

    pub fn group(&self, id: GroupId) -> Option<&UnitGroup> {
        self.groups.get(&id)
    }

    pub fn group_by_name(&self, index_name: &str, group_name: &str) -> Option<&UnitGroup> {
        let id = self.group_indices.get(index_name)?.get(group_name)?;
        self.groups.get(&id)
    }

    /// Groups of one index sorted by name, `None` if `index_name` has no index.
    pub fn groups_for(&self, index_name: &str) -> Option<Vec<&UnitGroup>> {
        let index = self.group_indices.get(index_name)?;
        Some(
            index
                .group_ids()
                .filter_map(|id| self.groups.get(&id))
                .collect(),
        )
    }

    /// Group names `unit` belongs to under `index_name`.
    pub fn group_names_for(&self, unit: &Unit, index_name: &str) -> Vec<String> {
        if index_name == PEOPLE_GROUP {
            return self.people_group_names(unit);
        }
        match self.attribute(index_name) {
            Some(attribute) => unit.group_keys(attribute, &self.formatter),
            None => Vec::new(),
        }
    }

    /// Union of person-attribute keys; `EMPTY_GROUP` only when every person
    /// attribute is empty.
    fn people_group_names(&self, unit: &Unit) -> Vec<String> {
        let mut names = BTreeSet::new();
        let mut all_empty = true;
        for attribute in self
            .people_attributes
            .iter()
            .filter_map(|name| self.attribute(name))
        {
            for key in unit.group_keys(attribute, &self.formatter) {
                if key != EMPTY_GROUP {
                    all_empty = false;
                }
                names.insert(key);
            }
        }
        if !all_empty {
            names.remove(EMPTY_GROUP);
        }
        names.into_iter().collect()
    }

    /// Adds a unit to the groups of one index, creating groups as needed.
    fn populate(&mut self, unit_id: UnitId, index_name: &str, changes: &mut GroupChanges) {
        if !self.group_indices.contains_key(index_name) {
            return;
        }
        let Some(unit) = self.units.get(&unit_id) else {
            return;
        };
        let names = self.group_names_for(unit, index_name);
        let boolean_title = self
            .attribute(index_name)
            .filter(|attribute| attribute.kind == AttributeKind::Boolean)
            .map(|attribute| attribute.title.clone());

        for name in names {
            let name = match &boolean_title {
                Some(title) if name != EMPTY_GROUP => title.clone(),
                _ => name,
            };
            let Some(group_id) = self.group_or_create(index_name, name) else {
                continue;
            };
            let joined = match self.groups.get_mut(&group_id) {
                Some(group) => group.insert(unit_id),
                None => false,
            };
            if let Some(unit) = self.units.get_mut(&unit_id) {
                unit.join_group(group_id);
            }
            if joined {
                changes.touch(group_id);
            }
        }
    }

    pub(super) fn populate_all(&mut self, unit_id: UnitId) -> GroupChanges {
        let mut changes = GroupChanges::default();
        for index_name in self.group_order.clone() {
            self.populate(unit_id, &index_name, &mut changes);
        }
        changes
    }

    fn group_or_create(&mut self, index_name: &str, group_name: String) -> Option<GroupId> {
        let index = self.group_indices.get_mut(index_name)?;
        if let Some(id) = index.get(&group_name) {
            return Some(id);
        }
        let id = GroupId(self.next_group_id);
        self.next_group_id += 1;
        index.insert(group_name.clone(), id);
        debug!(
            "event=group_create module=grouping status=ok index={index_name} group={group_name}"
        );
        self.groups
            .insert(id, UnitGroup::new(id, group_name, index_name.to_string()));
        Some(id)
    }

    /// Takes a unit out of its groups, all of them or one index's only.
    pub(super) fn remove_from_groups(
        &mut self,
        unit_id: UnitId,
        index_name: Option<&str>,
    ) -> GroupChanges {
        let mut changes = GroupChanges::default();
        let Some(unit) = self.units.get(&unit_id) else {
            return changes;
        };
        let member_of: Vec<GroupId> = unit.groups().to_vec();
        for group_id in member_of {
            let Some(group) = self.groups.get_mut(&group_id) else {
                continue;
            };
            if index_name.is_some_and(|name| group.attribute_name() != name) {
                continue;
            }
            group.remove(unit_id);
            if group.is_empty() {
                changes.emptied.push(group_id);
            } else {
                changes.touch(group_id);
            }
            if let Some(unit) = self.units.get_mut(&unit_id) {
                unit.leave_group(group_id);
            }
        }
        changes
    }

    /// Recomputes every group membership of one unit.
    pub(super) fn update_groups(&mut self, unit_id: UnitId) {
        let mut changes = self.remove_from_groups(unit_id, None);
        changes.merge(self.populate_all(unit_id));
        self.finish_group_changes(changes);
    }

    /// Clears an index and repopulates it from every unit.
    pub(super) fn rebuild_index(&mut self, index_name: &str) {
        let mut changes = GroupChanges::default();
        changes.removed = self.clear_index(index_name);
        let unit_ids = self.unit_order.clone();
        for unit_id in unit_ids {
            self.populate(unit_id, index_name, &mut changes);
        }
        debug!("event=index_rebuild module=grouping status=ok index={index_name}");
        self.finish_group_changes(changes);
    }

    /// Creates an empty index and populates it. No-op if it exists.
    pub(super) fn create_index(&mut self, index_name: &str) {
        if self.group_indices.contains_key(index_name) {
            return;
        }
        self.group_indices
            .insert(index_name.to_string(), GroupIndex::new(index_name));
        if index_name == PEOPLE_GROUP {
            self.group_order.insert(0, index_name.to_string());
        } else {
            self.group_order.push(index_name.to_string());
        }
        debug!("event=index_create module=grouping status=ok index={index_name}");
        self.rebuild_index(index_name);
    }

    /// Removes an index and all of its groups.
    pub(super) fn drop_index(&mut self, index_name: &str) {
        if !self.group_indices.contains_key(index_name) {
            return;
        }
        let removed = self.clear_index(index_name);
        self.group_indices.remove(index_name);
        self.group_order.retain(|name| name != index_name);
        debug!(
            "event=index_drop module=grouping status=ok index={index_name} groups={}",
            removed.len()
        );
        self.finish_group_changes(GroupChanges {
            removed,
            ..GroupChanges::default()
        });
    }

    fn clear_index(&mut self, index_name: &str) -> Vec<UnitGroup> {
        let Some(index) = self.group_indices.get_mut(index_name) else {
            return Vec::new();
        };
        let mut removed = Vec::new();
        for group_id in index.clear() {
            let Some(group) = self.groups.remove(&group_id) else {
                continue;
            };
            for unit_id in group.units() {
                if let Some(unit) = self.units.get_mut(unit_id) {
                    unit.leave_group(group_id);
                }
            }
            removed.push(group);
        }
        removed
    }

    /// Drops emptied groups, then notifies observers: deletions first, so a
    /// rebuilt index reports its old groups before the new ones.
    pub(super) fn finish_group_changes(&mut self, changes: GroupChanges) {
        let GroupChanges {
            touched,
            emptied,
            mut removed,
        } = changes;

        for group_id in emptied {
            if !self.groups.get(&group_id).is_some_and(UnitGroup::is_empty) {
                continue;
            }
            let Some(group) = self.groups.remove(&group_id) else {
                continue;
            };
            if let Some(index) = self.group_indices.get_mut(group.attribute_name()) {
                if index.get(group.name()) == Some(group_id) {
                    index.remove(group.name());
                }
            }
            debug!(
                "event=group_delete module=grouping status=ok index={} group={}",
                group.attribute_name(),
                group.name()
            );
            removed.push(group);
        }

        for group in &removed {
            for observer in &self.observers {
                observer.group_deleted(group);
            }
        }
        for group_id in touched {
            if let Some(group) = self.groups.get(&group_id) {
                for observer in &self.observers {
                    observer.group_modified(group);
                }
            }
        }
    }
}
