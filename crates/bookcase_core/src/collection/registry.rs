//! Attribute registry.
//!
//! # Invariants
//! - `attribute_by_name` maps every attribute name to its slot in `attributes`.
//! - `categories` holds each attribute category once, in attribute order.
//! - `people_attributes` lists PersonName attributes in the order they
//!   became people attributes.

use super::{Collection, CollectionError, CollectionResult};
use crate::model::attribute::{AttributeDef, AttributeFlags, AttributeKind};
use crate::model::group::PEOPLE_GROUP;
use log::{debug, error, info, warn};
use std::collections::HashSet;

impl Collection {
    /// Adds an attribute, replacing any attribute with the same name.
    ///
    /// Groupable attributes get an index populated from every existing unit.
    /// A second PersonName attribute brings the people index into existence.
    pub fn add_attribute(&mut self, attribute: AttributeDef) -> CollectionResult<()> {
        attribute.validate()?;
        if self.attribute_by_name.contains_key(attribute.name()) {
            debug!(
                "event=attribute_add module=registry status=replace attribute={}",
                attribute.name()
            );
            self.delete_attribute(attribute.name(), true)?;
        }
        let name = attribute.name().to_string();
        self.insert_attribute(attribute);

        if let Some(added) = self.attribute(&name) {
            for observer in &self.observers {
                observer.attribute_added(added);
            }
        }
        Ok(())
    }

    /// Adds several attributes in order, stopping at the first invalid one.
    pub fn add_attributes<I>(&mut self, attributes: I) -> CollectionResult<()>
    where
        I: IntoIterator<Item = AttributeDef>,
    {
        for attribute in attributes {
            self.add_attribute(attribute)?;
        }
        Ok(())
    }

    pub(super) fn insert_attribute(&mut self, attribute: AttributeDef) {
        let name = attribute.name().to_string();
        let title = attribute.title.clone();
        let category = attribute.category.clone();
        let is_person = attribute.is_person();
        let is_groupable = attribute.is_groupable();

        self.attribute_by_name
            .insert(name.clone(), self.attributes.len());
        self.attributes.push(attribute);
        self.index_title(&name, title);
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }

        if is_groupable {
            self.create_index(&name);
            if self.default_group_attribute_def().is_none() {
                self.default_group_attribute = name.clone();
            }
        }
        if is_person {
            self.people_attributes.push(name.clone());
            self.refresh_people_index();
        }
        info!(
            "event=attribute_add module=registry status=ok attribute={name} groupable={is_groupable} person={is_person}"
        );
    }

    /// Merges `changed` into the existing attribute of the same name.
    ///
    /// Group indices, the people index, categories and formatted caches are
    /// brought in line with the new definition before observers hear of it.
    pub fn modify_attribute(&mut self, changed: AttributeDef) -> CollectionResult<()> {
        changed.validate()?;
        let Some(&slot) = self.attribute_by_name.get(changed.name()) else {
            warn!(
                "event=attribute_modify module=registry status=rejected reason=unknown_attribute attribute={}",
                changed.name()
            );
            return Err(CollectionError::UnknownAttribute(changed.name().to_string()));
        };
        let old = self.attributes[slot].clone();
        if old == changed {
            return Ok(());
        }
        let name = old.name().to_string();

        let format_changed = old.format_mode != changed.format_mode
            || old.kind != changed.kind
            || old.allows_multiple() != changed.allows_multiple();
        let boolean_retitled =
            changed.kind == AttributeKind::Boolean && old.title != changed.title;
        let regroup = format_changed || boolean_retitled;
        let was_person = old.is_person();
        let is_person = changed.is_person();
        let was_grouped = self.group_indices.contains_key(&name);
        let is_grouped = changed.is_groupable();

        self.attributes[slot] = changed;

        if old.title != self.attributes[slot].title {
            self.unindex_title(&name, &old.title);
            let title = self.attributes[slot].title.clone();
            self.index_title(&name, title);
        }
        if old.category != self.attributes[slot].category {
            self.rebuild_categories();
        }
        if format_changed {
            for unit in self.units.values() {
                unit.invalidate_formatted(&name);
            }
        }

        match (was_grouped, is_grouped) {
            (true, false) => {
                self.drop_index(&name);
                if self.default_group_attribute == name {
                    self.fall_back_default_group();
                }
            }
            (false, true) => {
                self.create_index(&name);
                if self.default_group_attribute_def().is_none() {
                    self.default_group_attribute = name.clone();
                }
            }
            (true, true) if regroup => self.rebuild_index(&name),
            _ => {}
        }

        if was_person != is_person {
            if is_person {
                self.people_attributes.push(name.clone());
            } else {
                self.people_attributes.retain(|person| *person != name);
            }
            self.refresh_people_index();
        } else if is_person && format_changed {
            self.refresh_people_index();
        }

        info!("event=attribute_modify module=registry status=ok attribute={name}");
        let new = &self.attributes[slot];
        for observer in &self.observers {
            observer.attribute_modified(&old, new);
        }
        Ok(())
    }

    /// Deletes an attribute and returns its final definition.
    ///
    /// The title attribute and `NO_DELETE` attributes need `force`. Every
    /// unit loses its value for the attribute. Observers are notified while
    /// the definition is still registered.
    pub fn delete_attribute(&mut self, name: &str, force: bool) -> CollectionResult<AttributeDef> {
        let Some(&slot) = self.attribute_by_name.get(name) else {
            warn!(
                "event=attribute_delete module=registry status=rejected reason=unknown_attribute attribute={name}"
            );
            return Err(CollectionError::UnknownAttribute(name.to_string()));
        };
        let attribute = &self.attributes[slot];
        let protected = attribute.is_title() || attribute.has_flag(AttributeFlags::NO_DELETE);
        if protected && !force {
            warn!(
                "event=attribute_delete module=registry status=rejected reason=protected attribute={name}"
            );
            return Err(CollectionError::ProtectedAttribute(name.to_string()));
        }
        let title = attribute.title.clone();

        let was_person = self.people_attributes.iter().any(|person| person == name);
        if was_person {
            self.people_attributes.retain(|person| person != name);
        }
        self.drop_index(name);
        for unit in self.units.values_mut() {
            unit.remove_value(name);
        }
        if was_person {
            self.refresh_people_index();
        }
        self.unindex_title(name, &title);
        self.default_view_attributes.retain(|view| view != name);
        if self.default_group_attribute == name {
            self.fall_back_default_group();
        }

        for observer in &self.observers {
            observer.attribute_deleted(&self.attributes[slot]);
        }

        let removed = self.attributes.remove(slot);
        self.rebuild_attribute_lookup();
        self.rebuild_categories();
        info!("event=attribute_delete module=registry status=ok attribute={name} forced={force}");
        Ok(removed)
    }

    /// Reorders attributes. `names` must list every current attribute once.
    ///
    /// Indices and categories are left as they are.
    pub fn reorder_attributes<S: AsRef<str>>(&mut self, names: &[S]) -> CollectionResult<()> {
        let mut seen = HashSet::new();
        let complete = names.len() == self.attributes.len()
            && names.iter().all(|name| {
                let name = name.as_ref();
                self.attribute_by_name.contains_key(name) && seen.insert(name)
            });
        if !complete {
            warn!("event=attribute_reorder module=registry status=rejected reason=mismatch");
            return Err(CollectionError::ReorderMismatch);
        }

        let mut previous = std::mem::take(&mut self.attributes)
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();
        for name in names {
            if let Some(&slot) = self.attribute_by_name.get(name.as_ref()) {
                if let Some(attribute) = previous[slot].take() {
                    self.attributes.push(attribute);
                }
            }
        }
        self.rebuild_attribute_lookup();

        debug!("event=attribute_reorder module=registry status=ok");
        for observer in &self.observers {
            observer.attributes_reordered();
        }
        Ok(())
    }

    /// Merges an imported definition into the schema.
    ///
    /// Missing attributes are added. For an existing attribute of the same
    /// kind, new Choice values are appended, an empty description is filled
    /// and flags are unioned. Returns whether the schema changed.
    pub fn merge_attribute(&mut self, incoming: AttributeDef) -> CollectionResult<bool> {
        let Some(existing) = self.attribute(incoming.name()) else {
            self.add_attribute(incoming)?;
            return Ok(true);
        };
        if existing.kind != incoming.kind {
            warn!(
                "event=attribute_merge module=registry status=skipped reason=kind_mismatch attribute={}",
                incoming.name()
            );
            return Ok(false);
        }

        let mut merged = existing.clone();
        for value in incoming.allowed {
            if !merged.allowed.contains(&value) {
                merged.allowed.push(value);
            }
        }
        if merged.description.is_empty() {
            merged.description = incoming.description;
        }
        merged.flags |= incoming.flags;

        if &merged == existing {
            return Ok(false);
        }
        self.modify_attribute(merged)?;
        Ok(true)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attribute_by_name
            .get(name)
            .and_then(|&slot| self.attributes.get(slot))
    }

    pub fn attribute_by_title(&self, title: &str) -> Option<&AttributeDef> {
        self.attribute(self.attribute_by_title.get(title)?)
    }

    /// Attributes in layout order.
    pub fn attributes(&self) -> &[AttributeDef] {
        &self.attributes
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(AttributeDef::name)
    }

    pub fn title_attribute(&self) -> Option<&AttributeDef> {
        self.attributes.iter().find(|attribute| attribute.is_title())
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn attributes_in_category(&self, category: &str) -> Vec<&AttributeDef> {
        self.attributes
            .iter()
            .filter(|attribute| attribute.category == category)
            .collect()
    }

    pub fn people_attributes(&self) -> &[String] {
        &self.people_attributes
    }

    /// Sets the attribute used for the primary grouped view.
    ///
    /// # Errors
    /// - `UnknownGroupIndex` unless `name` is a groupable attribute.
    pub fn set_default_group_attribute(&mut self, name: &str) -> CollectionResult<()> {
        if name == PEOPLE_GROUP || !self.group_indices.contains_key(name) {
            warn!(
                "event=default_group_set module=registry status=rejected reason=not_groupable attribute={name}"
            );
            return Err(CollectionError::UnknownGroupIndex(name.to_string()));
        }
        self.default_group_attribute = name.to_string();
        Ok(())
    }

    /// Raw name of the default group attribute; may not resolve after the
    /// last groupable attribute was deleted.
    pub fn default_group_attribute(&self) -> &str {
        &self.default_group_attribute
    }

    pub fn default_group_attribute_def(&self) -> Option<&AttributeDef> {
        self.attribute(&self.default_group_attribute)
            .filter(|attribute| attribute.is_groupable())
    }

    /// Sets the default flat-view columns. Unknown names are dropped.
    pub fn set_default_view_attributes<S: AsRef<str>>(&mut self, names: &[S]) {
        let mut columns = Vec::new();
        for name in names {
            let name = name.as_ref();
            if self.attribute_by_name.contains_key(name) {
                if !columns.iter().any(|column| column == name) {
                    columns.push(name.to_string());
                }
            } else {
                warn!(
                    "event=default_view_set module=registry status=skipped reason=unknown_attribute attribute={name}"
                );
            }
        }
        self.default_view_attributes = columns;
    }

    pub fn default_view_attributes(&self) -> &[String] {
        &self.default_view_attributes
    }

    fn fall_back_default_group(&mut self) {
        let current = self.default_group_attribute.clone();
        let fallback = self
            .group_order
            .iter()
            .find(|name| name.as_str() != PEOPLE_GROUP && **name != current)
            .cloned();
        match fallback {
            Some(name) => {
                info!(
                    "event=default_group_fallback module=registry status=ok from={current} to={name}"
                );
                self.default_group_attribute = name;
            }
            None => error!(
                "event=default_group_fallback module=registry status=error reason=no_groupable_attribute from={current}"
            ),
        }
    }

    /// Creates, rebuilds or drops the people index to match the people list.
    fn refresh_people_index(&mut self) {
        if self.people_attributes.len() >= 2 {
            if self.group_indices.contains_key(PEOPLE_GROUP) {
                self.rebuild_index(PEOPLE_GROUP);
            } else {
                self.create_index(PEOPLE_GROUP);
            }
        } else {
            self.drop_index(PEOPLE_GROUP);
        }
    }

    fn index_title(&mut self, name: &str, title: String) {
        if let Some(other) = self.attribute_by_title.get(&title) {
            if other != name {
                warn!(
                    "event=attribute_title module=registry status=collision title={title} previous={other} attribute={name}"
                );
            }
        }
        self.attribute_by_title.insert(title, name.to_string());
    }

    fn unindex_title(&mut self, name: &str, title: &str) {
        if self
            .attribute_by_title
            .get(title)
            .is_some_and(|owner| owner == name)
        {
            self.attribute_by_title.remove(title);
            let survivor = self
                .attributes
                .iter()
                .rev()
                .find(|attribute| attribute.title == title && attribute.name() != name)
                .map(|attribute| attribute.name().to_string());
            if let Some(survivor) = survivor {
                self.attribute_by_title.insert(title.to_string(), survivor);
            }
        }
    }

    fn rebuild_attribute_lookup(&mut self) {
        self.attribute_by_name = self
            .attributes
            .iter()
            .enumerate()
            .map(|(slot, attribute)| (attribute.name().to_string(), slot))
            .collect();
    }

    fn rebuild_categories(&mut self) {
        let mut categories: Vec<String> = Vec::new();
        for attribute in &self.attributes {
            if !categories.contains(&attribute.category) {
                categories.push(attribute.category.clone());
            }
        }
        self.categories = categories;
    }
}
