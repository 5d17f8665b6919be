//! Collection engine.
//!
//! # Responsibility
//! - Own attribute definitions, units and groups of one catalog.
//! - Keep name/title lookups, categories and per-attribute group indices
//!   consistent across every mutation.
//! - Notify observers synchronously once a mutation has completed.
//!
//! # Invariants
//! - Exactly one attribute is named `"title"`; it is only removed by a forced
//!   delete (internal replacement).
//! - Every groupable attribute has a `GroupIndex`; the `"_people"` index
//!   exists iff at least two attributes use `FormatMode::PersonName`.
//! - After any public mutation returns, every index reflects the current
//!   formatted values of every unit, and no group is empty.
//! - Failed mutations leave the collection untouched.
//!
//! # See also
//! - `registry` for attribute operations, `grouping` for the index engine.

mod grouping;
mod observer;
mod registry;

pub use observer::CollectionObserver;

use crate::format::{normalize_for, split_values, FieldFormatter};
use crate::model::attribute::{
    AttributeDef, AttributeKind, AttributeValidationError, TITLE_ATTRIBUTE,
};
use crate::model::group::{GroupId, GroupIndex, UnitGroup};
use crate::model::unit::{Unit, UnitId};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Stable identity of a collection.
pub type CollectionId = Uuid;

pub type CollectionResult<T> = Result<T, CollectionError>;

/// Precondition failures of collection operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// The collection has no attributes to store values in.
    NoAttributes,
    /// No attribute with this name exists.
    UnknownAttribute(String),
    /// The attribute is protected and `force` was not given.
    ProtectedAttribute(String),
    /// The attribute definition failed validation.
    InvalidAttribute(AttributeValidationError),
    /// The value is not in a Choice attribute's allowed list.
    DisallowedValue { attribute: String, value: String },
    /// No unit with this id exists in the collection.
    UnknownUnit(UnitId),
    /// The name does not refer to a group index.
    UnknownGroupIndex(String),
    /// A reorder request does not name exactly the current attributes.
    ReorderMismatch,
}

impl Display for CollectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAttributes => write!(f, "collection has no attributes"),
            Self::UnknownAttribute(name) => write!(f, "attribute not found: {name}"),
            Self::ProtectedAttribute(name) => write!(f, "attribute cannot be deleted: {name}"),
            Self::InvalidAttribute(err) => write!(f, "{err}"),
            Self::DisallowedValue { attribute, value } => {
                write!(f, "value `{value}` is not allowed for attribute {attribute}")
            }
            Self::UnknownUnit(id) => write!(f, "unit not found: {id}"),
            Self::UnknownGroupIndex(name) => write!(f, "no group index named {name}"),
            Self::ReorderMismatch => {
                write!(f, "reorder must name every current attribute exactly once")
            }
        }
    }
}

impl Error for CollectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidAttribute(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AttributeValidationError> for CollectionError {
    fn from(value: AttributeValidationError) -> Self {
        Self::InvalidAttribute(value)
    }
}

/// A catalog: schema, records and the group indices derived from them.
pub struct Collection {
    id: CollectionId,
    title: String,
    formatter: FieldFormatter,

    attributes: Vec<AttributeDef>,
    attribute_by_name: HashMap<String, usize>,
    attribute_by_title: HashMap<String, String>,
    categories: Vec<String>,
    people_attributes: Vec<String>,
    default_group_attribute: String,
    default_view_attributes: Vec<String>,

    group_order: Vec<String>,
    group_indices: HashMap<String, GroupIndex>,
    groups: HashMap<GroupId, UnitGroup>,
    next_group_id: u32,

    units: BTreeMap<UnitId, Unit>,
    unit_order: Vec<UnitId>,
    next_unit_id: u32,

    observers: Vec<Arc<dyn CollectionObserver>>,
}

impl Collection {
    /// Creates a collection holding only the title attribute, formatted with
    /// the default configuration.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_formatter(title, FieldFormatter::default())
    }

    pub fn with_formatter(title: impl Into<String>, formatter: FieldFormatter) -> Self {
        let mut collection = Self {
            id: Uuid::new_v4(),
            title: title.into(),
            formatter,
            attributes: Vec::new(),
            attribute_by_name: HashMap::new(),
            attribute_by_title: HashMap::new(),
            categories: Vec::new(),
            people_attributes: Vec::new(),
            default_group_attribute: String::new(),
            default_view_attributes: vec![TITLE_ATTRIBUTE.to_string()],
            group_order: Vec::new(),
            group_indices: HashMap::new(),
            groups: HashMap::new(),
            next_group_id: 0,
            units: BTreeMap::new(),
            unit_order: Vec::new(),
            next_unit_id: 0,
            observers: Vec::new(),
        };
        collection.insert_attribute(AttributeDef::title_attribute());
        info!(
            "event=collection_create module=collection status=ok id={}",
            collection.id
        );
        collection
    }

    pub fn id(&self) -> CollectionId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn formatter(&self) -> &FieldFormatter {
        &self.formatter
    }

    /// Replaces the formatting configuration.
    ///
    /// Every cached formatted value is dropped and every group index is
    /// rebuilt, since group names derive from formatted values.
    pub fn set_formatter(&mut self, formatter: FieldFormatter) {
        if self.formatter == formatter {
            return;
        }
        self.formatter = formatter;
        for unit in self.units.values() {
            unit.invalidate_all_formatted();
        }
        for index_name in self.group_order.clone() {
            self.rebuild_index(&index_name);
        }
        info!(
            "event=formatter_change module=collection status=ok indices={}",
            self.group_order.len()
        );
    }

    /// Registers an observer for change notifications.
    pub fn subscribe(&mut self, observer: Arc<dyn CollectionObserver>) {
        self.observers.push(observer);
    }

    // --- units ---------------------------------------------------------------

    /// Creates an empty unit bound to this collection.
    ///
    /// The unit is not part of the collection until `add_unit` is called;
    /// populate it with `Unit::set` first.
    pub fn new_unit(&mut self) -> Unit {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        Unit::new(id, self.id)
    }

    /// Adds a unit and indexes it into every group index.
    ///
    /// A unit created for another collection, or whose id is already taken,
    /// is given a fresh id. Values of a unit from another collection are
    /// validated against this schema; rejected ones are dropped.
    pub fn add_unit(&mut self, mut unit: Unit) -> CollectionResult<UnitId> {
        let foreign = unit.collection_id() != self.id;
        if foreign || self.units.contains_key(&unit.id()) {
            if foreign {
                debug!(
                    "event=unit_add module=collection status=foster from={} to={}",
                    unit.collection_id(),
                    self.id
                );
                for (name, value) in unit.take_values() {
                    match self.prepare_value(&name, &value) {
                        Ok(normalized) => unit.store_value(&name, normalized),
                        Err(err) => debug!(
                            "event=unit_add module=collection status=skip attribute={name} reason={err}"
                        ),
                    }
                }
            }
            let id = UnitId(self.next_unit_id);
            self.next_unit_id += 1;
            unit.adopt(id, self.id);
        } else if unit.id().0 >= self.next_unit_id {
            self.next_unit_id = unit.id().0 + 1;
        }
        unit.invalidate_all_formatted();

        let id = unit.id();
        self.units.insert(id, unit);
        self.unit_order.push(id);
        let changes = self.populate_all(id);
        self.finish_group_changes(changes);

        if let Some(unit) = self.units.get(&id) {
            for observer in &self.observers {
                observer.unit_added(unit);
            }
        }
        debug!("event=unit_add module=collection status=ok unit={id}");
        Ok(id)
    }

    /// Adds several units, stopping at the first failure.
    pub fn add_units<I>(&mut self, units: I) -> CollectionResult<Vec<UnitId>>
    where
        I: IntoIterator<Item = Unit>,
    {
        units.into_iter().map(|unit| self.add_unit(unit)).collect()
    }

    /// Copies a unit from another collection.
    ///
    /// Values for attributes this collection lacks, or that a Choice here
    /// does not allow, are skipped.
    pub fn copy_unit(&mut self, source: &Unit) -> CollectionResult<UnitId> {
        let mut unit = self.new_unit();
        for (name, value) in source.values() {
            match self.prepare_value(name, value) {
                Ok(normalized) => unit.store_value(name, normalized),
                Err(err) => debug!(
                    "event=unit_copy module=collection status=skip attribute={name} reason={err}"
                ),
            }
        }
        self.add_unit(unit)
    }

    /// Sets one value on a unit of this collection and re-indexes it.
    pub fn set_unit_value(
        &mut self,
        id: UnitId,
        attribute_name: &str,
        value: &str,
    ) -> CollectionResult<()> {
        self.modify_unit(id, [(attribute_name, value)])
    }

    /// Applies several edits to one unit, re-indexing once.
    ///
    /// All values are validated before any is stored.
    pub fn modify_unit<I, K, V>(&mut self, id: UnitId, edits: I) -> CollectionResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if !self.units.contains_key(&id) {
            warn!("event=unit_modify module=collection status=rejected reason=unknown_unit unit={id}");
            return Err(CollectionError::UnknownUnit(id));
        }
        let mut prepared = Vec::new();
        for (name, value) in edits {
            let name = name.as_ref();
            let normalized = self.prepare_value(name, value.as_ref())?;
            prepared.push((name.to_string(), normalized));
        }

        if let Some(unit) = self.units.get_mut(&id) {
            for (name, value) in prepared {
                unit.store_value(&name, value);
            }
        }
        self.update_groups(id);

        if let Some(unit) = self.units.get(&id) {
            for observer in &self.observers {
                observer.unit_modified(unit);
            }
        }
        Ok(())
    }

    /// Removes a unit from the collection and from every group.
    ///
    /// Returns the removed unit.
    pub fn delete_unit(&mut self, id: UnitId) -> CollectionResult<Unit> {
        if !self.units.contains_key(&id) {
            warn!("event=unit_delete module=collection status=rejected reason=unknown_unit unit={id}");
            return Err(CollectionError::UnknownUnit(id));
        }
        let changes = self.remove_from_groups(id, None);
        let unit = self
            .units
            .remove(&id)
            .ok_or(CollectionError::UnknownUnit(id))?;
        self.unit_order.retain(|member| *member != id);
        self.finish_group_changes(changes);

        for observer in &self.observers {
            observer.unit_deleted(&unit);
        }
        debug!("event=unit_delete module=collection status=ok unit={id}");
        Ok(unit)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Units in insertion order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.unit_order.iter().filter_map(|id| self.units.get(id))
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Formatted value of one field, `None` if the unit or attribute is unknown.
    pub fn formatted_value(&self, id: UnitId, attribute_name: &str) -> Option<String> {
        let unit = self.units.get(&id)?;
        let attribute = self.attribute(attribute_name)?;
        Some(unit.formatted(attribute, &self.formatter))
    }

    /// Distinct raw values of an attribute across all units, split into
    /// entries for multi-valued attributes, in first-seen order.
    pub fn values_for(&self, attribute_name: &str) -> Vec<String> {
        let Some(attribute) = self.attribute(attribute_name) else {
            return Vec::new();
        };
        let mut values: Vec<String> = Vec::new();
        for unit in self.units() {
            let Some(raw) = unit.get(attribute_name) else {
                continue;
            };
            let entries = if attribute.allows_multiple() {
                split_values(raw)
            } else {
                vec![raw]
            };
            for entry in entries {
                if !entry.is_empty() && !values.iter().any(|value| value == entry) {
                    values.push(entry.to_string());
                }
            }
        }
        values
    }

    /// Returns whether `value` could be stored in `attribute_name`.
    ///
    /// Empty values are always allowed; unknown attributes never are.
    pub fn is_allowed(&self, attribute_name: &str, value: &str) -> bool {
        match self.attribute(attribute_name) {
            Some(attribute) => value_allowed(attribute, &normalize_for(attribute, value)),
            None => false,
        }
    }

    /// Validates and normalizes a value for storage.
    pub(crate) fn prepare_value(&self, attribute_name: &str, value: &str) -> CollectionResult<String> {
        if self.attributes.is_empty() {
            warn!("event=value_set module=collection status=rejected reason=no_attributes");
            return Err(CollectionError::NoAttributes);
        }
        let Some(attribute) = self.attribute(attribute_name) else {
            warn!(
                "event=value_set module=collection status=rejected reason=unknown_attribute attribute={attribute_name}"
            );
            return Err(CollectionError::UnknownAttribute(attribute_name.to_string()));
        };
        let normalized = normalize_for(attribute, value);
        if !value_allowed(attribute, &normalized) {
            warn!(
                "event=value_set module=collection status=rejected reason=disallowed attribute={attribute_name}"
            );
            return Err(CollectionError::DisallowedValue {
                attribute: attribute_name.to_string(),
                value: normalized,
            });
        }
        Ok(normalized)
    }
}

fn value_allowed(attribute: &AttributeDef, value: &str) -> bool {
    if value.is_empty() || attribute.kind != AttributeKind::Choice {
        return true;
    }
    if attribute.allows_multiple() {
        return split_values(value)
            .into_iter()
            .all(|entry| attribute.allowed.iter().any(|allowed| allowed == entry));
    }
    attribute.allowed.iter().any(|allowed| allowed == value)
}
