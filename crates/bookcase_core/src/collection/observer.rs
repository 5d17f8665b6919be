//! Change notifications for view layers.

use crate::model::attribute::AttributeDef;
use crate::model::group::UnitGroup;
use crate::model::unit::Unit;

/// Receives synchronous change notifications from a `Collection`.
///
/// Every method defaults to a no-op. Calls happen after the corresponding
/// index mutation has completed, except `attribute_deleted` and
/// `group_deleted`, which run while the object is still readable and
/// right before it is dropped. Implementations should tolerate repeated or
/// no-op notifications.
pub trait CollectionObserver {
    fn attribute_added(&self, _attribute: &AttributeDef) {}

    fn attribute_modified(&self, _old: &AttributeDef, _new: &AttributeDef) {}

    fn attribute_deleted(&self, _attribute: &AttributeDef) {}

    fn attributes_reordered(&self) {}

    fn group_modified(&self, _group: &UnitGroup) {}

    fn group_deleted(&self, _group: &UnitGroup) {}

    fn unit_added(&self, _unit: &Unit) {}

    fn unit_modified(&self, _unit: &Unit) {}

    fn unit_deleted(&self, _unit: &Unit) {}
}
