//! Catalog domain model: attribute definitions, units and groups.
//!
//! # Responsibility
//! - Define the data shapes the collection engine keeps consistent.
//! - Keep cross-object references as handles (`UnitId`, `GroupId`,
//!   attribute names) rather than pointers.
//!
//! # Invariants
//! - Attributes are identified by `name`; units by `UnitId`; groups by `GroupId`.
//! - Only `Collection` mutates group membership.

pub mod attribute;
pub mod group;
pub mod unit;
