//! Collection engine for the Bookcase catalog.
//!
//! Owns attribute schemas, unit records and the group indices derived from
//! them. Persistence, import/export and views live outside this crate and
//! talk to it through `Collection` and `CollectionObserver`.

pub mod collection;
pub mod config;
pub mod format;
pub mod logging;
pub mod model;
pub mod presets;

pub use collection::{
    Collection, CollectionError, CollectionId, CollectionObserver, CollectionResult,
};
pub use config::FormatConfig;
pub use format::{join_values, split_values, FieldFormatter, VALUE_DELIMITER};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::attribute::{
    AttributeDef, AttributeFlags, AttributeKind, AttributeValidationError, FormatMode,
    TITLE_ATTRIBUTE,
};
pub use model::group::{GroupId, GroupIndex, UnitGroup, EMPTY_GROUP, PEOPLE_GROUP};
pub use model::unit::{Unit, UnitId};
pub use presets::{book_collection, music_collection};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
