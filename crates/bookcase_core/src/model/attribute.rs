//! Attribute (field) definitions.
//!
//! # Responsibility
//! - Describe one field of a collection schema: identity, kind, flags,
//!   formatting mode and allowed values.
//! - Validate definitions before a collection accepts them.
//!
//! # Invariants
//! - `name` is the stable key and never changes after construction.
//! - Only `AttributeKind::Choice` carries allowed values, and it always has some.
//! - The attribute named `"title"` is never a Choice.

use crate::model::group::PEOPLE_GROUP;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Name of the distinguished title attribute.
pub const TITLE_ATTRIBUTE: &str = "title";

/// Category assigned when none is given.
pub const DEFAULT_CATEGORY: &str = "General";

/// Value kind of an attribute, driving the editor widget and a few
/// grouping/formatting special cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Single line of text.
    #[default]
    FreeText,
    /// Multi-line text.
    Paragraph,
    /// One of a fixed, ordered set of values.
    Choice,
    /// Checkbox; any non-empty value means "set".
    Boolean,
    /// Displayed but not editable.
    ReadOnly,
    /// Integer-like value.
    Number,
    /// Link to a local or remote resource.
    Url,
    /// Single-column table.
    Table1,
    /// Two-column table.
    Table2,
}

impl AttributeKind {
    /// Returns whether values are stored as rows and columns.
    pub fn is_table(self) -> bool {
        matches!(self, Self::Table1 | Self::Table2)
    }
}

bitflags! {
    /// Behavior flags for one attribute.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct AttributeFlags: u8 {
        /// Several values separated by `"; "`.
        const ALLOW_MULTIPLE   = 1 << 0;
        /// Units can be grouped by this attribute.
        const ALLOW_GROUPED    = 1 << 1;
        /// Editors offer completion from existing values.
        const ALLOW_COMPLETION = 1 << 2;
        /// Users may not delete this attribute.
        const NO_DELETE        = 1 << 3;
    }
}

/// How raw values of an attribute are turned into display strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatMode {
    /// No formatting and no capitalization.
    None,
    /// Capitalization only.
    #[default]
    Plain,
    /// Leading articles move to the end.
    Title,
    /// "Given Surname" becomes "Surname, Given".
    PersonName,
    /// Reserved; values pass through unchanged.
    Date,
}

/// Validation failures for attribute definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValidationError {
    /// Name is blank after trim.
    EmptyName,
    /// A Choice attribute was declared without allowed values.
    MissingAllowedValues(String),
    /// The plain constructor was asked for a Choice kind.
    ChoiceRequiresAllowedValues(String),
    /// A non-Choice attribute carries allowed values.
    UnexpectedAllowedValues(String),
    /// The title attribute cannot be a Choice.
    TitleCannotBeChoice,
    /// The name is used by a synthetic group index.
    ReservedName(String),
}

impl Display for AttributeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "attribute name must not be blank"),
            Self::MissingAllowedValues(name) => {
                write!(f, "choice attribute `{name}` has no allowed values")
            }
            Self::ChoiceRequiresAllowedValues(name) => write!(
                f,
                "choice attribute `{name}` must be created with its allowed values"
            ),
            Self::UnexpectedAllowedValues(name) => {
                write!(f, "attribute `{name}` is not a choice but has allowed values")
            }
            Self::TitleCannotBeChoice => write!(f, "the title attribute cannot be a choice"),
            Self::ReservedName(name) => write!(f, "attribute name `{name}` is reserved"),
        }
    }
}

impl Error for AttributeValidationError {}

/// Definition of one collection field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDef {
    name: String,
    /// Display label.
    pub title: String,
    /// Editor layout bucket.
    pub category: String,
    /// Longer help text.
    pub description: String,
    /// Value kind.
    pub kind: AttributeKind,
    /// Allowed values for Choice attributes, in display order.
    pub allowed: Vec<String>,
    /// Behavior flags.
    pub flags: AttributeFlags,
    /// Display formatting rule.
    pub format_mode: FormatMode,
    /// Bibliography export key, for collections that carry one.
    pub bibtex_field: Option<String>,
}

impl AttributeDef {
    /// Creates an attribute of any kind but Choice.
    ///
    /// # Errors
    /// - `ChoiceRequiresAllowedValues` when `kind` is `Choice`.
    /// - `EmptyName` when `name` is blank.
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        kind: AttributeKind,
    ) -> Result<Self, AttributeValidationError> {
        let name = normalize_name(name.into())?;
        if kind == AttributeKind::Choice {
            return Err(AttributeValidationError::ChoiceRequiresAllowedValues(name));
        }
        Ok(Self::build(name, title.into(), kind, Vec::new()))
    }

    /// Creates a Choice attribute restricted to `allowed`.
    ///
    /// Duplicate values are dropped, first occurrence wins.
    pub fn choice<I, S>(
        name: impl Into<String>,
        title: impl Into<String>,
        allowed: I,
    ) -> Result<Self, AttributeValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = normalize_name(name.into())?;
        let mut values: Vec<String> = Vec::new();
        for value in allowed {
            let value = value.into().trim().to_string();
            if !value.is_empty() && !values.contains(&value) {
                values.push(value);
            }
        }
        let attribute = Self::build(name, title.into(), AttributeKind::Choice, values);
        attribute.validate()?;
        Ok(attribute)
    }

    /// The title attribute every collection starts with.
    pub fn title_attribute() -> Self {
        Self::build(
            TITLE_ATTRIBUTE.to_string(),
            "Title".to_string(),
            AttributeKind::FreeText,
            Vec::new(),
        )
        .with_flags(AttributeFlags::NO_DELETE)
        .with_format(FormatMode::Title)
    }

    fn build(name: String, title: String, kind: AttributeKind, allowed: Vec<String>) -> Self {
        Self {
            name,
            title,
            category: DEFAULT_CATEGORY.to_string(),
            description: String::new(),
            kind,
            allowed,
            flags: AttributeFlags::empty(),
            format_mode: FormatMode::default(),
            bibtex_field: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_flags(mut self, flags: AttributeFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_format(mut self, format_mode: FormatMode) -> Self {
        self.format_mode = format_mode;
        self
    }

    pub fn with_bibtex_field(mut self, field: impl Into<String>) -> Self {
        self.bibtex_field = Some(field.into());
        self
    }

    /// Stable machine key.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_title(&self) -> bool {
        self.name == TITLE_ATTRIBUTE
    }

    pub fn has_flag(&self, flag: AttributeFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn allows_multiple(&self) -> bool {
        self.has_flag(AttributeFlags::ALLOW_MULTIPLE)
    }

    pub fn is_groupable(&self) -> bool {
        self.has_flag(AttributeFlags::ALLOW_GROUPED)
    }

    /// Returns whether this attribute feeds the people pseudo-group.
    pub fn is_person(&self) -> bool {
        self.format_mode == FormatMode::PersonName
    }

    /// Checks structural invariants.
    ///
    /// Collection write paths call this before touching any index.
    pub fn validate(&self) -> Result<(), AttributeValidationError> {
        if self.name.trim().is_empty() {
            return Err(AttributeValidationError::EmptyName);
        }
        if self.name == PEOPLE_GROUP {
            return Err(AttributeValidationError::ReservedName(self.name.clone()));
        }
        match self.kind {
            AttributeKind::Choice if self.is_title() => {
                Err(AttributeValidationError::TitleCannotBeChoice)
            }
            AttributeKind::Choice if self.allowed.is_empty() => Err(
                AttributeValidationError::MissingAllowedValues(self.name.clone()),
            ),
            AttributeKind::Choice => Ok(()),
            _ if !self.allowed.is_empty() => Err(
                AttributeValidationError::UnexpectedAllowedValues(self.name.clone()),
            ),
            _ => Ok(()),
        }
    }
}

fn normalize_name(name: String) -> Result<String, AttributeValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AttributeValidationError::EmptyName);
    }
    if trimmed == PEOPLE_GROUP {
        return Err(AttributeValidationError::ReservedName(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}
