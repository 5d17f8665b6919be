//! Built-in collection templates.
//!
//! Each preset starts from `Collection::new` (title attribute included),
//! adds its schema in layout order and picks the default grouped view and
//! the default flat-view columns.

use crate::collection::{Collection, CollectionResult};
use crate::model::attribute::{
    AttributeDef, AttributeFlags, AttributeKind, AttributeValidationError, FormatMode,
};

const GENERAL: &str = "General";
const PUBLISHING: &str = "Publishing";
const CLASSIFICATION: &str = "Classification";
const PERSONAL: &str = "Personal";

const RATINGS: [&str; 5] = ["5 - Best", "4 - Good", "3 - Neutral", "2 - Bad", "1 - Worst"];

const COMPLETE_MULTI_GROUPED: AttributeFlags = AttributeFlags::ALLOW_COMPLETION
    .union(AttributeFlags::ALLOW_MULTIPLE)
    .union(AttributeFlags::ALLOW_GROUPED);
const COMPLETE_GROUPED: AttributeFlags =
    AttributeFlags::ALLOW_COMPLETION.union(AttributeFlags::ALLOW_GROUPED);

fn field(
    name: &str,
    title: &str,
    kind: AttributeKind,
    category: &str,
) -> Result<AttributeDef, AttributeValidationError> {
    Ok(AttributeDef::new(name, title, kind)?.with_category(category))
}

fn choice(
    name: &str,
    title: &str,
    allowed: &[&str],
    category: &str,
) -> Result<AttributeDef, AttributeValidationError> {
    Ok(AttributeDef::choice(name, title, allowed.iter().copied())?.with_category(category))
}

/// "My Books": grouped by author.
pub fn book_collection() -> CollectionResult<Collection> {
    use AttributeKind::{Boolean, FreeText, Number, Paragraph};

    let mut collection = Collection::new("My Books");
    collection.add_attributes([
        field("subtitle", "Subtitle", FreeText, GENERAL)?.with_format(FormatMode::Title),
        field("author", "Author", FreeText, GENERAL)?
            .with_flags(COMPLETE_MULTI_GROUPED)
            .with_format(FormatMode::PersonName),
        choice(
            "binding",
            "Binding",
            &["Hardback", "Paperback", "Trade Paperback", "E-Book", "Magazine", "Journal"],
            GENERAL,
        )?
        .with_flags(AttributeFlags::ALLOW_GROUPED),
        field("pur_date", "Purchase Date", FreeText, GENERAL)?.with_format(FormatMode::Date),
        field("pur_price", "Purchase Price", FreeText, GENERAL)?,
        field("publisher", "Publisher", FreeText, PUBLISHING)?.with_flags(COMPLETE_GROUPED),
        field("edition", "Edition", FreeText, PUBLISHING)?
            .with_flags(AttributeFlags::ALLOW_COMPLETION),
        field("cr_year", "Copyright Year", Number, PUBLISHING)?
            .with_flags(AttributeFlags::ALLOW_GROUPED | AttributeFlags::ALLOW_MULTIPLE),
        field("pub_year", "Publication Year", Number, PUBLISHING)?
            .with_flags(AttributeFlags::ALLOW_GROUPED),
        field("isbn", "ISBN#", FreeText, PUBLISHING)?
            .with_description("International Standard Book Number")
            .with_bibtex_field("isbn"),
        field("lccn", "LCCN#", FreeText, PUBLISHING)?
            .with_description("Library of Congress Control Number"),
        field("pages", "Pages", Number, PUBLISHING)?,
        field("language", "Language", FreeText, PUBLISHING)?.with_flags(COMPLETE_MULTI_GROUPED),
        field("genre", "Genre", FreeText, CLASSIFICATION)?.with_flags(COMPLETE_MULTI_GROUPED),
        field("keyword", "Keywords", FreeText, CLASSIFICATION)?
            .with_flags(COMPLETE_MULTI_GROUPED),
        field("series", "Series", FreeText, CLASSIFICATION)?.with_flags(COMPLETE_GROUPED),
        field("series_num", "Series Number", Number, CLASSIFICATION)?,
        choice("condition", "Condition", &["New", "Used"], CLASSIFICATION)?,
        field("signed", "Signed", Boolean, PERSONAL)?,
        field("read", "Read", Boolean, PERSONAL)?,
        field("gift", "Gift", Boolean, PERSONAL)?,
        field("loaned", "Loaned", Boolean, PERSONAL)?,
        choice("rating", "Rating", &RATINGS, PERSONAL)?.with_flags(AttributeFlags::ALLOW_GROUPED),
        field("comments", "Comments", Paragraph, PERSONAL)?,
    ])?;
    collection.set_default_group_attribute("author")?;
    collection.set_default_view_attributes(&["title", "author", "genre", "series", "comments"]);
    Ok(collection)
}

/// "My Music": grouped by artist.
pub fn music_collection() -> CollectionResult<Collection> {
    use AttributeKind::{Boolean, FreeText, Number, Paragraph, Table2};

    let mut collection = Collection::new("My Music");
    collection.add_attributes([
        choice("medium", "Medium", &["Compact Disc", "Cassette", "Vinyl"], GENERAL)?
            .with_flags(AttributeFlags::ALLOW_GROUPED),
        field("artist", "Artist", FreeText, GENERAL)?
            .with_flags(COMPLETE_MULTI_GROUPED)
            .with_format(FormatMode::PersonName),
        field("album", "Album", FreeText, GENERAL)?
            .with_flags(COMPLETE_GROUPED)
            .with_format(FormatMode::Title),
        field("label", "Label", FreeText, GENERAL)?.with_flags(COMPLETE_MULTI_GROUPED),
        field("year", "Year", Number, GENERAL)?
            .with_flags(AttributeFlags::ALLOW_MULTIPLE | AttributeFlags::ALLOW_GROUPED),
        field("genre", "Genre", FreeText, GENERAL)?.with_flags(COMPLETE_MULTI_GROUPED),
        field("track", "Tracks", Table2, "Tracks")?.with_format(FormatMode::Title),
        choice("rating", "Rating", &RATINGS, PERSONAL)?.with_flags(AttributeFlags::ALLOW_GROUPED),
        field("pur_date", "Purchase Date", FreeText, PERSONAL)?.with_format(FormatMode::Date),
        field("gift", "Gift", Boolean, PERSONAL)?,
        field("pur_price", "Purchase Price", FreeText, PERSONAL)?,
        field("loaned", "Loaned", Boolean, PERSONAL)?,
        field("comments", "Comments", Paragraph, PERSONAL)?,
    ])?;
    collection.set_default_group_attribute("artist")?;
    collection.set_default_view_attributes(&["title", "artist", "album", "genre"]);
    Ok(collection)
}
