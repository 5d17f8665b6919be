use bookcase_core::{
    AttributeDef, AttributeFlags, AttributeKind, Collection, FieldFormatter, FormatConfig,
    FormatMode, UnitId, EMPTY_GROUP,
};

fn library() -> Collection {
    let mut collection = Collection::new("Library");
    collection
        .add_attribute(
            AttributeDef::new("author", "Author", AttributeKind::FreeText)
                .unwrap()
                .with_flags(AttributeFlags::ALLOW_MULTIPLE | AttributeFlags::ALLOW_GROUPED)
                .with_format(FormatMode::PersonName),
        )
        .unwrap();
    collection
}

fn add_book(collection: &mut Collection, title: &str, author: &str) -> UnitId {
    let mut unit = collection.new_unit();
    unit.set(collection, "title", title).unwrap();
    unit.set(collection, "author", author).unwrap();
    collection.add_unit(unit).unwrap()
}

fn group_names(collection: &Collection, index: &str) -> Vec<String> {
    collection
        .group_index(index)
        .unwrap()
        .group_names()
        .map(str::to_string)
        .collect()
}

fn members(collection: &Collection, index: &str, group: &str) -> Vec<UnitId> {
    collection
        .group_by_name(index, group)
        .map(|group| group.units().to_vec())
        .unwrap_or_default()
}

fn assert_no_empty_groups(collection: &Collection) {
    for index in collection.group_index_names() {
        for group in collection.groups_for(index).unwrap() {
            assert!(!group.is_empty(), "empty group {} in {index}", group.name());
        }
    }
}

#[test]
fn shared_author_groups_survive_unit_deletion() {
    let mut collection = library();
    let dune = add_book(&mut collection, "Dune", "Frank Herbert");
    let messiah = add_book(&mut collection, "Dune Messiah", "Frank Herbert; Brian Herbert");

    assert_eq!(
        group_names(&collection, "author"),
        vec!["Herbert, Brian", "Herbert, Frank"]
    );
    assert_eq!(
        members(&collection, "author", "Herbert, Frank"),
        vec![dune, messiah]
    );
    assert_eq!(members(&collection, "author", "Herbert, Brian"), vec![messiah]);

    let removed = collection.delete_unit(dune).unwrap();
    assert_eq!(removed.title(), Some("Dune"));
    assert_eq!(members(&collection, "author", "Herbert, Frank"), vec![messiah]);
    assert_eq!(members(&collection, "author", "Herbert, Brian"), vec![messiah]);
    assert_eq!(collection.unit_count(), 1);
}

#[test]
fn groups_never_survive_empty() {
    let mut collection = library();
    let dune = add_book(&mut collection, "Dune", "Frank Herbert");
    let foundation = add_book(&mut collection, "Foundation", "Isaac Asimov");
    assert_no_empty_groups(&collection);

    collection
        .set_unit_value(dune, "author", "Isaac Asimov")
        .unwrap();
    assert_no_empty_groups(&collection);
    assert_eq!(group_names(&collection, "author"), vec!["Asimov, Isaac"]);
    assert_eq!(
        members(&collection, "author", "Asimov, Isaac"),
        vec![foundation, dune]
    );

    collection.delete_unit(foundation).unwrap();
    collection.delete_unit(dune).unwrap();
    assert_no_empty_groups(&collection);
    assert!(collection.group_index("author").unwrap().is_empty());
}

#[test]
fn missing_values_land_in_the_empty_group() {
    let mut collection = library();
    let mut unit = collection.new_unit();
    unit.set(&collection, "title", "Anonymous Chronicle").unwrap();
    let anonymous = collection.add_unit(unit).unwrap();
    let cleared = add_book(&mut collection, "Beowulf", "");

    assert_eq!(group_names(&collection, "author"), vec![EMPTY_GROUP]);
    assert_eq!(
        members(&collection, "author", EMPTY_GROUP),
        vec![anonymous, cleared]
    );

    collection
        .set_unit_value(cleared, "author", "Seamus Heaney")
        .unwrap();
    assert_eq!(members(&collection, "author", EMPTY_GROUP), vec![anonymous]);
    assert_eq!(members(&collection, "author", "Heaney, Seamus"), vec![cleared]);
}

#[test]
fn every_split_value_has_exactly_one_group() {
    let mut collection = library();
    let unit = add_book(
        &mut collection,
        "Good Omens",
        "Terry Pratchett; Neil Gaiman; Terry Pratchett",
    );

    let containing: Vec<&str> = collection
        .groups_for("author")
        .unwrap()
        .into_iter()
        .filter(|group| group.contains(unit))
        .map(|group| group.name())
        .collect();
    assert_eq!(containing, vec!["Gaiman, Neil", "Pratchett, Terry"]);
    assert_eq!(collection.unit(unit).unwrap().groups().len(), 2);
}

#[test]
fn regrouping_with_an_unchanged_name_keeps_the_group() {
    let mut collection = library();
    let dune = add_book(&mut collection, "Dune", "Frank Herbert");
    let before = collection
        .group_by_name("author", "Herbert, Frank")
        .unwrap()
        .id();

    collection
        .set_unit_value(dune, "title", "Dune (40th Anniversary)")
        .unwrap();

    let after = collection
        .group_by_name("author", "Herbert, Frank")
        .unwrap()
        .id();
    assert_eq!(before, after);
    assert_eq!(collection.unit(dune).unwrap().groups(), &[after]);
}

#[test]
fn boolean_attributes_group_under_their_title() {
    let mut collection = library();
    collection
        .add_attribute(
            AttributeDef::new("read", "Read", AttributeKind::Boolean)
                .unwrap()
                .with_flags(AttributeFlags::ALLOW_GROUPED),
        )
        .unwrap();
    let dune = add_book(&mut collection, "Dune", "Frank Herbert");
    let emma = add_book(&mut collection, "Emma", "Jane Austen");
    collection.set_unit_value(dune, "read", "true").unwrap();

    assert_eq!(group_names(&collection, "read"), vec![EMPTY_GROUP, "Read"]);
    assert_eq!(members(&collection, "read", "Read"), vec![dune]);
    assert_eq!(members(&collection, "read", EMPTY_GROUP), vec![emma]);
}

#[test]
fn retitling_a_boolean_attribute_renames_its_bucket() {
    let mut collection = library();
    collection
        .add_attribute(
            AttributeDef::new("read", "Read", AttributeKind::Boolean)
                .unwrap()
                .with_flags(AttributeFlags::ALLOW_GROUPED),
        )
        .unwrap();
    let dune = add_book(&mut collection, "Dune", "Frank Herbert");
    collection.set_unit_value(dune, "read", "true").unwrap();

    let mut finished = collection.attribute("read").unwrap().clone();
    finished.title = "Finished".to_string();
    collection.modify_attribute(finished).unwrap();

    assert!(collection.group_by_name("read", "Read").is_none());
    assert_eq!(members(&collection, "read", "Finished"), vec![dune]);
}

#[test]
fn non_groupable_attributes_have_no_index() {
    let collection = library();
    assert!(collection.group_index("title").is_none());
    assert!(collection.groups_for("title").is_none());
    assert!(collection.group_by_name("title", "Dune").is_none());
    assert!(collection.group_by_name("publisher", EMPTY_GROUP).is_none());
}

#[test]
fn adding_a_groupable_attribute_indexes_existing_units() {
    let mut collection = library();
    let dune = add_book(&mut collection, "Dune", "Frank Herbert");
    collection
        .add_attribute(
            AttributeDef::new("genre", "Genre", AttributeKind::FreeText)
                .unwrap()
                .with_flags(AttributeFlags::ALLOW_MULTIPLE | AttributeFlags::ALLOW_GROUPED),
        )
        .unwrap();

    assert_eq!(members(&collection, "genre", EMPTY_GROUP), vec![dune]);

    collection
        .set_unit_value(dune, "genre", "science fiction; classic")
        .unwrap();
    assert_eq!(
        group_names(&collection, "genre"),
        vec!["Classic", "Science Fiction"]
    );
}

#[test]
fn formatter_swap_rebuilds_group_names() {
    let mut collection = library();
    let dune = add_book(&mut collection, "Dune", "Frank Herbert");
    assert_eq!(
        collection.formatted_value(dune, "author").as_deref(),
        Some("Herbert, Frank")
    );

    collection.set_formatter(FieldFormatter::new(FormatConfig::verbatim()));

    assert_eq!(group_names(&collection, "author"), vec!["Frank Herbert"]);
    assert_eq!(members(&collection, "author", "Frank Herbert"), vec![dune]);
    assert_eq!(
        collection.formatted_value(dune, "author").as_deref(),
        Some("Frank Herbert")
    );
    assert_no_empty_groups(&collection);
}
