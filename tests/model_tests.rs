//! Model Edit Tests
//!
//! Edits against a realistic editor document, checking the pointer
//! bookkeeping and that failed edits leave the model untouched.

use std::collections::HashSet;

use pretty_assertions::assert_eq;
use schema_model::graph::DiagnosticCode;
use schema_model::pointer::change_name_in_pointer;
use schema_model::{
    CombinationKind, FieldType, NodePosition, Pointer, SchemaError, SchemaModel, UiSchemaNode,
};
use serde_json::{json, Value};

fn fixture() -> SchemaModel {
    let schema: Value =
        serde_json::from_str(include_str!("fixtures/editor_schema.json")).unwrap();
    SchemaModel::from_wire(&schema).unwrap()
}

fn pointer_set(model: &SchemaModel) -> HashSet<Pointer> {
    model.as_array().into_iter().map(|node| node.pointer).collect()
}

fn children(model: &SchemaModel, pointer: &str) -> Vec<String> {
    model
        .get_node(pointer)
        .unwrap()
        .children()
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn assert_valid(model: &SchemaModel) {
    let diagnostics = model.validate();
    assert!(!diagnostics.has_errors(), "{}", diagnostics.format_all());
}

// =============================================================================
// Fixture
// =============================================================================

#[test]
fn test_fixture_is_valid() {
    let model = fixture();
    assert_eq!(model.node_map().len(), 21);

    let diagnostics = model.validate();
    assert!(!diagnostics.has_errors(), "{}", diagnostics.format_all());
    let unused: Vec<&str> = diagnostics
        .with_code(DiagnosticCode::UnusedDefinition)
        .map(|d| d.pointer.as_str())
        .collect();
    assert_eq!(unused, vec!["#/$defs/Unused"]);
}

#[test]
fn test_queries() {
    let model = fixture();

    let definitions: Vec<&str> = model
        .get_definitions()
        .unwrap()
        .iter()
        .map(|n| n.pointer.as_str())
        .collect();
    assert_eq!(
        definitions,
        vec!["#/$defs/Address", "#/$defs/Phone", "#/$defs/Person", "#/$defs/Unused"]
    );
    assert_eq!(model.get_root_properties().unwrap().len(), 7);

    let through_reference: Vec<&str> = model
        .get_child_nodes("#/properties/address")
        .unwrap()
        .iter()
        .map(|n| n.pointer.as_str())
        .collect();
    assert_eq!(
        through_reference,
        vec!["#/$defs/Address/properties/street", "#/$defs/Address/properties/city"]
    );
    assert_eq!(
        model.get_final_node("#/properties/address").unwrap().pointer.as_str(),
        "#/$defs/Address"
    );
    assert!(model
        .does_node_have_child_with_name("#/properties/address", "city")
        .unwrap());
    assert!(model.is_child_of_combination("#/properties/contact/anyOf/1"));
    assert!(!model.is_child_of_combination("#/$defs/Phone"));
    assert_eq!(
        model.get_node("#/properties/tags").unwrap().restrictions.get("maxLength"),
        Some(&json!(20))
    );
}

// =============================================================================
// Promote and reference
// =============================================================================

#[test]
fn test_reference_to_property_needs_promotion() {
    let schema = json!({
        "type": "object",
        "properties": { "a": { "type": "string" } }
    });
    let mut model = SchemaModel::from_wire(&schema).unwrap();
    let before = model.as_array();

    assert_eq!(
        model.add_reference(Some("b"), "a", NodePosition::default()),
        Err(SchemaError::UnknownDefinition("a".into()))
    );
    assert_eq!(model.as_array(), before);

    model.convert_to_definition("#/properties/a").unwrap();
    let reference = model
        .add_reference(Some("b"), "a", NodePosition::default())
        .unwrap();
    assert_eq!(
        model.get_referred_node(&reference).unwrap(),
        model.get_node("#/$defs/a").unwrap()
    );
    assert_valid(&model);

    assert_eq!(
        model.to_wire().unwrap(),
        json!({
            "type": "object",
            "properties": {
                "a": { "$ref": "#/$defs/a" },
                "b": { "$ref": "#/$defs/a" }
            },
            "$defs": { "a": { "type": "string" } }
        })
    );
}

#[test]
fn test_promote_array_keeps_array_on_reference() {
    let mut model = fixture();
    model.convert_to_definition("#/properties/tags").unwrap();

    let reference = model.get_node("#/properties/tags").unwrap();
    assert!(reference.is_reference());
    assert!(reference.is_array);
    assert_eq!(reference.restrictions.get("minItems"), Some(&json!(1)));

    let definition = model.get_node("#/$defs/tags").unwrap();
    assert!(!definition.is_array);
    assert_eq!(definition.restrictions.get("maxLength"), Some(&json!(20)));
    assert_valid(&model);

    let wire = model.to_wire().unwrap();
    assert_eq!(
        wire["properties"]["tags"],
        json!({
            "type": "array",
            "minItems": 1,
            "uniqueItems": true,
            "items": { "$ref": "#/$defs/tags" }
        })
    );
    assert_eq!(wire["$defs"]["tags"], json!({ "type": "string", "maxLength": 20 }));
}

#[test]
fn test_reference_must_address_a_definition() {
    let mut model = fixture();
    let before = model.as_array();

    for name in ["Address/properties/street", "Address/properties", ""] {
        assert_eq!(
            model.add_reference(Some("r"), name, NodePosition::default()),
            Err(SchemaError::UnknownDefinition(name.into()))
        );
    }
    assert_eq!(model.as_array(), before);
}

#[test]
fn test_referred_node_of_non_reference() {
    let model = fixture();
    let name = model.get_node("#/properties/name").unwrap();
    assert_eq!(
        model.get_referred_node(name),
        Err(SchemaError::NotAReference("#/properties/name".into()))
    );
}

#[test]
fn test_promote_array_with_item_data() {
    let schema = json!({
        "type": "object",
        "properties": {
            "codes": {
                "type": ["array", "null"],
                "items": { "type": ["string", "null"], "title": "Code" }
            }
        }
    });
    let mut model = SchemaModel::from_wire(&schema).unwrap();
    model.convert_to_definition("#/properties/codes").unwrap();
    assert_valid(&model);

    let wire = model.to_wire().unwrap();
    assert_eq!(
        wire["properties"]["codes"],
        json!({
            "type": ["array", "null"],
            "items": { "$ref": "#/$defs/codes", "title": "Code" }
        })
    );
    assert_eq!(wire["$defs"]["codes"], json!({ "type": ["string", "null"] }));
}

#[test]
fn test_promote_picks_unique_name() {
    let mut model = fixture();
    model
        .add_field(Some("Phone"), FieldType::Integer, NodePosition::default())
        .unwrap();
    model.convert_to_definition("#/properties/Phone").unwrap();

    assert!(model.has_definition("Phone0"));
    assert_eq!(
        model
            .get_node("#/properties/Phone")
            .unwrap()
            .reference_target()
            .unwrap()
            .as_str(),
        "#/$defs/Phone0"
    );
    assert_valid(&model);
}

#[test]
fn test_promote_rejections() {
    let mut model = fixture();
    let before = model.as_array();

    assert_eq!(
        model.convert_to_definition("#/properties/address").unwrap_err(),
        SchemaError::AlreadyAReference("#/properties/address".into())
    );
    assert_eq!(
        model.convert_to_definition("#/$defs/Phone").unwrap_err(),
        SchemaError::AlreadyADefinition("#/$defs/Phone".into())
    );
    assert!(matches!(
        model.convert_to_definition("#"),
        Err(SchemaError::RootNotAllowed(_))
    ));
    assert_eq!(model.as_array(), before);
}

// =============================================================================
// Rename
// =============================================================================

#[test]
fn test_rename_definition_rewrites_subtree_and_referrers() {
    let mut model = fixture();
    let before = pointer_set(&model);

    let mut renamed = model.get_node("#/$defs/Address").unwrap().clone();
    renamed.pointer = "#/$defs/Location".into();
    model.update_node("#/$defs/Address", renamed).unwrap();

    let after = pointer_set(&model);
    let removed: HashSet<&str> = before.difference(&after).map(|p| p.as_str()).collect();
    let added: HashSet<&str> = after.difference(&before).map(|p| p.as_str()).collect();
    assert_eq!(
        removed,
        HashSet::from([
            "#/$defs/Address",
            "#/$defs/Address/properties/street",
            "#/$defs/Address/properties/city",
        ])
    );
    assert_eq!(
        added,
        HashSet::from([
            "#/$defs/Location",
            "#/$defs/Location/properties/street",
            "#/$defs/Location/properties/city",
        ])
    );

    let mut referrers: Vec<&str> = model
        .get_referring_nodes("#/$defs/Location")
        .iter()
        .map(|n| n.pointer.as_str())
        .collect();
    referrers.sort();
    assert_eq!(
        referrers,
        vec!["#/$defs/Person/properties/home", "#/properties/address"]
    );
    assert!(model.has_referring_nodes("#/$defs/Phone"));
    assert_valid(&model);
}

#[test]
fn test_rename_property_keeps_position() {
    let mut model = fixture();
    let mut renamed = model.get_node("#/properties/meta").unwrap().clone();
    renamed.pointer = "#/properties/info".into();
    model.update_node("#/properties/meta", renamed).unwrap();

    assert_eq!(model.get_index_of_child_node("#/properties/info").unwrap(), 6);
    assert_eq!(
        children(&model, "#/properties/info"),
        vec!["#/properties/info/properties/created", "#/properties/info/properties/owner"]
    );
    assert_valid(&model);
}

#[test]
fn test_rename_rejections() {
    let mut model = fixture();
    let before = model.as_array();

    let mut clash = model.get_node("#/properties/age").unwrap().clone();
    clash.pointer = "#/properties/name".into();
    assert_eq!(
        model.update_node("#/properties/age", clash).unwrap_err(),
        SchemaError::DuplicatePointer("#/properties/name".into())
    );

    let mut item = model.get_node("#/properties/contact/anyOf/0").unwrap().clone();
    item.pointer = "#/properties/contact/anyOf/email".into();
    assert!(matches!(
        model.update_node("#/properties/contact/anyOf/0", item),
        Err(SchemaError::InvalidUpdate { .. })
    ));

    let mut elsewhere = model.get_node("#/properties/age").unwrap().clone();
    elsewhere.pointer = "#/properties/meta/properties/age".into();
    assert!(matches!(
        model.update_node("#/properties/age", elsewhere),
        Err(SchemaError::InvalidUpdate { .. })
    ));

    let mut dangling = model.get_node("#/properties/address").unwrap().clone();
    dangling.kind = schema_model::NodeKind::Reference {
        reference: "#/$defs/Nowhere".into(),
    };
    assert_eq!(
        model.update_node("#/properties/address", dangling).unwrap_err(),
        SchemaError::UnknownDefinition("Nowhere".into())
    );
    assert_eq!(model.as_array(), before);
}

#[test]
fn test_names_with_separators() {
    let mut model = fixture();

    let field = model
        .add_field(Some("a/b"), FieldType::String, NodePosition::default())
        .unwrap();
    assert_eq!(field.pointer.as_str(), "#/properties/a~1b");
    let definition = model.add_field_type("x~y").unwrap();
    assert_eq!(definition.pointer.as_str(), "#/$defs/x~0y");
    let reference = model
        .add_reference(Some("c"), "x~y", NodePosition::default())
        .unwrap();
    assert_eq!(reference.reference_target().unwrap().as_str(), "#/$defs/x~0y");
    assert!(model.does_node_have_child_with_name("#", "a/b").unwrap());

    let mut renamed = model.get_node("#/properties/age").unwrap().clone();
    renamed.pointer = change_name_in_pointer("#/properties/age", "age/years").into();
    model.update_node("#/properties/age", renamed).unwrap();
    assert!(model.has_node("#/properties/age~1years"));
    assert_valid(&model);

    let wire = model.to_wire().unwrap();
    assert_eq!(wire["properties"]["a/b"], json!({ "type": "string" }));
    assert_eq!(wire["properties"]["c"], json!({ "$ref": "#/$defs/x~0y" }));
    assert!(wire["properties"].get("age/years").is_some());
    assert!(wire["$defs"].get("x~y").is_some());
    assert_eq!(SchemaModel::from_wire(&wire).unwrap().to_wire().unwrap(), wire);
}

#[test]
fn test_invalid_names_are_rejected() {
    let mut model = fixture();
    let before = model.as_array();

    assert_eq!(
        model.add_field(Some(""), FieldType::String, NodePosition::default()),
        Err(SchemaError::InvalidName(String::new()))
    );
    assert_eq!(model.add_field_type(""), Err(SchemaError::InvalidName(String::new())));

    let mut bad_escape = model.get_node("#/properties/age").unwrap().clone();
    bad_escape.pointer = "#/properties/age~2".into();
    assert_eq!(
        model.update_node("#/properties/age", bad_escape).unwrap_err(),
        SchemaError::InvalidName("age~2".into())
    );
    assert_eq!(model.as_array(), before);
}

// =============================================================================
// Move
// =============================================================================

#[test]
fn test_move_between_objects() {
    let mut model = fixture();
    let original = model
        .get_node("#/properties/meta/properties/created")
        .unwrap()
        .clone();

    let moved = model
        .move_node("#/properties/meta/properties/created", NodePosition::new("#", 1))
        .unwrap();

    let mut expected = original;
    expected.pointer = "#/properties/created".into();
    assert_eq!(moved, expected);
    assert_eq!(
        children(&model, "#/properties/meta"),
        vec!["#/properties/meta/properties/owner"]
    );
    assert_eq!(children(&model, "#")[1], "#/properties/created");
    assert_valid(&model);
}

#[test]
fn test_move_into_combination_shifts_items() {
    let mut model = fixture();
    let moved = model
        .move_node("#/properties/role", NodePosition::new("#/properties/contact", 1))
        .unwrap();

    assert_eq!(moved.pointer.as_str(), "#/properties/contact/anyOf/1");
    assert!(moved.is_combination_item);
    assert_eq!(moved.enum_values, Some(vec![json!("admin"), json!("member"), json!("guest")]));
    assert_eq!(
        children(&model, "#/properties/contact"),
        vec![
            "#/properties/contact/anyOf/0",
            "#/properties/contact/anyOf/1",
            "#/properties/contact/anyOf/2",
            "#/properties/contact/anyOf/3",
        ]
    );
    assert!(model.get_node("#/properties/contact/anyOf/2").unwrap().is_reference());
    assert_eq!(
        model.get_node("#/properties/contact/anyOf/3").unwrap().field_type(),
        Some(FieldType::Null)
    );
    assert!(!model.has_node("#/properties/role"));
    assert_valid(&model);
}

#[test]
fn test_move_out_of_combination_renumbers() {
    let mut model = fixture();
    model
        .move_node(
            "#/properties/contact/anyOf/0",
            NodePosition::append("#/properties/meta"),
        )
        .unwrap();

    let moved = model.get_node("#/properties/meta/properties/0").unwrap();
    assert!(!moved.is_combination_item);
    assert_eq!(
        children(&model, "#/properties/contact"),
        vec!["#/properties/contact/anyOf/0", "#/properties/contact/anyOf/1"]
    );
    assert!(model.get_node("#/properties/contact/anyOf/0").unwrap().is_reference());
    assert_valid(&model);
}

#[test]
fn test_move_through_reference_lands_in_definition() {
    let mut model = fixture();
    let moved = model
        .move_node("#/properties/name", NodePosition::append("#/properties/address"))
        .unwrap();
    assert_eq!(moved.pointer.as_str(), "#/$defs/Address/properties/name");
    assert_valid(&model);
}

#[test]
fn test_move_rejections() {
    let mut model = fixture();
    let before = model.as_array();

    assert_eq!(
        model
            .move_node("#/$defs/Person/properties/name", NodePosition::default())
            .unwrap_err(),
        SchemaError::DuplicatePointer("#/properties/name".into())
    );
    assert!(matches!(
        model.move_node("#/properties/meta", NodePosition::append("#/properties/meta")),
        Err(SchemaError::InvalidParent(_))
    ));
    assert!(matches!(
        model.move_node("#/properties/name", NodePosition::append("#/properties/age")),
        Err(SchemaError::InvalidParent(_))
    ));
    assert!(matches!(
        model.move_node("#/properties/address", NodePosition::append("#/$defs/Address")),
        Err(SchemaError::CircularReference { .. })
    ));
    assert_eq!(
        model
            .move_node("#/$defs/Phone", NodePosition::append("#/properties/meta"))
            .unwrap_err(),
        SchemaError::DefinitionInUse("#/$defs/Phone".into())
    );
    assert_eq!(
        model.move_node("#", NodePosition::default()).unwrap_err(),
        SchemaError::RootNotAllowed("move")
    );
    assert_eq!(model.as_array(), before);
}

// =============================================================================
// Cycles
// =============================================================================

#[test]
fn test_cycle_detection() {
    let model = fixture();
    // A definition placed under one of its own referrers.
    assert!(model.will_result_in_circular_references("#/$defs/Address", "#/properties/address"));
    // Unrelated object.
    assert!(!model.will_result_in_circular_references("#/$defs/Phone", "#/properties/meta"));
    // Person reaches Address through `home`, so Address may not hold Person.
    assert!(model.will_result_in_circular_references("#/$defs/Person", "#/$defs/Address"));
}

#[test]
fn test_add_reference_rejects_transitive_cycle() {
    let mut model = fixture();
    let before = model.as_array();
    assert!(matches!(
        model.add_reference(Some("owner"), "Person", NodePosition::append("#/$defs/Address")),
        Err(SchemaError::CircularReference { .. })
    ));
    assert_eq!(model.as_array(), before);

    model
        .add_reference(Some("phone"), "Phone", NodePosition::append("#/$defs/Address"))
        .unwrap();
    assert_valid(&model);
}

// =============================================================================
// Delete
// =============================================================================

#[test]
fn test_delete_container_removes_subtree_only() {
    let mut model = fixture();
    let before = pointer_set(&model);
    model.delete_node("#/properties/meta").unwrap();

    let after = pointer_set(&model);
    let removed: HashSet<&str> = before.difference(&after).map(|p| p.as_str()).collect();
    assert_eq!(
        removed,
        HashSet::from([
            "#/properties/meta",
            "#/properties/meta/properties/created",
            "#/properties/meta/properties/owner",
        ])
    );
    assert!(after.is_subset(&before));
    assert!(!model.get_root_node().unwrap().has_child("#/properties/meta"));

    let diagnostics = model.validate();
    assert!(!diagnostics.has_errors());
    assert_eq!(diagnostics.with_code(DiagnosticCode::UnusedDefinition).count(), 2);
}

#[test]
fn test_delete_rejections() {
    let mut model = fixture();
    let before = model.as_array();

    assert_eq!(model.delete_node("#").unwrap_err(), SchemaError::CannotDeleteRoot);
    assert_eq!(
        model.delete_node("#/$defs/Address").unwrap_err(),
        SchemaError::DefinitionInUse("#/$defs/Address".into())
    );
    assert_eq!(
        model.delete_node("#/$defs/Address/properties/street").unwrap_err(),
        SchemaError::DefinitionInUse("#/$defs/Address/properties/street".into())
    );
    assert_eq!(
        model.delete_node("#/properties/missing").unwrap_err(),
        SchemaError::NodeNotFound("#/properties/missing".into())
    );
    assert_eq!(model.as_array(), before);

    model.delete_node("#/$defs/Unused").unwrap();
    assert!(!model.has_definition("Unused"));
    assert_valid(&model);
}

// =============================================================================
// Retype
// =============================================================================

#[test]
fn test_change_combination_type() {
    let mut model = fixture();
    model
        .change_combination_type("#/properties/contact", CombinationKind::OneOf)
        .unwrap();
    assert_eq!(
        children(&model, "#/properties/contact"),
        vec![
            "#/properties/contact/oneOf/0",
            "#/properties/contact/oneOf/1",
            "#/properties/contact/oneOf/2",
        ]
    );
    assert_valid(&model);
    assert!(model.to_wire().unwrap()["properties"]["contact"]["oneOf"].is_array());

    assert_eq!(
        model
            .change_combination_type("#/properties/name", CombinationKind::AllOf)
            .unwrap_err(),
        SchemaError::NotACombination("#/properties/name".into())
    );
}

#[test]
fn test_toggle_is_array() {
    let mut model = fixture();
    model.toggle_is_array("#/properties/meta").unwrap();
    assert_eq!(
        children(&model, "#/properties/meta"),
        vec![
            "#/properties/meta/items/properties/created",
            "#/properties/meta/items/properties/owner",
        ]
    );
    assert_valid(&model);

    let wire = model.to_wire().unwrap();
    assert_eq!(wire["properties"]["meta"]["type"], json!("array"));
    assert_eq!(wire["properties"]["meta"]["items"]["type"], json!("object"));
    assert_eq!(wire["properties"]["meta"]["description"], json!("Bookkeeping"));
}

// =============================================================================
// Names and addressing
// =============================================================================

#[test]
fn test_generate_unique_child_name() {
    let mut model = fixture();
    let before = model.as_array();

    assert_eq!(model.generate_unique_child_name("#", "x").unwrap(), "x0");
    assert_eq!(model.as_array(), before);

    model
        .add_field(Some("x0"), FieldType::String, NodePosition::default())
        .unwrap();
    assert_eq!(model.generate_unique_child_name("#", "x").unwrap(), "x1");
    assert_eq!(model.generate_unique_definition_name("Address").unwrap(), "Address0");
}

#[test]
fn test_unique_pointer_through_reference() {
    let model = fixture();
    let node = model
        .get_node_by_unique_pointer("uniqueNodePointer#/properties/address/properties/street")
        .unwrap();
    assert_eq!(node.pointer.as_str(), "#/$defs/Address/properties/street");

    let nested = model
        .get_schema_pointer_by_unique_pointer(
            "uniqueNodePointer#/properties/meta/properties/owner/properties/home/properties/city",
        )
        .unwrap();
    assert_eq!(nested.as_str(), "#/$defs/Address/properties/city");

    assert!(matches!(
        model.get_node_by_unique_pointer("uniqueNodePointer#/properties/address/properties/zip"),
        Err(SchemaError::NodeNotFound(_))
    ));
}

#[test]
fn test_deep_clone_is_independent() {
    let model = fixture();
    let mut draft = model.deep_clone();
    draft.delete_node("#/properties/tags").unwrap();
    assert!(model.has_node("#/properties/tags"));
    assert_ne!(draft, model);
}

#[test]
fn test_snapshot_format() {
    let node = UiSchemaNode::field("#/properties/a", FieldType::String);
    let value = serde_json::to_value(&node).unwrap();
    assert_eq!(value["objectKind"], json!("field"));
    assert_eq!(value["fieldType"], json!("string"));
    assert_eq!(value["isArray"], json!(false));

    let back: UiSchemaNode = serde_json::from_value(value).unwrap();
    assert_eq!(back, node);
}
