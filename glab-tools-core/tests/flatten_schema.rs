use glab_tools_core::flatten::{flatten, Flattener, PrefixMode, SchemaRow};
use glab_tools_core::mapping::FieldDefinitionNode;
use serde_json::{json, Value};

fn root(properties: Value) -> FieldDefinitionNode {
    FieldDefinitionNode::from_value(&json!({ "properties": properties }))
}

fn rows(table: &glab_tools_core::flatten::SchemaTable) -> Vec<(String, String)> {
    table
        .rows()
        .map(|r| (r.name.clone(), r.field_type.clone()))
        .collect()
}

struct TestCase {
    name: &'static str,
    properties: Value,
    expected: Vec<(&'static str, &'static str)>,
}

#[test]
fn flatten_follows_immediate_parent_naming_table_driven() {
    let test_cases = vec![
        TestCase {
            name: "root leaf uses bare name",
            properties: json!({ "a": { "type": "keyword" } }),
            expected: vec![("a", "keyword")],
        },
        TestCase {
            name: "one container level prefixes its children",
            properties: json!({ "parent": { "properties": { "child": { "type": "integer" } } } }),
            expected: vec![("parent.child", "integer")],
        },
        TestCase {
            name: "deeper ancestors are dropped",
            properties: json!({
                "outer": { "properties": { "inner": { "properties": { "leaf": { "type": "text" } } } } }
            }),
            expected: vec![("inner.leaf", "text")],
        },
        TestCase {
            name: "node without type or properties is skipped",
            properties: json!({ "broken": {} }),
            expected: vec![],
        },
        TestCase {
            name: "empty container contributes nothing",
            properties: json!({ "empty": { "properties": {} }, "b": { "type": "date" } }),
            expected: vec![("b", "date")],
        },
        TestCase {
            name: "extra mapping keys are ignored",
            properties: json!({
                "title": { "type": "text", "fields": { "raw": { "type": "keyword" } }, "analyzer": "simple" }
            }),
            expected: vec![("title", "text")],
        },
        TestCase {
            name: "object type with properties is a leaf",
            properties: json!({
                "author": { "type": "object", "properties": { "name": { "type": "keyword" } } }
            }),
            expected: vec![("author", "object")],
        },
    ];

    for tc in test_cases {
        let table = flatten(&root(tc.properties), PrefixMode::ImmediateParent);
        let expected: Vec<(String, String)> = tc
            .expected
            .iter()
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect();
        assert_eq!(rows(&table), expected, "{}", tc.name);
    }
}

#[test]
fn rows_carry_placeholder_aggregatable_and_description() {
    let table = flatten(
        &root(json!({ "a": { "type": "keyword" } })),
        PrefixMode::default(),
    );
    assert_eq!(table.get("a"), Some(&SchemaRow::new("a", "keyword")));
    let row = table.get("a").unwrap();
    assert!(row.aggregatable);
    assert_eq!(row.description, "'NA'");
}

#[test]
fn colliding_names_keep_the_later_visited_leaf() {
    // "a" is visited before "b"; both resolve to "x.y" once ancestors are dropped.
    let properties = json!({
        "a": { "properties": { "x": { "properties": { "y": { "type": "keyword" } } } } },
        "b": { "properties": { "x": { "properties": { "y": { "type": "long" } } } } }
    });
    let table = flatten(&root(properties), PrefixMode::ImmediateParent);
    assert_eq!(table.len(), 1);
    assert_eq!(table.get("x.y").unwrap().field_type, "long");
}

#[test]
fn traversal_order_does_not_depend_on_document_order() {
    let forward = r#"{"properties":{"a":{"properties":{"k":{"type":"keyword"}}},"b":{"properties":{"k":{"type":"long"}}}}}"#;
    let reverse = r#"{"properties":{"b":{"properties":{"k":{"type":"long"}}},"a":{"properties":{"k":{"type":"keyword"}}}}}"#;
    let forward: FieldDefinitionNode = serde_json::from_str(forward).unwrap();
    let reverse: FieldDefinitionNode = serde_json::from_str(reverse).unwrap();

    assert_eq!(
        flatten(&forward, PrefixMode::ImmediateParent),
        flatten(&reverse, PrefixMode::ImmediateParent)
    );
}

#[test]
fn full_path_mode_keeps_every_ancestor() {
    let properties = json!({
        "outer": { "properties": {
            "inner": { "properties": { "leaf": { "type": "text" } } },
            "id": { "type": "keyword" }
        } },
        "top": { "type": "long" }
    });
    let table = flatten(&root(properties), PrefixMode::FullPath);
    let names: Vec<&str> = table.names().collect();
    assert_eq!(names, vec!["outer.id", "outer.inner.leaf", "top"]);
}

#[test]
fn row_count_matches_reachable_leaves_and_skips_are_counted() {
    let properties = json!({
        "author": { "properties": {
            "name": { "type": "keyword" },
            "email": { "type": "keyword" },
            "alias": { "path": "author.name" }
        } },
        "grimoire_creation_date": { "type": "date" },
        "weird": 42,
        "metadata__updated_on": { "type": "date" }
    });
    let outcome = Flattener::new(PrefixMode::ImmediateParent).flatten(&root(properties));
    assert_eq!(outcome.table.len(), 4);
    assert_eq!(outcome.skipped, 2);
}

#[test]
fn flattening_twice_yields_identical_tables() {
    let document = root(json!({
        "repo": { "properties": { "url": { "type": "keyword" }, "stars": { "type": "long" } } },
        "origin": { "type": "keyword" }
    }));
    let first = flatten(&document, PrefixMode::ImmediateParent);
    let second = flatten(&document, PrefixMode::ImmediateParent);
    assert_eq!(first, second);
}

#[test]
fn names_are_emitted_in_non_decreasing_order() {
    let document = root(json!({
        "Zeta": { "type": "keyword" },
        "alpha": { "type": "keyword" },
        "beta": { "properties": { "Z": { "type": "long" }, "a": { "type": "long" } } },
        "_id": { "type": "keyword" }
    }));
    let table = flatten(&document, PrefixMode::ImmediateParent);
    let names: Vec<&str> = table.names().collect();
    assert!(names.windows(2).all(|w| w[0] <= w[1]), "{names:?}");
    assert_eq!(names, vec!["Zeta", "_id", "alpha", "beta.Z", "beta.a"]);
}

#[test]
fn root_without_properties_yields_no_rows() {
    let table = flatten(&FieldDefinitionNode::leaf("keyword"), PrefixMode::ImmediateParent);
    assert!(table.is_empty());
}
