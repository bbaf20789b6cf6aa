use glab_tools_core::contract::{AdapterError, MockMappingSource, SchemaError};
use glab_tools_core::flatten::PrefixMode;
use glab_tools_core::mapping::FieldDefinitionNode;
use glab_tools_core::schema::{generate_schema, SchemaJob};
use serde_json::json;
use std::fs;
use tempfile::tempdir;

fn gitlab_like_mapping() -> FieldDefinitionNode {
    FieldDefinitionNode::from_value(&json!({
        "properties": {
            "origin": { "type": "keyword" },
            "author": { "properties": {
                "username": { "type": "keyword" },
                "id": { "type": "long" }
            } },
            "data": { "properties": {
                "commit": { "properties": { "sha": { "type": "keyword" } } }
            } },
            "broken": {}
        }
    }))
}

#[tokio::test]
async fn writes_sorted_schema_file_from_mapping() {
    let out = tempdir().unwrap();
    let destination = out.path().join("schema.csv");

    let mut source = MockMappingSource::new();
    source
        .expect_fetch_mapping()
        .withf(|index| index == "gitlab")
        .times(1)
        .returning(|_| Ok(gitlab_like_mapping()));

    let job = SchemaJob::new("gitlab", &destination);
    let report = generate_schema(&source, &job)
        .await
        .expect("schema generation should succeed");

    assert_eq!(report.rows, 4);
    assert_eq!(report.skipped, 1);
    assert_eq!(
        fs::read_to_string(&destination).unwrap(),
        "name,type,aggregatable,description\n\
         author.id,long,true,'NA'\n\
         author.username,keyword,true,'NA'\n\
         commit.sha,keyword,true,'NA'\n\
         origin,keyword,true,'NA'\n"
    );
}

#[tokio::test]
async fn full_path_mode_is_passed_through() {
    let out = tempdir().unwrap();
    let destination = out.path().join("schema.csv");

    let mut source = MockMappingSource::new();
    source
        .expect_fetch_mapping()
        .returning(|_| Ok(gitlab_like_mapping()));

    let mut job = SchemaJob::new("gitlab", &destination);
    job.prefix_mode = PrefixMode::FullPath;
    generate_schema(&source, &job).await.unwrap();

    let content = fs::read_to_string(&destination).unwrap();
    assert!(content.contains("\ndata.commit.sha,keyword,true,'NA'\n"), "got: {content}");
}

#[tokio::test]
async fn adapter_failure_leaves_destination_untouched() {
    let out = tempdir().unwrap();
    let fresh = out.path().join("schema.csv");
    let existing = out.path().join("existing.csv");
    fs::write(&existing, "previous schema\n").unwrap();

    for destination in [&fresh, &existing] {
        let mut source = MockMappingSource::new();
        source
            .expect_fetch_mapping()
            .returning(|index| Err(AdapterError::EmptyMapping(index.to_string())));

        let job = SchemaJob::new("git", destination);
        let err = generate_schema(&source, &job)
            .await
            .expect_err("adapter failure must be fatal");
        assert!(matches!(err, SchemaError::Adapter(_)), "got: {err:?}");
    }

    assert!(!fresh.exists(), "no schema file may be created");
    assert_eq!(fs::read_to_string(&existing).unwrap(), "previous schema\n");
}

#[tokio::test]
async fn unwritable_destination_is_an_emit_error() {
    let out = tempdir().unwrap();
    let destination = out.path().join("no-such-dir").join("schema.csv");

    let mut source = MockMappingSource::new();
    source
        .expect_fetch_mapping()
        .returning(|_| Ok(gitlab_like_mapping()));

    let err = generate_schema(&source, &SchemaJob::new("gitlab", destination))
        .await
        .expect_err("write must fail");
    assert!(matches!(err, SchemaError::Emit(_)), "got: {err:?}");
}
