//! Engine and index configuration loading.

use std::fs;

use tempfile::TempDir;

use quarry::error::Result;
use quarry::prelude::*;

#[test]
fn test_engine_config_from_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("engine.json");
    fs::write(
        &path,
        r#"{
            "max_indexes": 2,
            "default_analyzer": "english",
            "default_limit": 3,
            "limits": {"max_documents_per_index": 5}
        }"#,
    )?;

    let config = EngineConfig::from_json_file(&path)?;
    assert_eq!(config.max_indexes, 2);
    assert_eq!(config.default_limit, 3);
    assert_eq!(config.limits.max_documents_per_index, 5);
    // Unset values keep their defaults.
    assert_eq!(config.limits.max_expansions, 1024);
    assert_eq!(config.suggest_cache_ttl_ms, 60_000);

    let engine = Engine::new(config);
    engine.create_index("a", IndexConfig::new())?;
    engine.create_index("b", IndexConfig::new())?;
    assert!(matches!(
        engine.create_index("c", IndexConfig::new()),
        Err(QuarryError::ResourceExhausted(_))
    ));

    // The english analyzer stems.
    let doc = Document::builder().id("1").text("body", "running shoes").build()?;
    engine.add("a", doc)?;
    let results = engine.search_str("a", "body:runs", &engine.search_options())?;
    assert_eq!(results.ids(), vec!["1"]);

    for i in 2..=5 {
        let doc = Document::builder().id(i.to_string()).text("body", "more").build()?;
        engine.add("a", doc)?;
    }
    let doc = Document::builder().id("6").text("body", "too many").build()?;
    assert!(matches!(
        engine.add("a", doc),
        Err(QuarryError::ResourceExhausted(_))
    ));

    let results = engine.search_str("a", "*:*", &engine.search_options())?;
    assert_eq!(results.total_hits, 5);
    assert_eq!(results.hits.len(), 3);
    Ok(())
}

#[test]
fn test_invalid_engine_config() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("engine.json");

    fs::write(&path, r#"{"max_indexes": 0}"#)?;
    assert!(matches!(
        EngineConfig::from_json_file(&path),
        Err(QuarryError::InvalidArgument(_))
    ));

    fs::write(&path, "{ not json")?;
    assert!(matches!(
        EngineConfig::from_json_file(&path),
        Err(QuarryError::Json(_))
    ));

    assert!(matches!(
        EngineConfig::from_json_file(temp_dir.path().join("missing.json")),
        Err(QuarryError::Io(_))
    ));
    Ok(())
}

#[test]
fn test_index_config_json() -> Result<()> {
    let config = IndexConfig::from_json_str(
        r#"{
            "fields": [
                {"name": "title", "type": "text", "analyzer": "products"},
                {"name": "sku", "type": "keyword"},
                {"name": "notes", "type": "text", "indexed": false}
            ],
            "analyzers": {
                "products": {
                    "tokenizer": {"type": "standard"},
                    "filters": [
                        {"type": "lowercase"},
                        {"type": "synonym", "groups": [["tv", "television"], ["laptop", "notebook"]]}
                    ]
                }
            },
            "default_fields": ["title"],
            "scoring": {"type": "tf_idf"},
            "dynamic": false
        }"#,
    )?;
    assert_eq!(
        config.scoring,
        quarry::search::ScoringConfig::TfIdf {
            sublinear_tf: true,
            smooth_idf: true
        }
    );

    let index = Index::new("electronics", config)?;
    let doc = Document::builder()
        .id("1")
        .text("title", "Samsung Television 55 inch")
        .keyword("sku", "SAM-55")
        .text("notes", "display model")
        .build()?;
    index.add(doc)?;

    // Synonyms match in both directions.
    assert_eq!(index.search_str("tv", &SearchOptions::new())?.ids(), vec!["1"]);
    assert_eq!(index.search_str("television", &SearchOptions::new())?.ids(), vec!["1"]);
    assert_eq!(index.search_str("sku:SAM-55", &SearchOptions::new())?.ids(), vec!["1"]);

    // Stored but not indexed.
    assert!(index.search_str("notes:display", &SearchOptions::new())?.hits.is_empty());
    let stored = index
        .get("1")
        .ok_or_else(|| QuarryError::document_not_found("1"))?;
    assert_eq!(
        stored.values("notes"),
        &[FieldValue::Text("display model".to_string())]
    );
    Ok(())
}

#[test]
fn test_index_config_is_validated() {
    let unknown_analyzer = IndexConfig::new()
        .with_field(FieldEntry::text("title").with_analyzer("klingon"));
    assert!(Index::new("a", unknown_analyzer).is_err());

    let bad_default_field = IndexConfig::new()
        .with_field(FieldEntry::number("price"))
        .with_default_fields(["price"]);
    assert!(matches!(
        Index::new("b", bad_default_field),
        Err(QuarryError::FieldTypeMismatch { .. })
    ));

    let bad_scoring = IndexConfig::new().with_scoring(quarry::search::ScoringConfig::Bm25 { k1: 1.2, b: 2.0 });
    assert!(matches!(
        Index::new("c", bad_scoring),
        Err(QuarryError::InvalidArgument(_))
    ));
}
