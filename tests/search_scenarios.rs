//! End-to-end search behavior over small product corpora.

use quarry::error::Result;
use quarry::prelude::*;
use quarry::query::QueryBuilder;

fn products() -> Result<Engine> {
    let engine = Engine::default();
    let config = IndexConfig::new()
        .with_field(FieldEntry::text("title"))
        .with_field(FieldEntry::number("price"))
        .with_field(FieldEntry::keyword("category"));
    engine.create_index("products", config)?;
    Ok(engine)
}

fn add_title(engine: &Engine, id: &str, title: &str) -> Result<()> {
    engine.add(
        "products",
        Document::builder().id(id).text("title", title).build()?,
    )
}

#[test]
fn test_single_term() -> Result<()> {
    let engine = products()?;
    add_title(&engine, "1", "Wireless Bluetooth Headphones")?;
    add_title(&engine, "2", "USB-C Cable")?;

    let results = engine.search_str("products", "title:wireless", &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["1"]);
    assert_eq!(results.total_hits, 1);

    // Hyphenated values become a phrase of their tokens.
    let results = engine.search_str("products", "title:usb-c", &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["2"]);
    Ok(())
}

#[test]
fn test_conjunction() -> Result<()> {
    let engine = products()?;
    add_title(&engine, "1", "Wireless Bluetooth Headphones")?;
    add_title(&engine, "2", "USB-C Cable")?;
    add_title(&engine, "3", "Bluetooth Speaker")?;

    let results = engine.search_str("products", "wireless AND bluetooth", &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["1"]);

    let results = engine.search_str("products", "wireless OR bluetooth", &SearchOptions::new())?;
    assert_eq!(results.total_hits, 2);
    // Document 1 matches both terms.
    assert_eq!(results.ids()[0], "1");

    let results = engine.search_str("products", "bluetooth -wireless", &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["3"]);
    Ok(())
}

#[test]
fn test_inclusive_numeric_range() -> Result<()> {
    let engine = products()?;
    for (id, price) in [("a", 5.0), ("b", 10.0), ("c", 55.0), ("d", 100.0), ("e", 150.0)] {
        let doc = Document::builder()
            .id(id)
            .text("title", "item")
            .number("price", price)
            .build()?;
        engine.add("products", doc)?;
    }

    let options = SearchOptions::new().sort_by(SortBy::field("price", SortOrder::Asc));
    let results = engine.search_str("products", "price:[10 TO 100]", &options)?;
    assert_eq!(results.ids(), vec!["b", "c", "d"]);

    let results = engine.search_str("products", "price:{10 TO 100}", &options)?;
    assert_eq!(results.ids(), vec!["c"]);

    let results = engine.search_str("products", "price:[100 TO *]", &options)?;
    assert_eq!(results.ids(), vec!["d", "e"]);
    Ok(())
}

#[test]
fn test_fuzzy_default_distance() -> Result<()> {
    let engine = products()?;
    add_title(&engine, "1", "Wireless Bluetooth Headphones")?;
    add_title(&engine, "2", "USB-C Cable")?;

    let results = engine.search_str("products", "wireles~", &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["1"]);

    let results = engine.search_str("products", "title:wirelss~1", &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["1"]);

    let results = engine.search_str("products", "title:wrls~1", &SearchOptions::new())?;
    assert!(results.hits.is_empty());
    Ok(())
}

#[test]
fn test_prefix_and_wildcard() -> Result<()> {
    let engine = products()?;
    add_title(&engine, "1", "Wireless Bluetooth Headphones")?;
    add_title(&engine, "2", "Wired Headset")?;
    add_title(&engine, "3", "Speaker")?;

    let results = engine.search_str("products", "title:wire*", &SearchOptions::new())?;
    let mut ids = results.ids();
    ids.sort_unstable();
    assert_eq!(ids, vec!["1", "2"]);

    let results = engine.search_str("products", "title:head?et", &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["2"]);
    Ok(())
}

#[test]
fn test_phrase_slop() -> Result<()> {
    let engine = products()?;
    add_title(&engine, "adjacent", "quick brown fox")?;
    add_title(&engine, "one-between", "quick red brown fox")?;
    add_title(&engine, "two-between", "quick red old brown fox")?;
    add_title(&engine, "three-between", "quick red old tired brown fox")?;
    add_title(&engine, "reversed", "brown quick fox")?;

    let exact = Query::phrase("title", ["quick", "brown"], 0);
    let results = engine.search("products", &exact, &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["adjacent"]);

    let sloppy = Query::phrase("title", ["quick", "brown"], 2);
    let results = engine.search("products", &sloppy, &SearchOptions::new())?;
    let mut ids = results.ids();
    ids.sort_unstable();
    // A swapped pair is two moves away.
    assert_eq!(ids, vec!["adjacent", "one-between", "reversed", "two-between"]);

    // Closer matches rank higher.
    assert_eq!(results.ids()[0], "adjacent");

    let results = engine.search_str("products", "title:\"quick brown\"~1", &SearchOptions::new())?;
    let mut ids = results.ids();
    ids.sort_unstable();
    assert_eq!(ids, vec!["adjacent", "one-between"]);
    Ok(())
}

#[test]
fn test_match_all_negation() -> Result<()> {
    let engine = products()?;
    add_title(&engine, "1", "cheap spam offer")?;
    add_title(&engine, "2", "honest product")?;

    let results = engine.search_str("products", "*:* -title:spam", &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["2"]);

    // A purely negative boolean matches nothing.
    let query = Query::boolean(vec![], vec![], vec![Query::term("title", "spam")]);
    let results = engine.search("products", &query, &SearchOptions::new())?;
    assert!(results.hits.is_empty());
    Ok(())
}

#[test]
fn test_query_builder() -> Result<()> {
    let engine = products()?;
    for (id, title, category) in [
        ("1", "Wireless Headphones", "audio"),
        ("2", "Wireless Mouse", "computer"),
        ("3", "Wired Headphones", "audio"),
    ] {
        let doc = Document::builder()
            .id(id)
            .text("title", title)
            .keyword("category", category)
            .build()?;
        engine.add("products", doc)?;
    }

    let query = QueryBuilder::new()
        .must_match("category", "audio")
        .must_not_match("title", "wired")
        .build()?;
    let results = engine.search("products", &query, &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["1"]);

    let query = QueryBuilder::new().fuzzy("title", "headphnes", 2).build()?;
    let results = engine.search("products", &query, &SearchOptions::new())?;
    assert_eq!(results.total_hits, 2);

    assert!(QueryBuilder::new().build().is_err());
    Ok(())
}

#[test]
fn test_keyword_is_case_sensitive() -> Result<()> {
    let engine = products()?;
    let doc = Document::builder()
        .id("1")
        .text("title", "Phone")
        .keyword("category", "Electronics")
        .build()?;
    engine.add("products", doc)?;

    let results = engine.search_str("products", "category:Electronics", &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["1"]);
    let results = engine.search_str("products", "category:electronics", &SearchOptions::new())?;
    assert!(results.hits.is_empty());
    Ok(())
}

#[test]
fn test_pagination_and_ties() -> Result<()> {
    let engine = products()?;
    for id in ["d", "a", "c", "b", "e"] {
        add_title(&engine, id, "same text")?;
    }

    let all = engine.search_str("products", "title:same", &SearchOptions::new())?;
    // Equal scores break ties on id.
    assert_eq!(all.ids(), vec!["a", "b", "c", "d", "e"]);

    let page = engine.search_str(
        "products",
        "title:same",
        &SearchOptions::new().with_offset(1).with_limit(2),
    )?;
    assert_eq!(page.ids(), vec!["b", "c"]);
    assert_eq!(page.total_hits, 5);
    Ok(())
}

#[test]
fn test_sort_missing_values_last() -> Result<()> {
    let engine = products()?;
    for (id, price) in [("a", Some(30.0)), ("b", None), ("c", Some(10.0))] {
        let mut builder = Document::builder().id(id).text("title", "item");
        if let Some(price) = price {
            builder = builder.number("price", price);
        }
        engine.add("products", builder.build()?)?;
    }

    let asc = SearchOptions::new().sort_by(SortBy::field("price", SortOrder::Asc));
    assert_eq!(engine.search_str("products", "title:item", &asc)?.ids(), vec!["c", "a", "b"]);

    let desc = SearchOptions::new().sort_by(SortBy::field("price", SortOrder::Desc));
    assert_eq!(engine.search_str("products", "title:item", &desc)?.ids(), vec!["a", "c", "b"]);

    let unknown = SearchOptions::new().sort_by(SortBy::field("rating", SortOrder::Asc));
    let err = engine.search_str("products", "title:item", &unknown).unwrap_err();
    assert!(matches!(err, QuarryError::UnknownField(_)));
    Ok(())
}

#[test]
fn test_document_boost_and_min_score() -> Result<()> {
    let engine = products()?;
    add_title(&engine, "plain", "lamp")?;
    let boosted = Document::builder().id("boosted").text("title", "lamp").boost(3.0).build()?;
    engine.add("products", boosted)?;

    let results = engine.search_str("products", "title:lamp", &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["boosted", "plain"]);
    let top = results.hits[0].score.unwrap_or_default();
    let low = results.hits[1].score.unwrap_or_default();
    assert!((top - 3.0 * low).abs() < 1e-4);

    let results = engine.search_str(
        "products",
        "title:lamp",
        &SearchOptions::new().with_min_score(low * 2.0),
    )?;
    assert_eq!(results.ids(), vec!["boosted"]);
    assert_eq!(results.total_hits, 1);
    Ok(())
}

#[test]
fn test_clause_errors() -> Result<()> {
    let engine = products()?;
    add_title(&engine, "1", "Wireless Headphones")?;

    // An unknown field in an optional clause is no match.
    let results = engine.search_str("products", "title:wireless OR color:red", &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["1"]);

    // In a required clause it fails the query.
    let err = engine
        .search_str("products", "+title:wireless +color:red", &SearchOptions::new())
        .unwrap_err();
    assert!(matches!(err, QuarryError::UnknownField(_)));

    // Also when an earlier required clause already matches nothing.
    let err = engine
        .search_str("products", "+title:zzz +color:red", &SearchOptions::new())
        .unwrap_err();
    assert!(matches!(err, QuarryError::UnknownField(ref field) if field == "color"));
    let err = engine
        .search_str("products", "+title:zzz +price:[cheap TO 10]", &SearchOptions::new())
        .unwrap_err();
    assert!(matches!(err, QuarryError::FieldTypeMismatch { .. }));

    // A negated clause on an unknown field excludes nothing, with or
    // without matches left to exclude from.
    let results = engine.search_str("products", "title:wireless -color:red", &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["1"]);
    let results = engine.search_str("products", "+title:zzz -color:red", &SearchOptions::new())?;
    assert!(results.hits.is_empty());

    for query in ["title:(wireless", "wireles~b", "wireles~0.5", "wireles~99999999999"] {
        let err = engine
            .search_str("products", query, &SearchOptions::new())
            .unwrap_err();
        assert_eq!(err.kind().code(), "ERR_QUERY_SYNTAX", "{query}");
    }
    Ok(())
}

#[test]
fn test_text_range_capped_at_max_expansions() -> Result<()> {
    let mut config = EngineConfig::default();
    config.limits.max_expansions = 2;
    let engine = Engine::new(config);
    engine.create_index("products", IndexConfig::new().with_field(FieldEntry::text("title")))?;
    add_title(&engine, "1", "alpha")?;
    add_title(&engine, "2", "bravo")?;
    add_title(&engine, "3", "charlie")?;

    let results = engine.search_str("products", "title:[a TO z]", &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["1", "2"]);
    Ok(())
}

#[test]
fn test_highlight_in_results() -> Result<()> {
    let engine = products()?;
    add_title(&engine, "1", "Wireless Bluetooth Headphones")?;

    let options = SearchOptions::new().with_highlight(HighlightConfig::new());
    let results = engine.search_str("products", "title:bluetooth", &options)?;
    let fragments = &results.hits[0].highlights["title"];
    assert_eq!(fragments, &vec!["Wireless <em>Bluetooth</em> Headphones".to_string()]);

    let fragments = engine.highlight("products", "1", "title", &["wireless"], &HighlightConfig::new())?;
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].text, "<em>Wireless</em> Bluetooth Headphones");
    Ok(())
}

#[test]
fn test_highlight_requires_stored_field() -> Result<()> {
    let engine = Engine::default();
    let config = IndexConfig::new()
        .with_field(FieldEntry::text("title"))
        .with_field(FieldEntry::text("body").stored(false));
    engine.create_index("docs", config)?;
    let doc = Document::builder()
        .id("1")
        .text("title", "rust")
        .text("body", "rust search")
        .build()?;
    engine.add("docs", doc)?;

    let err = engine
        .highlight("docs", "1", "body", &["rust"], &HighlightConfig::new())
        .unwrap_err();
    assert!(matches!(err, QuarryError::FieldNotStored(_)));

    // Still searchable.
    let results = engine.search_str("docs", "body:search", &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["1"]);
    Ok(())
}

#[test]
fn test_timeout() -> Result<()> {
    let engine = products()?;
    add_title(&engine, "1", "Wireless Headphones")?;

    let token = quarry::search::CancellationToken::new();
    token.cancel();
    let options = SearchOptions::new().with_cancellation(token);
    let err = engine.search_str("products", "title:wire*", &options).unwrap_err();
    assert!(matches!(err, QuarryError::Timeout(_)));

    // The index is untouched.
    let results = engine.search_str("products", "title:wire*", &SearchOptions::new())?;
    assert_eq!(results.ids(), vec!["1"]);
    Ok(())
}
