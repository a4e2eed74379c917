//! Facet aggregation over query matches.

use quarry::error::Result;
use quarry::facet::{CalendarInterval, FacetResult, FacetSpec, RangeSpec};
use quarry::prelude::*;

fn catalog() -> Result<Index> {
    let config = IndexConfig::new()
        .with_field(FieldEntry::text("title"))
        .with_field(FieldEntry::keyword("brand"))
        .with_field(FieldEntry::number("price"))
        .with_field(FieldEntry::date("released"));
    let index = Index::new("catalog", config)?;

    let items: [(&str, &str, Option<&str>, f64, &str); 6] = [
        ("1", "wireless headphones", Some("acme"), 20.0, "2024-01-15"),
        ("2", "wireless speaker", Some("acme"), 45.0, "2024-01-20"),
        ("3", "wireless mouse", Some("globex"), 80.0, "2024-03-02"),
        ("4", "wireless charger", None, 120.0, "2024-03-30"),
        ("5", "wired keyboard", Some("initech"), 60.0, "2024-02-10"),
        ("6", "wireless earbuds", Some("globex"), 250.0, "2024-03-05"),
    ];
    for (id, title, brand, price, released) in items {
        let mut builder = Document::builder()
            .id(id)
            .text("title", title)
            .number("price", price)
            .date("released", released);
        if let Some(brand) = brand {
            builder = builder.keyword("brand", brand);
        }
        index.add(builder.build()?)?;
    }
    Ok(index)
}

fn facets(index: &Index, query: &str, spec: FacetSpec) -> Result<SearchResults> {
    index.search_str(query, &SearchOptions::new().with_limit(1).with_facets(spec))
}

#[test]
fn test_terms_facet_completeness() -> Result<()> {
    let index = catalog()?;
    let results = facets(&index, "title:wireless", FacetSpec::new().terms("brands", "brand", 10))?;

    // Pagination does not affect facets.
    assert_eq!(results.hits.len(), 1);
    assert_eq!(results.total_hits, 5);

    let brands = &results.facets["brands"];
    assert_eq!(brands.count("acme"), Some(2));
    assert_eq!(brands.count("globex"), Some(2));
    assert_eq!(brands.count("initech"), None);

    let FacetResult::Terms {
        buckets, missing, other_count,
    } = brands
    else {
        panic!("expected terms facet, got {brands:?}");
    };
    let bucketed: u64 = buckets.iter().map(|b| b.count).sum();
    assert_eq!(bucketed + missing, results.total_hits as u64);
    assert_eq!(*missing, 1);
    assert_eq!(*other_count, 0);
    Ok(())
}

#[test]
fn test_terms_facet_size_and_order() -> Result<()> {
    let index = catalog()?;
    let results = facets(&index, "*:*", FacetSpec::new().terms("brands", "brand", 2))?;
    let FacetResult::Terms {
        buckets, other_count, ..
    } = &results.facets["brands"]
    else {
        panic!("expected terms facet");
    };
    let keys: Vec<&str> = buckets.iter().map(|b| b.key.as_str()).collect();
    // Count desc, then key asc.
    assert_eq!(keys, vec!["acme", "globex"]);
    assert_eq!(*other_count, 1);
    Ok(())
}

#[test]
fn test_facets_respect_negation() -> Result<()> {
    let index = catalog()?;
    let results = facets(
        &index,
        "title:wireless -brand:acme",
        FacetSpec::new().terms("brands", "brand", 10),
    )?;
    let brands = &results.facets["brands"];
    assert_eq!(brands.count("acme"), None);
    assert_eq!(brands.count("globex"), Some(2));
    Ok(())
}

#[test]
fn test_range_facet() -> Result<()> {
    let index = catalog()?;
    let ranges = vec![
        RangeSpec::new(None, Some(50.0)),
        RangeSpec::new(Some(50.0), Some(100.0)),
        RangeSpec::new(Some(100.0), Some(250.0)).with_key("premium"),
    ];
    let results = facets(&index, "*:*", FacetSpec::new().range("price", "price", ranges))?;
    let price = &results.facets["price"];
    assert_eq!(price.count("*_50"), Some(2));
    assert_eq!(price.count("50_100"), Some(2));
    // The last range is closed.
    assert_eq!(price.count("premium"), Some(2));
    Ok(())
}

#[test]
fn test_histogram_facet() -> Result<()> {
    let index = catalog()?;
    let results = facets(&index, "title:wireless", FacetSpec::new().histogram("price", "price", 50.0))?;
    let buckets = results.facets["price"].buckets();

    // Starts at the smallest matched value; empty buckets in between.
    let keys: Vec<&str> = buckets.iter().map(|b| b.key.as_str()).collect();
    assert_eq!(keys, vec!["20", "70", "120", "170", "220"]);
    let counts: Vec<u64> = buckets.iter().map(|b| b.count).collect();
    assert_eq!(counts, vec![2, 1, 1, 0, 1]);
    Ok(())
}

#[test]
fn test_date_histogram_facet() -> Result<()> {
    let index = catalog()?;
    let results = facets(
        &index,
        "*:*",
        FacetSpec::new().date_histogram("months", "released", CalendarInterval::Month),
    )?;
    let buckets = results.facets["months"].buckets();
    let summary: Vec<(&str, u64)> = buckets.iter().map(|b| (b.key.as_str(), b.count)).collect();
    assert_eq!(
        summary,
        vec![
            ("2024-01-01T00:00:00+00:00", 2),
            ("2024-02-01T00:00:00+00:00", 1),
            ("2024-03-01T00:00:00+00:00", 3),
        ]
    );
    Ok(())
}

#[test]
fn test_stats_facet() -> Result<()> {
    let index = catalog()?;
    let results = facets(&index, "title:wireless", FacetSpec::new().stats("price", "price"))?;
    let FacetResult::Stats(stats) = &results.facets["price"] else {
        panic!("expected stats facet");
    };
    assert_eq!(stats.count, 5);
    assert_eq!(stats.min, Some(20.0));
    assert_eq!(stats.max, Some(250.0));
    assert_eq!(stats.sum, 515.0);
    assert_eq!(stats.avg, Some(103.0));

    // Every document matched: same numbers from the running totals.
    let all = facets(&index, "*:*", FacetSpec::new().stats("price", "price"))?;
    let FacetResult::Stats(all) = &all.facets["price"] else {
        panic!("expected stats facet");
    };
    assert_eq!(all.count, 6);
    assert_eq!(all.sum, 575.0);
    Ok(())
}

#[test]
fn test_cardinality_facet() -> Result<()> {
    let index = catalog()?;
    let results = facets(&index, "*:*", FacetSpec::new().cardinality("brands", "brand"))?;
    assert_eq!(
        results.facets["brands"],
        FacetResult::Cardinality {
            value: 3,
            exact: true
        }
    );
    Ok(())
}

#[test]
fn test_facet_on_unknown_field() -> Result<()> {
    let index = catalog()?;
    let err = facets(&index, "*:*", FacetSpec::new().terms("colors", "color", 10)).unwrap_err();
    assert!(matches!(err, QuarryError::UnknownField(_)));

    let spec = FacetSpec::from_json_str(r#"{"brands": {"type": "terms", "field": "brand"}}"#)?;
    let results = facets(&index, "*:*", spec)?;
    assert_eq!(results.facets["brands"].count("acme"), Some(2));
    Ok(())
}
