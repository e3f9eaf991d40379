use bizsearch_core::analytics::{reviews_per_user, top_terms, user_bounding_box};
use bizsearch_core::config::IndexLayout;
use bizsearch_core::geo::EPSILON;
use bizsearch_core::persist::IndexPaths;
use bizsearch_core::search::{search_business, search_geospatial, search_reviews};
use bizsearch_core::tokenizer::AnalyzerConfig;
use bizsearch_core::{
    build_index, BusinessDocument, BusinessField, BusinessSort, Document, Error, Index, RawRecord, ReviewDocument,
    ReviewSort,
};
use std::cell::Cell;
use std::fs;
use std::path::Path;

fn business_rows() -> Vec<RawRecord> {
    let rows = [
        ("A", "Apex Cafe", "4.5", "53.4420", "-113.4710"),
        ("B", "Best Diner", "4.9", "53.5461", "-113.4938"),
        ("C", "Aardvark Grill", "4.9", "53.4100", "-113.4600"),
        ("D", "Downtown Cafe", "3.0", "53.4500", "-113.5000"),
        ("E", "Edge Grill", "5.0", "53.45000005", "-113.4999999"),
    ];
    rows.iter()
        .map(|(id, name, stars, lat, lon)| {
            RawRecord::from_pairs([
                ("business_id", *id),
                ("name", *name),
                ("stars", *stars),
                ("latitude", *lat),
                ("longitude", *lon),
                ("review_count", "10"),
                ("is_open", "1"),
                ("categories", "Restaurants, Food"),
            ])
        })
        .collect()
}

fn review_rows() -> Vec<RawRecord> {
    let rows = [
        ("r1", "u1", "A", "Great reviews for the coffee", "3", "2018-07-07 22:09:11"),
        ("r2", "u2", "B", "The diner coffee was cold", "9", "2021-01-15 08:00:00"),
        ("r3", "u1", "C", "Best grill in town, my review", "9", "2012-12-31 23:59:59"),
        ("r4", "u3", "Z", "Coffee coffee coffee", "1", "2019-03-01 10:00:00"),
    ];
    rows.iter()
        .map(|(id, user, biz, text, useful, date)| {
            RawRecord::from_pairs([
                ("review_id", *id),
                ("user_id", *user),
                ("business_id", *biz),
                ("stars", "4"),
                ("useful", *useful),
                ("text", *text),
                ("date", *date),
            ])
        })
        .collect()
}

fn build_businesses(dir: &Path) -> Index<BusinessDocument> {
    build_index::<BusinessDocument, _>(IndexPaths::new(dir.join("indexdir")), AnalyzerConfig::default(), || {
        Ok(business_rows())
    })
    .unwrap()
    .index
}

fn build_reviews(dir: &Path) -> Index<ReviewDocument> {
    build_index::<ReviewDocument, _>(IndexPaths::new(dir.join("review_indexdir")), AnalyzerConfig::default(), || {
        Ok(review_rows())
    })
    .unwrap()
    .index
}

fn dir_snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = fs::read_dir(dir)
        .unwrap()
        .map(|e| {
            let e = e.unwrap();
            (e.file_name().to_string_lossy().into_owned(), fs::read(e.path()).unwrap())
        })
        .collect();
    files.sort();
    files
}

#[test]
fn stars_ties_break_by_match_order() {
    let tmp = tempfile::tempdir().unwrap();
    let ix = build_businesses(tmp.path());
    let hits = search_business(&ix, "cafe OR diner OR grill", 2, BusinessSort::Stars);
    let ids: Vec<&str> = hits.items.iter().map(|h| h.business_id.as_str()).collect();
    // E (5.0) outranks the 4.9 pair, which stays in insertion order.
    assert_eq!(ids, vec!["E", "B"]);

    let three = search_business(&ix, "cafe OR diner OR aardvark", 2, BusinessSort::Stars);
    let ids: Vec<&str> = three.items.iter().map(|h| h.business_id.as_str()).collect();
    assert_eq!(ids, vec!["B", "C"]);
}

#[test]
fn oversized_top_n_returns_every_match() {
    let tmp = tempfile::tempdir().unwrap();
    let ix = build_businesses(tmp.path());
    let hits = search_business(&ix, "apex best aardvark", 1000, BusinessSort::Name);
    assert_eq!(hits.len(), 3);
    assert!(hits.exceeds_matches());
    let names: Vec<&str> = hits.items.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["aardvark grill", "apex cafe", "best diner"]);
}

#[test]
fn truncation_law_holds() {
    let tmp = tempfile::tempdir().unwrap();
    let ix = build_businesses(tmp.path());
    for top_n in 0..8 {
        let hits = search_business(&ix, "cafe grill diner", top_n, BusinessSort::Stars);
        assert_eq!(hits.len(), top_n.min(hits.total_matches));
        assert!(hits.items.windows(2).all(|w| w[0].stars >= w[1].stars));
    }
}

#[test]
fn geospatial_box_includes_exactly_the_boxed_businesses() {
    let tmp = tempfile::tempdir().unwrap();
    let ix = build_businesses(tmp.path());
    let (lat_min, lat_max, lon_min, lon_max) = (53.40, 53.45, -113.50, -113.45);
    let hits = search_geospatial(&ix, lat_min, lat_max, lon_min, lon_max, 10, BusinessSort::Name).unwrap();

    let names: Vec<&str> = hits.items.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["aardvark grill", "apex cafe", "downtown cafe", "edge grill"]);

    let inside = |lat: f64, lon: f64| {
        lat_min - EPSILON <= lat && lat <= lat_max + EPSILON && lon_min - EPSILON <= lon && lon <= lon_max + EPSILON
    };
    for h in &hits.items {
        assert!(inside(h.latitude, h.longitude));
    }
    let returned: Vec<&str> = hits.items.iter().map(|h| h.business_id.as_str()).collect();
    for (_, doc) in ix.documents() {
        if !returned.contains(&doc.business_id.as_str()) {
            assert!(!inside(doc.latitude, doc.longitude), "{} should have matched", doc.business_id);
        }
    }
}

#[test]
fn keyword_and_geospatial_queries_share_one_handle_across_threads() {
    let tmp = tempfile::tempdir().unwrap();
    let ix = build_businesses(tmp.path());
    let expected_kw = search_business(&ix, "cafe grill", 10, BusinessSort::Stars);
    let expected_geo = search_geospatial(&ix, 53.40, 53.45, -113.50, -113.45, 10, BusinessSort::Name).unwrap();

    std::thread::scope(|s| {
        let workers: Vec<_> = (0..4)
            .map(|i| {
                let ix = &ix;
                s.spawn(move || {
                    if i % 2 == 0 {
                        let hits = search_business(ix, "cafe grill", 10, BusinessSort::Stars);
                        (Some(hits), None)
                    } else {
                        let hits = search_geospatial(ix, 53.40, 53.45, -113.50, -113.45, 10, BusinessSort::Name).unwrap();
                        (None, Some(hits))
                    }
                })
            })
            .collect();
        for worker in workers {
            match worker.join().unwrap() {
                (Some(kw), None) => assert_eq!(kw, expected_kw),
                (None, Some(geo)) => assert_eq!(geo, expected_geo),
                _ => unreachable!(),
            }
        }
    });
}

#[test]
fn invalid_bounds_are_rejected_before_scanning() {
    let tmp = tempfile::tempdir().unwrap();
    let ix = build_businesses(tmp.path());
    let err = search_geospatial(&ix, 53.45, 53.40, -113.50, -113.45, 10, BusinessSort::Stars).unwrap_err();
    assert!(matches!(err, Error::InvalidBounds { .. }));
    assert!(search_geospatial(&ix, 0.0, 91.0, 0.0, 1.0, 10, BusinessSort::Stars).is_err());
}

#[test]
fn reviews_search_stems_and_sorts() {
    let tmp = tempfile::tempdir().unwrap();
    let ix = build_reviews(tmp.path());

    let useful = search_reviews(&ix, "review", 10, ReviewSort::Useful).unwrap();
    let ids: Vec<&str> = useful.items.iter().map(|h| h.review_id.as_str()).collect();
    assert_eq!(ids, vec!["r3", "r1"]);

    let by_date = search_reviews(&ix, "coffee", 10, ReviewSort::Date).unwrap();
    let ids: Vec<&str> = by_date.items.iter().map(|h| h.review_id.as_str()).collect();
    assert_eq!(ids, vec!["r2", "r4", "r1"]);
    assert_eq!(by_date.items[0].date, "2021-01-15 08:00:00");
}

#[test]
fn unparseable_date_fails_the_review_query() {
    let tmp = tempfile::tempdir().unwrap();
    let mut rows = review_rows();
    rows[1].insert("date", "last tuesday");
    let ix = build_index::<ReviewDocument, _>(IndexPaths::new(tmp.path().join("r")), AnalyzerConfig::default(), || {
        Ok(rows)
    })
    .unwrap()
    .index;

    assert!(matches!(search_reviews(&ix, "coffee", 10, ReviewSort::Date), Err(Error::DateParse { .. })));
    assert_eq!(search_reviews(&ix, "coffee", 10, ReviewSort::Useful).unwrap().len(), 3);
    // The bad date is outside this match set, so the sort succeeds.
    assert_eq!(search_reviews(&ix, "grill", 10, ReviewSort::Date).unwrap().len(), 1);
}

#[test]
fn skip_if_exists_performs_no_writes() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(tmp.path().join("indexdir"));
    build_index::<BusinessDocument, _>(paths.clone(), AnalyzerConfig::default(), || Ok(business_rows())).unwrap();
    let before = dir_snapshot(&paths.root);

    let called = Cell::new(false);
    let again = build_index::<BusinessDocument, _>(paths.clone(), AnalyzerConfig::default(), || {
        called.set(true);
        Ok(Vec::new())
    })
    .unwrap();

    assert!(!called.get());
    assert!(!again.was_built());
    assert_eq!(again.index.len(), 5);
    assert_eq!(dir_snapshot(&paths.root), before);
    assert!(!paths.lock_file().exists());
}

#[test]
fn building_twice_yields_identical_indexes() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let first = build_businesses(a.path());
    let second = build_businesses(b.path());
    assert_eq!(first.inverted_index(), second.inverted_index());
    let docs_a: Vec<&BusinessDocument> = first.documents().map(|(_, d)| d).collect();
    let docs_b: Vec<&BusinessDocument> = second.documents().map(|(_, d)| d).collect();
    assert_eq!(docs_a, docs_b);

    let reopened = Index::<BusinessDocument>::open(first.paths().clone()).unwrap();
    assert_eq!(reopened.inverted_index(), first.inverted_index());
}

#[test]
fn stored_fields_round_trip_after_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    build_businesses(tmp.path()).close();
    let ix = Index::<BusinessDocument>::open(IndexPaths::new(tmp.path().join("indexdir"))).unwrap();
    for record in business_rows() {
        let expected = BusinessDocument::from_record(&record);
        assert_eq!(ix.get(expected.key()), Some(&expected));
    }
    let e = ix.get("E").unwrap();
    assert_eq!(e.latitude, 53.45000005);
    assert_eq!(e.review_count, 10);
    assert!(e.is_open);
    assert_eq!(e.attributes, "{}");
    assert_eq!(ix.postings(BusinessField::Categories, "restaur").len(), 5);
}

#[test]
fn collection_analytics() {
    let tmp = tempfile::tempdir().unwrap();
    let businesses = build_businesses(tmp.path());
    let reviews = build_reviews(tmp.path());

    assert_eq!(
        reviews_per_user(&reviews),
        vec![("u1".to_string(), 2), ("u2".to_string(), 1), ("u3".to_string(), 1)]
    );

    let terms = top_terms(&reviews, 2);
    assert_eq!(terms[0], ("coffe".to_string(), 5));
    assert_eq!(terms.len(), 2);

    let area = user_bounding_box(&reviews, &businesses, "u1").unwrap().unwrap();
    assert_eq!((area.lat_min(), area.lat_max()), (53.41, 53.442));
    assert_eq!((area.lon_min(), area.lon_max()), (-113.471, -113.46));
    // u3 only reviewed a business we do not have.
    assert!(user_bounding_box(&reviews, &businesses, "u3").is_none());
}

#[test]
fn layout_points_builders_and_readers_at_the_same_dirs() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = IndexLayout::resolve(Some(tmp.path())).unwrap();
    build_index::<ReviewDocument, _>(layout.review(), AnalyzerConfig::default(), || Ok(review_rows())).unwrap();
    assert!(Index::<ReviewDocument>::open(layout.review()).is_ok());
    assert!(matches!(Index::<BusinessDocument>::open(layout.business()), Err(Error::IndexNotFound { .. })));
}
