//! Integration tests pinned to independently-computed reference
//! fixtures, one per named search scenario.

use slimy::{Annulus, CpuSearcher, Mask, SearchConfig, SearchError, Searcher};

fn searcher() -> CpuSearcher {
    CpuSearcher::new(SearchConfig::default())
}

/// S1: a full listing over a modest region produces an exact, fully
/// ordered result set.
#[test]
fn s1_full_region_listing_matches_reference() {
    let s = searcher();
    let mask = Annulus::new(1, 8);
    let results = s.search(-200, -200, 200, 200, 37, 1, &mask).unwrap();

    let got: Vec<(i32, i32, u32)> = results.iter().map(|r| (r.x, r.z, r.count)).collect();
    let expected = vec![
        (-98, 43, 39),
        (-33, -148, 39),
        (-33, -146, 38),
        (-31, -148, 38),
        (59, 51, 37),
        (-33, -147, 37),
        (-32, -148, 37),
        (-149, 32, 37),
        (-36, -150, 37),
        (10, -175, 37),
    ];
    assert_eq!(got, expected);
}

/// S2: a mask that does not fit inside a single 128x128 section is
/// rejected with the documented error, before any scanning happens.
#[test]
fn s2_oversized_mask_is_rejected() {
    struct TooWide;
    impl Mask for TooWide {
        fn bounds(&self) -> (u32, u32) {
            (128, 1)
        }
        fn query(&self, _ix: u32, _iz: u32) -> bool {
            true
        }
    }

    let s = searcher();
    let err = s.search(0, 0, 10, 10, 1, 1, &TooWide).unwrap_err();
    assert!(matches!(err, SearchError::InvalidMask { width: 128, height: 1 }));
    assert_eq!(err.to_string(), "Mask bounds exceed section size");
}

/// S3: an unreachable threshold over a region produces an empty,
/// successful result — not an error. The region itself is given
/// reversed (`x0=0 > x1=-100`), which the searcher must normalize
/// rather than treat as vacuously empty.
#[test]
fn s3_unreachable_threshold_yields_no_results() {
    let s = searcher();
    let mask = Annulus::new(1, 8);
    let results = s.search(0, -100, -100, 0, 1_000_000, 1, &mask).unwrap();
    assert!(results.is_empty());
}

/// A reversed region must be normalized (swapped), not treated as
/// empty: the same clusters are found regardless of corner order.
#[test]
fn reversed_region_finds_the_same_results_as_normalized() {
    let s = searcher();
    let mask = Annulus::new(1, 8);
    let normalized = s.search(-106, 35, -90, 51, 0, 1, &mask).unwrap();
    let reversed_x = s.search(-90, 35, -106, 51, 0, 1, &mask).unwrap();
    let reversed_both = s.search(-90, 51, -106, 35, 0, 1, &mask).unwrap();

    assert!(!normalized.is_empty());
    assert_eq!(normalized, reversed_x);
    assert_eq!(normalized, reversed_both);
}

/// S4: a region and threshold chosen so exactly one candidate center
/// qualifies.
#[test]
fn s4_narrow_region_yields_exactly_one_result() {
    let s = searcher();
    let mask = Annulus::new(1, 8);
    let results = s.search(-106, 35, -90, 51, 39, 1, &mask).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!((results[0].x, results[0].z, results[0].count), (-98, 43, 39));
}

/// Re-running the same search twice on the same `CpuSearcher` must
/// succeed both times: a finished search returns the searcher to an
/// idle state rather than leaving it permanently "in progress".
#[test]
fn searcher_can_run_consecutive_searches() {
    let s = searcher();
    let mask = Annulus::new(1, 8);
    let first = s.search(-10, -10, 10, 10, 0, 1, &mask).unwrap();
    let second = s.search(-10, -10, 10, 10, 0, 1, &mask).unwrap();
    assert_eq!(first, second);
}

/// Once destroyed, a searcher refuses every subsequent search.
#[test]
fn destroy_is_permanent() {
    let s = searcher();
    let mask = Annulus::new(1, 8);
    assert!(s.search(0, 0, 1, 1, 0, 1, &mask).is_ok());
    s.destroy();
    assert!(matches!(s.search(0, 0, 1, 1, 0, 1, &mask), Err(SearchError::Destroyed)));
}
