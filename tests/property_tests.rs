/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs to normalization, scoring and matching
use livability_api::countries::search_fuzzy;
use livability_api::models::{Metric, MetricRecord, MetricTable, Rating};
use livability_api::normalize::normalize;
use livability_api::providers::{crime_score, residential_share};
use livability_api::scoring::{calculate_rating, ScoringEngine};
use livability_api::services::clean_postcode;
use proptest::prelude::*;

fn any_record() -> impl Strategy<Value = MetricRecord> {
    prop::collection::vec(-1.0e6f64..1.0e6, 8).prop_map(|values| {
        let mut record = MetricTable::from_fn(|_| 0.0);
        for (metric, value) in Metric::ALL.into_iter().zip(values) {
            *record.get_mut(metric) = value;
        }
        record
    })
}

fn rating_rank(rating: Rating) -> u8 {
    match rating {
        Rating::VeryPoor => 0,
        Rating::Poor => 1,
        Rating::Average => 2,
        Rating::Good => 3,
        Rating::Excellent => 4,
    }
}

// Property: inverted normalization is the complement of the plain one
proptest! {
    #[test]
    fn inverted_normalization_is_complement(
        value in -1.0e6f64..1.0e6,
        min in -1.0e4f64..1.0e4,
        width in 1.0f64..1.0e4
    ) {
        let max = min + width;
        let plain = normalize(value, min, max, false);
        let inverted = normalize(value, min, max, true);
        prop_assert!((plain + inverted - 1.0).abs() < 1e-9 * plain.abs().max(1.0));
    }

    #[test]
    fn range_endpoints_map_to_zero_and_one(min in -1.0e4f64..1.0e4, width in 1.0f64..1.0e4) {
        let max = min + width;
        prop_assert!(normalize(min, min, max, false).abs() < 1e-9);
        prop_assert!((normalize(max, min, max, false) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn values_outside_range_are_not_clamped(excess in 0.001f64..1.0e4) {
        prop_assert!(normalize(100.0 + excess, 0.0, 100.0, false) > 1.0);
        prop_assert!(normalize(-excess, 0.0, 100.0, false) < 0.0);
    }
}

// Property: scoring is deterministic and rating is monotonic in score
proptest! {
    #[test]
    fn scoring_is_deterministic(record in any_record()) {
        let engine = ScoringEngine::default();
        let first = engine.evaluate(&record);
        let second = engine.evaluate(&record);
        prop_assert_eq!(first.score.to_bits(), second.score.to_bits());
        prop_assert_eq!(first.rating, second.rating);
    }

    #[test]
    fn score_equals_sum_of_contributions(record in any_record()) {
        let engine = ScoringEngine::default();
        let total: f64 = engine.breakdown(&record).iter().map(|c| c.weighted).sum();
        prop_assert_eq!(total.to_bits(), engine.evaluate(&record).score.to_bits());
    }

    #[test]
    fn rating_is_monotonic(a in -10.0f64..10.0, b in -10.0f64..10.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(rating_rank(calculate_rating(low)) <= rating_rank(calculate_rating(high)));
    }
}

// Property: metric helpers stay within their documented bounds
proptest! {
    #[test]
    fn crime_score_is_bounded(count in 0usize..100_000) {
        let score = crime_score(count);
        prop_assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn residential_share_is_a_ratio(tags in prop::collection::vec("[a-z_]{0,12}", 0..50)) {
        let share = residential_share(tags.iter().map(String::as_str));
        prop_assert!((0.0..=1.0).contains(&share));
    }

    #[test]
    fn cleaned_postcodes_have_no_whitespace(postcode in "[a-zA-Z0-9 ]{0,12}") {
        let cleaned = clean_postcode(&postcode);
        prop_assert!(!cleaned.contains(' '));
        prop_assert_eq!(cleaned.clone(), cleaned.to_uppercase());
    }

    #[test]
    fn country_search_never_panics(query in "\\PC*") {
        let _ = search_fuzzy(&query);
    }
}
