/// Unit tests for the scoring pipeline
/// Tests ratings, metric helpers, country resolution and response shapes through the public API
use livability_api::models::{EvaluationResult, MetricRecord, MetricTable, Rating};
use livability_api::scoring::{calculate_rating, ScoringEngine};

fn record(
    population_density: f64,
    crime_rate: f64,
    income: f64,
    residential_ratio: f64,
) -> MetricRecord {
    MetricTable {
        population_density,
        crime_rate,
        income,
        residential_ratio,
        noise_level: 30.0,
        healthcare_access: 85.0,
        community_engagement: 70.0,
        environmental_quality: 75.0,
    }
}

#[cfg(test)]
mod rating_tests {
    use super::*;

    #[test]
    fn test_typical_urban_address_is_good() {
        let result = ScoringEngine::default().evaluate(&record(5000.0, 50.0, 60000.0, 0.8));
        assert_eq!(result.rating, Rating::Good);
    }

    #[test]
    fn test_fallback_only_address_is_average() {
        // Values every provider settles on when its upstreams are down
        let result = ScoringEngine::default().evaluate(&record(5000.0, 25.0, 60000.0, 0.0));
        assert!((result.score - 0.785_143_745_143_745_1).abs() < 1e-12);
        assert_eq!(result.rating, Rating::Average);
    }

    #[test]
    fn test_high_crime_drags_rating_down() {
        let calm = ScoringEngine::default().evaluate(&record(5000.0, 0.0, 60000.0, 0.8));
        let rough = ScoringEngine::default().evaluate(&record(5000.0, 100.0, 60000.0, 0.8));
        assert!(rough.score < calm.score);
        assert!((calm.score - rough.score - 0.2 * 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_values_are_not_clamped() {
        let sparse = ScoringEngine::default().evaluate(&record(0.0, 50.0, 60000.0, 0.8));
        let dense = ScoringEngine::default().evaluate(&record(100.0, 50.0, 60000.0, 0.8));
        assert!(sparse.score < dense.score);
    }

    #[test]
    fn test_rating_thresholds() {
        let cases = [
            (2.0, Rating::Excellent),
            (1.5, Rating::Excellent),
            (1.2, Rating::Good),
            (0.8, Rating::Good),
            (0.79, Rating::Average),
            (0.4, Rating::Average),
            (0.39, Rating::Poor),
            (0.2, Rating::Poor),
            (0.19, Rating::VeryPoor),
            (0.0, Rating::VeryPoor),
        ];
        for (score, expected) in cases {
            assert_eq!(calculate_rating(score), expected, "score {}", score);
        }
    }
}

#[cfg(test)]
mod metric_helper_tests {
    use livability_api::providers::{crime_score, is_residential_tag, residential_share};
    use livability_api::services::{building_query, clean_postcode, AreaPopulation};

    #[test]
    fn test_crime_score_scale() {
        assert_eq!(crime_score(0), 0.0);
        assert_eq!(crime_score(250), 50.0);
        assert_eq!(crime_score(500), 100.0);
        assert_eq!(crime_score(1000), 100.0);
    }

    #[test]
    fn test_residential_tags() {
        assert!(is_residential_tag("house"));
        assert!(is_residential_tag("apartments"));
        assert!(is_residential_tag("detached"));
        assert!(is_residential_tag("semidetached_house"));
        assert!(is_residential_tag("residential"));
        assert!(!is_residential_tag("retail"));
        assert!(!is_residential_tag("yes"));
        assert!(!is_residential_tag(""));
    }

    #[test]
    fn test_residential_share() {
        assert_eq!(residential_share(["house", "retail"]), 0.5);
        assert_eq!(residential_share(Vec::<&str>::new()), 0.0);
    }

    #[test]
    fn test_postcode_cleaning() {
        assert_eq!(clean_postcode("mk9 3hg"), "MK93HG");
        assert_eq!(clean_postcode(" SW1A  2AA "), "SW1A2AA");
    }

    #[test]
    fn test_building_query_mentions_radius_and_point() {
        let query = building_query(51.5, -0.12, 200);
        assert!(query.contains("around:200,51.5,-0.12"));
        assert!(query.contains("way[\"building\"]"));
        assert!(query.starts_with("[out:json]"));
    }

    #[test]
    fn test_density_requires_positive_figures() {
        let empty = AreaPopulation {
            population: 0.0,
            area_km2: 10.0,
        };
        assert_eq!(empty.density(), None);

        let town = AreaPopulation {
            population: 10_001.0,
            area_km2: 2.0,
        };
        assert_eq!(town.density(), Some(5000.0));
    }
}

#[cfg(test)]
mod country_lookup_tests {
    use livability_api::countries::search_fuzzy;

    #[test]
    fn test_common_names() {
        assert_eq!(search_fuzzy("United Kingdom").map(|c| c.alpha3), Some("GBR"));
        assert_eq!(search_fuzzy("Deutschland").map(|c| c.alpha3), Some("DEU"));
        assert_eq!(search_fuzzy("us").map(|c| c.alpha3), Some("USA"));
    }

    #[test]
    fn test_unresolvable() {
        assert!(search_fuzzy("").is_none());
        assert!(search_fuzzy("Middle Earth").is_none());
    }
}

#[cfg(test)]
mod response_shape_tests {
    use super::*;
    use livability_api::models::{BatchEntry, BatchOutcome};
    use serde_json::json;

    #[test]
    fn test_batch_entry_shapes() {
        let entries = vec![
            BatchEntry {
                address: "Leeds".to_string(),
                data: BatchOutcome::Evaluated(EvaluationResult {
                    rating: Rating::VeryPoor,
                    score: 0.1,
                }),
            },
            BatchEntry {
                address: "France".to_string(),
                data: BatchOutcome::Rejected {
                    error: "The address: France is invalid, please enter a residential address"
                        .to_string(),
                },
            },
        ];

        assert_eq!(
            serde_json::to_value(&entries).unwrap(),
            json!([
                {"address": "Leeds", "data": {"rating": "Very Poor", "score": 0.1}},
                {"address": "France", "data": {"error": "The address: France is invalid, please enter a residential address"}}
            ])
        );
    }
}
