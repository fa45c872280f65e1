//! Tests for the weighted status picker

use super::*;
use axum::http::StatusCode;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

fn default_picker() -> StatusPicker {
    StatusPicker::with_default_choices().expect("built-in table is valid")
}

#[test]
fn test_default_table_matches_population() {
    let from_population =
        StatusPicker::from_population(&[200, 200, 200, 200, 200, 400, 500, 502, 503])
            .expect("population is valid");

    assert_eq!(default_picker().choices(), from_population.choices());
    assert_eq!(from_population.total_weight(), 9);
}

#[test]
fn test_from_population_keeps_first_appearance_order() {
    let picker = StatusPicker::from_population(&[503, 200, 503, 200, 200]).expect("valid");

    assert_eq!(
        picker.choices(),
        &[(StatusCode::SERVICE_UNAVAILABLE, 2), (StatusCode::OK, 3)]
    );
}

#[test]
fn test_echoes_every_allowed_code() {
    let picker = default_picker();

    for code in [200u16, 400, 500, 502, 503] {
        let picked = picker.pick(Some(&code.to_string()));
        assert_eq!(picked.as_u16(), code, "allowed code {} should be echoed", code);
    }
}

#[test]
fn test_invalid_input_degrades_to_bad_request() {
    let picker = default_picker();

    for value in ["abc", "201", "404", "-200", "200.0", " 200", "99999999999", "RANDOM"] {
        assert_eq!(
            picker.pick(Some(value)),
            StatusCode::BAD_REQUEST,
            "{:?} should fall back to 400",
            value
        );
    }
}

#[test]
fn test_leading_plus_and_zeros_parse_as_base_10() {
    let picker = default_picker();

    assert_eq!(picker.pick(Some("+502")), StatusCode::BAD_GATEWAY);
    assert_eq!(picker.pick(Some("0500")), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_random_requests_stay_within_table() {
    let picker = default_picker();
    let mut rng = StdRng::seed_from_u64(7);

    for requested in [None, Some(""), Some(RANDOM_TOKEN)] {
        for _ in 0..200 {
            let picked = picker.pick_with(requested, &mut rng);
            assert!(
                picker.contains(picked.as_u16()),
                "{} is not an allowed code",
                picked
            );
        }
    }
}

#[test]
fn test_random_distribution_follows_weights() {
    let picker = default_picker();
    let mut rng = StdRng::seed_from_u64(42);
    let trials = 90_000;

    let mut counts: HashMap<u16, u32> = HashMap::new();
    for _ in 0..trials {
        *counts.entry(picker.pick_with(None, &mut rng).as_u16()).or_default() += 1;
    }

    for (code, expected) in [
        (200u16, 5.0 / 9.0),
        (400, 1.0 / 9.0),
        (500, 1.0 / 9.0),
        (502, 1.0 / 9.0),
        (503, 1.0 / 9.0),
    ] {
        let observed = f64::from(counts.get(&code).copied().unwrap_or(0)) / f64::from(trials);
        assert!(
            (observed - expected).abs() < 0.01,
            "code {}: observed {:.4}, expected {:.4}",
            code,
            observed,
            expected
        );
        assert!((picker.probability(code) - expected).abs() < f64::EPSILON);
    }
}

#[test]
fn test_probability_of_unknown_code_is_zero() {
    assert_eq!(default_picker().probability(404), 0.0);
}

#[test]
fn test_single_entry_table_always_picks_it() {
    let picker = StatusPicker::new(vec![(418, 3)]).expect("valid");
    let mut rng = StdRng::seed_from_u64(1);

    for _ in 0..50 {
        assert_eq!(picker.pick_with(None, &mut rng), StatusCode::IM_A_TEAPOT);
    }
}

#[test]
fn test_rejects_invalid_tables() {
    assert!(matches!(StatusPicker::new(vec![]), Err(PickerError::Empty)));
    assert!(matches!(
        StatusPicker::from_population(&[]),
        Err(PickerError::Empty)
    ));
    assert!(matches!(
        StatusPicker::new(vec![(42, 1)]),
        Err(PickerError::InvalidCode(42))
    ));
    assert!(matches!(
        StatusPicker::new(vec![(200, 1), (500, 0)]),
        Err(PickerError::ZeroWeight(500))
    ));
    assert!(matches!(
        StatusPicker::new(vec![(200, 1), (200, 2)]),
        Err(PickerError::DuplicateCode(200))
    ));
}
