//! Validation tests for oxygen depletion kinetics
//!
//! The proportional model has a closed-form solution at constant dose
//! rate, so every numerical strategy is checked against it.
//!
//! Reference values (Petersson 2020):
//! - depletion k = 0.053 Gy⁻¹ (proportional), 0.000518 Gy⁻¹ (linear)
//! - recovery r = 1.0 s⁻¹

use flash_oxygen::kinetics::analytic;
use flash_oxygen::{
    oxygen_curve, oxygen_curve_with, DepletionModel, Exposure, FlashError, IntegrationMethod,
    IntegratorConfig, KineticsParameters, PulseTrain, REF_OX_DEP, REF_OX_REC,
};

// ============================================================================
// Reference scenario: 1 Gy at 10 Gy/s, fully oxic
// ============================================================================

#[test]
fn test_reference_scenario_depletes_measurably() {
    let exposure = Exposure::constant(1.0, 10.0, 1000).unwrap();
    let kinetics = KineticsParameters::default();
    let trajectory = oxygen_curve(&exposure, &kinetics).unwrap();

    // O(0.1 s) = r·b/λ + (b - r·b/λ)·exp(-λ·0.1), λ = k·Ḋ + r = 1.53
    let expected = 0.950_855_393_830_090_7;
    assert!(
        (trajectory.final_o2() - expected).abs() < 1e-12,
        "Final O2: {:.10} (expected {:.10})",
        trajectory.final_o2(),
        expected
    );
    assert_eq!(trajectory.o2[0], 1.0);
    assert!(trajectory.final_o2() < 0.99);
}

#[test]
fn test_trajectory_matches_closed_form_at_every_sample() {
    let exposure = Exposure::constant(5.0, 50.0, 200).unwrap();
    let kinetics = KineticsParameters::with_baseline(0.05);
    let trajectory = oxygen_curve(&exposure, &kinetics).unwrap();

    for (t, o2) in trajectory.iter() {
        let expected = analytic::oxygen_at(t, 50.0, &kinetics).unwrap();
        assert!(
            (o2 - expected).abs() < 1e-12,
            "t = {:.4} s: {:.8} vs {:.8}",
            t,
            o2,
            expected
        );
    }
}

// ============================================================================
// Bounds
// ============================================================================

#[test]
fn test_oxygen_stays_within_baseline() {
    let kinetics = KineticsParameters::with_baseline(0.04);
    for &rate in &[0.01, 1.0, 40.0, 1000.0, 1e6] {
        let exposure = Exposure::constant(10.0, rate, 100).unwrap();
        let trajectory = oxygen_curve(&exposure, &kinetics).unwrap();
        for (t, o2) in trajectory.iter() {
            assert!(
                (0.0..=0.04).contains(&o2),
                "O2 out of bounds at {} Gy/s, t = {}: {}",
                rate,
                t,
                o2
            );
        }
    }
}

#[test]
fn test_higher_dose_rate_depletes_more() {
    let kinetics = KineticsParameters::with_baseline(0.05);
    let mut last_min = f64::INFINITY;
    for &rate in &[0.1, 10.0, 100.0, 1000.0] {
        let exposure = Exposure::constant(10.0, rate, 200).unwrap();
        let min_o2 = oxygen_curve(&exposure, &kinetics).unwrap().min_o2();
        assert!(min_o2 < last_min, "{} Gy/s: min O2 {}", rate, min_o2);
        last_min = min_o2;
    }
}

// ============================================================================
// Limiting cases
// ============================================================================

#[test]
fn test_zero_depletion_is_pure_relaxation() {
    let kinetics = KineticsParameters {
        depletion_per_Gy: 0.0,
        initial_o2: Some(0.5),
        ..Default::default()
    };
    let exposure = Exposure::constant(20.0, 10.0, 50).unwrap();
    let trajectory = oxygen_curve(&exposure, &kinetics).unwrap();

    for (t, o2) in trajectory.iter() {
        let expected = 1.0 - 0.5 * (-REF_OX_REC * t).exp();
        assert!((o2 - expected).abs() < 1e-12, "t = {}: {} vs {}", t, o2, expected);
    }
}

#[test]
fn test_zero_recovery_never_increases() {
    let kinetics = KineticsParameters {
        recovery_per_sec: 0.0,
        ..Default::default()
    };
    let train = PulseTrain {
        dose_rate_Gy_per_sec: 1000.0,
        pulse_width_sec: 1e-3,
        period_sec: 0.1,
        n_pulses: 5,
        samples_per_pulse: 4,
    };
    let exposure = Exposure::pulsed(&train).unwrap();
    let trajectory = oxygen_curve(&exposure, &kinetics).unwrap();

    for pair in trajectory.o2.windows(2) {
        assert!(pair[1] <= pair[0], "O2 rose without recovery: {:?}", pair);
    }
    // Without recovery the depletion is exp(-k·D) regardless of timing
    let expected = (-REF_OX_DEP * train.total_dose_Gy()).exp();
    assert!((trajectory.final_o2() - expected).abs() < 1e-12);
}

#[test]
fn test_negative_recovery_is_rejected() {
    let kinetics = KineticsParameters {
        recovery_per_sec: -1.0,
        ..Default::default()
    };
    let exposure = Exposure::constant(1.0, 10.0, 10).unwrap();
    let result = oxygen_curve(&exposure, &kinetics);
    assert!(
        matches!(result, Err(FlashError::InvalidParameter { name: "recovery_per_sec", .. })),
        "Unexpected result: {:?}",
        result
    );
}

#[test]
fn test_initial_above_baseline_is_rejected() {
    let kinetics = KineticsParameters {
        initial_o2: Some(1.5),
        ..Default::default()
    };
    let exposure = Exposure::constant(1.0, 10.0, 10).unwrap();
    assert!(matches!(
        oxygen_curve(&exposure, &kinetics),
        Err(FlashError::InvalidParameter { name: "initial_o2", .. })
    ));
}

#[test]
fn test_oxygen_recovers_between_pulses() {
    let kinetics = KineticsParameters::with_baseline(0.05);
    let train = PulseTrain {
        dose_rate_Gy_per_sec: 1e5,
        pulse_width_sec: 1e-5,
        period_sec: 5.0,
        n_pulses: 2,
        samples_per_pulse: 2,
    };
    let exposure = Exposure::pulsed(&train).unwrap();
    let trajectory = oxygen_curve(&exposure, &kinetics).unwrap();

    // Samples: pulse 1 (0, mid, end), pulse 2 (start, mid, end)
    let after_first = trajectory.o2[2];
    let before_second = trajectory.o2[3];
    assert!(after_first < 0.05 * 0.96);
    assert!(
        (before_second - 0.05).abs() < 0.05 * 0.01,
        "O2 before second pulse: {} (baseline 0.05)",
        before_second
    );
}

// ============================================================================
// Linear depletion law
// ============================================================================

#[test]
fn test_linear_model_floors_at_zero() {
    let kinetics = KineticsParameters::linear(0.01);
    assert_eq!(kinetics.model, DepletionModel::Linear);

    // k·D = 0.0518 exceeds the 0.01 baseline
    let exposure = Exposure::constant(100.0, 1e5, 100).unwrap();
    let trajectory = oxygen_curve(&exposure, &kinetics).unwrap();

    assert!(trajectory.o2.iter().all(|&o2| o2 >= 0.0));
    assert!(trajectory.final_o2() < 1e-12, "Final O2: {}", trajectory.final_o2());
}

#[test]
fn test_linear_model_matches_closed_form() {
    let kinetics = KineticsParameters::linear(0.05);
    let exposure = Exposure::constant(10.0, 100.0, 100).unwrap();
    let trajectory = oxygen_curve(&exposure, &kinetics).unwrap();

    for (t, o2) in trajectory.iter() {
        let expected = analytic::oxygen_at(t, 100.0, &kinetics).unwrap();
        assert!((o2 - expected).abs() < 1e-12);
    }
}

// ============================================================================
// Numerical strategies against the exact solution
// ============================================================================

fn final_o2_with(method: IntegrationMethod) -> f64 {
    let exposure = Exposure::constant(10.0, 200.0, 20).unwrap();
    let kinetics = KineticsParameters::with_baseline(0.05);
    let config = IntegratorConfig::with_method(method);
    oxygen_curve_with(&exposure, &kinetics, &config).unwrap().final_o2()
}

#[test]
fn test_numerical_methods_agree_with_exact() {
    let exact = final_o2_with(IntegrationMethod::Exact);

    let cases = [
        (IntegrationMethod::Euler, 1e-2),
        (IntegrationMethod::RungeKutta4, 1e-7),
        (IntegrationMethod::AdaptiveRk4, 1e-7),
    ];
    for (method, tolerance) in cases {
        let numeric = final_o2_with(method);
        let relative = (numeric - exact).abs() / exact;
        assert!(
            relative < tolerance,
            "{:?}: {:.10} vs exact {:.10} (relative error {:.2e})",
            method,
            numeric,
            exact,
            relative
        );
    }
}

#[test]
fn test_invalid_integrator_config_is_rejected() {
    let exposure = Exposure::constant(1.0, 10.0, 10).unwrap();
    let config = IntegratorConfig {
        step_fraction: 0.0,
        ..IntegratorConfig::with_method(IntegrationMethod::Euler)
    };
    assert!(oxygen_curve_with(&exposure, &KineticsParameters::default(), &config).is_err());
}
