//! Registry behavior driven by TOML configuration.

use std::time::{Duration, Instant};

use circuit_stats::config::loader::parse_config;
use circuit_stats::config::watcher::apply_updates;
use circuit_stats::{CircuitKey, ConfigError, Outcome, RegistrationOptions, Registry};
use tokio::sync::mpsc;

const CONFIG: &str = r#"
[rolling]
bucket_duration_ms = 100
num_buckets = 10

[circuits.reports]
track_fallback = false

[circuits.reports.rolling]
bucket_duration_ms = 10
num_buckets = 2
"#;

#[test]
fn test_window_comes_from_config() {
    let registry = Registry::new(parse_config(CONFIG).unwrap()).unwrap();
    let reports = registry.bundles_for("reports").unwrap();
    let orders = registry.bundles_for("orders").unwrap();
    let t = Instant::now();

    reports.report(Outcome::Failure, t);
    orders.report(Outcome::Failure, t);

    // 20ms window vs 1s window.
    let later = t + Duration::from_millis(200);
    assert_eq!(reports.command().errors_at(later), 0);
    assert_eq!(orders.command().errors_at(later), 1);
    assert_eq!(reports.command().err_failures.total_sum(), 1);
    assert!(reports.fallback().is_none());
    assert!(orders.fallback().is_some());
}

#[test]
fn test_invalid_config_fails_registration() {
    let err = parse_config("[circuits.x.rolling]\nnum_buckets = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));

    let registry = Registry::new(parse_config(CONFIG).unwrap()).unwrap();
    let options = RegistrationOptions {
        prefix: "ops".into(),
        rolling: Some(circuit_stats::RollingConfig::new(Duration::ZERO, 3)),
        track_fallback: None,
    };
    assert!(registry.register("x", options).is_err());
    assert!(registry.find(&CircuitKey::with_prefix("ops", "x")).is_none());
}

#[tokio::test]
async fn test_reload_applies_to_new_circuits() {
    let registry = Registry::new(parse_config(CONFIG).unwrap()).unwrap();
    let early = registry.bundles_for("early").unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(parse_config("[rolling]\nnum_buckets = 3\n").unwrap()).unwrap();
    drop(tx);
    apply_updates(&registry, rx).await;

    let late = registry.bundles_for("late").unwrap();
    assert_eq!(early.command().rolling_config().num_buckets, 10);
    assert_eq!(late.command().rolling_config().num_buckets, 3);
}
