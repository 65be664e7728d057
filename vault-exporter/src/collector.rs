//! Collector translating one Vault health query into gauge samples.

use std::sync::Arc;

use tracing::{debug, error};

use crate::health::{HealthSnapshot, HealthSource};
use crate::metrics::{
    DESCRIPTORS, Descriptor, INFO, INITIALIZED, SEALED, STANDBY, Sample, UP, bool_to_gauge,
};

/// Collects Vault health on every scrape.
///
/// Holds nothing but the immutable health source, so a single instance can
/// serve any number of concurrent scrapes.
#[derive(Debug)]
pub struct VaultCollector<S> {
    source: S,
}

impl<S: HealthSource> VaultCollector<S> {
    /// Create a new collector around a health source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Every metric this collector can ever emit. Does not contact Vault.
    pub fn describe(&self) -> &'static [&'static Descriptor] {
        &DESCRIPTORS
    }

    /// Query Vault once and translate the outcome into samples.
    ///
    /// On failure only `vault_up 0` is returned.
    pub async fn collect(&self) -> Vec<Sample> {
        match self.source.fetch_health().await {
            Ok(health) => {
                debug!(
                    initialized = health.initialized,
                    sealed = health.sealed,
                    standby = health.standby,
                    version = %health.version,
                    "Collected Vault health"
                );
                health_samples(&health)
            }
            Err(e) => {
                error!(error = %e, "Failed to collect health from Vault server");
                vec![Sample::gauge(&UP, 0.0)]
            }
        }
    }

    /// Access the underlying health source.
    pub fn source(&self) -> &S {
        &self.source
    }
}

/// Shareable collector handle.
pub type SharedCollector<S> = Arc<VaultCollector<S>>;

fn health_samples(health: &HealthSnapshot) -> Vec<Sample> {
    vec![
        Sample::gauge(&UP, 1.0),
        Sample::gauge(&INITIALIZED, bool_to_gauge(health.initialized)),
        Sample::gauge(&SEALED, bool_to_gauge(health.sealed)),
        Sample::gauge(&STANDBY, bool_to_gauge(health.standby)),
        Sample::labeled(
            &INFO,
            vec![
                health.version.clone(),
                health.cluster_name.clone(),
                health.cluster_id.clone(),
            ],
            1.0,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::FetchError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    /// Health source replaying a scripted sequence of outcomes.
    struct Scripted {
        outcomes: Mutex<VecDeque<Result<HealthSnapshot, FetchError>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<HealthSnapshot, FetchError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl HealthSource for Scripted {
        async fn fetch_health(&self) -> Result<HealthSnapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .pop_front()
                .expect("no scripted outcome left")
        }
    }

    fn healthy() -> HealthSnapshot {
        HealthSnapshot {
            initialized: true,
            sealed: false,
            standby: false,
            version: "1.2.3".to_string(),
            cluster_name: "c1".to_string(),
            cluster_id: "abc".to_string(),
            ..Default::default()
        }
    }

    fn unavailable() -> FetchError {
        FetchError::Status {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body: "connection refused".to_string(),
        }
    }

    fn value_of(samples: &[Sample], name: &str) -> Option<f64> {
        samples.iter().find(|s| s.name() == name).map(|s| s.value)
    }

    #[tokio::test]
    async fn test_collect_success_emits_five_samples() {
        let collector = VaultCollector::new(Scripted::new(vec![Ok(healthy())]));

        let samples = collector.collect().await;

        let names: Vec<_> = samples.iter().map(Sample::name).collect();
        assert_eq!(
            names,
            vec![
                "vault_up",
                "vault_initialized",
                "vault_sealed",
                "vault_standby",
                "vault_info"
            ]
        );
        assert_eq!(value_of(&samples, "vault_up"), Some(1.0));
        assert_eq!(value_of(&samples, "vault_initialized"), Some(1.0));
        assert_eq!(value_of(&samples, "vault_sealed"), Some(0.0));
        assert_eq!(value_of(&samples, "vault_standby"), Some(0.0));

        let info = &samples[4];
        assert_eq!(info.value, 1.0);
        assert_eq!(info.label_values, vec!["1.2.3", "c1", "abc"]);
    }

    #[tokio::test]
    async fn test_collect_failure_emits_only_down() {
        let collector = VaultCollector::new(Scripted::new(vec![Err(unavailable())]));

        let samples = collector.collect().await;

        assert_eq!(samples, vec![Sample::gauge(&UP, 0.0)]);
    }

    #[tokio::test]
    async fn test_collect_calls_source_once_per_cycle() {
        let collector = VaultCollector::new(Scripted::new(vec![Ok(healthy()), Err(unavailable())]));

        collector.collect().await;
        assert_eq!(collector.source().calls.load(Ordering::SeqCst), 1);

        collector.collect().await;
        assert_eq!(collector.source().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_then_success_has_no_residual_state() {
        let collector = VaultCollector::new(Scripted::new(vec![Err(unavailable()), Ok(healthy())]));

        let first = collector.collect().await;
        assert_eq!(first.len(), 1);

        let second = collector.collect().await;
        assert_eq!(second.len(), 5);
        assert_eq!(value_of(&second, "vault_up"), Some(1.0));
    }

    #[tokio::test]
    async fn test_boolean_gauges_are_zero_or_one() {
        let flags = [false, true];
        let mut outcomes = Vec::new();
        for initialized in flags {
            for sealed in flags {
                for standby in flags {
                    outcomes.push(Ok(HealthSnapshot {
                        initialized,
                        sealed,
                        standby,
                        ..healthy()
                    }));
                }
            }
        }
        let cycles = outcomes.len();
        let collector = VaultCollector::new(Scripted::new(outcomes));

        for _ in 0..cycles {
            let samples = collector.collect().await;
            for name in ["vault_initialized", "vault_sealed", "vault_standby"] {
                let value = value_of(&samples, name).unwrap();
                assert!(value == 0.0 || value == 1.0, "{} was {}", name, value);
            }
        }
    }

    #[tokio::test]
    async fn test_info_value_constant_regardless_of_labels() {
        let odd = HealthSnapshot {
            version: String::new(),
            cluster_name: "name with \"quotes\"".to_string(),
            cluster_id: "\n".to_string(),
            ..healthy()
        };
        let collector = VaultCollector::new(Scripted::new(vec![Ok(odd)]));

        let samples = collector.collect().await;

        assert_eq!(value_of(&samples, "vault_info"), Some(1.0));
    }

    #[tokio::test]
    async fn test_describe_does_not_fetch() {
        let collector = VaultCollector::new(Scripted::new(vec![]));

        let descriptors = collector.describe();

        assert_eq!(descriptors.len(), 5);
        assert_eq!(descriptors[0].name, "vault_up");
        assert_eq!(descriptors[4].name, "vault_info");
        assert_eq!(collector.source().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_collect() {
        let outcomes = (0..50)
            .map(|i| if i % 2 == 0 { Ok(healthy()) } else { Err(unavailable()) })
            .collect();
        let collector = Arc::new(VaultCollector::new(Scripted::new(outcomes)));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let collector = collector.clone();
                tokio::spawn(async move { collector.collect().await.len() })
            })
            .collect();

        let mut up = 0;
        let mut down = 0;
        for handle in handles {
            match handle.await.unwrap() {
                5 => up += 1,
                1 => down += 1,
                n => panic!("unexpected sample count {}", n),
            }
        }

        assert_eq!(up, 25);
        assert_eq!(down, 25);
    }
}
