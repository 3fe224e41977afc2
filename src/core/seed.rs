use crate::domain::model::ServiceKind;
use crate::domain::ports::Seeder;
use crate::utils::error::{DevStackError, Result};
use crate::utils::monitor::ProcessMonitor;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum SeedOutcome {
    Ok { items: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedResult {
    pub service: ServiceKind,
    pub outcome: SeedOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
    pub results: Vec<SeedResult>,
}

impl SeedReport {
    pub fn failures(&self) -> impl Iterator<Item = &SeedResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, SeedOutcome::Failed { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn total_items(&self) -> usize {
        self.results
            .iter()
            .map(|r| match r.outcome {
                SeedOutcome::Ok { items } => items,
                SeedOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    /// `Err` naming the failed services when any seeder failed.
    pub fn into_result(self) -> Result<Self> {
        let failed: Vec<String> = self.failures().map(|r| r.service.to_string()).collect();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(DevStackError::ProcessingError {
                message: format!("seeding failed for {}", failed.join(", ")),
            })
        }
    }
}

/// Runs the seeders one after another; a failure is recorded and the next seeder still runs.
pub struct SeedEngine {
    seeders: Vec<Arc<dyn Seeder>>,
    monitor: ProcessMonitor,
}

impl SeedEngine {
    pub fn new(seeders: Vec<Arc<dyn Seeder>>) -> Self {
        Self::new_with_monitoring(seeders, false)
    }

    pub fn new_with_monitoring(seeders: Vec<Arc<dyn Seeder>>, monitor_enabled: bool) -> Self {
        Self {
            seeders,
            monitor: ProcessMonitor::new(monitor_enabled),
        }
    }

    /// Keeps only the seeders for `services`; an empty list keeps all.
    pub fn only(mut self, services: &[ServiceKind]) -> Self {
        if !services.is_empty() {
            self.seeders.retain(|s| services.contains(&s.target()));
        }
        self
    }

    pub async fn run(&self) -> SeedReport {
        tracing::info!("Seeding {} services", self.seeders.len());
        self.monitor.log_phase("Start");

        let mut report = SeedReport::default();
        for seeder in &self.seeders {
            let service = seeder.target();
            tracing::info!("Seeding {}...", service);

            let outcome = match seeder.seed().await {
                Ok(items) => {
                    tracing::info!("✅ {}: {} items", service, items);
                    SeedOutcome::Ok { items }
                }
                Err(e) => {
                    tracing::error!("❌ {} seeding failed: {}", service, e);
                    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                    SeedOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            self.monitor.log_phase(&format!("{} seeded", service));
            report.results.push(SeedResult { service, outcome });
        }

        self.monitor.log_summary();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeSeeder {
        service: ServiceKind,
        items: Option<usize>,
        calls: Arc<Mutex<Vec<ServiceKind>>>,
    }

    #[async_trait]
    impl Seeder for FakeSeeder {
        fn target(&self) -> ServiceKind {
            self.service
        }

        async fn seed(&self) -> Result<usize> {
            self.calls.lock().unwrap().push(self.service);
            self.items.ok_or_else(|| DevStackError::ServiceUnavailable {
                service: self.service.to_string(),
                details: "connection refused".to_string(),
            })
        }
    }

    fn seeders(
        plan: &[(ServiceKind, Option<usize>)],
    ) -> (Vec<Arc<dyn Seeder>>, Arc<Mutex<Vec<ServiceKind>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seeders = plan
            .iter()
            .map(|(service, items)| {
                Arc::new(FakeSeeder {
                    service: *service,
                    items: *items,
                    calls: calls.clone(),
                }) as Arc<dyn Seeder>
            })
            .collect();
        (seeders, calls)
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_seeders() {
        let (seeders, calls) = seeders(&[
            (ServiceKind::Redis, Some(14)),
            (ServiceKind::Postgres, None),
            (ServiceKind::Elasticsearch, Some(5)),
        ]);

        let report = SeedEngine::new(seeders).run().await;
        assert_eq!(calls.lock().unwrap().len(), 3);
        assert!(!report.is_success());
        assert_eq!(report.total_items(), 19);
        assert_eq!(report.failures().count(), 1);

        let err = report.into_result().unwrap_err();
        assert!(err.to_string().contains("PostgreSQL"));
    }

    #[tokio::test]
    async fn test_only_restricts_and_keeps_order() {
        let (seeders, calls) = seeders(&[
            (ServiceKind::Redis, Some(1)),
            (ServiceKind::Postgres, Some(2)),
            (ServiceKind::Qdrant, Some(5)),
        ]);

        let report = SeedEngine::new(seeders)
            .only(&[ServiceKind::Qdrant, ServiceKind::Redis])
            .run()
            .await;
        assert_eq!(*calls.lock().unwrap(), vec![ServiceKind::Redis, ServiceKind::Qdrant]);
        assert!(report.into_result().is_ok());
    }
}
