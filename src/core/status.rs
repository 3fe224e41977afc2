use crate::domain::model::{DataSummary, ServiceKind, ServiceStatus};
use crate::domain::ports::Backend;
use crate::utils::error::{DevStackError, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// One round of probes, in backend order.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub checked_at: DateTime<Local>,
    pub statuses: Vec<ServiceStatus>,
}

impl StatusReport {
    pub fn connected_count(&self) -> usize {
        self.statuses.iter().filter(|s| s.healthy).count()
    }

    pub fn all_healthy(&self) -> bool {
        !self.statuses.is_empty() && self.statuses.iter().all(|s| s.healthy)
    }

    pub fn get(&self, service: ServiceKind) -> Option<&ServiceStatus> {
        self.statuses.iter().find(|s| s.service == service)
    }

    /// Fails with the first listed service that is not healthy.
    pub fn require(&self, services: &[ServiceKind]) -> Result<()> {
        for service in services {
            match self.get(*service) {
                Some(status) if status.healthy => continue,
                Some(status) => {
                    return Err(DevStackError::ServiceUnavailable {
                        service: service.to_string(),
                        details: status.details.clone(),
                    })
                }
                None => {
                    return Err(DevStackError::ServiceUnavailable {
                        service: service.to_string(),
                        details: "not probed".to_string(),
                    })
                }
            }
        }
        Ok(())
    }
}

struct CachedReport {
    taken: Instant,
    report: StatusReport,
}

/// Probes all backends concurrently and keeps the result for `ttl`.
pub struct StatusManager {
    backends: Vec<Arc<dyn Backend>>,
    ttl: Duration,
    cache: Mutex<Option<CachedReport>>,
}

impl StatusManager {
    pub fn new(backends: Vec<Arc<dyn Backend>>, ttl: Duration) -> Self {
        Self {
            backends,
            ttl,
            cache: Mutex::new(None),
        }
    }

    pub async fn check_all(&self) -> StatusReport {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.taken.elapsed() < self.ttl {
                tracing::debug!("Using cached status from {}", cached.report.checked_at);
                return cached.report.clone();
            }
        }

        let report = self.probe().await;
        *cache = Some(CachedReport {
            taken: Instant::now(),
            report: report.clone(),
        });
        report
    }

    /// Drops the cached result and probes again.
    pub async fn refresh(&self) -> StatusReport {
        self.cache.lock().await.take();
        self.check_all().await
    }

    async fn probe(&self) -> StatusReport {
        let handles: Vec<_> = self
            .backends
            .iter()
            .map(|backend| {
                let backend = Arc::clone(backend);
                (
                    backend.kind(),
                    tokio::spawn(async move { backend.check_connection().await }),
                )
            })
            .collect();

        let mut statuses = Vec::with_capacity(handles.len());
        for (kind, handle) in handles {
            let status = match handle.await {
                Ok(status) => status,
                Err(e) => ServiceStatus::unhealthy(kind, format!("probe aborted: {}", e), 0),
            };
            tracing::debug!(
                "{}: healthy={} ({} ms) {}",
                status.service,
                status.healthy,
                status.latency_ms,
                status.details
            );
            statuses.push(status);
        }

        StatusReport {
            checked_at: Local::now(),
            statuses,
        }
    }
}

/// Data summary per backend; a failing backend is reported as unavailable.
pub async fn collect_summaries(backends: &[Arc<dyn Backend>]) -> Vec<DataSummary> {
    let mut summaries = Vec::with_capacity(backends.len());
    for backend in backends {
        let summary = match backend.data_summary().await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("{} summary failed: {}", backend.kind(), e);
                DataSummary::unavailable(backend.kind(), e.to_string())
            }
        };
        summaries.push(summary);
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeBackend {
        kind: ServiceKind,
        healthy: bool,
        probes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Backend for FakeBackend {
        fn kind(&self) -> ServiceKind {
            self.kind
        }

        async fn check_connection(&self) -> ServiceStatus {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if self.healthy {
                ServiceStatus::healthy(self.kind, 1)
            } else {
                ServiceStatus::unhealthy(self.kind, "connection refused", 1)
            }
        }

        async fn data_summary(&self) -> Result<DataSummary> {
            Ok(DataSummary::new(self.kind))
        }
    }

    fn manager(healthy: &[(ServiceKind, bool)], ttl: Duration) -> (StatusManager, Arc<AtomicUsize>) {
        let probes = Arc::new(AtomicUsize::new(0));
        let backends = healthy
            .iter()
            .map(|(kind, healthy)| {
                Arc::new(FakeBackend {
                    kind: *kind,
                    healthy: *healthy,
                    probes: probes.clone(),
                }) as Arc<dyn Backend>
            })
            .collect();
        (StatusManager::new(backends, ttl), probes)
    }

    #[tokio::test]
    async fn test_results_are_cached_until_refresh() {
        let (manager, probes) = manager(
            &[(ServiceKind::Redis, true), (ServiceKind::Qdrant, true)],
            Duration::from_secs(30),
        );

        manager.check_all().await;
        manager.check_all().await;
        assert_eq!(probes.load(Ordering::SeqCst), 2);

        manager.refresh().await;
        assert_eq!(probes.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_probes() {
        let (manager, probes) = manager(&[(ServiceKind::Redis, true)], Duration::ZERO);
        manager.check_all().await;
        manager.check_all().await;
        assert_eq!(probes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_report_keeps_backend_order_and_counts() {
        let (manager, _) = manager(
            &[
                (ServiceKind::Redis, true),
                (ServiceKind::Postgres, false),
                (ServiceKind::Elasticsearch, true),
                (ServiceKind::Qdrant, false),
            ],
            Duration::from_secs(30),
        );

        let report = manager.check_all().await;
        let order: Vec<_> = report.statuses.iter().map(|s| s.service).collect();
        assert_eq!(order, ServiceKind::ALL.to_vec());
        assert_eq!(report.connected_count(), 2);
        assert!(!report.all_healthy());
    }

    #[tokio::test]
    async fn test_require_names_first_unhealthy_service() {
        let (manager, _) = manager(
            &[(ServiceKind::Redis, true), (ServiceKind::Postgres, false)],
            Duration::from_secs(30),
        );
        let report = manager.check_all().await;

        assert!(report.require(&[ServiceKind::Redis]).is_ok());
        match report.require(&[ServiceKind::Redis, ServiceKind::Postgres]) {
            Err(DevStackError::ServiceUnavailable { service, details }) => {
                assert_eq!(service, "PostgreSQL");
                assert_eq!(details, "connection refused");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(report.require(&[ServiceKind::Qdrant]).is_err());
    }
}
