use anyhow::Context;
use crossterm::event::KeyEvent;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::task::spawn_blocking;
use tokio::time::timeout;

use crate::model::{ContextCatalog, NamespaceSummary, PodDetail, PodSummary};

/// Failure of a backend or context store call. Timeouts and backend errors are
/// handled the same way by every screen.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum CollaboratorError {
    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },
    #[error("{operation} failed: {message}")]
    Failed { operation: String, message: String },
}

impl CollaboratorError {
    pub fn failed(operation: impl Into<String>, error: &anyhow::Error) -> Self {
        Self::Failed {
            operation: operation.into(),
            message: format!("{error:#}"),
        }
    }
}

/// Runs a collaborator call under a time bound and folds both failure kinds into
/// a [`CollaboratorError`].
pub async fn bounded<T, F>(operation: &str, limit: Duration, call: F) -> Result<T, CollaboratorError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(CollaboratorError::failed(operation, &error)),
        Err(_) => Err(CollaboratorError::Timeout {
            operation: operation.to_string(),
            seconds: limit.as_secs(),
        }),
    }
}

/// Runs a synchronous call on the blocking pool. Awaiting it inside [`bounded`]
/// lets the time bound fire while the call is still stuck on file I/O.
pub async fn blocking<T, F>(call: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    spawn_blocking(call)
        .await
        .context("blocking call did not complete")?
}

/// Monotonic tag attached to a data-loading effect.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Generation(u64);

#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    latest: u64,
}

impl GenerationCounter {
    pub fn issue(&mut self) -> Generation {
        self.latest += 1;
        Generation(self.latest)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation.0 == self.latest
    }
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,
    ContextsLoaded {
        generation: Generation,
        result: Result<ContextCatalog, CollaboratorError>,
    },
    ContextSwitched {
        context: String,
        result: Result<(), CollaboratorError>,
    },
    ContextDeleted {
        context: String,
        result: Result<(), CollaboratorError>,
    },
    NamespacesLoaded {
        generation: Generation,
        result: Result<Vec<NamespaceSummary>, CollaboratorError>,
    },
    PodsLoaded {
        namespace: String,
        generation: Generation,
        result: Result<Vec<PodSummary>, CollaboratorError>,
    },
    PodLoaded {
        namespace: String,
        pod: String,
        generation: Generation,
        result: Result<PodDetail, CollaboratorError>,
    },
    PodDeleted {
        namespace: String,
        pod: String,
        result: Result<String, CollaboratorError>,
    },
}

#[cfg(test)]
mod tests {
    use super::{CollaboratorError, GenerationCounter, blocking, bounded};
    use std::time::Duration;

    #[test]
    fn only_the_latest_generation_is_current() {
        let mut counter = GenerationCounter::default();
        let first = counter.issue();
        let second = counter.issue();
        assert!(!counter.is_current(first));
        assert!(counter.is_current(second));
        assert!(first < second);
    }

    #[tokio::test]
    async fn bounded_maps_errors_and_timeouts() {
        let ok = bounded("list pods", Duration::from_secs(1), async { Ok(3) }).await;
        assert_eq!(ok, Ok(3));

        let failed: Result<(), _> = bounded("list pods", Duration::from_secs(1), async {
            Err(anyhow::anyhow!("forbidden"))
        })
        .await;
        assert_eq!(
            failed,
            Err(CollaboratorError::Failed {
                operation: "list pods".to_string(),
                message: "forbidden".to_string(),
            })
        );

        let slow: Result<(), _> = bounded("get pod", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(slow, Err(CollaboratorError::Timeout { .. })));
        assert_eq!(
            slow.unwrap_err().to_string(),
            "get pod timed out after 0s"
        );
    }

    #[tokio::test]
    async fn bounded_interrupts_a_stuck_blocking_call() {
        let stuck: Result<(), _> = bounded("list contexts", Duration::from_millis(20), async {
            blocking(|| {
                std::thread::sleep(Duration::from_millis(500));
                Ok(())
            })
            .await
        })
        .await;
        assert!(matches!(stuck, Err(CollaboratorError::Timeout { .. })));

        let read = bounded("list contexts", Duration::from_secs(1), async {
            blocking(|| Ok(vec!["a".to_string()])).await
        })
        .await;
        assert_eq!(read, Ok(vec!["a".to_string()]));
    }

    #[tokio::test]
    async fn panicking_blocking_call_becomes_a_failure() {
        let result: Result<(), _> = bounded("delete context", Duration::from_secs(1), async {
            blocking(|| -> anyhow::Result<()> { panic!("kubeconfig lock poisoned") }).await
        })
        .await;
        assert!(matches!(
            result,
            Err(CollaboratorError::Failed { ref message, .. }) if message.starts_with("blocking call did not complete")
        ));
    }
}
