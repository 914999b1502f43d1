use std::future::Future;
use std::time::Duration;

/// Tunables shared by the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Upper bound on one compound operation.
    pub transaction_timeout: Duration,
    /// How many times a capacity release is tried before it is handed to the
    /// reconciliation log.
    pub compensation_max_attempts: u32,
    /// Base delay between release attempts; attempt `n` waits `n * backoff`.
    pub compensation_backoff: Duration,
    /// How many optimistic commits a toggle tries before giving up.
    pub toggle_max_attempts: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            transaction_timeout: Duration::from_millis(5000),
            compensation_max_attempts: 3,
            compensation_backoff: Duration::from_millis(50),
            toggle_max_attempts: 8,
        }
    }
}

impl ServiceSettings {
    pub(crate) fn deadline(&self) -> Deadline {
        Deadline(tokio::time::Instant::now() + self.transaction_timeout)
    }
}

/// End of the transaction window of one operation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline(tokio::time::Instant);

impl Deadline {
    fn expired(step: &'static str) -> crate::ServiceError {
        crate::ServiceError::Unavailable(format!(
            "{step} did not complete within the transaction window"
        ))
    }

    /// Runs a step of the operation, failing with `Unavailable` once the
    /// window has closed. The step's future is dropped on expiry.
    pub(crate) async fn run<T, E, F>(&self, step: &'static str, fut: F) -> crate::Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        crate::ServiceError: From<E>,
    {
        match tokio::time::timeout_at(self.0, fut).await {
            Ok(result) => result.map_err(crate::ServiceError::from),
            Err(_) => Err(Self::expired(step)),
        }
    }

    /// Runs a step that may commit, failing with `Unavailable` once the
    /// window has closed.
    ///
    /// A step still in flight at expiry is not dropped: it may already have
    /// committed. It is moved to a background task, and `settle` receives its
    /// eventual outcome to undo whatever did commit. Within the window the
    /// step's own outcome is returned untouched.
    pub(crate) async fn run_or_settle<T, E, F, S, SF>(
        &self,
        step: &'static str,
        fut: F,
        settle: S,
    ) -> crate::Result<std::result::Result<T, E>>
    where
        F: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
        S: FnOnce(std::result::Result<T, E>) -> SF + Send + 'static,
        SF: Future<Output = ()> + Send + 'static,
    {
        let mut fut = Box::pin(fut);
        match tokio::time::timeout_at(self.0, &mut fut).await {
            Ok(result) => Ok(result),
            Err(_) => {
                tracing::warn!(step, "step outlived the transaction window, settling it in the background");
                tokio::spawn(async move { settle(fut.await).await });
                Err(Self::expired(step))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn expired_window_is_unavailable() {
        let settings = ServiceSettings {
            transaction_timeout: Duration::from_millis(10),
            ..ServiceSettings::default()
        };
        let deadline = settings.deadline();

        let result: crate::Result<()> = deadline
            .run("slow step", async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, crate::ServiceError>(())
            })
            .await;

        assert!(matches!(result, Err(crate::ServiceError::Unavailable(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn late_step_is_settled_not_dropped() {
        let settings = ServiceSettings {
            transaction_timeout: Duration::from_millis(10),
            ..ServiceSettings::default()
        };
        let (tx, rx) = tokio::sync::oneshot::channel();

        let result = settings
            .deadline()
            .run_or_settle(
                "slow write",
                async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<_, crate::ServiceError>(42)
                },
                move |late| async move {
                    let _ = tx.send(late.ok());
                },
            )
            .await;

        assert!(matches!(result, Err(crate::ServiceError::Unavailable(_))));
        assert_eq!(rx.await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn settled_step_within_window_returns_its_outcome() {
        let outcome = ServiceSettings::default()
            .deadline()
            .run_or_settle(
                "fast write",
                async { Err::<(), _>("rejected") },
                |_| async {},
            )
            .await
            .unwrap();
        assert_eq!(outcome, Err("rejected"));
    }

    #[tokio::test]
    async fn step_result_passes_through() {
        let deadline = ServiceSettings::default().deadline();
        let value = deadline
            .run("fast step", async { Ok::<_, crate::ServiceError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
