// ABOUTME: Polling waiter that blocks until a stack reaches a terminal condition.
// ABOUTME: Classifies statuses per condition and enforces an overall timeout.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use super::error::GatewayError;
use super::traits::StackGateway;
use crate::types::{StackName, StackStatus};

/// Terminal conditions a caller can wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    CreateComplete,
    UpdateComplete,
    DeleteComplete,
}

impl WaitCondition {
    pub fn name(&self) -> &'static str {
        match self {
            WaitCondition::CreateComplete => "stack_create_complete",
            WaitCondition::UpdateComplete => "stack_update_complete",
            WaitCondition::DeleteComplete => "stack_delete_complete",
        }
    }

    fn evaluate(&self, status: &StackStatus) -> Progress {
        use StackStatus::*;

        match (self, status) {
            (WaitCondition::CreateComplete, CreateComplete) => Progress::Reached,
            (
                WaitCondition::CreateComplete,
                CreateFailed | DeleteComplete | DeleteFailed | RollbackFailed | RollbackComplete,
            ) => Progress::Failed,
            (WaitCondition::UpdateComplete, UpdateComplete) => Progress::Reached,
            (
                WaitCondition::UpdateComplete,
                UpdateFailed | UpdateRollbackFailed | UpdateRollbackComplete,
            ) => Progress::Failed,
            (WaitCondition::DeleteComplete, DeleteComplete) => Progress::Reached,
            (WaitCondition::DeleteComplete, DeleteFailed) => Progress::Failed,
            _ => Progress::Pending,
        }
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

enum Progress {
    Reached,
    Failed,
    Pending,
}

/// How often to poll and how long to wait overall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for WaitPolicy {
    /// The provider's stock waiter budget: 120 polls, 30 seconds apart.
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            timeout: Duration::from_secs(60 * 60),
        }
    }
}

/// Terminal non-success outcomes of a wait.
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("{stack} reached {status} while waiting for {condition}")]
    Failed {
        stack: String,
        condition: WaitCondition,
        status: StackStatus,
    },

    #[error("timed out after {}s waiting for {stack} to reach {condition}", elapsed.as_secs())]
    Timeout {
        stack: String,
        condition: WaitCondition,
        elapsed: Duration,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Poll `describe_stack` until `condition` is reached, fails, or times out.
pub async fn poll_until<G: StackGateway + ?Sized>(
    gateway: &G,
    name: &StackName,
    condition: WaitCondition,
    policy: &WaitPolicy,
) -> Result<StackStatus, WaitError> {
    let start = Instant::now();
    tracing::debug!("waiting for {} on {}", condition, name);

    loop {
        let status = match gateway.describe_stack(name).await? {
            Some(description) => description.status,
            // A stack that vanished is as deleted as it gets.
            None => Some(StackStatus::DeleteComplete),
        };

        if let Some(status) = status {
            match condition.evaluate(&status) {
                Progress::Reached => {
                    tracing::debug!("{} obtained for {}", condition, name);
                    return Ok(status);
                }
                Progress::Failed => {
                    tracing::debug!("{} reached {} waiting for {}", name, status, condition);
                    return Err(WaitError::Failed {
                        stack: name.to_string(),
                        condition,
                        status,
                    });
                }
                Progress::Pending if status.is_in_progress() => {
                    tracing::trace!("{} is {}", name, status);
                }
                Progress::Pending => {
                    tracing::debug!(
                        "{} is {}, which is not terminal for {}; still waiting",
                        name,
                        status,
                        condition
                    );
                }
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= policy.timeout {
            return Err(WaitError::Timeout {
                stack: name.to_string(),
                condition,
                elapsed,
            });
        }

        tokio::time::sleep(policy.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{StackArgs, StackDescription};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Gateway whose describe calls replay a fixed script of statuses.
    struct Scripted {
        replies: Mutex<VecDeque<Option<&'static str>>>,
    }

    impl Scripted {
        fn new(replies: &[Option<&'static str>]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().copied().collect()),
            }
        }
    }

    #[async_trait]
    impl StackGateway for Scripted {
        async fn describe_stack(
            &self,
            _name: &StackName,
        ) -> Result<Option<StackDescription>, GatewayError> {
            let reply = self.replies.lock().unwrap().pop_front().flatten();
            Ok(reply.map(|s| StackDescription {
                status: Some(StackStatus::parse(s)),
                outputs: Default::default(),
            }))
        }

        async fn create_stack(&self, _args: &StackArgs) -> Result<(), GatewayError> {
            unreachable!()
        }

        async fn update_stack(&self, _args: &StackArgs) -> Result<(), GatewayError> {
            unreachable!()
        }

        async fn delete_stack(&self, _name: &StackName) -> Result<(), GatewayError> {
            unreachable!()
        }

        async fn wait_until(
            &self,
            _name: &StackName,
            _condition: WaitCondition,
        ) -> Result<StackStatus, WaitError> {
            unreachable!()
        }
    }

    fn fast() -> WaitPolicy {
        WaitPolicy {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
        }
    }

    fn name() -> StackName {
        StackName::new("app").unwrap()
    }

    #[tokio::test]
    async fn create_waits_through_in_progress() {
        let gateway = Scripted::new(&[
            Some("CREATE_IN_PROGRESS"),
            Some("CREATE_IN_PROGRESS"),
            Some("CREATE_COMPLETE"),
        ]);
        let status = poll_until(&gateway, &name(), WaitCondition::CreateComplete, &fast())
            .await
            .unwrap();
        assert_eq!(status, StackStatus::CreateComplete);
    }

    #[tokio::test]
    async fn settled_status_of_another_operation_keeps_waiting() {
        let gateway = Scripted::new(&[
            Some("CREATE_COMPLETE"),
            Some("UPDATE_IN_PROGRESS"),
            Some("UPDATE_COMPLETE"),
        ]);
        let status = poll_until(&gateway, &name(), WaitCondition::UpdateComplete, &fast())
            .await
            .unwrap();
        assert_eq!(status, StackStatus::UpdateComplete);
    }

    #[tokio::test]
    async fn create_rollback_is_a_failure() {
        let gateway = Scripted::new(&[Some("ROLLBACK_IN_PROGRESS"), Some("ROLLBACK_COMPLETE")]);
        let err = poll_until(&gateway, &name(), WaitCondition::CreateComplete, &fast())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WaitError::Failed {
                status: StackStatus::RollbackComplete,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn update_rollback_is_a_failure() {
        let gateway = Scripted::new(&[Some("UPDATE_ROLLBACK_COMPLETE")]);
        let err = poll_until(&gateway, &name(), WaitCondition::UpdateComplete, &fast())
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::Failed { .. }));
    }

    #[tokio::test]
    async fn delete_completes_when_stack_disappears() {
        let gateway = Scripted::new(&[Some("DELETE_IN_PROGRESS"), None]);
        let status = poll_until(&gateway, &name(), WaitCondition::DeleteComplete, &fast())
            .await
            .unwrap();
        assert_eq!(status, StackStatus::DeleteComplete);
    }

    #[tokio::test]
    async fn gives_up_after_timeout() {
        let gateway = Scripted::new(&[Some("UPDATE_IN_PROGRESS")]);
        let policy = WaitPolicy {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::ZERO,
        };
        let err = poll_until(&gateway, &name(), WaitCondition::UpdateComplete, &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::Timeout { .. }));
    }
}
