// ABOUTME: Test support utilities.
// ABOUTME: Provides an in-memory provider with a call log and tracing setup.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use cfnbot::gateway::{
    GatewayError, StackArgs, StackDescription, StackGateway, TemplateStore, WaitCondition,
    WaitError,
};
use cfnbot::types::{OutputMap, StackName, StackStatus};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("cfnbot=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// One remote call made against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Call {
    Describe(String),
    Create(String),
    Update(String),
    Delete(String),
    Wait(String, WaitCondition),
    Upload { bucket: String, file: String },
}

#[derive(Debug, Clone)]
struct RemoteStack {
    status: StackStatus,
    outputs: OutputMap,
}

/// In-memory provider. Stacks reach their terminal status as soon as they are waited on.
#[derive(Debug, Default)]
pub struct MockProvider {
    stacks: Mutex<BTreeMap<String, RemoteStack>>,
    outputs_on_create: BTreeMap<String, OutputMap>,
    unchanged: BTreeSet<String>,
    failing_create: BTreeSet<String>,
    failing_update: BTreeSet<String>,
    failing_delete: BTreeSet<String>,
    failing_wait: BTreeSet<String>,
    calls: Mutex<Vec<Call>>,
    submitted: Mutex<Vec<StackArgs>>,
    upload_expiry: Mutex<Option<Duration>>,
}

#[allow(dead_code)]
impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stack that already exists remotely.
    pub fn with_stack(self, name: &str, status: StackStatus, outputs: &[(&str, &str)]) -> Self {
        self.stacks.lock().unwrap().insert(
            name.to_string(),
            RemoteStack {
                status,
                outputs: to_map(outputs),
            },
        );
        self
    }

    /// Outputs a stack will report once created.
    pub fn with_outputs_on_create(mut self, name: &str, outputs: &[(&str, &str)]) -> Self {
        self.outputs_on_create
            .insert(name.to_string(), to_map(outputs));
        self
    }

    /// Updates to this stack report that nothing changed.
    pub fn unchanged(mut self, name: &str) -> Self {
        self.unchanged.insert(name.to_string());
        self
    }

    pub fn failing_create(mut self, name: &str) -> Self {
        self.failing_create.insert(name.to_string());
        self
    }

    pub fn failing_update(mut self, name: &str) -> Self {
        self.failing_update.insert(name.to_string());
        self
    }

    pub fn failing_delete(mut self, name: &str) -> Self {
        self.failing_delete.insert(name.to_string());
        self
    }

    /// Waits on this stack end in a rollback.
    pub fn failing_wait(mut self, name: &str) -> Self {
        self.failing_wait.insert(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than describes, in order.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Describe(_)))
            .collect()
    }

    pub fn wait_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Wait(..)))
            .count()
    }

    /// Arguments of every accepted create or update, in order.
    pub fn submitted(&self) -> Vec<StackArgs> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn upload_expiry(&self) -> Option<Duration> {
        *self.upload_expiry.lock().unwrap()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.stacks.lock().unwrap().contains_key(name)
    }

    pub fn status_of(&self, name: &str) -> Option<StackStatus> {
        self.stacks
            .lock()
            .unwrap()
            .get(name)
            .map(|s| s.status.clone())
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn to_map(pairs: &[(&str, &str)]) -> OutputMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn rejected(operation: &'static str, stack: &str) -> GatewayError {
    GatewayError::Service {
        operation,
        stack: stack.to_string(),
        message: "simulated failure".to_string(),
    }
}

#[async_trait]
impl StackGateway for MockProvider {
    async fn describe_stack(
        &self,
        name: &StackName,
    ) -> Result<Option<StackDescription>, GatewayError> {
        self.record(Call::Describe(name.to_string()));
        Ok(self
            .stacks
            .lock()
            .unwrap()
            .get(name.as_str())
            .map(|s| StackDescription {
                status: Some(s.status.clone()),
                outputs: s.outputs.clone(),
            }))
    }

    async fn create_stack(&self, args: &StackArgs) -> Result<(), GatewayError> {
        let name = args.stack_name.to_string();
        self.record(Call::Create(name.clone()));
        if self.failing_create.contains(&name) {
            return Err(rejected("create_stack", &name));
        }
        self.submitted.lock().unwrap().push(args.clone());
        self.stacks.lock().unwrap().insert(
            name.clone(),
            RemoteStack {
                status: StackStatus::CreateInProgress,
                outputs: OutputMap::new(),
            },
        );
        Ok(())
    }

    async fn update_stack(&self, args: &StackArgs) -> Result<(), GatewayError> {
        let name = args.stack_name.to_string();
        self.record(Call::Update(name.clone()));
        if self.unchanged.contains(&name) {
            return Err(GatewayError::NoUpdates { stack: name });
        }
        if self.failing_update.contains(&name) {
            return Err(rejected("update_stack", &name));
        }
        self.submitted.lock().unwrap().push(args.clone());
        if let Some(stack) = self.stacks.lock().unwrap().get_mut(&name) {
            stack.status = StackStatus::UpdateInProgress;
        }
        Ok(())
    }

    async fn delete_stack(&self, name: &StackName) -> Result<(), GatewayError> {
        self.record(Call::Delete(name.to_string()));
        if self.failing_delete.contains(name.as_str()) {
            return Err(rejected("delete_stack", name.as_str()));
        }
        if let Some(stack) = self.stacks.lock().unwrap().get_mut(name.as_str()) {
            stack.status = StackStatus::DeleteInProgress;
        }
        Ok(())
    }

    async fn wait_until(
        &self,
        name: &StackName,
        condition: WaitCondition,
    ) -> Result<StackStatus, WaitError> {
        self.record(Call::Wait(name.to_string(), condition));

        if self.failing_wait.contains(name.as_str()) {
            let status = match condition {
                WaitCondition::CreateComplete => StackStatus::RollbackComplete,
                WaitCondition::UpdateComplete => StackStatus::UpdateRollbackComplete,
                WaitCondition::DeleteComplete => StackStatus::DeleteFailed,
            };
            return Err(WaitError::Failed {
                stack: name.to_string(),
                condition,
                status,
            });
        }

        let mut stacks = self.stacks.lock().unwrap();
        let status = match condition {
            WaitCondition::CreateComplete => {
                let outputs = self
                    .outputs_on_create
                    .get(name.as_str())
                    .cloned()
                    .unwrap_or_default();
                stacks.insert(
                    name.to_string(),
                    RemoteStack {
                        status: StackStatus::CreateComplete,
                        outputs,
                    },
                );
                StackStatus::CreateComplete
            }
            WaitCondition::UpdateComplete => {
                if let Some(stack) = stacks.get_mut(name.as_str()) {
                    stack.status = StackStatus::UpdateComplete;
                }
                StackStatus::UpdateComplete
            }
            WaitCondition::DeleteComplete => {
                stacks.remove(name.as_str());
                StackStatus::DeleteComplete
            }
        };
        Ok(status)
    }
}

#[async_trait]
impl TemplateStore for MockProvider {
    async fn upload_template(
        &self,
        bucket: &str,
        path: &Path,
        expires_in: Duration,
    ) -> Result<String, GatewayError> {
        let file = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.record(Call::Upload {
            bucket: bucket.to_string(),
            file: file.clone(),
        });
        *self.upload_expiry.lock().unwrap() = Some(expires_in);
        Ok(format!(
            "https://{bucket}.s3.amazonaws.com/{file}?X-Amz-Expires={}",
            expires_in.as_secs()
        ))
    }
}
