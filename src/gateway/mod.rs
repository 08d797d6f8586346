// ABOUTME: Contract with the remote provisioning service and template storage.
// ABOUTME: Traits, argument model, waiter, and the AWS-backed implementation.

mod args;
mod aws;
mod error;
mod traits;
pub mod waiter;

pub use args::{RESERVED_ARGUMENTS, Setting, SettingError, StackArgs, TemplateSource};
pub use aws::AwsProvider;
pub use error::{GatewayError, GatewayErrorKind, NO_UPDATES_MESSAGE, not_found_message};
pub use traits::{Provider, StackDescription, StackGateway, TemplateStore};
pub use waiter::{WaitCondition, WaitError, WaitPolicy};
