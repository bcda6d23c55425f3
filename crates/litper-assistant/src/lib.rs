//! LLM access and the dashboard chat assistant.

pub mod brain;
pub mod cli;
pub mod json;
pub mod session;

pub use brain::*;
pub use cli::CliAssistant;
pub use json::*;
pub use session::*;

use async_trait::async_trait;

use litper_types::Result;

/// Free text in, free text out.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn ask(&self, prompt: &str) -> Result<String>;

    /// Whether the backing model is reachable.
    async fn health_check(&self) -> Result<bool>;

    fn name(&self) -> &str;
}
