//! Structured generation service interface.
//!
//! Opaque prompt → JSON service used by the entity editor's AI-enhance.
//! The caller passes a JSON schema the response must follow; the service
//! is expected to honor it, but the editor still validates what comes back.

use crate::error::GenerationError;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, prompt: &str, response_schema: &Value) -> Result<Value, GenerationError>;
}
