//! Pipeline stage trait
//!
//! Defines the interface for the long-running agents on either side of a
//! session.

use anyhow::Result;
use async_trait::async_trait;

/// Trait for pipeline stages that own a connection and run until it closes
#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// Run the stage, processing events until shutdown signal or connection close
    async fn run(&mut self) -> Result<()>;

    /// Get the name of this stage for logging
    fn name(&self) -> &'static str;

    /// Gracefully shutdown the stage
    async fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}
