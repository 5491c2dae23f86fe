// src/runtime.rs

//! Bridging blocking registry/filesystem work into async handlers

use crate::error::{Error, Result};

/// Run `f` on the blocking pool and flatten the join error into [`Error::Task`]
pub async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Blocking task failed: {}", e);
            Err(Error::Task(e.to_string()))
        }
    }
}
