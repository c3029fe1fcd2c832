//! Boxed background work and the handle used to poll it

use std::pin::Pin;

use tokio::task::JoinHandle;

use crate::install::error::InstallError;

/// Async task wrapper for boxing futures
///
/// Collaborator seams return `AsyncTask` so they stay object-safe while the
/// work itself is still a plain future.
pub enum AsyncTask<T> {
    FutureVariant(Pin<Box<dyn std::future::Future<Output = T> + Send + 'static>>),
}

impl<T> AsyncTask<T> {
    /// Construct from a future
    pub fn from_future<F>(fut: F) -> Self
    where
        F: std::future::Future<Output = T> + Send + 'static,
    {
        AsyncTask::FutureVariant(Box::pin(fut))
    }

    /// Already-completed task
    pub fn ready(value: T) -> Self
    where
        T: Send + 'static,
    {
        Self::from_future(std::future::ready(value))
    }
}

impl<T> std::future::Future for AsyncTask<T> {
    type Output = T;

    fn poll(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        let AsyncTask::FutureVariant(fut) = &mut *self;
        fut.as_mut().poll(cx)
    }
}

/// A launched background task
///
/// `is_finished` never blocks and is what progress indicators poll;
/// `wait` yields the task's result once it has completed.
pub struct TaskHandle<T> {
    inner: Option<JoinHandle<T>>,
}

impl<T: Send + 'static> TaskHandle<T> {
    /// Launch `task` on the runtime
    pub fn spawn(task: AsyncTask<T>) -> Self {
        Self {
            inner: Some(tokio::spawn(task)),
        }
    }

    /// Non-blocking completion query
    pub fn is_finished(&self) -> bool {
        self.inner.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the task and take its result
    pub async fn wait(mut self) -> Result<T, InstallError> {
        let handle = self
            .inner
            .take()
            .ok_or_else(|| InstallError::Task("task already consumed".to_string()))?;
        handle.await.map_err(|e| InstallError::Task(e.to_string()))
    }
}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        // An interrupted run drops the handle mid-flight; the child process
        // is killed with the future.
        if let Some(handle) = self.inner.take() {
            handle.abort();
        }
    }
}
