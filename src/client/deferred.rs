//! Deferred results and the worker runtime they are resolved on.
//!
//! Every [`HttpClient`](super::HttpClient) operation runs as a task on a tokio
//! runtime and hands back a [`Deferred`]: a future resolved exactly once with
//! a [`ResponseOutcome`]. Callers can `.await` it, chain work with
//! [`then`](Deferred::then)/[`map`](Deferred::map), attach callbacks with
//! [`on_complete`](Deferred::on_complete)/[`on_result`](Deferred::on_result),
//! or block on it from a plain thread with [`wait`](Deferred::wait).
//!
//! Operations are not cancellable. Dropping a `Deferred` discards the result
//! but the request still runs to completion.

use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;
use std::task::{Context, Poll};

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::oneshot;

use super::error::ClientError;

/// Result delivered by a [`Deferred`]: the decoded payload or the captured
/// failure.
pub type ResponseOutcome<T> = Result<T, ClientError>;

static BACKGROUND_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Handle of the runtime that executes requests.
///
/// Inside a tokio context that runtime is used; otherwise a process-wide
/// multi-threaded background runtime is started on first use.
pub(crate) fn worker_handle() -> Result<Handle, ClientError> {
    if let Ok(handle) = Handle::try_current() {
        return Ok(handle);
    }
    if let Some(runtime) = BACKGROUND_RUNTIME.get() {
        return Ok(runtime.handle().clone());
    }
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .thread_name("restclient-worker")
        .build()
        .map_err(|source| ClientError::Runtime { source })?;
    // A concurrent initializer may have won; the spare runtime is dropped here.
    Ok(BACKGROUND_RUNTIME.get_or_init(|| runtime).handle().clone())
}

/// A value resolved exactly once by work running on the worker runtime.
#[must_use = "a Deferred does nothing with its result unless awaited or given a handler"]
pub struct Deferred<T> {
    receiver: oneshot::Receiver<ResponseOutcome<T>>,
    runtime: Handle,
}

impl<T: Send + 'static> Deferred<T> {
    /// Runs `work` on `runtime` and returns its deferred outcome.
    pub(crate) fn spawn<F>(runtime: &Handle, work: F) -> Self
    where
        F: Future<Output = ResponseOutcome<T>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        runtime.spawn(async move {
            let outcome = work.await;
            // Nobody listening any more is fine; the work itself has finished.
            let _ = sender.send(outcome);
        });
        Self {
            receiver,
            runtime: runtime.clone(),
        }
    }

    /// A deferred already rejected with `error`, still delivered through the
    /// worker.
    pub(crate) fn rejected(runtime: &Handle, error: ClientError) -> Self {
        Self::spawn(runtime, async move { Err(error) })
    }

    /// Chains a transformation of the whole outcome.
    pub fn then<U, F>(self, transform: F) -> Deferred<U>
    where
        U: Send + 'static,
        F: FnOnce(ResponseOutcome<T>) -> ResponseOutcome<U> + Send + 'static,
    {
        let runtime = self.runtime.clone();
        Deferred::spawn(&runtime, async move { transform(self.await) })
    }

    /// Chains a transformation of the success value only.
    pub fn map<U, F>(self, transform: F) -> Deferred<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.then(|outcome| outcome.map(transform))
    }

    /// Calls `handler` with the outcome, on the worker runtime.
    pub fn on_complete<F>(self, handler: F)
    where
        F: FnOnce(ResponseOutcome<T>) + Send + 'static,
    {
        let runtime = self.runtime.clone();
        runtime.spawn(async move { handler(self.await) });
    }

    /// Calls `on_success` or `on_error`, on the worker runtime.
    pub fn on_result<S, E>(self, on_success: S, on_error: E)
    where
        S: FnOnce(T) + Send + 'static,
        E: FnOnce(ClientError) + Send + 'static,
    {
        self.on_complete(move |outcome| match outcome {
            Ok(value) => on_success(value),
            Err(error) => on_error(error),
        });
    }

    /// Blocks the current thread until the outcome is available.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context;
    /// `.await` the deferred there instead.
    pub fn wait(self) -> ResponseOutcome<T> {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(ClientError::WorkerLost))
    }
}

impl<T> Future for Deferred<T> {
    type Output = ResponseOutcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(ClientError::WorkerLost)))
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}
