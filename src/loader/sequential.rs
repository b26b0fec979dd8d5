use crate::error::LoadError;
use crate::loader::{Asset, LoadQueue, LoadRequest, LoaderBackend, LoaderRegistry, ProgressEvent};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use web_time::Instant;

/// What the loader does when a request fails.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop the drain at the failing request. Later requests are never dispatched.
    Halt,
    /// Report the failure and continue with the next request.
    Skip,
    /// Retry a failing load up to this many extra times, then halt.
    ///
    /// Retries are immediate, with no backoff; the state goes back to
    /// [`DrainState::Dispatching`] before each attempt. Unsupported formats
    /// are never retried.
    Retry(u32),
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        ErrorPolicy::Halt
    }
}

impl ErrorPolicy {
    fn retries(self) -> u32 {
        match self {
            ErrorPolicy::Retry(n) => n,
            _ => 0,
        }
    }
}

/// Progress of the current (or last) drain.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DrainState {
    /// No drain has run yet.
    Idle,
    /// Request `i` is being handed to its sub-loader.
    Dispatching(usize),
    /// Waiting for the sub-loader of request `i`.
    Awaiting(usize),
    /// Every request has been processed.
    Done,
    /// Request `i` failed and the drain stopped there.
    Stalled(usize),
    /// The drain was cancelled before request `i` was delivered.
    Cancelled(usize),
}

/// How a drain ended.
#[derive(Clone, Debug, PartialEq)]
pub enum DrainOutcome {
    /// Every request loaded.
    Completed,
    /// The queue was drained, but these requests failed and were skipped.
    CompletedWithSkips(Vec<(usize, LoadError)>),
    /// The request at `index` failed and the drain stopped.
    Stalled {
        /// Position of the failing request.
        index: usize,
        /// Its error.
        error: LoadError,
    },
    /// The drain was cancelled through its [`CancelHandle`]. Requests from
    /// `index` on were not delivered; an asset still in flight at that point
    /// is dropped.
    Cancelled {
        /// Position of the first undelivered request.
        index: usize,
    },
}

/// The result of [`SequentialLoader::drain`].
#[derive(Clone, Debug, PartialEq)]
pub struct DrainReport<M> {
    /// Loaded assets, in submission order.
    pub results: Vec<Asset<M>>,
    /// How the drain ended.
    pub outcome: DrainOutcome,
}

impl<M> DrainReport<M> {
    /// Whether the whole queue was processed (possibly with skips).
    pub fn is_complete(&self) -> bool {
        matches!(
            self.outcome,
            DrainOutcome::Completed | DrainOutcome::CompletedWithSkips(_)
        )
    }
}

/// Stops the drain of a [`SequentialLoader`] from outside of it.
///
/// The drain checks the handle before each dispatch and after each load
/// resolves. A new drain starts uncancelled.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Rc<Cell<bool>>);

impl CancelHandle {
    /// Requests the running drain to stop.
    pub fn cancel(&self) {
        self.0.set(true);
    }

    /// Whether [`cancel`](Self::cancel) was called since the drain started.
    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }

    fn reset(&self) {
        self.0.set(false);
    }
}

/// Queue-level callbacks of a drain.
pub struct QueueCallbacks<'a, M> {
    pub(crate) on_progress: Option<Box<dyn FnMut(&ProgressEvent, usize) + 'a>>,
    pub(crate) on_loaded: Option<Box<dyn FnMut(usize, &Asset<M>) + 'a>>,
    pub(crate) on_error: Option<Box<dyn FnMut(usize, &LoadError) + 'a>>,
    pub(crate) on_all_load: Option<Box<dyn FnOnce(&[Asset<M>]) + 'a>>,
}

impl<'a, M> Default for QueueCallbacks<'a, M> {
    fn default() -> Self {
        QueueCallbacks {
            on_progress: None,
            on_loaded: None,
            on_error: None,
            on_all_load: None,
        }
    }
}

impl<'a, M> QueueCallbacks<'a, M> {
    /// No callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called for every progress event, with the index of the request.
    pub fn on_progress(mut self, f: impl FnMut(&ProgressEvent, usize) + 'a) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// Called after each request loads, with its index.
    pub fn on_loaded(mut self, f: impl FnMut(usize, &Asset<M>) + 'a) -> Self {
        self.on_loaded = Some(Box::new(f));
        self
    }

    /// Called when a request fails for good, with its index.
    pub fn on_error(mut self, f: impl FnMut(usize, &LoadError) + 'a) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Called once with every result when the whole queue has been processed.
    pub fn on_all_load(mut self, f: impl FnOnce(&[Asset<M>]) + 'a) -> Self {
        self.on_all_load = Some(Box::new(f));
        self
    }
}

/// Loads a queue of heterogeneous assets one at a time, in order.
///
/// Each request is awaited before the next is dispatched, so at most one
/// sub-loader call is in flight. Draining borrows the loader mutably, which
/// rules out two concurrent drains on the same loader.
pub struct SequentialLoader<B: LoaderBackend> {
    registry: LoaderRegistry<B>,
    policy: ErrorPolicy,
    state: DrainState,
    cancel: CancelHandle,
}

impl<B: LoaderBackend> SequentialLoader<B> {
    /// A loader halting on errors.
    pub fn new(registry: LoaderRegistry<B>) -> Self {
        SequentialLoader {
            registry,
            policy: ErrorPolicy::default(),
            state: DrainState::Idle,
            cancel: CancelHandle::default(),
        }
    }

    /// Sets the error policy, builder style.
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The error policy.
    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Sets the error policy.
    pub fn set_policy(&mut self, policy: ErrorPolicy) {
        self.policy = policy;
    }

    /// Progress of the current or last drain.
    pub fn state(&self) -> DrainState {
        self.state
    }

    /// A handle cancelling the running drain.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// The sub-loader registry.
    pub fn registry(&self) -> &LoaderRegistry<B> {
        &self.registry
    }

    /// The sub-loader registry, mutably.
    pub fn registry_mut(&mut self) -> &mut LoaderRegistry<B> {
        &mut self.registry
    }

    /// Loads every entry of `queue`, front to back.
    ///
    /// On success of request `i` the asset is appended to the results, then the
    /// request's own callback and `on_loaded` run, then request `i + 1` is
    /// dispatched. `on_all_load` fires once the whole queue is processed; it
    /// never fires for a stalled or cancelled drain.
    pub async fn drain(
        &mut self,
        queue: LoadQueue<B::Model>,
        callbacks: QueueCallbacks<'_, B::Model>,
    ) -> DrainReport<B::Model> {
        let QueueCallbacks {
            on_progress,
            mut on_loaded,
            mut on_error,
            on_all_load,
        } = callbacks;
        let queue_progress = RefCell::new(on_progress);

        let total = queue.len();
        let started = Instant::now();
        let mut results = Vec::with_capacity(total);
        let mut skipped = Vec::new();
        self.state = DrainState::Idle;
        self.cancel.reset();

        for (index, entry) in queue.into_entries().into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                return self.cancelled(index, results);
            }
            self.state = DrainState::Dispatching(index);

            let outcome = match entry {
                Ok(request) => {
                    let LoadRequest {
                        source,
                        on_load,
                        on_progress,
                        on_error: request_on_error,
                    } = request;
                    let request_progress = RefCell::new(on_progress);
                    let sink = |event: ProgressEvent| {
                        if let Some(percent) = event.percent() {
                            log::debug!("[loader] #{} {:.1}% loaded", index, percent);
                        }
                        if let Some(f) = request_progress.borrow_mut().as_mut() {
                            f(&event, index);
                        }
                        if let Some(f) = queue_progress.borrow_mut().as_mut() {
                            f(&event, index);
                        }
                    };

                    let mut attempt = 0;
                    let loaded = loop {
                        self.state = DrainState::Awaiting(index);
                        let loaded = self.registry.load(&source, &sink).await;
                        if self.cancel.is_cancelled() {
                            return self.cancelled(index, results);
                        }
                        match loaded {
                            Err(error) if error.is_retryable() && attempt < self.policy.retries() => {
                                attempt += 1;
                                log::warn!(
                                    "[loader] #{} {}, retrying ({}/{})",
                                    index,
                                    error,
                                    attempt,
                                    self.policy.retries()
                                );
                                self.state = DrainState::Dispatching(index);
                            }
                            other => break other,
                        }
                    };

                    match loaded {
                        Ok(asset) => {
                            results.push(asset);
                            let asset = &results[results.len() - 1];
                            if let Some(f) = on_load {
                                f(asset);
                            }
                            if let Some(f) = on_loaded.as_mut() {
                                f(index, asset);
                            }
                            Ok(())
                        }
                        Err(error) => {
                            if let Some(f) = request_on_error {
                                f(&error);
                            }
                            Err(error)
                        }
                    }
                }
                Err(error) => Err(error),
            };

            if let Err(error) = outcome {
                log::error!("[loader] #{} {}", index, error);
                if let Some(f) = on_error.as_mut() {
                    f(index, &error);
                }

                if self.policy == ErrorPolicy::Skip {
                    log::warn!("[loader] skipping #{}", index);
                    skipped.push((index, error));
                    continue;
                }

                self.state = DrainState::Stalled(index);
                return DrainReport {
                    results,
                    outcome: DrainOutcome::Stalled { index, error },
                };
            }
        }

        self.state = DrainState::Done;
        log::info!(
            "[loader] {} of {} assets loaded in {:?}",
            results.len(),
            total,
            started.elapsed()
        );

        if let Some(f) = on_all_load {
            f(&results);
        }

        DrainReport {
            results,
            outcome: if skipped.is_empty() {
                DrainOutcome::Completed
            } else {
                DrainOutcome::CompletedWithSkips(skipped)
            },
        }
    }

    fn cancelled(&mut self, index: usize, results: Vec<Asset<B::Model>>) -> DrainReport<B::Model> {
        log::warn!("[loader] drain cancelled at #{}", index);
        self.state = DrainState::Cancelled(index);
        DrainReport {
            results,
            outcome: DrainOutcome::Cancelled { index },
        }
    }

    /// Runs [`drain`](Self::drain) to completion on the current thread.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn drain_blocking(
        &mut self,
        queue: LoadQueue<B::Model>,
        callbacks: QueueCallbacks<'_, B::Model>,
    ) -> DrainReport<B::Model> {
        pollster::block_on(self.drain(queue, callbacks))
    }
}
