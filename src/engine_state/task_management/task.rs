//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system.
//!
//! ## Core Components
//! - `Task`: A unit of work executed on a worker thread
//! - `TaskResult`: The outcome of a task, applied on the foreground thread
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called on the foreground thread with
//!    exclusive access to the manager's context `C`
//! 5. The result can spawn follow-up tasks
//!
//! If `process()` panics, the worker catches the unwind and sends the result of
//! `abandon()` instead, so the foreground thread still learns that the task ended.

/// A unit of work that can be executed on a worker thread.
///
/// Tasks own everything they read. Shared data comes in as `Arc` snapshots that
/// nobody mutates while the task runs.
pub trait Task<C>: Send {
    /// Performs the work. Runs on a worker thread.
    fn process(&self) -> Box<dyn TaskResult<C> + Send>;

    /// Builds the result reported when `process` panicked.
    ///
    /// Implementations use this to release any bookkeeping (such as pending
    /// markers) that the successful result would have released.
    fn abandon(&self, reason: String) -> Box<dyn TaskResult<C> + Send>;
}

/// The result of processing a `Task`, applied on the foreground thread.
pub trait TaskResult<C>: Send {
    /// Applies the result to `context`.
    ///
    /// # Returns
    /// Follow-up tasks to schedule (may be empty).
    fn handle_result(self: Box<Self>, context: &mut C) -> Vec<Box<dyn Task<C> + Send>>;
}
