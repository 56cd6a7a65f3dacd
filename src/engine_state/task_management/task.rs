//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system.
//!
//! ## Core Components
//! - `Task`: A unit of work that runs on a worker thread
//! - `TaskResult`: The output of a task, applied to the world on the driving thread
//!
//! ## Task Lifecycle
//! 1. A `Task` is published via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called on the driving thread with the world
//!
//! ## Thread Safety
//! - `Task` and `TaskResult` must be `Send` to cross between threads
//! - Only `handle_result()` may mutate the world's chunk map

use crate::engine_state::voxels::world::World;
use crate::error::WorldError;

/// A unit of work that can be executed on a worker thread.
///
/// Tasks should own all the data they need; they run without access to the world.
pub trait Task: Send {
    /// Processes the task and returns a result.
    ///
    /// # Returns
    /// A boxed `TaskResult` that will be applied on the driving thread.
    fn process(&self) -> Box<dyn TaskResult + Send>;
}

/// The result of processing a `Task`.
pub trait TaskResult: Send {
    /// Applies the result to the world on the driving thread.
    ///
    /// # Errors
    /// Whatever error the task produced; the manager reports the first one after all
    /// outstanding results are drained.
    fn handle_result(self: Box<Self>, world: &mut World) -> Result<(), WorldError>;
}
