//! # Task Management System
//!
//! This module provides a small worker pool for running chunk generation off the
//! driving thread.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: Central coordinator for task distribution and worker management
//! - `Task`: A unit of work that can be executed on a worker
//! - `TaskResult`: The result of a completed task, applied to the world
//! - `TaskChannel`: Communication channel between the driving thread and one worker
//!
//! Each worker owns a dedicated pair of mpsc channels. Tasks are handed out round-robin,
//! at most `MAX_TASKS_IN_FLIGHT` per worker; everything else waits in a FIFO queue.
//! With zero workers, tasks are processed on the driving thread in publication order.
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager distributes tasks to available worker channels using round-robin
//! 3. Workers process tasks and send back results
//! 4. Results are applied to the world in `process_completed_tasks()` or `finish_all()`
//!
//! ## Example Usage
//! ```rust
//! use std::sync::Arc;
//!
//! use cgmath::Point3;
//! use rail_world::config::TerrainConfig;
//! use rail_world::engine_state::task_management::TaskManager;
//! use rail_world::engine_state::voxels::block::MaterialRegistry;
//! use rail_world::engine_state::voxels::generation::ChunkGenerator;
//! use rail_world::engine_state::voxels::tasks::chunk_generation_task::ChunkGenerationTask;
//! use rail_world::engine_state::voxels::world::{World, WorldShape};
//!
//! let shape = WorldShape::default();
//! let generator = Arc::new(ChunkGenerator::new(
//!     7,
//!     shape,
//!     TerrainConfig::default(),
//!     Arc::new(MaterialRegistry::new()),
//! ));
//! let mut world = World::new(shape);
//! let mut task_manager = TaskManager::new(2);
//!
//! for x in -1..=1 {
//!     let task = ChunkGenerationTask::new(generator.clone(), Point3::new(x, 0, 0));
//!     task_manager.publish_task(Box::new(task));
//! }
//!
//! // Blocks until every published task has been applied to the world.
//! let handled = task_manager.finish_all(&mut world).unwrap();
//! assert_eq!(handled, 3);
//! assert_eq!(world.len(), 3);
//! ```

pub mod task;

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{error, info};
use task::{Task, TaskResult};

use super::voxels::world::World;
use crate::error::WorldError;

/// A communication channel between the driving thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks from the driving thread to the worker
/// - `result_receiver`: Receives task results from the worker
/// - `num_tasks_in_flight`: Tracks number of tasks currently being processed
/// - `_worker`: Handle to the worker thread; the worker exits once the sender drops
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    result_receiver: Receiver<Box<dyn TaskResult + Send>>,
    num_tasks_in_flight: usize,
    _worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// # Fields
/// - `channels`: Set of active worker channels
/// - `queued_tasks`: Tasks waiting for an available worker
/// - `current_channel`: Index for round-robin scheduling
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// This is set to 1 so a busy worker never holds work another idle worker could take.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create. `0` runs every task on the
    ///   thread that calls `finish_all()`.
    ///
    /// # Panics
    /// Panics if the underlying thread creation fails.
    pub fn new(num_workers: usize) -> Self {
        let mut channels = Vec::with_capacity(num_workers);

        if num_workers > 0 {
            info!(
                "Starting {num_workers} generation workers, available parallelism: {:?}",
                thread::available_parallelism()
            );
        }

        for _ in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task + Send>>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult + Send>>();

            let worker = thread::spawn(move || {
                while let Ok(task) = task_rx.recv() {
                    let result = task.process();
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            });

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                _worker: worker,
            });
        }

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        }
    }

    /// Number of worker threads.
    pub fn num_workers(&self) -> usize {
        self.channels.len()
    }

    /// Tasks waiting for a worker.
    pub fn num_queued(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Tasks handed to workers whose results have not been applied yet.
    pub fn num_in_flight(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum()
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was successfully sent to the worker
    /// - `Err(task)` if the send failed (the worker is gone)
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => Err(task.0),
        }
    }

    /// Finds an available worker channel, round-robin from the last used channel.
    ///
    /// # Returns
    /// - `Some(usize)` index of a channel below `MAX_TASKS_IN_FLIGHT`
    /// - `None` if all channels are busy or there are no channels
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        let start_channel = self.current_channel;
        let mut current = start_channel;
        loop {
            if self.channels[current].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT {
                return Some(current);
            }
            current = (current + 1) % self.channels.len();
            if current == start_channel {
                return None;
            }
        }
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// - `true` if the task was immediately handed to a worker
    /// - `false` if the task was queued
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> bool {
        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Hands queued tasks to idle workers, oldest first.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                return;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    // Channel is disconnected, put task back and stop processing
                    self.queued_tasks.push_front(task);
                    return;
                }
            }
        }
    }

    /// Applies every result that is already available without blocking.
    ///
    /// # Returns
    /// The number of results applied, or the first error once all available results
    /// were applied.
    pub fn process_completed_tasks(&mut self, world: &mut World) -> Result<usize, WorldError> {
        let mut handled = 0;
        let mut first_error = None;
        for channel in &mut self.channels {
            while let Ok(result) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight -= 1;
                handled += 1;
                if let Err(err) = result.handle_result(world) {
                    first_error.get_or_insert(err);
                }
            }
        }
        self.process_queued_tasks();
        match first_error {
            Some(err) => Err(err),
            None => Ok(handled),
        }
    }

    /// Runs every queued and in-flight task to completion and applies the results.
    ///
    /// This blocks the calling thread. Without workers, queued tasks are processed
    /// right here in publication order.
    ///
    /// # Returns
    /// The number of results applied, or the first error once nothing is left queued
    /// or in flight.
    pub fn finish_all(&mut self, world: &mut World) -> Result<usize, WorldError> {
        let mut handled = 0;
        let mut first_error = None;
        let mut record = |outcome: Result<(), WorldError>| {
            if let Err(err) = outcome {
                first_error.get_or_insert(err);
            }
        };

        if self.channels.is_empty() {
            while let Some(task) = self.queued_tasks.pop_front() {
                record(task.process().handle_result(world));
                handled += 1;
            }
        }

        loop {
            self.process_queued_tasks();
            let Some(channel) = self
                .channels
                .iter_mut()
                .find(|channel| channel.num_tasks_in_flight > 0)
            else {
                break;
            };

            channel.num_tasks_in_flight -= 1;
            match channel.result_receiver.recv() {
                Ok(result) => {
                    record(result.handle_result(world));
                    handled += 1;
                }
                Err(_) => {
                    error!("Generation worker disconnected with a task in flight");
                    channel.num_tasks_in_flight = 0;
                    record(Err(WorldError::WorkerLost));
                }
            }
        }

        if !self.queued_tasks.is_empty() {
            error!("{} tasks left without a live worker", self.queued_tasks.len());
            self.queued_tasks.clear();
            record(Err(WorldError::WorkerLost));
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(handled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::Chunk;
    use crate::engine_state::voxels::world::WorldShape;
    use cgmath::Point3;

    struct InsertChunk(Point3<i32>);

    struct InsertChunkResult(Point3<i32>);

    impl Task for InsertChunk {
        fn process(&self) -> Box<dyn TaskResult + Send> {
            Box::new(InsertChunkResult(self.0))
        }
    }

    impl TaskResult for InsertChunkResult {
        fn handle_result(self: Box<Self>, world: &mut World) -> Result<(), WorldError> {
            if world.add_chunk(self.0, Chunk::empty(self.0)) {
                Ok(())
            } else {
                Err(WorldError::InvalidConfig(format!("{:?} refused", self.0)))
            }
        }
    }

    fn coordinates() -> Vec<Point3<i32>> {
        (-3..=3).map(|x| Point3::new(x, 0, 0)).collect()
    }

    #[test]
    fn finish_all_is_a_barrier() {
        let mut world = World::new(WorldShape::default());
        let mut manager = TaskManager::new(3);
        for coordinate in coordinates() {
            manager.publish_task(Box::new(InsertChunk(coordinate)));
        }
        assert_eq!(manager.num_in_flight(), 3);
        assert_eq!(manager.num_queued(), 4);

        assert_eq!(manager.finish_all(&mut world).unwrap(), 7);
        assert_eq!(world.len(), 7);
        assert_eq!(manager.num_in_flight(), 0);
        assert_eq!(manager.num_queued(), 0);
    }

    #[test]
    fn zero_workers_process_inline() {
        let mut world = World::new(WorldShape::default());
        let mut manager = TaskManager::new(0);
        for coordinate in coordinates() {
            assert!(!manager.publish_task(Box::new(InsertChunk(coordinate))));
        }
        assert_eq!(manager.finish_all(&mut world).unwrap(), 7);
        assert_eq!(world.len(), 7);
    }

    #[test]
    fn errors_are_reported_after_draining() {
        let mut world = World::new(WorldShape::default());
        let mut manager = TaskManager::new(2);
        manager.publish_task(Box::new(InsertChunk(Point3::new(0, 0, 0))));
        manager.publish_task(Box::new(InsertChunk(Point3::new(0, 0, 0))));
        manager.publish_task(Box::new(InsertChunk(Point3::new(1, 0, 0))));

        assert!(manager.finish_all(&mut world).is_err());
        assert_eq!(world.len(), 2);
        assert_eq!(manager.num_in_flight() + manager.num_queued(), 0);
    }

    #[test]
    fn finishing_with_nothing_published_is_a_no_op() {
        let mut world = World::new(WorldShape::default());
        let mut manager = TaskManager::new(1);
        assert_eq!(manager.finish_all(&mut world).unwrap(), 0);
    }
}
