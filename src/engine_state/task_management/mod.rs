//! # Task Management System
//!
//! This module provides the worker pool that runs chunk generation and chunk
//! tesselation off the foreground thread.
//!
//! ## Architecture Overview
//!
//! - `TaskManager<C>`: Central coordinator for task distribution and worker management
//! - `Task<C>`: A unit of work that can be executed asynchronously
//! - `TaskResult<C>`: The result of a completed task, which can spawn additional tasks
//! - `TaskChannel`: Communication channel between the foreground thread and one worker
//!
//! `C` is the foreground context results are applied to (the mesh cache, the
//! chunk grid). Only the thread that owns the manager ever touches it, so the
//! context needs no locking.
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager distributes tasks to available worker channels using round-robin
//! 3. Workers process tasks and send back results
//! 4. Results are applied on the foreground thread in `process_completed_tasks()`
//! 5. Results can spawn new tasks
//!
//! ## Flow Control
//!
//! Each channel holds at most `MAX_TASKS_IN_FLIGHT` tasks. Anything beyond that
//! waits in an overflow queue that `process_queued_tasks()` drains as workers
//! free up.
//!
//! ## Shutdown
//!
//! Dropping the manager closes every task channel and joins the workers. A
//! worker finishes the task it is running, so a drop can block for the length
//! of one task. Results that arrive after the drop are discarded.

pub mod task;

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{error, info, warn};
use task::{Task, TaskResult};

/// A channel pair connecting the foreground thread to one worker thread.
struct TaskChannel<C> {
    /// Sender for dispatching tasks to the worker thread
    task_sender: Sender<Box<dyn Task<C> + Send>>,
    /// Receiver for getting results back from the worker thread
    result_receiver: Receiver<Box<dyn TaskResult<C> + Send>>,
    /// Number of tasks currently being processed by this channel
    num_tasks_in_flight: usize,
    worker: JoinHandle<()>,
}

/// Central coordinator for distributing tasks across worker threads.
pub struct TaskManager<C> {
    channels: Vec<TaskChannel<C>>,
    /// Tasks waiting for a free channel
    queued_tasks: VecDeque<Box<dyn Task<C> + Send>>,
    /// Index of the next channel to try (round-robin)
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per channel.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl<C: 'static> TaskManager<C> {
    /// Creates a new `TaskManager` with `num_workers` named worker threads.
    ///
    /// `name` prefixes the worker thread names (`"{name}-{index}"`), which is
    /// what shows up in panic messages and debuggers. A pool always has at
    /// least one worker; asking for zero starts one.
    pub fn new(name: &str, num_workers: usize) -> Self {
        if num_workers == 0 {
            warn!("{} pool requested with 0 workers, starting 1", name);
        }
        let num_workers = num_workers.max(1);
        info!(
            "Starting {} {} workers (available parallelism: {:?})",
            num_workers,
            name,
            thread::available_parallelism()
        );

        let mut channels = Vec::with_capacity(num_workers);
        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task<C> + Send>>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult<C> + Send>>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| task.process()))
                        .unwrap_or_else(|payload| {
                            let reason = panic_message(payload.as_ref());
                            error!("Task panicked on {:?}: {}", thread::current().name(), reason);
                            task.abandon(reason)
                        });
                    // Release whatever the task captured before the foreground sees the result
                    drop(task);
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            };

            let worker = match thread::Builder::new()
                .name(format!("{}-{}", name, index))
                .spawn(task_closure)
            {
                Ok(worker) => worker,
                Err(e) => {
                    warn!("Failed to spawn {} worker {}: {}", name, index, e);
                    break;
                }
            };

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                worker,
            });
        }

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        }
    }

    /// Number of live worker threads.
    pub fn num_workers(&self) -> usize {
        self.channels.len()
    }

    /// Number of tasks dispatched to workers whose results have not been applied yet.
    pub fn num_in_flight(&self) -> usize {
        self.channels.iter().map(|c| c.num_tasks_in_flight).sum()
    }

    /// Number of tasks waiting for a free worker.
    pub fn num_queued(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Returns `true` when nothing is queued or running.
    pub fn is_idle(&self) -> bool {
        self.queued_tasks.is_empty() && self.num_in_flight() == 0
    }

    fn try_send_task(
        &mut self,
        task: Box<dyn Task<C> + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task<C> + Send>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            // The worker is gone; hand the task back
            Err(task) => Err(task.0),
        }
    }

    /// Finds the next channel below `MAX_TASKS_IN_FLIGHT`, starting from the
    /// round-robin cursor.
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|step| (self.current_channel + step) % count)
            .find(|idx| self.channels[*idx].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT)
    }

    /// Publishes a task, dispatching it now if a worker is free and queueing it
    /// otherwise.
    ///
    /// # Returns
    /// `true` if the task was dispatched immediately.
    pub fn publish_task(&mut self, task: Box<dyn Task<C> + Send>) -> bool {
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

    /// Moves queued tasks onto free channels.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                break;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    self.queued_tasks.push_front(task);
                    break;
                }
            }
        }
    }

    /// Applies every result that has arrived to `context` and schedules the
    /// follow-up tasks the results asked for. Never blocks.
    ///
    /// # Returns
    /// The number of results applied.
    pub fn process_completed_tasks(&mut self, context: &mut C) -> usize {
        let mut tasks_to_queue = Vec::new();
        let mut handled = 0;

        for channel in &mut self.channels {
            while let Ok(result) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight -= 1;
                handled += 1;
                tasks_to_queue.extend(result.handle_result(context));
            }
        }

        for task in tasks_to_queue {
            self.publish_task(task);
        }
        self.process_queued_tasks();
        handled
    }
}

impl<C> Drop for TaskManager<C> {
    fn drop(&mut self) {
        self.queued_tasks.clear();

        // Close every channel first so that all workers stop together
        let workers: Vec<JoinHandle<()>> = self
            .channels
            .drain(..)
            .map(|channel| {
                let TaskChannel {
                    task_sender,
                    result_receiver,
                    worker,
                    ..
                } = channel;
                drop(task_sender);
                drop(result_receiver);
                worker
            })
            .collect();

        for worker in workers {
            if worker.join().is_err() {
                warn!("Worker thread terminated abnormally");
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct Tally {
        values: Vec<u32>,
        abandoned: Vec<String>,
    }

    struct Double(u32);
    struct Doubled(u32);

    impl Task<Tally> for Double {
        fn process(&self) -> Box<dyn TaskResult<Tally> + Send> {
            if self.0 == 13 {
                panic!("unlucky");
            }
            Box::new(Doubled(self.0 * 2))
        }

        fn abandon(&self, reason: String) -> Box<dyn TaskResult<Tally> + Send> {
            Box::new(Abandoned(reason))
        }
    }

    impl TaskResult<Tally> for Doubled {
        fn handle_result(self: Box<Self>, tally: &mut Tally) -> Vec<Box<dyn Task<Tally> + Send>> {
            tally.values.push(self.0);
            // Chain one follow-up for small values
            if self.0 < 4 {
                vec![Box::new(Double(self.0))]
            } else {
                Vec::new()
            }
        }
    }

    struct Abandoned(String);

    impl TaskResult<Tally> for Abandoned {
        fn handle_result(self: Box<Self>, tally: &mut Tally) -> Vec<Box<dyn Task<Tally> + Send>> {
            tally.abandoned.push(self.0);
            Vec::new()
        }
    }

    fn drain(manager: &mut TaskManager<Tally>, tally: &mut Tally) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !manager.is_idle() {
            assert!(Instant::now() < deadline, "task manager never went idle");
            manager.process_completed_tasks(tally);
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn overflow_is_queued_and_drained() {
        let mut manager = TaskManager::new("test", 2);
        let mut tally = Tally::default();

        let dispatched: Vec<bool> = (10..15)
            .filter(|v| *v != 13)
            .map(|v| manager.publish_task(Box::new(Double(v))))
            .collect();
        assert_eq!(dispatched, vec![true, true, false, false]);
        assert_eq!(manager.num_queued(), 2);

        drain(&mut manager, &mut tally);
        tally.values.sort();
        assert_eq!(tally.values, vec![20, 22, 24, 28]);
    }

    #[test]
    fn follow_up_tasks_are_scheduled() {
        let mut manager = TaskManager::new("test", 1);
        let mut tally = Tally::default();
        manager.publish_task(Box::new(Double(1)));
        drain(&mut manager, &mut tally);
        assert_eq!(tally.values, vec![2, 4]);
    }

    #[test]
    fn panicking_task_is_abandoned_and_worker_survives() {
        let mut manager = TaskManager::new("test", 1);
        let mut tally = Tally::default();
        manager.publish_task(Box::new(Double(13)));
        manager.publish_task(Box::new(Double(5)));
        drain(&mut manager, &mut tally);

        assert_eq!(tally.abandoned, vec!["unlucky".to_string()]);
        assert_eq!(tally.values, vec![10]);
        assert_eq!(manager.num_workers(), 1);
    }

    #[test]
    fn zero_workers_still_get_one() {
        let mut manager: TaskManager<Tally> = TaskManager::new("test", 0);
        let mut tally = Tally::default();
        assert_eq!(manager.num_workers(), 1);
        assert!(manager.publish_task(Box::new(Double(3))));
        drain(&mut manager, &mut tally);
        assert_eq!(tally.values, vec![6]);
    }
}
