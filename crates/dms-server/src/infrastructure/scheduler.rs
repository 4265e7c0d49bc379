//! Ordered, single-consumer task scheduling.
//!
//! Side effects that must happen in submission order (powering one panel off
//! before the other one on) are posted as plain command values rather than
//! closures.  One worker drains the queue, so two tasks never run
//! concurrently and a later transition's tasks always run after an earlier
//! one's.
//!
//! # Two implementations
//!
//! - [`ChannelTaskScheduler`] + [`TaskQueue`]: a tokio unbounded channel; the
//!   queue half is driven by a spawned task in the service binary.
//! - [`ManualTaskScheduler`]: stores tasks until a test pops them, which
//!   makes "the transition is still in flight" a state a test can hold.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq)]
pub enum SchedulerError {
    /// The worker side of the queue is gone.
    #[error("task queue closed")]
    Closed,

    /// The scheduler refused the task.
    #[error("task scheduler rejected {0}")]
    Rejected(&'static str),
}

pub trait TaskScheduler<T>: Send + Sync {
    /// Queues `task` behind every previously posted task.  `label` is used
    /// for logging only.
    fn post_async_task(&self, task: T, label: &'static str) -> Result<(), SchedulerError>;
}

#[derive(Debug)]
struct LabeledTask<T> {
    label: &'static str,
    task: T,
}

// ── Channel-backed scheduler ──────────────────────────────────────────────────

pub struct ChannelTaskScheduler<T> {
    tx: mpsc::UnboundedSender<LabeledTask<T>>,
}

/// Consumer half of a [`ChannelTaskScheduler`].
pub struct TaskQueue<T> {
    rx: mpsc::UnboundedReceiver<LabeledTask<T>>,
}

impl<T: Send> ChannelTaskScheduler<T> {
    pub fn new() -> (Self, TaskQueue<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, TaskQueue { rx })
    }
}

impl<T: Send> TaskScheduler<T> for ChannelTaskScheduler<T> {
    fn post_async_task(&self, task: T, label: &'static str) -> Result<(), SchedulerError> {
        self.tx
            .send(LabeledTask { label, task })
            .map_err(|_| SchedulerError::Closed)
    }
}

impl<T> TaskQueue<T> {
    /// Runs `handler` on every task in FIFO order until all schedulers are
    /// dropped.
    pub async fn run<F: FnMut(T)>(mut self, mut handler: F) {
        while let Some(LabeledTask { label, task }) = self.rx.recv().await {
            debug!(task = label, "running scheduled task");
            handler(task);
        }
        info!("task queue closed; worker exiting");
    }
}

// ── Manual scheduler ──────────────────────────────────────────────────────────

pub struct ManualTaskScheduler<T> {
    queue: Mutex<VecDeque<LabeledTask<T>>>,
    rejecting: AtomicBool,
}

impl<T: Send> ManualTaskScheduler<T> {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            rejecting: AtomicBool::new(false),
        }
    }

    /// Makes subsequent posts fail with [`SchedulerError::Rejected`].
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    /// Removes the oldest queued task.
    pub fn pop(&self) -> Option<T> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .map(|t| t.task)
    }

    /// Labels of the queued tasks, oldest first.
    pub fn labels(&self) -> Vec<&'static str> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|t| t.label)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs queued tasks one at a time until the queue is empty, including
    /// tasks posted by the handler itself.  Returns how many ran.
    pub fn run_all(&self, mut handler: impl FnMut(T)) -> usize {
        let mut ran = 0;
        while let Some(task) = self.pop() {
            handler(task);
            ran += 1;
        }
        ran
    }
}

impl<T: Send> Default for ManualTaskScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> TaskScheduler<T> for ManualTaskScheduler<T> {
    fn post_async_task(&self, task: T, label: &'static str) -> Result<(), SchedulerError> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(SchedulerError::Rejected(label));
        }
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(LabeledTask { label, task });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_scheduler_runs_tasks_in_fifo_order() {
        // Arrange
        let (scheduler, queue) = ChannelTaskScheduler::new();
        for i in 0..5u32 {
            scheduler.post_async_task(i, "step").unwrap();
        }
        drop(scheduler);

        // Act
        let mut seen = Vec::new();
        queue.run(|i| seen.push(i)).await;

        // Assert
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_channel_scheduler_reports_closed_queue() {
        let (scheduler, queue) = ChannelTaskScheduler::<u32>::new();
        drop(queue);
        assert_eq!(
            scheduler.post_async_task(1, "late"),
            Err(SchedulerError::Closed)
        );
    }

    #[test]
    fn test_manual_scheduler_keeps_tasks_until_popped() {
        let scheduler = ManualTaskScheduler::new();
        scheduler.post_async_task("off", "screenOffTask").unwrap();
        scheduler.post_async_task("on", "screenOnTask").unwrap();

        assert_eq!(scheduler.labels(), vec!["screenOffTask", "screenOnTask"]);
        assert_eq!(scheduler.pop(), Some("off"));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_manual_scheduler_rejecting_refuses_posts() {
        let scheduler = ManualTaskScheduler::new();
        scheduler.set_rejecting(true);
        assert_eq!(
            scheduler.post_async_task(1u8, "task"),
            Err(SchedulerError::Rejected("task"))
        );
        assert!(scheduler.is_empty());
    }
}
