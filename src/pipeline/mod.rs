pub mod executor;
mod task;

pub use executor::{PipelineExecutor, ProgressCallback};
pub use task::StickerTask;

use crate::queue::{Counter, ResultSink, WorkQueue, WorkerPool};
use anyhow::Result;
use stickerforge_common::StickerId;
use std::path::PathBuf;

/// Terminal state of one transcode task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub id: StickerId,
    /// Delivered file, or the error chain that abandoned the task.
    pub result: std::result::Result<PathBuf, String>,
}

impl TaskOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Transcode `tasks` on a pool of `workers` threads.
///
/// A failing task is logged and recorded; the rest of the queue keeps
/// draining. `counter` is reset, then counts delivered stickers.
pub fn transcode_all(
    executor: &PipelineExecutor<'_>,
    tasks: Vec<StickerTask>,
    workers: usize,
    counter: &Counter,
) -> Result<Vec<TaskOutcome>> {
    let total = tasks.len();
    counter.reset();
    let queue = WorkQueue::new();
    for task in tasks {
        queue.put(task);
    }
    let sink = ResultSink::new();

    WorkerPool::new("transcode", workers).run(&queue, |task: StickerTask, _| {
        let result = match executor.execute(&task) {
            Ok(path) => {
                let done = counter.increment();
                tracing::debug!(sticker_id = %task.id(), done, total, "transcoded");
                Ok(path)
            }
            Err(e) => {
                tracing::error!(sticker_id = %task.id(), "Transcode failed: {:#}", e);
                Err(format!("{:#}", e))
            }
        };
        sink.record(TaskOutcome {
            id: task.id().clone(),
            result,
        });
    })?;

    let mut outcomes = sink.into_inner();
    outcomes.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(outcomes)
}
