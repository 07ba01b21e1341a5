//! Connects a running activity to the progress buffer.

use tokio::time::Instant;

use super::{Activity, Step};
use crate::{
    Result,
    progress::{ProgressBuffer, ProgressPatch},
};

/// One learner's pass through one lesson.
///
/// Every patch the activity emits is stamped with the total time spent so far
/// and saved to the buffer. Completion is flushed straight away. Call
/// [`LessonRun::finish`] when the learner leaves the lesson; dropping the run
/// without it still asks the buffer to flush, but cannot wait for it.
#[derive(Debug)]
pub struct LessonRun {
    lesson_id: i64,
    activity: Activity,
    buffer: ProgressBuffer,
    started: Instant,
    finished: bool,
}

impl LessonRun {
    /// Open a lesson, recording the activity's opening patch if it has one.
    pub async fn start(lesson_id: i64, activity: Activity, buffer: ProgressBuffer) -> Result<Self> {
        let run = Self {
            lesson_id,
            activity,
            buffer,
            started: Instant::now(),
            finished: false,
        };
        if let Some(patch) = run.activity.opening_patch() {
            run.save(patch).await?;
        }
        Ok(run)
    }

    pub fn lesson_id(&self) -> i64 {
        self.lesson_id
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Whole seconds since the lesson was opened.
    pub fn elapsed_seconds(&self) -> i64 {
        self.started.elapsed().as_secs() as i64
    }

    /// Apply a learner action and record whatever progress it produced.
    ///
    /// ```ignore
    /// run.act(|activity| activity.quiz_mut()?.confirm()).await?;
    /// ```
    pub async fn act<F>(&mut self, action: F) -> Result<Step>
    where
        F: FnOnce(&mut Activity) -> Result<Step>,
    {
        let step = action(&mut self.activity)?;
        match &step {
            Step::Idle => {}
            Step::Progress(patch) => self.save(patch.clone()).await?,
            Step::Completed(patch) => {
                self.save(patch.clone()).await?;
                self.buffer.flush(self.lesson_id).await?;
            }
        }
        Ok(step)
    }

    async fn save(&self, patch: ProgressPatch) -> Result<()> {
        let patch = patch.with_time_spent(self.elapsed_seconds());
        self.buffer.save(self.lesson_id, patch).await
    }

    /// Leave the lesson, flushing anything still pending.
    pub async fn finish(mut self) -> Result<()> {
        self.finished = true;
        self.buffer.flush(self.lesson_id).await
    }
}

impl Drop for LessonRun {
    fn drop(&mut self) {
        if !self.finished && !self.buffer.request_flush(self.lesson_id) {
            tracing::warn!(
                lesson_id = self.lesson_id,
                "Could not queue progress flush for abandoned lesson"
            );
        }
    }
}
