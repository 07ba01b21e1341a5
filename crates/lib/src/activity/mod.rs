//! Activity players
//!
//! Each lesson kind has a small state machine that turns learner actions into
//! [`Step`]s. A step may carry a [`ProgressPatch`]; [`LessonRun`] forwards
//! those patches into a [`ProgressBuffer`](crate::progress::ProgressBuffer).

mod errors;
mod quiz;
mod run;
mod sandbox;
mod story;

pub use errors::ActivityError;
pub use quiz::{AnswerState, QuizPlayer};
pub use run::LessonRun;
pub use sandbox::SandboxPlayer;
pub use story::StoryPlayer;

use crate::{
    Result,
    content::{AgeBand, LessonContent},
    progress::ProgressPatch,
};

/// What a learner action produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Nothing worth saving.
    Idle,
    /// Intermediate progress.
    Progress(ProgressPatch),
    /// The activity just completed.
    Completed(ProgressPatch),
}

impl Step {
    pub fn patch(&self) -> Option<&ProgressPatch> {
        match self {
            Step::Idle => None,
            Step::Progress(patch) | Step::Completed(patch) => Some(patch),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Step::Completed(_))
    }
}

/// A player for any lesson kind.
#[derive(Clone, Debug)]
pub enum Activity {
    Story(StoryPlayer),
    Quiz(QuizPlayer),
    Sandbox(SandboxPlayer),
}

impl Activity {
    /// Build the player for a lesson body.
    pub fn new(content: LessonContent, band: AgeBand) -> Self {
        match content {
            LessonContent::Story(story) => Activity::Story(StoryPlayer::new(story, band)),
            LessonContent::Quiz(quiz) => Activity::Quiz(QuizPlayer::new(quiz, band)),
            LessonContent::Sandbox(sandbox) => Activity::Sandbox(SandboxPlayer::new(sandbox, band)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Activity::Story(_) => "story",
            Activity::Quiz(_) => "quiz",
            Activity::Sandbox(_) => "sandbox",
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            Activity::Story(player) => player.is_finished(),
            Activity::Quiz(player) => player.is_finished(),
            Activity::Sandbox(player) => player.is_finished(),
        }
    }

    /// Patch recorded when the lesson is opened.
    ///
    /// Stories save the first page straight away; the other kinds only save
    /// once the learner answers or places something.
    pub fn opening_patch(&self) -> Option<ProgressPatch> {
        match self {
            Activity::Story(player) => Some(player.position_patch()),
            Activity::Quiz(_) | Activity::Sandbox(_) => None,
        }
    }

    fn wrong(&self, expected: &'static str) -> crate::Error {
        ActivityError::WrongActivity {
            expected,
            actual: self.kind(),
        }
        .into()
    }

    pub fn story_mut(&mut self) -> Result<&mut StoryPlayer> {
        match self {
            Activity::Story(player) => Ok(player),
            other => Err(other.wrong("story")),
        }
    }

    pub fn quiz_mut(&mut self) -> Result<&mut QuizPlayer> {
        match self {
            Activity::Quiz(player) => Ok(player),
            other => Err(other.wrong("quiz")),
        }
    }

    pub fn sandbox_mut(&mut self) -> Result<&mut SandboxPlayer> {
        match self {
            Activity::Sandbox(player) => Ok(player),
            other => Err(other.wrong("sandbox")),
        }
    }
}
