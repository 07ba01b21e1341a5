//! Quiz player: select an option, confirm it, move to the next question.

use serde_json::json;

use super::{ActivityError, Step};
use crate::{
    Result,
    content::{AgeBand, QuizContent, QuizQuestion},
    progress::ProgressPatch,
};

/// Result of confirming the current question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerState {
    Unanswered,
    Correct,
    Wrong,
}

#[derive(Clone, Debug)]
pub struct QuizPlayer {
    content: QuizContent,
    band: AgeBand,
    index: usize,
    selected: Option<String>,
    answer: AnswerState,
    score: i64,
    finished: bool,
}

impl QuizPlayer {
    /// `content` must have at least one question; parsed content always does.
    pub fn new(content: QuizContent, band: AgeBand) -> Self {
        Self {
            content,
            band,
            index: 0,
            selected: None,
            answer: AnswerState::Unanswered,
            score: 0,
            finished: false,
        }
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.content.questions.get(self.index)
    }

    pub fn total_questions(&self) -> usize {
        self.content.questions.len()
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn answer_state(&self) -> AnswerState {
        self.answer
    }

    pub fn is_last_question(&self) -> bool {
        self.index + 1 >= self.total_questions()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Hint for the kid's age band, shown after a wrong answer.
    pub fn hint(&self) -> Option<&str> {
        if self.answer != AnswerState::Wrong {
            return None;
        }
        self.current_question()
            .and_then(|q| q.hints.get(self.band))
            .map(String::as_str)
    }

    /// Explanation of the current question once it has been answered.
    pub fn explanation(&self) -> Option<&str> {
        if self.answer == AnswerState::Unanswered {
            return None;
        }
        self.current_question().map(|q| q.explanation.as_str())
    }

    /// Whether the final score meets the passing score. No passing score means pass.
    pub fn passed(&self) -> bool {
        self.content
            .passing_score
            .is_none_or(|passing| self.score >= passing)
    }

    fn question(&self) -> Result<&QuizQuestion> {
        if self.finished {
            return Err(ActivityError::Finished.into());
        }
        self.current_question()
            .ok_or_else(|| ActivityError::Finished.into())
    }

    /// Pick an option for the current question. Allowed until confirmed.
    pub fn select(&mut self, option_id: &str) -> Result<Step> {
        let question = self.question()?;
        if self.answer != AnswerState::Unanswered {
            return Err(ActivityError::AlreadyAnswered.into());
        }
        if !question.options.iter().any(|o| o.id == option_id) {
            return Err(ActivityError::UnknownOption {
                id: option_id.to_string(),
            }
            .into());
        }
        self.selected = Some(option_id.to_string());
        Ok(Step::Idle)
    }

    /// Lock in the selected option. A correct answer adds one to the score.
    pub fn confirm(&mut self) -> Result<Step> {
        let question = self.question()?;
        if self.answer != AnswerState::Unanswered {
            return Err(ActivityError::AlreadyAnswered.into());
        }
        let selected = self.selected.as_deref().ok_or(ActivityError::NoSelection)?;

        let correct = selected == question.correct_answer;
        if correct {
            self.answer = AnswerState::Correct;
            self.score += 1;
        } else {
            self.answer = AnswerState::Wrong;
        }

        let answers = json!({
            "current_question": self.index + 1,
            "total": self.total_questions(),
        });
        Ok(Step::Progress(
            ProgressPatch::in_progress().with_answers(answers.to_string()),
        ))
    }

    /// Move past an answered question, completing the quiz after the last one.
    pub fn next(&mut self) -> Result<Step> {
        self.question()?;
        if self.answer == AnswerState::Unanswered {
            return Err(ActivityError::NotAnswered.into());
        }

        if self.is_last_question() {
            self.finished = true;
            let answers = json!({
                "score": self.score,
                "total_questions": self.total_questions(),
                "passed": self.passed(),
            });
            return Ok(Step::Completed(
                ProgressPatch::completed()
                    .with_score(self.score)
                    .with_answers(answers.to_string()),
            ));
        }

        self.index += 1;
        self.selected = None;
        self.answer = AnswerState::Unanswered;
        Ok(Step::Idle)
    }
}
