//! Sandbox player: put each item into the zone where it belongs.

use std::collections::HashMap;

use serde_json::json;

use super::{ActivityError, Step};
use crate::{
    Result,
    content::{AgeBand, CompletionCriteria, SandboxContent, SandboxItem},
    progress::ProgressPatch,
};

#[derive(Clone, Debug)]
pub struct SandboxPlayer {
    content: SandboxContent,
    band: AgeBand,
    /// item id -> zone id, correct placements only
    placements: HashMap<String, String>,
    mistakes: u32,
    last_correct: Option<bool>,
    finished: bool,
}

impl SandboxPlayer {
    pub fn new(content: SandboxContent, band: AgeBand) -> Self {
        Self {
            content,
            band,
            placements: HashMap::new(),
            mistakes: 0,
            last_correct: None,
            finished: false,
        }
    }

    pub fn items(&self) -> &[SandboxItem] {
        &self.content.items
    }

    pub fn placed(&self) -> usize {
        self.placements.len()
    }

    pub fn total(&self) -> usize {
        self.content.items.len()
    }

    pub fn is_placed(&self, item_id: &str) -> bool {
        self.placements.contains_key(item_id)
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    /// Whether the most recent placement was correct, if any was made.
    pub fn last_placement_correct(&self) -> Option<bool> {
        self.last_correct
    }

    pub fn hint(&self) -> Option<&str> {
        self.content.hints.get(self.band).map(String::as_str)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn criteria_met(&self) -> bool {
        match self.content.completion_criteria {
            CompletionCriteria::AllPlaced => self.placed() == self.total(),
            CompletionCriteria::MinCorrect(Some(min)) => self.placed() as i64 >= min,
            CompletionCriteria::MinCorrect(None) => self.placed() == self.total(),
        }
    }

    /// Try to put an item into a zone.
    ///
    /// Wrong placements count as mistakes and leave the item where it was.
    /// Correct ones are kept and reported; the one that satisfies the
    /// completion criteria completes the activity.
    pub fn place(&mut self, item_id: &str, zone_id: &str) -> Result<Step> {
        if self.finished {
            return Err(ActivityError::Finished.into());
        }
        let item = self
            .content
            .items
            .iter()
            .find(|item| item.id == item_id)
            .ok_or_else(|| ActivityError::UnknownItem {
                id: item_id.to_string(),
            })?;
        if !self.content.zones.is_empty() && !self.content.zones.iter().any(|z| z.id == zone_id) {
            return Err(ActivityError::UnknownZone {
                id: zone_id.to_string(),
            }
            .into());
        }
        if self.is_placed(item_id) {
            return Err(ActivityError::AlreadyPlaced {
                id: item_id.to_string(),
            }
            .into());
        }

        if item.correct_zone_id.as_deref() != Some(zone_id) {
            self.mistakes += 1;
            self.last_correct = Some(false);
            return Ok(Step::Idle);
        }

        self.placements
            .insert(item_id.to_string(), zone_id.to_string());
        self.last_correct = Some(true);

        if self.criteria_met() {
            self.finished = true;
            let answers = json!({
                "placed": self.placed(),
                "total": self.total(),
                "mistakes": self.mistakes,
            });
            return Ok(Step::Completed(
                ProgressPatch::completed().with_answers(answers.to_string()),
            ));
        }

        let answers = json!({ "placed": self.placed(), "total": self.total() });
        Ok(Step::Progress(
            ProgressPatch::in_progress().with_answers(answers.to_string()),
        ))
    }
}
