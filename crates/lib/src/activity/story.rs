//! Story player: page by page narration with optional branching choices.

use serde_json::json;

use super::{ActivityError, Step};
use crate::{
    Result,
    content::{AgeBand, StoryContent, StoryPage},
    progress::ProgressPatch,
};

#[derive(Clone, Debug)]
pub struct StoryPlayer {
    content: StoryContent,
    band: AgeBand,
    index: usize,
    finished: bool,
}

impl StoryPlayer {
    /// `content` must have at least one page; parsed content always does.
    pub fn new(content: StoryContent, band: AgeBand) -> Self {
        Self {
            content,
            band,
            index: 0,
            finished: false,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.content.pages.len()
    }

    /// Zero-based index of the page on screen.
    pub fn page_index(&self) -> usize {
        self.index
    }

    pub fn current_page(&self) -> Option<&StoryPage> {
        self.content.pages.get(self.index)
    }

    /// Narration of the current page for the kid's age band.
    pub fn narration(&self) -> Option<&str> {
        self.current_page().map(|page| page.narration_for(self.band))
    }

    pub fn is_last_page(&self) -> bool {
        self.index + 1 >= self.total_pages()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Patch describing the page currently on screen.
    pub fn position_patch(&self) -> ProgressPatch {
        let answers = json!({
            "current_page": self.index + 1,
            "total_pages": self.total_pages(),
        });
        ProgressPatch::in_progress().with_answers(answers.to_string())
    }

    fn check_running(&self) -> Result<()> {
        if self.finished {
            return Err(ActivityError::Finished.into());
        }
        Ok(())
    }

    /// Go to the next page, or finish the story from the last one.
    pub fn advance(&mut self) -> Result<Step> {
        self.check_running()?;
        if self.is_last_page() {
            self.finished = true;
            let total = self.total_pages();
            let answers = json!({ "pages_read": total, "total_pages": total });
            return Ok(Step::Completed(
                ProgressPatch::completed().with_answers(answers.to_string()),
            ));
        }
        self.index += 1;
        Ok(Step::Progress(self.position_patch()))
    }

    /// Go back one page. Does nothing on the first page.
    pub fn back(&mut self) -> Result<Step> {
        self.check_running()?;
        if self.index == 0 {
            return Ok(Step::Idle);
        }
        self.index -= 1;
        Ok(Step::Progress(self.position_patch()))
    }

    /// Follow one of the current page's choices.
    pub fn choose(&mut self, choice: usize) -> Result<Step> {
        self.check_running()?;
        let target = self
            .current_page()
            .and_then(|page| page.choices.get(choice))
            .map(|c| c.next_page_id.clone())
            .ok_or(ActivityError::InvalidChoice { index: choice })?;

        let index = self
            .content
            .pages
            .iter()
            .position(|page| page.id == target)
            .ok_or(ActivityError::InvalidChoice { index: choice })?;
        self.index = index;
        Ok(Step::Progress(self.position_patch()))
    }
}
