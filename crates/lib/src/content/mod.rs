//! Lesson bodies
//!
//! A lesson's content is one of three activity shapes, told apart by a
//! `"type"` field in its JSON. Decoding goes through [`LessonContent::parse`],
//! which also rejects content no player could run.

mod errors;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub use errors::ContentError;

use crate::Result;

/// Age bands used to pick narration variants and hints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeBand {
    #[serde(rename = "3-5")]
    Young,
    #[serde(rename = "6-8")]
    Middle,
    #[serde(rename = "9-12")]
    Older,
}

impl AgeBand {
    pub fn for_age(age: i64) -> Self {
        match age {
            ..=5 => AgeBand::Young,
            6..=8 => AgeBand::Middle,
            _ => AgeBand::Older,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeBand::Young => "3-5",
            AgeBand::Middle => "6-8",
            AgeBand::Older => "9-12",
        }
    }
}

/// Optional per-age-band values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByAgeBand<T> {
    #[serde(rename = "3-5", default, skip_serializing_if = "Option::is_none")]
    pub young: Option<T>,
    #[serde(rename = "6-8", default, skip_serializing_if = "Option::is_none")]
    pub middle: Option<T>,
    #[serde(rename = "9-12", default, skip_serializing_if = "Option::is_none")]
    pub older: Option<T>,
}

impl<T> Default for ByAgeBand<T> {
    fn default() -> Self {
        Self {
            young: None,
            middle: None,
            older: None,
        }
    }
}

impl<T> ByAgeBand<T> {
    pub fn get(&self, band: AgeBand) -> Option<&T> {
        match band {
            AgeBand::Young => self.young.as_ref(),
            AgeBand::Middle => self.middle.as_ref(),
            AgeBand::Older => self.older.as_ref(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    #[serde(default)]
    pub avatar_key: String,
    #[serde(default)]
    pub personality: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narration {
    pub narration: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryChoice {
    pub label: String,
    pub next_page_id: String,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryPage {
    pub id: String,
    pub narration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_dialogue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<StoryChoice>,
    #[serde(default)]
    pub age_variants: ByAgeBand<Narration>,
}

impl StoryPage {
    /// Narration for the band, falling back to the default text.
    pub fn narration_for(&self, band: AgeBand) -> &str {
        self.age_variants
            .get(band)
            .map(|v| v.narration.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.narration)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryContent {
    #[serde(default)]
    pub character: Character,
    pub pages: Vec<StoryPage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_key: Option<String>,
}

fn default_points() -> i64 {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub question_type: String,
    pub options: Vec<QuizOption>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub hints: ByAgeBand<String>,
    #[serde(default = "default_points")]
    pub points: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizContent {
    #[serde(default)]
    pub character: Character,
    pub questions: Vec<QuizQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passing_score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_message: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxType {
    DragAndDrop,
    Sorting,
    Matching,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxItem {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        alias = "correct_zone",
        skip_serializing_if = "Option::is_none"
    )]
    pub correct_zone_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxZone {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub accepts: Vec<String>,
}

/// When a sandbox counts as done.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CompletionCriteria {
    /// Every item is in its zone.
    #[default]
    AllPlaced,
    /// At least this many items are in their zones.
    MinCorrect(Option<i64>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxContent {
    #[serde(default)]
    pub character: Character,
    pub sandbox_type: SandboxType,
    pub items: Vec<SandboxItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub zones: Vec<SandboxZone>,
    #[serde(default)]
    pub completion_criteria: CompletionCriteria,
    #[serde(default)]
    pub hints: ByAgeBand<String>,
}

/// A lesson body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LessonContent {
    Story(StoryContent),
    Quiz(QuizContent),
    Sandbox(SandboxContent),
}

impl LessonContent {
    /// Decode and validate lesson JSON.
    pub fn parse(json: &str) -> Result<Self> {
        let content: LessonContent =
            serde_json::from_str(json).map_err(|e| ContentError::Malformed {
                reason: e.to_string(),
            })?;
        content.validate()?;
        Ok(content)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LessonContent::Story(_) => "story",
            LessonContent::Quiz(_) => "quiz",
            LessonContent::Sandbox(_) => "sandbox",
        }
    }

    /// Check that a player can run this content to completion.
    pub fn validate(&self) -> Result<()> {
        match self {
            LessonContent::Story(story) => {
                if story.pages.is_empty() {
                    return Err(ContentError::Empty {
                        kind: "story",
                        what: "page",
                    }
                    .into());
                }
                let ids: HashSet<&str> = story.pages.iter().map(|p| p.id.as_str()).collect();
                for page in &story.pages {
                    if let Some(choice) = page
                        .choices
                        .iter()
                        .find(|c| !ids.contains(c.next_page_id.as_str()))
                    {
                        return Err(ContentError::UnknownPage {
                            page_id: page.id.clone(),
                            target: choice.next_page_id.clone(),
                        }
                        .into());
                    }
                }
            }
            LessonContent::Quiz(quiz) => {
                if quiz.questions.is_empty() {
                    return Err(ContentError::Empty {
                        kind: "quiz",
                        what: "question",
                    }
                    .into());
                }
                for question in &quiz.questions {
                    if !question.options.iter().any(|o| o.id == question.correct_answer) {
                        return Err(ContentError::UnknownAnswer {
                            question_id: question.id.clone(),
                            answer: question.correct_answer.clone(),
                        }
                        .into());
                    }
                }
            }
            LessonContent::Sandbox(sandbox) => {
                if sandbox.items.is_empty() {
                    return Err(ContentError::Empty {
                        kind: "sandbox",
                        what: "item",
                    }
                    .into());
                }
                if sandbox.completion_criteria == CompletionCriteria::MinCorrect(None) {
                    return Err(ContentError::MissingCriteriaValue {
                        criteria: "min_correct",
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}
