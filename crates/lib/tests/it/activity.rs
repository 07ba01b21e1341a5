use std::{sync::Arc, time::Duration};

use kidspark::{
    activity::{Activity, ActivityError, LessonRun},
    content::{AgeBand, LessonContent},
    progress::{ProgressBuffer, ProgressStatus},
};
use serde_json::json;

use crate::helpers::{RecordingSink, settle};

const STORY: &str = r#"{"type":"story","pages":[
    {"id":"p1","narration":"Hello","age_variants":{"3-5":{"narration":"Hi"}}},
    {"id":"p2","narration":"The end"}]}"#;

const QUIZ: &str = r#"{"type":"quiz","questions":[
    {"id":"q1","question":"2+2?","options":[{"id":"a","text":"4"},{"id":"b","text":"5"}],
     "correct_answer":"a"},
    {"id":"q2","question":"3+3?","options":[{"id":"a","text":"6"},{"id":"b","text":"7"}],
     "correct_answer":"a"}]}"#;

fn activity(json: &str, age: i64) -> Activity {
    Activity::new(
        LessonContent::parse(json).expect("lesson parses"),
        AgeBand::for_age(age),
    )
}

fn answers(blob: Option<&str>) -> serde_json::Value {
    serde_json::from_str(blob.expect("answers present")).unwrap()
}

fn recording_buffer() -> (Arc<RecordingSink>, ProgressBuffer) {
    let sink = Arc::new(RecordingSink::default());
    let buffer = ProgressBuffer::new(sink.clone());
    (sink, buffer)
}

#[tokio::test(start_paused = true)]
async fn test_story_run_saves_opening_page_and_completion() {
    let (sink, buffer) = recording_buffer();
    let mut run = LessonRun::start(10, activity(STORY, 7), buffer.clone())
        .await
        .unwrap();
    assert_eq!(buffer.pending_lessons().await.unwrap(), vec![10]);

    tokio::time::sleep(Duration::from_secs(30)).await;
    let step = run.act(|a| a.story_mut()?.advance()).await.unwrap();
    assert!(!step.is_completed());

    let step = run.act(|a| a.story_mut()?.advance()).await.unwrap();
    assert!(step.is_completed());
    settle().await;

    // The opening page went out when the lesson fell quiet; the middle page
    // merged into the completion.
    let sent = sink.sent().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(
        answers(sent[0].1.answers_blob.as_deref()),
        json!({"current_page": 1, "total_pages": 2})
    );
    assert_eq!(sent[0].1.time_spent_seconds, Some(0));

    let (lesson_id, patch) = &sent[1];
    assert_eq!(*lesson_id, 10);
    assert_eq!(patch.status, Some(ProgressStatus::Completed));
    assert_eq!(patch.time_spent_seconds, Some(30));
    assert_eq!(
        answers(patch.answers_blob.as_deref()),
        json!({"pages_read": 2, "total_pages": 2})
    );

    run.finish().await.unwrap();
    settle().await;
    assert_eq!(sink.sent().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_quiz_run_records_score() {
    let (sink, buffer) = recording_buffer();
    let mut run = LessonRun::start(20, activity(QUIZ, 10), buffer.clone())
        .await
        .unwrap();
    assert!(buffer.pending_lessons().await.unwrap().is_empty());

    run.act(|a| a.quiz_mut()?.select("a")).await.unwrap();
    run.act(|a| a.quiz_mut()?.confirm()).await.unwrap();
    run.act(|a| a.quiz_mut()?.next()).await.unwrap();
    run.act(|a| a.quiz_mut()?.select("b")).await.unwrap();
    run.act(|a| a.quiz_mut()?.confirm()).await.unwrap();
    let step = run.act(|a| a.quiz_mut()?.next()).await.unwrap();
    assert!(step.is_completed());
    settle().await;

    let sent = sink.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.score, Some(1));
    assert_eq!(
        answers(sent[0].1.answers_blob.as_deref()),
        json!({"score": 1, "total_questions": 2, "passed": true})
    );
    assert!(run.activity().is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_wrong_activity_is_rejected_without_saving() {
    let (_sink, buffer) = recording_buffer();
    let mut run = LessonRun::start(20, activity(QUIZ, 10), buffer.clone())
        .await
        .unwrap();

    let err = run.act(|a| a.story_mut()?.advance()).await.unwrap_err();
    assert!(matches!(
        err,
        kidspark::Error::Activity(ActivityError::WrongActivity { .. })
    ));
    assert!(buffer.pending_lessons().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_run_still_flushes() {
    let (sink, buffer) = recording_buffer();
    let mut run = LessonRun::start(10, activity(STORY, 4), buffer.clone())
        .await
        .unwrap();
    assert_eq!(run.activity().kind(), "story");
    let Activity::Story(player) = run.activity() else {
        panic!("expected story");
    };
    assert_eq!(player.narration(), Some("Hi"));
    run.act(|a| a.story_mut()?.advance()).await.unwrap();

    drop(run);
    settle().await;

    let sent = sink.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.status, Some(ProgressStatus::InProgress));
    assert_eq!(
        answers(sent[0].1.answers_blob.as_deref()),
        json!({"current_page": 2, "total_pages": 2})
    );
}
