use std::sync::Arc;

use besto::assistant::AssistantService;
use besto::capture::{DispatchOutcome, Dispatcher};
use besto::capture::dispatcher::SUMMARY_NOTE_TITLE;
use besto::clock::Clock;
use besto::models::classification::{ClassificationType, ExtractedItem};
use besto::models::event::{EventDraft, EventType};
use besto::models::note::QUICK_CAPTURE_TAG;
use besto::models::task::Priority;
use besto::persistence::event_repo::EventRepo;
use besto::persistence::note_repo::NoteRepo;
use besto::persistence::task_repo::TaskRepo;

use crate::common::{
    classification, clock_at, conflicting_item, date, event_item, memory_store, monday_morning,
    task_item, time, FakeAssistant,
};

struct Fixture {
    dispatcher: Dispatcher,
    assistant: Arc<FakeAssistant>,
    tasks: TaskRepo,
    notes: NoteRepo,
    events: EventRepo,
}

fn fixture(assistant: FakeAssistant) -> Fixture {
    let store = memory_store();
    let assistant = Arc::new(assistant);
    let tasks = TaskRepo::new(store.clone());
    let notes = NoteRepo::new(store.clone());
    let events = EventRepo::new(store);
    let dispatcher = Dispatcher::new(
        Arc::clone(&assistant) as Arc<dyn AssistantService>,
        clock_at(monday_morning()) as Arc<dyn Clock>,
        tasks.clone(),
        notes.clone(),
        events.clone(),
    );
    Fixture {
        dispatcher,
        assistant,
        tasks,
        notes,
        events,
    }
}

fn completed(outcome: DispatchOutcome) -> String {
    match outcome {
        DispatchOutcome::Completed { feedback } => feedback,
        DispatchOutcome::Conflict(_) => panic!("expected completion"),
    }
}

#[tokio::test]
async fn task_capture_saves_summary_then_task() {
    let f = fixture(FakeAssistant::default());
    let result = classification(ClassificationType::Task, "Buy milk", vec![task_item("buy milk")]);

    let feedback = completed(f.dispatcher.apply(&result).await.expect("apply"));
    assert_eq!(feedback, "Summary saved to notes & Task created!");

    let notes = f.notes.list().await.expect("notes");
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, SUMMARY_NOTE_TITLE);
    assert_eq!(notes[0].content, "Buy milk");
    assert_eq!(notes[0].tags, vec![QUICK_CAPTURE_TAG.to_owned()]);

    let tasks = f.tasks.list().await.expect("tasks");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].content, "buy milk");
}

#[tokio::test]
async fn blank_summary_saves_no_note() {
    let f = fixture(FakeAssistant::default());
    let result = classification(ClassificationType::Task, "  ", vec![task_item("water plants")]);

    let feedback = completed(f.dispatcher.apply(&result).await.expect("apply"));
    assert_eq!(feedback, "Task created!");
    assert!(f.notes.list().await.expect("notes").is_empty());
}

#[tokio::test]
async fn task_content_falls_back_to_title_then_default() {
    let f = fixture(FakeAssistant::default());
    let titled = ExtractedItem {
        title: Some("Renew passport".into()),
        priority: Some(Priority::High),
        date: Some("2025-03-12".into()),
        time: Some("not a time".into()),
        ..ExtractedItem::default()
    };
    f.dispatcher
        .apply(&classification(ClassificationType::Task, "", vec![titled]))
        .await
        .expect("apply");
    f.dispatcher
        .apply(&classification(ClassificationType::Task, "", vec![]))
        .await
        .expect("apply");

    let tasks = f.tasks.list().await.expect("tasks");
    assert_eq!(tasks[0].content, "New Task");
    assert_eq!(tasks[1].content, "Renew passport");
    assert_eq!(tasks[1].priority, Priority::High);
    assert_eq!(tasks[1].due_date, Some(date(2025, 3, 12)));
    assert!(tasks[1].due_time.is_none());
}

#[tokio::test]
async fn multi_task_creates_each_item_in_order() {
    let f = fixture(FakeAssistant::default());
    let result = classification(
        ClassificationType::MultiTask,
        "Errands",
        vec![task_item("milk"), task_item("bread"), task_item("stamps")],
    );

    let feedback = completed(f.dispatcher.apply(&result).await.expect("apply"));
    assert_eq!(feedback, "Summary saved to notes & 3 tasks created!");

    let contents: Vec<String> = f
        .tasks
        .list()
        .await
        .expect("tasks")
        .into_iter()
        .map(|t| t.content)
        .collect();
    assert_eq!(contents, vec!["milk", "bread", "stamps"]);
}

#[tokio::test]
async fn empty_multi_task_creates_one_default_task() {
    let f = fixture(FakeAssistant::default());
    let result = classification(ClassificationType::MultiTask, "", vec![]);

    let feedback = completed(f.dispatcher.apply(&result).await.expect("apply"));
    assert_eq!(feedback, "Task created!");

    let tasks = f.tasks.list().await.expect("tasks");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].content, "New Task");
}

#[tokio::test]
async fn note_without_title_gets_default() {
    let f = fixture(FakeAssistant::default());
    let result = classification(
        ClassificationType::Note,
        "",
        vec![ExtractedItem::with_content("the wifi password is on the fridge")],
    );

    let feedback = completed(f.dispatcher.apply(&result).await.expect("apply"));
    assert_eq!(feedback, "Note created!");

    let notes = f.notes.list().await.expect("notes");
    assert_eq!(notes[0].title, "New Note");
    assert_eq!(notes[0].content, "the wifi password is on the fridge");
    assert!(notes[0].tags.is_empty());
}

#[tokio::test]
async fn event_is_appended_with_celebration_flag() {
    let f = fixture(FakeAssistant::default());
    let result = classification(
        ClassificationType::Event,
        "Sam's birthday",
        vec![event_item("Sam", "2025-03-14", "08:00", EventType::Birthday)],
    );

    let feedback = completed(f.dispatcher.apply(&result).await.expect("apply"));
    assert_eq!(feedback, "Summary saved to notes & Event created!");

    let events = f.events.list().await.expect("events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].start_date, date(2025, 3, 14));
    assert_eq!(events[0].start_time, Some(time(8, 0)));
    assert_eq!(events[0].celebration, Some(true));
    assert!(events[0].triggered.is_none());
}

#[tokio::test]
async fn event_defaults_fill_missing_fields() {
    let f = fixture(FakeAssistant::default());
    let result = classification(ClassificationType::Event, "", vec![ExtractedItem::default()]);

    f.dispatcher.apply(&result).await.expect("apply");

    let events = f.events.list().await.expect("events");
    assert_eq!(events[0].title, "New Event");
    assert_eq!(events[0].event_type, EventType::Meeting);
    assert_eq!(events[0].start_date, date(2025, 3, 10));
    assert_eq!(events[0].start_time, Some(time(12, 0)));
    assert_eq!(events[0].celebration, Some(false));
}

#[tokio::test]
async fn conflict_with_three_suggestions_defers_the_event() {
    let f = fixture(FakeAssistant::default());
    let result = classification(
        ClassificationType::Event,
        "Review",
        vec![conflicting_item(
            "Review",
            &["2025-03-10 16:00", "2025-03-11 09:00", "2025-03-11 13:00"],
        )],
    );

    match f.dispatcher.apply(&result).await.expect("apply") {
        DispatchOutcome::Conflict(conflict) => {
            assert_eq!(conflict.suggestions.len(), 3);
            assert_eq!(conflict.original_event_data.title, "Review");
        }
        DispatchOutcome::Completed { .. } => panic!("expected conflict"),
    }
    assert!(f.events.list().await.expect("events").is_empty());
    assert_eq!(f.notes.list().await.expect("notes").len(), 1);
}

#[tokio::test]
async fn conflict_without_three_suggestions_is_scheduled_as_requested() {
    let f = fixture(FakeAssistant::default());
    let result = classification(
        ClassificationType::Event,
        "",
        vec![conflicting_item("Review", &["2025-03-10 16:00"])],
    );

    let feedback = completed(f.dispatcher.apply(&result).await.expect("apply"));
    assert_eq!(feedback, "Event created!");
    let events = f.events.list().await.expect("events");
    assert_eq!(events[0].start_time, Some(time(15, 0)));
}

#[tokio::test]
async fn unknown_intent_only_reports() {
    let f = fixture(FakeAssistant::default());
    let result = classification(ClassificationType::Unknown, "", vec![]);

    let feedback = completed(f.dispatcher.apply(&result).await.expect("apply"));
    assert_eq!(feedback, "Could not classify intent!");
    assert!(f.tasks.list().await.expect("tasks").is_empty());
    assert!(f.events.list().await.expect("events").is_empty());
}

#[tokio::test]
async fn classify_sends_calendar_context() {
    let f = fixture(FakeAssistant::classifying(classification(
        ClassificationType::Unknown,
        "",
        vec![],
    )));
    f.events
        .append(EventDraft::new(
            "Standup".into(),
            EventType::Meeting,
            date(2025, 3, 10),
            Some(time(9, 30)),
        ))
        .await
        .expect("append");

    f.dispatcher.classify("what's on today").await;

    let seen = f.assistant.calendar_seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].title, "Standup");
    assert_eq!(seen[0].start_time, Some(time(9, 30)));
}

#[tokio::test]
async fn classifier_failure_degrades_to_unknown() {
    let f = fixture(FakeAssistant::default());

    let result = f.dispatcher.classify("gibberish").await;
    assert_eq!(result.kind, ClassificationType::Unknown);
    assert_eq!(result.summary, "Could not process the request: \"gibberish\"");

    let feedback = completed(f.dispatcher.apply(&result).await.expect("apply"));
    assert_eq!(feedback, "Summary saved to notes & Could not classify intent!");
}
