use std::sync::Arc;
use std::time::Duration;

use besto::clock::{Clock, ManualClock};
use besto::models::event::{EventDraft, EventType};
use besto::models::task::{Priority, Task};
use besto::persistence::event_repo::EventRepo;
use besto::reminders::{Celebration, ReminderCenter};
use besto::AppError;

use crate::common::{at, clock_at, date, memory_store, monday_morning, time};

struct Fixture {
    center: ReminderCenter,
    events: EventRepo,
    clock: Arc<ManualClock>,
    celebration: Arc<Celebration>,
}

fn fixture() -> Fixture {
    let events = EventRepo::new(memory_store());
    let clock = clock_at(monday_morning());
    let celebration = Arc::new(Celebration::new(Duration::from_secs(5)));
    let center = ReminderCenter::new(
        events.clone(),
        Arc::clone(&clock) as Arc<dyn Clock>,
        Arc::clone(&celebration),
        60,
    );
    Fixture {
        center,
        events,
        clock,
        celebration,
    }
}

fn draft(title: &str, event_type: EventType, h: u32, m: u32) -> EventDraft {
    EventDraft::new(title.into(), event_type, date(2025, 3, 10), Some(time(h, m)))
}

#[tokio::test]
async fn due_birthday_fires_once_with_celebration() {
    let f = fixture();
    let birthday = f
        .events
        .append(draft("Mom", EventType::Birthday, 8, 0))
        .await
        .expect("append");

    let fired = f.center.tick().await.expect("tick").expect("due");
    assert_eq!(fired.id, birthday.id);
    assert!(f.celebration.is_active());

    let view = f.center.active().await.expect("active view");
    assert_eq!(view.title, "🎉 Happy Birthday, Mom!");
    assert_eq!(view.scheduled_for, "Scheduled for: 08:00");
    assert_eq!(view.body, "This is your scheduled reminder for \"Mom\".");
    assert!(view.celebrating);

    let dismissed = f.center.dismiss().await.expect("dismiss");
    assert!(dismissed.is_triggered());
    assert!(f.center.active().await.is_none());
    assert!(!f.celebration.is_active());

    f.clock.advance(chrono::Duration::days(1));
    assert!(f.center.tick().await.expect("tick").is_none());
    assert!(f.events.get(&birthday.id).await.expect("get").is_triggered());
}

#[tokio::test]
async fn future_reminder_waits_for_its_time() {
    let f = fixture();
    f.events
        .append(draft("Stretch", EventType::Reminder, 9, 30))
        .await
        .expect("append");

    assert!(f.center.tick().await.expect("tick").is_none());

    f.clock.set(at(2025, 3, 10, 9, 30));
    let fired = f.center.tick().await.expect("tick").expect("due");
    assert_eq!(fired.title, "Stretch");
    assert!(!f.celebration.is_active());
    assert_eq!(
        f.center.active().await.expect("view").title,
        "Reminder: Stretch"
    );
}

#[tokio::test]
async fn meetings_and_appointments_never_fire() {
    let f = fixture();
    f.events
        .append(draft("Standup", EventType::Meeting, 8, 0))
        .await
        .expect("append");
    f.events
        .append(draft("Dentist", EventType::Appointment, 8, 30))
        .await
        .expect("append");

    assert!(f.center.tick().await.expect("tick").is_none());
}

#[tokio::test]
async fn one_reminder_at_a_time_in_store_order() {
    let f = fixture();
    let first = f
        .events
        .append(draft("First", EventType::Reminder, 8, 45))
        .await
        .expect("append");
    let second = f
        .events
        .append(draft("Second", EventType::Reminder, 7, 0))
        .await
        .expect("append");

    assert_eq!(f.center.tick().await.expect("tick").expect("due").id, first.id);
    assert!(
        f.center.tick().await.expect("tick").is_none(),
        "slot is occupied"
    );

    f.center.dismiss().await.expect("dismiss");
    assert_eq!(f.center.tick().await.expect("tick").expect("due").id, second.id);
}

#[tokio::test]
async fn all_day_event_is_due_from_midnight() {
    let f = fixture();
    let mut holiday = EventDraft::new(
        "Launch day".into(),
        EventType::ImportantDate,
        date(2025, 3, 10),
        None,
    );
    holiday.all_day = true;
    holiday.description = Some("Ship it".into());
    f.events.append(holiday).await.expect("append");

    f.center.tick().await.expect("tick").expect("due");
    let view = f.center.active().await.expect("view");
    assert_eq!(view.title, "🌟 Important: Launch day");
    assert_eq!(view.scheduled_for, "Scheduled for: All day");
    assert_eq!(view.body, "Ship it");
}

#[tokio::test]
async fn anniversary_title() {
    let f = fixture();
    f.events
        .append(draft("Us", EventType::Anniversary, 6, 0))
        .await
        .expect("append");
    f.center.tick().await.expect("tick");
    assert_eq!(
        f.center.active().await.expect("view").title,
        "💖 Happy Anniversary!"
    );
}

#[tokio::test]
async fn dismiss_without_active_reminder_is_invalid() {
    let f = fixture();
    assert!(matches!(
        f.center.dismiss().await,
        Err(AppError::InvalidState(_))
    ));
}

#[tokio::test]
async fn dismiss_after_event_deleted_clears_slot() {
    let f = fixture();
    let event = f
        .events
        .append(draft("Gone", EventType::Reminder, 8, 0))
        .await
        .expect("append");
    f.center.tick().await.expect("tick").expect("due");
    f.events.delete(&event.id).await.expect("delete");

    let dismissed = f.center.dismiss().await.expect("dismiss");
    assert_eq!(dismissed.id, event.id);
    assert!(f.center.active().await.is_none());
}

#[tokio::test]
async fn task_reminder_is_scheduled_ahead() {
    let f = fixture();
    let task = Task::new("file taxes".into(), Priority::High, None, None);

    let event = f.center.remind_for_task(&task).await.expect("remind");
    assert_eq!(event.title, "Reminder: file taxes");
    assert_eq!(event.event_type, EventType::Reminder);
    assert_eq!(event.start_date, date(2025, 3, 10));
    assert_eq!(event.start_time, Some(time(10, 0)));
    assert_eq!(
        event.description.as_deref(),
        Some("This is a reminder for your task: \"file taxes\"")
    );

    assert!(f.center.tick().await.expect("tick").is_none());
    f.clock.advance(chrono::Duration::minutes(60));
    assert_eq!(f.center.tick().await.expect("tick").expect("due").id, event.id);
}

#[tokio::test]
async fn task_reminder_time_matches_what_is_stored() {
    let f = fixture();
    f.clock.set(at(2025, 3, 10, 9, 0) + chrono::Duration::seconds(42));
    let task = Task::new("call the bank".into(), Priority::Medium, None, None);

    let event = f.center.remind_for_task(&task).await.expect("remind");
    assert_eq!(event.start_time, Some(time(10, 0)));

    let stored = f.events.get(&event.id).await.expect("stored");
    assert_eq!(stored, event);
    assert_eq!(f.events.list().await.expect("events"), vec![event]);
}

#[tokio::test]
async fn celebration_expires() {
    let celebration = Celebration::new(Duration::from_millis(30));
    assert!(!celebration.is_active());
    celebration.raise();
    assert!(celebration.is_active());
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!celebration.is_active());
}
