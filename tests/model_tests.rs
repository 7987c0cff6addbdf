use chrono::{Duration, Local, TimeZone};
use taskmate::models::{NewTask, Task, TaskStatus, ValidationError, MAX_DESCRIPTION_CHARS};
use taskmate::quota::{ApiLimit, FREE_REQUEST_LIMIT};

fn task(status: TaskStatus, deadline_offset: Option<Duration>) -> Task {
    let now = Local::now();
    NewTask::new(1, "Test")
        .with_status(status)
        .with_deadline(deadline_offset.map(|offset| now + offset))
        .into_task(1)
}

#[test]
fn test_user_id_must_be_positive() {
    assert_eq!(NewTask::new(0, "x").validate(), Err(ValidationError::InvalidUser));
    assert_eq!(NewTask::new(-3, "x").validate(), Err(ValidationError::InvalidUser));
    assert_eq!(NewTask::new(1, "x").validate(), Ok(()));
}

#[test]
fn test_blank_description_is_rejected() {
    assert_eq!(NewTask::new(1, "").validate(), Err(ValidationError::EmptyDescription));
    assert_eq!(NewTask::new(1, " \t\n").validate(), Err(ValidationError::EmptyDescription));
}

#[test]
fn test_description_length_is_counted_in_characters() {
    assert_eq!(NewTask::new(1, "a".repeat(MAX_DESCRIPTION_CHARS)).validate(), Ok(()));
    assert_eq!(
        NewTask::new(1, "a".repeat(MAX_DESCRIPTION_CHARS + 1)).validate(),
        Err(ValidationError::DescriptionTooLong)
    );
    // 2000 bytes, 1000 characters.
    assert_eq!(NewTask::new(1, "я".repeat(MAX_DESCRIPTION_CHARS)).validate(), Ok(()));
}

#[test]
fn test_status_parsing() {
    assert_eq!(TaskStatus::parse_optional(""), Ok(None));
    assert_eq!(TaskStatus::parse_optional("active"), Ok(Some(TaskStatus::Active)));
    assert_eq!(TaskStatus::parse_optional("postponed"), Ok(Some(TaskStatus::Postponed)));
    assert_eq!(
        TaskStatus::parse_optional("bogus"),
        Err(ValidationError::InvalidStatus("bogus".into()))
    );
    assert_eq!("done".parse::<TaskStatus>(), Ok(TaskStatus::Done));
    assert!("".parse::<TaskStatus>().is_err());
}

#[test]
fn test_status_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&TaskStatus::Postponed).unwrap(), "\"postponed\"");
    assert_eq!(TaskStatus::Done.to_string(), "done");
    assert_eq!(TaskStatus::default(), TaskStatus::Active);
}

#[test]
fn test_set_defaults_keeps_explicit_values() {
    let created = Local.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap();
    let now = Local::now();

    let mut fresh = NewTask::new(1, "x");
    fresh.set_defaults(now);
    assert_eq!(fresh.status, Some(TaskStatus::Active));
    assert_eq!(fresh.created_at, Some(now));
    assert_eq!(fresh.updated_at, Some(now));

    let mut dated = NewTask::new(1, "x")
        .with_status(TaskStatus::Done)
        .with_created_at(created);
    dated.set_defaults(now);
    assert_eq!(dated.status, Some(TaskStatus::Done));
    assert_eq!(dated.created_at, Some(created));
}

#[test]
fn test_overdue_rules() {
    let past = Some(Duration::days(-1));
    let future = Some(Duration::days(1));

    assert!(task(TaskStatus::Active, past).is_overdue());
    assert!(task(TaskStatus::Postponed, past).is_overdue());
    assert!(!task(TaskStatus::Done, past).is_overdue());
    assert!(!task(TaskStatus::Active, future).is_overdue());
    assert!(!task(TaskStatus::Active, None).is_overdue());
}

#[test]
fn test_deadline_equal_to_now_is_not_overdue() {
    let t = task(TaskStatus::Active, Some(Duration::zero()));
    let deadline = t.deadline.unwrap();
    assert!(!t.is_overdue_at(deadline));
    assert!(t.is_overdue_at(deadline + Duration::seconds(1)));
}

#[test]
fn test_effective_description() {
    let plain = NewTask::new(1, "original").into_task(1);
    assert_eq!(plain.effective_description(), "original");

    let processed = NewTask::new(1, "original")
        .with_processed_description("processed")
        .into_task(1);
    assert_eq!(processed.effective_description(), "processed");

    let empty = NewTask::new(1, "original")
        .with_processed_description("")
        .into_task(1);
    assert_eq!(empty.effective_description(), "original");
}

#[test]
fn test_api_limit_counts_down_for_free_users() {
    let now = Local.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    let mut limit = ApiLimit::new(42, now);
    assert_eq!(limit.reset_date, Local.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap());
    assert_eq!(limit.remaining_requests_at(now), Some(FREE_REQUEST_LIMIT));

    for _ in 0..FREE_REQUEST_LIMIT {
        assert!(limit.can_make_request_at(now));
        limit.increment_requests();
    }
    assert!(!limit.can_make_request_at(now));
    assert_eq!(limit.remaining_requests_at(now), Some(0));

    let next_period = Local.with_ymd_and_hms(2025, 4, 2, 9, 0, 0).unwrap();
    assert!(limit.should_reset_at(next_period));
    assert!(limit.can_make_request_at(next_period));
    limit.reset(next_period);
    assert_eq!(limit.requests_count, 0);
    assert_eq!(limit.reset_date, Local.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap());
}

#[test]
fn test_api_limit_premium_and_validation() {
    let now = Local.with_ymd_and_hms(2025, 12, 20, 9, 0, 0).unwrap();
    let mut limit = ApiLimit::new(7, now);
    assert_eq!(limit.reset_date, Local.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());

    limit.is_premium = true;
    limit.requests_count = 500;
    assert!(limit.can_make_request_at(now));
    assert_eq!(limit.remaining_requests_at(now), None);

    assert_eq!(ApiLimit::new(0, now).validate(), Err(ValidationError::InvalidUser));
}
