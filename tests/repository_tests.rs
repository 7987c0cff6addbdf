use chrono::{DateTime, Local, NaiveDate, TimeZone};
use tempfile::TempDir;
use taskmate::dates::end_of_day;
use taskmate::models::{NewTask, TaskStatus, ValidationError};
use taskmate::repository::{RepoError, TaskRepository};
use taskmate::storage::{self, Backend, JsonTaskStore, SqliteTaskStore};

const USER: i64 = 100;
const OTHER_USER: i64 = 200;

fn day(y: i32, m: u32, d: u32) -> DateTime<Local> {
    end_of_day(NaiveDate::from_ymd_opt(y, m, d).unwrap()).unwrap()
}

fn sqlite_repo() -> (Option<TempDir>, TaskRepository) {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    (None, TaskRepository::new(Box::new(store)))
}

fn json_repo() -> (Option<TempDir>, TaskRepository) {
    let dir = TempDir::new().unwrap();
    let store = JsonTaskStore::new(dir.path().join("tasks.json"));
    (Some(dir), TaskRepository::new(Box::new(store)))
}

/// Runs each listed check once per storage backend.
macro_rules! contract_tests {
    ($($name:ident),* $(,)?) => {
        mod sqlite {
            $(
                #[test]
                fn $name() {
                    let (_dir, repo) = super::sqlite_repo();
                    super::$name(&repo);
                }
            )*
        }

        mod json {
            $(
                #[test]
                fn $name() {
                    let (_dir, repo) = super::json_repo();
                    super::$name(&repo);
                }
            )*
        }
    };
}

contract_tests!(
    add_then_get_round_trips,
    add_rejects_invalid_tasks,
    active_list_shares_one_timeline,
    overdue_list_excludes_done_postponed_and_foreign,
    overdue_boundary_is_strict,
    all_tasks_newest_first,
    list_by_status_filters,
    update_persists_and_stamps,
    missing_tasks_are_not_found,
    ids_are_not_reused,
);

fn add_then_get_round_trips(repo: &TaskRepository) {
    let added = repo
        .add(
            NewTask::new(USER, "Купить продукты")
                .with_deadline(Some(day(2025, 7, 20)))
                .with_processed_description("Купить продукты на неделю"),
        )
        .unwrap();

    assert!(added.id > 0);
    assert_eq!(added.status, TaskStatus::Active);
    assert_eq!(added.created_at, added.updated_at);

    let fetched = repo.get(added.id).unwrap();
    assert_eq!(fetched, added);
    assert_eq!(fetched.effective_description(), "Купить продукты на неделю");
}

fn add_rejects_invalid_tasks(repo: &TaskRepository) {
    assert!(matches!(
        repo.add(NewTask::new(0, "x")),
        Err(RepoError::Validation(ValidationError::InvalidUser))
    ));
    assert!(matches!(
        repo.add(NewTask::new(USER, "   ")),
        Err(RepoError::Validation(ValidationError::EmptyDescription))
    ));
    assert!(repo.list_by_user(USER).unwrap().is_empty());
}

fn active_list_shares_one_timeline(repo: &TaskRepository) {
    let d2 = repo
        .add(NewTask::new(USER, "D2").with_deadline(Some(day(2025, 1, 10))))
        .unwrap();
    let undated = repo
        .add(
            NewTask::new(USER, "no deadline")
                .with_created_at(Local.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap()),
        )
        .unwrap();
    let d1 = repo
        .add(NewTask::new(USER, "D1").with_deadline(Some(day(2025, 1, 1))))
        .unwrap();
    repo.add(NewTask::new(USER, "finished").with_status(TaskStatus::Done))
        .unwrap();
    repo.add(NewTask::new(OTHER_USER, "foreign")).unwrap();

    let ids: Vec<i64> = repo.list_active(USER).unwrap().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![d1.id, undated.id, d2.id]);
}

fn overdue_list_excludes_done_postponed_and_foreign(repo: &TaskRepository) {
    let now = Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    let late = repo
        .add(NewTask::new(USER, "late").with_deadline(Some(day(2025, 5, 20))))
        .unwrap();
    let later = repo
        .add(NewTask::new(USER, "very late").with_deadline(Some(day(2025, 5, 1))))
        .unwrap();
    repo.add(NewTask::new(USER, "on time").with_deadline(Some(day(2025, 6, 1))))
        .unwrap();
    repo.add(NewTask::new(USER, "no deadline")).unwrap();
    repo.add(
        NewTask::new(USER, "done late")
            .with_deadline(Some(day(2025, 5, 2)))
            .with_status(TaskStatus::Done),
    )
    .unwrap();
    repo.add(
        NewTask::new(USER, "postponed late")
            .with_deadline(Some(day(2025, 5, 2)))
            .with_status(TaskStatus::Postponed),
    )
    .unwrap();
    repo.add(NewTask::new(OTHER_USER, "foreign").with_deadline(Some(day(2025, 5, 2))))
        .unwrap();

    let ids: Vec<i64> = repo
        .list_overdue_at(USER, now)
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![later.id, late.id]);
}

fn overdue_boundary_is_strict(repo: &TaskRepository) {
    let deadline = day(2025, 5, 20);
    let task = repo
        .add(NewTask::new(USER, "due").with_deadline(Some(deadline)))
        .unwrap();

    assert!(repo.list_overdue_at(USER, deadline).unwrap().is_empty());
    let ids: Vec<i64> = repo
        .list_overdue_at(USER, deadline + chrono::Duration::seconds(1))
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![task.id]);
}

fn all_tasks_newest_first(repo: &TaskRepository) {
    let older = repo
        .add(
            NewTask::new(USER, "older")
                .with_created_at(Local.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap()),
        )
        .unwrap();
    let newer = repo
        .add(
            NewTask::new(USER, "newer")
                .with_status(TaskStatus::Done)
                .with_created_at(Local.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap()),
        )
        .unwrap();
    repo.add(NewTask::new(OTHER_USER, "foreign")).unwrap();

    let ids: Vec<i64> = repo.list_by_user(USER).unwrap().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}

fn list_by_status_filters(repo: &TaskRepository) {
    repo.add(NewTask::new(USER, "a")).unwrap();
    let done = repo
        .add(NewTask::new(USER, "b").with_status(TaskStatus::Done))
        .unwrap();

    let listed = repo.list_by_status(USER, TaskStatus::Done).unwrap();
    assert_eq!(listed, vec![done]);
    assert!(repo.list_by_status(USER, TaskStatus::Postponed).unwrap().is_empty());
}

fn update_persists_and_stamps(repo: &TaskRepository) {
    let mut task = repo.add(NewTask::new(USER, "draft")).unwrap();
    let before = task.updated_at;

    task.original_description = "final".into();
    task.status = TaskStatus::Postponed;
    task.deadline = Some(day(2030, 1, 1));
    repo.update(&mut task).unwrap();
    assert!(task.updated_at >= before);

    let stored = repo.get(task.id).unwrap();
    assert_eq!(stored, task);

    task.original_description = String::new();
    assert!(matches!(
        repo.update(&mut task),
        Err(RepoError::Validation(ValidationError::EmptyDescription))
    ));
    assert_eq!(repo.get(task.id).unwrap().original_description, "final");
}

fn missing_tasks_are_not_found(repo: &TaskRepository) {
    assert!(matches!(repo.get(999), Err(RepoError::NotFound(999))));
    assert!(matches!(repo.delete(999), Err(RepoError::NotFound(999))));

    let mut ghost = NewTask::new(USER, "ghost").into_task(999);
    assert!(matches!(repo.update(&mut ghost), Err(RepoError::NotFound(999))));
}

fn ids_are_not_reused(repo: &TaskRepository) {
    let first = repo.add(NewTask::new(USER, "first")).unwrap();
    let second = repo.add(NewTask::new(USER, "second")).unwrap();
    assert!(second.id > first.id);

    repo.delete(second.id).unwrap();
    assert!(matches!(repo.get(second.id), Err(RepoError::NotFound(_))));

    let third = repo.add(NewTask::new(USER, "third")).unwrap();
    assert!(third.id > second.id);
}

#[test]
fn test_backend_is_chosen_by_extension() {
    use std::path::Path;
    assert_eq!(Backend::for_path(Path::new("tasks.json")), Backend::Json);
    assert_eq!(Backend::for_path(Path::new("tasks.JSON")), Backend::Json);
    assert_eq!(Backend::for_path(Path::new("tasks.db")), Backend::Sqlite);
    assert_eq!(Backend::for_path(Path::new("tasks")), Backend::Sqlite);
}

#[test]
fn test_file_stores_survive_reopening() {
    let dir = TempDir::new().unwrap();
    for name in ["nested/tasks.db", "nested/tasks.json"] {
        let path = dir.path().join(name);
        let id = {
            let repo = TaskRepository::new(storage::open(&path).unwrap());
            repo.add(NewTask::new(USER, "persisted")).unwrap().id
        };

        let repo = TaskRepository::new(storage::open(&path).unwrap());
        assert_eq!(repo.get(id).unwrap().original_description, "persisted", "{name}");
    }
}

#[test]
fn test_json_store_keeps_next_id_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");

    let repo = TaskRepository::new(Box::new(JsonTaskStore::new(&path)));
    let first = repo.add(NewTask::new(USER, "first")).unwrap();
    repo.delete(first.id).unwrap();

    let repo = TaskRepository::new(Box::new(JsonTaskStore::new(&path)));
    let second = repo.add(NewTask::new(USER, "second")).unwrap();
    assert!(second.id > first.id);
}

#[test]
fn test_json_store_without_next_id_continues_after_highest_id() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    std::fs::write(
        &path,
        r#"{"tasks": [{"id": 7, "user_id": 100, "original_description": "old",
            "created_at": "2025-01-01T08:00:00+00:00", "updated_at": "2025-01-01T08:00:00+00:00"}]}"#,
    )
    .unwrap();

    let repo = TaskRepository::new(Box::new(JsonTaskStore::new(&path)));
    assert_eq!(repo.get(7).unwrap().status, TaskStatus::Active);
    assert_eq!(repo.add(NewTask::new(USER, "new")).unwrap().id, 8);
}

#[test]
fn test_json_store_rejects_duplicate_ids() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    let record = r#"{"id": 1, "user_id": 100, "original_description": "x",
        "created_at": "2025-01-01T08:00:00+00:00", "updated_at": "2025-01-01T08:00:00+00:00"}"#;
    std::fs::write(&path, format!(r#"{{"next_id": 5, "tasks": [{record}, {record}]}}"#)).unwrap();

    let repo = TaskRepository::new(Box::new(JsonTaskStore::new(&path)));
    assert!(matches!(
        repo.get(1),
        Err(RepoError::Storage(storage::StoreError::Corrupt(_)))
    ));
}
