use chrono::NaiveDate;
use creator_studio::calendar::{MonthGrid, day_contents, task_span};
use creator_studio::range::{Direction, Granularity, RangeCursor};
use creator_studio::repository::CollectionKind;
use creator_studio::stats::StatsReport;
use creator_studio::suggest::{NO_KEY_FALLBACK, SubtaskSuggester, SuggestConfig};
use creator_studio::utils::local_millis;
use creator_studio::{Database, Studio, TaskStatus};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn millis(y: i32, m: u32, d: u32, h: u32) -> i64 {
    local_millis(date(y, m, d).and_hms_opt(h, 0, 0).unwrap()).unwrap()
}

fn accept(_: &str) -> bool {
    true
}

fn decline(_: &str) -> bool {
    false
}

#[test]
fn project_lifecycle_drives_status_span_and_calendar() {
    let mut studio = Studio::open(Database::open_in_memory().unwrap());
    let ws = studio.workspace_mut();

    let pid = ws.create_project("Fractions video", "", "#3B82F6", 0).unwrap();
    let sid = ws
        .add_subtask(&pid, "Script", Some("2024-03-01"), "2024-03-01")
        .unwrap();
    assert_eq!(ws.project(&pid).unwrap().status, TaskStatus::Todo);

    let done_at = millis(2024, 3, 4, 15);
    assert_eq!(ws.toggle_subtask(&pid, &sid, done_at), Some(TaskStatus::Done));
    let subtask = ws.project(&pid).unwrap().subtask(&sid).unwrap();
    assert_eq!(subtask.completed_at, Some(done_at));

    ws.add_log(&pid, Some(sid.as_str()), "2024-03-05", "published").unwrap();

    let ws = studio.workspace();
    let subtask = ws.project(&pid).unwrap().subtask(&sid).unwrap();
    let span = task_span(&pid, subtask, ws.logs());
    assert_eq!((span.start.as_str(), span.end.as_str()), ("2024-03-01", "2024-03-05"));

    let middle = day_contents(ws, date(2024, 3, 3));
    assert_eq!(middle.bars.len(), 1);
    assert!(!middle.bars[0].is_start);
    assert!(!middle.bars[0].is_end);
    assert_eq!(middle.bars[0].color, "#3B82F6");

    let grid = MonthGrid::build(ws, 2024, 3).unwrap();
    assert!(grid.day(1).unwrap().bars[0].is_start);
    assert!(grid.day(5).unwrap().bars[0].is_end);
    assert!(grid.day(6).unwrap().bars.is_empty());

    let week = StatsReport::build(ws, RangeCursor::new(Granularity::Week, date(2024, 3, 6)));
    assert_eq!(week.completed.len(), 1);
    assert_eq!(week.logs.len(), 1);
    // Mon 4th holds the completion, Tue 5th the log
    assert_eq!(week.activity[0].tasks, 1);
    assert_eq!(week.activity[1].logs, 1);
}

#[test]
fn suggestions_without_credentials_are_the_fixed_list() {
    let suggester = SubtaskSuggester::new(SuggestConfig::default());
    for (title, description) in [("", ""), ("Geometry course", "ten lessons")] {
        let result = suggester.generate(title, description);
        assert_eq!(result.tasks, NO_KEY_FALLBACK);
        assert!(result.error.is_none());
    }
}

#[test]
fn suggestions_generated_off_thread_respect_deletes_made_meanwhile() {
    let mut studio = Studio::open(Database::open_in_memory().unwrap());
    let keep = studio.workspace_mut().create_project("Course", "", "#10B981", 1).unwrap();
    let gone = studio.workspace_mut().create_project("Video", "", "#3B82F6", 2).unwrap();

    let kept_pending = studio.begin_suggestion(&keep).unwrap();
    let gone_pending = studio.begin_suggestion(&gone).unwrap();
    let worker = std::thread::spawn(move || {
        let suggester = SubtaskSuggester::new(SuggestConfig::default());
        let kept = kept_pending.generate(&suggester);
        let lost = gone_pending.generate(&suggester);
        ((kept_pending, kept), (gone_pending, lost))
    });

    assert!(studio.is_generating(&gone));
    assert!(studio.delete_project(&gone, &accept));
    let ((kept_pending, kept), (gone_pending, lost)) = worker.join().unwrap();

    let outcome = studio.complete_suggestion(kept_pending, kept, "2024-03-04");
    assert_eq!(outcome.added, NO_KEY_FALLBACK.len());
    let outcome = studio.complete_suggestion(gone_pending, lost, "2024-03-04");
    assert!(outcome.dropped);
    assert!(!studio.is_generating(&keep) && !studio.is_generating(&gone));
    assert_eq!(studio.workspace().projects().len(), 1);
    assert_eq!(studio.workspace().projects()[0].sub_tasks.len(), NO_KEY_FALLBACK.len());
}

#[test]
fn committed_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("studio.db");
    let path = path.to_str().unwrap();

    {
        let mut studio = Studio::open(Database::new(path).unwrap());
        let ws = studio.workspace_mut();
        let pid = ws.create_project("Course", "algebra", "#10B981", 1).unwrap();
        ws.add_tag(&pid, "math");
        ws.add_todo("2024-03-04", "Grade papers").unwrap();
        ws.save_journal("2024-03-04", "Productive", "recorded lesson", 2).unwrap();
        ws.add_tag_preset("Workshop", "#EC4899").unwrap();
        let report = studio.commit();
        assert!(report.is_clean());
        assert_eq!(report.saved.len(), 4);
    }

    let studio = Studio::open(Database::new(path).unwrap());
    let ws = studio.workspace();
    assert_eq!(ws.projects()[0].tags, vec!["math"]);
    assert_eq!(ws.todos_for("2024-03-04").len(), 1);
    assert_eq!(ws.journal_for("2024-03-04").unwrap().mood_color.as_deref(), Some("#F59E0B"));
    assert_eq!(ws.tag_presets().len(), 5);
    assert_eq!(ws.mood_presets().len(), 6);
}

#[test]
fn corrupt_collection_falls_back_to_default() {
    let db = Database::open_in_memory().unwrap();
    db.put("cs_projects", "{not json").unwrap();
    db.put("cs_todos", r#"[{"id":"t1","date":"2024-03-04","text":"ok","completed":true}]"#)
        .unwrap();

    let studio = Studio::open(db);
    assert!(studio.workspace().projects().is_empty());
    assert_eq!(studio.workspace().todos().len(), 1);
    assert!(studio.workspace().todos()[0].completed);
}

#[test]
fn oversized_collection_is_kept_in_memory() {
    let db = Database::open_in_memory().unwrap().with_limit(1024);
    let mut studio = Studio::open(db);
    let ws = studio.workspace_mut();
    let pid = ws.create_project("Long", "", "#3B82F6", 1).unwrap();
    for i in 0..20 {
        ws.add_log(&pid, None, "2024-03-04", &format!("entry number {i} with some words"))
            .unwrap();
    }

    let report = studio.commit();
    assert_eq!(report.saved, vec![CollectionKind::Projects]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, CollectionKind::Logs);
    assert_eq!(studio.workspace().logs().len(), 20);
    assert!(studio.database().get("cs_logs").unwrap().is_none());
}

#[test]
fn declined_confirmation_leaves_everything_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let backup = dir.path().join("backup.json");

    let mut studio = Studio::open(Database::open_in_memory().unwrap());
    let ws = studio.workspace_mut();
    let pid = ws.create_project("Keep", "", "#3B82F6", 1).unwrap();
    let lid = ws.add_log(&pid, None, "2024-03-04", "note").unwrap();
    ws.save_journal("2024-03-04", "Tired", "", 1).unwrap();
    studio.commit();
    let before = studio.workspace().clone();

    studio.export(&backup, 10).unwrap();
    studio.workspace_mut().add_todo("2024-03-05", "after export").unwrap();
    studio.commit();

    assert!(!studio.delete_project(&pid, &decline));
    assert!(!studio.delete_log(&lid, &decline));
    assert!(!studio.delete_journal("2024-03-04", &decline));
    assert!(studio.import(&backup, &decline).is_err());
    assert!(!studio.workspace().is_dirty());
    assert_eq!(studio.workspace().projects(), before.projects());
    assert_eq!(studio.workspace().todos().len(), 1);

    studio.import(&backup, &accept).unwrap();
    assert!(studio.workspace().todos().is_empty());
    assert!(studio.commit().is_clean());
}

#[test]
fn range_navigation_matches_calendar_arithmetic() {
    let mut cursor = RangeCursor::new(Granularity::Month, date(2024, 1, 31));
    cursor.step(Direction::Next);
    assert_eq!(cursor.reference, date(2024, 3, 2));
    assert_eq!(cursor.title(), "March 2024");

    cursor.switch(Granularity::Year, date(2024, 6, 1));
    assert_eq!(cursor.range().first_day(), date(2024, 1, 1));
    assert_eq!(cursor.range().last_day(), date(2024, 12, 31));
}
