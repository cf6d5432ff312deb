use chrono::NaiveTime;
use poseguard::demo::{sample_day, DemoGenerator};
use poseguard::export::{self, ReportFormat};
use poseguard::{DayData, PostureCategory, PostureSession, ReportBuilder, SessionAggregator};

/// Integration tests for the reporting workflow: ingestion, aggregation, export

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn session(start: (u32, u32), end: (u32, u32), quality: u8) -> PostureSession {
    PostureSession::spanning(time(start.0, start.1), time(end.0, end.1), quality).unwrap()
}

fn submitted_week() -> Vec<DayData> {
    let mut builder = ReportBuilder::new();
    builder
        .submit_session(session((9, 0), (10, 30), 88), "Monday")
        .submit_session(session((11, 0), (12, 30), 65), "Monday")
        .submit_session(session((15, 0), (16, 30), 45), "Monday")
        .submit_session(session((8, 30), (9, 30), 92), "Tuesday")
        .submit_session(session((10, 0), (12, 0), 89), "Tuesday")
        .submit_session(session((14, 0), (15, 0), 75), "Tuesday")
        .submit_session(session((9, 30), (10, 30), 52), "Wednesday")
        .submit_session(session((11, 0), (13, 0), 62), "Wednesday")
        .submit_session(session((14, 30), (17, 30), 91), "Wednesday");
    builder.build()
}

#[test]
fn test_daily_report_workflow() {
    let day = sample_day("Today").unwrap();

    assert!((day.total_hours() - 4.5).abs() < 1e-9);
    assert!((day.average_quality() - 66.67).abs() < 0.01);

    let days = vec![day];
    assert_eq!(SessionAggregator::total_sessions(&days), 3);
    assert!((SessionAggregator::average_quality(&days) - days[0].average_quality()).abs() < 1e-9);
}

#[test]
fn test_weekly_report_workflow() {
    let days = submitted_week();
    assert_eq!(days.len(), 3);

    let counts = SessionAggregator::category_counts(&days);
    assert_eq!(counts[&PostureCategory::Good], 4);
    assert_eq!(counts[&PostureCategory::Medium], 3);
    assert_eq!(counts[&PostureCategory::Bad], 2);

    assert!((SessionAggregator::total_hours(&days) - 14.5).abs() < 1e-9);
    assert_eq!(SessionAggregator::best_day(&days).unwrap().label, "Tuesday");
    assert_eq!(SessionAggregator::worst_day(&days).unwrap().label, "Monday");

    for session in days.iter().flat_map(|d| d.sessions.iter()) {
        assert_eq!(
            session.category(),
            PostureCategory::from_quality(session.avg_quality())
        );
    }
}

#[test]
fn test_chart_selection_matches_days() {
    let days = DemoGenerator::new(3).week().unwrap();

    let first = SessionAggregator::select_day_at_position(&days, 0.0).unwrap();
    let last = SessionAggregator::select_day_at_position(&days, 0.999).unwrap();

    assert_eq!(first.id, days[0].id);
    assert_eq!(last.id, days[4].id);
}

#[test]
fn test_concurrent_readers_share_days() {
    let days = std::sync::Arc::new(DemoGenerator::new(11).week().unwrap());
    let expected = SessionAggregator::average_quality(&days);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let days = days.clone();
            std::thread::spawn(move || SessionAggregator::average_quality(&days))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_summary_exports() {
    let days = submitted_week();
    let summary = SessionAggregator::summarize(&days);

    let json = export::render(&summary, ReportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["total_sessions"], 9);
    assert_eq!(value["best_day"], "Tuesday");
    assert_eq!(value["days"].as_array().unwrap().len(), 3);

    let table = export::render(&summary, ReportFormat::Table).unwrap();
    assert!(table.contains("Wednesday"));
}
