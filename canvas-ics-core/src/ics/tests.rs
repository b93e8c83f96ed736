use super::*;
use crate::date::DisplayZone;
use chrono::TimeZone;
use std::io::BufReader;

fn exporter(options: IcsOptions) -> IcsExporter {
    IcsExporter::new(
        options,
        DateNormalizer::new(DisplayZone::from_name("UTC").unwrap()),
    )
}

fn assignment(name: &str, due_at: Option<&str>, html_url: Option<&str>) -> Assignment {
    Assignment {
        course_name: "Biology 101".to_string(),
        name: name.to_string(),
        due_at: due_at.map(str::to_string),
        html_url: html_url.map(str::to_string),
    }
}

/// Parse with the `ical` crate and return each event's properties.
fn parse_events(content: &str) -> Vec<Vec<(String, Option<String>)>> {
    let mut parser = ical::IcalParser::new(BufReader::new(content.as_bytes()));
    let calendar = parser
        .next()
        .expect("one calendar")
        .expect("valid iCalendar");
    assert!(parser.next().is_none());
    calendar
        .events
        .into_iter()
        .map(|event| {
            event
                .properties
                .into_iter()
                .map(|p| (p.name, p.value))
                .collect()
        })
        .collect()
}

fn property<'a>(event: &'a [(String, Option<String>)], name: &str) -> Option<&'a str> {
    event
        .iter()
        .find(|(n, _)| n == name)
        .and_then(|(_, v)| v.as_deref())
}

#[test]
fn test_event_fields() {
    let assignments = vec![assignment(
        "Lab report",
        Some("2024-09-01 23:59 UTC"),
        Some("https://canvas.test/courses/1/assignments/2"),
    )];

    let document = exporter(IcsOptions::default()).generate(&assignments);

    assert_eq!(document.included, 1);
    assert_eq!(document.skipped, 0);
    assert!(document.content.contains("SUMMARY:Lab report\r\n"));
    assert!(document.content.contains("DTSTART:20240901T235900Z\r\n"));
    assert!(document.content.contains("DESCRIPTION:Course: Biology 101\r\n"));
    assert!(
        document
            .content
            .contains("URL:https://canvas.test/courses/1/assignments/2\r\n")
    );

    let events = parse_events(&document.content);
    assert_eq!(events.len(), 1);
    assert_eq!(property(&events[0], "SUMMARY"), Some("Lab report"));
    assert!(property(&events[0], "UID").is_some());
    assert!(property(&events[0], "DTSTAMP").is_some());
}

#[test]
fn test_skips_missing_and_unparseable_due_dates() {
    let assignments = vec![
        assignment("No date", None, None),
        assignment("Garbled", Some("sometime next week"), None),
        assignment("Quiz 1", Some("2024-09-03 09:00 UTC"), None),
        assignment("Quiz 2", Some("2024-09-10T09:00:00Z"), None),
    ];

    let document = exporter(IcsOptions::default()).generate(&assignments);
    assert_eq!(document.included, 2);
    assert_eq!(document.skipped, 2);

    let events = parse_events(&document.content);
    let summaries: Vec<_> = events
        .iter()
        .filter_map(|e| property(e, "SUMMARY"))
        .collect();
    assert_eq!(summaries, vec!["Quiz 1", "Quiz 2"]);
}

#[test]
fn test_all_skipped_still_valid() {
    let assignments = vec![
        assignment("A", None, None),
        assignment("B", Some("??"), None),
    ];
    let document = exporter(IcsOptions::default()).generate(&assignments);
    assert_eq!(document.included, 0);
    assert_eq!(document.skipped, 2);
    assert!(document.content.starts_with("BEGIN:VCALENDAR\r\n"));
    assert!(document.content.ends_with("END:VCALENDAR\r\n"));
    assert!(parse_events(&document.content).is_empty());

    let empty = exporter(IcsOptions::default()).generate(&[]);
    assert!(parse_events(&empty.content).is_empty());
}

#[test]
fn test_url_omitted_when_absent() {
    let document =
        exporter(IcsOptions::default()).generate(&[assignment("A", Some("2024-09-01 10:00 UTC"), None)]);
    assert!(!document.content.contains("URL:"));
}

#[test]
fn test_text_is_escaped() {
    let mut a = assignment("Essay; draft, v2", Some("2024-09-01 10:00 UTC"), None);
    a.course_name = "History\nSection A".to_string();
    let document = exporter(IcsOptions::default()).generate(&[a]);
    assert!(document.content.contains("SUMMARY:Essay\\; draft\\, v2\r\n"));
    assert!(
        document
            .content
            .contains("DESCRIPTION:Course: History\\nSection A\r\n")
    );
}

#[test]
fn test_long_lines_are_folded() {
    let long_name = "Leseübung-Kapitel-sieben-und-gesammelte-Aufsätze-".repeat(4);
    let document = exporter(IcsOptions::default())
        .generate(&[assignment(&long_name, Some("2024-09-01 10:00 UTC"), None)]);

    for line in document.content.split("\r\n") {
        assert!(line.len() <= 75, "line too long: {line:?}");
    }

    let events = parse_events(&document.content);
    assert_eq!(property(&events[0], "SUMMARY"), Some(long_name.as_str()));
}

#[test]
fn test_calendar_options() {
    let options = IcsOptions {
        calendar_name: Some("Fall, 2024".to_string()),
        reminder_minutes: Some(60),
    };
    let document =
        exporter(options).generate(&[assignment("Quiz", Some("2024-09-01 10:00 UTC"), None)]);
    assert!(document.content.contains("X-WR-CALNAME:Fall\\, 2024\r\n"));
    assert!(document.content.contains("BEGIN:VALARM\r\n"));
    assert!(document.content.contains("TRIGGER:-PT60M\r\n"));
}

#[test]
fn test_fixed_stamp() {
    let stamp = Utc.with_ymd_and_hms(2024, 8, 30, 12, 0, 0).unwrap();
    let document = exporter(IcsOptions::default())
        .generate_at(&[assignment("Quiz", Some("2024-09-01 10:00 UTC"), None)], stamp);
    assert!(document.content.contains("DTSTAMP:20240830T120000Z\r\n"));
}

#[tokio::test]
async fn test_export_overwrites_file() {
    let path = std::env::temp_dir().join(format!("canvas-ics-test-{}.ics", Uuid::new_v4()));
    std::fs::write(&path, "stale contents").unwrap();

    let document = exporter(IcsOptions::default())
        .export_to_file(&[assignment("Quiz", Some("2024-09-01 10:00 UTC"), None)], &path)
        .await
        .unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(written, document.content);
    assert!(!written.contains("stale"));
}
