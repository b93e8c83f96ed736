use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    Course, RawAssignment, Result,
    pager::{PageSource, Pager, params},
};

const COURSE_QUERY: [(&str, &str); 3] = [
    ("enrollment_state", "active"),
    ("per_page", "100"),
    ("include[]", "term"),
];

const ASSIGNMENT_QUERY: [(&str, &str); 3] = [
    ("per_page", "100"),
    ("include[]", "submission"),
    ("order_by", "due_at"),
];

/// Course and assignment endpoints of the Canvas REST API.
pub struct Canvas<S: PageSource> {
    source: S,
    api_root: String,
}

impl<S: PageSource> Canvas<S> {
    /// `base_url` is the instance root; `/api/v1` is appended.
    pub fn new(source: S, base_url: &str) -> Self {
        Self {
            source,
            api_root: format!("{}/api/v1", base_url.trim_end_matches('/')),
        }
    }

    pub fn courses_url(&self) -> String {
        format!("{}/courses", self.api_root)
    }

    pub fn assignments_url(&self, course_id: u64) -> String {
        format!("{}/courses/{}/assignments", self.api_root, course_id)
    }

    /// All courses with an active enrollment, in upstream order.
    pub async fn fetch_courses(&self) -> Result<Vec<Course>> {
        let records = Pager::new(&self.source, self.courses_url(), params(&COURSE_QUERY))
            .collect_all()
            .await?;
        let courses = decode_records(records, "course");
        tracing::info!("fetched {} active courses", courses.len());
        Ok(courses)
    }

    /// All assignments of one course, ordered by due date upstream.
    pub async fn fetch_assignments(&self, course_id: u64) -> Result<Vec<RawAssignment>> {
        let records = Pager::new(
            &self.source,
            self.assignments_url(course_id),
            params(&ASSIGNMENT_QUERY),
        )
        .collect_all()
        .await?;
        let assignments = decode_records(records, "assignment");
        tracing::debug!(course_id, "fetched {} assignments", assignments.len());
        Ok(assignments)
    }
}

/// Decode each record on its own so one malformed entry does not sink the page.
fn decode_records<T: DeserializeOwned>(records: Vec<Value>, kind: &str) -> Vec<T> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(index, "skipping malformed {kind} record: {e}");
                None
            }
        })
        .collect()
}
