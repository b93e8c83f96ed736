use std::collections::HashMap;

use crate::{
    Assignment, Course, RawAssignment, Result,
    canvas::Canvas,
    date::DateNormalizer,
    pager::PageSource,
    types::present,
};

pub const UNTITLED: &str = "Untitled";

/// Map one upstream record to the canonical form.
///
/// Precedence: the record's `name`, else `"Untitled"`. `due_at` goes through
/// the display form of `dates`.
pub fn normalize_assignment(
    course_name: &str,
    raw: &RawAssignment,
    dates: &DateNormalizer,
) -> Assignment {
    Assignment {
        course_name: course_name.to_string(),
        name: present(raw.name.as_deref())
            .unwrap_or(UNTITLED)
            .to_string(),
        due_at: dates.display(raw.due_at.as_deref()),
        html_url: present(raw.html_url.as_deref()).map(str::to_string),
    }
}

/// Builds the canonical assignment list for selected courses.
pub struct AssignmentCollector<'a, S: PageSource> {
    canvas: &'a Canvas<S>,
    dates: DateNormalizer,
}

impl<'a, S: PageSource> AssignmentCollector<'a, S> {
    pub fn new(canvas: &'a Canvas<S>, dates: DateNormalizer) -> Self {
        Self { canvas, dates }
    }

    /// Fetch the course list, then collect assignments for `selected`.
    pub async fn collect(&self, selected: &[u64]) -> Result<Vec<Assignment>> {
        let courses = self.canvas.fetch_courses().await?;
        self.collect_for(&courses, selected).await
    }

    /// Collect assignments for `selected` against an already fetched course
    /// list.
    ///
    /// Courses come in the order of `selected`; each course's assignments keep
    /// upstream order. Ids missing from `courses` are skipped. Duplicates are
    /// kept.
    pub async fn collect_for(&self, courses: &[Course], selected: &[u64]) -> Result<Vec<Assignment>> {
        let by_id: HashMap<u64, &Course> = courses.iter().map(|c| (c.id, c)).collect();

        let mut results = Vec::new();
        for course_id in selected {
            let Some(course) = by_id.get(course_id) else {
                tracing::debug!(course_id, "selected course is no longer listed, skipping");
                continue;
            };

            let course_name = course.display_name();
            let raw = self.canvas.fetch_assignments(*course_id).await?;
            results.extend(
                raw.iter()
                    .map(|record| normalize_assignment(&course_name, record, &self.dates)),
            );
        }

        tracing::info!(
            "collected {} assignments from {} courses",
            results.len(),
            selected.len()
        );
        Ok(results)
    }
}
