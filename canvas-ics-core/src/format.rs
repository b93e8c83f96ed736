use crate::Assignment;

pub const NO_ASSIGNMENTS: &str = "No assignments found.";
pub const NO_DUE_DATE: &str = "No due date";

/// Render assignments as text grouped by course.
///
/// A new header starts whenever `course_name` differs from the previous
/// entry, so interleaved courses get one header per contiguous run.
pub fn format_assignments(assignments: &[Assignment]) -> String {
    if assignments.is_empty() {
        return NO_ASSIGNMENTS.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current_course: Option<&str> = None;
    for assignment in assignments {
        if current_course != Some(assignment.course_name.as_str()) {
            current_course = Some(assignment.course_name.as_str());
            lines.push(String::new());
            lines.push(assignment.course_name.clone());
            lines.push("-".repeat(assignment.course_name.chars().count()));
        }
        lines.push(bullet(assignment));
    }

    lines.join("\n").trim_start().to_string()
}

fn bullet(assignment: &Assignment) -> String {
    let due = assignment.due_at.as_deref().unwrap_or(NO_DUE_DATE);
    match assignment.html_url.as_deref() {
        Some(url) => format!("• {} — {} ({})", assignment.name, due, url),
        None => format!("• {} — {}", assignment.name, due),
    }
}

/// Label for an assignment in a selection list.
pub fn assignment_label(assignment: &Assignment) -> String {
    format!(
        "{} — {} — {}",
        assignment.course_name,
        assignment.name,
        assignment.due_at.as_deref().unwrap_or(NO_DUE_DATE)
    )
}
