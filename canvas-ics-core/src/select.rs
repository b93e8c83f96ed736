use crate::{Assignment, Course, Result, format::assignment_label};

/// One labeled option offered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice<T> {
    pub label: String,
    pub value: T,
}

impl<T> Choice<T> {
    pub fn new(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Asks the user to pick among labeled options.
pub trait Selector {
    /// Pick any number of choices. Picking nothing is a valid answer.
    fn select_subset<T: Clone>(&mut self, message: &str, choices: &[Choice<T>]) -> Result<Vec<T>>;

    /// Pick one choice, or `None` when the user gave no answer.
    fn select_one<T: Clone>(&mut self, message: &str, choices: &[Choice<T>]) -> Result<Option<T>>;
}

/// What goes into the calendar file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    #[default]
    All,
    Select,
}

impl ExportMode {
    pub fn choices() -> Vec<Choice<Self>> {
        vec![
            Choice::new("All assignments", Self::All),
            Choice::new("Select assignments", Self::Select),
        ]
    }
}

pub fn course_choices(courses: &[Course]) -> Vec<Choice<u64>> {
    courses
        .iter()
        .map(|course| Choice::new(course.label(), course.id))
        .collect()
}

/// Choices carry the index into `assignments`.
pub fn assignment_choices(assignments: &[Assignment]) -> Vec<Choice<usize>> {
    assignments
        .iter()
        .enumerate()
        .map(|(index, assignment)| Choice::new(assignment_label(assignment), index))
        .collect()
}

/// Ask which assignments to export. No assignments means no prompt.
pub fn select_assignments<S: Selector>(
    selector: &mut S,
    assignments: &[Assignment],
) -> Result<Vec<Assignment>> {
    if assignments.is_empty() {
        return Ok(Vec::new());
    }
    let picked = selector.select_subset(
        "Choose assignments to export",
        &assignment_choices(assignments),
    )?;
    Ok(picked
        .into_iter()
        .filter_map(|index| assignments.get(index).cloned())
        .collect())
}
