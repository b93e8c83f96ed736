use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Assignment ready for display and export.
///
/// Built once per fetch cycle by the collector and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Course display name, never empty
    pub course_name: String,
    /// Assignment name, never empty
    pub name: String,
    /// Display timestamp, or the raw upstream text when it could not be parsed
    pub due_at: Option<String>,
    /// Link to the assignment page
    pub html_url: Option<String>,
}

/// Enrollment term (requested with `include[]=term`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Term {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

/// Canvas course as returned by `/courses`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Course {
    pub id: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub course_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_term")]
    pub term: Option<Term>,
}

impl Course {
    /// Name shown to the user: course name, then course code, then `Course {id}`.
    pub fn display_name(&self) -> String {
        present(self.name.as_deref())
            .or_else(|| present(self.course_code.as_deref()))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Course {}", self.id))
    }

    /// Label used in selection lists, with the term when Canvas sent one.
    pub fn label(&self) -> String {
        match self
            .term
            .as_ref()
            .and_then(|t| present(t.name.as_deref()))
        {
            Some(term) => format!("{} ({})", self.display_name(), term),
            None => self.display_name(),
        }
    }
}

/// Assignment record exactly as Canvas sent it. Every field may be missing,
/// null, or of an unexpected type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawAssignment {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub due_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub html_url: Option<String>,
}

/// Canvas connection settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Instance root, e.g. `https://school.instructure.com`
    pub base_url: String,
    /// Personal access token sent as `Authorization: Bearer`
    pub token: String,
    /// Request timeout in seconds
    pub timeout: Option<u64>,
}

/// Calendar output options
#[derive(Debug, Clone, Default)]
pub struct IcsOptions {
    /// Calendar name (X-WR-CALNAME)
    pub calendar_name: Option<String>,
    /// Minutes before the due time for a display alarm
    pub reminder_minutes: Option<u32>,
}

/// Returns the string when it carries any non-whitespace content.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_term<'de, D>(deserializer: D) -> Result<Option<Term>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}
