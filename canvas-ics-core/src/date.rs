//! Timestamp interpretation.
//!
//! Canvas sends RFC 3339 timestamps (`2024-09-01T23:59:00Z`). They are shown
//! to the user as `YYYY-MM-DD HH:MM <zone>` in the display zone, and the
//! calendar exporter later reads that display text back into an instant.

use chrono::{
    DateTime, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::error::DateParseWarning;

pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M %Z";

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S",
    "%Y%m%dT%H%M",
];

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%z",
];

/// Zone timestamps are displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayZone {
    /// The system zone. chrono cannot name it, so the offset is shown.
    #[default]
    Local,
    /// An IANA zone, shown with its abbreviation (`EDT`, `CET`, ...).
    Named(Tz),
}

impl DisplayZone {
    /// Parse an IANA zone name such as `America/Chicago`.
    pub fn from_name(name: &str) -> Result<Self, String> {
        name.trim()
            .parse::<Tz>()
            .map(Self::Named)
            .map_err(|e| format!("unknown time zone '{name}': {e}"))
    }

    fn render(self, instant: DateTime<Utc>) -> String {
        match self {
            Self::Local => instant
                .with_timezone(&Local)
                .format(DISPLAY_FORMAT)
                .to_string(),
            Self::Named(tz) => instant.with_timezone(&tz).format(DISPLAY_FORMAT).to_string(),
        }
    }

    /// Pin a wall-clock time to this zone. Ambiguous times take the earlier
    /// instant; times skipped by a DST jump do not resolve.
    fn resolve(self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Self::Local => earliest(Local.from_local_datetime(&naive)),
            Self::Named(tz) => earliest(tz.from_local_datetime(&naive)),
        }
    }

    /// Like [`DisplayZone::resolve`], but inside a repeated hour the
    /// candidate whose abbreviation matches `abbreviation` wins.
    fn resolve_abbreviated(self, naive: NaiveDateTime, abbreviation: &str) -> Option<DateTime<Utc>> {
        match self {
            Self::Local => by_abbreviation(Local.from_local_datetime(&naive), abbreviation),
            Self::Named(tz) => by_abbreviation(tz.from_local_datetime(&naive), abbreviation),
        }
    }
}

fn earliest<T: TimeZone>(result: LocalResult<DateTime<T>>) -> Option<DateTime<Utc>> {
    result.earliest().map(|dt| dt.with_timezone(&Utc))
}

fn by_abbreviation<T: TimeZone>(
    result: LocalResult<DateTime<T>>,
    abbreviation: &str,
) -> Option<DateTime<Utc>>
where
    T::Offset: std::fmt::Display,
{
    match result {
        // chrono orders the earlier instant first
        LocalResult::Ambiguous(first, second) => {
            let picked = if second.format("%Z").to_string() == abbreviation {
                second
            } else {
                first
            };
            Some(picked.with_timezone(&Utc))
        }
        other => earliest(other),
    }
}

/// Converts upstream and display timestamps. Never panics on bad input.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateNormalizer {
    zone: DisplayZone,
}

impl DateNormalizer {
    pub fn new(zone: DisplayZone) -> Self {
        Self { zone }
    }

    /// Display form of an upstream timestamp.
    ///
    /// Absent or empty input gives `None`; input that does not parse is
    /// returned unchanged.
    pub fn display(&self, raw: Option<&str>) -> Option<String> {
        let raw = raw?;
        if raw.trim().is_empty() {
            return None;
        }
        match self.parse_iso8601(raw) {
            Some(instant) => Some(self.zone.render(instant)),
            None => {
                tracing::warn!(timestamp = raw, "could not parse due date, showing it as-is");
                Some(raw.to_string())
            }
        }
    }

    /// Calendar-ready instant from either an upstream timestamp or a string
    /// produced by [`DateNormalizer::display`].
    pub fn calendar(&self, text: &str) -> Result<DateTime<Utc>, DateParseWarning> {
        self.parse_iso8601(text)
            .or_else(|| self.parse_display(text))
            .ok_or_else(|| DateParseWarning::new(text))
    }

    fn parse_iso8601(&self, text: &str) -> Option<DateTime<Utc>> {
        let text = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Some(dt) = OFFSET_FORMATS
            .iter()
            .find_map(|f| DateTime::<FixedOffset>::parse_from_str(text, f).ok())
        {
            return Some(dt.with_timezone(&Utc));
        }
        if let Some(naive) = NAIVE_FORMATS
            .iter()
            .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        {
            return self.zone.resolve(naive);
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .and_then(|naive| self.zone.resolve(naive))
    }

    /// `YYYY-MM-DD HH:MM[:SS] <zone>` where zone is an offset, `Z`/`UTC`/`GMT`,
    /// or an abbreviation, which is taken to mean the display zone.
    fn parse_display(&self, text: &str) -> Option<DateTime<Utc>> {
        let (wall, zone) = text.trim().rsplit_once(' ')?;
        let wall = wall.trim_end();
        let naive = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
            .iter()
            .find_map(|f| NaiveDateTime::parse_from_str(wall, f).ok())?;

        match zone {
            "Z" | "UTC" | "GMT" => Some(Utc.from_utc_datetime(&naive)),
            _ if zone.starts_with(['+', '-']) => parse_offset(zone)
                .and_then(|offset| earliest(offset.from_local_datetime(&naive))),
            _ if is_abbreviation(zone) => self.zone.resolve_abbreviated(naive, zone),
            _ => None,
        }
    }
}

/// `+08:00`, `+0800` or `+08`.
fn parse_offset(text: &str) -> Option<FixedOffset> {
    let sign = if text.starts_with('-') { -1 } else { 1 };
    let digits: String = text[1..].chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn is_abbreviation(text: &str) -> bool {
    (2..=6).contains(&text.len()) && text.chars().all(|c| c.is_ascii_alphabetic())
}
