//! Table-driven slot extraction.
//!
//! Each profile is an ordered list of `(field, pattern)` entries mixing English
//! and Arabic patterns. For every field the first pattern that matches decides
//! the value. Numbers are read as 32-bit integers; a captured number that does
//! not fit counts as absent.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use agentic_core::domain::user::{NewUser, UserPatch};

pub const DEFAULT_NAME: &str = "Fallback User";
pub const DEFAULT_AGE: i32 = 25;
pub const DEFAULT_JOB_TITLE: &str = "Unknown";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotField {
    Id,
    Name,
    Age,
    JobTitle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotProfile {
    /// Name, age and job title, later filled with defaults.
    Register,
    /// Id plus optional name, age and job title.
    Update,
    /// Id only.
    Lookup,
}

struct SlotPattern {
    field: SlotField,
    regex: Regex,
}

fn pattern(field: SlotField, source: &str) -> SlotPattern {
    SlotPattern { field, regex: Regex::new(source).expect("slot pattern must compile") }
}

const ID_PATTERN: &str = r"(?i)(?:id|رقم)\s*(\d+)";

static REGISTER_PATTERNS: Lazy<Vec<SlotPattern>> = Lazy::new(|| {
    use SlotField::{Age, JobTitle, Name};
    vec![
        pattern(Name, r"(?i)(?:name\s+is|named)\s+(.+?)(?:\s+(?:age|job|works|and)|$|[.,])"),
        pattern(Name, r"(?s)(?:اسمه|اسم)\s+(.+?)(?:\s+(?:عمره|سن|سنه|وظيفته|يعمل|شغال)|$)"),
        pattern(Age, r"(?i)(?:age\s+is\s+|age\s+)(\d+)"),
        pattern(Age, r"(\d+)\s*(?:years|yrs)"),
        pattern(Age, r"(?:عمره|سن|سنه)\s+(\d+)"),
        pattern(JobTitle, r"(?i)(?:job(?:\s+title)?\s+(?:is|works\s+as))\s+(.+?)(?:$|[.,])"),
        pattern(JobTitle, r"(?s)(?:(?:^|\s)و?)(?:وظيفته|يعمل|شغال)\s+(.+?)(?:$|[.,])"),
    ]
});

static UPDATE_PATTERNS: Lazy<Vec<SlotPattern>> = Lazy::new(|| {
    use SlotField::{Age, Id, JobTitle, Name};
    vec![
        pattern(Id, ID_PATTERN),
        pattern(
            Name,
            r"(?i)(?:name|اسم)\s+(?:is|to|becomes)?\s*(.+?)(?:\s+(?:age|job|works|and)|$|[.,])",
        ),
        pattern(Age, r"(?i)(?:age|عمر|سن)\s+(?:is|to|becomes)?\s*(\d+)"),
        pattern(
            JobTitle,
            r"(?i)(?:job|works|وظيف|عمل)\s+(?:is|as|to|becomes)?\s*(.+?)(?:\s+(?:name|age|and)|$|[.,])",
        ),
    ]
});

static LOOKUP_PATTERNS: Lazy<Vec<SlotPattern>> =
    Lazy::new(|| vec![pattern(SlotField::Id, ID_PATTERN)]);

fn patterns(profile: SlotProfile) -> &'static [SlotPattern] {
    match profile {
        SlotProfile::Register => &REGISTER_PATTERNS,
        SlotProfile::Update => &UPDATE_PATTERNS,
        SlotProfile::Lookup => &LOOKUP_PATTERNS,
    }
}

/// Extracted arguments; every slot is independently optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSet {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub job_title: Option<String>,
}

impl SlotSet {
    /// Registration input with the fixed defaults for missing slots.
    pub fn into_registration(self) -> NewUser {
        NewUser::new(
            self.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
            self.age.unwrap_or(DEFAULT_AGE),
            self.job_title.unwrap_or_else(|| DEFAULT_JOB_TITLE.to_string()),
        )
    }

    pub fn to_patch(&self) -> UserPatch {
        UserPatch { name: self.name.clone(), age: self.age, job_title: self.job_title.clone() }
    }
}

pub fn extract(profile: SlotProfile, prompt: &str) -> SlotSet {
    let table = patterns(profile);
    let capture = |field: SlotField| {
        table
            .iter()
            .filter(|entry| entry.field == field)
            .find_map(|entry| entry.regex.captures(prompt))
            .and_then(|captures| captures.get(1).map(|value| value.as_str().to_string()))
    };

    let mut slots = SlotSet::default();
    if profile != SlotProfile::Register {
        slots.id =
            capture(SlotField::Id).and_then(|value| value.parse::<i32>().ok()).map(i64::from);
    }
    if profile != SlotProfile::Lookup {
        slots.name = capture(SlotField::Name).map(|value| clean_text(&value));
        slots.age = capture(SlotField::Age).and_then(|value| value.parse().ok());
        slots.job_title = capture(SlotField::JobTitle).map(|value| clean_text(&value));
    }
    slots
}

fn clean_text(value: &str) -> String {
    value.trim().replace(['"', '\''], "").trim().to_string()
}
