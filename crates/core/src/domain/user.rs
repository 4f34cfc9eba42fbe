use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_JOB_TITLE_CHARS: usize = 100;
pub const MIN_AGE: i32 = 1;
pub const MAX_AGE: i32 = 150;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub age: i32,
    pub job_title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub age: i32,
    pub job_title: String,
}

impl NewUser {
    pub fn new(name: impl Into<String>, age: i32, job_title: impl Into<String>) -> Self {
        Self { name: name.into(), age, job_title: job_title.into() }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_name(&self.name)?;
        validate_age(self.age)?;
        if self.job_title.trim().is_empty() {
            return Err(DomainError::InvariantViolation("jobTitle is required".to_string()));
        }
        validate_job_title(&self.job_title)
    }
}

/// Merge-patch input: `None` leaves the stored field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub job_title: Option<String>,
}

impl UserPatch {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(age) = self.age {
            validate_age(age)?;
        }
        if let Some(job_title) = &self.job_title {
            validate_job_title(job_title)?;
        }
        Ok(())
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(age) = self.age {
            user.age = age;
        }
        if let Some(job_title) = &self.job_title {
            user.job_title = job_title.clone();
        }
    }
}

/// Conjunctive list filter. An empty job-title filter matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub job_title: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
}

impl UserFilter {
    pub fn job_title_needle(&self) -> Option<&str> {
        self.job_title.as_deref().filter(|value| !value.is_empty())
    }

    pub fn matches(&self, user: &User) -> bool {
        if let Some(needle) = self.job_title_needle() {
            if !user.job_title.contains(needle) {
                return false;
            }
        }
        if self.min_age.is_some_and(|min_age| user.age < min_age) {
            return false;
        }
        if self.max_age.is_some_and(|max_age| user.age > max_age) {
            return false;
        }
        true
    }
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::InvariantViolation("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(DomainError::InvariantViolation(format!(
            "name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_age(age: i32) -> Result<(), DomainError> {
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(DomainError::InvariantViolation(format!(
            "age must be in range {MIN_AGE}..={MAX_AGE}"
        )));
    }
    Ok(())
}

fn validate_job_title(job_title: &str) -> Result<(), DomainError> {
    if job_title.chars().count() > MAX_JOB_TITLE_CHARS {
        return Err(DomainError::InvariantViolation(format!(
            "jobTitle must be at most {MAX_JOB_TITLE_CHARS} characters"
        )));
    }
    Ok(())
}
