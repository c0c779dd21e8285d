use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::auth::UserId;

/// Maximum title length, in characters, after trimming.
///
/// The `#[validate]` rules below repeat both limits as literals.
pub const TITLE_MAX_CHARS: usize = 200;
/// Maximum description length, in characters, after trimming.
pub const DESCRIPTION_MAX_CHARS: usize = 2000;

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    /// The title of the task, trimmed and never empty.
    pub title: String,
    /// An optional description for the task.
    pub description: Option<String>,
    /// Whether the task is done.
    pub completed: bool,
    /// Identifier of the user who created and owns the task.
    pub owner_id: UserId,
    /// Timestamp of when the task was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last successful mutation.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new, not yet completed `Task` owned by `owner_id`.
    /// `created_at` and `updated_at` are both set to the current time.
    pub fn new(input: NewTask, owner_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            completed: false,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites every mutable field.
    pub fn apply_replacement(&mut self, replacement: TaskReplacement, at: DateTime<Utc>) {
        self.title = replacement.title;
        self.description = replacement.description;
        self.completed = replacement.completed;
        self.updated_at = at;
    }

    /// Overwrites only the fields present in `changes`.
    pub fn apply_changes(&mut self, changes: TaskChanges, at: DateTime<Utc>) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
        self.updated_at = at;
    }
}

/// Request body of `POST /tasks`.
///
/// There is deliberately no owner field: unknown fields such as `owner_id`
/// are dropped during deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body of `PUT /tasks/{id}`. An omitted description clears it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub completed: bool,
}

/// Request body of `PATCH /tasks/{id}`.
///
/// `description` distinguishes an absent field (`None`) from an explicit
/// `null` (`Some(None)`), which clears the description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub completed: Option<bool>,
}

/// Marks a field as present, even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A validated creation request.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewTask {
    /// Trimmed; between 1 and 200 characters.
    #[validate(length(min = 1, max = 200), custom = "reject_nul")]
    pub title: String,
    /// Trimmed; at most 2000 characters. Blank input is stored as `None`.
    #[validate(length(max = 2000), custom = "reject_nul")]
    pub description: Option<String>,
}

/// A validated full replacement.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct TaskReplacement {
    #[validate(length(min = 1, max = 200), custom = "reject_nul")]
    pub title: String,
    #[validate(length(max = 2000), custom = "reject_nul")]
    pub description: Option<String>,
    pub completed: bool,
}

/// A validated partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct TaskChanges {
    #[validate(length(min = 1, max = 200), custom = "reject_nul")]
    pub title: Option<String>,
    #[validate(length(max = 2000), custom = "reject_nul")]
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

/// A field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title cannot be empty or whitespace only")]
    EmptyTitle,
    #[error("Title must be at most {max} characters (got {actual})")]
    TitleTooLong { max: usize, actual: usize },
    #[error("Description must be at most {max} characters (got {actual})")]
    DescriptionTooLong { max: usize, actual: usize },
    #[error("Field '{field}' must not contain NUL characters")]
    NulCharacter { field: &'static str },
}

impl ValidationError {
    /// Name of the offending request field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyTitle | ValidationError::TitleTooLong { .. } => "title",
            ValidationError::DescriptionTooLong { .. } => "description",
            ValidationError::NulCharacter { field } => *field,
        }
    }
}

const NUL_CHARACTER: &str = "nul_character";

// Postgres text columns cannot hold U+0000.
fn reject_nul(value: &str) -> Result<(), validator::ValidationError> {
    if value.contains('\0') {
        return Err(validator::ValidationError::new(NUL_CHARACTER));
    }
    Ok(())
}

fn trim_description(raw: Option<String>) -> Option<String> {
    raw.map(|d| d.trim().to_owned()).filter(|d| !d.is_empty())
}

fn failed_code<'a>(errors: &'a ValidationErrors, field: &str) -> Option<&'a str> {
    errors
        .field_errors()
        .get(field)
        .copied()
        .and_then(|errs| errs.first())
        .map(|err| &*err.code)
}

/// Runs the derived rules and reports the first failing field as a typed error.
///
/// `title` and `description` are the already trimmed values, used to report
/// the offending length.
fn check<T: Validate>(
    input: &T,
    title: Option<&str>,
    description: Option<&str>,
) -> Result<(), ValidationError> {
    let errors = match input.validate() {
        Ok(()) => return Ok(()),
        Err(errors) => errors,
    };

    if let Some(code) = failed_code(&errors, "title") {
        let actual = title.map_or(0, |t| t.chars().count());
        return Err(match code {
            NUL_CHARACTER => ValidationError::NulCharacter { field: "title" },
            _ if actual == 0 => ValidationError::EmptyTitle,
            _ => ValidationError::TitleTooLong {
                max: TITLE_MAX_CHARS,
                actual,
            },
        });
    }

    match failed_code(&errors, "description") {
        Some(NUL_CHARACTER) => Err(ValidationError::NulCharacter {
            field: "description",
        }),
        Some(_) => Err(ValidationError::DescriptionTooLong {
            max: DESCRIPTION_MAX_CHARS,
            actual: description.map_or(0, |d| d.chars().count()),
        }),
        None => Ok(()),
    }
}

impl TryFrom<CreateTask> for NewTask {
    type Error = ValidationError;

    fn try_from(input: CreateTask) -> Result<Self, Self::Error> {
        let task = Self {
            title: input.title.trim().to_owned(),
            description: trim_description(input.description),
        };
        check(&task, Some(task.title.as_str()), task.description.as_deref())?;
        Ok(task)
    }
}

impl TryFrom<ReplaceTask> for TaskReplacement {
    type Error = ValidationError;

    fn try_from(input: ReplaceTask) -> Result<Self, Self::Error> {
        let replacement = Self {
            title: input.title.trim().to_owned(),
            description: trim_description(input.description),
            completed: input.completed,
        };
        check(
            &replacement,
            Some(replacement.title.as_str()),
            replacement.description.as_deref(),
        )?;
        Ok(replacement)
    }
}

impl TryFrom<UpdateTask> for TaskChanges {
    type Error = ValidationError;

    fn try_from(input: UpdateTask) -> Result<Self, Self::Error> {
        let changes = Self {
            title: input.title.map(|t| t.trim().to_owned()),
            description: input.description.map(trim_description),
            completed: input.completed,
        };
        check(
            &changes,
            changes.title.as_deref(),
            changes.description.as_ref().and_then(Option::as_deref),
        )?;
        Ok(changes)
    }
}
