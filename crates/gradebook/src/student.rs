//! Student record types and request payload validation.
//!
//! This module defines the stored record shape, the typed inputs the gateway
//! accepts, and the conversion from loosely-typed JSON request bodies into
//! those inputs.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::grade::{Letter, Score};

/// Opaque identifier of a stored student record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for StudentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for StudentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored student record.
///
/// Serialized with the camel-case field names clients see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    /// Store-assigned identifier.
    pub id: StudentId,
    /// Free-form display name.
    pub name: String,
    /// Mathematics score.
    pub math_score: Score,
    /// Science score.
    pub science_score: Score,
    /// English score.
    pub english_score: Score,
    /// Letter for `math_score`.
    pub math_letter: Letter,
    /// Letter for `science_score`.
    pub science_letter: Letter,
    /// Letter for `english_score`.
    pub english_letter: Letter,
}

impl StudentRecord {
    /// Assemble a record from its id, name and graded scores.
    #[must_use]
    pub fn new(id: StudentId, name: String, grades: &GradedScores) -> Self {
        Self {
            id,
            name,
            math_score: grades.scores.math,
            science_score: grades.scores.science,
            english_score: grades.scores.english,
            math_letter: grades.math_letter,
            science_letter: grades.science_letter,
            english_letter: grades.english_letter,
        }
    }
}

/// The three subject scores of a student.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    /// Mathematics score.
    pub math: Score,
    /// Science score.
    pub science: Score,
    /// English score.
    pub english: Score,
}

/// Scores paired with the letters derived from them.
///
/// The only constructor classifies each score, so a value of this type always
/// carries letters consistent with its scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradedScores {
    scores: Scores,
    math_letter: Letter,
    science_letter: Letter,
    english_letter: Letter,
}

impl GradedScores {
    /// Classify each of the given scores.
    #[must_use]
    pub fn classify(scores: Scores) -> Self {
        Self {
            scores,
            math_letter: scores.math.letter(),
            science_letter: scores.science.letter(),
            english_letter: scores.english.letter(),
        }
    }

    /// The underlying scores.
    #[must_use]
    pub fn scores(&self) -> Scores {
        self.scores
    }

    /// Letters in math, science, english order.
    #[must_use]
    pub fn letters(&self) -> [Letter; 3] {
        [self.math_letter, self.science_letter, self.english_letter]
    }
}

/// Validated input for creating a student.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    /// Display name.
    pub name: String,
    /// Initial scores.
    pub scores: Scores,
}

/// Raw JSON request body for create and update calls.
///
/// Every field is optional at this stage; [`StudentPayload::into_new_student`]
/// and [`StudentPayload::into_scores`] decide what is required. The older
/// `*Grade` field names are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPayload {
    /// Display name (create only).
    #[serde(default)]
    pub name: Option<Value>,
    /// Mathematics score.
    #[serde(default, alias = "mathGrade")]
    pub math_score: Option<Value>,
    /// Science score.
    #[serde(default, alias = "scienceGrade")]
    pub science_score: Option<Value>,
    /// English score.
    #[serde(default, alias = "englishGrade")]
    pub english_score: Option<Value>,
}

impl StudentPayload {
    /// Parse a payload out of an arbitrary JSON value.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `value` is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::validation("request body must be a JSON object"));
        }
        serde_json::from_value(value).map_err(|e| Error::validation(e.to_string()))
    }

    /// Validate a create request.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name or any score is absent or malformed.
    pub fn into_new_student(self) -> Result<NewStudent> {
        let name = coerce_name(self.name)?;
        let scores = Self::scores_from(self.math_score, self.science_score, self.english_score)?;
        Ok(NewStudent { name, scores })
    }

    /// Validate an update request. Any `name` field is ignored.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any score is absent or malformed.
    pub fn into_scores(self) -> Result<Scores> {
        Self::scores_from(self.math_score, self.science_score, self.english_score)
    }

    fn scores_from(
        math: Option<Value>,
        science: Option<Value>,
        english: Option<Value>,
    ) -> Result<Scores> {
        Ok(Scores {
            math: coerce_score("mathScore", math)?,
            science: coerce_score("scienceScore", science)?,
            english: coerce_score("englishScore", english)?,
        })
    }
}

fn coerce_name(value: Option<Value>) -> Result<String> {
    match value {
        Some(Value::String(name)) => Ok(name),
        Some(Value::Number(n)) => Ok(n.to_string()),
        None | Some(Value::Null) => Err(Error::validation("name is required")),
        Some(_) => Err(Error::validation("name must be a string")),
    }
}

/// Coerce a JSON value into a score.
///
/// Numbers pass through; strings holding a finite decimal number are parsed.
fn coerce_score(field: &str, value: Option<Value>) -> Result<Score> {
    let raw = match value {
        None | Some(Value::Null) => return Err(Error::validation(format!("{field} is required"))),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Some(_) => None,
    };

    let raw = raw.ok_or_else(|| Error::validation(format!("{field} must be numeric")))?;
    Score::new(raw).map_err(|_| Error::validation(format!("{field} must be numeric")))
}
