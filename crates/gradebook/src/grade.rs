//! Letter-grade classification.
//!
//! Scores map to letters through a fixed ladder of inclusive lower bounds,
//! checked from the highest bound down. Anything below the last bound is an `F`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// A letter grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Letter {
    /// 90 and above.
    A,
    /// 80 up to 90.
    B,
    /// 70 up to 80.
    C,
    /// 60 up to 70.
    D,
    /// Below 60.
    F,
}

/// Inclusive lower bounds, highest first.
const THRESHOLDS: [(f64, Letter); 4] = [
    (90.0, Letter::A),
    (80.0, Letter::B),
    (70.0, Letter::C),
    (60.0, Letter::D),
];

impl Letter {
    /// The single-character form stored and serialized for this letter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Letter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "F" => Ok(Self::F),
            other => Err(Error::internal(format!("unknown letter grade: {other}"))),
        }
    }
}

/// Classify a raw score.
///
/// Negative, fractional and infinite values all land on the ladder. `NaN` has
/// no place on it and is rejected.
///
/// # Errors
///
/// Returns [`Error::InvalidScore`] if `score` is `NaN`.
pub fn classify(score: f64) -> Result<Letter> {
    if score.is_nan() {
        return Err(Error::InvalidScore {
            value: score.to_string(),
        });
    }

    Ok(THRESHOLDS
        .iter()
        .find(|(bound, _)| score >= *bound)
        .map_or(Letter::F, |(_, letter)| *letter))
}

/// A numeric subject score.
///
/// Always a number: construction rejects `NaN`, so [`Score::letter`] cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Score(f64);

impl Score {
    /// Wrap a raw value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidScore`] if `value` is `NaN`.
    pub fn new(value: f64) -> Result<Self> {
        classify(value)?;
        Ok(Self(value))
    }

    /// The raw value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// The letter grade for this score.
    #[must_use]
    pub fn letter(self) -> Letter {
        classify(self.0).unwrap_or(Letter::F)
    }

    /// The score as an integer, if it is a whole number that fits.
    #[allow(clippy::cast_possible_truncation)]
    fn as_whole(self) -> Option<i64> {
        let whole = self.0 as i64;
        #[allow(clippy::cast_precision_loss)]
        let exact = self.0.fract() == 0.0 && whole as f64 == self.0;
        exact.then_some(whole)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_whole() {
            Some(whole) => write!(f, "{whole}"),
            None => write!(f, "{}", self.0),
        }
    }
}

impl TryFrom<f64> for Score {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.as_whole() {
            Some(whole) => serializer.serialize_i64(whole),
            None => serializer.serialize_f64(self.0),
        }
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(90.0).unwrap(), Letter::A);
        assert_eq!(classify(89.999).unwrap(), Letter::B);
        assert_eq!(classify(80.0).unwrap(), Letter::B);
        assert_eq!(classify(79.5).unwrap(), Letter::C);
        assert_eq!(classify(70.0).unwrap(), Letter::C);
        assert_eq!(classify(69.99).unwrap(), Letter::D);
        assert_eq!(classify(60.0).unwrap(), Letter::D);
        assert_eq!(classify(59.999).unwrap(), Letter::F);
    }

    #[test]
    fn test_classify_out_of_range_values() {
        assert_eq!(classify(150.0).unwrap(), Letter::A);
        assert_eq!(classify(-5.0).unwrap(), Letter::F);
        assert_eq!(classify(0.0).unwrap(), Letter::F);
        assert_eq!(classify(f64::INFINITY).unwrap(), Letter::A);
        assert_eq!(classify(f64::NEG_INFINITY).unwrap(), Letter::F);
    }

    #[test]
    fn test_classify_nan_is_invalid() {
        let err = classify(f64::NAN).unwrap_err();
        assert!(matches!(err, Error::InvalidScore { .. }));
    }

    #[test]
    fn test_classify_a_iff_at_least_90() {
        for tenths in -200..=1500 {
            let score = f64::from(tenths) / 10.0;
            let letter = classify(score).unwrap();
            assert_eq!(letter == Letter::A, score >= 90.0, "score {score}");
            assert_eq!(letter == Letter::F, score < 60.0, "score {score}");
        }
    }

    #[test]
    fn test_classify_deterministic() {
        for score in [12.5, 60.0, 77.0, 91.25] {
            assert_eq!(classify(score).unwrap(), classify(score).unwrap());
        }
    }

    #[test]
    fn test_letter_round_trips_through_str() {
        for letter in [Letter::A, Letter::B, Letter::C, Letter::D, Letter::F] {
            assert_eq!(letter.as_str().parse::<Letter>().unwrap(), letter);
        }
        assert!("E".parse::<Letter>().is_err());
    }

    #[test]
    fn test_letter_serializes_as_single_char() {
        assert_eq!(serde_json::to_string(&Letter::C).unwrap(), "\"C\"");
    }

    #[test]
    fn test_score_rejects_nan() {
        assert!(Score::new(f64::NAN).is_err());
        assert!(Score::try_from(f64::NAN).is_err());
    }

    #[test]
    fn test_score_letter() {
        assert_eq!(Score::new(95.0).unwrap().letter(), Letter::A);
        assert_eq!(Score::new(58.0).unwrap().letter(), Letter::F);
    }

    #[test]
    fn test_whole_score_serializes_as_integer() {
        let score = Score::new(95.0).unwrap();
        assert_eq!(serde_json::to_string(&score).unwrap(), "95");
        assert_eq!(score.to_string(), "95");
    }

    #[test]
    fn test_fractional_score_serializes_as_float() {
        let score = Score::new(72.5).unwrap();
        assert_eq!(serde_json::to_string(&score).unwrap(), "72.5");
    }

    #[test]
    fn test_score_deserialize() {
        let score: Score = serde_json::from_str("88").unwrap();
        assert!((score.value() - 88.0).abs() < f64::EPSILON);
    }
}
