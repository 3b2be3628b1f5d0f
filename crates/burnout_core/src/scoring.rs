//! Questionnaire scoring.
//!
//! Ten answers on a 1..=5 scale. The total is their plain sum and a student
//! is flagged for support once the total reaches [`SUPPORT_THRESHOLD`].

use std::ops::RangeInclusive;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::BurnoutError;

pub const QUESTION_COUNT: usize = 10;

pub const SUPPORT_THRESHOLD: i32 = 35;

pub const ANSWER_RANGE: RangeInclusive<i32> = 1..=5;

/// The ten validated answers of one questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answers([i32; QUESTION_COUNT]);

impl Answers {
    /// Validate a raw submission: every answer present and inside [`ANSWER_RANGE`].
    pub fn from_submission(raw: [Option<i32>; QUESTION_COUNT]) -> Result<Self, BurnoutError> {
        let mut answers = [0; QUESTION_COUNT];
        for (idx, value) in raw.iter().enumerate() {
            let value = value.ok_or_else(|| {
                BurnoutError::InvalidInput(format!("Answer q{} is required.", idx + 1))
            })?;
            if !ANSWER_RANGE.contains(&value) {
                return Err(BurnoutError::InvalidInput(format!(
                    "Answer q{} must be between {} and {}.",
                    idx + 1,
                    ANSWER_RANGE.start(),
                    ANSWER_RANGE.end()
                )));
            }
            answers[idx] = value;
        }
        Ok(Self(answers))
    }

    /// Rebuild from persisted columns without re-validating.
    pub fn from_stored(values: [i32; QUESTION_COUNT]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[i32; QUESTION_COUNT] {
        &self.0
    }

    pub fn total(&self) -> i32 {
        self.0.iter().sum()
    }

    pub fn score(&self) -> Score {
        Score::from_total(self.total())
    }
}

impl Serialize for Answers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(QUESTION_COUNT))?;
        for (idx, value) in self.0.iter().enumerate() {
            map.serialize_entry(&format!("q{}", idx + 1), value)?;
        }
        map.end()
    }
}

/// Derived score of a questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub total: i32,
    pub needs_support: bool,
}

impl Score {
    pub fn from_total(total: i32) -> Self {
        Self {
            total,
            needs_support: total >= SUPPORT_THRESHOLD,
        }
    }
}
