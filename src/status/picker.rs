//! Weighted status picker
//!
//! `pick` either echoes a caller-supplied code that is part of the table or
//! draws one at random, weighted. Anything else degrades to 400.

use axum::http::StatusCode;
use rand::distr::weighted::{self, WeightedIndex};
use rand::distr::Distribution;
use rand::Rng;
use thiserror::Error;

/// Query value that explicitly asks for a random code
pub const RANDOM_TOKEN: &str = "random";

/// Built-in table: success is five times as likely as each failure code
pub const DEFAULT_CHOICES: [(u16, u32); 5] = [(200, 5), (400, 1), (500, 1), (502, 1), (503, 1)];

#[derive(Debug, Error)]
pub enum PickerError {
    #[error("status table must contain at least one code")]
    Empty,

    #[error("invalid HTTP status code: {0}")]
    InvalidCode(u16),

    #[error("status code {0} has zero weight")]
    ZeroWeight(u16),

    #[error("status code {0} listed more than once")]
    DuplicateCode(u16),

    #[error("invalid weights: {0}")]
    Weights(#[from] weighted::Error),
}

/// Deduplicated `(code, weight)` table with a precomputed weighted index
#[derive(Debug, Clone)]
pub struct StatusPicker {
    choices: Vec<(StatusCode, u32)>,
    index: WeightedIndex<u32>,
}

impl StatusPicker {
    /// Build a picker from an explicit `(code, weight)` table
    ///
    /// Order is preserved. Codes must be unique, valid and carry a
    /// non-zero weight.
    pub fn new(choices: Vec<(u16, u32)>) -> Result<Self, PickerError> {
        if choices.is_empty() {
            return Err(PickerError::Empty);
        }

        let mut table: Vec<(StatusCode, u32)> = Vec::with_capacity(choices.len());
        for (code, weight) in choices {
            let status = StatusCode::from_u16(code).map_err(|_| PickerError::InvalidCode(code))?;
            if weight == 0 {
                return Err(PickerError::ZeroWeight(code));
            }
            if table.iter().any(|(existing, _)| *existing == status) {
                return Err(PickerError::DuplicateCode(code));
            }
            table.push((status, weight));
        }

        let index = WeightedIndex::new(table.iter().map(|(_, weight)| *weight))?;

        Ok(Self {
            choices: table,
            index,
        })
    }

    /// Build a picker over [`DEFAULT_CHOICES`]
    pub fn with_default_choices() -> Result<Self, PickerError> {
        Self::new(DEFAULT_CHOICES.to_vec())
    }

    /// Build a picker from a population where repetition encodes weight
    ///
    /// `[200, 200, 400]` becomes `[(200, 2), (400, 1)]`, keeping the order
    /// in which codes first appear.
    pub fn from_population(codes: &[u16]) -> Result<Self, PickerError> {
        let mut weights: Vec<(u16, u32)> = Vec::new();
        for &code in codes {
            match weights.iter_mut().find(|(existing, _)| *existing == code) {
                Some((_, weight)) => *weight += 1,
                None => weights.push((code, 1)),
            }
        }
        Self::new(weights)
    }

    /// Resolve the requested status using the thread-local RNG
    pub fn pick(&self, requested: Option<&str>) -> StatusCode {
        self.pick_with(requested, &mut rand::rng())
    }

    /// Resolve the requested status using the given random source
    ///
    /// - absent, empty or `"random"`: weighted random draw
    /// - a base-10 integer in the table: that code
    /// - anything else: 400 Bad Request
    pub fn pick_with<R: Rng + ?Sized>(&self, requested: Option<&str>, rng: &mut R) -> StatusCode {
        match requested {
            None | Some("") | Some(RANDOM_TOKEN) => self.choices[self.index.sample(rng)].0,
            Some(value) => value
                .parse::<u16>()
                .ok()
                .and_then(|code| self.lookup(code))
                .unwrap_or(StatusCode::BAD_REQUEST),
        }
    }

    /// Whether `code` may be requested explicitly
    pub fn contains(&self, code: u16) -> bool {
        self.lookup(code).is_some()
    }

    pub fn choices(&self) -> &[(StatusCode, u32)] {
        &self.choices
    }

    pub fn total_weight(&self) -> u32 {
        self.choices.iter().map(|(_, weight)| weight).sum()
    }

    /// Probability that a random draw yields `code` (0.0 if not in the table)
    pub fn probability(&self, code: u16) -> f64 {
        self.choices
            .iter()
            .find(|(status, _)| status.as_u16() == code)
            .map(|(_, weight)| f64::from(*weight) / f64::from(self.total_weight()))
            .unwrap_or(0.0)
    }

    fn lookup(&self, code: u16) -> Option<StatusCode> {
        self.choices
            .iter()
            .map(|(status, _)| *status)
            .find(|status| status.as_u16() == code)
    }
}
