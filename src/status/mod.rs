//! Synthetic status-code selection for the `/status` endpoint
//!
//! The allowed codes double as the population for random draws, so the
//! table carries an explicit weight per code instead of repeating entries.

mod picker;

pub use picker::{PickerError, StatusPicker, DEFAULT_CHOICES, RANDOM_TOKEN};

#[cfg(test)]
#[path = "picker_test.rs"]
mod tests;
