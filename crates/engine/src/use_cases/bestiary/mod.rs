//! Bestiary batch use cases.
//!
//! Maps a whole 5etools bestiary file to normalized creatures and writes the
//! result as JSON.

mod bestiary_service;

pub use bestiary_service::{
    BatchReport, BestiaryError, BestiaryService, BestiaryServiceConfig, RecordFailure,
};
