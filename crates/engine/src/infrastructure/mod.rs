//! Infrastructure implementations.
//!
//! Contains the 5etools importer and the stat-block parsers behind it.

pub mod importers;
