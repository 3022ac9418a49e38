//! Bestiary Engine library.
//!
//! Turns 5etools bestiary records into normalized creature stat blocks.
//!
//! ## Structure
//!
//! - `infrastructure/` - the 5etools importer: markup resolution, damage and
//!   action extraction, spellcasting, and creature assembly
//! - `use_cases/` - batch mapping of whole bestiary files

pub mod infrastructure;
pub mod use_cases;
