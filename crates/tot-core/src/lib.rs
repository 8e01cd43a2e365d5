//! Core of `tot`, a personal time-series logger.
//!
//! Users define named series ("ate", "weight") with a fixed set of value
//! columns, append timestamped rows, and list them back filtered by time.
//! This crate provides:
//!
//! - A [`Clock`] abstraction with a wall-clock and a settable test clock
//!   (`clock` module).
//! - Series definitions: storage keys, value validation and the delimited
//!   line format (`series` module).
//! - Resolution of loose time tokens (`2020-10-04 3pm`, `8pm`, `-45m`) into
//!   absolute timestamps (`time` module).
//! - The [`DataAccessor`] contract with a file-backed and an in-memory
//!   backend (`accessor` module).
//! - Chronological listing, `--after` filtering, distinct days and the
//!   latest row per series (`query` module).
//!
//! The CLI crate depends on this one and only adds argument parsing and
//! rendering.
#![deny(missing_docs)]
pub mod accessor;
pub mod clock;
pub mod error;
pub mod query;
pub mod series;
pub mod time;

pub use accessor::{DataAccessor, FileDataAccessor, InMemoryDataAccessor};
pub use clock::{Clock, MockClock, SystemClock};
pub use error::{TotError, TotResult};
pub use series::SeriesDefinition;
