//! Spectral matching and tolerance aggregation.
//!
//! Each emitter line is converted to a wavelength, looked up on the
//! enhancement spectrum (nearest point and windowed maximum) and compared
//! with the spectrum peak. The resulting table is sorted by detuning and
//! hashed so that repeated runs can be compared byte for byte.

pub mod record;
pub mod render;
pub mod report;
pub mod wavelength;

pub use record::{lifetime, match_line, AcceptanceWindow, MatchOpts, MatchRecord};
pub use render::{MATCH_HEADERS, TOLERANCE_HEADERS};
pub use report::{compare_records, match_lines, MatchTable, PeakSummary, TolerancePoint};
pub use wavelength::WavelengthSpectrum;
