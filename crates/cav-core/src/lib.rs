#![deny(missing_docs)]
#![doc = "Core error, unit and table types shared by the cavity characterization pipeline."]

pub mod errors;
pub mod floats;
pub mod hash;
pub mod provenance;
pub mod serde;
pub mod table;
pub mod units;

pub use errors::{CavError, ErrorInfo, Stage};
pub use floats::{format_sentinel_f64, parse_sentinel_f64};
pub use hash::stable_hash_string;
pub use provenance::{RunProvenance, SchemaVersion};
pub use serde::{from_json_slice, to_canonical_json_bytes};
pub use table::{write_csv, write_csv_to, Table, XyColumns};
pub use units::{ev_to_nm, nm_to_ev, LengthUnit, HC_EV_NM};
