//! canlog Frame Record Verification
//!
//! This crate checks already-framed records for send period, heartbeat
//! continuity and XOR checksum integrity, and renders console reports.
//! It works on raw records only and never depends on the decode engine.

pub mod profile;
pub mod record_validator;
pub mod reporter;

pub use profile::{ProfileTable, ValidatorProfile};
pub use record_validator::{
    RecordCheck, RecordStatus, RecordValidator, ValidationFinding, ValidationReport,
    ValidationState,
};
pub use reporter::ReportGenerator;
