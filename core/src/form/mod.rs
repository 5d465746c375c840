//! The form as an external collaborator: a JSON snapshot in, a flat
//! [`FormData`] record out.

pub mod snapshot;
pub mod validate;

pub use snapshot::{Author, EvidenceInput, EvidenceRow, FormData, FormSnapshot, ManualEntry, Observable};
