//! Report document model, its translation into `docx-rs` and the
//! deterministic package writer.

pub mod assemble;
pub mod inspect;
pub mod model;
pub mod package;
pub mod word;

pub use assemble::{assemble, AssembledDocument};
pub use inspect::{inspect_docx, DocxInspection};
