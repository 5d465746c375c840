//! Technique titles and the two ways of filling the objectives/TTPs lists.

pub mod client;
pub mod navigator;
pub mod picker;

pub use client::{TechniqueClient, TitleLookup};
pub use navigator::{import_navigator, NavigatorImport};
pub use picker::{PickerEvent, PickerSession};
