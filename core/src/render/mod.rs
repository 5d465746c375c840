//! Exports besides the `.docx`: an HTML preview and the observables sheet.

pub mod html;
pub mod observables;

pub use html::{render_html, HtmlReport};
pub use observables::{observables_file_name, render_observables_csv};
