pub mod config;
pub mod docx;
pub mod form;
pub mod generate;
pub mod keycache;
pub mod policy;
pub mod render;
pub mod report;
pub mod sheets;
pub mod state;
pub mod summarizer;
pub mod techniques;
pub mod transport;

pub mod error;
