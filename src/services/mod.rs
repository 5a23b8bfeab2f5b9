mod ai;
mod app_config;
mod chunker;
mod ingest;
mod loader;
pub mod parser;

pub use ai::*;
pub use app_config::*;
pub use chunker::*;
pub use ingest::*;
pub use loader::*;
