pub mod ask;
pub mod config;
pub mod ingest;
pub mod serve;

// Re-export all the command structs
pub use ask::AskArgs;
pub use config::ConfigArgs;
pub use ingest::IngestArgs;
pub use serve::ServeArgs;
