pub mod config;
pub mod db;
pub mod diagnostics;
pub mod envelope;
pub mod error;
pub mod event_processor;
pub mod models;
pub mod projector;
pub mod provenance;
pub mod source;
pub mod store;
pub mod types;

pub use diagnostics::{CollectingDiagnostics, Diagnostics, Notice, TracingDiagnostics};
pub use event_processor::{EventProcessor, ProcessorOptions, ReceiptSummary};
pub use models::{EventKind, EventRecord};
pub use store::{EntityStore, MemoryStore};
pub use types::ReceiptWithOutcome;
