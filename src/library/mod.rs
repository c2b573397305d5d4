//! Track metadata, the ordered registry synced to the host, and upload screening.

pub mod models;
pub mod registry;
pub mod upload;

pub use models::{format_duration, format_file_size, Track};
pub use registry::{load_registry, persist_change, RegistryCell, TrackRegistry};
pub use upload::{import, BatchListener, FileCandidate, ImportOutcome};
