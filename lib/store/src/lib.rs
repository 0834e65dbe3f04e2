//! Record store collaborator for the fabx search engine.
//!
//! The engine only ever talks to a [`RecordStore`]; [`MemoryStore`] is the
//! reference implementation used by the CLI and the test suite.

pub mod memory;
pub mod store;

pub use memory::MemoryStore;
pub use store::{Attachment, AttachmentKind, RecordStore};
