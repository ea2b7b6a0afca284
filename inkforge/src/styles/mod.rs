mod profile;
mod source;
mod store;

pub use profile::{PrimingSample, StyleDefinition, StyleProfile, StyleSummary};
pub use source::{DirectorySource, MemorySource, StyleSource};
pub use store::StyleStore;
