pub mod alignments;
pub mod bed;
pub mod output;
pub mod reference;

pub use reference::{FastaReference, MemoryReference, ReferenceAccessor};
