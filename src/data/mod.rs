// mod.rs - Data structures module

pub mod sequence;

// Re-export main types for convenience
pub use sequence::{filter_records, load_sequences, segment_sequences, SequenceFilter, SequenceRecord};
