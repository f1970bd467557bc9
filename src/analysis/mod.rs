pub mod frequency;
pub mod summary;

pub use frequency::FrequencyTable;
pub use summary::{
    sample_paths, summarize_for_asn, summarize_generic, summarize_specialized, Report,
    SpecializedProfile, Summarizer, MAX_SAMPLES,
};
