//! repdb Core Library
//!
//! Repeat group discovery over a suffix ordering, the persisted repeat
//! database, joined-to-sequence coordinate translation and the
//! common-coordinate query engine.

pub mod types;
pub mod reference;
pub mod fragments;
pub mod suffix;
pub mod mask;
pub mod builder;
pub mod alt;
pub mod repeat;
pub mod query;
pub mod store;

// Re-export commonly used types and functions
pub use types::{JoinedPos, RepeatCoord, Segment, SnpId, Strand};
pub use reference::{join_sequences, JoinedReference, RefRecord};
pub use fragments::{Fragment, FragmentCache, FragmentTable, GenomeCoord, JoinedTranslator};
pub use mask::RepeatMask;
pub use builder::{
    BuildError, BuildParams, BuildResult, ExactMerge, LevenshteinMerge, MergePolicy,
    RepeatBuilder, RepeatGroup,
};
pub use alt::{variant_window, Alt, AltDb, AltSource};
pub use repeat::{Repeat, RepeatAllele, RepeatDb, RepeatError, RepeatResult, ResolvedRepeatDb};
pub use query::{AlleleIndexing, CommonCoordQuery, CoordPair, DEFAULT_DISTANCE};
pub use store::{IndexWidth, StoreError, StoreOptions, StoreResult};

/// Version information for the repdb core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
