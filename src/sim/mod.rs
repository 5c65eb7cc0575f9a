pub mod error_rates;
pub mod genome;
pub mod quality;
pub mod random;
pub mod reads;

pub use error_rates::{ErrorRateSet, RateKind};
pub use genome::{
    Breakpoint, IndelKind, IndelRecord, RearrangementKind, SimulatedGenome, SyntheticGenomeBuilder,
};
pub use quality::QualityPool;
pub use random::RandomModel;
pub use reads::{ErrorProfile, InsertSize, PairedReads, ReadPair, ReadSampler, SingleReads};
