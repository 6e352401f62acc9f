//! Sampling containers used to pick registration candidates

pub mod weighted_sampler;

pub use weighted_sampler::WeightedSampler;
