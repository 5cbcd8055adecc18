//! Transcript-aware region selection and coverage bin sizing for CNV
//! analysis.

pub mod binsize;
pub mod cache;
pub mod cli;
pub mod collapse;
pub mod coverage;
pub mod error;
pub mod exclude;
pub mod genome;
pub mod interval;
pub mod metrics;
pub mod regions;
pub mod utils;
