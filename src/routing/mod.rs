//! Visit routing between site A and site B

mod router;
mod sampler;

pub use router::{decide, simulate, SplitReport, VariantRouter};
pub use sampler::{visitor_unit, SeededSampler, ThreadRngSampler, UnitSampler};
