//! Frontier engine: canonicalization, admission, scoring, politeness and the
//! breadth-first collection loop.

pub mod admission;
pub mod canonical;
pub mod collector;
pub mod politeness;
pub mod queue;
pub mod scorer;
pub mod stats;
