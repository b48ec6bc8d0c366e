//! Shared run state
//!
//! Every object here is constructed once per scan and handed to workers by
//! `Arc`. Each guards itself with its own narrow lock.
//!
//! # Components
//!
//! - `MembershipFilter`: approximate "already queued" test (bloom filter)
//! - `DuplicateVisitCounter`: exact per-URL sighting counts for display
//! - `DangerousUrlRegistry`: URLs skipped by the danger keyword guard
//! - `ExternalLedger`: external URLs discovered vs. visited
//! - `RequestBudget`: atomic cap on issued requests

mod budget;
mod duplicates;
mod membership;
mod registry;

pub use budget::RequestBudget;
pub use duplicates::DuplicateVisitCounter;
pub use membership::MembershipFilter;
pub use registry::{DangerousUrlRegistry, ExternalLedger};
