pub mod item;

pub use item::{ClubMember, OpportunityTarget, TrackedItem};
