//! The built-in graph nodes

mod emi;
mod router;
mod sales;
mod search;
mod underwriting;
mod user;

pub use emi::EmiNode;
pub use router::RouterNode;
pub use sales::SalesNode;
pub use search::{NO_RESULTS, SEARCH_UNAVAILABLE, SUMMARY_UNAVAILABLE, SearchNode};
pub use underwriting::UnderwritingNode;
pub use user::{FALLBACK_USER_MESSAGE, SyntheticUserNode};
