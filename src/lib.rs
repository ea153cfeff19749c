//! Command post (CP) selection for search-and-rescue operations.
//!
//! From the last known position of a missing person, the time they have been
//! missing and their walking speed, [`CpSearch`] computes the area they can
//! have reached on foot and ranks the surface parkings inside it by size.

pub mod bbox;
pub mod cache;
pub mod candidates;
pub mod config;
pub mod error;
pub mod feature;
pub mod geocoder;
pub mod isochrone;
pub mod logging;
pub mod overpass;
pub mod planner;
pub mod projection;
pub mod resolver;
pub mod search;
pub mod selector;
pub mod utils;

#[cfg(feature = "python")]
mod python;

pub use candidates::ParkingCandidate;
pub use config::Config;
pub use error::{CpError, Result};
pub use planner::{SearchBudget, StepMode};
pub use resolver::SearchOrigin;
pub use search::{CpSearch, SearchOutcome, SearchRequest};
pub use selector::CandidateSet;
