//! Services - business logic and state management
//!
//! This module contains the core counting logic:
//! - `pipeline` - Central frame loop driving all of the below
//! - `registry` - Centroid object registry (persistent identities)
//! - `crossing` - Track histories and line-crossing counts
//! - `dwell` - Dwell debounce and cooldown throttles
//! - `status` - Shared aggregate state with synchronized access

pub mod crossing;
pub mod dwell;
pub mod pipeline;
pub mod registry;
pub mod status;

// Re-export commonly used types
pub use crossing::CrossingCounter;
pub use pipeline::Pipeline;
pub use registry::CentroidRegistry;
pub use status::StatusBoard;
