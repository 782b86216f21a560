//! URL handling module for Sumi-Map
//!
//! This module provides URL normalization (used to key the visited-page map)
//! and the host comparison that decides whether a link stays on the target site.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, same_host};
pub use normalize::normalize_url;
