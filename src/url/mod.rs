//! URL handling module for Sumi-Sitemap
//!
//! This module provides URL canonicalization and the same-origin filter that
//! together decide which links the crawler may follow.

mod canonical;
mod origin;

// Re-export main functions
pub use canonical::{canonicalize, canonicalize_absolute, CanonicalUrl};
pub use origin::{is_internal, origin_authority};
