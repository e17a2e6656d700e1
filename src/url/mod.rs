//! URL handling module for Wiki-Trawl
//!
//! This module provides link resolution, normalization and candidate filtering.

mod filter;
mod normalize;

pub use filter::{FilteredLinks, LinkFilter};
pub use normalize::{normalize_url, resolve_link, same_origin};
