//! Utility functions for common operations.
//!
//! This module provides reusable utilities for:
//!
//! - **URL validation**: only http(s) addresses are fetched
//! - **Naming**: slugs for item directories and sanitised path components
//!
//! # Examples
//!
//! ```
//! use podvault::util::{sanitize_component, slugify, validate_url};
//!
//! let url = validate_url("https://example.com/feed.xml").unwrap();
//! assert_eq!(slugify("Episode #12"), "episode-12");
//! assert_eq!(sanitize_component("AC/DC").as_deref(), Some("AC_DC"));
//! ```

mod text;
mod url_validator;

pub use text::{sanitize_component, slugify};
pub use url_validator::{validate_url, UrlValidationError};
