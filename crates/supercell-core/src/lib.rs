//! # Supercell Core
//!
//! Value types shared by every supercell crate:
//!
//! - [`ContentType`] and [`Version`]: media type identities carrying an
//!   optional vendor and version, as in `application/vnd.acme-v1.2+json`
//! - [`parse_accept_header`]: a total parser turning `Accept` or
//!   `Content-Type` values into quality-ordered [`AcceptCandidate`]s
//! - [`Model`] and [`ModelType`]: the contract between handlers and
//!   (de)serializers
//! - [`Error`] and [`ValidationErrors`]
//!
//! ## Example
//!
//! ```
//! use supercell_core::{ContentType, parse_accept_header};
//!
//! let candidates = parse_accept_header("application/vnd.acme+json, text/html;q=0.5");
//! let wanted = candidates[0].target_content_type().unwrap();
//! assert_eq!(wanted, ContentType::json().with_vendor("acme"));
//! ```

pub mod accept;
pub mod exception;
pub mod media_type;
pub mod model;

pub use accept::{AcceptCandidate, parse_accept_header};
pub use exception::{Error, NON_FIELD_ERRORS, Result, ValidationErrors};
pub use media_type::{ContentType, MediaType, Version};
pub use model::{Model, ModelType};
