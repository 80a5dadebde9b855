//! Versioned event model.
//!
//! - [`SpecVersion`]: the closed set of schema revisions (`0.1`, `0.2`, `0.3`)
//! - [`EventContext`]: one context per revision, with lossless conversion of
//!   the common attribute set between them
//! - [`Event`]: a context paired with an optional payload
//! - [`Attribute`]: per-version wire name tables used by the transport codecs

pub mod attribute;
pub mod context;
pub mod event;
pub mod version;

pub use attribute::Attribute;
pub use context::{
    APPLICATION_JSON, EventContext, EventContextV01, EventContextV02, EventContextV03, Extensions,
};
pub use event::{Data, Event};
pub use version::SpecVersion;
