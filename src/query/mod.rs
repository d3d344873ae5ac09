//! Query text: placeholder rendering, the fixed statements a load issues, and the read-only
//! catalog.
//!
//! - [`template`]: `$name` → escaped literal rendering ([`render`])
//! - [`statements`]: mutation templates, index list, verification queries
//! - [`catalog`]: read-only lookups over a loaded graph ([`Catalog`])

pub mod catalog;
pub mod statements;
pub mod template;

pub use catalog::Catalog;
pub use template::{render, Params};
