//! JSON file adapters for the primary and secondary configuration stores.

mod document;
mod file;
mod paths;
mod store;

pub use document::Document;
pub use paths::{PRIMARY_FILE_NAME, SECONDARY_RELATIVE_PATH, StorePaths};
pub use store::LayeredJsonConfigStore;

pub(crate) use document::{Owner, choose_owner};
