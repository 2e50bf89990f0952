//! Output layout: naming rules and the on-disk store.

pub mod paths;
pub mod store;

pub use paths::{AssetKind, BundlePaths, relative_ref};
pub use store::OutputStore;
