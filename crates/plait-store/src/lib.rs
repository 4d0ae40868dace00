//! Fragment persistence for Plait.
//!
//! - [`FragmentNames`]: the on-disk naming scheme of one object's files.
//! - [`FileStore`]: writes fragments and metadata into a coding directory
//!   and serves them back as a [`FragmentSource`](plait_layer::FragmentSource).

mod error;
mod file_store;
mod naming;

pub use error::StoreError;
pub use file_store::{FileStore, FragmentStatus};
pub use naming::FragmentNames;
