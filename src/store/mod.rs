mod document;
mod save_store;

pub use document::{SaveData, SAVE_VERSION};
pub use save_store::{SaveStore, StoreError};
