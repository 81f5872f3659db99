mod catalog;
mod error;
mod snapshot;

pub use catalog::{find_bikes, load_bikes, Bike};
pub use error::StoreError;
pub use snapshot::{write_snapshot, ARCHIVE_DIR, CURRENT_DIR};
