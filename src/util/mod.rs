mod store;
mod time;

pub use store::UploadStore;
pub use time::{format_local, now_local};
