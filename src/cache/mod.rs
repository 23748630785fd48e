pub mod store;

pub use store::{CacheStats, ResultCache};
