//! Redis adapters.

mod account_cache;

pub use account_cache::RedisAccountCache;
