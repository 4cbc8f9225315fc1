pub mod client;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
mod record;
pub mod store;
