pub mod analysis;
pub mod core;
pub mod http;
pub mod recovery;
pub mod tools;

// --- Primary core exports ---
pub use core::types;
pub use core::types::*;
pub use core::AppState;
