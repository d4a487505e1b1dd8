pub mod articles;
pub mod categories;
pub mod common;
pub mod health;
pub mod products;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;
