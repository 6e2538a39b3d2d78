mod connection;

pub use connection::{check_health, close_pool, create_pool};
