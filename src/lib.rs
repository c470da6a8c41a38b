pub mod config;
pub mod errors;
pub mod player;
pub mod playlist;
pub mod prefetch;
pub mod utils;
