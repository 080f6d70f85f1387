pub mod ai;
pub mod constants;
pub mod controller;
pub mod engine;
pub mod error;
pub mod grid;
pub mod level;
pub mod match_state;
pub mod player;
pub mod powerup;
pub mod rng;
pub mod square;
pub mod timer;
pub mod types;

#[cfg(test)]
mod test_support;
