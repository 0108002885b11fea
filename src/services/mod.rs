pub mod client;
pub mod engine;
pub mod normalize;
pub mod state_map;
