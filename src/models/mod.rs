pub mod encode;
pub mod state;
