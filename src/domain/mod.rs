pub mod physics;
pub mod rules;
pub mod state;
