pub mod config;
pub mod feature;
pub mod pipeline;
pub mod roi;
pub mod segment;
pub mod tracker;
