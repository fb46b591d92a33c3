pub mod extract;
pub mod histogram;

pub use extract::compute_feature_vector;
pub use histogram::{quantize, round_to_ten, sum_to_one};
