pub mod blob;
pub mod centroid;

pub use blob::{extract_blobs, smooth_mask, Blob};
pub use centroid::motion_centroid;
