pub mod bbox;
pub mod fuse;
pub mod subject;

pub use bbox::BBox;
pub use fuse::{closest_to, filter_nested};
pub use subject::{SubjectTracker, TrackState};
