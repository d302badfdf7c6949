#[cfg(feature = "desktop")]
pub mod detector;
pub mod landmark;
#[cfg(feature = "desktop")]
pub mod preprocess;
pub mod source;

#[cfg(feature = "desktop")]
pub use detector::PoseDetector;
pub use landmark::{landmark_at, Landmark, LandmarkIndex};
#[cfg(feature = "desktop")]
pub use preprocess::preprocess_for_blazepose;
pub use source::LandmarkSource;
