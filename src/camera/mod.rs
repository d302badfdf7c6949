pub mod capture;

pub use capture::{VideoInput, VideoSource};
