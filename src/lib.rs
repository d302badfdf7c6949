pub mod analysis;
#[cfg(feature = "desktop")]
pub mod camera;
pub mod config;
pub mod pose;
#[cfg(feature = "desktop")]
pub mod render;
pub mod report;
pub mod session;

#[cfg(test)]
mod test_support;
