//! Shared landmark fixtures for unit tests.

use crate::pose::{Landmark, LandmarkIndex};

pub fn set(landmarks: &mut [Landmark], idx: LandmarkIndex, x: f32, y: f32, visibility: f32) {
    landmarks[idx as usize] = Landmark::new(x, y, 0.0, visibility);
}

/// Upright stance in image coordinates (y grows downward).
pub fn standing_pose() -> Vec<Landmark> {
    let mut landmarks = vec![Landmark::new(0.5, 0.1, 0.0, 0.9); LandmarkIndex::COUNT];
    let lm = &mut landmarks;
    set(lm, LandmarkIndex::LeftShoulder, 0.45, 0.3, 0.95);
    set(lm, LandmarkIndex::RightShoulder, 0.55, 0.3, 0.95);
    set(lm, LandmarkIndex::LeftHip, 0.45, 0.5, 0.91);
    set(lm, LandmarkIndex::RightHip, 0.55, 0.5, 0.92);
    set(lm, LandmarkIndex::LeftKnee, 0.45, 0.7, 0.81);
    set(lm, LandmarkIndex::RightKnee, 0.55, 0.7, 0.82);
    set(lm, LandmarkIndex::LeftAnkle, 0.45, 0.9, 0.71);
    set(lm, LandmarkIndex::RightAnkle, 0.55, 0.9, 0.72);
    set(lm, LandmarkIndex::LeftHeel, 0.43, 0.92, 0.6);
    set(lm, LandmarkIndex::RightHeel, 0.53, 0.92, 0.6);
    set(lm, LandmarkIndex::LeftFootIndex, 0.47, 0.93, 0.6);
    set(lm, LandmarkIndex::RightFootIndex, 0.57, 0.93, 0.6);
    landmarks
}

/// Standing pose with both knees flexed to roughly `knee_angle` degrees.
///
/// The ankle is swung backward around the knee; hips and shoulders stay put.
pub fn pose_with_knee_angle(knee_angle: f32) -> Vec<Landmark> {
    let mut landmarks = standing_pose();
    let theta = (180.0 - knee_angle).to_radians();
    for (knee, ankle) in [
        (LandmarkIndex::LeftKnee, LandmarkIndex::LeftAnkle),
        (LandmarkIndex::RightKnee, LandmarkIndex::RightAnkle),
    ] {
        let k = landmarks[knee as usize];
        let vis = landmarks[ankle as usize].visibility;
        set(&mut landmarks, ankle, k.x - 0.2 * theta.sin(), k.y + 0.2 * theta.cos(), vis);
    }
    landmarks
}
