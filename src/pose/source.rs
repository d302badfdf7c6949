use anyhow::Result;

use super::landmark::Landmark;

/// フレームからランドマーク列を得る外部コラボレータ
///
/// 人物が検出されなければ `Ok(None)`。検出時は BlazePose 順の
/// ランドマーク列を返す（通常 33 点だが呼び出し側は長さを仮定しない）。
pub trait LandmarkSource {
    type Frame;

    fn detect(&mut self, frame: &Self::Frame) -> Result<Option<Vec<Landmark>>>;
}

impl<S: LandmarkSource + ?Sized> LandmarkSource for Box<S> {
    type Frame = S::Frame;

    fn detect(&mut self, frame: &Self::Frame) -> Result<Option<Vec<Landmark>>> {
        (**self).detect(frame)
    }
}
