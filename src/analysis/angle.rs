//! 3点から関節角度を求める
//!
//! v1 = p1 - p2, v2 = p3 - p2 として cos(θ) = (v1 · v2) / (|v1| |v2|)

/// ベクトル長がこれ未満なら退化とみなす
const MIN_SEGMENT_LENGTH: f32 = 1e-6;

/// 頂点 `vertex` における内角（度、0〜180）
///
/// 2点が重なる等で角度が定義できない場合は 0.0 を返す。
pub fn calculate_angle(proximal: (f32, f32), vertex: (f32, f32), distal: (f32, f32)) -> f32 {
    let v1 = (proximal.0 - vertex.0, proximal.1 - vertex.1);
    let v2 = (distal.0 - vertex.0, distal.1 - vertex.1);

    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();

    if !(mag1 >= MIN_SEGMENT_LENGTH && mag2 >= MIN_SEGMENT_LENGTH) {
        return 0.0;
    }

    let cos_angle = dot / (mag1 * mag2);
    if !cos_angle.is_finite() {
        return 0.0;
    }

    // 丸め誤差で [-1, 1] をわずかに超えることがある
    cos_angle.clamp(-1.0, 1.0).acos().to_degrees()
}
