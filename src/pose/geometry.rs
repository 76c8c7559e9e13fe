use super::keypoint::Keypoint;

/// 退化ケース (辺の長さ0) で返す角度
pub const DEGENERATE_ANGLE_DEG: f32 = 180.0;

/// 2点間のユークリッド距離
pub fn distance(p: &Keypoint, q: &Keypoint) -> f32 {
    let dx = q.x - p.x;
    let dy = q.y - p.y;
    (dx * dx + dy * dy).sqrt()
}

/// 2点の中点 (x, y)
pub fn midpoint(p: &Keypoint, q: &Keypoint) -> (f32, f32) {
    ((p.x + q.x) / 2.0, (p.y + q.y) / 2.0)
}

/// 頂点 B における内角（度）
///
/// 余弦定理: acos((AB² + BC² - AC²) / (2·AB·BC))
/// 戻り値は 0〜180 の範囲。AB か BC が長さ0なら 180 (直線扱い)
pub fn angle_at(a: &Keypoint, b: &Keypoint, c: &Keypoint) -> f32 {
    let ab = distance(a, b);
    let bc = distance(b, c);
    if ab <= f32::EPSILON || bc <= f32::EPSILON {
        return DEGENERATE_ANGLE_DEG;
    }
    let ac = distance(a, c);
    let cos = (ab * ab + bc * bc - ac * ac) / (2.0 * ab * bc);
    cos.clamp(-1.0, 1.0).acos().to_degrees()
}
