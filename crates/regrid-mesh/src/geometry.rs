//! Small vector helpers over `[f64; 3]`.

/// A point or direction in 3-space.
pub type Vec3 = [f64; 3];

/// `a + b`.
pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// `a - b`.
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// `s * a`.
pub fn scale(a: Vec3, s: f64) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

/// Dot product.
pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Cross product.
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Euclidean length.
pub fn norm(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

/// Distance between two points.
pub fn distance(a: Vec3, b: Vec3) -> f64 {
    norm(sub(b, a))
}

/// Unit vector along `a`, or `None` for a zero vector.
pub fn normalize(a: Vec3) -> Option<Vec3> {
    let len = norm(a);
    (len > 0.0 && len.is_finite()).then(|| scale(a, 1.0 / len))
}

/// Twice the area-weighted normal of triangle `(a, b, c)`.
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    cross(sub(b, a), sub(c, a))
}

/// Opposite-angle quality of the corner at `apex`: `1 + min(0, cos θ)`.
///
/// Right and acute corners score 1; a fully flat corner scores 0.
pub fn corner_quality(apex: Vec3, a: Vec3, b: Vec3) -> f64 {
    let u = sub(a, apex);
    let v = sub(b, apex);
    let denom = norm(u) * norm(v);
    if denom == 0.0 {
        return 0.0;
    }
    1.0 + (dot(u, v) / denom).min(0.0)
}

/// Tangent at `p` toward `toward` within the plane normal to `n`, rescaled
/// to the chord length. Falls back to the chord when it is parallel to `n`.
fn tangent(p: Vec3, toward: Vec3, n: Vec3) -> Vec3 {
    let chord = sub(toward, p);
    let len = norm(chord);
    let projected = sub(chord, scale(n, dot(chord, n)));
    match normalize(projected) {
        Some(dir) => scale(dir, len),
        None => chord,
    }
}

/// Midpoint of the cubic Hermite curve from `p0` to `p1` whose end
/// tangents lie in the tangent planes given by unit normals `n0` and `n1`.
///
/// With `t0` leaving `p0` and `t1` arriving at `p1` this is
/// `(p0 + p1) / 2 + (t0 - t1) / 8`. On a flat patch it is the chord
/// midpoint; on a sphere it bulges outward toward the surface.
pub fn hermite_midpoint(p0: Vec3, n0: Vec3, p1: Vec3, n1: Vec3) -> Vec3 {
    let t0 = tangent(p0, p1, n0);
    let t1 = scale(tangent(p1, p0, n1), -1.0);
    add(scale(add(p0, p1), 0.5), scale(sub(t0, t1), 0.125))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        distance(a, b) < 1e-12
    }

    #[test]
    fn cross_is_right_handed() {
        assert_eq!(cross([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn normalize_zero_is_none() {
        assert_eq!(normalize([0.0; 3]), None);
        assert_eq!(normalize([0.0, 3.0, 0.0]), Some([0.0, 1.0, 0.0]));
    }

    #[test]
    fn flat_patch_midpoint_is_chord_midpoint() {
        let up = [0.0, 0.0, 1.0];
        let m = hermite_midpoint([0.0, 0.0, 0.0], up, [2.0, 0.0, 0.0], up);
        assert!(close(m, [1.0, 0.0, 0.0]));
    }

    #[test]
    fn sphere_midpoint_bulges_outward() {
        let a = [1.0, 0.0, 0.0];
        let b = [0.0, 1.0, 0.0];
        let m = hermite_midpoint(a, a, b, b);
        let chord_mid = [0.5, 0.5, 0.0];
        assert!(norm(m) > norm(chord_mid));
        assert!((norm(m) - 1.0).abs() < 0.05);
    }

    #[test]
    fn obtuse_corner_scores_below_one() {
        let apex = [0.0, 0.1, 0.0];
        let q = corner_quality(apex, [-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        assert!(q < 0.2);
        let right = corner_quality([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert!((right - 1.0).abs() < 1e-12);
    }
}
