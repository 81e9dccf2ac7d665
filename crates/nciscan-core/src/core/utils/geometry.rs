use nalgebra::{Point3, Vector3};

const DEGENERACY_EPSILON: f64 = 1e-12;

pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a - b).norm()
}

pub fn vector_between(from: &Point3<f64>, to: &Point3<f64>) -> Vector3<f64> {
    to - from
}

/// Angle between two vectors in degrees, in `[0, 180]`.
///
/// Returns `None` when either vector has (numerically) zero length, since the
/// angle is undefined there.
pub fn angle_between(v1: &Vector3<f64>, v2: &Vector3<f64>) -> Option<f64> {
    let magnitude = v1.norm() * v2.norm();
    if magnitude < DEGENERACY_EPSILON {
        return None;
    }
    let cosine = (v1.dot(v2) / magnitude).clamp(-1.0, 1.0);
    Some(cosine.acos().to_degrees())
}

/// Angle `a-vertex-b` in degrees.
pub fn angle_at(a: &Point3<f64>, vertex: &Point3<f64>, b: &Point3<f64>) -> Option<f64> {
    angle_between(&(a - vertex), &(b - vertex))
}

/// Normal of the plane through three points, `(a - v) x (b - v)`. Not normalized.
pub fn normal(a: &Point3<f64>, v: &Point3<f64>, b: &Point3<f64>) -> Vector3<f64> {
    (a - v).cross(&(b - v))
}

fn unit_normal(a: &Point3<f64>, v: &Point3<f64>, b: &Point3<f64>) -> Option<Vector3<f64>> {
    let n = normal(a, v, b);
    let norm = n.norm();
    (norm >= DEGENERACY_EPSILON).then(|| n / norm)
}

/// Foot of the perpendicular dropped from `p` onto the plane through `a`, `v`, `b`.
///
/// Returns `None` for collinear plane points.
pub fn project_onto_plane(
    a: &Point3<f64>,
    v: &Point3<f64>,
    b: &Point3<f64>,
    p: &Point3<f64>,
) -> Option<Point3<f64>> {
    let n = unit_normal(a, v, b)?;
    Some(p + n * n.dot(&(a - p)))
}

/// Foot of the perpendicular dropped from `p` onto the line through `anchor` along `direction`.
pub fn project_onto_line(
    direction: &Vector3<f64>,
    anchor: &Point3<f64>,
    p: &Point3<f64>,
) -> Option<Point3<f64>> {
    let norm = direction.norm();
    if norm < DEGENERACY_EPSILON {
        return None;
    }
    let unit = direction / norm;
    Some(anchor + unit * unit.dot(&(p - anchor)))
}

/// Angle between the normals of the planes `(a, b, c)` and `(b, c, d)`, in `[0, 180]`.
pub fn dihedral(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> Option<f64> {
    angle_between(&normal(a, b, c), &normal(b, c, d))
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

pub fn midpoint(a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    Point3::from((a.coords + b.coords) / 2.0)
}
