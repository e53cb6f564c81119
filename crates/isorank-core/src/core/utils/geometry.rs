use nalgebra::{Point3, Vector3};

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / points.len() as f64))
}

/// Translates `points` so that their centroid sits at the origin.
pub fn recenter(points: &mut [Point3<f64>]) {
    if let Some(center) = centroid(points) {
        let shift = center.coords;
        for p in points.iter_mut() {
            *p -= shift;
        }
    }
}

/// Edge lengths of an orthogonal box enclosing `points` with `vacuum` added on each axis.
pub fn padded_box(points: &[Point3<f64>], vacuum: f64) -> Vector3<f64> {
    let Some(first) = points.first() else {
        return Vector3::repeat(vacuum);
    };
    let (min, max) = points
        .iter()
        .fold((first.coords, first.coords), |(min, max), p| {
            (min.inf(&p.coords), max.sup(&p.coords))
        });
    (max - min).add_scalar(vacuum)
}
