use geo::{Distance, Euclidean};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Location {
    point: geo::Point,
}

impl Location {
    pub fn from_cartesian(x: f64, y: f64) -> Self {
        Self {
            point: geo::Point::new(x, y),
        }
    }

    pub fn x(&self) -> f64 {
        self.point.x()
    }

    pub fn y(&self) -> f64 {
        self.point.y()
    }

    pub fn euclidean_distance(&self, to: &Location) -> f64 {
        Euclidean.distance(&self.point, &to.point)
    }
}

impl From<&Location> for geo::Point<f64> {
    fn from(location: &Location) -> Self {
        location.point
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance() {
        let a = Location::from_cartesian(0.0, 0.0);
        let b = Location::from_cartesian(3.0, 4.0);

        assert_eq!(a.euclidean_distance(&b), 5.0);
        assert_eq!(b.euclidean_distance(&a), 5.0);
    }
}
