use crate::problem::{location::Location, node::NodeIdx};

pub type Distance = f64;
pub type Time = f64;

/// Flat row-major distance and time matrices.
/// The entry for a pair of nodes is stored at `from * num_nodes + to`.
#[derive(Debug, Clone)]
pub struct TravelMatrices {
    distances: Vec<Distance>,
    times: Vec<Time>,
    num_nodes: usize,
    is_symmetric: bool,
}

fn is_flat_matrix_symmetric(matrix: &[f64], num_nodes: usize) -> bool {
    for i in 0..num_nodes {
        for j in 0..num_nodes {
            if matrix[i * num_nodes + j] != matrix[j * num_nodes + i] {
                return false;
            }
        }
    }
    true
}

impl TravelMatrices {
    pub fn new(distances: Vec<Vec<Distance>>, times: Vec<Vec<Time>>) -> Self {
        let num_nodes = distances.len();
        let distances: Vec<Distance> = distances.into_iter().flatten().collect();
        let times: Vec<Time> = times.into_iter().flatten().collect();
        let is_symmetric = distances.len() == num_nodes * num_nodes
            && is_flat_matrix_symmetric(&distances, num_nodes);

        TravelMatrices {
            distances,
            times,
            num_nodes,
            is_symmetric,
        }
    }

    /// Straight-line distances, travel time is `distance / speed`.
    pub fn from_euclidean(locations: &[Location], speed: f64) -> Self {
        let num_nodes = locations.len();
        let mut distances: Vec<Distance> = vec![0.0; num_nodes * num_nodes];
        let mut times: Vec<Time> = vec![0.0; num_nodes * num_nodes];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                let distance = from.euclidean_distance(to);
                distances[i * num_nodes + j] = distance;
                times[i * num_nodes + j] = distance / speed;
            }
        }

        TravelMatrices {
            distances,
            times,
            num_nodes,
            is_symmetric: true,
        }
    }

    #[inline(always)]
    fn index(&self, from: NodeIdx, to: NodeIdx) -> usize {
        from.get() * self.num_nodes + to.get()
    }

    #[inline(always)]
    pub fn distance(&self, from: NodeIdx, to: NodeIdx) -> Distance {
        self.distances[self.index(from, to)]
    }

    #[inline(always)]
    pub fn time(&self, from: NodeIdx, to: NodeIdx) -> Time {
        self.times[self.index(from, to)]
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn is_consistent(&self) -> bool {
        self.distances.len() == self.num_nodes * self.num_nodes
            && self.times.len() == self.num_nodes * self.num_nodes
    }

    pub fn is_symmetric(&self) -> bool {
        self.is_symmetric
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_euclidean() {
        let locations = vec![
            Location::from_cartesian(0.0, 0.0),
            Location::from_cartesian(3.0, 4.0),
            Location::from_cartesian(6.0, 8.0),
        ];

        let matrices = TravelMatrices::from_euclidean(&locations, 2.0);

        assert_eq!(matrices.num_nodes(), 3);
        assert_eq!(matrices.distance(NodeIdx::new(0), NodeIdx::new(2)), 10.0);
        assert_eq!(matrices.time(NodeIdx::new(0), NodeIdx::new(1)), 2.5);
        assert!(matrices.is_symmetric());
        assert!(matrices.is_consistent());
    }

    #[test]
    fn test_new_detects_asymmetry() {
        let matrices = TravelMatrices::new(
            vec![vec![0.0, 1.0], vec![2.0, 0.0]],
            vec![vec![0.0, 1.0], vec![2.0, 0.0]],
        );

        assert!(!matrices.is_symmetric());
        assert_eq!(matrices.distance(NodeIdx::new(1), NodeIdx::new(0)), 2.0);
    }
}
