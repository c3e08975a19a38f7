use crate::problem::{node::NodeIdx, travel_matrices::TravelMatrices};

/// For every ordered pair of nodes, the stations closest to the detour `from -> station -> to`,
/// best first. Only the first `range` stations of each pair are kept.
#[derive(Debug, Clone)]
pub struct StationRanking {
    ranked: Vec<NodeIdx>,
    num_nodes: usize,
    range: usize,
}

impl StationRanking {
    pub fn new(stations: &[NodeIdx], matrices: &TravelMatrices, range: usize) -> Self {
        let num_nodes = matrices.num_nodes();
        let range = range.clamp(1, stations.len().max(1)).min(stations.len());
        let mut ranked = Vec::with_capacity(num_nodes * num_nodes * range);
        let mut candidates = stations.to_vec();

        for from in 0..num_nodes {
            for to in 0..num_nodes {
                let (from, to) = (NodeIdx::new(from), NodeIdx::new(to));
                candidates.sort_by(|&a, &b| {
                    let da = matrices.distance(from, a) + matrices.distance(a, to);
                    let db = matrices.distance(from, b) + matrices.distance(b, to);
                    da.total_cmp(&db).then(a.cmp(&b))
                });
                ranked.extend_from_slice(&candidates[..range]);
            }
        }

        StationRanking {
            ranked,
            num_nodes,
            range,
        }
    }

    /// Candidate stations between `from` and `to`, best first.
    #[inline]
    pub fn stations(&self, from: NodeIdx, to: NodeIdx) -> &[NodeIdx] {
        let start = (from.get() * self.num_nodes + to.get()) * self.range;
        &self.ranked[start..start + self.range]
    }

    pub fn best(&self, from: NodeIdx, to: NodeIdx) -> Option<NodeIdx> {
        self.stations(from, to).first().copied()
    }

    pub fn range(&self) -> usize {
        self.range
    }
}
