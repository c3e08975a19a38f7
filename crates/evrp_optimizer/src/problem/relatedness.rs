use crate::problem::{
    node::{Node, NodeIdx},
    travel_matrices::TravelMatrices,
};

/// Pairwise dissimilarity between customers: `dist(i, j) + alpha * |start_i - start_j|`.
/// Lower values mean more related customers.
#[derive(Debug, Clone)]
pub struct Relatedness {
    values: Vec<f64>,
    ranks: Vec<Vec<NodeIdx>>,
    num_nodes: usize,
}

impl Relatedness {
    pub fn new(nodes: &[Node], matrices: &TravelMatrices, alpha: f64) -> Self {
        let num_nodes = nodes.len();
        let mut values = vec![f64::INFINITY; num_nodes * num_nodes];

        let customers: Vec<NodeIdx> = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_customer())
            .map(|(i, _)| NodeIdx::new(i))
            .collect();

        for &i in &customers {
            for &j in &customers {
                let start_gap =
                    (nodes[i].time_window().start() - nodes[j].time_window().start()).abs();
                values[i.get() * num_nodes + j.get()] = matrices.distance(i, j) + alpha * start_gap;
            }
        }

        let mut ranks = vec![Vec::new(); num_nodes];
        for &i in &customers {
            let mut rank: Vec<NodeIdx> = customers.iter().copied().filter(|&j| j != i).collect();
            rank.sort_by(|&a, &b| {
                values[i.get() * num_nodes + a.get()]
                    .total_cmp(&values[i.get() * num_nodes + b.get()])
                    .then(a.cmp(&b))
            });
            ranks[i.get()] = rank;
        }

        Relatedness {
            values,
            ranks,
            num_nodes,
        }
    }

    #[inline]
    pub fn value(&self, from: NodeIdx, to: NodeIdx) -> f64 {
        self.values[from.get() * self.num_nodes + to.get()]
    }

    /// Other customers ordered from most to least related.
    pub fn ranked(&self, customer: NodeIdx) -> &[NodeIdx] {
        &self.ranks[customer.get()]
    }
}
