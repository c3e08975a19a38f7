use fixedbitset::FixedBitSet;

use crate::problem::{
    PRECISION,
    node::{Node, NodeIdx},
    travel_matrices::TravelMatrices,
    vehicle::Vehicle,
};

/// Arcs that can appear in a feasible route. Used to prune move enumeration.
#[derive(Debug, Clone)]
pub struct PromiseMatrix {
    arcs: FixedBitSet,
    num_nodes: usize,
}

impl PromiseMatrix {
    pub fn new(
        nodes: &[Node],
        depot: NodeIdx,
        matrices: &TravelMatrices,
        vehicle: &Vehicle,
    ) -> Self {
        let num_nodes = nodes.len();
        let mut arcs = FixedBitSet::with_capacity(num_nodes * num_nodes);
        let horizon_start = nodes[depot].time_window().start();

        for (i, from) in nodes.iter().enumerate() {
            let from_idx = NodeIdx::new(i);
            let earliest_departure = from
                .time_window()
                .start()
                .max(horizon_start + matrices.time(depot, from_idx))
                + from.service_time();

            for (j, to) in nodes.iter().enumerate() {
                let to_idx = NodeIdx::new(j);
                // arcs touching the depot are always promising, depot to depot included
                let promising = if from.is_depot() || to.is_depot() {
                    true
                } else if i == j {
                    false
                } else {
                    let arrival = earliest_departure + matrices.time(from_idx, to_idx);
                    arrival - to.time_window().end() <= PRECISION
                        && from.delivery() + to.delivery() - vehicle.capacity() <= PRECISION
                        && from.pickup() + to.pickup() - vehicle.capacity() <= PRECISION
                };

                arcs.set(i * num_nodes + j, promising);
            }
        }

        PromiseMatrix { arcs, num_nodes }
    }

    #[inline]
    pub fn is_promising(&self, from: NodeIdx, to: NodeIdx) -> bool {
        self.arcs.contains(from.get() * self.num_nodes + to.get())
    }
}
