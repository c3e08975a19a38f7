use rand::Rng;

use crate::{
    problem::{
        PRECISION, electric_vehicle_routing_problem::ElectricVehicleRoutingProblem,
        node::NodeIdx,
    },
    solver::{
        eval::route_status::{Feasibility, evaluate},
        solution::route::Route,
        station::{
            improvement::sequential_station_improvement,
            parallel_insertion::ParallelStationInsertion,
            sequential_insertion::sequential_station_insertion,
        },
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct ElectrifiedRoute {
    pub nodes: Vec<NodeIdx>,
    pub cost: f64,
}

/// Turns customer sequences into battery feasible routes.
#[derive(Debug, Default)]
pub struct RouteElectrifier {
    parallel_insertion: Option<ParallelStationInsertion>,
}

impl RouteElectrifier {
    pub fn new(parallel_insertion: bool) -> Self {
        RouteElectrifier {
            parallel_insertion: parallel_insertion.then(ParallelStationInsertion::new),
        }
    }

    /// Electrified version of `customers` (a depot anchored, station free sequence).
    ///
    /// A sequence that is already feasible is returned as is. A pure battery violation is
    /// repaired by the micro-GA (when enabled) and by greedy insertion followed by the
    /// improvement pass, keeping the cheaper of the two. Anything else is `None`.
    pub fn electrify<R>(
        &mut self,
        problem: &ElectricVehicleRoutingProblem,
        customers: &[NodeIdx],
        rng: &mut R,
    ) -> Option<ElectrifiedRoute>
    where
        R: Rng,
    {
        let evaluation = evaluate(problem, customers);

        match evaluation.feasibility {
            Feasibility::Feasible => {
                return Some(ElectrifiedRoute {
                    nodes: customers.to_vec(),
                    cost: evaluation.cost,
                });
            }
            Feasibility::BatteryViolated { .. } => {}
            _ => return None,
        }

        let evolved = self
            .parallel_insertion
            .as_mut()
            .and_then(|insertion| insertion.run(problem, customers, rng))
            .map(|(nodes, cost)| ElectrifiedRoute { nodes, cost });

        let greedy = sequential_station_insertion(problem, customers, rng).map(|repair| {
            let mut nodes = repair.nodes;
            let mut cost = repair.cost;
            sequential_station_improvement(problem, &mut nodes, &mut cost, rng);
            ElectrifiedRoute { nodes, cost }
        });

        match (evolved, greedy) {
            (Some(evolved), Some(greedy)) => {
                if greedy.cost - evolved.cost < -PRECISION {
                    Some(greedy)
                } else {
                    Some(evolved)
                }
            }
            (evolved, greedy) => evolved.or(greedy),
        }
    }

    /// Electrifies `route` from its customer sequence. The route is left untouched on failure.
    pub fn electrify_route<R>(
        &mut self,
        problem: &ElectricVehicleRoutingProblem,
        route: &mut Route,
        rng: &mut R,
    ) -> bool
    where
        R: Rng,
    {
        match self.electrify(problem, route.customers(), rng) {
            Some(ElectrifiedRoute { nodes, cost }) => {
                route.set_nodes(problem, nodes, cost);
                true
            }
            None => false,
        }
    }
}
