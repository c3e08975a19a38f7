use crate::{
    problem::{electric_vehicle_routing_problem::ElectricVehicleRoutingProblem, node::NodeIdx},
    solver::eval::route_status::evaluate,
};

/// A vehicle tour.
///
/// `nodes` is the full sequence driven by the vehicle, charging stations included.
/// `customers` is the same sequence without stations: local search rewrites it and
/// station insertion turns it back into `nodes`. Both always start and end at the depot.
#[derive(Debug, Clone)]
pub struct Route {
    nodes: Vec<NodeIdx>,
    customers: Vec<NodeIdx>,
    total_cost: f64,
}

impl Route {
    pub fn empty(problem: &ElectricVehicleRoutingProblem) -> Self {
        let depot = problem.depot();
        Route {
            nodes: vec![depot, depot],
            customers: vec![depot, depot],
            total_cost: 0.0,
        }
    }

    /// `total_cost` is `+inf` when `nodes` is infeasible.
    pub fn from_nodes(problem: &ElectricVehicleRoutingProblem, nodes: Vec<NodeIdx>) -> Self {
        let customers = strip_stations(problem, &nodes);
        let total_cost = evaluate(problem, &nodes).cost;

        Route {
            nodes,
            customers,
            total_cost,
        }
    }

    pub fn nodes(&self) -> &[NodeIdx] {
        &self.nodes
    }

    pub fn customers(&self) -> &[NodeIdx] {
        &self.customers
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Number of customers served.
    pub fn len(&self) -> usize {
        self.customers.len().saturating_sub(2)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_station(&self) -> bool {
        self.nodes.len() != self.customers.len()
    }

    /// Cost of the customer sequence alone, as if no charging was needed.
    pub fn customer_cost(&self, problem: &ElectricVehicleRoutingProblem) -> f64 {
        if self.is_empty() {
            return 0.0;
        }

        let distance: f64 = self
            .customers
            .windows(2)
            .map(|pair| problem.distance(pair[0], pair[1]))
            .sum();

        problem.vehicle().route_cost(distance)
    }

    /// Stores an electrified sequence and its cost, deriving the customer sequence from it.
    pub fn set_nodes(
        &mut self,
        problem: &ElectricVehicleRoutingProblem,
        nodes: Vec<NodeIdx>,
        total_cost: f64,
    ) {
        self.customers = strip_stations(problem, &nodes);
        self.nodes = nodes;
        self.total_cost = total_cost;
    }

    pub fn remove_customers(
        &mut self,
        problem: &ElectricVehicleRoutingProblem,
        removed: &[bool],
    ) -> Vec<NodeIdx> {
        let mut taken = Vec::new();
        self.nodes.retain(|&node| {
            if problem.is_customer(node) && removed[node.get()] {
                taken.push(node);
                false
            } else {
                true
            }
        });
        self.customers = strip_stations(problem, &self.nodes);
        self.total_cost = evaluate(problem, &self.nodes).cost;
        taken
    }
}

pub fn strip_stations(problem: &ElectricVehicleRoutingProblem, nodes: &[NodeIdx]) -> Vec<NodeIdx> {
    nodes
        .iter()
        .copied()
        .filter(|&node| !problem.is_station(node))
        .collect()
}
