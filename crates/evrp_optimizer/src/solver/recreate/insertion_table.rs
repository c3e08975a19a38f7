use rand::Rng;
use tracing::error;

use crate::{
    error::SolverError,
    problem::{
        PRECISION, electric_vehicle_routing_problem::ElectricVehicleRoutingProblem,
        node::NodeIdx,
    },
    solver::{
        eval::route_status::{Feasibility, evaluate_insertion},
        solution::{route::Route, route_id::RouteIdx, solution::Solution},
        station::{
            electrify::{ElectrifiedRoute, RouteElectrifier},
            sequential_insertion::sequential_station_insertion,
        },
    },
    utils::enumerate_idx::EnumerateIdx,
};

/// Cheapest feasible way to put a customer into an existing route.
#[derive(Debug, Clone)]
pub struct RouteInsertion {
    pub nodes: Vec<NodeIdx>,
    pub cost: f64,
    /// `cost` minus the current cost of the route.
    pub delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionTarget {
    Route(RouteIdx),
    NewRoute,
}

/// Insertion costs of the unassigned customers, one column per route of the solution.
///
/// Only the column of the route that received a customer is recomputed after an insertion.
pub struct InsertionTable {
    customers: Vec<NodeIdx>,
    new_routes: Vec<ElectrifiedRoute>,
    insertions: Vec<Vec<Option<RouteInsertion>>>,
}

impl InsertionTable {
    pub fn new<R>(
        problem: &ElectricVehicleRoutingProblem,
        solution: &Solution,
        customers: Vec<NodeIdx>,
        electrifier: &mut RouteElectrifier,
        rng: &mut R,
    ) -> Result<Self, SolverError>
    where
        R: Rng,
    {
        let depot = problem.depot();
        let mut new_routes = Vec::with_capacity(customers.len());
        let mut insertions = Vec::with_capacity(customers.len());

        for &customer in &customers {
            let Some(route) = electrifier.electrify(problem, &[depot, customer, depot], rng) else {
                error!("Customer {} cannot be served by a route of its own", customer);
                return Err(SolverError::InfeasibleSingleCustomerRoute(customer));
            };
            new_routes.push(route);

            insertions.push(
                solution
                    .routes()
                    .iter()
                    .map(|route| best_route_insertion(problem, route, customer, rng))
                    .collect(),
            );
        }

        Ok(InsertionTable {
            customers,
            new_routes,
            insertions,
        })
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    pub fn customer(&self, slot: usize) -> NodeIdx {
        self.customers[slot]
    }

    /// Cost of serving the customer of `slot` with a route of its own.
    pub fn new_route_cost(&self, slot: usize) -> f64 {
        self.new_routes[slot].cost
    }

    /// Feasible insertions of the customer of `slot` into existing routes.
    pub fn route_insertions(
        &self,
        slot: usize,
    ) -> impl Iterator<Item = (RouteIdx, &RouteInsertion)> + '_ {
        self.insertions[slot]
            .iter()
            .enumerate_idx()
            .filter_map(|(route, insertion): (RouteIdx, _)| {
                insertion.as_ref().map(|insertion| (route, insertion))
            })
    }

    /// Cheapest option for the customer of `slot`, existing routes first on ties.
    pub fn best_target(&self, slot: usize) -> (InsertionTarget, f64) {
        let mut best = (InsertionTarget::NewRoute, self.new_route_cost(slot));
        let mut best_route: Option<(RouteIdx, f64)> = None;

        for (route, insertion) in self.route_insertions(slot) {
            if best_route.is_none_or(|(_, delta)| insertion.delta - delta < -PRECISION) {
                best_route = Some((route, insertion.delta));
            }
        }

        if let Some((route, delta)) = best_route
            && delta - best.1 < PRECISION
        {
            best = (InsertionTarget::Route(route), delta);
        }

        best
    }

    /// Inserts the customer of `slot` and updates the table.
    pub fn insert<R>(
        &mut self,
        problem: &ElectricVehicleRoutingProblem,
        solution: &mut Solution,
        slot: usize,
        target: InsertionTarget,
        rng: &mut R,
    ) where
        R: Rng,
    {
        self.customers.swap_remove(slot);
        let new_route = self.new_routes.swap_remove(slot);
        let mut row = self.insertions.swap_remove(slot);

        let route = match target {
            InsertionTarget::NewRoute => {
                let mut route = Route::empty(problem);
                route.set_nodes(problem, new_route.nodes, new_route.cost);
                let route = solution.push(route);
                for row in self.insertions.iter_mut() {
                    row.push(None);
                }
                route
            }
            InsertionTarget::Route(route) => {
                if let Some(insertion) = row[route.get()].take() {
                    solution
                        .route_mut(route)
                        .set_nodes(problem, insertion.nodes, insertion.cost);
                }
                route
            }
        };

        for (customer, row) in self.customers.iter().zip(self.insertions.iter_mut()) {
            row[route.get()] = best_route_insertion(problem, solution.route(route), *customer, rng);
        }

        solution.compute_cost();
    }
}

/// Best position of `customer` in the electrified node list of `route`. A battery violation
/// caused by the insertion is repaired with sequential station insertion.
pub fn best_route_insertion<R>(
    problem: &ElectricVehicleRoutingProblem,
    route: &Route,
    customer: NodeIdx,
    rng: &mut R,
) -> Option<RouteInsertion>
where
    R: Rng,
{
    let nodes = route.nodes();
    let mut best: Option<(usize, f64, Option<Vec<NodeIdx>>)> = None;

    for position in 1..nodes.len() {
        let evaluation = evaluate_insertion(problem, nodes, customer, position);

        let candidate = match evaluation.feasibility {
            Feasibility::Feasible => Some((evaluation.cost, None)),
            Feasibility::BatteryViolated { .. } => {
                let mut inserted = nodes.to_vec();
                inserted.insert(position, customer);
                sequential_station_insertion(problem, &inserted, rng)
                    .map(|repair| (repair.cost, Some(repair.nodes)))
            }
            _ => None,
        };

        if let Some((cost, repaired)) = candidate
            && best
                .as_ref()
                .is_none_or(|(_, best_cost, _)| cost - best_cost < -PRECISION)
        {
            best = Some((position, cost, repaired));
        }
    }

    best.map(|(position, cost, repaired)| {
        let nodes = repaired.unwrap_or_else(|| {
            let mut inserted = nodes.to_vec();
            inserted.insert(position, customer);
            inserted
        });

        RouteInsertion {
            nodes,
            cost,
            delta: cost - route.total_cost(),
        }
    })
}
