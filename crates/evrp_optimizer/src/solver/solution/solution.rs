use crate::{
    error::VerificationError,
    problem::{
        PRECISION, electric_vehicle_routing_problem::ElectricVehicleRoutingProblem,
        node::NodeIdx,
    },
    solver::{
        eval::route_status::evaluate,
        solution::{route::Route, route_id::RouteIdx},
    },
    utils::enumerate_idx::EnumerateIdx,
};

#[derive(Debug, Clone, Default)]
pub struct Solution {
    routes: Vec<Route>,
    cost: f64,
}

impl Solution {
    pub fn new() -> Self {
        Solution {
            routes: Vec::new(),
            cost: 0.0,
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route(&self, index: RouteIdx) -> &Route {
        &self.routes[index]
    }

    pub fn route_mut(&mut self, index: RouteIdx) -> &mut Route {
        &mut self.routes[index]
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn push(&mut self, route: Route) -> RouteIdx {
        self.routes.push(route);
        RouteIdx::new(self.routes.len() - 1)
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Recomputes the cost from the routes' cached costs.
    pub fn compute_cost(&mut self) -> f64 {
        self.cost = self.routes.iter().map(|route| route.total_cost()).sum();
        self.cost
    }

    /// Drops routes without customers. Returns, for every previous index, its new index.
    pub fn remove_empty_routes(&mut self) -> Vec<Option<RouteIdx>> {
        let mut mapping = Vec::with_capacity(self.routes.len());
        let mut next = 0;
        for route in &self.routes {
            if route.is_empty() {
                mapping.push(None);
            } else {
                mapping.push(Some(RouteIdx::new(next)));
                next += 1;
            }
        }

        self.routes.retain(|route| !route.is_empty());
        mapping
    }

    /// Customers not served by any route.
    pub fn unassigned_customers(&self, problem: &ElectricVehicleRoutingProblem) -> Vec<NodeIdx> {
        let mut served = vec![false; problem.num_nodes()];
        for route in &self.routes {
            for &node in route.customers() {
                served[node.get()] = true;
            }
        }

        problem
            .customers()
            .iter()
            .copied()
            .filter(|customer| !served[customer.get()])
            .collect()
    }

    /// Every customer served exactly once, every route feasible with a matching cached cost.
    pub fn verify(
        &self,
        problem: &ElectricVehicleRoutingProblem,
    ) -> Result<(), VerificationError> {
        let mut visits = vec![0usize; problem.num_nodes()];

        for (route, stored) in self.routes.iter().enumerate_idx() {
            let route: RouteIdx = route;
            for &node in stored.nodes() {
                visits[node.get()] += 1;
            }

            let evaluation = evaluate(problem, stored.nodes());
            if !evaluation.is_feasible() {
                return Err(VerificationError::InfeasibleRoute {
                    route,
                    feasibility: evaluation.feasibility,
                });
            }

            if (evaluation.cost - stored.total_cost()).abs() > PRECISION {
                return Err(VerificationError::StaleRouteCost {
                    route,
                    cached: stored.total_cost(),
                    actual: evaluation.cost,
                });
            }
        }

        for &customer in problem.customers() {
            if visits[customer.get()] != 1 {
                return Err(VerificationError::CustomerVisits {
                    customer,
                    visits: visits[customer.get()],
                });
            }
        }

        Ok(())
    }
}
