use rand::Rng;

use crate::{
    problem::electric_vehicle_routing_problem::ElectricVehicleRoutingProblem,
    solver::{
        solution::{route::Route, solution::Solution},
        station::electrify::RouteElectrifier,
    },
};

use super::ruin_context::RuinContext;

pub trait RuinSolution {
    fn ruin_solution<R>(&self, solution: &mut Solution, context: RuinContext<R>)
    where
        R: Rng;
}

/// Takes the flagged customers out of their routes, leaving stations in place.
///
/// A route that becomes infeasible is electrified again from its remaining customers; when
/// that fails the whole route is dissolved and its customers become unassigned too.
pub fn remove_customers<R>(
    problem: &ElectricVehicleRoutingProblem,
    solution: &mut Solution,
    removed: &[bool],
    electrifier: &mut RouteElectrifier,
    rng: &mut R,
) where
    R: Rng,
{
    for index in 0..solution.len() {
        let route = solution.route_mut(index.into());
        route.remove_customers(problem, removed);

        if route.total_cost().is_finite() || electrifier.electrify_route(problem, route, rng) {
            continue;
        }

        *route = Route::empty(problem);
    }

    solution.remove_empty_routes();
    solution.compute_cost();
}
