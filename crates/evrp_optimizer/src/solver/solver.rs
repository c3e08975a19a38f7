use rand::{SeedableRng, rngs::SmallRng};
use tracing::{info, instrument, warn};

use crate::{
    error::SolverError,
    problem::electric_vehicle_routing_problem::ElectricVehicleRoutingProblem,
    solver::{
        cdns::CrossDomainSearch,
        recreate::{
            recreate_context::RecreateContext, recreate_solution::RecreateSolution,
            recreate_strategy::RecreateStrategy,
        },
        solution::solution::Solution,
        solver_params::SolverParams,
        station::electrify::RouteElectrifier,
    },
};

pub struct Solver {
    problem: ElectricVehicleRoutingProblem,
    params: SolverParams,
}

impl Solver {
    pub fn new(problem: ElectricVehicleRoutingProblem, params: SolverParams) -> Self {
        Solver { problem, params }
    }

    pub fn problem(&self) -> &ElectricVehicleRoutingProblem {
        &self.problem
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    /// Builds a solution with regret insertion and improves it with the cross-domain search.
    /// Runs with the same seed give the same solution.
    #[instrument(skip_all, level = "debug")]
    pub fn solve(&self) -> Result<Solution, SolverError> {
        self.params.validate()?;

        let mut rng = SmallRng::seed_from_u64(self.params.seed);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.params.local_search.threads.number_of_threads())
            .build()?;

        let mut electrifier = RouteElectrifier::new(self.params.station.parallel_insertion);
        let mut solution = Solution::new();
        RecreateStrategy::Regret.recreate_solution(
            &mut solution,
            RecreateContext {
                problem: &self.problem,
                rng: &mut rng,
                electrifier: &mut electrifier,
            },
        )?;

        info!(
            "Initial solution: {} routes, cost {}",
            solution.len(),
            solution.cost()
        );

        CrossDomainSearch::new(&self.problem, &self.params, &pool).run(&mut solution, &mut rng)?;

        solution.verify(&self.problem)?;

        if let Some(max_vehicles) = self.problem.vehicle().max_vehicles()
            && solution.len() > max_vehicles
        {
            warn!(
                "Solution uses {} vehicles, {} are available",
                solution.len(),
                max_vehicles
            );
        }

        info!(
            "Final solution: {} routes, cost {}",
            solution.len(),
            solution.cost()
        );

        Ok(solution)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        solver::{solution::route_id::RouteIdx, solver_params::Threads},
        test_utils::{
            TEST_DISPATCH_COST, create_scenario_problem, create_test_problem, create_test_vehicle,
            customer_at, depot_at, ids, station_at,
        },
    };

    use super::*;

    fn params() -> SolverParams {
        let mut params = SolverParams::default();
        params.local_search.threads = Threads::Single;
        params
    }

    #[test]
    fn test_scenario_without_charging() {
        let solver = Solver::new(create_scenario_problem(40.0), params());

        let solution = solver.solve().unwrap();

        // either direction of the same tour
        assert_eq!(solution.len(), 1);
        let nodes = solution.route(RouteIdx::new(0)).nodes();
        assert!(nodes == ids(&[0, 1, 2, 0]) || nodes == ids(&[0, 2, 1, 0]));
        assert_eq!(solution.cost(), TEST_DISPATCH_COST + 40.0);
    }

    #[test]
    fn test_scenario_with_charging() {
        let solver = Solver::new(create_scenario_problem(25.0), params());

        let solution = solver.solve().unwrap();

        assert_eq!(solution.len(), 1);
        let route = solution.route(RouteIdx::new(0));
        assert_eq!(route.len(), 2);
        assert_eq!(route.nodes().len(), 5);
        assert!(route.nodes().contains(&ids(&[3])[0]));
        assert_eq!(solution.cost(), TEST_DISPATCH_COST + 40.0);
    }

    #[test]
    fn test_invalid_params() {
        let mut params = params();
        params.local_search.or_opt_len = 0;

        let result = Solver::new(create_scenario_problem(40.0), params).solve();

        assert!(matches!(result, Err(SolverError::InvalidParams(_))));
    }

    #[test]
    fn test_solves_grid_instance() {
        let mut nodes = vec![depot_at(0.0, 0.0)];
        for (x, y) in [
            (10.0, 10.0),
            (-10.0, 10.0),
            (20.0, -5.0),
            (-15.0, -15.0),
            (30.0, 20.0),
            (-25.0, 5.0),
            (5.0, -30.0),
            (25.0, -25.0),
        ] {
            nodes.push(customer_at(x, y));
        }
        for (x, y) in [(20.0, 10.0), (-20.0, -5.0), (10.0, -20.0)] {
            nodes.push(station_at(x, y));
        }
        let problem = create_test_problem(nodes, create_test_vehicle(4.0, 80.0));

        let mut params = params();
        params.local_search.two_opt = true;
        params.local_search.or_opt = true;
        params.local_search.two_exchange = true;
        params.station.parallel_insertion = true;
        params.perturbation.escape_local_optima = 2;

        let solver = Solver::new(problem, params);
        let first = solver.solve().unwrap();
        let second = solver.solve().unwrap();

        assert!(first.verify(solver.problem()).is_ok());
        assert_eq!(first.cost(), second.cost());
        assert!(first.len() >= 2);
    }
}
