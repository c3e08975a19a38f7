use rand::Rng;

use crate::{
    problem::{PRECISION, electric_vehicle_routing_problem::ElectricVehicleRoutingProblem},
    solver::{
        eval::route_status::check_ignoring_battery,
        ls::r#move::{Move, RouteTarget},
        solution::{route::Route, solution::Solution},
        station::electrify::RouteElectrifier,
    },
};

/// Customer level cost of the targets of `mv` before the move.
fn customer_cost_before(
    problem: &ElectricVehicleRoutingProblem,
    solution: &Solution,
    mv: &Move,
) -> f64 {
    let mut cost = solution.route(mv.first).customer_cost(problem);
    if let Some(RouteTarget::Existing(second)) = mv.second {
        cost += solution.route(second).customer_cost(problem);
    }
    cost
}

fn total_cost_before(solution: &Solution, mv: &Move) -> f64 {
    let mut cost = solution.route(mv.first).total_cost();
    if let Some(RouteTarget::Existing(second)) = mv.second {
        cost += solution.route(second).total_cost();
    }
    cost
}

/// Sets `mv.delta_cost` to the change of customer level cost, ignoring the battery.
/// Moves producing a sequence that breaks capacity or time windows get `+inf`.
pub fn evaluate_move(problem: &ElectricVehicleRoutingProblem, solution: &Solution, mv: &mut Move) {
    let (first, second) = mv.build_sequences(problem, solution);

    let mut cost = 0.0;
    for nodes in std::iter::once(&first).chain(second.as_ref()) {
        let evaluation = check_ignoring_battery(problem, nodes);
        if !evaluation.is_feasible() {
            mv.delta_cost = f64::INFINITY;
            return;
        }
        cost += evaluation.cost;
    }

    mv.delta_cost = cost - customer_cost_before(problem, solution, mv);
}

/// Evaluates `mv` like [`evaluate_move`], then electrifies the targets of a customer level
/// improvement and keeps the move only when the electrified routes are cheaper than the
/// current ones. Accepted moves carry their electrified routes in `reconciled`.
pub fn evaluate_move_reconciled<R>(
    problem: &ElectricVehicleRoutingProblem,
    solution: &Solution,
    mv: &mut Move,
    electrifier: &mut RouteElectrifier,
    rng: &mut R,
) where
    R: Rng,
{
    evaluate_move(problem, solution, mv);
    if mv.delta_cost >= -PRECISION {
        return;
    }

    let (first, second) = mv.build_sequences(problem, solution);

    let mut routes = Vec::with_capacity(2);
    let mut cost = 0.0;
    for customers in std::iter::once(first).chain(second) {
        let mut route = Route::from_nodes(problem, customers);
        if !electrifier.electrify_route(problem, &mut route, rng) {
            mv.delta_cost = f64::INFINITY;
            return;
        }
        cost += route.total_cost();
        routes.push(route);
    }

    let delta = cost - total_cost_before(solution, mv);
    if delta > -PRECISION {
        mv.delta_cost = f64::INFINITY;
        return;
    }

    mv.delta_cost = delta;
    mv.reconciled = Some(routes);
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};
    use smallvec::smallvec;

    use crate::{
        problem::{location::Location, node::NodeBuilder},
        solver::{
            ls::r#move::{MoveKind, Segment},
            solution::route_id::RouteIdx,
        },
        test_utils::{
            TEST_DISPATCH_COST, TestRoute, create_line_problem, create_test_problem,
            create_test_solution, create_test_vehicle, customer_at, depot_at, ids,
        },
    };

    use super::*;

    fn swap_move(route: RouteIdx, start: usize, len: usize) -> Move {
        Move::intra_route(
            MoveKind::TwoOpt,
            route,
            smallvec![
                Segment::new(route, 0, start - 1),
                Segment::new(route, start + 1, start),
                Segment::new(route, start + 2, len - 1),
            ],
        )
    }

    #[test]
    fn test_customer_level_delta() {
        let problem = create_line_problem(3, &[], 200.0);
        let solution = create_test_solution(
            &problem,
            vec![TestRoute {
                nodes: vec![0, 2, 1, 3, 0],
            }],
        );

        let mut mv = swap_move(RouteIdx::new(0), 1, 5);
        evaluate_move(&problem, &solution, &mut mv);

        // 20 + 10 + 20 + 30 becomes 10 + 10 + 10 + 30
        assert_eq!(mv.delta_cost, -20.0);
        assert!(mv.reconciled.is_none());
    }

    #[test]
    fn test_rejects_time_window_violation() {
        let mut early = NodeBuilder::customer();
        early
            .set_location(Location::from_cartesian(10.0, 0.0))
            .set_time_window(0.0, 12.0);

        let problem = create_test_problem(
            vec![depot_at(0.0, 0.0), early.build(), customer_at(20.0, 0.0)],
            create_test_vehicle(100.0, 200.0),
        );
        let solution = create_test_solution(
            &problem,
            vec![TestRoute {
                nodes: vec![0, 1, 2, 0],
            }],
        );

        // [0, 2, 1, 0] reaches customer 1 at 30
        let mut mv = swap_move(RouteIdx::new(0), 1, 4);
        evaluate_move(&problem, &solution, &mut mv);

        assert_eq!(mv.delta_cost, f64::INFINITY);
    }

    #[test]
    fn test_reconciled_move_carries_routes() {
        // customers at 10, 20, 30 and a station at 15
        let problem = create_line_problem(3, &[(15.0, 0.0)], 45.0);
        let solution = create_test_solution(
            &problem,
            vec![TestRoute {
                nodes: vec![0, 2, 1, 4, 3, 0],
            }],
        );
        assert!(solution.verify(&problem).is_ok());
        assert_eq!(solution.cost(), TEST_DISPATCH_COST + 80.0);

        let mut mv = swap_move(RouteIdx::new(0), 1, 5);
        let mut electrifier = RouteElectrifier::new(false);
        let mut rng = SmallRng::seed_from_u64(0);
        evaluate_move_reconciled(&problem, &solution, &mut mv, &mut electrifier, &mut rng);

        let routes = mv.reconciled.as_ref().expect("move should be accepted");
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].customers(), &ids(&[0, 1, 2, 3, 0]));
        assert!(routes[0].contains_station());
        assert_eq!(routes[0].total_cost(), TEST_DISPATCH_COST + 60.0);
        assert_eq!(mv.delta_cost, -20.0);
    }

    #[test]
    fn test_non_improving_move_is_not_electrified() {
        let problem = create_line_problem(3, &[(15.0, 0.0)], 45.0);
        let solution = create_test_solution(
            &problem,
            vec![TestRoute {
                nodes: vec![0, 1, 2, 4, 3, 0],
            }],
        );

        let mut mv = swap_move(RouteIdx::new(0), 1, 5);
        let mut electrifier = RouteElectrifier::new(false);
        let mut rng = SmallRng::seed_from_u64(0);
        evaluate_move_reconciled(&problem, &solution, &mut mv, &mut electrifier, &mut rng);

        assert_eq!(mv.delta_cost, 20.0);
        assert!(mv.reconciled.is_none());
    }
}
