use smallvec::smallvec;

use crate::{
    problem::electric_vehicle_routing_problem::ElectricVehicleRoutingProblem,
    solver::{
        ls::r#move::{LocalSearchOperator, Move, MoveKind, Segment},
        solution::{route_id::RouteIdx, solution::Solution},
        solver_params::LocalSearchParams,
    },
};

/// **Intra-Route 2-Opt**
///
/// Swaps two consecutive customers `[a]` and `[b]`.
///
/// ```text
/// BEFORE:
///    ... (prev) --x--> [a] --x--> [b] --x--> (next) ...
///
/// AFTER:
///    ... (prev) -----> [b] -----> [a] -----> (next) ...
///
/// Edges Removed: (prev->a), (a->b), (b->next)
/// Edges Added:   (prev->b), (b->a), (a->next)
/// ```
#[derive(Debug)]
pub struct TwoOptOperator;

impl LocalSearchOperator for TwoOptOperator {
    const KIND: MoveKind = MoveKind::TwoOpt;

    fn generate_moves<C>(
        problem: &ElectricVehicleRoutingProblem,
        solution: &Solution,
        (r1, r2): (RouteIdx, RouteIdx),
        _params: &LocalSearchParams,
        mut consumer: C,
    ) where
        C: FnMut(Move),
    {
        if r1 != r2 {
            return;
        }

        let customers = solution.route(r1).customers();
        let len = customers.len();

        // at least two customers
        if len < 4 {
            return;
        }

        for start in 1..=len - 3 {
            if !problem.is_promising(customers[start - 1], customers[start + 1])
                || !problem.is_promising(customers[start + 1], customers[start])
                || !problem.is_promising(customers[start], customers[start + 2])
            {
                continue;
            }

            consumer(Move::intra_route(
                Self::KIND,
                r1,
                smallvec![
                    Segment::new(r1, 0, start - 1),
                    Segment::new(r1, start + 1, start),
                    Segment::new(r1, start + 2, len - 1),
                ],
            ));
        }
    }
}
