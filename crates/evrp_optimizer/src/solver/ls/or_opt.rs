use smallvec::smallvec;

use crate::{
    problem::electric_vehicle_routing_problem::ElectricVehicleRoutingProblem,
    solver::{
        ls::r#move::{LocalSearchOperator, Move, MoveKind, RouteTarget, Segment},
        solution::{route_id::RouteIdx, solution::Solution},
        solver_params::LocalSearchParams,
    },
};

/// **Intra-Route Or-Opt**
///
/// Moves a chain of at most `or_opt_len` customers to another position of the same
/// route, or detaches it into a route of its own.
///
/// ```text
/// BEFORE:
///    ... (A) -> [start -> ... -> end] -> (B) ... (X) -> (Y) ...
///
/// AFTER:
///    ... (A) -> (B) ... (X) -> [start -> ... -> end] -> (Y) ...
///
/// OR:
///    ... (A) -> (B) ... (X) -> (Y) ...
///    (depot) -> [start -> ... -> end] -> (depot)
/// ```
#[derive(Debug)]
pub struct OrOptOperator;

impl LocalSearchOperator for OrOptOperator {
    const KIND: MoveKind = MoveKind::OrOpt;

    fn generate_moves<C>(
        problem: &ElectricVehicleRoutingProblem,
        solution: &Solution,
        (r1, r2): (RouteIdx, RouteIdx),
        params: &LocalSearchParams,
        mut consumer: C,
    ) where
        C: FnMut(Move),
    {
        if r1 != r2 {
            return;
        }

        let r = r1;
        let customers = solution.route(r).customers();
        let len = customers.len();

        if len < 3 {
            return;
        }

        for start in 1..=len - 2 {
            for segment_length in 1..=params.or_opt_len {
                let end = start + segment_length - 1;
                if end >= len - 1 {
                    break;
                }

                if !problem.is_promising(customers[start - 1], customers[end + 1]) {
                    continue;
                }

                for pos in 1..start {
                    consumer(Move::intra_route(
                        Self::KIND,
                        r,
                        smallvec![
                            Segment::new(r, 0, pos - 1),
                            Segment::new(r, start, end),
                            Segment::new(r, pos, start - 1),
                            Segment::new(r, end + 1, len - 1),
                        ],
                    ));
                }

                for pos in end + 2..len {
                    consumer(Move::intra_route(
                        Self::KIND,
                        r,
                        smallvec![
                            Segment::new(r, 0, start - 1),
                            Segment::new(r, end + 1, pos - 1),
                            Segment::new(r, start, end),
                            Segment::new(r, pos, len - 1),
                        ],
                    ));
                }

                consumer(Move::inter_route(
                    Self::KIND,
                    r,
                    RouteTarget::New,
                    smallvec![Segment::new(r, 0, start - 1), Segment::new(r, end + 1, len - 1)],
                    smallvec![Segment::depot(), Segment::new(r, start, end), Segment::depot()],
                ));
            }
        }
    }
}
