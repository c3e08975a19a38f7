use smallvec::smallvec;

use crate::{
    problem::electric_vehicle_routing_problem::ElectricVehicleRoutingProblem,
    solver::{
        ls::r#move::{LocalSearchOperator, Move, MoveKind, RouteTarget, Segment},
        solution::{route_id::RouteIdx, solution::Solution},
        solver_params::LocalSearchParams,
    },
};

/// **Inter-Route 2-Opt\***
///
/// Cuts both routes and exchanges their tails.
///
/// ```text
/// BEFORE:
///    R1: (depot) -> ... -> (A) --x--> [B] -> ... -> (depot)
///    R2: (depot) -> ... -> (X) --x--> [Y] -> ... -> (depot)
///
/// AFTER:
///    R1: (depot) -> ... -> (A) -----> [Y] -> ... -> (depot)
///    R2: (depot) -> ... -> (X) -----> [B] -> ... -> (depot)
///
/// Edges Removed: (A->B), (X->Y)
/// Edges Added:   (A->Y), (X->B)
/// ```
#[derive(Debug)]
pub struct TwoOptStarOperator;

impl LocalSearchOperator for TwoOptStarOperator {
    const KIND: MoveKind = MoveKind::TwoOptStar;

    fn generate_moves<C>(
        problem: &ElectricVehicleRoutingProblem,
        solution: &Solution,
        (r1, r2): (RouteIdx, RouteIdx),
        _params: &LocalSearchParams,
        mut consumer: C,
    ) where
        C: FnMut(Move),
    {
        if r1 == r2 {
            return;
        }

        let first = solution.route(r1).customers();
        let second = solution.route(r2).customers();
        let (len1, len2) = (first.len(), second.len());

        for pos1 in 1..len1 {
            for pos2 in 1..len2 {
                // exchanging everything or nothing leaves the routes as they are
                if (pos1 == 1 && pos2 == 1) || (pos1 == len1 - 1 && pos2 == len2 - 1) {
                    continue;
                }

                if !problem.is_promising(first[pos1 - 1], second[pos2])
                    || !problem.is_promising(second[pos2 - 1], first[pos1])
                {
                    continue;
                }

                consumer(Move::inter_route(
                    Self::KIND,
                    r1,
                    RouteTarget::Existing(r2),
                    smallvec![Segment::new(r1, 0, pos1 - 1), Segment::new(r2, pos2, len2 - 1)],
                    smallvec![Segment::new(r2, 0, pos2 - 1), Segment::new(r1, pos1, len1 - 1)],
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{TestRoute, create_line_problem, create_test_solution, ids};

    use super::*;

    #[test]
    fn test_exchanges_tails() {
        let problem = create_line_problem(4, &[], 200.0);
        let solution = create_test_solution(
            &problem,
            vec![
                TestRoute {
                    nodes: vec![0, 1, 2, 0],
                },
                TestRoute {
                    nodes: vec![0, 3, 4, 0],
                },
            ],
        );
        let (r1, r2) = (RouteIdx::new(0), RouteIdx::new(1));

        let mut sequences = Vec::new();
        TwoOptStarOperator::generate_moves(
            &problem,
            &solution,
            (r1, r2),
            &LocalSearchParams::default(),
            |mv| sequences.push(mv.build_sequences(&problem, &solution)),
        );

        // 3 x 3 cut pairs minus the two identities
        assert_eq!(sequences.len(), 7);
        assert!(sequences.contains(&(ids(&[0, 1, 4, 0]), Some(ids(&[0, 3, 2, 0])))));
        assert!(sequences.contains(&(ids(&[0, 1, 2, 3, 4, 0]), Some(ids(&[0, 0])))));
        assert!(!sequences.contains(&(ids(&[0, 3, 4, 0]), Some(ids(&[0, 1, 2, 0])))));
    }
}
