use smallvec::smallvec;

use crate::{
    problem::electric_vehicle_routing_problem::ElectricVehicleRoutingProblem,
    solver::{
        ls::r#move::{LocalSearchOperator, Move, MoveKind, RouteTarget, Segment},
        solution::{route_id::RouteIdx, solution::Solution},
        solver_params::LocalSearchParams,
    },
};

/// **Inter-Route 2-Exchange**
///
/// Swaps a chain of at most `exchange_len` customers of one route with a chain of the
/// other route. The chains may have different lengths.
///
/// ```text
/// BEFORE:
///    R1: ... (A) -> [s1 ... e1] -> (B) ...
///    R2: ... (X) -> [s2 ... e2] -> (Y) ...
///
/// AFTER:
///    R1: ... (A) -> [s2 ... e2] -> (B) ...
///    R2: ... (X) -> [s1 ... e1] -> (Y) ...
///
/// Edges Removed: (A->s1), (e1->B), (X->s2), (e2->Y)
/// Edges Added:   (A->s2), (e2->B), (X->s1), (e1->Y)
/// ```
#[derive(Debug)]
pub struct TwoExchangeOperator;

impl LocalSearchOperator for TwoExchangeOperator {
    const KIND: MoveKind = MoveKind::TwoExchange;

    fn generate_moves<C>(
        problem: &ElectricVehicleRoutingProblem,
        solution: &Solution,
        (r1, r2): (RouteIdx, RouteIdx),
        params: &LocalSearchParams,
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

        if len1 < 3 || len2 < 3 {
            return;
        }

        for start1 in 1..=len1 - 2 {
            for length1 in 1..=params.exchange_len {
                let end1 = start1 + length1 - 1;
                if end1 >= len1 - 1 {
                    break;
                }

                for start2 in 1..=len2 - 2 {
                    if !problem.is_promising(first[start1 - 1], second[start2])
                        || !problem.is_promising(second[start2 - 1], first[start1])
                    {
                        continue;
                    }

                    for length2 in 1..=params.exchange_len {
                        let end2 = start2 + length2 - 1;
                        if end2 >= len2 - 1 {
                            break;
                        }

                        if !problem.is_promising(second[end2], first[end1 + 1])
                            || !problem.is_promising(first[end1], second[end2 + 1])
                        {
                            continue;
                        }

                        consumer(Move::inter_route(
                            Self::KIND,
                            r1,
                            RouteTarget::Existing(r2),
                            smallvec![
                                Segment::new(r1, 0, start1 - 1),
                                Segment::new(r2, start2, end2),
                                Segment::new(r1, end1 + 1, len1 - 1),
                            ],
                            smallvec![
                                Segment::new(r2, 0, start2 - 1),
                                Segment::new(r1, start1, end1),
                                Segment::new(r2, end2 + 1, len2 - 1),
                            ],
                        ));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{TestRoute, create_line_problem, create_test_solution, ids};

    use super::*;

    #[test]
    fn test_swaps_chains_of_different_lengths() {
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
        TwoExchangeOperator::generate_moves(
            &problem,
            &solution,
            (r1, r2),
            &LocalSearchParams::default(),
            |mv| sequences.push(mv.build_sequences(&problem, &solution)),
        );

        // chains per route: [1], [2], [1 2]; 3 x 3 pairs
        assert_eq!(sequences.len(), 9);
        assert!(sequences.contains(&(ids(&[0, 3, 2, 0]), Some(ids(&[0, 1, 4, 0])))));
        assert!(sequences.contains(&(ids(&[0, 1, 3, 4, 0]), Some(ids(&[0, 2, 0])))));
    }
}
