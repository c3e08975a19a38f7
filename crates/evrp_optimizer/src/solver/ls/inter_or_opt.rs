use smallvec::smallvec;

use crate::{
    problem::electric_vehicle_routing_problem::ElectricVehicleRoutingProblem,
    solver::{
        ls::r#move::{LocalSearchOperator, Move, MoveKind, RouteTarget, Segment},
        solution::{route_id::RouteIdx, solution::Solution},
        solver_params::LocalSearchParams,
    },
};

/// **Inter-Route Or-Opt**
///
/// Moves a chain of at most `or_opt_len` customers from one route into another, in both
/// directions of the pair.
///
/// ```text
/// BEFORE:
///    R1: ... (A) -> [start -> ... -> end] -> (B) ...
///    R2: ... (X) -> (Y) ...
///
/// AFTER:
///    R1: ... (A) -> (B) ...
///    R2: ... (X) -> [start -> ... -> end] -> (Y) ...
/// ```
#[derive(Debug)]
pub struct InterOrOptOperator;

impl InterOrOptOperator {
    fn generate_directed<C>(
        problem: &ElectricVehicleRoutingProblem,
        solution: &Solution,
        (from, to): (RouteIdx, RouteIdx),
        params: &LocalSearchParams,
        consumer: &mut C,
    ) where
        C: FnMut(Move),
    {
        let source = solution.route(from).customers();
        let target = solution.route(to).customers();
        let (len1, len2) = (source.len(), target.len());

        if len1 < 3 {
            return;
        }

        for start in 1..=len1 - 2 {
            for segment_length in 1..=params.or_opt_len {
                let end = start + segment_length - 1;
                if end >= len1 - 1 {
                    break;
                }

                if !problem.is_promising(source[start - 1], source[end + 1]) {
                    continue;
                }

                for pos in 1..len2 {
                    if !problem.is_promising(target[pos - 1], source[start])
                        || !problem.is_promising(source[end], target[pos])
                    {
                        continue;
                    }

                    consumer(Move::inter_route(
                        MoveKind::InterOrOpt,
                        from,
                        RouteTarget::Existing(to),
                        smallvec![
                            Segment::new(from, 0, start - 1),
                            Segment::new(from, end + 1, len1 - 1),
                        ],
                        smallvec![
                            Segment::new(to, 0, pos - 1),
                            Segment::new(from, start, end),
                            Segment::new(to, pos, len2 - 1),
                        ],
                    ));
                }
            }
        }
    }
}

impl LocalSearchOperator for InterOrOptOperator {
    const KIND: MoveKind = MoveKind::InterOrOpt;

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

        Self::generate_directed(problem, solution, (r1, r2), params, &mut consumer);
        Self::generate_directed(problem, solution, (r2, r1), params, &mut consumer);
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{TestRoute, create_line_problem, create_test_solution, ids};

    use super::*;

    #[test]
    fn test_moves_chains_both_ways() {
        let problem = create_line_problem(3, &[], 200.0);
        let solution = create_test_solution(
            &problem,
            vec![
                TestRoute {
                    nodes: vec![0, 1, 2, 0],
                },
                TestRoute {
                    nodes: vec![0, 3, 0],
                },
            ],
        );
        let (r1, r2) = (RouteIdx::new(0), RouteIdx::new(1));
        let params = LocalSearchParams {
            or_opt_len: 2,
            ..LocalSearchParams::default()
        };

        let mut moves = Vec::new();
        InterOrOptOperator::generate_moves(&problem, &solution, (r1, r2), &params, |mv| {
            let first = mv.first;
            moves.push((first, mv.build_sequences(&problem, &solution)))
        });

        assert!(moves.contains(&(r1, (ids(&[0, 1, 0]), Some(ids(&[0, 2, 3, 0]))))));
        assert!(moves.contains(&(r1, (ids(&[0, 0]), Some(ids(&[0, 3, 1, 2, 0]))))));
        assert!(moves.contains(&(r2, (ids(&[0, 0]), Some(ids(&[0, 1, 2, 3, 0]))))));
        assert!(moves.iter().all(|(first, _)| *first == r1 || *first == r2));
    }
}
