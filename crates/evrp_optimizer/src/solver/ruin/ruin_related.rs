use rand::Rng;

use crate::{problem::node::NodeIdx, solver::solution::solution::Solution};

use super::{
    ruin_context::RuinContext,
    ruin_solution::{RuinSolution, remove_customers},
};

/// Removes a cluster of related customers.
///
/// Starting from a random seed customer, a random already removed customer is picked as
/// reference and one of its two most related remaining customers is removed, the closer
/// one being favoured: `P(first) = rm(ref, second) / (rm(ref, first) + rm(ref, second))`.
pub struct RuinRelated;

impl RuinSolution for RuinRelated {
    fn ruin_solution<R>(&self, solution: &mut Solution, mut context: RuinContext<R>)
    where
        R: Rng,
    {
        let problem = context.problem;
        let customers = problem.customers();
        if customers.is_empty() {
            return;
        }

        let count = context.draw_removal_count(customers.len());
        let relatedness = problem.relatedness();

        let mut flags = vec![false; problem.num_nodes()];
        let seed = customers[context.rng.random_range(0..customers.len())];
        flags[seed.get()] = true;
        let mut removed: Vec<NodeIdx> = vec![seed];

        while removed.len() < count {
            let reference = removed[context.rng.random_range(0..removed.len())];

            let mut candidates = relatedness
                .ranked(reference)
                .iter()
                .copied()
                .filter(|customer| !flags[customer.get()]);

            let next = match (candidates.next(), candidates.next()) {
                (Some(first), Some(second)) => {
                    let to_first = relatedness.value(reference, first);
                    let to_second = relatedness.value(reference, second);
                    let total = to_first + to_second;
                    let p_first = if total > 0.0 { to_second / total } else { 0.5 };

                    if context.rng.random_bool(p_first) {
                        first
                    } else {
                        second
                    }
                }
                (Some(first), None) => first,
                _ => break,
            };

            flags[next.get()] = true;
            removed.push(next);
        }

        remove_customers(problem, solution, &flags, context.electrifier, context.rng);
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use crate::{
        solver::{solver_params::PerturbationParams, station::electrify::RouteElectrifier},
        test_utils::{TestRoute, create_line_problem, create_test_solution},
    };

    use super::*;

    #[test]
    fn test_removes_a_cluster() {
        // on a line the two most related customers of a removed one are always close to the
        // removed stretch
        let problem = create_line_problem(10, &[], 500.0);
        let initial = create_test_solution(
            &problem,
            vec![TestRoute {
                nodes: vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 0],
            }],
        );
        let params = PerturbationParams {
            removal_lower: 0.3,
            removal_upper: 0.3,
            ..PerturbationParams::default()
        };
        let mut electrifier = RouteElectrifier::new(false);

        for seed in 0..30 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut solution = initial.clone();

            RuinRelated.ruin_solution(
                &mut solution,
                RuinContext {
                    params: &params,
                    problem: &problem,
                    rng: &mut rng,
                    electrifier: &mut electrifier,
                },
            );

            let removed: Vec<usize> = solution
                .unassigned_customers(&problem)
                .iter()
                .map(|customer| customer.get())
                .collect();

            assert_eq!(removed.len(), 3);
            assert!(removed[2] - removed[0] <= 3, "removed {removed:?}");
            assert!(solution.verify(&problem).is_err());
        }
    }

    #[test]
    fn test_stops_when_everything_is_removed() {
        let problem = create_line_problem(2, &[], 500.0);
        let mut solution = create_test_solution(
            &problem,
            vec![TestRoute {
                nodes: vec![0, 1, 2, 0],
            }],
        );
        let params = PerturbationParams {
            removal_lower: 1.0,
            removal_upper: 1.0,
            ..PerturbationParams::default()
        };
        let mut electrifier = RouteElectrifier::new(false);
        let mut rng = SmallRng::seed_from_u64(5);

        RuinRelated.ruin_solution(
            &mut solution,
            RuinContext {
                params: &params,
                problem: &problem,
                rng: &mut rng,
                electrifier: &mut electrifier,
            },
        );

        assert!(solution.is_empty());
    }
}
