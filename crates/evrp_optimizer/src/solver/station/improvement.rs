use rand::Rng;

use crate::{
    problem::{
        PRECISION, electric_vehicle_routing_problem::ElectricVehicleRoutingProblem,
        node::NodeIdx,
    },
    solver::{
        eval::route_status::{Feasibility, evaluate},
        station::sequential_insertion::sequential_station_insertion,
    },
};

/// Swaps stations that sit next to another station for better ranked ones.
///
/// Looks at every triple `(a, b, c)` where `b` is a station and `a` or `c` is a station too,
/// and tries the stations ranked better than `b` for the pair `(a, c)`. A candidate that
/// leaves a battery gap is patched with [`sequential_station_insertion`]. The first strictly
/// cheaper candidate of a triple is kept.
pub fn sequential_station_improvement<R>(
    problem: &ElectricVehicleRoutingProblem,
    nodes: &mut Vec<NodeIdx>,
    cost: &mut f64,
    rng: &mut R,
) where
    R: Rng,
{
    if nodes.len() < 4 {
        return;
    }

    let mut j = 0;
    while j + 2 < nodes.len() {
        let (first, second, third) = (nodes[j], nodes[j + 1], nodes[j + 2]);

        if problem.is_station(second) && (problem.is_station(first) || problem.is_station(third))
        {
            for &candidate in problem.station_ranking().stations(first, third) {
                if candidate == second {
                    break;
                }

                let mut trial = nodes.clone();
                trial[j + 1] = candidate;

                let evaluation = evaluate(problem, &trial);
                let (trial, trial_cost) = match evaluation.feasibility {
                    Feasibility::Feasible => (trial, evaluation.cost),
                    Feasibility::BatteryViolated { .. } => {
                        match sequential_station_insertion(problem, &trial, rng) {
                            Some(repair) => (repair.nodes, repair.cost),
                            None => continue,
                        }
                    }
                    _ => continue,
                };

                if trial_cost - *cost < -PRECISION {
                    *nodes = trial;
                    *cost = trial_cost;
                    break;
                }
            }
        }

        j += 1;
    }
}
