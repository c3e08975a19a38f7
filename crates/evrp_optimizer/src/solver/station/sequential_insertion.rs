use rand::Rng;

use crate::{
    problem::{
        PRECISION, electric_vehicle_routing_problem::ElectricVehicleRoutingProblem,
        node::NodeIdx,
    },
    solver::eval::route_status::{
        Feasibility, NodeStatus, evaluate_insertion, evaluate_with_status,
    },
};

/// Stations inserted into a route to make it battery feasible.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRepair {
    /// `(station, position)` in insertion order. Each position refers to the list as it was
    /// right before that insertion.
    pub insertions: Vec<(NodeIdx, usize)>,
    pub nodes: Vec<NodeIdx>,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    station: NodeIdx,
    position: usize,
    feasibility: Feasibility,
}

#[derive(Debug, Clone, Copy)]
struct Choice {
    station: NodeIdx,
    position: usize,
    score: f64,
}

/// Greedy station insertion.
///
/// Repeatedly looks at the first position where the battery runs out and inserts the station
/// with the smallest detour somewhere between that position and the last place the vehicle
/// was recharged. Candidates that make the route feasible win over candidates that only push
/// the violation further. Fails with `None` when the route is not a pure battery violation or
/// no insertion helps.
pub fn sequential_station_insertion<R>(
    problem: &ElectricVehicleRoutingProblem,
    nodes: &[NodeIdx],
    rng: &mut R,
) -> Option<StationRepair>
where
    R: Rng,
{
    let mut nodes = nodes.to_vec();
    let mut status = Vec::with_capacity(nodes.len() + 4);
    let mut evaluation = evaluate_with_status(problem, &nodes, &mut status);
    let mut insertions = Vec::new();
    let max_insertions = 2 * nodes.len();

    loop {
        let infeasible_position = match evaluation.feasibility {
            Feasibility::Feasible => {
                return Some(StationRepair {
                    insertions,
                    nodes,
                    cost: evaluation.cost,
                });
            }
            Feasibility::BatteryViolated { position } => position,
            _ => return None,
        };

        if insertions.len() >= max_insertions {
            return None;
        }

        // Range was last replenished here.
        let segment_start = (0..infeasible_position)
            .rev()
            .find(|&i| !problem.is_customer(nodes[i]))
            .unwrap_or(0);

        let candidates =
            collect_candidates(problem, &nodes, &status, segment_start, infeasible_position);

        let relaxed = if candidates
            .iter()
            .any(|candidate| candidate.feasibility.is_feasible())
        {
            Feasibility::Feasible
        } else if candidates.is_empty() {
            return None;
        } else {
            // Accept a partial improvement for this round.
            Feasibility::BatteryViolated { position: 0 }
        };

        let path_len = infeasible_position - segment_start;
        let choices = if problem.stations().len() <= path_len {
            best_position_per_station(problem, &nodes, &candidates, relaxed)
        } else {
            best_station_per_position(
                problem,
                &nodes,
                &candidates,
                relaxed,
                segment_start,
                infeasible_position,
            )
        };

        let scores = choices
            .iter()
            .map(|choice| choice.map_or(f64::INFINITY, |choice| choice.score))
            .collect::<Vec<_>>();

        let Choice {
            station, position, ..
        } = pick_best(&scores, rng).and_then(|index| choices[index])?;

        if is_degenerate(problem, &nodes, station, position) {
            return None;
        }

        nodes.insert(position, station);
        insertions.push((station, position));
        evaluation = evaluate_with_status(problem, &nodes, &mut status);
    }
}

fn collect_candidates(
    problem: &ElectricVehicleRoutingProblem,
    nodes: &[NodeIdx],
    status: &[NodeStatus],
    segment_start: usize,
    infeasible_position: usize,
) -> Vec<Candidate> {
    let depot = problem.depot();
    let mut candidates = Vec::new();

    for position in segment_start + 1..=infeasible_position {
        let previous = nodes[position - 1];
        let next = nodes[position];

        for &station in problem.station_ranking().stations(previous, next) {
            let unreachable =
                status[position - 1].departure_range - problem.distance(previous, station)
                    < -PRECISION;
            let zero_hop_from_depot = position == 1 && problem.distance(previous, station) == 0.0;
            let zero_hop_to_depot = next == depot && problem.distance(station, next) == 0.0;

            if unreachable
                || zero_hop_from_depot
                || zero_hop_to_depot
                || station == previous
                || station == next
            {
                continue;
            }

            let feasibility = evaluate_insertion(problem, nodes, station, position).feasibility;
            if feasibility.is_feasible() || feasibility.is_battery_violation() {
                candidates.push(Candidate {
                    station,
                    position,
                    feasibility,
                });
            }
        }
    }

    candidates
}

fn matches_relaxation(candidate: &Candidate, relaxed: Feasibility) -> bool {
    candidate.feasibility.code() == relaxed.code()
}

/// Insertion detour of `station` between `position - 1` and `position`.
fn detour(
    problem: &ElectricVehicleRoutingProblem,
    nodes: &[NodeIdx],
    station: NodeIdx,
    position: usize,
) -> f64 {
    let previous = nodes[position - 1];
    let next = nodes[position];

    problem.distance(previous, station) + problem.distance(station, next)
        - problem.distance(previous, next)
}

fn best_position_per_station(
    problem: &ElectricVehicleRoutingProblem,
    nodes: &[NodeIdx],
    candidates: &[Candidate],
    relaxed: Feasibility,
) -> Vec<Option<Choice>> {
    problem
        .stations()
        .iter()
        .map(|&station| {
            let mut best: Option<Choice> = None;
            for candidate in candidates
                .iter()
                .filter(|candidate| candidate.station == station)
                .filter(|candidate| matches_relaxation(candidate, relaxed))
            {
                let score = detour(problem, nodes, station, candidate.position);
                if best.is_none_or(|best| score - best.score < -PRECISION) {
                    best = Some(Choice {
                        station,
                        position: candidate.position,
                        score,
                    });
                }
            }
            best
        })
        .collect()
}

fn best_station_per_position(
    problem: &ElectricVehicleRoutingProblem,
    nodes: &[NodeIdx],
    candidates: &[Candidate],
    relaxed: Feasibility,
    segment_start: usize,
    infeasible_position: usize,
) -> Vec<Option<Choice>> {
    (segment_start + 1..=infeasible_position)
        .map(|position| {
            let mut best: Option<Choice> = None;
            for candidate in candidates
                .iter()
                .filter(|candidate| candidate.position == position)
                .filter(|candidate| matches_relaxation(candidate, relaxed))
            {
                let score = detour(problem, nodes, candidate.station, position);
                if best.is_none_or(|best| score - best.score < -PRECISION) {
                    best = Some(Choice {
                        station: candidate.station,
                        position,
                        score,
                    });
                }
            }
            best
        })
        .collect()
}

/// Index of the smallest finite score. When several scores are within [`PRECISION`] of the
/// best, one of them is drawn uniformly.
pub(crate) fn pick_best<R>(scores: &[f64], rng: &mut R) -> Option<usize>
where
    R: Rng,
{
    let best = scores
        .iter()
        .copied()
        .filter(|score| score.is_finite())
        .min_by(|a, b| a.total_cmp(b))?;

    let ties = scores
        .iter()
        .enumerate()
        .filter(|&(_, &score)| score.is_finite() && (score - best).abs() <= PRECISION)
        .map(|(index, _)| index)
        .collect::<Vec<_>>();

    if ties.len() > 1 {
        Some(ties[rng.random_range(0..ties.len())])
    } else {
        ties.first().copied()
    }
}

/// The station would sit next to itself, or next to a copy of itself with only another
/// station in between.
fn is_degenerate(
    problem: &ElectricVehicleRoutingProblem,
    nodes: &[NodeIdx],
    station: NodeIdx,
    position: usize,
) -> bool {
    nodes[position - 1] == station
        || nodes[position] == station
        || (position >= 2
            && nodes[position - 2] == station
            && problem.is_station(nodes[position - 1]))
        || (position + 1 < nodes.len()
            && nodes[position + 1] == station
            && problem.is_station(nodes[position]))
}
