use crate::{
    problem::{
        PRECISION, electric_vehicle_routing_problem::ElectricVehicleRoutingProblem,
        node::NodeIdx,
    },
    solver::eval::node_sequence::{NodeSequence, Nodes, SubstitutingNodes, WithInsertion},
};

/// Outcome of a route scan. Each variant stops the scan at the first violation found,
/// in the order capacity, time window, battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feasibility {
    /// The route does not start and end at the depot.
    Malformed,
    Feasible,
    CapacityViolated,
    TimeWindowViolated,
    /// Capacity and time windows hold but the battery runs out when reaching `position`.
    BatteryViolated { position: usize },
}

impl Feasibility {
    pub fn code(&self) -> u8 {
        match self {
            Feasibility::Malformed => 0,
            Feasibility::Feasible => 1,
            Feasibility::CapacityViolated => 2,
            Feasibility::TimeWindowViolated => 3,
            Feasibility::BatteryViolated { .. } => 4,
        }
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self, Feasibility::Feasible)
    }

    pub fn is_battery_violation(&self) -> bool {
        matches!(self, Feasibility::BatteryViolated { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEvaluation {
    pub feasibility: Feasibility,
    /// `+inf` unless the route is feasible.
    pub cost: f64,
}

impl RouteEvaluation {
    fn feasible(cost: f64) -> Self {
        RouteEvaluation {
            feasibility: Feasibility::Feasible,
            cost,
        }
    }

    fn infeasible(feasibility: Feasibility) -> Self {
        RouteEvaluation {
            feasibility,
            cost: f64::INFINITY,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.feasibility.is_feasible()
    }
}

/// Timing and remaining range (RD) of the vehicle at one position of a route.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeStatus {
    pub arrival_time: f64,
    pub departure_time: f64,
    pub arrival_range: f64,
    pub departure_range: f64,
}

/// Feasibility and cost of `nodes`.
pub fn evaluate(problem: &ElectricVehicleRoutingProblem, nodes: &[NodeIdx]) -> RouteEvaluation {
    scan(problem, &mut Nodes(nodes), None)
}

/// Same as [`evaluate`], recording the status of every scanned position into `status`.
/// Entries past the position where the scan stopped are left at their default.
pub fn evaluate_with_status(
    problem: &ElectricVehicleRoutingProblem,
    nodes: &[NodeIdx],
    status: &mut Vec<NodeStatus>,
) -> RouteEvaluation {
    scan(problem, &mut Nodes(nodes), Some(status))
}

/// Evaluates `nodes` as if `node` was inserted at `position`, without touching `nodes`.
/// Positions outside of the route interior are [`Feasibility::Malformed`].
pub fn evaluate_insertion(
    problem: &ElectricVehicleRoutingProblem,
    nodes: &[NodeIdx],
    node: NodeIdx,
    position: usize,
) -> RouteEvaluation {
    match WithInsertion::new(nodes, node, position) {
        Some(mut sequence) => scan(problem, &mut sequence, None),
        None => RouteEvaluation::infeasible(Feasibility::Malformed),
    }
}

/// Evaluates `nodes`, replacing any station that leaves the vehicle short of range by the
/// next ranked station for its neighbours that works. Replacements are kept in `nodes`.
pub fn evaluate_substituting_stations(
    problem: &ElectricVehicleRoutingProblem,
    nodes: &mut [NodeIdx],
    status: Option<&mut Vec<NodeStatus>>,
) -> RouteEvaluation {
    scan(problem, &mut SubstitutingNodes(nodes), status)
}

/// Capacity and time window check that ignores the battery. Stations are regular stops here.
pub fn check_ignoring_battery(
    problem: &ElectricVehicleRoutingProblem,
    nodes: &[NodeIdx],
) -> RouteEvaluation {
    let len = nodes.len();
    let depot = problem.depot();

    if len < 2 || nodes[0] != depot || nodes[len - 1] != depot {
        return RouteEvaluation::infeasible(Feasibility::Malformed);
    }

    if len == 2 {
        return RouteEvaluation::feasible(0.0);
    }

    let capacity = problem.vehicle().capacity();
    let mut load: f64 = nodes
        .iter()
        .map(|&node| problem.node(node).delivery())
        .sum();

    if load - capacity > PRECISION {
        return RouteEvaluation::infeasible(Feasibility::CapacityViolated);
    }

    let mut time = problem.start_time();
    let mut distance = 0.0;

    for window in nodes.windows(2) {
        let (previous, current) = (window[0], window[1]);
        let node = problem.node(current);

        load = load - node.delivery() + node.pickup();
        if load - capacity > PRECISION {
            return RouteEvaluation::infeasible(Feasibility::CapacityViolated);
        }

        time += problem.time(previous, current);
        if time - node.time_window().end() > PRECISION {
            return RouteEvaluation::infeasible(Feasibility::TimeWindowViolated);
        }

        time = time.max(node.time_window().start()) + node.service_time();
        distance += problem.distance(previous, current);
    }

    RouteEvaluation::feasible(problem.vehicle().route_cost(distance))
}

/// Distance from the station at `index` to the next station or depot.
fn distance_to_next_recharge<S: NodeSequence>(
    problem: &ElectricVehicleRoutingProblem,
    sequence: &S,
    index: usize,
) -> f64 {
    let mut distance = 0.0;
    let mut j = index;
    loop {
        j += 1;
        distance += problem.distance(sequence.node(j - 1), sequence.node(j));
        if !problem.is_customer(sequence.node(j)) {
            return distance;
        }
    }
}

/// Tries the lower ranked stations between `previous` and the successor of `index`.
/// Returns the arrival range of the accepted station.
fn substitute_station<S: NodeSequence>(
    problem: &ElectricVehicleRoutingProblem,
    sequence: &mut S,
    index: usize,
    previous: NodeIdx,
    previous_range: f64,
    max_range: f64,
    check_departure: bool,
) -> Option<f64> {
    let original = sequence.node(index);
    let next = sequence.node(index + 1);
    let ranking = problem.station_ranking().stations(previous, next);

    for &candidate in ranking.iter().skip(1) {
        let arrival_range = previous_range - problem.distance(previous, candidate);
        if arrival_range < -PRECISION {
            continue;
        }

        sequence.replace(index, candidate);

        if !check_departure {
            return Some(arrival_range);
        }

        let target = distance_to_next_recharge(problem, sequence, index).max(arrival_range);
        if max_range - target > -PRECISION {
            return Some(arrival_range);
        }
    }

    sequence.replace(index, original);
    None
}

/// Single forward pass over `sequence`.
///
/// At a station the vehicle charges just enough to reach the next station or the depot,
/// plus whatever it can charge while it would otherwise wait for the next time windows
/// to open, never beyond the smallest slack left at those windows.
fn scan<S: NodeSequence>(
    problem: &ElectricVehicleRoutingProblem,
    sequence: &mut S,
    mut status: Option<&mut Vec<NodeStatus>>,
) -> RouteEvaluation {
    let len = sequence.len();
    let depot = problem.depot();

    if len < 2 || sequence.node(0) != depot || sequence.node(len - 1) != depot {
        return RouteEvaluation::infeasible(Feasibility::Malformed);
    }

    let vehicle = problem.vehicle();
    let max_range = problem.max_range();
    let start_time = problem.start_time();

    if let Some(status) = status.as_deref_mut() {
        status.clear();
        status.resize(len, NodeStatus::default());
        status[0] = NodeStatus {
            arrival_time: start_time,
            departure_time: start_time,
            arrival_range: max_range,
            departure_range: max_range,
        };
    }

    if len == 2 {
        return RouteEvaluation::feasible(0.0);
    }

    let capacity = vehicle.capacity();
    let mut load: f64 = (0..len)
        .map(|i| problem.node(sequence.node(i)).delivery())
        .sum();

    if load - capacity > PRECISION {
        return RouteEvaluation::infeasible(Feasibility::CapacityViolated);
    }

    let charge_rate = vehicle.charge_time_per_distance();
    let instant_charge = charge_rate <= 0.0 || !max_range.is_finite();

    let mut time = start_time;
    let mut distance = 0.0;
    let mut previous = sequence.node(0);
    let mut previous_range = max_range;

    for i in 1..len {
        let mut current = sequence.node(i);

        let demand = problem.node(current);
        load = load - demand.delivery() + demand.pickup();
        if load - capacity > PRECISION {
            return RouteEvaluation::infeasible(Feasibility::CapacityViolated);
        }

        let arrival_time;
        let arrival_range;
        let departure_range;

        if !problem.is_station(current) {
            let node = problem.node(current);

            time += problem.time(previous, current);
            arrival_time = time;
            if time - node.time_window().end() > PRECISION {
                return RouteEvaluation::infeasible(Feasibility::TimeWindowViolated);
            }
            time = time.max(node.time_window().start()) + node.service_time();

            arrival_range = previous_range - problem.distance(previous, current);
            if arrival_range < -PRECISION {
                return RouteEvaluation::infeasible(Feasibility::BatteryViolated { position: i });
            }
            departure_range = arrival_range;
        } else {
            let mut range_at_station = previous_range - problem.distance(previous, current);

            if range_at_station < -PRECISION {
                let substituted = if S::SUBSTITUTES_STATIONS {
                    substitute_station(
                        problem,
                        sequence,
                        i,
                        previous,
                        previous_range,
                        max_range,
                        false,
                    )
                } else {
                    None
                };

                match substituted {
                    Some(range) => {
                        current = sequence.node(i);
                        range_at_station = range;
                    }
                    None => {
                        return RouteEvaluation::infeasible(Feasibility::BatteryViolated {
                            position: i,
                        });
                    }
                }
            }

            let mut target =
                distance_to_next_recharge(problem, sequence, i).max(range_at_station);

            if S::SUBSTITUTES_STATIONS && max_range - target < -PRECISION {
                match substitute_station(
                    problem,
                    sequence,
                    i,
                    previous,
                    previous_range,
                    max_range,
                    true,
                ) {
                    Some(range) => {
                        current = sequence.node(i);
                        range_at_station = range;
                        target =
                            distance_to_next_recharge(problem, sequence, i).max(range_at_station);
                    }
                    None => {
                        return RouteEvaluation::infeasible(Feasibility::BatteryViolated {
                            position: i,
                        });
                    }
                }
            }

            time += problem.time(previous, current);
            arrival_time = time;
            arrival_range = range_at_station;

            if instant_charge {
                departure_range = max_range;
            } else {
                let mut recharge_time = (target.min(max_range) - arrival_range) * charge_rate;

                // Waiting for a window to open can be spent charging.
                let mut min_remaining_slack = f64::INFINITY;
                let mut move_time = arrival_time + recharge_time;
                let mut j = i;
                loop {
                    j += 1;
                    let next = sequence.node(j);
                    let node = problem.node(next);
                    let window = node.time_window();

                    move_time += problem.time(sequence.node(j - 1), next);
                    if move_time - window.start() < -PRECISION {
                        let additional = min_remaining_slack.min(window.start() - move_time);
                        recharge_time += additional;
                        move_time += additional;
                        min_remaining_slack -= additional;
                    }

                    if window.end() - move_time < -PRECISION {
                        return RouteEvaluation::infeasible(Feasibility::TimeWindowViolated);
                    }

                    min_remaining_slack = min_remaining_slack.min(window.end() - move_time);
                    if min_remaining_slack <= 0.0 {
                        break;
                    }

                    move_time = move_time.max(window.start()) + node.service_time();
                    if !node.is_customer() {
                        break;
                    }
                }

                departure_range = (recharge_time / charge_rate + arrival_range).min(max_range);
                time += (departure_range - arrival_range) * charge_rate;
            }
        }

        if let Some(status) = status.as_deref_mut() {
            status[i] = NodeStatus {
                arrival_time,
                departure_time: time,
                arrival_range,
                departure_range,
            };
        }

        distance += problem.distance(previous, current);
        previous = current;
        previous_range = departure_range;
    }

    RouteEvaluation::feasible(vehicle.route_cost(distance))
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::{location::Location, node::NodeBuilder},
        test_utils::{
            TEST_DISPATCH_COST, create_line_problem, create_scenario_problem, create_test_problem,
            create_test_vehicle, customer_at, depot_at, ids, station_at,
        },
    };

    use super::*;

    #[test]
    fn test_evaluate_feasible_route() {
        let problem = create_scenario_problem(40.0);

        let evaluation = evaluate(&problem, &ids(&[0, 1, 2, 0]));

        assert_eq!(evaluation.feasibility, Feasibility::Feasible);
        assert_eq!(evaluation.feasibility.code(), 1);
        assert_eq!(evaluation.cost, TEST_DISPATCH_COST + 40.0);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let problem = create_scenario_problem(25.0);
        let nodes = ids(&[0, 1, 3, 2, 0]);

        let first = evaluate(&problem, &nodes);
        let second = evaluate(&problem, &nodes);

        assert_eq!(first, second);
        assert_eq!(nodes, ids(&[0, 1, 3, 2, 0]));
    }

    #[test]
    fn test_evaluate_malformed_route() {
        let problem = create_scenario_problem(40.0);

        let evaluation = evaluate(&problem, &ids(&[1, 2, 0]));

        assert_eq!(evaluation.feasibility, Feasibility::Malformed);
        assert_eq!(evaluation.feasibility.code(), 0);
        assert_eq!(evaluation.cost, f64::INFINITY);
        assert_eq!(evaluate(&problem, &ids(&[0])).feasibility, Feasibility::Malformed);
    }

    #[test]
    fn test_evaluate_empty_route() {
        let problem = create_scenario_problem(40.0);

        let evaluation = evaluate(&problem, &ids(&[0, 0]));

        assert_eq!(evaluation.feasibility, Feasibility::Feasible);
        assert_eq!(evaluation.cost, 0.0);
    }

    #[test]
    fn test_evaluate_capacity_violation() {
        // each customer delivers 1 and picks up 1
        let nodes = vec![depot_at(0.0, 0.0), customer_at(10.0, 0.0), customer_at(20.0, 0.0)];

        let problem = create_test_problem(nodes.clone(), create_test_vehicle(1.5, 100.0));
        let evaluation = evaluate(&problem, &ids(&[0, 1, 2, 0]));
        assert_eq!(evaluation.feasibility, Feasibility::CapacityViolated);
        assert_eq!(evaluation.feasibility.code(), 2);

        let problem = create_test_problem(nodes, create_test_vehicle(2.0 - PRECISION / 2.0, 100.0));
        let evaluation = evaluate(&problem, &ids(&[0, 1, 2, 0]));
        assert_eq!(evaluation.feasibility, Feasibility::Feasible);
    }

    #[test]
    fn test_evaluate_capacity_violation_on_pickup_peak() {
        let mut heavy_pickup = NodeBuilder::customer();
        heavy_pickup
            .set_location(Location::from_cartesian(20.0, 0.0))
            .set_time_window(0.0, 1000.0)
            .set_pickup(5.0);

        let nodes = vec![
            depot_at(0.0, 0.0),
            customer_at(10.0, 0.0),
            heavy_pickup.build(),
        ];
        let problem = create_test_problem(nodes, create_test_vehicle(5.0, 100.0));

        // deliveries first: load 1 -> 1 -> 6
        let evaluation = evaluate(&problem, &ids(&[0, 1, 2, 0]));
        assert_eq!(evaluation.feasibility, Feasibility::CapacityViolated);

        // pickup first: load 1 -> 6
        let evaluation = evaluate(&problem, &ids(&[0, 2, 1, 0]));
        assert_eq!(evaluation.feasibility, Feasibility::CapacityViolated);

        // alone: load 0 -> 5
        let evaluation = evaluate(&problem, &ids(&[0, 2, 0]));
        assert_eq!(evaluation.feasibility, Feasibility::Feasible);
    }

    #[test]
    fn test_evaluate_time_window_violation() {
        let mut late = NodeBuilder::customer();
        late.set_location(Location::from_cartesian(10.0, 0.0))
            .set_time_window(0.0, 12.0);

        let nodes = vec![depot_at(0.0, 0.0), customer_at(20.0, 0.0), late.build()];
        let problem = create_test_problem(nodes, create_test_vehicle(100.0, 100.0));

        let evaluation = evaluate(&problem, &ids(&[0, 1, 2, 0]));
        assert_eq!(evaluation.feasibility, Feasibility::TimeWindowViolated);
        assert_eq!(evaluation.feasibility.code(), 3);

        let evaluation = evaluate(&problem, &ids(&[0, 2, 1, 0]));
        assert_eq!(evaluation.feasibility, Feasibility::Feasible);
    }

    #[test]
    fn test_evaluate_battery_violation() {
        let problem = create_scenario_problem(25.0);

        let evaluation = evaluate(&problem, &ids(&[0, 1, 2, 0]));

        assert_eq!(
            evaluation.feasibility,
            Feasibility::BatteryViolated { position: 3 }
        );
        assert_eq!(evaluation.feasibility.code(), 4);
        assert!(evaluation.feasibility.is_battery_violation());
    }

    #[test]
    fn test_range_is_conserved_without_stations() {
        let problem = create_line_problem(3, &[], 100.0);
        let mut status = Vec::new();

        let evaluation = evaluate_with_status(&problem, &ids(&[0, 1, 2, 3, 0]), &mut status);

        assert!(evaluation.is_feasible());
        assert_eq!(status.len(), 5);
        for (i, expected) in [(1, 90.0), (2, 80.0), (3, 70.0), (4, 40.0)] {
            assert_eq!(status[i].arrival_range, expected);
            assert_eq!(status[i].arrival_range, status[i].departure_range);
        }
    }

    #[test]
    fn test_station_recharges_to_next_stop() {
        let problem = create_scenario_problem(25.0);
        let mut status = Vec::new();

        let evaluation = evaluate_with_status(&problem, &ids(&[0, 1, 3, 2, 0]), &mut status);

        assert_eq!(evaluation.feasibility, Feasibility::Feasible);
        assert_eq!(evaluation.cost, TEST_DISPATCH_COST + 40.0);

        assert_eq!(status[2].arrival_range, 10.0);
        assert_eq!(status[2].departure_range, 25.0);
        assert_eq!(status[2].arrival_time, 15.0);
        assert_eq!(status[2].departure_time, 30.0);
        assert_eq!(status[3].arrival_time, 35.0);
        assert_eq!(status[4].arrival_range, 0.0);
    }

    #[test]
    fn test_station_charges_while_waiting() {
        let mut opens_late = NodeBuilder::customer();
        opens_late
            .set_location(Location::from_cartesian(20.0, 0.0))
            .set_time_window(30.0, 1000.0);

        let nodes = vec![
            depot_at(0.0, 0.0),
            customer_at(10.0, 0.0),
            opens_late.build(),
            station_at(15.0, 0.0),
        ];
        let problem = create_test_problem(nodes, create_test_vehicle(100.0, 40.0));
        let mut status = Vec::new();

        let evaluation = evaluate_with_status(&problem, &ids(&[0, 1, 3, 2, 0]), &mut status);

        assert!(evaluation.is_feasible());
        assert_eq!(status[2].arrival_range, 25.0);
        assert_eq!(status[2].departure_range, 35.0);
        assert_eq!(status[2].departure_time, 25.0);
        assert_eq!(status[3].arrival_time, 30.0);
    }

    #[test]
    fn test_evaluate_insertion() {
        let problem = create_scenario_problem(25.0);
        let nodes = ids(&[0, 1, 2, 0]);

        let virtual_insertion = evaluate_insertion(&problem, &nodes, NodeIdx::new(3), 3);
        let materialized = evaluate(&problem, &ids(&[0, 1, 2, 3, 0]));

        assert_eq!(virtual_insertion, materialized);
        assert!(virtual_insertion.is_feasible());
        assert_eq!(nodes, ids(&[0, 1, 2, 0]));

        let virtual_insertion = evaluate_insertion(&problem, &nodes, NodeIdx::new(3), 1);
        assert!(virtual_insertion.feasibility.is_battery_violation());
        for position in [0, 4] {
            let outside = evaluate_insertion(&problem, &nodes, NodeIdx::new(3), position);
            assert_eq!(outside.feasibility, Feasibility::Malformed);
            assert_eq!(outside.cost, f64::INFINITY);
        }
    }

    #[test]
    fn test_check_ignoring_battery() {
        let problem = create_scenario_problem(5.0);
        let nodes = ids(&[0, 1, 2, 0]);

        let evaluation = check_ignoring_battery(&problem, &nodes);
        assert_eq!(evaluation.feasibility, Feasibility::Feasible);
        assert_eq!(evaluation.cost, TEST_DISPATCH_COST + 40.0);

        assert!(evaluate(&problem, &nodes).feasibility.is_battery_violation());
        assert_eq!(check_ignoring_battery(&problem, &ids(&[0, 0])).cost, 0.0);
    }

    #[test]
    fn test_evaluate_substituting_stations() {
        // station 2 is the best detour between 1 and the depot but out of reach
        let nodes = vec![
            depot_at(0.0, 0.0),
            customer_at(10.0, 0.0),
            station_at(5.0, 0.0),
            station_at(9.0, 1.0),
        ];
        let problem = create_test_problem(nodes, create_test_vehicle(100.0, 12.0));
        let mut route = ids(&[0, 1, 2, 0]);

        assert_eq!(
            evaluate(&problem, &route).feasibility,
            Feasibility::BatteryViolated { position: 2 }
        );

        let evaluation = evaluate_substituting_stations(&problem, &mut route, None);

        assert!(evaluation.is_feasible());
        assert_eq!(route, ids(&[0, 1, 3, 0]));
        assert!((evaluation.cost - evaluate(&problem, &route).cost).abs() < 1e-9);
    }
}
