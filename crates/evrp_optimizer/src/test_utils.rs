use rand::RngCore;

use crate::{
    problem::{
        electric_vehicle_routing_problem::{
            ElectricVehicleRoutingProblem, ElectricVehicleRoutingProblemBuilder,
        },
        location::Location,
        node::{Node, NodeBuilder, NodeIdx},
        vehicle::{Vehicle, VehicleBuilder},
    },
    solver::solution::{route::Route, solution::Solution},
};

pub const TEST_HORIZON: f64 = 1000.0;
pub const TEST_DISPATCH_COST: f64 = 100.0;

pub fn ids(values: &[usize]) -> Vec<NodeIdx> {
    values.iter().map(|&value| NodeIdx::new(value)).collect()
}

fn node_at(mut builder: NodeBuilder, x: f64, y: f64) -> Node {
    builder
        .set_location(Location::from_cartesian(x, y))
        .set_time_window(0.0, TEST_HORIZON);
    builder.build()
}

pub fn depot_at(x: f64, y: f64) -> Node {
    node_at(NodeBuilder::depot(), x, y)
}

pub fn customer_at(x: f64, y: f64) -> Node {
    let mut builder = NodeBuilder::customer();
    builder.set_delivery(1.0).set_pickup(1.0);
    node_at(builder, x, y)
}

pub fn station_at(x: f64, y: f64) -> Node {
    node_at(NodeBuilder::station(), x, y)
}

pub fn create_test_vehicle(capacity: f64, max_range: f64) -> Vehicle {
    let mut builder = VehicleBuilder::default();
    builder
        .set_capacity(capacity)
        .set_dispatch_cost(TEST_DISPATCH_COST)
        .set_unit_cost(1.0)
        .set_consumption_rate(1.0)
        .set_recharging_rate(1.0)
        .set_battery_capacity(max_range);
    builder.build()
}

pub fn create_test_problem(nodes: Vec<Node>, vehicle: Vehicle) -> ElectricVehicleRoutingProblem {
    let mut builder = ElectricVehicleRoutingProblemBuilder::default();
    builder.set_nodes(nodes).set_vehicle(vehicle);
    builder.build().unwrap()
}

fn line_nodes(customers: usize, stations: &[(f64, f64)]) -> Vec<Node> {
    let mut nodes = vec![depot_at(0.0, 0.0)];
    for i in 1..=customers {
        nodes.push(customer_at(10.0 * i as f64, 0.0));
    }
    for &(x, y) in stations {
        nodes.push(station_at(x, y));
    }
    nodes
}

/// Depot at the origin, one customer every 10 units on the x axis, then the stations.
pub fn create_line_problem(
    customers: usize,
    stations: &[(f64, f64)],
    max_range: f64,
) -> ElectricVehicleRoutingProblem {
    create_test_problem(
        line_nodes(customers, stations),
        create_test_vehicle(100.0, max_range),
    )
}

/// Same as [`create_line_problem`] with arc pruning enabled.
pub fn create_pruned_line_problem(
    customers: usize,
    stations: &[(f64, f64)],
    max_range: f64,
) -> ElectricVehicleRoutingProblem {
    let mut builder = ElectricVehicleRoutingProblemBuilder::default();
    builder
        .set_nodes(line_nodes(customers, stations))
        .set_vehicle(create_test_vehicle(100.0, max_range))
        .set_pruning(true);
    builder.build().unwrap()
}

/// Depot (0), customers at (10, 0) and (20, 0) (1, 2) and a station at (15, 0) (3).
pub fn create_scenario_problem(max_range: f64) -> ElectricVehicleRoutingProblem {
    create_line_problem(2, &[(15.0, 0.0)], max_range)
}

pub struct TestRoute {
    pub nodes: Vec<usize>,
}

/// Builds a solution from full node lists (depots and stations included).
pub fn create_test_solution(
    problem: &ElectricVehicleRoutingProblem,
    routes: Vec<TestRoute>,
) -> Solution {
    let mut solution = Solution::new();

    for route in routes {
        solution.push(Route::from_nodes(problem, ids(&route.nodes)));
    }

    solution.compute_cost();
    solution
}

pub struct MockRng {
    data: Vec<u64>,
    index: usize,
}

impl MockRng {
    pub fn new(data: Vec<u64>) -> Self {
        MockRng { data, index: 0 }
    }
}

impl RngCore for MockRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        let value = self.data[self.index % self.data.len()];
        self.index = (self.index + 1) % self.data.len();
        value
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for byte in dst.iter_mut() {
            *byte = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_rng() {
        let data = vec![1, 2, 3, 4];
        let mut rng = MockRng::new(data.clone());

        for &expected in data.iter().cycle().take(8) {
            let value = rng.next_u64();
            assert_eq!(value, expected);
        }
    }

    #[test]
    fn test_create_scenario_problem() {
        let problem = create_scenario_problem(25.0);

        assert_eq!(problem.customers(), &ids(&[1, 2]));
        assert_eq!(problem.stations(), &ids(&[3]));
        assert_eq!(problem.max_range(), 25.0);
    }
}
