use tracing::debug;

use crate::{
    error::ProblemError,
    problem::{
        location::Location,
        node::{Node, NodeIdx, NodeKind},
        promise_matrix::PromiseMatrix,
        relatedness::Relatedness,
        station_ranking::StationRanking,
        travel_matrices::{Distance, Time, TravelMatrices},
        vehicle::Vehicle,
    },
    utils::enumerate_idx::EnumerateIdx,
};

pub const DEFAULT_STATION_RANGE: usize = 5;
pub const DEFAULT_RELATEDNESS_ALPHA: f64 = 1.0;

/// Immutable instance data shared by every component of the solver.
pub struct ElectricVehicleRoutingProblem {
    nodes: Vec<Node>,
    vehicle: Vehicle,
    matrices: TravelMatrices,
    depot: NodeIdx,
    customers: Vec<NodeIdx>,
    stations: Vec<NodeIdx>,
    station_slots: Vec<Option<usize>>,
    station_ranking: StationRanking,
    promise_matrix: Option<PromiseMatrix>,
    relatedness: Relatedness,
}

impl ElectricVehicleRoutingProblem {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn node(&self, index: NodeIdx) -> &Node {
        &self.nodes[index]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn depot(&self) -> NodeIdx {
        self.depot
    }

    pub fn customers(&self) -> &[NodeIdx] {
        &self.customers
    }

    pub fn stations(&self) -> &[NodeIdx] {
        &self.stations
    }

    #[inline]
    pub fn is_customer(&self, index: NodeIdx) -> bool {
        self.nodes[index].is_customer()
    }

    #[inline]
    pub fn is_station(&self, index: NodeIdx) -> bool {
        self.nodes[index].is_station()
    }

    /// Position of a station in [`Self::stations`].
    pub fn station_slot(&self, index: NodeIdx) -> Option<usize> {
        self.station_slots[index.get()]
    }

    #[inline]
    pub fn distance(&self, from: NodeIdx, to: NodeIdx) -> Distance {
        self.matrices.distance(from, to)
    }

    #[inline]
    pub fn time(&self, from: NodeIdx, to: NodeIdx) -> Time {
        self.matrices.time(from, to)
    }

    pub fn start_time(&self) -> f64 {
        self.nodes[self.depot].time_window().start()
    }

    pub fn max_range(&self) -> f64 {
        self.vehicle.max_range()
    }

    pub fn station_ranking(&self) -> &StationRanking {
        &self.station_ranking
    }

    /// Always true when pruning is disabled.
    #[inline]
    pub fn is_promising(&self, from: NodeIdx, to: NodeIdx) -> bool {
        self.promise_matrix
            .as_ref()
            .is_none_or(|matrix| matrix.is_promising(from, to))
    }

    pub fn has_pruning(&self) -> bool {
        self.promise_matrix.is_some()
    }

    pub fn relatedness(&self) -> &Relatedness {
        &self.relatedness
    }
}

pub struct ElectricVehicleRoutingProblemBuilder {
    nodes: Option<Vec<Node>>,
    vehicle: Option<Vehicle>,
    matrices: Option<TravelMatrices>,
    station_range: usize,
    pruning: bool,
    relatedness_alpha: f64,
}

impl Default for ElectricVehicleRoutingProblemBuilder {
    fn default() -> Self {
        ElectricVehicleRoutingProblemBuilder {
            nodes: None,
            vehicle: None,
            matrices: None,
            station_range: DEFAULT_STATION_RANGE,
            pruning: false,
            relatedness_alpha: DEFAULT_RELATEDNESS_ALPHA,
        }
    }
}

impl ElectricVehicleRoutingProblemBuilder {
    pub fn set_nodes(&mut self, nodes: Vec<Node>) -> &mut ElectricVehicleRoutingProblemBuilder {
        self.nodes = Some(nodes);
        self
    }

    pub fn set_vehicle(&mut self, vehicle: Vehicle) -> &mut ElectricVehicleRoutingProblemBuilder {
        self.vehicle = Some(vehicle);
        self
    }

    /// Euclidean matrices at unit speed are used when none are given.
    pub fn set_travel_matrices(
        &mut self,
        matrices: TravelMatrices,
    ) -> &mut ElectricVehicleRoutingProblemBuilder {
        self.matrices = Some(matrices);
        self
    }

    pub fn set_station_range(
        &mut self,
        station_range: usize,
    ) -> &mut ElectricVehicleRoutingProblemBuilder {
        self.station_range = station_range;
        self
    }

    pub fn set_pruning(&mut self, pruning: bool) -> &mut ElectricVehicleRoutingProblemBuilder {
        self.pruning = pruning;
        self
    }

    pub fn set_relatedness_alpha(
        &mut self,
        alpha: f64,
    ) -> &mut ElectricVehicleRoutingProblemBuilder {
        self.relatedness_alpha = alpha;
        self
    }

    pub fn build(self) -> Result<ElectricVehicleRoutingProblem, ProblemError> {
        let mut nodes = self.nodes.unwrap_or_default();
        let vehicle = self.vehicle.unwrap_or_else(|| {
            crate::problem::vehicle::VehicleBuilder::default().build()
        });

        let mut depot: Option<NodeIdx> = None;
        for (index, node) in nodes.iter().enumerate_idx() {
            if node.is_depot() {
                if let Some(existing) = depot {
                    return Err(ProblemError::MultipleDepots(existing, index));
                }
                depot = Some(index);
            }

            let window = node.time_window();
            if window.start() > window.end() {
                return Err(ProblemError::InvalidTimeWindow(
                    index,
                    window.start(),
                    window.end(),
                ));
            }

            if node.delivery() < 0.0 || node.pickup() < 0.0 {
                return Err(ProblemError::NegativeDemand(index));
            }
        }

        let depot = depot.ok_or(ProblemError::MissingDepot)?;

        for (name, value) in [
            ("capacity", vehicle.capacity()),
            ("unit_cost", vehicle.unit_cost()),
            ("dispatch_cost", vehicle.dispatch_cost()),
            ("consumption_rate", vehicle.consumption_rate()),
            ("recharging_rate", vehicle.recharging_rate()),
            ("battery_capacity", vehicle.battery_capacity()),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(ProblemError::InvalidVehicle { name, value });
            }
        }

        let matrices = match self.matrices {
            Some(matrices) => matrices,
            None => {
                let locations: Vec<Location> = nodes.iter().map(|node| *node.location()).collect();
                TravelMatrices::from_euclidean(&locations, 1.0)
            }
        };

        if matrices.num_nodes() != nodes.len() || !matrices.is_consistent() {
            return Err(ProblemError::MatrixSizeMismatch {
                nodes: nodes.len(),
                matrices: matrices.num_nodes(),
            });
        }

        // Stations without a window of their own are open as long as the depot.
        let depot_window = *nodes[depot].time_window();
        for node in nodes.iter_mut() {
            if node.kind() == NodeKind::Station && node.time_window().end().is_infinite() {
                node.set_time_window(depot_window);
            }
        }

        let customers: Vec<NodeIdx> = nodes
            .iter()
            .enumerate_idx()
            .filter(|(_, node)| node.is_customer())
            .map(|(index, _)| index)
            .collect();

        let stations: Vec<NodeIdx> = nodes
            .iter()
            .enumerate_idx()
            .filter(|(_, node)| node.is_station())
            .map(|(index, _)| index)
            .collect();

        let mut station_slots = vec![None; nodes.len()];
        for (slot, station) in stations.iter().enumerate() {
            station_slots[station.get()] = Some(slot);
        }

        let station_ranking = StationRanking::new(&stations, &matrices, self.station_range);
        let promise_matrix = self
            .pruning
            .then(|| PromiseMatrix::new(&nodes, depot, &matrices, &vehicle));
        let relatedness = Relatedness::new(&nodes, &matrices, self.relatedness_alpha);

        debug!(
            "Built problem with {} customers, {} stations (range {}), symmetric: {}, pruning: {}",
            customers.len(),
            stations.len(),
            station_ranking.range(),
            matrices.is_symmetric(),
            promise_matrix.is_some()
        );

        Ok(ElectricVehicleRoutingProblem {
            nodes,
            vehicle,
            matrices,
            depot,
            customers,
            stations,
            station_slots,
            station_ranking,
            promise_matrix,
            relatedness,
        })
    }
}
