use serde::Deserialize;

use crate::{define_index_newtype, problem::location::Location};

define_index_newtype!(NodeIdx, Node);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum NodeKind {
    Depot,
    Customer,
    Station,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TimeWindow {
    start: f64,
    end: f64,
}

impl TimeWindow {
    pub const fn new(start: f64, end: f64) -> Self {
        TimeWindow { start, end }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow::new(0.0, f64::INFINITY)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    location: Location,
    delivery: f64,
    pickup: f64,
    time_window: TimeWindow,
    service_time: f64,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn delivery(&self) -> f64 {
        self.delivery
    }

    pub fn pickup(&self) -> f64 {
        self.pickup
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    pub fn service_time(&self) -> f64 {
        self.service_time
    }

    pub fn is_depot(&self) -> bool {
        self.kind == NodeKind::Depot
    }

    pub fn is_customer(&self) -> bool {
        self.kind == NodeKind::Customer
    }

    pub fn is_station(&self) -> bool {
        self.kind == NodeKind::Station
    }

    pub(crate) fn set_time_window(&mut self, time_window: TimeWindow) {
        self.time_window = time_window;
    }
}

pub struct NodeBuilder {
    kind: NodeKind,
    location: Option<Location>,
    delivery: f64,
    pickup: f64,
    time_window: Option<TimeWindow>,
    service_time: f64,
}

impl NodeBuilder {
    pub fn new(kind: NodeKind) -> Self {
        NodeBuilder {
            kind,
            location: None,
            delivery: 0.0,
            pickup: 0.0,
            time_window: None,
            service_time: 0.0,
        }
    }

    pub fn depot() -> Self {
        Self::new(NodeKind::Depot)
    }

    pub fn customer() -> Self {
        Self::new(NodeKind::Customer)
    }

    pub fn station() -> Self {
        Self::new(NodeKind::Station)
    }

    pub fn set_location(&mut self, location: Location) -> &mut NodeBuilder {
        self.location = Some(location);
        self
    }

    pub fn set_delivery(&mut self, delivery: f64) -> &mut NodeBuilder {
        self.delivery = delivery;
        self
    }

    pub fn set_pickup(&mut self, pickup: f64) -> &mut NodeBuilder {
        self.pickup = pickup;
        self
    }

    pub fn set_time_window(&mut self, start: f64, end: f64) -> &mut NodeBuilder {
        self.time_window = Some(TimeWindow::new(start, end));
        self
    }

    pub fn set_service_time(&mut self, service_time: f64) -> &mut NodeBuilder {
        self.service_time = service_time;
        self
    }

    /// Stations built without an explicit time window inherit the depot's one when the
    /// problem is built.
    pub fn build(&self) -> Node {
        Node {
            kind: self.kind,
            location: self
                .location
                .unwrap_or_else(|| Location::from_cartesian(0.0, 0.0)),
            delivery: self.delivery,
            pickup: self.pickup,
            time_window: self.time_window.unwrap_or_default(),
            service_time: self.service_time,
        }
    }
}
