use serde::Deserialize;

/// Fleet-wide vehicle parameters. Every route is driven by an identical vehicle.
#[derive(Debug, Clone, Deserialize)]
pub struct Vehicle {
    capacity: f64,
    dispatch_cost: f64,
    unit_cost: f64,
    consumption_rate: f64,
    recharging_rate: f64,
    battery_capacity: f64,
    max_vehicles: Option<usize>,
}

impl Vehicle {
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn dispatch_cost(&self) -> f64 {
        self.dispatch_cost
    }

    pub fn unit_cost(&self) -> f64 {
        self.unit_cost
    }

    /// Battery used per distance unit.
    pub fn consumption_rate(&self) -> f64 {
        self.consumption_rate
    }

    /// Time needed to recharge one battery unit.
    pub fn recharging_rate(&self) -> f64 {
        self.recharging_rate
    }

    pub fn battery_capacity(&self) -> f64 {
        self.battery_capacity
    }

    pub fn max_vehicles(&self) -> Option<usize> {
        self.max_vehicles
    }

    /// Distance reachable on a full battery.
    pub fn max_range(&self) -> f64 {
        if self.consumption_rate <= 0.0 {
            f64::INFINITY
        } else {
            self.battery_capacity / self.consumption_rate
        }
    }

    /// Time needed to recover one distance unit of range.
    pub fn charge_time_per_distance(&self) -> f64 {
        self.consumption_rate * self.recharging_rate
    }

    pub fn route_cost(&self, distance: f64) -> f64 {
        self.dispatch_cost + self.unit_cost * distance
    }
}

pub struct VehicleBuilder {
    capacity: f64,
    dispatch_cost: f64,
    unit_cost: f64,
    consumption_rate: f64,
    recharging_rate: f64,
    battery_capacity: f64,
    max_vehicles: Option<usize>,
}

impl Default for VehicleBuilder {
    fn default() -> Self {
        VehicleBuilder {
            capacity: f64::INFINITY,
            dispatch_cost: 0.0,
            unit_cost: 1.0,
            consumption_rate: 1.0,
            recharging_rate: 1.0,
            battery_capacity: f64::INFINITY,
            max_vehicles: None,
        }
    }
}

impl VehicleBuilder {
    pub fn set_capacity(&mut self, capacity: f64) -> &mut VehicleBuilder {
        self.capacity = capacity;
        self
    }

    pub fn set_dispatch_cost(&mut self, dispatch_cost: f64) -> &mut VehicleBuilder {
        self.dispatch_cost = dispatch_cost;
        self
    }

    pub fn set_unit_cost(&mut self, unit_cost: f64) -> &mut VehicleBuilder {
        self.unit_cost = unit_cost;
        self
    }

    pub fn set_consumption_rate(&mut self, consumption_rate: f64) -> &mut VehicleBuilder {
        self.consumption_rate = consumption_rate;
        self
    }

    pub fn set_recharging_rate(&mut self, recharging_rate: f64) -> &mut VehicleBuilder {
        self.recharging_rate = recharging_rate;
        self
    }

    pub fn set_battery_capacity(&mut self, battery_capacity: f64) -> &mut VehicleBuilder {
        self.battery_capacity = battery_capacity;
        self
    }

    pub fn set_max_vehicles(&mut self, max_vehicles: usize) -> &mut VehicleBuilder {
        self.max_vehicles = Some(max_vehicles);
        self
    }

    pub fn build(&self) -> Vehicle {
        Vehicle {
            capacity: self.capacity,
            dispatch_cost: self.dispatch_cost,
            unit_cost: self.unit_cost,
            consumption_rate: self.consumption_rate,
            recharging_rate: self.recharging_rate,
            battery_capacity: self.battery_capacity,
            max_vehicles: self.max_vehicles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_range() {
        let mut builder = VehicleBuilder::default();
        builder.set_battery_capacity(30.0).set_consumption_rate(2.0);
        let vehicle = builder.build();

        assert_eq!(vehicle.max_range(), 15.0);
    }

    #[test]
    fn test_max_range_without_consumption() {
        let mut builder = VehicleBuilder::default();
        builder.set_battery_capacity(30.0).set_consumption_rate(0.0);
        let vehicle = builder.build();

        assert_eq!(vehicle.max_range(), f64::INFINITY);
    }
}
