use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClimateConfig {
    pub mode_threshold: f32,
    pub min_heating_outdoor_temp: f32,
    pub heat_per_interval: f32,
    pub cooling_per_interval: f32,
    pub interval_steps: u64,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            mode_threshold: 2.0,
            min_heating_outdoor_temp: -25.0,
            heat_per_interval: 21.0,
            cooling_per_interval: 21.0,
            interval_steps: 60,
        }
    }
}

impl ClimateConfig {
    pub fn sanitize(&mut self) {
        if !self.mode_threshold.is_finite() {
            self.mode_threshold = 2.0;
        }
        self.mode_threshold = self.mode_threshold.clamp(0.5, 10.0);
        if !self.min_heating_outdoor_temp.is_finite() {
            self.min_heating_outdoor_temp = -25.0;
        }
        if !self.heat_per_interval.is_finite() || self.heat_per_interval < 0.0 {
            self.heat_per_interval = 0.0;
        }
        if !self.cooling_per_interval.is_finite() || self.cooling_per_interval < 0.0 {
            self.cooling_per_interval = 0.0;
        }
        self.interval_steps = self.interval_steps.max(1);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.mode_threshold.is_finite() || self.mode_threshold <= 0.0 {
            return Err(ConfigError::InvalidThreshold(self.mode_threshold));
        }
        check_finite("min_heating_outdoor_temp", self.min_heating_outdoor_temp)?;
        check_finite("heat_per_interval", self.heat_per_interval)?;
        check_finite("cooling_per_interval", self.cooling_per_interval)?;
        if self.interval_steps == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoolingVariant {
    Integrated,
    Delegated,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    pub step_ms: u64,
    pub save_interval_steps: u64,
    pub outdoor_base_temp: f32,
    pub outdoor_amplitude: f32,
    pub outdoor_period_steps: u64,
    pub leak_rate: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_ms: 16,
            save_interval_steps: 3_600,
            outdoor_base_temp: 5.0,
            outdoor_amplitude: 15.0,
            outdoor_period_steps: 60_000,
            leak_rate: 0.000_5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomConfig {
    pub id: String,
    pub cells: u32,
    pub initial_temp: f32,
    #[serde(default = "default_enclosed")]
    pub enclosed: bool,
}

fn default_enclosed() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitConfig {
    pub id: String,
    pub thing_id: u32,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub target_temp: Option<f32>,
    pub cooling: CoolingVariant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuelCellConfig {
    pub id: String,
    pub capacity: f32,
    pub stored: f32,
    pub drain_per_step: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub climate: ClimateConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub rooms: Vec<RoomConfig>,
    #[serde(default)]
    pub units: Vec<UnitConfig>,
    #[serde(default)]
    pub fuel_cells: Vec<FuelCellConfig>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            climate: ClimateConfig::default(),
            simulation: SimulationConfig::default(),
            rooms: vec![
                RoomConfig {
                    id: "bedroom".to_string(),
                    cells: 20,
                    initial_temp: 15.0,
                    enclosed: true,
                },
                RoomConfig {
                    id: "workshop".to_string(),
                    cells: 48,
                    initial_temp: 28.0,
                    enclosed: true,
                },
            ],
            units: vec![
                UnitConfig {
                    id: "heat-pump-bedroom".to_string(),
                    thing_id: 1_041,
                    room: Some("bedroom".to_string()),
                    target_temp: Some(21.0),
                    cooling: CoolingVariant::Integrated,
                },
                UnitConfig {
                    id: "heat-pump-workshop".to_string(),
                    thing_id: 1_187,
                    room: Some("workshop".to_string()),
                    target_temp: Some(18.0),
                    cooling: CoolingVariant::Delegated,
                },
            ],
            fuel_cells: vec![FuelCellConfig {
                id: "hydrogen-cell".to_string(),
                capacity: 1_000.0,
                stored: 800.0,
                drain_per_step: 0.01,
            }],
        }
    }
}

impl RuntimeConfig {
    pub fn sanitize(&mut self) {
        self.climate.sanitize();
        self.simulation.step_ms = self.simulation.step_ms.max(1);
        self.simulation.save_interval_steps = self.simulation.save_interval_steps.max(1);
        self.simulation.outdoor_period_steps = self.simulation.outdoor_period_steps.max(1);
        self.simulation.leak_rate = self.simulation.leak_rate.clamp(0.0, 1.0);
        for room in &mut self.rooms {
            room.cells = room.cells.max(1);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.climate.validate()?;

        let mut rooms = HashSet::new();
        for room in &self.rooms {
            check_finite("initial_temp", room.initial_temp)?;
            if !rooms.insert(room.id.as_str()) {
                return Err(ConfigError::DuplicateId {
                    kind: "room",
                    id: room.id.clone(),
                });
            }
        }

        let mut units = HashSet::new();
        for unit in &self.units {
            if !units.insert(unit.id.as_str()) {
                return Err(ConfigError::DuplicateId {
                    kind: "unit",
                    id: unit.id.clone(),
                });
            }
            if let Some(room) = &unit.room {
                if !rooms.contains(room.as_str()) {
                    return Err(ConfigError::UnknownRoom {
                        unit: unit.id.clone(),
                        room: room.clone(),
                    });
                }
            }
            if let Some(target) = unit.target_temp {
                check_finite("target_temp", target)?;
            }
        }

        let mut cells = HashSet::new();
        for cell in &self.fuel_cells {
            if !cells.insert(cell.id.as_str()) {
                return Err(ConfigError::DuplicateId {
                    kind: "fuel cell",
                    id: cell.id.clone(),
                });
            }
            if !cell.capacity.is_finite() || cell.capacity <= 0.0 {
                return Err(ConfigError::InvalidCapacity(cell.capacity));
            }
        }

        Ok(())
    }
}

fn check_finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_runtime_config_is_valid() {
        assert_eq!(RuntimeConfig::default().validate(), Ok(()));
    }

    #[test]
    fn sanitize_repairs_out_of_range_values() {
        let mut config = ClimateConfig {
            mode_threshold: f32::NAN,
            interval_steps: 0,
            heat_per_interval: -3.0,
            ..ClimateConfig::default()
        };
        config.sanitize();

        assert_eq!(config.mode_threshold, 2.0);
        assert_eq!(config.interval_steps, 1);
        assert_eq!(config.heat_per_interval, 0.0);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_unit_in_unknown_room() {
        let mut runtime = RuntimeConfig::default();
        runtime.units[0].room = Some("attic".to_string());

        assert_eq!(
            runtime.validate(),
            Err(ConfigError::UnknownRoom {
                unit: "heat-pump-bedroom".to_string(),
                room: "attic".to_string(),
            })
        );
    }

    #[test]
    fn rejects_zero_capacity_fuel_cell() {
        let mut runtime = RuntimeConfig::default();
        runtime.fuel_cells[0].capacity = 0.0;

        assert_eq!(runtime.validate(), Err(ConfigError::InvalidCapacity(0.0)));
    }

    #[test]
    fn rejects_duplicate_unit_ids() {
        let mut runtime = RuntimeConfig::default();
        let copy = runtime.units[0].clone();
        runtime.units.push(copy);

        assert!(matches!(
            runtime.validate(),
            Err(ConfigError::DuplicateId { kind: "unit", .. })
        ));
    }

    #[test]
    fn unit_config_defaults_to_unplaced() {
        let unit: UnitConfig =
            serde_json::from_str(r#"{"id":"a","thing_id":7,"cooling":"delegated"}"#).unwrap();

        assert_eq!(unit.room, None);
        assert_eq!(unit.target_temp, None);
        assert_eq!(unit.cooling, CoolingVariant::Delegated);
    }
}
