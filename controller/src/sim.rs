use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, info, warn};

use heatpump_common::{
    ClimateAction, ClimateConfig, ClimateController, ClimateMode, ClimateSite, ConfigError,
    CoolingProvider, CoolingVariant, DelegatedCooling, FuelCellConfig, IntegratedCooling,
    ResourceBar, RuntimeConfig, SavedClimateState, UnitConfig, UnitStatus,
};

use crate::world::{World, WorldView};

type UnitController = ClimateController<Box<dyn CoolingProvider + Send>>;

pub struct UnitSite<'a> {
    world: &'a World,
    room: Option<&'a str>,
    target_temp: Option<f32>,
}

impl ClimateSite for UnitSite<'_> {
    fn room_temperature(&self) -> Option<f32> {
        self.world.enclosed_room_temperature(self.room?)
    }

    fn target_temperature(&self) -> Option<f32> {
        self.target_temp
    }

    fn outdoor_temperature(&self) -> f32 {
        self.world.outdoor_temperature()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndoorUnitCooler {
    energy_per_step: f32,
    active: bool,
}

impl IndoorUnitCooler {
    pub fn new(climate: &ClimateConfig) -> Self {
        Self {
            energy_per_step: climate.cooling_per_interval / climate.interval_steps.max(1) as f32,
            active: false,
        }
    }

    pub fn step(&mut self, mode: ClimateMode, site: &UnitSite<'_>) -> Option<f32> {
        self.active = mode == ClimateMode::Cooling
            && site
                .readings()
                .is_some_and(|readings| readings.room_temp > readings.target_temp);
        self.active.then_some(-self.energy_per_step)
    }

    pub fn describe(&self) -> &'static str {
        if self.active {
            "Indoor unit: cooling"
        } else {
            "Indoor unit: idle"
        }
    }
}

pub struct Unit {
    pub id: String,
    pub room: Option<String>,
    pub target_temp: Option<f32>,
    controller: UnitController,
    indoor_cooler: Option<IndoorUnitCooler>,
}

impl Unit {
    fn from_config(config: &UnitConfig, climate: &ClimateConfig) -> Self {
        let cooling: Box<dyn CoolingProvider + Send> = match config.cooling {
            CoolingVariant::Integrated => {
                Box::new(IntegratedCooling::new(climate.cooling_per_interval))
            }
            CoolingVariant::Delegated => Box::new(DelegatedCooling),
        };
        let indoor_cooler = (config.cooling == CoolingVariant::Delegated)
            .then(|| IndoorUnitCooler::new(climate));

        Self {
            id: config.id.clone(),
            room: config.room.clone(),
            target_temp: config.target_temp,
            controller: ClimateController::new(climate.clone(), config.thing_id, cooling),
            indoor_cooler,
        }
    }

    fn site<'a>(&'a self, world: &'a World) -> UnitSite<'a> {
        UnitSite {
            world,
            room: self.room.as_deref(),
            target_temp: self.target_temp,
        }
    }

    pub fn mode(&self) -> ClimateMode {
        self.controller.mode()
    }

    pub fn status(&self, world: &World) -> UnitStatus {
        let site = self.site(world);
        let mut status = self.controller.status(&self.id, &site);
        if let Some(cooler) = &self.indoor_cooler {
            status.status_text.push('\n');
            status.status_text.push_str(cooler.describe());
        }
        status
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuelCell {
    pub id: String,
    bar: ResourceBar,
    drain_per_step: f32,
}

impl FuelCell {
    fn from_config(config: &FuelCellConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            id: config.id.clone(),
            bar: ResourceBar::new(config.stored, config.capacity)?,
            drain_per_step: config.drain_per_step.max(0.0),
        })
    }

    pub fn view(&self) -> FuelCellView {
        FuelCellView {
            id: self.id.clone(),
            stored: self.bar.stored(),
            capacity: self.bar.capacity(),
            fill_fraction: self.bar.fill_fraction(),
            overfilled: self.bar.is_overfilled(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FuelCellView {
    pub id: String,
    pub stored: f32,
    pub capacity: f32,
    #[serde(rename = "fillFraction")]
    pub fill_fraction: f32,
    pub overfilled: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub step: u64,
    pub mode_changes: Vec<(String, ClimateMode)>,
    pub heat_pushed: f32,
}

pub struct Simulation {
    world: World,
    units: Vec<Unit>,
    fuel_cells: Vec<FuelCell>,
}

impl Simulation {
    pub fn from_config(
        runtime: &RuntimeConfig,
        saved: &BTreeMap<String, SavedClimateState>,
    ) -> Result<Self, ConfigError> {
        runtime.validate()?;

        let world = World::new(runtime.simulation.clone(), &runtime.rooms);
        let mut units = Vec::with_capacity(runtime.units.len());
        for config in &runtime.units {
            let mut unit = Unit::from_config(config, &runtime.climate);
            if let Some(state) = saved.get(&config.id) {
                unit.controller.load(*state);
            }
            units.push(unit);
        }

        for id in saved.keys() {
            if !units.iter().any(|unit| &unit.id == id) {
                warn!("dropping saved state for unknown unit '{id}'");
            }
        }

        let fuel_cells = runtime
            .fuel_cells
            .iter()
            .map(FuelCell::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            world,
            units,
            fuel_cells,
        })
    }

    pub fn step(&mut self) -> StepReport {
        self.world.advance();
        let step = self.world.step();
        let mut report = StepReport {
            step,
            ..StepReport::default()
        };

        for unit in &mut self.units {
            let actions = {
                let site = UnitSite {
                    world: &self.world,
                    room: unit.room.as_deref(),
                    target_temp: unit.target_temp,
                };
                unit.controller.tick(step, &site)
            };

            for action in actions {
                match action {
                    ClimateAction::ModeChanged { from, to } => {
                        info!("{}: {} -> {}", unit.id, from.label(), to.label());
                        report.mode_changes.push((unit.id.clone(), to));
                    }
                    ClimateAction::PushHeat(energy) => {
                        if let Some(room) = unit.room.as_deref() {
                            if self.world.push_heat(room, energy) {
                                report.heat_pushed += energy;
                            }
                        }
                    }
                }
            }

            let cooling = match unit.indoor_cooler.as_mut() {
                Some(cooler) => {
                    let site = UnitSite {
                        world: &self.world,
                        room: unit.room.as_deref(),
                        target_temp: unit.target_temp,
                    };
                    cooler.step(unit.controller.mode(), &site)
                }
                None => None,
            };
            if let (Some(energy), Some(room)) = (cooling, unit.room.as_deref()) {
                if self.world.push_heat(room, energy) {
                    report.heat_pushed += energy;
                }
            }
        }

        for cell in &mut self.fuel_cells {
            let drawn = cell.bar.draw(cell.drain_per_step);
            if drawn > 0.0 && cell.bar.is_empty() {
                warn!("fuel cell '{}' ran dry", cell.id);
            }
        }

        if report.heat_pushed != 0.0 {
            debug!(step, energy = report.heat_pushed, "heat pushed");
        }

        report
    }

    pub fn saved_states(&self) -> BTreeMap<String, SavedClimateState> {
        self.units
            .iter()
            .map(|unit| (unit.id.clone(), unit.controller.save()))
            .collect()
    }

    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    pub fn unit_status(&self, id: &str) -> Option<UnitStatus> {
        self.unit(id).map(|unit| unit.status(&self.world))
    }

    pub fn unit_statuses(&self) -> Vec<UnitStatus> {
        self.units
            .iter()
            .map(|unit| unit.status(&self.world))
            .collect()
    }

    pub fn fuel_cells(&self) -> Vec<FuelCellView> {
        self.fuel_cells.iter().map(FuelCell::view).collect()
    }

    pub fn world(&self) -> WorldView {
        self.world.view()
    }

    pub fn mode_counts(&self) -> HashMap<ClimateMode, usize> {
        let mut counts = HashMap::new();
        for unit in &self.units {
            *counts.entry(unit.mode()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use heatpump_common::{RoomConfig, SimulationConfig};

    use super::*;

    fn runtime(cooling: CoolingVariant, room_temp: f32, outdoor: f32) -> RuntimeConfig {
        RuntimeConfig {
            climate: ClimateConfig {
                interval_steps: 1,
                ..ClimateConfig::default()
            },
            simulation: SimulationConfig {
                outdoor_base_temp: outdoor,
                outdoor_amplitude: 0.0,
                leak_rate: 0.0,
                ..SimulationConfig::default()
            },
            rooms: vec![RoomConfig {
                id: "den".to_string(),
                cells: 21,
                initial_temp: room_temp,
                enclosed: true,
            }],
            units: vec![UnitConfig {
                id: "unit".to_string(),
                thing_id: 5,
                room: Some("den".to_string()),
                target_temp: Some(20.0),
                cooling,
            }],
            fuel_cells: vec![FuelCellConfig {
                id: "cell".to_string(),
                capacity: 10.0,
                stored: 5.0,
                drain_per_step: 1.0,
            }],
        }
    }

    fn room_temp(sim: &Simulation) -> f32 {
        sim.world().rooms[0].temperature
    }

    #[test]
    fn cold_room_is_heated() {
        let mut sim = Simulation::from_config(
            &runtime(CoolingVariant::Integrated, 15.0, 10.0),
            &BTreeMap::new(),
        )
        .unwrap();

        let report = sim.step();

        assert_eq!(
            report.mode_changes,
            vec![("unit".to_string(), ClimateMode::Heating)]
        );
        assert_eq!(report.heat_pushed, 21.0);
        assert!((room_temp(&sim) - 16.0).abs() < 1e-4);
    }

    #[test]
    fn integrated_unit_cools_hot_room() {
        let mut sim = Simulation::from_config(
            &runtime(CoolingVariant::Integrated, 30.0, 10.0),
            &BTreeMap::new(),
        )
        .unwrap();

        let report = sim.step();

        assert!(report.mode_changes.is_empty());
        assert_eq!(report.heat_pushed, -21.0);
        assert!((room_temp(&sim) - 29.0).abs() < 1e-4);
    }

    #[test]
    fn delegated_unit_cools_through_indoor_unit() {
        let mut sim = Simulation::from_config(
            &runtime(CoolingVariant::Delegated, 30.0, 10.0),
            &BTreeMap::new(),
        )
        .unwrap();

        let report = sim.step();

        assert_eq!(report.heat_pushed, -21.0);
        let status = sim.unit_status("unit").unwrap();
        assert!(status.status_text.ends_with("Indoor unit: cooling"));
    }

    #[test]
    fn saved_state_is_restored() {
        let mut saved = BTreeMap::new();
        saved.insert("unit".to_string(), SavedClimateState { is_heating: true });
        saved.insert("gone".to_string(), SavedClimateState { is_heating: true });

        let sim = Simulation::from_config(
            &runtime(CoolingVariant::Integrated, 20.0, 10.0),
            &saved,
        )
        .unwrap();

        assert_eq!(sim.unit("unit").unwrap().mode(), ClimateMode::Heating);
        assert_eq!(sim.saved_states().len(), 1);
    }

    #[test]
    fn frozen_outdoors_drops_restored_heating() {
        let mut saved = BTreeMap::new();
        saved.insert("unit".to_string(), SavedClimateState { is_heating: true });
        let mut sim = Simulation::from_config(
            &runtime(CoolingVariant::Delegated, 10.0, -30.0),
            &saved,
        )
        .unwrap();

        let status = sim.unit_status("unit").unwrap();
        assert_eq!(status.indicator.disabled_reason, Some("Outdoor temperature too low for heating"));

        let report = sim.step();
        assert_eq!(
            report.mode_changes,
            vec![("unit".to_string(), ClimateMode::Cooling)]
        );
        assert_eq!(report.heat_pushed, 0.0);
        assert!(sim
            .unit_status("unit")
            .unwrap()
            .status_text
            .contains("Heating unavailable below -25.0°C outdoor"));
    }

    #[test]
    fn unplaced_unit_is_not_ready() {
        let mut config = runtime(CoolingVariant::Integrated, 10.0, 10.0);
        config.units[0].room = None;
        let mut sim = Simulation::from_config(&config, &BTreeMap::new()).unwrap();

        let report = sim.step();

        assert!(report.mode_changes.is_empty());
        assert!(!sim.unit_status("unit").unwrap().ready);
    }

    #[test]
    fn fuel_cells_drain_each_step() {
        let mut sim = Simulation::from_config(
            &runtime(CoolingVariant::Integrated, 20.0, 10.0),
            &BTreeMap::new(),
        )
        .unwrap();
        assert_eq!(sim.fuel_cells()[0].fill_fraction, 0.5);

        for _ in 0..3 {
            sim.step();
        }

        let view = &sim.fuel_cells()[0];
        assert_eq!(view.stored, 2.0);
        assert!((view.fill_fraction - 0.2).abs() < 1e-6);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = runtime(CoolingVariant::Integrated, 20.0, 10.0);
        config.fuel_cells[0].capacity = 0.0;

        assert!(matches!(
            Simulation::from_config(&config, &BTreeMap::new()),
            Err(ConfigError::InvalidCapacity(_))
        ));
    }

    #[test]
    fn mode_counts_tally_units() {
        let sim = Simulation::from_config(
            &runtime(CoolingVariant::Integrated, 20.0, 10.0),
            &BTreeMap::new(),
        )
        .unwrap();

        assert_eq!(sim.mode_counts().get(&ClimateMode::Cooling), Some(&1));
    }
}
