use tracing::debug;

use crate::{
    cadence::TickCadence,
    config::ClimateConfig,
    types::{ClimateAction, ClimateMode, ModeIndicator, Readings, SavedClimateState, UnitStatus},
};

const HEATING_DESCRIPTION: &str =
    "Heat pump is in heating mode. Outdoor unit absorbing heat from outside air.";
const COOLING_DESCRIPTION: &str =
    "Heat pump is in cooling mode. Outdoor unit exhausting heat outside.";
const HEATING_BLOCKED_REASON: &str = "Outdoor temperature too low for heating";

pub trait ClimateSite {
    fn room_temperature(&self) -> Option<f32>;
    fn target_temperature(&self) -> Option<f32>;
    fn outdoor_temperature(&self) -> f32;

    fn readings(&self) -> Option<Readings> {
        let target_temp = self.target_temperature()?;
        let room_temp = self.room_temperature()?;
        Some(Readings {
            room_temp,
            target_temp,
            outdoor_temp: self.outdoor_temperature(),
        })
    }
}

pub trait CoolingProvider {
    fn cool(&mut self, readings: &Readings, actions: &mut Vec<ClimateAction>);

    fn inspect(&self) -> Option<String> {
        None
    }
}

impl<C: CoolingProvider + ?Sized> CoolingProvider for Box<C> {
    fn cool(&mut self, readings: &Readings, actions: &mut Vec<ClimateAction>) {
        (**self).cool(readings, actions);
    }

    fn inspect(&self) -> Option<String> {
        (**self).inspect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratedCooling {
    energy_per_interval: f32,
}

impl IntegratedCooling {
    pub fn new(energy_per_interval: f32) -> Self {
        Self {
            energy_per_interval: energy_per_interval.max(0.0),
        }
    }
}

impl CoolingProvider for IntegratedCooling {
    fn cool(&mut self, readings: &Readings, actions: &mut Vec<ClimateAction>) {
        if readings.room_temp > readings.target_temp && self.energy_per_interval > 0.0 {
            actions.push(ClimateAction::PushHeat(-self.energy_per_interval));
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelegatedCooling;

impl CoolingProvider for DelegatedCooling {
    fn cool(&mut self, _readings: &Readings, _actions: &mut Vec<ClimateAction>) {}
}

#[derive(Debug, Clone)]
pub struct ClimateController<C> {
    config: ClimateConfig,
    cadence: TickCadence,
    thing_id: u32,
    mode: ClimateMode,
    cooling: C,
}

impl<C: CoolingProvider> ClimateController<C> {
    pub fn new(mut config: ClimateConfig, thing_id: u32, cooling: C) -> Self {
        config.sanitize();
        Self {
            cadence: TickCadence::new(config.interval_steps),
            config,
            thing_id,
            mode: ClimateMode::Cooling,
            cooling,
        }
    }

    pub fn mode(&self) -> ClimateMode {
        self.mode
    }

    pub fn is_heating(&self) -> bool {
        self.mode.is_heating()
    }

    pub fn thing_id(&self) -> u32 {
        self.thing_id
    }

    pub fn cadence(&self) -> TickCadence {
        self.cadence
    }

    pub fn config(&self) -> &ClimateConfig {
        &self.config
    }

    pub fn can_heat(&self, outdoor_temp: f32) -> bool {
        outdoor_temp >= self.config.min_heating_outdoor_temp
    }

    fn demands_heat(&self, readings: &Readings) -> bool {
        readings.room_temp < readings.target_temp - self.config.mode_threshold
    }

    fn demands_cooling(&self, readings: &Readings) -> bool {
        readings.room_temp > readings.target_temp + self.config.mode_threshold
    }

    pub fn select_mode(&self, readings: &Readings) -> ClimateMode {
        let should_heat = self.demands_heat(readings);
        let should_cool = self.demands_cooling(readings);
        let can_heat = self.can_heat(readings.outdoor_temp);

        match self.mode {
            ClimateMode::Heating if should_cool => ClimateMode::Cooling,
            ClimateMode::Cooling if should_heat && can_heat => ClimateMode::Heating,
            ClimateMode::Heating if !can_heat => ClimateMode::Cooling,
            current => current,
        }
    }

    pub fn tick<S>(&mut self, step: u64, site: &S) -> Vec<ClimateAction>
    where
        S: ClimateSite + ?Sized,
    {
        if !self.cadence.is_due(step, self.thing_id) {
            return Vec::new();
        }
        self.update(site)
    }

    pub fn update<S>(&mut self, site: &S) -> Vec<ClimateAction>
    where
        S: ClimateSite + ?Sized,
    {
        match site.readings() {
            Some(readings) => self.evaluate(readings),
            None => Vec::new(),
        }
    }

    pub fn evaluate(&mut self, readings: Readings) -> Vec<ClimateAction> {
        let mut actions = Vec::new();

        let next = self.select_mode(&readings);
        if next != self.mode {
            debug!(
                thing_id = self.thing_id,
                from = self.mode.as_str(),
                to = next.as_str(),
                room = readings.room_temp,
                target = readings.target_temp,
                outdoor = readings.outdoor_temp,
                "heat pump mode switch"
            );
            actions.push(ClimateAction::ModeChanged {
                from: self.mode,
                to: next,
            });
            self.mode = next;
        }

        match self.mode {
            ClimateMode::Heating => {
                if self.can_heat(readings.outdoor_temp) && self.config.heat_per_interval > 0.0 {
                    actions.push(ClimateAction::PushHeat(self.config.heat_per_interval));
                }
            }
            ClimateMode::Cooling => self.cooling.cool(&readings, &mut actions),
        }

        actions
    }

    pub fn save(&self) -> SavedClimateState {
        SavedClimateState {
            is_heating: self.is_heating(),
        }
    }

    pub fn load(&mut self, state: SavedClimateState) {
        self.mode = if state.is_heating {
            ClimateMode::Heating
        } else {
            ClimateMode::Cooling
        };
    }

    pub fn status_text<S>(&self, site: &S) -> String
    where
        S: ClimateSite + ?Sized,
    {
        let outdoor_temp = site.outdoor_temperature();
        let mut lines = vec![format!("Mode: {}", self.mode.label())];

        let readings = site.readings();
        if let Some(readings) = &readings {
            lines.push(format!(
                "Room: {} / Target: {}",
                format_temperature(readings.room_temp),
                format_temperature(readings.target_temp)
            ));
        }

        lines.push(format!("Outdoor: {}", format_temperature(outdoor_temp)));

        let blocked = readings
            .as_ref()
            .is_some_and(|readings| self.demands_heat(readings) && !self.can_heat(outdoor_temp));
        if blocked {
            lines.push(format!(
                "Heating unavailable below {} outdoor",
                format_temperature(self.config.min_heating_outdoor_temp)
            ));
        }

        if let Some(extra) = self.cooling.inspect() {
            let extra = extra.trim_end();
            if !extra.is_empty() {
                lines.push(extra.to_string());
            }
        }

        lines.join("\n")
    }

    pub fn mode_indicator(&self, outdoor_temp: f32) -> ModeIndicator {
        let description = match self.mode {
            ClimateMode::Heating => HEATING_DESCRIPTION,
            ClimateMode::Cooling => COOLING_DESCRIPTION,
        };
        let disabled_reason = (self.is_heating() && !self.can_heat(outdoor_temp))
            .then_some(HEATING_BLOCKED_REASON);

        ModeIndicator {
            label: self.mode.label(),
            description,
            disabled_reason,
        }
    }

    pub fn status<S>(&self, id: &str, site: &S) -> UnitStatus
    where
        S: ClimateSite + ?Sized,
    {
        let outdoor_temp = site.outdoor_temperature();
        UnitStatus {
            id: id.to_string(),
            mode: self.mode.as_str(),
            can_heat: self.can_heat(outdoor_temp),
            ready: site.readings().is_some(),
            status_text: self.status_text(site),
            indicator: self.mode_indicator(outdoor_temp),
        }
    }
}

pub fn format_temperature(celsius: f32) -> String {
    format!("{celsius:.1}°C")
}
