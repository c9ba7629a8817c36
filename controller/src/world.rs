use std::f32::consts::TAU;

use serde::Serialize;

use heatpump_common::{RoomConfig, SimulationConfig};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    pub id: String,
    pub cells: u32,
    pub temperature: f32,
    pub enclosed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldView {
    pub step: u64,
    #[serde(rename = "outdoorTemp")]
    pub outdoor_temp: f32,
    pub rooms: Vec<Room>,
}

#[derive(Debug, Clone)]
pub struct World {
    config: SimulationConfig,
    step: u64,
    outdoor_temp: f32,
    rooms: Vec<Room>,
}

impl World {
    pub fn new(config: SimulationConfig, rooms: &[RoomConfig]) -> Self {
        let rooms = rooms
            .iter()
            .map(|room| Room {
                id: room.id.clone(),
                cells: room.cells.max(1),
                temperature: room.initial_temp,
                enclosed: room.enclosed,
            })
            .collect();

        let mut world = Self {
            outdoor_temp: config.outdoor_base_temp,
            config,
            step: 0,
            rooms,
        };
        world.outdoor_temp = world.outdoor_at(0);
        world
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn outdoor_temperature(&self) -> f32 {
        self.outdoor_temp
    }

    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == id)
    }

    pub fn enclosed_room_temperature(&self, id: &str) -> Option<f32> {
        self.room(id)
            .filter(|room| room.enclosed)
            .map(|room| room.temperature)
    }

    pub fn advance(&mut self) {
        self.step = self.step.saturating_add(1);
        self.outdoor_temp = self.outdoor_at(self.step);

        let outdoor = self.outdoor_temp;
        let leak = self.config.leak_rate;
        for room in &mut self.rooms {
            if room.enclosed {
                room.temperature += (outdoor - room.temperature) * leak;
            } else {
                room.temperature = outdoor;
            }
        }
    }

    pub fn push_heat(&mut self, id: &str, energy: f32) -> bool {
        let Some(room) = self
            .rooms
            .iter_mut()
            .find(|room| room.id == id && room.enclosed)
        else {
            return false;
        };
        room.temperature += energy / room.cells as f32;
        true
    }

    pub fn view(&self) -> WorldView {
        WorldView {
            step: self.step,
            outdoor_temp: self.outdoor_temp,
            rooms: self.rooms.clone(),
        }
    }

    fn outdoor_at(&self, step: u64) -> f32 {
        let period = self.config.outdoor_period_steps.max(1);
        let phase = (step % period) as f32 / period as f32;
        self.config.outdoor_base_temp + self.config.outdoor_amplitude * (phase * TAU).sin()
    }
}
