use serde::{Deserialize, Serialize};

use crate::error::StateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClimateMode {
    Heating,
    #[default]
    Cooling,
}

impl ClimateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heating => "HEATING",
            Self::Cooling => "COOLING",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Heating => "Heating",
            Self::Cooling => "Cooling",
        }
    }

    pub fn is_heating(self) -> bool {
        self == Self::Heating
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClimateAction {
    ModeChanged { from: ClimateMode, to: ClimateMode },
    PushHeat(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    pub room_temp: f32,
    pub target_temp: f32,
    pub outdoor_temp: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeIndicator {
    pub label: &'static str,
    pub description: &'static str,
    #[serde(rename = "disabledReason")]
    pub disabled_reason: Option<&'static str>,
}

impl ModeIndicator {
    pub fn is_enabled(&self) -> bool {
        self.disabled_reason.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SavedClimateState {
    #[serde(rename = "isHeating", default)]
    pub is_heating: bool,
}

impl SavedClimateState {
    pub fn from_value(value: serde_json::Value) -> Result<Self, StateError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Result<serde_json::Value, StateError> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitStatus {
    pub id: String,
    pub mode: &'static str,
    #[serde(rename = "canHeat")]
    pub can_heat: bool,
    pub ready: bool,
    #[serde(rename = "statusText")]
    pub status_text: String,
    pub indicator: ModeIndicator,
}
