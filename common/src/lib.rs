pub mod cadence;
pub mod climate;
pub mod config;
pub mod error;
pub mod resource_bar;
pub mod types;

pub use cadence::TickCadence;
pub use climate::{
    format_temperature, ClimateController, ClimateSite, CoolingProvider, DelegatedCooling,
    IntegratedCooling,
};
pub use config::{
    ClimateConfig, CoolingVariant, FuelCellConfig, RoomConfig, RuntimeConfig, SimulationConfig,
    UnitConfig,
};
pub use error::{ConfigError, StateError};
pub use resource_bar::{fill_fraction, ResourceBar};
pub use types::{ClimateAction, ClimateMode, ModeIndicator, Readings, SavedClimateState, UnitStatus};
