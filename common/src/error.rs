use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("capacity must be a finite value greater than zero (got {0})")]
    InvalidCapacity(f32),
    #[error("mode threshold must be a finite value greater than zero (got {0})")]
    InvalidThreshold(f32),
    #[error("{field} must be finite (got {value})")]
    NonFinite { field: &'static str, value: f32 },
    #[error("evaluation interval must be at least one step")]
    ZeroInterval,
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },
    #[error("unit '{unit}' references unknown room '{room}'")]
    UnknownRoom { unit: String, room: String },
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("malformed controller state: {0}")]
    Decode(#[from] serde_json::Error),
}
