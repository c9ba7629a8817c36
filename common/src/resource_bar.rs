use crate::error::ConfigError;

/// Display fraction for a stored quantity. Callers own the `capacity > 0`
/// guarantee; the result is not clamped.
pub fn fill_fraction(stored: f32, capacity: f32) -> f32 {
    stored / capacity
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceBar {
    stored: f32,
    capacity: f32,
}

impl ResourceBar {
    pub fn new(stored: f32, capacity: f32) -> Result<Self, ConfigError> {
        validate_capacity(capacity)?;
        Ok(Self {
            stored: sanitize_stored(stored),
            capacity,
        })
    }

    pub fn stored(&self) -> f32 {
        self.stored
    }

    pub fn capacity(&self) -> f32 {
        self.capacity
    }

    pub fn fill_fraction(&self) -> f32 {
        fill_fraction(self.stored, self.capacity)
    }

    pub fn is_overfilled(&self) -> bool {
        self.stored > self.capacity
    }

    pub fn set_capacity(&mut self, capacity: f32) -> Result<(), ConfigError> {
        validate_capacity(capacity)?;
        self.capacity = capacity;
        Ok(())
    }

    pub fn draw(&mut self, amount: f32) -> f32 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let drawn = amount.min(self.stored);
        self.stored -= drawn;
        drawn
    }

    pub fn is_empty(&self) -> bool {
        self.stored <= 0.0
    }
}

fn validate_capacity(capacity: f32) -> Result<(), ConfigError> {
    if capacity.is_finite() && capacity > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidCapacity(capacity))
    }
}

fn sanitize_stored(stored: f32) -> f32 {
    if stored.is_finite() {
        stored.max(0.0)
    } else {
        0.0
    }
}
