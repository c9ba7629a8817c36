const PHASE_SALT: u32 = 169_495_093;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickCadence {
    interval_steps: u64,
}

impl TickCadence {
    pub fn new(interval_steps: u64) -> Self {
        Self {
            interval_steps: interval_steps.max(1),
        }
    }

    pub fn interval_steps(&self) -> u64 {
        self.interval_steps
    }

    pub fn phase(&self, thing_id: u32) -> u64 {
        hash_offset(thing_id) % self.interval_steps
    }

    pub fn is_due(&self, step: u64, thing_id: u32) -> bool {
        step.wrapping_add(hash_offset(thing_id)) % self.interval_steps == 0
    }
}

pub fn hash_offset(thing_id: u32) -> u64 {
    let seed = thing_id;
    let mixed = seed
        ^ PHASE_SALT
            .wrapping_add(0x9e37_79b9)
            .wrapping_add(seed << 6)
            .wrapping_add(seed >> 2);
    u64::from(mixed)
}
