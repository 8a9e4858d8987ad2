//! Frame counter that holds overlay construction back until the image
//! layer's first paint has been committed.
//!
//! The overlay is built from the image node's rendered geometry. Waiting a
//! fixed number of frame ticks after that paint guarantees the host has
//! presented the image before any box appears, so the two never show up a
//! frame apart.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum GateState {
    /// No image paint yet
    #[default]
    Idle,
    /// Image painted; counting down frames
    Waiting { remaining: u8 },
    /// Overlay may be built
    Released,
}

#[derive(Debug, Clone, Default)]
pub struct PaintGate {
    state: GateState,
}

impl PaintGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the image layer's first paint and start counting `frames`.
    /// Later calls are ignored until [`PaintGate::reset`].
    pub fn arm(&mut self, frames: u8) {
        if self.state == GateState::Idle {
            self.state = if frames == 0 {
                GateState::Released
            } else {
                GateState::Waiting { remaining: frames }
            };
        }
    }

    /// Advance one frame. Returns true on the tick that releases the gate.
    pub fn tick(&mut self) -> bool {
        match self.state {
            GateState::Waiting { remaining } if remaining <= 1 => {
                self.state = GateState::Released;
                true
            }
            GateState::Waiting { remaining } => {
                self.state = GateState::Waiting {
                    remaining: remaining - 1,
                };
                false
            }
            GateState::Idle | GateState::Released => false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.state == GateState::Released
    }

    pub fn reset(&mut self) {
        self.state = GateState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_releases_on_second_tick() {
        let mut gate = PaintGate::new();
        assert!(!gate.tick());
        gate.arm(2);
        assert!(!gate.tick());
        assert!(!gate.is_released());
        assert!(gate.tick());
        assert!(gate.is_released());
        assert!(!gate.tick());
    }

    #[test]
    fn test_rearm_is_ignored_until_reset() {
        let mut gate = PaintGate::new();
        gate.arm(2);
        gate.tick();
        gate.arm(2);
        assert!(gate.tick());

        gate.reset();
        assert!(!gate.is_released());
        gate.arm(0);
        assert!(gate.is_released());
    }
}
