use cnc_motion::{Spindle, TransportError};

/// Spindle without a hardware link of its own: only tracks and logs the requested state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoggedSpindle {
    enabled: bool,
    switches: u32,
}

impl LoggedSpindle {
    pub fn is_enabled(&self) -> bool { self.enabled }
    pub fn switches(&self) -> u32 { self.switches }

    fn set(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.switches += 1;
        }
        self.enabled = enabled;
        tracing::info!("spindle {}", if enabled { "enabled" } else { "disabled" });
    }
}

impl Spindle for LoggedSpindle {
    fn enable(&mut self) -> Result<(), TransportError> {
        self.set(true);
        Ok(())
    }

    fn disable(&mut self) -> Result<(), TransportError> {
        self.set(false);
        Ok(())
    }
}
