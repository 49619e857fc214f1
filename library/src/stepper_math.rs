#[allow(unused_imports)]
use micromath::F32Ext;

/// Feedrates are per minute, the step scheduler works in seconds.
pub const SECONDS_PER_MINUTE: f32 = 60.0;
const MICROS_PER_SECOND: f32 = 1_000_000.0;

/// Time and end velocity after covering `d` from velocity `v` under constant acceleration `a`.
/// A negative `a` decelerates.
pub fn physics_acceleration(a: f32, v: f32, d: f32) -> (f32, f32) {
    let v2 = v * v;
    let t = -v + ((2.0 * a * d) + v2).max(0.0).sqrt();
    let t_s = t / a;
    (t_s, (a*t_s) + v)
}

/// The velocity change at the start of a move, in path units and seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ramp {
    pub entry_speed: f32,
    /// Speed at the end of the ramp. Lower than requested when the segment is too short to get there.
    pub exit_speed: f32,
    pub acceleration: f32,
    pub duration: f32,
    pub distance: f32,
}

impl Ramp {
    /// Ramp from `entry_feedrate` to `exit_feedrate` (units/min) at `acceleration`
    /// (units/s²), cut short at `length` units.
    pub fn between(entry_feedrate: f32, exit_feedrate: f32, acceleration: f32, length: f32) -> Self {
        let v0 = entry_feedrate / SECONDS_PER_MINUTE;
        let v1 = exit_feedrate / SECONDS_PER_MINUTE;
        let a = if v1 >= v0 { acceleration } else { -acceleration };
        let t = (v1 - v0) / a;
        let d = v0 * t + a * t * t / 2.0;
        if d <= length {
            return Self { entry_speed: v0, exit_speed: v1, acceleration: a, duration: t, distance: d };
        }
        let (t, v) = physics_acceleration(a, v0, length);
        Self { entry_speed: v0, exit_speed: v, acceleration: a, duration: t, distance: length }
    }
}

/// Delay between pulses for an axis moving at `speed` units/s, `steps_per_unit` steps each.
pub fn step_interval_us(speed: f32, steps_per_unit: f32) -> f32 {
    MICROS_PER_SECOND / (speed * steps_per_unit)
}

/// Inter-step delays for one move: a linear change from the start to the final
/// interval over the ramp, then the final interval until the last step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepIntervals {
    step: u32,
    total_steps: u32,
    ramp_steps: u32,
    start_us: f32,
    delta_us: f32,
    final_us: f32,
    floor_us: u32,
}

impl StepIntervals {
    pub fn new(total_steps: u32, ramp_steps: u32, start_us: f32, final_us: f32, floor_us: u32) -> Self {
        let ramp_steps = ramp_steps.min(total_steps);
        let delta_us = if ramp_steps == 0 { 0.0 } else { (final_us - start_us) / ramp_steps as f32 };
        Self { step: 0, total_steps, ramp_steps, start_us, delta_us, final_us, floor_us }
    }

    pub fn delta_us(&self) -> f32 {
        self.delta_us
    }
}

impl Iterator for StepIntervals {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.step == self.total_steps {
            return None;
        }
        // ramping
        let interval = if self.step < self.ramp_steps {
            self.start_us + self.delta_us * self.step as f32
        }
        // at speed
        else {
            self.final_us
        };
        self.step += 1;
        Some((interval.round() as u32).max(self.floor_us))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total_steps - self.step) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for StepIntervals {}
