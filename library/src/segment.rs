use crate::Vector3;

/// One straight move. Fields are fixed once built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionSegment {
    target_feedrate: f32,
    carried_feedrate: f32,
    /// Feedrate the machine actually reached at the end. Starts out as the target.
    exit_feedrate: f32,
    start: Vector3,
    end: Vector3,
}

impl MotionSegment {
    pub fn new(target_feedrate: f32, carried_feedrate: f32, start: Vector3, end: Vector3) -> Self {
        Self { target_feedrate, carried_feedrate, exit_feedrate: target_feedrate, start, end }
    }

    /// Builds the segment that follows `previous`, carrying over the feedrate it ended at.
    /// Without a previous segment the machine starts from rest.
    pub fn following(previous: Option<&MotionSegment>, target_feedrate: f32, start: Vector3, end: Vector3) -> Self {
        let carried_feedrate = previous.map(|p| p.exit_feedrate).unwrap_or(0.0);
        Self::new(target_feedrate, carried_feedrate, start, end)
    }

    /// The same segment, recorded as having ended at `exit_feedrate`.
    pub fn reached(self, exit_feedrate: f32) -> Self {
        Self { exit_feedrate, ..self }
    }

    pub fn target_feedrate(&self) -> f32 { self.target_feedrate }
    pub fn carried_feedrate(&self) -> f32 { self.carried_feedrate }
    pub fn exit_feedrate(&self) -> f32 { self.exit_feedrate }
    pub fn start(&self) -> Vector3 { self.start }
    pub fn end(&self) -> Vector3 { self.end }
    pub fn travel(&self) -> Vector3 { self.end - self.start }

    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }
}

/// Previous, current and next segment of a job. The ends of a job have no neighbour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionWindow {
    pub previous: Option<MotionSegment>,
    pub current: MotionSegment,
    pub next: Option<MotionSegment>,
}

impl MotionWindow {
    pub fn new(previous: Option<MotionSegment>, current: MotionSegment, next: Option<MotionSegment>) -> Self {
        Self { previous, current, next }
    }

    /// A lone segment, starting and ending at rest.
    pub fn single(current: MotionSegment) -> Self {
        Self::new(None, current, None)
    }

    pub fn start(&self) -> Vector3 { self.current.start() }
    pub fn end(&self) -> Vector3 { self.current.end() }
    pub fn feedrate(&self) -> f32 { self.current.target_feedrate() }

    /// The previous segment, when it actually moved the machine.
    pub fn moving_previous(&self) -> Option<&MotionSegment> {
        self.previous.as_ref().filter(|p| !p.is_degenerate())
    }

    /// Velocity handed over by the previous segment. Zero at the start of a job.
    pub fn carried_feedrate(&self) -> f32 {
        match self.moving_previous() {
            Some(_) => self.current.carried_feedrate(),
            None => 0.0,
        }
    }
}
