use embedded_hal::delay::DelayNs;

use crate::{
    parse, planner, ArgumentMnumonic, CommandId, CommandMnumonics, ConfigError, DispatchError, GcodeCommand,
    LimitFault, MachineConfig, MotionSegment, MotionWindow, MoveError, MoveReport, ParseError, Steppers,
    Transport, TransportError, Vector3, XYZData,
};

const MS_PER_SECOND: f32 = 1000.0;

/// Spindle or tool power, signalled by M3/M4.
pub trait Spindle {
    fn enable(&mut self) -> Result<(), TransportError>;
    fn disable(&mut self) -> Result<(), TransportError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Moved(MoveReport),
    Dwelled { ms: u32 },
    Spindle { enabled: bool },
}

/// Runs one command line at a time to completion. Owns the axis actuators and
/// the hardware links; motion is refused while a limit fault is latched.
pub struct Machine<T: Transport, D: DelayNs, S: Spindle> {
    pub steppers: Steppers,
    config: MachineConfig,
    transport: T,
    delay: D,
    spindle: S,
    feed_rate: f32,
    previous: Option<MotionSegment>,
    fault: Option<LimitFault>,
}

impl<T: Transport, D: DelayNs, S: Spindle> Machine<T, D, S> {
    pub fn new(config: MachineConfig, transport: T, delay: D, spindle: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            steppers: Steppers::with_inversion(&config.invert_direction),
            feed_rate: config.default_feedrate,
            config,
            transport,
            delay,
            spindle,
            previous: None,
            fault: None,
        })
    }

    pub fn config(&self) -> &MachineConfig { &self.config }
    pub fn transport(&self) -> &T { &self.transport }
    pub fn transport_mut(&mut self) -> &mut T { &mut self.transport }
    pub fn delay(&self) -> &D { &self.delay }
    pub fn spindle(&self) -> &S { &self.spindle }
    pub fn feed_rate(&self) -> f32 { self.feed_rate }
    pub fn fault(&self) -> Option<LimitFault> { self.fault }

    /// Current position in machine units, from the actuators' step counters.
    pub fn position(&self) -> Vector3 {
        self.steppers.position_units(self.config.steps_per_unit)
    }

    pub fn clear_fault(&mut self) {
        if let Some(fault) = self.fault.take() {
            tracing::info!("limit fault on {} axis cleared", fault.axis);
        }
        self.steppers.iter_mut().for_each(|s| s.clear_limit());
    }

    /// Parses and executes one command line. Any failure leaves the machine
    /// ready for the next line, at rest.
    pub fn dispatch(&mut self, line: &str) -> Result<Outcome, DispatchError> {
        let result = parse(line)
            .map_err(DispatchError::from)
            .and_then(|command| self.execute(&command));
        if let Err(err) = &result {
            tracing::debug!("command rejected: {}", err);
            self.previous = None;
        }
        result
    }

    pub fn execute(&mut self, command: &GcodeCommand) -> Result<Outcome, DispatchError> {
        tracing::debug!("dispatching {} with {} arguments", command.command_id, command.arguments.len());
        match command.command_id {
            CommandId { mnumonic: CommandMnumonics::G, code: 0 } => {
                self.move_command(command.target(), self.config.max_feedrate)
            },
            CommandId { mnumonic: CommandMnumonics::G, code: 1 } => {
                let feed_rate = Self::feed_argument(command).unwrap_or(self.feed_rate);
                self.feed_rate = self.config.clamp_feedrate(feed_rate)?;
                self.move_command(command.target(), self.feed_rate)
            },
            CommandId { mnumonic: CommandMnumonics::G, code: 4 } => self.dwell(command),
            CommandId { mnumonic: CommandMnumonics::M, code: 3 } => self.set_spindle(true),
            CommandId { mnumonic: CommandMnumonics::M, code: 4 } => self.set_spindle(false),
            id => Err(DispatchError::Unsupported(id)),
        }
    }

    fn feed_argument(command: &GcodeCommand) -> Option<f32> {
        command.argument(ArgumentMnumonic::F)
    }

    fn move_command(&mut self, target: XYZData<Option<f32>>, feed_rate: f32) -> Result<Outcome, DispatchError> {
        if let Some(fault) = self.fault {
            return Err(DispatchError::Faulted(fault.axis));
        }
        let start = self.position();
        let end = start.zip_map(&target, |current, target| target.unwrap_or(*current));
        let segment = MotionSegment::following(self.previous.as_ref(), feed_rate, start, end);
        let window = MotionWindow::new(self.previous, segment, None);
        let plan = planner::plan(&window, &self.config)?;

        match planner::execute(&plan, &mut self.steppers, &mut self.transport, &mut self.delay) {
            Ok(report) => {
                tracing::info!("moved to {:?} at {} units/min, {:?} steps in {}us", end, plan.target_feedrate, report.steps, report.elapsed_us);
                self.previous = Some(segment.reached(plan.reached_feedrate()));
                Ok(Outcome::Moved(report))
            },
            Err(MoveError::Limit(fault)) => {
                tracing::warn!("limit fault on {} axis after {:?} steps, motion halted", fault.axis, fault.steps);
                self.fault = Some(fault);
                Err(DispatchError::LimitFault(fault))
            },
            Err(err) => Err(err.into()),
        }
    }

    fn dwell(&mut self, command: &GcodeCommand) -> Result<Outcome, DispatchError> {
        let ms = command
            .argument(ArgumentMnumonic::P)
            .or_else(|| command.argument(ArgumentMnumonic::S).map(|s| s * MS_PER_SECOND))
            .ok_or(ParseError::MissingParameter(ArgumentMnumonic::P.into()))?;
        if !ms.is_finite() || ms < 0.0 || ms > u32::MAX as f32 {
            return Err(ParseError::InvalidDwell.into());
        }
        let ms = ms as u32;
        self.delay.delay_ms(ms);
        self.previous = None;
        tracing::info!("dwelled {}ms", ms);
        Ok(Outcome::Dwelled { ms })
    }

    fn set_spindle(&mut self, enabled: bool) -> Result<Outcome, DispatchError> {
        if enabled { self.spindle.enable()?; } else { self.spindle.disable()?; }
        self.previous = None;
        tracing::info!("spindle {}", if enabled { "on" } else { "off" });
        Ok(Outcome::Spindle { enabled })
    }
}
