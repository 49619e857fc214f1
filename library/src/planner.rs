use embedded_hal::delay::DelayNs;
#[allow(unused_imports)]
use micromath::F32Ext;

use crate::{
    stepper_math::{step_interval_us, Ramp, StepIntervals, SECONDS_PER_MINUTE},
    Direction, LimitFault, MachineConfig, MotionWindow, MoveError, PlanError, Steppers, Transport,
    Vector3, XYZData, XYZId, XYZ_ID_LIST,
};

/// Everything needed to drive one segment, computed up front so that a move
/// either fails before the first pulse or runs with fixed timing.
#[derive(Clone, Debug, PartialEq)]
pub struct MovePlan {
    pub travel: Vector3,
    pub length: f32,
    pub directions: XYZData<Option<Direction>>,
    pub axis_steps: XYZData<u32>,
    /// Axis with the most steps. It steps on every virtual step.
    pub governing_axis: XYZId,
    pub total_steps: u32,
    pub target_feedrate: f32,
    pub entry_feedrate: f32,
    pub ramp: Ramp,
    pub ramp_steps: u32,
    pub start_interval_us: f32,
    pub final_interval_us: f32,
    pub min_interval_us: u32,
    pub limit_poll_steps: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveReport {
    pub steps: XYZData<u32>,
    pub elapsed_us: u64,
}

impl MovePlan {
    pub fn intervals(&self) -> StepIntervals {
        StepIntervals::new(
            self.total_steps,
            self.ramp_steps,
            self.start_interval_us,
            self.final_interval_us,
            self.min_interval_us,
        )
    }

    /// Feedrate at the end of the move, in units/min. Below the target when the ramp was cut short.
    pub fn reached_feedrate(&self) -> f32 {
        self.ramp.exit_speed * SECONDS_PER_MINUTE
    }

    /// Fails when finishing this move would take a step counter outside its range.
    pub fn check_range(&self, steppers: &Steppers) -> Result<(), PlanError> {
        let fits = steppers.zip_map(&self.directions, |stepper, direction| {
            let sign = direction.map(|d| d.sign()).unwrap_or(0) as i64;
            let end = stepper.get_position() as i64 + sign * *self.axis_steps.match_id(stepper.axis()) as i64;
            i32::try_from(end).is_ok()
        });
        if fits.all(|f| *f) { Ok(()) } else { Err(PlanError::OutOfRange) }
    }

    /// Shaft revolutions per axis for this move.
    pub fn revolutions(&self, steps_per_revolution: u32) -> Vector3 {
        self.axis_steps.map(|s| *s as f32 / steps_per_revolution as f32)
    }
}

fn interval_for(speed: f32, config: &MachineConfig) -> Result<f32, PlanError> {
    let us = step_interval_us(speed, config.steps_per_unit);
    if !us.is_finite() || us <= 0.0 || us > u32::MAX as f32 {
        return Err(PlanError::InvalidTiming);
    }
    Ok(us.max(config.min_step_interval_us as f32))
}

/// Entry feedrate: what the previous segment hands over, never below the cruise floor.
fn entry_feedrate(window: &MotionWindow, travel: &Vector3, config: &MachineConfig) -> Result<f32, PlanError> {
    let mut carried = window.carried_feedrate();
    if config.junction_blending {
        if let Some(previous) = window.moving_previous() {
            carried *= previous.travel().cosine(travel).max(0.0);
        }
    }
    config.clamp_feedrate(carried.max(config.cruise_floor))
}

/// Plans the current segment of `window`. Pure: the same window and config always give the same plan.
pub fn plan(window: &MotionWindow, config: &MachineConfig) -> Result<MovePlan, PlanError> {
    let (start, end) = (window.start(), window.end());
    if !start.is_finite() || !end.is_finite() {
        return Err(PlanError::NonFinite);
    }
    let travel = end - start;
    let length = travel.magnitude();
    if !length.is_finite() {
        return Err(PlanError::NonFinite);
    }
    if length == 0.0 {
        return Err(PlanError::Degenerate);
    }
    let target_feedrate = config.clamp_feedrate(window.feedrate())?;

    let directions = travel.map(|d| Direction::of(*d));
    let proportions = travel.map(|d| d.abs() / length);
    let projected = travel.map(|d| (d.abs() * config.steps_per_unit).round());
    if !projected.all(|s| *s <= i32::MAX as f32) {
        return Err(PlanError::OutOfRange);
    }
    let axis_steps = projected.map(|s| *s as u32);
    let governing_axis = axis_steps.max_axis();
    let total_steps = *axis_steps.match_id(governing_axis);
    if total_steps == 0 {
        return Err(PlanError::Degenerate);
    }

    let entry_feedrate = entry_feedrate(window, &travel, config)?;
    let ramp = Ramp::between(entry_feedrate, target_feedrate, config.acceleration, length);

    let governing_share = *proportions.match_id(governing_axis);
    let start_interval_us = interval_for(ramp.entry_speed * governing_share, config)?;
    let final_interval_us = interval_for(ramp.exit_speed * governing_share, config)?;
    let ramp_steps = proportions
        .map(|p| (ramp.distance * p * config.steps_per_unit).round() as u32)
        .iter()
        .copied()
        .max()
        .unwrap_or(0)
        .min(total_steps);

    let plan = MovePlan {
        travel,
        length,
        directions,
        axis_steps,
        governing_axis,
        total_steps,
        target_feedrate,
        entry_feedrate,
        ramp,
        ramp_steps,
        start_interval_us,
        final_interval_us,
        min_interval_us: config.min_step_interval_us,
        limit_poll_steps: config.limit_poll_steps.max(1),
    };
    tracing::debug!(
        "planned {:?}: steps {:?} on {} axis, revolutions {:?}, {} -> {} units/min over {} ramp steps, interval {}us -> {}us",
        plan.travel,
        plan.axis_steps,
        plan.governing_axis,
        plan.revolutions(config.steps_per_revolution),
        plan.entry_feedrate,
        plan.target_feedrate,
        plan.ramp_steps,
        plan.start_interval_us,
        plan.final_interval_us,
    );
    Ok(plan)
}

/// Runs a plan against the actuators. Limit sensors of moving axes are queried
/// every `limit_poll_steps` virtual steps; a triggered sensor stops the move with
/// the pulses already issued left in place.
pub fn execute<T: Transport, D: DelayNs>(
    plan: &MovePlan,
    steppers: &mut Steppers,
    transport: &mut T,
    delay: &mut D,
) -> Result<MoveReport, MoveError> {
    plan.check_range(steppers)?;
    let total = plan.total_steps as u64;
    let mut report = MoveReport::default();

    for (index, interval) in plan.intervals().enumerate() {
        if index as u32 % plan.limit_poll_steps == 0 {
            for axis in XYZ_ID_LIST {
                if plan.directions.match_id(axis).is_some() && steppers.match_id_mut(axis).query_limit(transport)? {
                    return Err(MoveError::Limit(LimitFault { axis, steps: report.steps }));
                }
            }
        }

        let virtual_step = index as u64 + 1;
        for axis in XYZ_ID_LIST {
            let Some(direction) = *plan.directions.match_id(axis) else { continue };
            let due = virtual_step * *plan.axis_steps.match_id(axis) as u64 / total;
            let issued = report.steps.match_id_mut(axis);
            if due > *issued as u64 {
                steppers.match_id_mut(axis).step(direction, transport)?;
                *issued += 1;
            }
        }

        delay.delay_us(interval);
        report.elapsed_us += interval as u64;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::mocks::{RecordingDelay, RecordingTransport};
    use crate::MotionSegment;
    use super::*;

    fn window(feedrate: f32, start: (f32, f32, f32), end: (f32, f32, f32)) -> MotionWindow {
        MotionWindow::single(MotionSegment::new(
            feedrate,
            0.0,
            Vector3::new(start.0, start.1, start.2),
            Vector3::new(end.0, end.1, end.2),
        ))
    }

    fn coarse() -> MachineConfig {
        MachineConfig { steps_per_unit: 10.0, ..Default::default() }
    }

    #[test]
    fn straight_x_move() {
        let plan = plan(&window(100.0, (0.0, 0.0, 0.0), (10.0, 0.0, 0.0)), &MachineConfig::default()).unwrap();
        assert_eq!(plan.target_feedrate, 100.0);
        assert_eq!(plan.travel, Vector3::new(10.0, 0.0, 0.0));
        assert_eq!(plan.directions, XYZData::new(Some(Direction::Positive), None, None));
        assert_eq!(plan.axis_steps, XYZData::new(12800, 0, 0));
        assert_eq!(plan.governing_axis, XYZId::X);
    }

    #[test]
    fn straight_x_move_only_steps_x() {
        let config = coarse();
        let plan = plan(&window(100.0, (0.0, 0.0, 0.0), (10.0, 0.0, 0.0)), &config).unwrap();
        let mut steppers = Steppers::with_inversion(&config.invert_direction);
        let mut transport = RecordingTransport::default();
        let mut delay = RecordingDelay::default();
        let report = execute(&plan, &mut steppers, &mut transport, &mut delay).unwrap();
        assert_eq!(report.steps, XYZData::new(100, 0, 0));
        assert!(transport.sent.iter().all(|m| m == "X1"));
        assert_eq!(transport.sent.len(), 100);
        assert_eq!(steppers.positions(), XYZData::new(100, 0, 0));
        assert_eq!(delay.total_ns, report.elapsed_us * 1000);
    }

    #[test]
    fn degenerate_segment_issues_nothing() {
        let config = MachineConfig::default();
        assert_eq!(plan(&window(100.0, (1.0, 2.0, 3.0), (1.0, 2.0, 3.0)), &config), Err(PlanError::Degenerate));
        // shorter than half a step
        assert_eq!(plan(&window(100.0, (0.0, 0.0, 0.0), (0.0001, 0.0, 0.0)), &config), Err(PlanError::Degenerate));
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let config = MachineConfig::default();
        assert_eq!(plan(&window(100.0, (0.0, 0.0, 0.0), (f32::NAN, 0.0, 0.0)), &config), Err(PlanError::NonFinite));
        assert_eq!(plan(&window(100.0, (f32::MAX, 0.0, 0.0), (-f32::MAX, 0.0, 0.0)), &config), Err(PlanError::NonFinite));
    }

    #[test]
    fn oversized_moves_are_rejected() {
        let config = MachineConfig::default();
        assert_eq!(plan(&window(100.0, (0.0, 0.0, 0.0), (4_000_000.0, 0.0, 0.0)), &config), Err(PlanError::OutOfRange));
    }

    #[test]
    fn move_past_counter_range_issues_nothing() {
        let config = coarse();
        let plan = plan(&window(100.0, (0.0, 0.0, 0.0), (-1.0, 1.0, 0.0)), &config).unwrap();
        let mut steppers = Steppers::with_inversion(&config.invert_direction);
        steppers.y.set_position(i32::MAX - 5);
        let mut transport = RecordingTransport::default();
        let err = execute(&plan, &mut steppers, &mut transport, &mut RecordingDelay::default()).unwrap_err();
        assert_eq!(err, MoveError::Plan(PlanError::OutOfRange));
        assert!(transport.sent.is_empty());
        assert!(transport.queries.is_empty());

        steppers.y.set_position(i32::MAX - 10);
        let report = execute(&plan, &mut steppers, &mut transport, &mut RecordingDelay::default()).unwrap();
        assert_eq!(report.steps, XYZData::new(10, 10, 0));
        assert_eq!(steppers.y.get_position(), i32::MAX);
    }

    #[test]
    fn reached_feedrate_of_cut_short_ramp() {
        let config = coarse();
        let plan = plan(&window(1_000_000.0, (0.0, 0.0, 0.0), (0.5, 0.0, 0.0)), &config).unwrap();
        // 5 units/s from rest, 0.5 units at 100 units/s²: v² = 25 + 100
        assert_relative_eq!(plan.reached_feedrate(), 125.0f32.sqrt() * 60.0, epsilon = 0.01);
        assert!(plan.reached_feedrate() < plan.target_feedrate);
    }

    #[test]
    fn planning_is_idempotent() {
        let config = MachineConfig::default();
        let w = window(450.0, (1.0, -2.0, 0.5), (4.0, 3.0, -1.5));
        let first = plan(&w, &config).unwrap();
        let second = plan(&w, &config).unwrap();
        assert_eq!(first, second);
        assert!(first.intervals().eq(second.intervals()));
    }

    #[test]
    fn positive_delta_always_steps_positive() {
        let config = MachineConfig::default();
        for (start, end) in [(0.0, 1.0), (-5.0, -4.0), (3.0, 100.0)] {
            let plan = plan(&window(100.0, (start, start, start), (end, end, end)), &config).unwrap();
            assert!(plan.directions.all(|d| *d == Some(Direction::Positive)));
        }
        let plan = plan(&window(100.0, (1.0, 0.0, 0.0), (0.0, 0.0, 0.0)), &config).unwrap();
        assert_eq!(plan.directions.x, Some(Direction::Negative));
    }

    #[test]
    fn feedrate_is_clamped_into_range() {
        let config = MachineConfig { max_feedrate: 1000.0, ..coarse() };
        let plan = plan(&window(50_000.0, (0.0, 0.0, 0.0), (10.0, 0.0, 0.0)), &config).unwrap();
        assert_eq!(plan.target_feedrate, 1000.0);
        assert!(plan.target_feedrate >= config.min_feedrate && plan.target_feedrate <= config.max_feedrate);
        assert_eq!(
            super::plan(&window(-1.0, (0.0, 0.0, 0.0), (10.0, 0.0, 0.0)), &config),
            Err(PlanError::InvalidFeedrate)
        );
    }

    #[test]
    fn equal_step_counts_prefer_earlier_axis() {
        let plan = plan(&window(100.0, (0.0, 0.0, 0.0), (0.0, 2.0, -2.0)), &coarse()).unwrap();
        assert_eq!(plan.governing_axis, XYZId::Y);
        let plan = super::plan(&window(100.0, (0.0, 0.0, 0.0), (3.0, -3.0, 3.0)), &coarse()).unwrap();
        assert_eq!(plan.governing_axis, XYZId::X);
    }

    #[test]
    fn ramp_from_floor_to_target() {
        let config = MachineConfig { cruise_floor: 300.0, acceleration: 100.0, ..Default::default() };
        let plan = plan(&window(900.0, (0.0, 0.0, 0.0), (10.0, 0.0, 0.0)), &config).unwrap();
        // 5 -> 15 units/s at 100 units/s²
        assert_relative_eq!(plan.ramp.duration, 0.1, epsilon = 1e-5);
        assert_relative_eq!(plan.ramp.distance, 1.0, epsilon = 1e-4);
        assert_eq!(plan.ramp_steps, 1280);
        assert_relative_eq!(plan.start_interval_us, 1_000_000.0 / (5.0 * 1280.0), epsilon = 0.01);
        assert_relative_eq!(plan.final_interval_us, 1_000_000.0 / (15.0 * 1280.0), epsilon = 0.01);
        let delays: Vec<u32> = plan.intervals().collect();
        assert!(delays.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(*delays.last().unwrap(), 52);
    }

    #[test]
    fn diagonal_uses_governing_share() {
        let config = MachineConfig { cruise_floor: 600.0, ..coarse() };
        let plan = plan(&window(600.0, (0.0, 0.0, 0.0), (3.0, 4.0, 0.0)), &config).unwrap();
        assert_eq!(plan.governing_axis, XYZId::Y);
        // 10 units/s along the path, 8 units/s on Y
        assert_relative_eq!(plan.final_interval_us, 1_000_000.0 / 80.0, epsilon = 0.01);
        assert_eq!(plan.ramp_steps, 0);
    }

    #[test]
    fn axes_end_on_their_exact_share() {
        let config = coarse();
        let plan = plan(&window(300.0, (0.0, 0.0, 0.0), (3.7, -1.3, 0.9)), &config).unwrap();
        let mut steppers = Steppers::with_inversion(&config.invert_direction);
        let mut transport = RecordingTransport::default();
        let report = execute(&plan, &mut steppers, &mut transport, &mut RecordingDelay::default()).unwrap();
        assert_eq!(report.steps, XYZData::new(37, 13, 9));
        assert_eq!(steppers.positions(), XYZData::new(37, -13, 9));
    }

    #[test]
    fn limit_fault_keeps_issued_steps() {
        let config = coarse();
        let plan = plan(&window(100.0, (0.0, 0.0, 0.0), (10.0, 0.0, 0.0)), &config).unwrap();
        assert_eq!(plan.total_steps, 100);
        let mut steppers = Steppers::with_inversion(&config.invert_direction);
        let mut transport = RecordingTransport::default();
        transport.trip_limit(XYZId::X, 5);
        let err = execute(&plan, &mut steppers, &mut transport, &mut RecordingDelay::default()).unwrap_err();
        assert_eq!(err, MoveError::Limit(LimitFault { axis: XYZId::X, steps: XYZData::new(5, 0, 0) }));
        assert_eq!(steppers.x.get_position(), 5);
        assert_eq!(transport.sent.len(), 5);
        assert!(steppers.x.limit_triggered());
    }

    #[test]
    fn idle_axes_are_not_polled() {
        let config = coarse();
        let plan = plan(&window(100.0, (0.0, 0.0, 0.0), (0.0, 1.0, 0.0)), &config).unwrap();
        let mut steppers = Steppers::with_inversion(&config.invert_direction);
        let mut transport = RecordingTransport::default();
        transport.trip_limit(XYZId::X, 0);
        execute(&plan, &mut steppers, &mut transport, &mut RecordingDelay::default()).unwrap();
        assert!(transport.queries.iter().all(|q| q == "YL"));
    }

    #[test]
    fn transport_fault_aborts_move() {
        let config = coarse();
        let plan = plan(&window(100.0, (0.0, 0.0, 0.0), (1.0, 0.0, 0.0)), &config).unwrap();
        let mut steppers = Steppers::with_inversion(&config.invert_direction);
        let mut transport = RecordingTransport { fail_after: Some(3), ..Default::default() };
        let err = execute(&plan, &mut steppers, &mut transport, &mut RecordingDelay::default()).unwrap_err();
        assert_eq!(err, MoveError::Transport(crate::TransportError::Unreachable));
        assert_eq!(steppers.x.get_position(), 3);
    }

    #[test]
    fn poll_cadence_is_configurable() {
        let config = MachineConfig { limit_poll_steps: 4, ..coarse() };
        let plan = plan(&window(100.0, (0.0, 0.0, 0.0), (1.0, 0.0, 0.0)), &config).unwrap();
        let mut steppers = Steppers::with_inversion(&config.invert_direction);
        let mut transport = RecordingTransport::default();
        execute(&plan, &mut steppers, &mut transport, &mut RecordingDelay::default()).unwrap();
        // virtual steps 0, 4, 8 of 10
        assert_eq!(transport.queries.len(), 3);
    }

    #[test]
    fn junction_blending_scales_carried_feedrate() {
        let config = MachineConfig { junction_blending: true, cruise_floor: 100.0, ..coarse() };
        let first = MotionSegment::new(1200.0, 0.0, Vector3::default(), Vector3::new(1.0, 0.0, 0.0));
        let turn = MotionSegment::following(Some(&first), 1200.0, first.end(), Vector3::new(1.0, 1.0, 0.0));
        let straight = MotionSegment::following(Some(&first), 1200.0, first.end(), Vector3::new(2.0, 0.0, 0.0));

        let turned = plan(&MotionWindow::new(Some(first), turn, None), &config).unwrap();
        assert_relative_eq!(turned.entry_feedrate, 100.0, epsilon = 0.01);
        let kept = plan(&MotionWindow::new(Some(first), straight, None), &config).unwrap();
        assert_relative_eq!(kept.entry_feedrate, 1200.0, epsilon = 0.01);
    }
}
