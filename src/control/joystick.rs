// Joystick stream interpretation
//
// Rescales one analog sample, mixes it, and gates the result per wheel so
// stick jitter doesn't flood the joint bus. A commanded full stop always
// goes through.

use tracing::debug;

use crate::control::mixer::{WheelCommand, mix, rescale_axis};
use crate::messages::{DriveState, JoystickSample};
use crate::motor::{BusError, Joint, JointInterface};

/// Suppression threshold: a wheel update within this distance of the last
/// sent value is dropped, unless the new value is exactly zero.
pub const DEADBAND: i32 = 5;

fn should_apply(new: i32, last: i32) -> bool {
    (new - last).abs() > DEADBAND || new == 0
}

/// Apply one stick sample: mix it into wheel speeds and issue whichever
/// wheel commands clear the suppression policy, recording them in `state`.
///
/// Returns the computed command (pre-suppression) either way. Axis values
/// outside [-100, 100] are clamped, never rejected.
pub fn apply_sample<J: JointInterface>(
    sample: JoystickSample,
    state: &mut DriveState,
    joints: &mut J,
) -> Result<WheelCommand, BusError> {
    let turn = rescale_axis(sample.x);
    let forward = rescale_axis(sample.y);
    let cmd = mix(forward, turn);
    debug!(
        "Stick ({}, {}) -> wheels ({}, {})",
        sample.x, sample.y, cmd.left, cmd.right
    );

    if should_apply(cmd.left, state.left) {
        joints.set_joint_speed(Joint::Left, cmd.left)?;
        state.left = cmd.left;
    }
    if should_apply(cmd.right, state.right) {
        joints.set_joint_speed(Joint::Right, cmd.right)?;
        state.right = cmd.right;
    }

    Ok(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingJoints {
        calls: Vec<(Joint, i32)>,
    }

    impl JointInterface for RecordingJoints {
        fn set_joint_speed(&mut self, joint: Joint, speed: i32) -> Result<(), BusError> {
            self.calls.push((joint, speed));
            Ok(())
        }
    }

    fn sample(x: i32, y: i32) -> JoystickSample {
        JoystickSample { x, y }
    }

    #[test]
    fn test_suppression_threshold() {
        // The gate itself: within 5 of the last value stays silent, past 5
        // goes through, zero always goes through
        assert!(!should_apply(103, 100));
        assert!(should_apply(106, 100));
        assert!(!should_apply(100, 100));
        assert!(should_apply(0, 2));
        assert!(should_apply(0, 0));
    }

    #[test]
    fn test_center_sample_is_rest_and_always_applied() {
        let mut state = DriveState { left: 2, right: -4 };
        let mut joints = RecordingJoints::default();

        let cmd = apply_sample(sample(0, 0), &mut state, &mut joints).unwrap();
        assert_eq!(cmd, WheelCommand::new(0, 0));
        // Deltas are within the deadband, but zero bypasses it
        assert_eq!(joints.calls, vec![(Joint::Left, 0), (Joint::Right, 0)]);
        assert_eq!(state, DriveState { left: 0, right: 0 });
    }

    #[test]
    fn test_repeated_sample_is_idempotent() {
        let mut state = DriveState::default();
        let mut joints = RecordingJoints::default();

        // Pure turn: x=10 -> turn 30 -> wheels (30, -30)
        apply_sample(sample(10, 0), &mut state, &mut joints).unwrap();
        assert_eq!(joints.calls.len(), 2);
        assert_eq!(state, DriveState { left: 30, right: -30 });

        // Same sample again: both deltas are zero, nothing is issued
        apply_sample(sample(10, 0), &mut state, &mut joints).unwrap();
        assert_eq!(joints.calls.len(), 2);

        // A one-unit wiggle stays inside the deadband too
        apply_sample(sample(11, 0), &mut state, &mut joints).unwrap();
        assert_eq!(joints.calls.len(), 2);
        assert_eq!(state, DriveState { left: 30, right: -30 });
    }

    #[test]
    fn test_wheels_gate_independently() {
        let mut state = DriveState { left: 30, right: -30 };
        let mut joints = RecordingJoints::default();

        // turn 33, forward 3 -> left 36 (delta 6, sent), right -30 (delta 0,
        // suppressed)
        apply_sample(sample(11, 1), &mut state, &mut joints).unwrap();
        assert_eq!(joints.calls, vec![(Joint::Left, 36)]);
        assert_eq!(state, DriveState { left: 36, right: -30 });
    }

    #[test]
    fn test_out_of_range_sample_is_clamped() {
        let mut state = DriveState::default();
        let mut joints = RecordingJoints::default();

        let cmd = apply_sample(sample(1000, 0), &mut state, &mut joints).unwrap();
        assert_eq!(cmd, WheelCommand::new(300, -300));
        assert_eq!(state, DriveState { left: 300, right: -300 });
    }

    #[test]
    fn test_forward_axis_maps_to_both_wheels() {
        let mut state = DriveState::default();
        let mut joints = RecordingJoints::default();

        // Full forward deflection, no turn
        let cmd = apply_sample(sample(0, 100), &mut state, &mut joints).unwrap();
        assert_eq!(cmd, WheelCommand::new(300, 300));
        assert_eq!(joints.calls, vec![(Joint::Left, 300), (Joint::Right, 300)]);
    }
}
