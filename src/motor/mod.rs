// Joint control module for the two-wheel base
//
// Provides:
// - XL330 serial protocol implementation (Dynamixel Protocol 2.0 subset)
// - Two-joint velocity driver with per-joint command pacing
// - The JointInterface capability the control core drives

use tracing::info;

pub mod bus;
mod driver;

pub use bus::{BusError, Xl330Bus};
pub use driver::{JOINT_ID_LEFT, JOINT_ID_RIGHT, JOINT_SETTLE, MotorDriver};

/// One of the two independently driven wheels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joint {
    Left,
    Right,
}

impl Joint {
    pub fn index(self) -> usize {
        match self {
            Joint::Left => 0,
            Joint::Right => 1,
        }
    }
}

/// Capability the control core issues speed commands through. Sign is
/// direction, magnitude is rate; implementations don't report back.
pub trait JointInterface {
    fn set_joint_speed(&mut self, joint: Joint, speed: i32) -> Result<(), BusError>;
}

/// Joint sink that logs commands instead of driving hardware. Used for
/// `--sim` runs.
#[derive(Debug, Default)]
pub struct SimJoints;

impl JointInterface for SimJoints {
    fn set_joint_speed(&mut self, joint: Joint, speed: i32) -> Result<(), BusError> {
        info!("[sim] {:?} joint speed -> {}", joint, speed);
        Ok(())
    }
}
