// High-level driver for the two wheel joints
//
// Wraps the XL330 bus with the initialization handshake and the pacing
// the servos need between velocity writes.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::bus::{BusError, OperatingMode, Register, Xl330Bus};
use super::{Joint, JointInterface};

/// Servo IDs for the two wheel joints (as configured in the servos)
pub const JOINT_ID_LEFT: u8 = 1;
pub const JOINT_ID_RIGHT: u8 = 2;

/// Minimum gap between consecutive commands to the same joint. The servo
/// drops back-to-back writes on the shared half-duplex link.
pub const JOINT_SETTLE: Duration = Duration::from_millis(10);

/// Velocity driver for the LEFT/RIGHT wheel joints
pub struct MotorDriver {
    bus: Xl330Bus,
    joint_ids: [u8; 2], // [left, right]
    last_issue: [Option<Instant>; 2],
}

impl MotorDriver {
    /// Create a new driver, connecting to the specified serial port
    pub fn new(port: &str) -> Result<Self, BusError> {
        Self::with_joint_ids(port, [JOINT_ID_LEFT, JOINT_ID_RIGHT])
    }

    /// Create with custom servo IDs
    pub fn with_joint_ids(port: &str, joint_ids: [u8; 2]) -> Result<Self, BusError> {
        info!("Opening joint bus on {}", port);
        let bus = Xl330Bus::open(port)?;
        Ok(Self {
            bus,
            joint_ids,
            last_issue: [None; 2],
        })
    }

    /// Initialize the joints for velocity control
    ///
    /// This must be called before sending speed commands. It disables
    /// torque, sets velocity mode, and re-enables torque.
    pub fn initialize(&mut self) -> Result<(), BusError> {
        info!("Initializing joints {:?} for velocity control", self.joint_ids);

        // First, check that both joints are reachable
        for &id in &self.joint_ids {
            match self.bus.ping(id) {
                Ok(true) => debug!("Joint {} responding", id),
                Ok(false) => {
                    warn!("Joint {} not responding to ping", id);
                    return Err(BusError::Timeout { id });
                }
                Err(e) => return Err(e),
            }
        }

        // Disable torque (required before changing operating mode)
        for &id in &self.joint_ids {
            self.bus.disable_torque(id)?;
        }

        // Set velocity mode
        for &id in &self.joint_ids {
            self.bus.set_operating_mode(id, OperatingMode::Velocity)?;
        }

        // Enable torque
        for &id in &self.joint_ids {
            self.bus.enable_torque(id)?;
        }

        info!("Joints initialized successfully");
        Ok(())
    }

    /// Wait out the remainder of the settle gap for one joint
    fn pace(&self, index: usize) {
        if let Some(issued_at) = self.last_issue[index] {
            let elapsed = issued_at.elapsed();
            if elapsed < JOINT_SETTLE {
                thread::sleep(JOINT_SETTLE - elapsed);
            }
        }
    }

    /// Send a speed command to both joints in one bus transaction
    pub fn set_wheel_speeds(&mut self, left: i32, right: i32) -> Result<(), BusError> {
        debug!("Setting wheel speeds: left={}, right={}", left, right);

        self.pace(Joint::Left.index());
        self.pace(Joint::Right.index());

        let data = [(self.joint_ids[0], left), (self.joint_ids[1], right)];
        self.bus.sync_write_i32(Register::GoalVelocity, &data)?;

        let now = Instant::now();
        self.last_issue = [Some(now), Some(now)];
        Ok(())
    }

    /// Stop both joints immediately
    pub fn stop(&mut self) -> Result<(), BusError> {
        info!("Stopping all joints");
        self.set_wheel_speeds(0, 0)
    }

    /// Disable torque on both joints (allows free movement)
    pub fn disable_torque(&mut self) -> Result<(), BusError> {
        info!("Disabling torque on all joints");
        for &id in &self.joint_ids {
            self.bus.disable_torque(id)?;
        }
        Ok(())
    }

    /// Read current speeds back from the joints
    pub fn get_wheel_speeds(&mut self) -> Result<(i32, i32), BusError> {
        let left = self.bus.get_velocity(self.joint_ids[0])?;
        let right = self.bus.get_velocity(self.joint_ids[1])?;
        Ok((left, right))
    }

    /// Check if a joint is reachable
    pub fn ping(&mut self, id: u8) -> Result<bool, BusError> {
        self.bus.ping(id)
    }

    /// Get the servo IDs
    pub fn joint_ids(&self) -> [u8; 2] {
        self.joint_ids
    }
}

impl JointInterface for MotorDriver {
    fn set_joint_speed(&mut self, joint: Joint, speed: i32) -> Result<(), BusError> {
        let index = joint.index();
        self.pace(index);
        self.bus.set_velocity(self.joint_ids[index], speed)?;
        self.last_issue[index] = Some(Instant::now());
        Ok(())
    }
}

impl Drop for MotorDriver {
    fn drop(&mut self) {
        // Try to stop the wheels when the driver goes away (safety measure)
        if let Err(e) = self.stop() {
            warn!("Failed to stop joints on drop: {}", e);
        }
    }
}
