// Motion plan execution
//
// Drains a plan phase by phase as an explicit state machine (remaining
// phases + current phase deadline) so the control loop never blocks on a
// phase duration. Issuing a phase writes both joints and records the
// speeds in DriveState.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::control::direction::{MotionPhase, MotionPlan};
use crate::messages::DriveState;
use crate::motor::{BusError, Joint, JointInterface};

pub struct MotionExecutor {
    pending: VecDeque<MotionPhase>,
    deadline: Option<Instant>,
}

impl MotionExecutor {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            deadline: None,
        }
    }

    /// True once the current plan has fully drained and its last phase
    /// duration has elapsed.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.deadline.is_none()
    }

    /// Start executing a plan, issuing its first phase immediately.
    ///
    /// An empty plan is a no-op. Superseding an active plan forces both
    /// joints to rest before the new plan's first phase.
    pub fn begin<J: JointInterface>(
        &mut self,
        plan: MotionPlan,
        now: Instant,
        joints: &mut J,
        state: &mut DriveState,
    ) -> Result<(), BusError> {
        if plan.is_empty() {
            return Ok(());
        }
        if !self.is_idle() {
            debug!("Superseding active plan; resting joints first");
            self.pending.clear();
            self.deadline = None;
            issue(MotionPhase::rest(), joints, state)?;
        }
        self.pending = plan.into();
        self.tick(now, joints, state)
    }

    /// Advance the state machine: a no-op until the current phase deadline
    /// passes, then the next phase is issued.
    pub fn tick<J: JointInterface>(
        &mut self,
        now: Instant,
        joints: &mut J,
        state: &mut DriveState,
    ) -> Result<(), BusError> {
        if let Some(deadline) = self.deadline {
            if now < deadline {
                return Ok(());
            }
            self.deadline = None;
        }

        if let Some(phase) = self.pending.pop_front() {
            debug!(
                "Phase ({}, {}) for {}ms, {} remaining",
                phase.left,
                phase.right,
                phase.duration_ms,
                self.pending.len()
            );
            issue(phase, joints, state)?;
            if phase.duration_ms > 0 {
                self.deadline = Some(now + Duration::from_millis(phase.duration_ms));
            }
        }
        Ok(())
    }
}

fn issue<J: JointInterface>(
    phase: MotionPhase,
    joints: &mut J,
    state: &mut DriveState,
) -> Result<(), BusError> {
    joints.set_joint_speed(Joint::Left, phase.left)?;
    joints.set_joint_speed(Joint::Right, phase.right)?;
    state.left = phase.left;
    state.right = phase.right;
    Ok(())
}
