// Motion-control core for the two-wheel base
//
// Provides:
// - Differential mixing (forward/turn intent -> wheel speeds)
// - Directional command interpretation (alias -> timed phase plan)
// - Joystick interpretation with deadband suppression
// - Non-blocking plan execution

pub mod direction;
pub mod executor;
pub mod joystick;
pub mod mixer;

pub use direction::{MotionPhase, MotionPlan, plan_motion};
pub use executor::MotionExecutor;
pub use joystick::apply_sample;
pub use mixer::{SPEED_MAX, WheelCommand, mix, rescale_axis};
