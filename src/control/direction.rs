// Directional command interpretation
//
// Maps a symbolic direction (plus repeat count) to an ordered sequence of
// timed wheel-speed phases. The alias table and maneuver shapes are data;
// the interpreter itself is a pure function.

use crate::messages::DirectionCommand;

/// Wheel speed used by the directional maneuvers.
pub const BASE_SPEED: i32 = 200;

/// Duration of one maneuver phase before `steps` scaling.
pub const BASE_PHASE_MS: u64 = 600;

/// Fixed duration of a `custom` phase.
pub const CUSTOM_PHASE_MS: u64 = 500;

/// Raw speed used for `custom` when an override is absent.
pub const CUSTOM_DEFAULT_SPEED: i32 = 90;

/// One fixed-duration interval of constant wheel speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionPhase {
    pub left: i32,
    pub right: i32,
    pub duration_ms: u64,
}

impl MotionPhase {
    pub fn new(left: i32, right: i32, duration_ms: u64) -> Self {
        Self {
            left,
            right,
            duration_ms,
        }
    }

    /// Terminal zero-speed phase; brings the base to rest without waiting.
    pub fn rest() -> Self {
        Self::new(0, 0, 0)
    }
}

/// Ordered phase sequence for one command execution.
pub type MotionPlan = Vec<MotionPhase>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Maneuver {
    Forward,
    Backward,
    Left,
    Right,
    TurnAround,
    Stop,
    Custom,
}

/// Accepted direction aliases. Lookup is exact match on the lowercased,
/// space-normalized value.
const ALIASES: &[(&str, Maneuver)] = &[
    ("forward", Maneuver::Forward),
    ("go", Maneuver::Forward),
    ("goforward", Maneuver::Forward),
    ("go_forward", Maneuver::Forward),
    ("go front", Maneuver::Forward),
    ("go_front", Maneuver::Forward),
    ("front", Maneuver::Forward),
    ("backward", Maneuver::Backward),
    ("back", Maneuver::Backward),
    ("gobackward", Maneuver::Backward),
    ("go back", Maneuver::Backward),
    ("go_back", Maneuver::Backward),
    ("left", Maneuver::Left),
    ("go left", Maneuver::Left),
    ("go_left", Maneuver::Left),
    ("right", Maneuver::Right),
    ("go right", Maneuver::Right),
    ("go_right", Maneuver::Right),
    ("turnaround", Maneuver::TurnAround),
    ("turn_around", Maneuver::TurnAround),
    ("turn around", Maneuver::TurnAround),
    ("go around left", Maneuver::TurnAround),
    ("stop", Maneuver::Stop),
    ("halt", Maneuver::Stop),
    ("custom", Maneuver::Custom),
];

impl Maneuver {
    fn lookup(dir: &str) -> Option<Self> {
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == dir)
            .map(|&(_, m)| m)
    }

    /// Wheel-speed sign pattern, one entry per phase. Empty for the
    /// maneuvers that don't follow the timed-phase shape.
    fn pattern(self) -> &'static [(i32, i32)] {
        match self {
            Maneuver::Forward => &[(1, 1)],
            Maneuver::Backward => &[(-1, -1)],
            Maneuver::Left => &[(-1, 1)],
            Maneuver::Right => &[(1, -1)],
            Maneuver::TurnAround => &[(1, 1), (-1, 1), (-1, 1), (1, 1)],
            Maneuver::Stop | Maneuver::Custom => &[],
        }
    }
}

/// Interpret a directional command into a motion plan.
///
/// Unrecognized directions produce an empty plan (a silent no-op, not an
/// error). `steps` scales phase duration only; it never changes how many
/// phases a maneuver has. Every plan except `custom` and `stop` ends with
/// a zero-speed phase so the base returns to rest on its own.
pub fn plan_motion(cmd: &DirectionCommand) -> MotionPlan {
    let Some(maneuver) = Maneuver::lookup(&cmd.dir) else {
        return Vec::new();
    };

    let duration_ms = BASE_PHASE_MS * u64::from(cmd.steps);

    match maneuver {
        Maneuver::Stop => vec![MotionPhase::rest()],
        // No trailing rest phase: a custom command leaves the wheels
        // running until the next command says otherwise.
        Maneuver::Custom => vec![MotionPhase::new(
            cmd.m1.unwrap_or(CUSTOM_DEFAULT_SPEED),
            cmd.m2.unwrap_or(CUSTOM_DEFAULT_SPEED),
            CUSTOM_PHASE_MS,
        )],
        _ => {
            let pattern = maneuver.pattern();
            let mut plan = Vec::with_capacity(pattern.len() + 1);
            for &(sign_left, sign_right) in pattern {
                plan.push(MotionPhase::new(
                    sign_left * BASE_SPEED,
                    sign_right * BASE_SPEED,
                    duration_ms,
                ));
            }
            plan.push(MotionPhase::rest());
            plan
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(dir: &str, steps: u32) -> DirectionCommand {
        DirectionCommand {
            dir: dir.to_string(),
            steps,
            m1: None,
            m2: None,
        }
    }

    #[test]
    fn test_forward_single_step() {
        let plan = plan_motion(&cmd("forward", 1));
        assert_eq!(
            plan,
            vec![MotionPhase::new(200, 200, 600), MotionPhase::rest()]
        );
    }

    #[test]
    fn test_steps_scale_duration_not_speed() {
        let plan = plan_motion(&cmd("forward", 3));
        assert_eq!(
            plan,
            vec![MotionPhase::new(200, 200, 1800), MotionPhase::rest()]
        );
    }

    #[test]
    fn test_backward_and_pivots() {
        assert_eq!(plan_motion(&cmd("back", 1))[0], MotionPhase::new(-200, -200, 600));
        assert_eq!(plan_motion(&cmd("left", 1))[0], MotionPhase::new(-200, 200, 600));
        assert_eq!(plan_motion(&cmd("right", 1))[0], MotionPhase::new(200, -200, 600));
    }

    #[test]
    fn test_turnaround_topology() {
        let plan = plan_motion(&cmd("turnaround", 2));
        let speeds: Vec<(i32, i32)> = plan.iter().map(|p| (p.left, p.right)).collect();
        assert_eq!(
            speeds,
            vec![(200, 200), (-200, 200), (-200, 200), (200, 200), (0, 0)]
        );
        // steps scales every timed phase, but not the phase count
        assert!(plan[..4].iter().all(|p| p.duration_ms == 1200));
        assert_eq!(plan[4].duration_ms, 0);
    }

    #[test]
    fn test_stop_is_a_single_rest_phase() {
        assert_eq!(plan_motion(&cmd("stop", 1)), vec![MotionPhase::rest()]);
        assert_eq!(plan_motion(&cmd("halt", 5)), vec![MotionPhase::rest()]);
    }

    #[test]
    fn test_custom_has_no_trailing_rest() {
        let plan = plan_motion(&DirectionCommand {
            dir: "custom".to_string(),
            steps: 1,
            m1: Some(150),
            m2: Some(-150),
        });
        assert_eq!(plan, vec![MotionPhase::new(150, -150, 500)]);
    }

    #[test]
    fn test_custom_defaults() {
        let plan = plan_motion(&cmd("custom", 1));
        assert_eq!(plan, vec![MotionPhase::new(90, 90, 500)]);
    }

    #[test]
    fn test_unrecognized_is_empty() {
        assert!(plan_motion(&cmd("bogus", 1)).is_empty());
    }

    #[test]
    fn test_every_alias_resolves() {
        for (alias, _) in ALIASES {
            assert!(
                !plan_motion(&cmd(alias, 1)).is_empty(),
                "alias {:?} produced no plan",
                alias
            );
        }
    }

    #[test]
    fn test_multiword_aliases() {
        assert_eq!(plan_motion(&cmd("go left", 1))[0], MotionPhase::new(-200, 200, 600));
        assert_eq!(
            plan_motion(&cmd("go around left", 1)).len(),
            5 // four timed phases plus rest
        );
    }
}
