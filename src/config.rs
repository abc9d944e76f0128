// Loop rate, topics, motor configuration

// Control loop frequency. Phase durations are hundreds of ms, so a 10ms
// tick keeps phase boundaries well within one duty cycle.
pub const LOOP_HZ: u64 = 100;

// Zenoh topics
pub const TOPIC_CMD_MOVE: &str = "diffbot/cmd/move"; // directional command queries
pub const TOPIC_CMD_STICK: &str = "diffbot/cmd/stick"; // joystick samples
pub const TOPIC_STATE_WHEELS: &str = "diffbot/state/wheels"; // last speeds sent to the joints

// Motor configuration
// Serial port for the XL330 joint bus
pub const MOTOR_PORT: &str = "/dev/ttyUSB0";
