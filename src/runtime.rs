// Control loop tying the command channels to the joints
//
// One cooperative context: stick samples are drained every tick, a
// directional query is accepted only while no plan is running (later
// queries wait in the channel), and the executor advances on the same
// tick. Commands are never preempted mid-plan.

use std::time::{Duration, Instant};

use tokio::time::interval;
use tracing::{info, warn};
use zenoh::query::Query;

use crate::config::{LOOP_HZ, TOPIC_CMD_MOVE, TOPIC_CMD_STICK, TOPIC_STATE_WHEELS};
use crate::control::{MotionExecutor, apply_sample, plan_motion};
use crate::messages::{DirectionCommand, DriveState, JoystickSample};
use crate::motor::{BusError, JointInterface};

pub struct Runtime<J: JointInterface> {
    joints: J,
    executor: MotionExecutor,
    state: DriveState,
}

impl<J: JointInterface> Runtime<J> {
    pub fn new(joints: J) -> Self {
        Self {
            joints,
            executor: MotionExecutor::new(),
            state: DriveState::default(),
        }
    }

    /// Process one joystick sample
    fn on_stick_sample(&mut self, sample: JoystickSample) -> Result<(), BusError> {
        apply_sample(sample, &mut self.state, &mut self.joints)?;
        Ok(())
    }

    /// Interpret and start a directional command
    fn on_direction(&mut self, cmd: &DirectionCommand, now: Instant) -> Result<(), BusError> {
        let plan = plan_motion(cmd);
        if plan.is_empty() {
            info!("Unrecognized direction {:?}; ignoring", cmd.dir);
            return Ok(());
        }
        info!("Executing {:?} ({} phases, steps={})", cmd.dir, plan.len(), cmd.steps);
        self.executor
            .begin(plan, now, &mut self.joints, &mut self.state)
    }

    fn tick(&mut self, now: Instant) -> Result<(), BusError> {
        self.executor.tick(now, &mut self.joints, &mut self.state)
    }
}

pub async fn run<J: JointInterface>(
    mut runtime: Runtime<J>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up command channels...");
    let queryable = session.declare_queryable(TOPIC_CMD_MOVE).await?;
    let stick_sub = session.declare_subscriber(TOPIC_CMD_STICK).await?;
    let pub_wheels = session.declare_publisher(TOPIC_STATE_WHEELS).await?;

    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));
    let mut published = runtime.state;

    info!("Runtime started: {}Hz loop", LOOP_HZ);
    info!("Direction queries on: {}", TOPIC_CMD_MOVE);
    info!("Stick samples on: {}", TOPIC_CMD_STICK);
    info!("Wheel state on: {}", TOPIC_STATE_WHEELS);

    loop {
        tick.tick().await;
        let now = Instant::now();

        // 1. Process pending stick samples in arrival order
        while let Ok(Some(sample)) = stick_sub.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<JoystickSample>(&payload) {
                Ok(stick) => runtime.on_stick_sample(stick)?,
                Err(e) => {
                    warn!("Failed to parse stick sample: {}", e);
                }
            }
        }

        // 2. Accept one directional command once the previous plan is done;
        //    anything arriving mid-plan waits in the channel
        if runtime.executor.is_idle() {
            if let Ok(Some(query)) = queryable.try_recv() {
                handle_direction_query(&mut runtime, query, now).await?;
            }
        }

        // 3. Advance the executor
        runtime.tick(now)?;

        // 4. Publish wheel state when it changes
        if runtime.state != published {
            pub_wheels
                .put(serde_json::to_string(&runtime.state)?)
                .await?;
            published = runtime.state;
        }
    }
}

async fn handle_direction_query<J: JointInterface>(
    runtime: &mut Runtime<J>,
    query: Query,
    now: Instant,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let params = query.parameters().as_str();
    info!("Received direction query: {:?}", params);

    match DirectionCommand::from_query(params) {
        Ok(cmd) => {
            runtime.on_direction(&cmd, now)?;
            query.reply(query.key_expr().clone(), "OK").await?;
        }
        Err(e) => {
            warn!("Rejecting direction query: {}", e);
            query.reply_err(e.to_string()).await?;
        }
    }
    Ok(())
}
