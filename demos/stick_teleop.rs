// Keyboard joystick: WASD deflects the stick, R/F change deflection, Q quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::info;

const DEFLECTIONS: [i32; 3] = [30, 60, 100]; // stick units, out of 100
const INPUT_TIMEOUT_MS: u64 = 100; // Recenter the stick after this much time with no input

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher("diffbot/cmd/stick").await?;

    info!("Controls: WASD=stick, R/F=deflection, Q=quit");
    info!("Deflection: LOW");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut deflection_idx: usize = 0;

    // Persistent stick position
    let mut x = 0;
    let mut y = 0;
    let mut last_stick_input = Instant::now();

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    // Stick deflection - update position and refresh timestamp
                    KeyCode::Char('w') if pressed => {
                        y = DEFLECTIONS[deflection_idx];
                        last_stick_input = Instant::now();
                    }
                    KeyCode::Char('s') if pressed => {
                        y = -DEFLECTIONS[deflection_idx];
                        last_stick_input = Instant::now();
                    }
                    KeyCode::Char('a') if pressed => {
                        x = -DEFLECTIONS[deflection_idx];
                        last_stick_input = Instant::now();
                    }
                    KeyCode::Char('d') if pressed => {
                        x = DEFLECTIONS[deflection_idx];
                        last_stick_input = Instant::now();
                    }

                    // Deflection control
                    KeyCode::Char('r') if pressed => {
                        deflection_idx = (deflection_idx + 1).min(2);
                        print_deflection(deflection_idx);
                    }
                    KeyCode::Char('f') if pressed => {
                        deflection_idx = deflection_idx.saturating_sub(1);
                        print_deflection(deflection_idx);
                    }

                    // Quit
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        // Recenter the stick if no input for INPUT_TIMEOUT_MS
        if last_stick_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            x = 0;
            y = 0;
        }

        // Always publish at ~50Hz; the runtime's deadband suppresses the
        // repeats
        let sample = json!({ "x": x, "y": y });
        publisher.put(sample.to_string()).await?;
    }

    Ok(())
}

fn print_deflection(idx: usize) {
    let label = ["LOW", "MED", "HIGH"][idx];
    info!("Deflection: {}", label);
}
