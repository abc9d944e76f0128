use clap::Parser;
use tracing_subscriber::EnvFilter;

use diffbot_runtime::config;
use diffbot_runtime::motor::{MotorDriver, SimJoints};
use diffbot_runtime::runtime::{self, Runtime};

/// Motion-control runtime for the two-wheel base
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Serial port for the XL330 joint bus
    #[arg(long, default_value = config::MOTOR_PORT)]
    port: String,

    /// Log joint commands instead of driving hardware
    #[arg(long)]
    sim: bool,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    let result = if args.sim {
        runtime::run(Runtime::new(SimJoints)).await
    } else {
        let mut driver = match MotorDriver::new(&args.port) {
            Ok(driver) => driver,
            Err(e) => {
                eprintln!("Failed to open joint bus on {}: {}", args.port, e);
                std::process::exit(1);
            }
        };
        if let Err(e) = driver.initialize() {
            eprintln!("Failed to initialize joints: {}", e);
            std::process::exit(1);
        }
        runtime::run(Runtime::new(driver)).await
    };

    if let Err(e) = result {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
