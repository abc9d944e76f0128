// One-shot directional command sender
//
// Usage: cargo run --example move_cmd -- <dir> [steps]
// Example: cargo run --example move_cmd -- forward 2

use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let dir = std::env::args().nth(1).unwrap_or_else(|| "stop".to_string());
    let steps = std::env::args().nth(2).unwrap_or_else(|| "1".to_string());

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    let selector = format!("diffbot/cmd/move?dir={}&steps={}", dir, steps);
    info!("Querying: {}", selector);

    let replies = session.get(selector.as_str()).await?;
    while let Ok(reply) = replies.recv_async().await {
        match reply.result() {
            Ok(sample) => {
                let body = sample.payload().to_bytes();
                println!("{}", String::from_utf8_lossy(&body));
            }
            Err(err) => {
                let body = err.payload().to_bytes();
                println!("Error: {}", String::from_utf8_lossy(&body));
            }
        }
    }

    Ok(())
}
