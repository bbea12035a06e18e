//! Synthetic log traffic.
use super::args::AppArgs;
use rand::Rng;
use serde_json::json;
use std::time::Duration;
use webview_logger::{LogLevel, LogOptions, Logger};

/// Logs a record at a random level after a random delay, `count` times or
/// forever.
pub async fn generate(logger: &Logger, args: &AppArgs) {
    let mut sent = 0u64;
    while args.count.map_or(true, |count| sent < count) {
        let (delay, level, value) = {
            let mut rng = rand::thread_rng();
            let level = LogLevel::ALL[rng.gen_range(0..LogLevel::ALL.len())];
            (next_delay(&mut rng, args), level, rng.gen_range(0..1000))
        };
        tokio::time::sleep(delay).await;

        logger.log(
            "Example log message",
            level,
            LogOptions::new()
                .source("RandomModule")
                .category("Simulation")
                .data(json!({ "Value": value })),
        );
        sent += 1;
    }
}

fn next_delay(rng: &mut impl Rng, args: &AppArgs) -> Duration {
    let min = args.min_delay_ms.min(args.max_delay_ms);
    let max = args.min_delay_ms.max(args.max_delay_ms);
    Duration::from_millis(rng.gen_range(min..=max))
}
