//! Scheduling Example
//!
//! Schedules a power operation on the dry-run backend, prints the pending
//! status, then cancels it. Nothing on the host is touched.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example schedule
//!
//! # Let the timer fire instead of cancelling
//! cargo run --example schedule -- --fire
//!
//! # Forced reboot instead of graceful shutdown
//! cargo run --example schedule -- --reboot --force
//! ```

use std::time::Duration;

use curfew::prelude::*;

#[tokio::main]
async fn main() {
    curfew::telemetry::init("info");

    let args: Vec<String> = std::env::args().collect();
    let reboot = args.iter().any(|a| a == "--reboot");
    let force = args.iter().any(|a| a == "--force");
    let fire = args.iter().any(|a| a == "--fire");

    let config = PowerConfig::default()
        .with_backend(BackendKind::DryRun)
        .with_reason_message("curfew demo");
    let scheduler = match build_scheduler(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("cannot build scheduler: {e}");
            std::process::exit(1);
        }
    };
    let mut events = scheduler.subscribe();

    println!("=== curfew schedule example ===");
    println!("platform: {}", detect_platform());

    let delay = Duration::from_secs(2);
    let request = if reboot {
        PowerRequest::reboot(1, delay, force)
    } else {
        PowerRequest::shutdown(1, delay, force)
    };
    match scheduler.schedule(request).await {
        Ok(op) => println!("scheduled {} (id {}), fires in {:?}", op.kind, op.id, op.delay),
        Err(e) => {
            eprintln!("schedule failed: {e}");
            std::process::exit(1);
        }
    }

    // A second request is refused while the slot is occupied.
    if let Err(e) = scheduler.schedule_reboot(2, delay, false).await {
        println!("second request refused: {e}");
    }

    let report = scheduler.report();
    println!(
        "status: backend={} pending={:?} remaining={:?}",
        report.backend,
        report.pending.as_ref().map(|op| op.kind),
        report.remaining
    );

    if fire {
        while let Ok(event) = events.recv().await {
            if let SchedulerEvent::Executed { operation, result } = event {
                println!("executed {}: {:?}", operation.kind, result);
                break;
            }
        }
    } else {
        match scheduler.cancel().await {
            Ok(op) => println!("cancelled {}", op.kind),
            Err(e) => println!("cancel failed: {e}"),
        }
        println!("status after cancel: {:?}", scheduler.status());
    }
}
