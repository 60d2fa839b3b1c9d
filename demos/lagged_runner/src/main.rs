//! Lagged Runner Example
//!
//! A client predicts its runner ahead of a server it talks to over a slow,
//! lossy link. Every fixed step the client records its controls, seeks to
//! "now" and ships a trailing input pack. The server merges the packs,
//! simulates the runner authoritatively and sends back confirmed snapshots,
//! which the client reconciles against its own prediction.
//!
//! Halfway through, a gust of wind that only the server knows about pushes the
//! runner back. The client mispredicts until the server's snapshots catch up
//! and reconciliation corrects it.
//!
//! Run with `RUST_LOG=retick_netcode=debug` to watch every correction.

mod link;
mod runner;

use link::DelayedLink;
use retick_core::{FixedStepClock, Seconds};
use retick_netcode::{InputPack, SeekFlags, Ticker, TickerSettings};
use runner::{Controls, Runner, RunnerState};
use tracing::{debug, info};

const SETTINGS: &str = r#"(
    max_delta_time: 0.05,
    max_seek_iterations: 120,
    history_length: 2.0,
    debug_log_reconciles: true,
)"#;

const TICK_RATE: f64 = 60.0;
const LATENCY: Seconds = 0.08;
const PACK_WINDOW: Seconds = 0.25;
const SNAPSHOT_EVERY: u64 = 6;
const DURATION: Seconds = 4.0;
const GUST_TIME: Seconds = 2.0;

/// Frame times of a host with an uneven frame rate
const FRAME_DELTAS: [Seconds; 5] = [0.016, 0.021, 0.012, 0.017, 0.034];

/// Deterministic controls for a given step
fn controls_at(step: u64) -> Controls {
    Controls {
        run: if step % 120 < 90 { 1.0 } else { -0.5 },
        jump: step % 45 == 0,
    }
}

fn main() -> retick_netcode::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== Retick Lagged Runner Example ===\n");

    let settings = TickerSettings::from_ron_str(SETTINGS)?;
    let mut clock = FixedStepClock::with_rate(TICK_RATE)?;

    let mut client_runner = Runner::default();
    let mut client = Ticker::new(&client_runner, settings.clone());
    let mut server_runner = Runner::default();
    let mut server = Ticker::new(&server_runner, settings);

    let mut uplink: DelayedLink<Vec<u8>> = DelayedLink::new(LATENCY, 5);
    let mut downlink: DelayedLink<(RunnerState, Seconds)> = DelayedLink::new(LATENCY, 0);

    let mut previous_now = 0.0;
    let mut gust_sent = false;
    let mut corrections = 0;
    let mut lost_packs = 0;

    for frame_delta in FRAME_DELTAS.iter().cycle() {
        if clock.time() >= DURATION {
            break;
        }

        let due = u64::from(clock.advance(*frame_delta));
        let last_step = clock.steps();

        for step in (last_step + 1 - due)..=last_step {
            // same formula as the clock, so both sides agree on every timestamp
            let now = step as f64 * clock.step();

            // client: record, predict, send
            client.push_input(controls_at(step), now);
            client.seek(&mut client_runner, now, previous_now, SeekFlags::empty());
            let pack = client.make_input_pack(PACK_WINDOW).encode()?;
            if !uplink.send(now, pack) {
                lost_packs += 1;
                debug!(now, "input pack lost");
            }

            // server: merge inputs, simulate, snapshot
            for bytes in uplink.receive(now) {
                server.push_input_pack(InputPack::decode(&bytes)?);
            }
            if !gust_sent && now >= GUST_TIME {
                info!(now, "server-side gust of wind");
                server.call_event(|runner: &mut Runner, _| runner.x -= 1.5);
                gust_sent = true;
            }
            let report = server.seek(&mut server_runner, now, previous_now, SeekFlags::empty());
            if !report.is_complete() {
                info!(?report, "server seek did not complete");
            }
            if step % SNAPSHOT_EVERY == 0 {
                let snapshot = server.last_confirmed_state().clone();
                downlink.send(now, (snapshot, server.confirmed_state_time()));
            }

            // client: reconcile against whatever the server confirmed
            for (state, time) in downlink.receive(now) {
                if client.reconcile(&mut client_runner, state, time) {
                    corrections += 1;
                }
            }

            previous_now = now;
        }
    }

    println!("Simulated {:.2}s at {} Hz", clock.time(), TICK_RATE);
    println!("Input packs lost: {lost_packs}");
    println!("Client corrections: {corrections}");
    println!(
        "Client: x = {:.3}, y = {:.3} (confirmed at {:.3}s, {:.3}s ahead)",
        client_runner.x,
        client_runner.y,
        client.confirmed_state_time(),
        client.prediction_lag(),
    );
    println!(
        "Server: x = {:.3}, y = {:.3} (confirmed at {:.3}s)",
        server_runner.x,
        server_runner.y,
        server.confirmed_state_time(),
    );

    let common_time = server.confirmed_state_time();
    match (client.recorded_state(common_time), server.recorded_state(common_time)) {
        (Some(client_state), Some(server_state)) if client_state == server_state => {
            println!("\nConfirmed states agree at {common_time:.3}s");
        }
        (Some(_), Some(_)) => println!("\nConfirmed states differ at {common_time:.3}s"),
        _ => println!("\nNo shared confirmed state at {common_time:.3}s yet"),
    }

    Ok(())
}
