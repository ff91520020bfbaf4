//! Rendezvous CLI
//!
//! Headless host for the convergence scheduler: drive it with a synthetic
//! clock, or sample the heading selector on its own.

use anyhow::{ensure, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rendezvous_core::engine::angles::same_azimuth;
use rendezvous_core::engine::speed::SpeedProfile;
use rendezvous_core::{
    ConvergenceScheduler, QuantizedAzimuthSelector, SchedulerConfig, SchedulerEvent,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rendezvous")]
#[command(about = "Drive or inspect the sphere rendezvous scheduler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler against a synthetic wall clock
    Run {
        /// Number of frames to simulate
        #[arg(long, default_value_t = 600)]
        ticks: u64,

        /// Frames per second of the synthetic clock
        #[arg(long, default_value_t = 60.0)]
        fps: f64,

        /// Compass steps for heading selection
        #[arg(long)]
        quantization: Option<f64>,

        /// Pause at the pole in milliseconds (0 = change at once)
        #[arg(long)]
        pause_ms: Option<i64>,

        /// Base angular speed per frame (radians)
        #[arg(long)]
        speed: Option<f64>,

        /// Disable slow-down near the pole
        #[arg(long, default_value = "false")]
        flat_speed: bool,

        /// Random stream seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Emit events and final status as JSON lines
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Histogram of heading draws from a single entry heading
    Sample {
        /// Heading the token arrived on (degrees)
        #[arg(long)]
        previous: f64,

        /// Heading already chosen by the other token (degrees)
        #[arg(long)]
        peer: Option<f64>,

        /// Compass steps
        #[arg(long, default_value_t = 8)]
        quantization: u32,

        /// Number of draws
        #[arg(long, default_value_t = 10_000)]
        draws: usize,

        /// Random stream seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rendezvous=info,rendezvous_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { ticks, fps, quantization, pause_ms, speed, flat_speed, seed, json } => {
            ensure!(fps.is_finite() && fps > 0.0, "fps must be a positive number, got {}", fps);

            let mut config = SchedulerConfig::default().with_seed(seed);
            if flat_speed {
                config.motion.speed = SpeedProfile::flat();
            }
            let mut scheduler = ConvergenceScheduler::new(config);
            if let Some(q) = quantization {
                scheduler.set_quantization(q);
            }
            if let Some(pause) = pause_ms {
                scheduler.set_pause_duration_ms(pause);
            }
            if let Some(speed) = speed {
                scheduler.set_angular_speed(speed);
            }

            info!(ticks, fps, seed, "running scheduler");
            scheduler.start();

            for tick in 0..ticks {
                let now_ms = (tick as f64 * 1000.0 / fps).round() as u64;
                scheduler.tick(now_ms);
                for event in scheduler.drain_events() {
                    print_event(&event, json)?;
                }
                if !scheduler.is_running() {
                    break;
                }
            }

            let status = scheduler.status();
            if json {
                println!("{}", serde_json::to_string(&status)?);
            } else {
                println!("\nFinal status");
                println!("   Frames:            {}", status.frame);
                println!("   Direction changes: {}", status.direction_changes);
                println!("   Phase:             {:?}", status.phase);
                println!(
                    "   Headings:          {:.1}° / {:.1}°",
                    status.primary_azimuth, status.secondary_azimuth
                );
                println!("   Distance:          {:.4} rad", status.primary_distance);
                if let Some(reason) = &status.halt_reason {
                    println!("   Halted:            {}", reason);
                }
            }
            info!(frames = status.frame, changes = status.direction_changes, "run finished");
        }

        Commands::Sample { previous, peer, quantization, draws, seed } => {
            let selector = QuantizedAzimuthSelector::with_quantization(quantization);
            let candidates = selector.weighted_candidates(previous, peer);
            let total_weight: f64 = candidates.iter().map(|c| c.weight).sum();

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut counts = vec![0usize; candidates.len()];
            let mut kept_previous = 0usize;
            for _ in 0..draws {
                let azimuth = selector.next_azimuth(previous, peer, &mut rng);
                match candidates.iter().position(|c| same_azimuth(c.azimuth, azimuth)) {
                    Some(idx) => counts[idx] += 1,
                    None => kept_previous += 1,
                }
            }

            println!(
                "Q={} previous={:.1}° peer={} draws={}",
                selector.quantization(),
                previous,
                peer.map_or("-".to_string(), |p| format!("{:.1}°", p)),
                draws
            );
            println!("{:>10} {:>10} {:>10}", "azimuth", "expected", "observed");
            for (candidate, count) in candidates.iter().zip(&counts) {
                let expected =
                    if total_weight > 0.0 { candidate.weight / total_weight } else { 0.0 };
                let observed = if draws > 0 { *count as f64 / draws as f64 } else { 0.0 };
                println!("{:>9.1}° {:>10.4} {:>10.4}", candidate.azimuth, expected, observed);
            }
            if kept_previous > 0 {
                println!("   kept previous heading: {} draws", kept_previous);
            }
        }
    }

    Ok(())
}

fn print_event(event: &SchedulerEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        SchedulerEvent::FreezeStarted { at_ms } => println!("{:>8} ms  freeze", at_ms),
        SchedulerEvent::FreezeEnded { at_ms, elapsed_ms } => {
            println!("{:>8} ms  release after {} ms", at_ms, elapsed_ms)
        }
        SchedulerEvent::DirectionChanged { at_ms, primary_azimuth, secondary_azimuth, .. } => {
            println!("{:>8} ms  split {:.1}° / {:.1}°", at_ms, primary_azimuth, secondary_azimuth)
        }
        SchedulerEvent::Halted { reason } => println!("halted: {}", reason),
        other => println!("{:?}", other),
    }
    Ok(())
}
