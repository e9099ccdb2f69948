//! # Crazyflie Display Demo
//!
//! Plays the animation schedule from a YAML configuration on a `CrazyflieSim`
//! and streams the body, rotors and flown path to the rerun viewer.
//!
//! ```sh
//! cargo run --release -- config/crazyflie.yaml
//! ```
use crazyflie_sim::config::Config;
use crazyflie_sim::{Airframe, CrazyflieError, CrazyflieScene, CrazyflieSim, Schedule, Trail};

/// Main function to run the Crazyflie display demo
fn main() -> Result<(), CrazyflieError> {
    env_logger::builder()
        .parse_env(env_logger::Env::default().default_filter_or("info"))
        .init();
    let mut config_str = "config/crazyflie.yaml";
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        log::warn!("Usage: {} <config.yaml>.", args[0]);
        log::warn!("Loading default configuration: {}", config_str);
    } else {
        log::info!("Loading configuration: {}", args[1]);
        config_str = &args[1];
    }
    let config = Config::from_yaml(config_str)?;
    let mut sim = CrazyflieSim::new(config.history.capacity)?;
    let schedule = Schedule::from_config(&config.schedule)?;
    let scene = CrazyflieScene::new("world/crazyflie", Airframe::from(&config.airframe))?;
    let rec = if config.simulation.use_rerun {
        let rec = rerun::RecordingStreamBuilder::new("crazyflie_sim").spawn()?;
        scene.log_static(&rec)?;
        Some(rec)
    } else {
        None
    };
    let dt = 1.0 / config.simulation.frequency;
    let total_steps = (config.simulation.duration * config.simulation.frequency) as usize;
    let log_every = ((config.simulation.frequency / config.simulation.log_frequency) as usize).max(1);
    if let Some(last) = schedule.last_step() {
        if last >= total_steps {
            log::warn!(
                "Schedule runs until step {}, simulation stops at {}",
                last,
                total_steps
            );
        }
    }
    let mut trail = Trail::new(sim.position());
    for i in 0..total_steps {
        let time = dt * i as f32;
        schedule.apply_step(&mut sim, i, time)?;
        trail.add_point(sim.position());
        if let Some(rec) = &rec {
            if i % log_every == 0 {
                rec.set_time_seconds("timestamp", time);
                scene.log_state(rec, &sim)?;
                scene.log_trail(rec, &trail)?;
            }
        }
    }
    log::info!(
        "Finished {} steps, roll {:.3} pitch {:.3} yaw {:.3}, {} snapshots in history",
        total_steps,
        sim.roll(),
        sim.pitch(),
        sim.yaw(),
        sim.history_len()
    );
    Ok(())
}
