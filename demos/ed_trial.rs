use edsim::core::execution::ConcurrencyMode;
use edsim::{SimError, Trial, TrialConfig};
use log::info;
use std::time::Instant;

// Emergency department queueing trial with the default scenario.
// Pass --parallel to spread the runs over a rayon thread pool.
fn main() -> Result<(), SimError> {
    env_logger::init();

    let mut config = TrialConfig::new();
    if std::env::args().skip(1).any(|arg| arg == "--parallel") {
        config = config.with_concurrency(ConcurrencyMode::Rayon);
    }

    println!("Emergency Department Trial");
    println!("==========================");
    println!(
        "{} runs, warm-up {:.0} min, measured {:.0} min, seed {}\n",
        config.number_of_runs, config.warm_up, config.measurement, config.seed
    );

    let started = Instant::now();
    let results = Trial::new(config)?.run()?;
    info!("trial took {:?}", started.elapsed());

    print!("{}", results);

    println!("\nMean queue times:");
    for station in &results.stations {
        match station.mean {
            Some(mean) => println!("  {:<16} {:6.1} minutes", station.station, mean),
            None => println!("  {:<16} no data", station.station),
        }
    }

    Ok(())
}
