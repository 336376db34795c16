use std::process;

use sim_lib::error::SimulatorResult;
use sim_lib::flags::CacheSimArgs;
use sim_lib::run_wrapper;

fn main() {
    let args = CacheSimArgs::from_env_or_exit();

    let mut log_builder = env_logger::Builder::new();
    log_builder.filter_level(if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    });
    log_builder.parse_default_env();
    log_builder.init();

    if let Err(e) = run_sim(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_sim(args: &CacheSimArgs) -> SimulatorResult<()> {
    let config = args.config();
    let report = run_wrapper::run(&config, &args.trace_file)?;
    print!("{}", report);

    if let Some(path) = &args.csv {
        report.write_csv(path)?;
        log::info!("raw results written to {}", path.display());
    }

    Ok(())
}
