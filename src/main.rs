use barnes_hut_step::config::Config;
use barnes_hut_step::visualizer::{NullVisualizer, Visualizer};
use barnes_hut_step::{coordinator, init, Error};

#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

fn main() {
    let config = match Config::parse(std::env::args_os()) {
        Ok(config) => config,
        Err(Error::EarlyExit) => std::process::exit(0),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(e.exit_code());
        }
    };

    init_logger(config.verbose);

    if config.verbose {
        log::info!("generating {} particles (seed={})", config.particles, config.seed);
    }
    let particles = init::random_particles(&config);

    let mut visualizer: Box<dyn Visualizer> = pick_visualizer(&config);

    if let Err(e) = coordinator::run(&config, particles, visualizer.as_mut()) {
        eprintln!("{e}");
        std::process::exit(e.exit_code());
    }
}

/// `--verbose` controls whether the per-step diagnostic block is emitted at
/// all, not just the level filter, so the default filter level is derived
/// from it directly instead of leaving `RUST_LOG`-less runs at `env_logger`'s
/// default (below `info`), which would silently drop every `info!` call.
fn init_logger(verbose: bool) {
    let default_level = if verbose { log::LevelFilter::Info } else { log::LevelFilter::Warn };
    env_logger::Builder::new().filter_level(default_level).parse_default_env().init();
}

#[cfg(feature = "render")]
fn pick_visualizer(config: &Config) -> Box<dyn Visualizer> {
    if config.render {
        match barnes_hut_step::render::WgpuVisualizer::new(config.radius) {
            Ok(visualizer) => Box::new(visualizer),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(e.exit_code());
            }
        }
    } else {
        Box::new(NullVisualizer)
    }
}

#[cfg(not(feature = "render"))]
fn pick_visualizer(config: &Config) -> Box<dyn Visualizer> {
    if config.render {
        eprintln!("binary was built without the `render` feature");
    }
    Box::new(NullVisualizer)
}
