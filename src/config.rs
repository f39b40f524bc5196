//! CLI surface, grounded on `barnes-hut/options.h`'s getopt table and
//! extended to `clap`'s derive style the way the pack's CLI tools do it.

use clap::Parser;

use crate::error::Error;

#[derive(Parser, Debug)]
#[command(name = "barnes-hut-step", about = "Parallel Barnes-Hut n-body step engine")]
struct Cli {
    /// Number of steps to run; 0 runs until externally stopped.
    #[arg(short = 's', long, default_value_t = 100)]
    steps: u64,

    /// Number of particles to simulate.
    #[arg(short = 'n', long = "particles", default_value_t = 1000)]
    particles: usize,

    /// Mass assigned to every particle at initialization.
    #[arg(short = 'm', long, default_value_t = 1.0)]
    max_mass: f64,

    /// Initial bounding half-width of the root octant.
    #[arg(short = 'r', long, default_value_t = 1000.0)]
    radius: f64,

    /// Opening-angle threshold; smaller is more accurate and slower.
    #[arg(short = 't', long, default_value_t = 0.5)]
    theta: f64,

    /// Integration time step.
    #[arg(long, default_value_t = 0.01)]
    dt: f64,

    /// Number of worker threads.
    #[arg(short = 'j', long, default_value_t = 1)]
    threads: usize,

    /// RNG seed; 0 uses a system-derived default.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Sleep, in milliseconds, between completed steps.
    #[arg(long, default_value_t = 0)]
    delay: u64,

    /// Reorder the particle array into Morton order every 10th step.
    #[arg(short = 'o', long)]
    optimize: bool,

    /// Constrain initial positions to the z = 0 plane.
    #[arg(long)]
    flat: bool,

    /// Emit human-readable per-step diagnostics to stderr.
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Open an on-screen point-cloud visualization (requires the `render`
    /// feature).
    #[arg(short = 'd', long)]
    render: bool,

    /// Arena capacity in bytes.
    #[arg(long, default_value_t = 1 << 30)]
    arena_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub steps: u64,
    pub particles: usize,
    pub max_mass: f64,
    pub radius: f64,
    pub theta: f64,
    pub dt: f64,
    pub threads: usize,
    pub seed: u64,
    pub delay: u64,
    pub optimize: bool,
    pub flat: bool,
    pub verbose: bool,
    pub render: bool,
    pub arena_bytes: usize,
}

impl Config {
    /// Parses `args` (typically `std::env::args_os()`), distinguishing
    /// `--help`/`--version` (→ [`Error::EarlyExit`]) from malformed options
    /// (→ [`Error::BadOption`]).
    pub fn parse<I, T>(args: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = match Cli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(err) => {
                use clap::error::ErrorKind;
                return match err.kind() {
                    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                        print!("{err}");
                        Err(Error::EarlyExit)
                    }
                    _ => Err(Error::BadOption(err.to_string())),
                };
            }
        };

        if cli.threads == 0 {
            return Err(Error::BadOption("threads must be >= 1".into()));
        }
        if cli.particles == 0 {
            return Err(Error::BadOption("particles must be >= 1".into()));
        }

        Ok(Config {
            steps: cli.steps,
            particles: cli.particles,
            max_mass: cli.max_mass,
            radius: cli.radius,
            theta: cli.theta,
            dt: cli.dt,
            threads: cli.threads,
            seed: cli.seed,
            delay: cli.delay,
            optimize: cli.optimize,
            flat: cli.flat,
            verbose: cli.verbose,
            render: cli.render,
            arena_bytes: cli.arena_bytes,
        })
    }
}
