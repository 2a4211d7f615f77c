mod anim;
mod app;
mod command;
mod config;
mod consts;
mod game;
mod highscores;
mod particles;
mod round;
mod sim;
mod snapshot;
mod util;
use crate::app::App;
use crate::config::{Config, ConfigError};
use crate::util::Globals;
use anyhow::Context;
use lexopt::{Arg, Parser, ValueExt};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Environment variable holding the log filter
const LOG_ENV_VAR: &str = "STONESNAKE_LOG";

const USAGE: &str = "\
Usage: stonesnake [--config PATH] [--seed N]

Options:
  --config PATH    Read configuration from PATH
  --seed N         Seed the first round's random generator
  -h, --help       Show this help and exit
  -V, --version    Show the program version and exit
";

#[derive(Clone, Debug, Eq, PartialEq)]
enum Cli {
    Run {
        config: Option<PathBuf>,
        seed: Option<u64>,
    },
    Help,
    Version,
}

impl Cli {
    fn from_parser(mut parser: Parser) -> Result<Cli, lexopt::Error> {
        let mut config = None;
        let mut seed = None;
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Long("config") => config = Some(PathBuf::from(parser.value()?)),
                Arg::Long("seed") => seed = Some(parser.value()?.parse::<u64>()?),
                Arg::Short('h') | Arg::Long("help") => return Ok(Cli::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Cli::Version),
                _ => return Err(arg.unexpected()),
            }
        }
        Ok(Cli::Run { config, seed })
    }
}

fn main() -> ExitCode {
    let cli = match Cli::from_parser(Parser::from_env()) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("stonesnake: {e}");
            eprint!("{USAGE}");
            return ExitCode::from(2);
        }
    };
    match cli {
        Cli::Help => {
            print!("{USAGE}");
            ExitCode::SUCCESS
        }
        Cli::Version => {
            println!("stonesnake {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Cli::Run { config, seed } => match run(config.as_deref(), seed) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e)
                if e.downcast_ref::<io::Error>()
                    .is_some_and(|e| e.kind() == ErrorKind::BrokenPipe) =>
            {
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("stonesnake: {e:?}");
                ExitCode::from(2)
            }
        },
    }
}

fn run(config_path: Option<&Path>, seed: Option<u64>) -> anyhow::Result<()> {
    let config = load_config(config_path).context("failed to load configuration")?;
    init_logging(&config);
    let best_length = config.load_best_length();
    log::debug!("Best length so far: {best_length}");
    let globals = Globals {
        config,
        best_length,
        seed,
    };
    let terminal = ratatui::try_init().context("failed to initialize terminal")?;
    let r = App::new(globals).run(terminal);
    ratatui::restore();
    r.context("terminal I/O failed")
}

/// Load the configuration from `path` if given, otherwise from the default
/// location, where a missing file just means "use the defaults"
fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(p) => Config::load(p, false),
        None => match Config::default_path() {
            Ok(p) => Config::load(&p, true),
            Err(ConfigError::NoPath) => Ok(Config::default()),
            Err(e) => Err(e),
        },
    }
}

/// Send log messages to the configured log file.  Standard error belongs to
/// the terminal interface, so if the file can't be opened, logging is
/// disabled.
fn init_logging(config: &Config) {
    let Some(path) = config.files.log_file() else {
        eprintln!("stonesnake: could not determine log file path; logging disabled");
        return;
    };
    match open_log_file(&path) {
        Ok(file) => {
            env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_ENV_VAR, "warn"))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        Err(e) => eprintln!("stonesnake: {e}; logging disabled"),
    }
}

fn open_log_file(path: &Path) -> io::Result<fs_err::File> {
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    fs_err::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
}
