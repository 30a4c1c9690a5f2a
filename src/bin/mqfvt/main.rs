use log::{info, LevelFilter};
use structopt::StructOpt;

use std::{io, path, result};

mod decode;
mod ping;

#[derive(Clone, StructOpt)]
pub struct Opt {
    #[structopt(short = "v")]
    v: bool,

    #[structopt(long = "vv")]
    vv: bool,

    #[structopt(long = "log-mod", default_value = "")]
    log_mod: String,

    #[structopt(subcommand)]
    subcmd: SubCommand,
}

#[derive(Clone, StructOpt)]
pub enum SubCommand {
    /// Decode hex encoded MQTT packets and print them.
    Decode(decode::Decode),
    /// Handshake with a broker, ping it and disconnect.
    Ping(ping::Ping),
}

pub type Result<T> = result::Result<T, String>;

fn main() {
    let opts = parse_cmd_line();

    setup_logging(&opts);
    info!("verbosity level {:?}", opts.to_level_filter());

    let res = match &opts.subcmd {
        SubCommand::Decode(_) => decode::run(opts),
        SubCommand::Ping(_) => ping::run(opts),
    };

    if let Err(err) = res {
        println!("error: {}", err);
        std::process::exit(1);
    }
}

fn parse_cmd_line() -> Opt {
    Opt::from_args()
}

use env_logger::{fmt::Target, Builder, WriteStyle};
use log::Level;
use std::io::Write;
fn setup_logging(opts: &Opt) {
    let log_mod = opts.log_mod.clone();
    Builder::new()
        .filter_level(opts.to_level_filter())
        .parse_default_env()
        .target(Target::Stdout)
        .format(move |f, r| match r.file() {
            Some(file) if !file.is_empty() && !file.contains(&log_mod) => Ok(()),
            _ => log_format(f, r),
        })
        .write_style(WriteStyle::Auto)
        .init();
}

use env_logger::fmt::{Color, Formatter};
fn log_format(f: &mut Formatter, r: &log::Record<'_>) -> io::Result<()> {
    let mut level_style = f.style();
    match r.level() {
        Level::Error => level_style.set_color(Color::Red).set_bold(false),
        Level::Warn => level_style.set_color(Color::Yellow).set_bold(false),
        Level::Info => level_style.set_color(Color::Blue).set_bold(false),
        Level::Debug => level_style.set_color(Color::Magenta).set_bold(false),
        Level::Trace => level_style.set_color(Color::Cyan).set_bold(false),
    };
    let mut mod_style = f.style();
    mod_style.set_color(Color::Green).set_bold(false);
    let file = r
        .file()
        .and_then(|file| path::Path::new(file).file_stem())
        .and_then(|stem| stem.to_str())
        .unwrap_or("-");
    let loc = mod_style.value(format!("{}:{}", file, r.line().unwrap_or(0)));
    writeln!(
        f,
        "{} [{:5}] [{:>13}] {}",
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%Z"),
        level_style.value(r.level()),
        loc,
        r.args()
    )
}

impl Opt {
    fn to_level_filter(&self) -> LevelFilter {
        if self.vv {
            LevelFilter::Trace
        } else if self.v {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
