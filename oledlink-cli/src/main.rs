//! oledlink - drive an SSD1306 panel through a USB-I2C or UART bridge

mod config;
mod host;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, ensure, Context};
use clap::ArgMatches;
use env_logger::Env;
use image::DynamicImage;
use log::{error, info};
use oledlink_display::{FrameBuffer, Ssd1306};

use config::{Config, TransportKind};

/// Parse `0x`-prefixed hex or decimal
fn parse_number<T>(text: &str) -> anyhow::Result<T>
where
    T: TryFrom<u32>,
{
    let value = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse::<u32>(),
    }
    .with_context(|| format!("invalid number \"{text}\""))?;

    T::try_from(value).map_err(|_| anyhow::anyhow!("{text} is out of range"))
}

fn cli() -> clap::Command {
    clap::command!()
        .arg(
            clap::arg!(-c --config [PATH] "configuration file")
                .default_value(config::DEFAULT_PATH),
        )
        .arg(clap::arg!(-a --address [ADDRESS] "I2C address of the panel, overrides the configuration"))
        .arg(clap::arg!(-p --port [PORT] "serial port of the UART bridge, overrides the configuration"))
        .arg(clap::arg!(-b --baud [BAUD] "baud rate of the UART bridge, overrides the configuration"))
        .arg(clap::arg!(-v --verbose "enable debug logging"))
        .subcommand(
            clap::Command::new("show")
                .about("display an image, scaled and dithered to fit")
                .arg(clap::arg!(<IMAGE> "image file"))
                .arg(clap::arg!(-i --invert "invert every pixel"))
                .arg(clap::arg!(--clear "blank the panel before exiting")),
        )
        .subcommand(
            clap::Command::new("fill")
                .about("set every display byte to a value")
                .arg(clap::arg!(<BYTE> "byte value, e.g. 0xAA"))
                .arg(clap::arg!(--clear "blank the panel before exiting")),
        )
        .subcommand(clap::Command::new("clear").about("blank the panel"))
        .subcommand(
            clap::Command::new("contrast")
                .about("set the panel contrast")
                .arg(clap::arg!(<VALUE> "contrast, 0-255")),
        )
        .subcommand(clap::Command::new("on").about("switch the panel on"))
        .subcommand(clap::Command::new("off").about("switch the panel off"))
        .subcommand(clap::Command::new("restart").about("reinitialize the panel"))
        .subcommand(clap::Command::new("probe").about("self-test the USB bridge"))
        .subcommand(
            clap::Command::new("preview")
                .about("render what the panel would show into an image file")
                .arg(clap::arg!(<IMAGE> "image file"))
                .arg(clap::arg!(<OUT> "output file"))
                .arg(clap::arg!(-i --invert "invert every pixel")),
        )
        .arg_required_else_help(true)
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<Config> {
    let path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(config::DEFAULT_PATH);
    let mut config = Config::load(Path::new(path))?;

    if let Some(address) = matches.get_one::<String>("address") {
        config.transport.address = parse_number(address)?;
    }
    if let Some(port) = matches.get_one::<String>("port") {
        config.transport.port = port.clone();
    }
    if let Some(baud) = matches.get_one::<String>("baud") {
        config.transport.baud_rate = parse_number(baud)?;
    }
    Ok(config)
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing <{name}>"))
}

fn preview(config: &Config, args: &ArgMatches) -> anyhow::Result<()> {
    let input = required(args, "IMAGE")?;
    let output = required(args, "OUT")?;
    let geometry = config.panel.geometry()?;

    let image = image::open(input).with_context(|| format!("failed to open {input}"))?;
    let frame = FrameBuffer::from_image(&image, &geometry, args.get_flag("invert"));
    frame
        .to_image()
        .save(output)
        .with_context(|| format!("failed to write {output}"))?;

    info!(
        "wrote {}x{} preview to {}",
        geometry.width(),
        geometry.height(),
        output
    );
    Ok(())
}

fn probe(config: &Config) -> anyhow::Result<()> {
    ensure!(
        config.transport.kind == TransportKind::Usb,
        "probe needs the USB transport"
    );

    let mut bridge = host::open_bridge(&config.transport)?;

    const PATTERN: i16 = 0x5A3C;
    let echoed = bridge.echo(PATTERN)?;
    ensure!(
        echoed == PATTERN,
        "echo mismatch: sent 0x{PATTERN:04x}, got 0x{echoed:04x}"
    );
    info!("echo ok");

    let functions = bridge.get_functions()?;
    info!("functionality: 0x{:08x}", functions);

    let status = bridge.get_status()?;
    info!("status: {:?}", status);
    Ok(())
}

/// Panel operation with its arguments already decoded
enum Action {
    Show { image: DynamicImage, invert: bool },
    Fill(u8),
    Clear,
    Contrast(u8),
    On,
    Off,
    Restart,
}

impl Action {
    /// Decode a subcommand without touching the hardware
    fn decode(name: &str, args: &ArgMatches) -> anyhow::Result<Self> {
        Ok(match name {
            "show" => {
                let path = required(args, "IMAGE")?;
                let image = image::open(path).with_context(|| format!("failed to open {path}"))?;
                Action::Show {
                    image,
                    invert: args.get_flag("invert"),
                }
            }
            "fill" => Action::Fill(parse_number(required(args, "BYTE")?)?),
            "clear" => Action::Clear,
            "contrast" => Action::Contrast(parse_number(required(args, "VALUE")?)?),
            "on" => Action::On,
            "off" => Action::Off,
            "restart" => Action::Restart,
            _ => bail!("unknown command {name}"),
        })
    }
}

/// Whether to hide and clear the panel before exiting
fn blanks_on_exit(name: &str, args: &ArgMatches) -> bool {
    match name {
        "show" | "fill" => args.get_flag("clear"),
        "clear" => true,
        _ => false,
    }
}

fn drive(config: &Config, name: &str, args: &ArgMatches) -> anyhow::Result<()> {
    let geometry = config.panel.geometry()?;
    let action = Action::decode(name, args)?;

    let transport = host::open(&config.transport).context("failed to open transport")?;
    let mut panel = Ssd1306::new(transport, geometry).context("failed to initialize panel")?;
    if let Some(contrast) = config.panel.contrast {
        panel.set_contrast(contrast)?;
    }

    match action {
        Action::Show { image, invert } => panel.display_image(&image, invert)?,
        Action::Fill(value) => panel.fill(value)?,
        Action::Clear => panel.clear()?,
        Action::Contrast(value) => panel.set_contrast(value)?,
        Action::On => panel.show()?,
        Action::Off => panel.hide()?,
        Action::Restart => panel.restart()?,
    }

    if blanks_on_exit(name, args) {
        panel.dispose()?;
    } else {
        panel.release();
    }
    Ok(())
}

fn oledlink(matches: &ArgMatches) -> anyhow::Result<()> {
    let config = load_config(matches)?;

    match matches.subcommand() {
        Some(("preview", args)) => preview(&config, args),
        Some(("probe", _)) => probe(&config),
        Some((name, args)) => drive(&config, name, args),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();

    let filter = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

    match oledlink(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("oledlink: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
