//! open-uni-hub CLI: command-line lighting and fan control for the Uni Hub SL-INF.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use open_uni_hub_core::color::RgbColor;
use open_uni_hub_core::comm::{check_device_status, DeviceStatus, ErrorClass};
use open_uni_hub_core::config::{ControllerConfig, DEFAULT_READ_TIMEOUT_MS};
use open_uni_hub_core::controller::UniHubController;
use open_uni_hub_core::error::Error;
use open_uni_hub_core::lighting::HubLighting;
use open_uni_hub_core::modes::{find_mode, CUSTOM_MODE};
use open_uni_hub_core::protocol::Direction;
use open_uni_hub_core::safety::validate_led_count;
use open_uni_hub_core::transport::HidDeviceTransport;
use open_uni_hub_core::{pids, LIANLI_VID};
use tracing::{debug, info};

#[derive(Parser)]
#[command(
    name = "open-uni-hub",
    version,
    about = "Open-source Lian Li Uni Hub SL-INF lighting and fan control"
)]
struct Cli {
    #[command(flatten)]
    hub: HubArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct HubArgs {
    /// How long to wait for the hub to answer a query, in milliseconds.
    #[arg(long, global = true, default_value_t = DEFAULT_READ_TIMEOUT_MS)]
    timeout_ms: i32,

    /// Cap near-white LEDs to the hub's current limit.
    #[arg(long, global = true)]
    limit_white: bool,

    /// LEDs wired to each channel, comma-separated (20 per SL-INF fan).
    #[arg(long, global = true, value_delimiter = ',')]
    leds: Vec<usize>,
}

impl HubArgs {
    fn config(&self) -> ControllerConfig {
        ControllerConfig {
            read_timeout_ms: self.timeout_ms,
            white_limiter: self.limit_white,
            ..ControllerConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the hub's identity strings.
    Info {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List available lighting modes.
    Modes {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Check that the hub is connected and answering.
    Status,
    /// Apply a hardware lighting effect to every channel.
    SetMode {
        /// Mode name, e.g. "rainbow-wave" or "runway".
        name: String,
        /// Speed level (0-4).
        #[arg(long)]
        speed: Option<u32>,
        /// Brightness level (0-4).
        #[arg(long)]
        brightness: Option<u32>,
        /// Direction: ltr or rtl.
        #[arg(long)]
        direction: Option<String>,
        /// Mode colors as hex (RRGGBB), one per slot.
        #[arg(long = "color", num_args = 1..)]
        colors: Vec<String>,
    },
    /// Set every LED to one color.
    SetColor {
        /// Color as hex (RRGGBB).
        color: String,
        /// Brightness (0-50).
        #[arg(long)]
        brightness: Option<u32>,
    },
    /// Set a channel's fan duty.
    SetFanSpeed {
        /// Channel index (0-3).
        channel: usize,
        /// Duty in percent (0-100).
        percent: u8,
    },
    /// Read a channel's fan speed.
    Rpm {
        /// Channel index (0-3).
        channel: usize,
    },
}

/// Name used when the hub does not report a product string.
const FALLBACK_NAME: &str = "Lian Li Uni Hub - SL Infinity";

/// An opened hub handle, before any protocol traffic.
struct RawHub {
    transport: HidDeviceTransport,
    path: String,
    name: String,
}

/// Find and open the first Uni Hub SL-INF without talking to it.
fn open_transport() -> std::result::Result<RawHub, Error> {
    let api = hidapi::HidApi::new().map_err(|e| Error::Hid(format!("hidapi init: {e}")))?;
    let info = api
        .device_list()
        .find(|d| d.vendor_id() == LIANLI_VID && d.product_id() == pids::UNI_HUB_SLINF)
        .ok_or_else(|| {
            Error::DeviceNotFound(format!(
                "no Uni Hub SL-INF (VID=0x{LIANLI_VID:04X} PID=0x{:04X})",
                pids::UNI_HUB_SLINF
            ))
        })?;

    let path = info.path().to_string_lossy().into_owned();
    let name = info.product_string().unwrap_or(FALLBACK_NAME).to_string();
    debug!(path = %path, name = %name, "Opening hub");

    let device = info.open_device(&api).map_err(|e| {
        let msg = e.to_string();
        if msg.to_lowercase().contains("permission") {
            Error::PermissionDenied(msg)
        } else {
            Error::Hid(msg)
        }
    })?;

    Ok(RawHub {
        transport: HidDeviceTransport::new(device),
        path,
        name,
    })
}

/// Open the first Uni Hub SL-INF found and resolve its identity.
fn open_hub(args: &HubArgs) -> Result<UniHubController<HidDeviceTransport>> {
    let raw = open_transport().map_err(describe)?;
    UniHubController::open(raw.transport, &raw.path, &raw.name, args.config()).map_err(describe)
}

/// Open the hub and size its channels from `--leds`.
fn open_lighting(args: &HubArgs) -> Result<HubLighting<HidDeviceTransport>> {
    let mut hub = HubLighting::new(open_hub(args)?);
    if args.leds.len() > hub.zones().len() {
        bail!("--leds takes at most {} counts", hub.zones().len());
    }
    for (zone, &count) in args.leds.iter().enumerate() {
        validate_led_count(count).with_context(|| format!("--leds for channel {zone}"))?;
        hub.resize_zone(zone, count);
    }
    Ok(hub)
}

/// Attach the user-facing hint for an error's class.
fn describe(err: Error) -> anyhow::Error {
    match ErrorClass::classify(&err).hint() {
        Some(hint) => anyhow::Error::new(err).context(hint),
        None => anyhow::Error::new(err),
    }
}

fn parse_color(s: &str) -> Result<RgbColor> {
    RgbColor::from_hex(s).ok_or_else(|| anyhow::anyhow!("Invalid color '{s}', expected RRGGBB"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { json } => {
            let hub = open_lighting(&cli.hub)?;
            if json {
                let value = serde_json::json!({
                    "name": hub.name(),
                    "vendor": hub.vendor(),
                    "description": hub.description(),
                    "firmware": hub.firmware_version(),
                    "serial": hub.serial(),
                    "location": hub.location(),
                    "config": hub.controller().config(),
                    "zones": hub.zones().iter().map(|z| serde_json::json!({
                        "name": z.name,
                        "type": z.zone_type.label(),
                        "leds": z.leds_count(),
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{} ({})", hub.name(), hub.description());
                println!("  Vendor:   {}", hub.vendor());
                println!("  Firmware: {}", hub.firmware_version());
                println!("  Serial:   {}", hub.serial());
                println!("  Location: {}", hub.location());
                for zone in hub.zones() {
                    println!(
                        "  {}: {} LEDs ({})",
                        zone.name,
                        zone.leds_count(),
                        zone.zone_type.label()
                    );
                }
            }
        }
        Commands::Modes { json } => {
            let modes = open_uni_hub_core::modes::default_modes();
            if json {
                let descriptors: Vec<_> = modes.iter().map(|m| m.descriptor).collect();
                println!("{}", serde_json::to_string_pretty(&descriptors)?);
            } else {
                for (index, mode) in modes.iter().enumerate() {
                    let d = &mode.descriptor;
                    println!(
                        "{index:2}  {:<14} speed {}-{}  brightness {}-{}  colors {}{}",
                        d.name,
                        d.speed_min,
                        d.speed_max,
                        d.brightness_min,
                        d.brightness_max,
                        d.colors_max,
                        if d.caps.direction { "  direction" } else { "" }
                    );
                }
            }
        }
        Commands::Status => {
            // Query the bare transport: a hub that does not answer would
            // already fail inside UniHubController::open.
            let (name, status) = match open_transport() {
                Ok(raw) => {
                    let status = check_device_status(&raw.transport, cli.hub.timeout_ms);
                    (raw.name, status)
                }
                Err(e) => {
                    if let Some(hint) = ErrorClass::classify(&e).hint() {
                        eprintln!("{e} ({hint})");
                    } else {
                        eprintln!("{e}");
                    }
                    (FALLBACK_NAME.to_string(), DeviceStatus::from_error(&e))
                }
            };
            println!("{name}: {}", status.label());
            if status != DeviceStatus::Connected {
                std::process::exit(1);
            }
        }
        Commands::SetMode {
            name,
            speed,
            brightness,
            direction,
            colors,
        } => {
            let mut hub = open_lighting(&cli.hub)?;
            let index = find_mode(hub.modes(), &name).ok_or_else(|| {
                let names: Vec<&str> = hub.modes().iter().map(|m| m.name()).collect();
                anyhow::anyhow!("Unknown mode '{name}'. Valid modes: {}", names.join(", "))
            })?;
            if index == CUSTOM_MODE {
                bail!("'{name}' is driven per LED; use set-color instead");
            }
            hub.set_active_mode(index)?;

            if let Some(speed) = speed {
                hub.set_mode_speed(speed)?;
            }
            if let Some(brightness) = brightness {
                hub.set_mode_brightness(brightness)?;
            }
            if let Some(direction) = direction {
                let parsed = Direction::from_name(&direction)
                    .with_context(|| format!("Unknown direction '{direction}', expected ltr or rtl"))?;
                hub.set_mode_direction(parsed);
            }
            for (slot, color) in colors.iter().enumerate() {
                hub.set_mode_color(slot, parse_color(color)?)?;
            }

            hub.update_mode().map_err(describe)?;
            if !hub.mode_applied() {
                bail!("Every channel needs LEDs configured before a mode can be applied (--leds)");
            }
            info!(mode = hub.active().name(), "Mode applied");
            println!("Applied {}", hub.active().name());
        }
        Commands::SetColor { color, brightness } => {
            let color = parse_color(&color)?;
            let mut hub = open_lighting(&cli.hub)?;
            hub.set_custom_mode();
            if let Some(brightness) = brightness {
                hub.set_mode_brightness(brightness)?;
            }
            if hub.leds().is_empty() {
                bail!("No LEDs configured; pass --leds with per-channel counts");
            }
            hub.fill_all(color);
            hub.update_leds().map_err(describe)?;
            println!("Set {} LEDs to {color}", hub.leds().len());
        }
        Commands::SetFanSpeed { channel, percent } => {
            let mut controller = open_hub(&cli.hub)?;
            controller
                .set_fan_speed(channel, percent)
                .map_err(describe)?;
            println!("Channel {channel} fan duty set to {percent}%");
        }
        Commands::Rpm { channel } => {
            let controller = open_hub(&cli.hub)?;
            let rpm = controller.read_fan_rpm(channel).map_err(describe)?;
            println!("Channel {channel}: {rpm} RPM");
        }
    }

    Ok(())
}
