//! CH340 Relay Board Control CLI
//!
//! Command-line interface for switching CH340 USB relay boards and modeling
//! battery test loads.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use ch340_relay::control::{FunctionDef, RelayController, parallel_resistance};
use ch340_relay::device::{RelayDriver, list_ports};
use ch340_relay::error::RelayError;
use ch340_relay::storage;
use ch340_relay::utils::parsing::{parse_channel, parse_switch_state, parse_voltage};

// =============================================================================
// CLI Arguments
// =============================================================================

/// CH340 USB Relay Board Control Tool
#[derive(Parser, Debug)]
#[command(name = "relay-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serial port override (e.g. /dev/ttyUSB0 or COM3)
    #[arg(short, long, global = true)]
    port: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List serial ports and flag the detected relay board
    ListPorts,

    /// Switch a single relay on
    On {
        /// Relay channel (1-8)
        #[arg(value_parser = clap::value_parser!(u8).range(1..=8))]
        channel: u8,
    },

    /// Switch a single relay off
    Off {
        /// Relay channel (1-8)
        #[arg(value_parser = clap::value_parser!(u8).range(1..=8))]
        channel: u8,
    },

    /// Switch every relay on
    AllOn,

    /// Switch every relay off
    AllOff,

    /// Switch a named function on or off
    Set {
        /// Function name from the config (e.g. charge, load_6ohm)
        name: String,

        /// Target state: on or off
        state: String,
    },

    /// Show per-channel state and the combined load
    Status,

    /// Show the combined resistance of configured loads
    Resistance {
        /// Function names to include (default: every configured load)
        names: Vec<String>,
    },

    /// Show the expected current draw at a given voltage
    Current {
        /// Battery voltage in volts
        voltage: f64,

        /// Function names to include (default: every configured load)
        names: Vec<String>,
    },

    /// Run a hardware exercise across every relay
    Test,

    /// Interactive relay console
    Interactive,

    /// Show the config file path and contents
    Config,
}

// =============================================================================
// Main
// =============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::ListPorts => cmd_list_ports(),
        Command::On { channel } => cmd_switch(args.port.as_deref(), channel, true),
        Command::Off { channel } => cmd_switch(args.port.as_deref(), channel, false),
        Command::AllOn => cmd_all(args.port.as_deref(), true),
        Command::AllOff => cmd_all(args.port.as_deref(), false),
        Command::Set { name, state } => cmd_set(args.port.as_deref(), &name, &state),
        Command::Status => cmd_status(args.port.as_deref()),
        Command::Resistance { names } => cmd_resistance(&names),
        Command::Current { voltage, names } => cmd_current(voltage, &names),
        Command::Test => cmd_test(args.port.as_deref()),
        Command::Interactive => cmd_interactive(args.port.as_deref()),
        Command::Config => cmd_config(),
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Open the driver and resolve the function mapping from config.
///
/// Port resolution order: CLI override, then the config port, then CH340
/// auto-detection.
fn open_from_config(
    cli_port: Option<&str>,
) -> Result<(RelayDriver, BTreeMap<String, FunctionDef>)> {
    let config = storage::load_config().context("Failed to load config")?;
    let (board, functions) = storage::resolve_config(&config).context("Invalid config")?;

    let port = cli_port
        .map(str::to_string)
        .or_else(|| config.hardware.port.clone());

    let driver = match port {
        Some(name) => RelayDriver::connect_port(&name, board),
        None => RelayDriver::connect(board),
    }
    .context("Failed to open relay board")?;

    Ok((driver, functions))
}

/// Pick load resistances by function name, or every configured load when no
/// names are given.
fn select_loads(functions: &BTreeMap<String, FunctionDef>, names: &[String]) -> Result<Vec<f64>> {
    if names.is_empty() {
        return Ok(functions.values().filter_map(|def| def.resistance).collect());
    }

    let mut loads = Vec::new();
    for name in names {
        let def = functions
            .get(name)
            .ok_or_else(|| RelayError::UnknownFunction { name: name.clone() })?;

        match def.resistance {
            Some(ohms) => loads.push(ohms),
            None => println!("⚠️  '{}' is switch-only; it adds no load", name),
        }
    }

    Ok(loads)
}

// =============================================================================
// Command Implementations
// =============================================================================

fn cmd_list_ports() -> Result<()> {
    let ports = list_ports().context("Failed to enumerate serial ports")?;

    if ports.is_empty() {
        println!("❌ No serial ports found.");
        return Ok(());
    }

    println!("🔍 Found {} serial port(s):\n", ports.len());
    for candidate in &ports {
        let marker = if candidate.is_relay_board() { "👉" } else { "  " };
        let vid_pid = match (candidate.vid, candidate.pid) {
            (Some(vid), Some(pid)) => format!("{:04x}:{:04x}", vid, pid),
            _ => "-".to_string(),
        };
        let product = candidate.product.as_deref().unwrap_or("unknown");

        println!("{} {:<16} {:>9}  {}", marker, candidate.name, vid_pid, product);
    }

    println!("\n👉 = detected CH340 relay board");
    Ok(())
}

fn cmd_switch(cli_port: Option<&str>, channel: u8, on: bool) -> Result<()> {
    let (mut driver, _) = open_from_config(cli_port)?;

    if on {
        driver.relay_on(channel)?;
    } else {
        driver.relay_off(channel)?;
    }

    println!("✅ Relay {} switched {}", channel, if on { "ON" } else { "OFF" });
    Ok(())
}

fn cmd_all(cli_port: Option<&str>, on: bool) -> Result<()> {
    let (mut driver, _) = open_from_config(cli_port)?;

    if on {
        driver.all_on()?;
    } else {
        driver.all_off()?;
    }

    println!(
        "✅ All {} relays switched {}",
        driver.board().channel_count(),
        if on { "ON" } else { "OFF" }
    );
    Ok(())
}

fn cmd_set(cli_port: Option<&str>, name: &str, state: &str) -> Result<()> {
    let on = parse_switch_state(state)?;

    let (mut driver, functions) = open_from_config(cli_port)?;
    let mut controller = RelayController::new(&mut driver);
    controller
        .configure(functions)
        .context("Invalid function mapping")?;

    controller.set_function(name, on)?;
    println!("✅ '{}' switched {}", name, if on { "ON" } else { "OFF" });
    Ok(())
}

fn cmd_status(cli_port: Option<&str>) -> Result<()> {
    let (mut driver, functions) = open_from_config(cli_port)?;
    let mut controller = RelayController::new(&mut driver);
    controller
        .configure(functions)
        .context("Invalid function mapping")?;

    println!("{}", controller.state_report());
    println!("States reflect commands sent by this process; the board does not report back.");
    Ok(())
}

fn cmd_resistance(names: &[String]) -> Result<()> {
    let config = storage::load_config().context("Failed to load config")?;
    let (_, functions) = storage::resolve_config(&config).context("Invalid config")?;

    let loads = select_loads(&functions, names)?;
    let total = parallel_resistance(&loads);

    if total.is_infinite() {
        println!("Open circuit (no resistive load selected)");
    } else {
        println!(
            "Combined load: {:.3} ohm ({} resistor(s) in parallel)",
            total,
            loads.len()
        );
    }

    Ok(())
}

fn cmd_current(voltage: f64, names: &[String]) -> Result<()> {
    let config = storage::load_config().context("Failed to load config")?;
    let (_, functions) = storage::resolve_config(&config).context("Invalid config")?;

    let loads = select_loads(&functions, names)?;
    let total = parallel_resistance(&loads);

    if total.is_infinite() {
        return Err(RelayError::NoActiveLoad.into());
    }

    println!(
        "⚡ {:.3} V across {:.3} ohm -> {:.3} A expected",
        voltage,
        total,
        voltage / total
    );

    Ok(())
}

fn cmd_config() -> Result<()> {
    storage::ensure_config_exists().context("Failed to create default config")?;

    let path = storage::get_config_path()?;
    println!("📄 Config file: {}\n", path.display());

    let content = std::fs::read_to_string(&path).context("Failed to read config")?;
    println!("{}", content);

    Ok(())
}

// =============================================================================
// Hardware Test
// =============================================================================

fn cmd_test(cli_port: Option<&str>) -> Result<()> {
    let (mut driver, _) = open_from_config(cli_port)?;

    println!(
        "🧪 Exercising the {} board (watch the indicator LEDs)...\n",
        driver.board()
    );

    let result = run_test_sequence(&mut driver);

    // Leave the board safe even if the sequence bailed early
    driver.all_off().ok();
    result
}

fn run_test_sequence(driver: &mut RelayDriver) -> Result<()> {
    let count = driver.board().channel_count();

    // Individual relays
    for channel in 1..=count {
        print!("Relay {}... ", channel);
        std::io::Write::flush(&mut std::io::stdout())?;

        driver.relay_on(channel)?;
        std::thread::sleep(Duration::from_millis(300));
        driver.relay_off(channel)?;
        println!("✅");
    }

    // Whole bank
    println!("All relays on...");
    driver.all_on()?;
    std::thread::sleep(Duration::from_secs(1));
    println!("All relays off...");
    driver.all_off()?;

    // Rapid switching; the driver paces commands 50 ms apart
    println!("Rapid switching on relay 1...");
    let start = Instant::now();
    for _ in 0..5 {
        driver.relay_on(1)?;
        driver.relay_off(1)?;
    }
    println!("10 commands in {:.2?}", start.elapsed());

    println!("\n✅ Test sequence complete.");
    Ok(())
}

// =============================================================================
// Interactive Console
// =============================================================================

enum ConsoleAction {
    Continue,
    Quit,
}

fn cmd_interactive(cli_port: Option<&str>) -> Result<()> {
    use std::io::{BufRead, Write};

    let (mut driver, functions) = open_from_config(cli_port)?;
    let mut controller = RelayController::new(&mut driver);
    controller
        .configure(functions)
        .context("Invalid function mapping")?;

    // Setup Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    println!("🔌 Interactive relay console ('help' for commands, 'quit' to exit)");
    println!("{}", controller.state_report());

    let stdin = std::io::stdin();
    let mut line = String::new();

    while running.load(Ordering::SeqCst) {
        print!("> ");
        std::io::stdout().flush()?;

        line.clear();
        let read = stdin.lock().read_line(&mut line).unwrap_or(0);
        if read == 0 {
            break;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match run_console_command(&mut controller, &parts) {
            Ok(ConsoleAction::Continue) => {}
            Ok(ConsoleAction::Quit) => break,
            Err(e) => eprintln!("❌ {}", e),
        }
    }

    // Safety sweep so no load is left across the battery
    controller.all_off().ok();
    println!("👋 All relays off.");

    Ok(())
}

fn run_console_command(
    controller: &mut RelayController<'_>,
    parts: &[&str],
) -> ch340_relay::Result<ConsoleAction> {
    match parts {
        ["help"] => print_console_help(),
        ["quit"] | ["exit"] => return Ok(ConsoleAction::Quit),
        ["status"] => println!("{}", controller.state_report()),
        ["all", "on"] => {
            controller.all_on()?;
            println!("All relays ON");
        }
        ["all", "off"] => {
            controller.all_off()?;
            println!("All relays OFF");
        }
        ["on", channel] => switch_channel(controller, channel, true)?,
        ["off", channel] => switch_channel(controller, channel, false)?,
        ["set", name, state] => {
            let on = parse_switch_state(state)?;
            controller.set_function(name, on)?;
            println!("'{}' -> {}", name, if on { "ON" } else { "OFF" });
        }
        ["resistance"] => {
            let total = controller.get_total_load_resistance();
            if total.is_infinite() {
                println!("Open circuit (no active load)");
            } else {
                println!("Combined load: {:.3} ohm", total);
            }
        }
        ["current", voltage] => {
            let volts = parse_voltage(voltage)?;
            let amps = controller.get_expected_current(volts)?;
            println!("Expected draw: {:.3} A", amps);
        }
        [token] => toggle(controller, token)?,
        _ => println!("Unknown command. Type 'help' for the command list."),
    }

    Ok(ConsoleAction::Continue)
}

fn switch_channel(
    controller: &mut RelayController<'_>,
    channel: &str,
    on: bool,
) -> ch340_relay::Result<()> {
    let channel = parse_channel(channel)?;

    if on {
        controller.relay_on(channel)?;
    } else {
        controller.relay_off(channel)?;
    }

    println!("Relay {} -> {}", channel, if on { "ON" } else { "OFF" });
    Ok(())
}

/// Flip a bare channel number or function name to its opposite state.
fn toggle(controller: &mut RelayController<'_>, token: &str) -> ch340_relay::Result<()> {
    let channel = if let Ok(number) = token.parse::<u8>() {
        number
    } else {
        controller
            .functions()
            .get(token)
            .ok_or_else(|| RelayError::UnknownFunction {
                name: token.to_string(),
            })?
            .channel
    };

    let on = !controller.get_state(channel);
    if on {
        controller.relay_on(channel)?;
    } else {
        controller.relay_off(channel)?;
    }

    println!("Relay {} -> {}", channel, if on { "ON" } else { "OFF" });
    Ok(())
}

fn print_console_help() {
    println!("Commands:");
    println!("  <channel>        Toggle a relay by number");
    println!("  <name>           Toggle a function by name");
    println!("  on <channel>     Switch a relay on");
    println!("  off <channel>    Switch a relay off");
    println!("  all on|off       Switch the whole bank");
    println!("  set <name> on|off  Switch a named function");
    println!("  status           Show the state table");
    println!("  resistance       Show the combined active load");
    println!("  current <volts>  Show the expected current draw");
    println!("  quit             All off and exit");
}
