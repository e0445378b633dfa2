//! Load-modeling controller built on top of the relay driver.
//!
//! Maps named board functions (charge relay, resistive loads) onto relay
//! channels and derives electrical quantities from which loads are active.

use std::collections::BTreeMap;

use crate::control::report::{ChannelReport, StateReport};
use crate::device::RelayDriver;
use crate::error::{RelayError, Result};
use crate::protocol::BoardType;

// =============================================================================
// Function Definitions
// =============================================================================

/// A named board function wired to one relay channel.
///
/// Functions with a resistance are loads and participate in the parallel
/// resistance combination; functions without one (e.g. a charge relay) are
/// plain named switches.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// Relay channel the function is wired to (1-based).
    pub channel: u8,
    /// Load resistance in ohms, or `None` for switch-only functions.
    pub resistance: Option<f64>,
}

impl FunctionDef {
    /// A resistive load on `channel`.
    pub fn load(channel: u8, ohms: f64) -> Self {
        Self {
            channel,
            resistance: Some(ohms),
        }
    }

    /// A switch-only function on `channel`.
    pub fn switch(channel: u8) -> Self {
        Self {
            channel,
            resistance: None,
        }
    }
}

/// Validate a function mapping against a board size.
///
/// Used by [`RelayController::configure`] and by the config loader, so load
/// definitions are checked the same way whether they reach a live driver or
/// only the offline load math.
///
/// # Errors
/// Returns `InvalidConfiguration` on an out-of-range channel, a channel
/// assigned to two functions, or a non-positive resistance.
pub fn validate_functions(
    board: BoardType,
    functions: &BTreeMap<String, FunctionDef>,
) -> Result<()> {
    let mut assigned: BTreeMap<u8, &str> = BTreeMap::new();

    for (name, def) in functions {
        if board.validate_channel(def.channel).is_err() {
            return Err(RelayError::InvalidConfiguration {
                message: format!(
                    "function '{}' references channel {} on a {} board",
                    name, def.channel, board
                ),
            });
        }

        if let Some(other) = assigned.insert(def.channel, name) {
            return Err(RelayError::InvalidConfiguration {
                message: format!(
                    "functions '{}' and '{}' are both assigned to channel {}",
                    other, name, def.channel
                ),
            });
        }

        if let Some(ohms) = def.resistance
            && !(ohms.is_finite() && ohms > 0.0)
        {
            return Err(RelayError::InvalidConfiguration {
                message: format!("function '{}' has invalid resistance {} ohm", name, ohms),
            });
        }
    }

    Ok(())
}

/// Parallel combination of resistances: `1 / total = sum(1 / R_i)`.
///
/// Returns `f64::INFINITY` for an empty slice (open circuit).
pub fn parallel_resistance(loads: &[f64]) -> f64 {
    let reciprocal_sum: f64 = loads.iter().map(|ohms| 1.0 / ohms).sum();

    if reciprocal_sum == 0.0 {
        f64::INFINITY
    } else {
        1.0 / reciprocal_sum
    }
}

// =============================================================================
// RelayController
// =============================================================================

/// Controller translating named function toggles into relay commands.
///
/// Holds an exclusive borrow of the driver for its lifetime; the function
/// mapping is static configuration, replaced only through [`configure`].
///
/// [`configure`]: RelayController::configure
///
/// # Example
///
/// ```no_run
/// use std::collections::BTreeMap;
/// use ch340_relay::control::{FunctionDef, RelayController};
/// use ch340_relay::device::RelayDriver;
/// use ch340_relay::protocol::BoardType;
///
/// let mut driver = RelayDriver::connect(BoardType::FourChannel)?;
/// let mut controller = RelayController::new(&mut driver);
///
/// let mut functions = BTreeMap::new();
/// functions.insert("charge".to_string(), FunctionDef::switch(1));
/// functions.insert("load_6ohm".to_string(), FunctionDef::load(2, 6.0));
/// controller.configure(functions)?;
///
/// controller.set_function("load_6ohm", true)?;
/// let amps = controller.get_expected_current(4.2)?;
/// println!("Expected draw: {:.2} A", amps);
/// # Ok::<(), ch340_relay::error::RelayError>(())
/// ```
pub struct RelayController<'d> {
    driver: &'d mut RelayDriver,
    functions: BTreeMap<String, FunctionDef>,
}

impl<'d> RelayController<'d> {
    /// Create a controller over `driver` with no functions configured.
    pub fn new(driver: &'d mut RelayDriver) -> Self {
        Self {
            driver,
            functions: BTreeMap::new(),
        }
    }

    /// Replace the function mapping.
    ///
    /// Every definition is validated against the driver's board size before
    /// anything is replaced; on error the previous mapping stays in effect.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` on an out-of-range channel, a channel
    /// assigned to two functions, or a non-positive resistance.
    pub fn configure(&mut self, functions: BTreeMap<String, FunctionDef>) -> Result<()> {
        validate_functions(self.driver.board(), &functions)?;
        self.functions = functions;
        Ok(())
    }

    /// Switch a named function on or off.
    ///
    /// # Errors
    /// Returns `UnknownFunction` for an unconfigured name; driver errors
    /// propagate unchanged.
    pub fn set_function(&mut self, name: &str, on: bool) -> Result<()> {
        let channel = self
            .functions
            .get(name)
            .ok_or_else(|| RelayError::UnknownFunction {
                name: name.to_string(),
            })?
            .channel;

        if on {
            self.driver.relay_on(channel)
        } else {
            self.driver.relay_off(channel)
        }
    }

    /// The configured function mapping.
    pub fn functions(&self) -> &BTreeMap<String, FunctionDef> {
        &self.functions
    }

    /// Names and resistances of the loads currently ON.
    pub fn active_loads(&self) -> Vec<(&str, f64)> {
        self.functions
            .iter()
            .filter_map(|(name, def)| {
                let ohms = def.resistance?;
                if self.driver.get_state(def.channel) {
                    Some((name.as_str(), ohms))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Parallel combination of every load whose channel is ON.
    ///
    /// Returns `f64::INFINITY` when no load is active (open circuit).
    pub fn get_total_load_resistance(&self) -> f64 {
        let loads: Vec<f64> = self
            .active_loads()
            .iter()
            .map(|(_, ohms)| *ohms)
            .collect();

        parallel_resistance(&loads)
    }

    /// Expected current draw in amps at `voltage` across the active loads.
    ///
    /// # Errors
    /// Returns `NoActiveLoad` when no resistive load is ON. The circuit is
    /// open in that state, so the expected current is reported as an error
    /// rather than 0 A (which would alias a genuine zero reading).
    pub fn get_expected_current(&self, voltage: f64) -> Result<f64> {
        let total = self.get_total_load_resistance();

        if total.is_infinite() {
            return Err(RelayError::NoActiveLoad);
        }

        Ok(voltage / total)
    }

    /// Switch a relay directly by channel, bypassing the function mapping.
    pub fn relay_on(&mut self, channel: u8) -> Result<()> {
        self.driver.relay_on(channel)
    }

    /// Switch a relay off directly by channel.
    pub fn relay_off(&mut self, channel: u8) -> Result<()> {
        self.driver.relay_off(channel)
    }

    /// Believed state of a channel.
    pub fn get_state(&self, channel: u8) -> bool {
        self.driver.get_state(channel)
    }

    /// Switch every relay on.
    pub fn all_on(&mut self) -> Result<()> {
        self.driver.all_on()
    }

    /// Switch every relay off.
    pub fn all_off(&mut self) -> Result<()> {
        self.driver.all_off()
    }

    /// Snapshot of per-channel state, function assignments, and load totals.
    pub fn state_report(&self) -> StateReport {
        let channels = self
            .driver
            .states()
            .into_iter()
            .map(|(channel, on)| {
                let function = self
                    .functions
                    .iter()
                    .find(|(_, def)| def.channel == channel);

                ChannelReport {
                    channel,
                    function: function.map(|(name, _)| name.clone()),
                    resistance: function.and_then(|(_, def)| def.resistance),
                    on,
                }
            })
            .collect();

        StateReport {
            board: self.driver.board(),
            channels,
            total_resistance: self.get_total_load_resistance(),
        }
    }
}
