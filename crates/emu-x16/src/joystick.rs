//! Four SNES-style controller ports multiplexed onto VIA1 port A.
//!
//! All four ports share a latch line (PA2) and a clock line (PA3); each has
//! its own data line (PA7 for port 0 down to PA4 for port 3). While the
//! latch is high every controller's button state is captured into a shift
//! register, and each clock edge with the latch low shifts one more bit out
//! of every port at once.
//!
//! Host controllers are tracked by instance id and can be bound to any
//! port, or to none.

use std::collections::BTreeMap;

use emu_core::{Observable, Value};

use crate::error::JoystickError;

/// Host-assigned controller identity, stable while it stays connected.
pub type InstanceId = u32;

/// Number of controller ports.
pub const NUM_SLOTS: usize = 4;

/// Shift register fill above the twelve real buttons.
const SHIFT_FILL: u16 = 0xF000;

/// Data lines with nothing shifting: every port pulled up.
const JOY_DATA_IDLE: u8 = 0xF0;

/// Buttons a host game controller reports, in SDL order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerButton {
    A,
    B,
    X,
    Y,
    Back,
    Guide,
    Start,
    LeftStick,
    RightStick,
    LeftShoulder,
    RightShoulder,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
}

impl ControllerButton {
    pub const ALL: [Self; 15] = [
        Self::A,
        Self::B,
        Self::X,
        Self::Y,
        Self::Back,
        Self::Guide,
        Self::Start,
        Self::LeftStick,
        Self::RightStick,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::DPadUp,
        Self::DPadDown,
        Self::DPadLeft,
        Self::DPadRight,
    ];

    /// Button from its SDL game controller index.
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// SNES shift register bit for this button. Buttons with no SNES
    /// counterpart map to 0.
    ///
    /// Shift order is B, Y, Select, Start, Up, Down, Left, Right, A, X, L, R.
    /// Host A (bottom face button) is SNES B, host X is SNES Y, and so on.
    #[must_use]
    pub const fn mask(self) -> u16 {
        match self {
            Self::A => 1 << 0,
            Self::X => 1 << 1,
            Self::Back => 1 << 2,
            Self::Start => 1 << 3,
            Self::DPadUp => 1 << 4,
            Self::DPadDown => 1 << 5,
            Self::DPadLeft => 1 << 6,
            Self::DPadRight => 1 << 7,
            Self::B => 1 << 8,
            Self::Y => 1 << 9,
            Self::LeftShoulder => 1 << 10,
            Self::RightShoulder => 1 << 11,
            Self::Guide | Self::LeftStick | Self::RightStick => 0,
        }
    }
}

/// An open host controller. Dropping the handle closes it.
pub trait GameController {
    fn instance_id(&self) -> InstanceId;

    fn name(&self) -> &str {
        "Game controller"
    }
}

/// Host side controller enumeration.
pub trait ControllerHost {
    /// Whether the device at `index` has a game controller mapping.
    fn is_game_controller(&self, index: u32) -> bool;

    fn open(&mut self, index: u32) -> Result<Box<dyn GameController>, JoystickError>;
}

struct Controller {
    handle: Box<dyn GameController>,
    /// Live button state, active low.
    button_mask: u16,
    /// Bits not yet shifted out since the last latch.
    shift_mask: u16,
    slot: Option<usize>,
}

/// Controller registry plus the shared latch/clock shift state.
///
/// A controller has `slot == Some(s)` exactly when `slots[s]` names it.
pub struct Joysticks {
    controllers: BTreeMap<InstanceId, Controller>,
    slots: [Option<InstanceId>; NUM_SLOTS],
    latch: bool,
    clock: bool,
    data: u8,
}

impl Joysticks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            controllers: BTreeMap::new(),
            slots: [None; NUM_SLOTS],
            latch: false,
            clock: false,
            data: JOY_DATA_IDLE,
        }
    }

    /// Open the host device at `index` and put it in the first free port.
    ///
    /// Devices without a controller mapping are ignored. If all ports are
    /// taken the controller is still tracked, unbound. Attaching an already
    /// tracked controller changes nothing.
    pub fn attach(&mut self, host: &mut dyn ControllerHost, index: u32) {
        if !host.is_game_controller(index) {
            log::debug!("Joystick {index} is not a game controller");
            return;
        }
        let handle = match host.open(index) {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!("{e}");
                return;
            }
        };

        let id = handle.instance_id();
        if self.controllers.contains_key(&id) {
            return;
        }

        let slot = self.slots.iter().position(Option::is_none);
        if let Some(s) = slot {
            self.slots[s] = Some(id);
        }
        log::info!("Controller {id} ({}) attached to port {slot:?}", handle.name());
        self.controllers.insert(
            id,
            Controller {
                handle,
                button_mask: 0xFFFF,
                shift_mask: 0,
                slot,
            },
        );
    }

    /// Forget a controller and free its port. Returns the handle so the
    /// caller decides when the host device is closed.
    pub fn detach(&mut self, id: InstanceId) -> Option<Box<dyn GameController>> {
        for slot in &mut self.slots {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        match self.controllers.remove(&id) {
            Some(controller) => {
                log::info!("Controller {id} detached");
                Some(controller.handle)
            }
            None => {
                log::warn!("{}", JoystickError::UnknownInstance(id));
                None
            }
        }
    }

    /// Bind `id` to port `slot`, or clear the port when `id` is `None`.
    ///
    /// Whatever occupied the port moves to the port `id` came from, so the
    /// two swap. Errors leave everything untouched.
    pub fn remap(&mut self, slot: usize, id: Option<InstanceId>) -> Result<(), JoystickError> {
        let result = self.try_remap(slot, id);
        if let Err(e) = &result {
            log::warn!("Port remap ({slot}, {id:?}) failed: {e}");
        }
        result
    }

    fn try_remap(&mut self, slot: usize, id: Option<InstanceId>) -> Result<(), JoystickError> {
        if slot >= NUM_SLOTS {
            return Err(JoystickError::InvalidSlot(slot));
        }
        if let Some(id) = id.filter(|id| !self.controllers.contains_key(id)) {
            return Err(JoystickError::UnknownInstance(id));
        }

        let displaced = self.slots[slot];
        let vacated = match id {
            Some(id) => self.controllers.get(&id).and_then(|c| c.slot),
            None => None,
        };
        if displaced == id {
            return Ok(());
        }

        self.slots[slot] = id;
        if let Some(controller) = id.and_then(|id| self.controllers.get_mut(&id)) {
            controller.slot = Some(slot);
        }

        if let Some(vacated) = vacated {
            self.slots[vacated] = None;
        }
        if let Some(displaced) = displaced {
            match self.controllers.get_mut(&displaced) {
                Some(controller) => {
                    controller.slot = vacated;
                    if let Some(vacated) = vacated {
                        self.slots[vacated] = Some(displaced);
                    }
                }
                None => log::error!("Port {slot} named unknown controller {displaced}"),
            }
        }
        Ok(())
    }

    pub fn button_down(&mut self, id: InstanceId, button: ControllerButton) {
        match self.controllers.get_mut(&id) {
            Some(controller) => controller.button_mask &= !button.mask(),
            None => log::warn!("{}", JoystickError::UnknownInstance(id)),
        }
    }

    pub fn button_up(&mut self, id: InstanceId, button: ControllerButton) {
        match self.controllers.get_mut(&id) {
            Some(controller) => controller.button_mask |= button.mask(),
            None => log::warn!("{}", JoystickError::UnknownInstance(id)),
        }
    }

    /// Drive the shared latch line. While high, every controller's button
    /// state is captured and the first bit is presented.
    pub fn set_latch(&mut self, level: bool) {
        self.latch = level;
        if level {
            for controller in self.controllers.values_mut() {
                controller.shift_mask = controller.button_mask | SHIFT_FILL;
            }
            self.shift_out();
        }
    }

    /// Drive the shared clock line. A rising edge with the latch low
    /// presents the next bit on every port.
    pub fn set_clock(&mut self, level: bool) {
        let rising = level && !self.clock;
        self.clock = level;
        if rising && !self.latch {
            self.shift_out();
        }
    }

    /// Data lines as they appear on PA7..PA4. Ports without a controller
    /// read high.
    #[must_use]
    pub fn data(&self) -> u8 {
        self.data
    }

    #[must_use]
    pub fn latch(&self) -> bool {
        self.latch
    }

    /// Port a controller is bound to. `None` for unknown controllers,
    /// `Some(None)` for tracked but unbound ones.
    #[must_use]
    pub fn slot_of(&self, id: InstanceId) -> Option<Option<usize>> {
        self.controllers.get(&id).map(|c| c.slot)
    }

    #[must_use]
    pub fn button_mask(&self, id: InstanceId) -> Option<u16> {
        self.controllers.get(&id).map(|c| c.button_mask)
    }

    /// Tracked controllers with their port.
    pub fn controllers(&self) -> impl Iterator<Item = (InstanceId, &dyn GameController, Option<usize>)> {
        self.controllers
            .iter()
            .map(|(&id, c)| (id, c.handle.as_ref(), c.slot))
    }

    /// Every port with the controller bound to it, if any.
    pub fn slots(&self) -> impl Iterator<Item = (usize, Option<(InstanceId, &dyn GameController)>)> {
        self.slots.iter().enumerate().map(|(slot, id)| {
            let bound = id.and_then(|id| match self.controllers.get(&id) {
                Some(c) => Some((id, c.handle.as_ref())),
                None => {
                    log::error!("Port {slot} names unknown controller {id}");
                    None
                }
            });
            (slot, bound)
        })
    }

    /// Check that ports and controllers agree with each other.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let ports_agree = self.slots.iter().enumerate().all(|(slot, id)| {
            id.is_none_or(|id| {
                self.controllers
                    .get(&id)
                    .is_some_and(|c| c.slot == Some(slot))
            })
        });
        let controllers_agree = self
            .controllers
            .iter()
            .all(|(&id, c)| c.slot.is_none_or(|s| self.slots[s] == Some(id)));
        ports_agree && controllers_agree
    }

    fn shift_out(&mut self) {
        self.data = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            let bit = 0x80 >> index;
            let Some(id) = *slot else {
                self.data |= bit;
                continue;
            };
            match self.controllers.get_mut(&id) {
                Some(controller) => {
                    if controller.shift_mask & 1 != 0 {
                        self.data |= bit;
                    }
                    controller.shift_mask >>= 1;
                }
                None => {
                    log::error!("Port {index} names unknown controller {id}");
                    self.data |= bit;
                }
            }
        }
    }
}

impl Default for Joysticks {
    fn default() -> Self {
        Self::new()
    }
}

impl Observable for Joysticks {
    fn query(&self, path: &str) -> Option<Value> {
        let value: Value = match path {
            "latch" => self.latch.into(),
            "clock" => self.clock.into(),
            "data" => self.data.into(),
            "controllers" => u32::try_from(self.controllers.len()).unwrap_or(u32::MAX).into(),
            _ => {
                let slot: usize = path.strip_prefix("slot.")?.parse().ok()?;
                (*self.slots.get(slot)?).into()
            }
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "latch",
            "clock",
            "data",
            "controllers",
            "slot.0",
            "slot.1",
            "slot.2",
            "slot.3",
        ]
    }
}
