//! Host gamepads through gilrs.
//!
//! Connection events attach and detach controllers; button events update
//! their live button state. gilrs gamepad ids double as instance ids.

use gilrs::{Button, EventType, Gamepad, GamepadId, Gilrs, MappingSource};

use crate::error::JoystickError;
use crate::joystick::{ControllerButton, ControllerHost, GameController, InstanceId, Joysticks};

struct GilrsController {
    id: InstanceId,
    name: String,
}

impl GameController for GilrsController {
    fn instance_id(&self) -> InstanceId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct GilrsHost {
    gilrs: Gilrs,
}

impl GilrsHost {
    pub fn new() -> Result<Self, JoystickError> {
        let gilrs = Gilrs::new().map_err(|e| JoystickError::OpenFailed {
            index: 0,
            reason: e.to_string(),
        })?;
        Ok(Self { gilrs })
    }

    /// Attach every gamepad already connected.
    pub fn attach_connected(&mut self, joysticks: &mut Joysticks) {
        let indices: Vec<u32> = self.gilrs.gamepads().map(|(id, _)| instance_id(id)).collect();
        for index in indices {
            joysticks.attach(self, index);
        }
    }

    /// Drain pending gilrs events into the controller ports.
    pub fn pump(&mut self, joysticks: &mut Joysticks) {
        while let Some(event) = self.gilrs.next_event() {
            let id = instance_id(event.id);
            match event.event {
                EventType::Connected => joysticks.attach(self, id),
                EventType::Disconnected => {
                    joysticks.detach(id);
                }
                EventType::ButtonPressed(button, _) => {
                    if let Some(button) = map_button(button) {
                        joysticks.button_down(id, button);
                    }
                }
                EventType::ButtonReleased(button, _) => {
                    if let Some(button) = map_button(button) {
                        joysticks.button_up(id, button);
                    }
                }
                _ => {}
            }
        }
    }

    fn gamepad(&self, index: u32) -> Option<Gamepad<'_>> {
        self.gilrs
            .gamepads()
            .find(|(id, _)| instance_id(*id) == index)
            .map(|(_, pad)| pad)
    }
}

impl ControllerHost for GilrsHost {
    fn is_game_controller(&self, index: u32) -> bool {
        self.gamepad(index)
            .is_some_and(|pad| pad.mapping_source() != MappingSource::None)
    }

    fn open(&mut self, index: u32) -> Result<Box<dyn GameController>, JoystickError> {
        let pad = self.gamepad(index).ok_or_else(|| JoystickError::OpenFailed {
            index,
            reason: "not connected".to_string(),
        })?;
        Ok(Box::new(GilrsController {
            id: index,
            name: pad.name().to_string(),
        }))
    }
}

fn instance_id(id: GamepadId) -> InstanceId {
    InstanceId::try_from(usize::from(id)).unwrap_or(InstanceId::MAX)
}

/// gilrs names buttons by position; the ports expect SDL's layout names.
fn map_button(button: Button) -> Option<ControllerButton> {
    Some(match button {
        Button::South => ControllerButton::A,
        Button::East => ControllerButton::B,
        Button::West => ControllerButton::X,
        Button::North => ControllerButton::Y,
        Button::Select => ControllerButton::Back,
        Button::Mode => ControllerButton::Guide,
        Button::Start => ControllerButton::Start,
        Button::LeftThumb => ControllerButton::LeftStick,
        Button::RightThumb => ControllerButton::RightStick,
        Button::LeftTrigger => ControllerButton::LeftShoulder,
        Button::RightTrigger => ControllerButton::RightShoulder,
        Button::DPadUp => ControllerButton::DPadUp,
        Button::DPadDown => ControllerButton::DPadDown,
        Button::DPadLeft => ControllerButton::DPadLeft,
        Button::DPadRight => ControllerButton::DPadRight,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_buttons_map_by_position() {
        assert_eq!(map_button(Button::South), Some(ControllerButton::A));
        assert_eq!(map_button(Button::North), Some(ControllerButton::Y));
        assert_eq!(map_button(Button::LeftTrigger2), None);
    }
}
