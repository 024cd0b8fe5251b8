use std::fmt;

/// Keyboard key identifier.
///
/// Only keys with a dedicated meaning somewhere in the workspace are named;
/// everything else is carried as `Other` with the platform key code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Space,
    /// Shift, Control, Alt or the OS key.
    Modifier,
    Other(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MouseButtonState {
    Pressed,
    Released,
}

/// Modifier keys state.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Pointer move event in logical pixels, relative to the window's client area.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerMoveEvent {
    pub x: f32,
    pub y: f32,
}

/// Pointer button event.
///
/// Carries the last known pointer position, since button events themselves
/// have none.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerButtonEvent {
    pub button: MouseButton,
    pub state: MouseButtonState,
    pub x: f32,
    pub y: f32,
    pub modifiers: Modifiers,
}

/// Platform-agnostic input events emitted by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    ModifiersChanged(Modifiers),

    Key {
        key: Key,
        state: KeyState,
        modifiers: Modifiers,
        /// True when the event is an auto-repeat of a held key.
        repeat: bool,
    },

    PointerMoved(PointerMoveEvent),
    PointerButton(PointerButtonEvent),

    /// Pointer left the window surface.
    PointerLeft,

    /// Window focus change.
    Focused(bool),
}

impl InputEvent {
    /// True for any key going down, auto-repeats included.
    pub fn is_key_press(&self) -> bool {
        matches!(self, InputEvent::Key { state: KeyState::Pressed, .. })
    }

    /// True for any mouse button going down.
    pub fn is_button_press(&self) -> bool {
        matches!(
            self,
            InputEvent::PointerButton(PointerButtonEvent { state: MouseButtonState::Pressed, .. })
        )
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(state: KeyState, repeat: bool) -> InputEvent {
        InputEvent::Key { key: Key::Space, state, modifiers: Modifiers::default(), repeat }
    }

    fn button(state: MouseButtonState) -> InputEvent {
        InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Right,
            state,
            x: 0.0,
            y: 0.0,
            modifiers: Modifiers::default(),
        })
    }

    #[test]
    fn repeats_count_as_key_press_releases_do_not() {
        assert!(key(KeyState::Pressed, false).is_key_press());
        assert!(key(KeyState::Pressed, true).is_key_press());
        assert!(!key(KeyState::Released, false).is_key_press());
    }

    #[test]
    fn button_press_ignores_release() {
        assert!(button(MouseButtonState::Pressed).is_button_press());
        assert!(!button(MouseButtonState::Released).is_button_press());
        assert!(!InputEvent::PointerLeft.is_button_press());
    }
}
