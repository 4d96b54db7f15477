use num_traits::{One, PrimInt};

/// A flag enum whose discriminant selects a bit in some integer storage.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must stay below the bit width of `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// Plain bitmask container over a primitive integer.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    pub fn has_any<U: FlagBitmask<Storage = T> + Copy>(&self, tags: &[U]) -> bool {
        let combined = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        (self.bits & combined) != T::zero()
    }

    pub fn clear(&mut self) {
        self.bits = T::zero();
    }
}

/// Logical player controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Control {
    Forward,
    Backward,
    Left,
    Right,
    Jump,
}

impl FlagBitmask for Control {
    type Storage = u8;

    fn bit_index(&self) -> u8 {
        *self as u8
    }
}

impl Control {
    pub const ALL: [Control; 5] = [
        Control::Forward,
        Control::Backward,
        Control::Left,
        Control::Right,
        Control::Jump,
    ];

    /// Map a DOM-style key code (W, S, A, D, Space) to a control.
    pub fn from_key_code(code: u32) -> Option<Self> {
        match code {
            87 => Some(Control::Forward),
            83 => Some(Control::Backward),
            65 => Some(Control::Left),
            68 => Some(Control::Right),
            32 => Some(Control::Jump),
            _ => None,
        }
    }
}

/// Current pressed state of every control.
///
/// Written by whatever owns the keyboard, read once per frame by the player controller.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct InputState {
    flags: BitmaskFlags<u8>,
}

impl InputState {
    pub fn press(&mut self, control: Control) {
        self.flags.add(control);
    }

    pub fn release(&mut self, control: Control) {
        self.flags.remove(control);
    }

    pub fn set(&mut self, control: Control, pressed: bool) {
        if pressed {
            self.press(control);
        } else {
            self.release(control);
        }
    }

    pub fn is_pressed(&self, control: Control) -> bool {
        self.flags.has(control)
    }

    pub fn any_pressed(&self, controls: &[Control]) -> bool {
        self.flags.has_any(controls)
    }

    pub fn release_all(&mut self) {
        self.flags.clear();
    }

    /// Build a state with `controls` held.
    pub fn holding(controls: &[Control]) -> Self {
        let mut state = Self::default();
        for &c in controls {
            state.press(c);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controls_use_distinct_bits() {
        let combined = Control::ALL.iter().fold(0u8, |acc, c| {
            assert_eq!(acc & c.mask(), 0);
            acc | c.mask()
        });
        assert_eq!(combined.count_ones(), 5);
    }

    #[test]
    fn press_and_release_are_independent() {
        let mut input = InputState::default();
        input.press(Control::Forward);
        input.press(Control::Left);
        assert!(input.is_pressed(Control::Forward));
        assert!(input.is_pressed(Control::Left));
        assert!(!input.is_pressed(Control::Jump));

        input.release(Control::Forward);
        assert!(!input.is_pressed(Control::Forward));
        assert!(input.is_pressed(Control::Left));
        assert!(input.any_pressed(&[Control::Left, Control::Right]));
        assert!(!input.any_pressed(&[Control::Forward, Control::Backward]));
    }

    #[test]
    fn key_codes_map_to_controls() {
        assert_eq!(Control::from_key_code(87), Some(Control::Forward));
        assert_eq!(Control::from_key_code(32), Some(Control::Jump));
        assert_eq!(Control::from_key_code(13), None);
    }
}
