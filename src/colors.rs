//! Colour command helpers.
//!
//! Builds the peer colour commands (`n`, `c`, `h`) from `palette` colours so
//! scripts can be authored in floating point and stored as bytes. Colour
//! components are in the 0.0-1.0 range; hue is in degrees.

use crate::types::{Command, opcode};
use palette::{FromColor, Hsv, Srgb};

/// Creates an RGB color from HSV (Hue, Saturation, Value) components.
#[inline]
pub fn hsv(hue: f32, saturation: f32, value: f32) -> Srgb {
    Srgb::from_color(Hsv::new(hue, saturation, value))
}

/// Converts a colour to the three bytes the peer expects.
#[inline]
pub fn to_rgb8(color: Srgb) -> [u8; 3] {
    let c: Srgb<u8> = color.into_format();
    [c.red, c.green, c.blue]
}

fn unit_to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// `n`: jump to `color` immediately.
pub fn set_rgb(color: Srgb) -> Command {
    Command::new(opcode::SET_RGB, to_rgb8(color))
}

/// `c`: fade to `color` at the peer's current fade speed.
pub fn fade_to_rgb(color: Srgb) -> Command {
    Command::new(opcode::FADE_TO_RGB, to_rgb8(color))
}

/// `h`: fade to an HSV colour.
///
/// The peer takes hue, saturation and brightness as full-range bytes, so
/// 360 degrees map onto 0-255.
pub fn fade_to_hsv(hue: f32, saturation: f32, value: f32) -> Command {
    let hsv: Hsv = Hsv::new(hue, saturation, value);
    let degrees = hsv.hue.into_positive_degrees();
    Command::new(
        opcode::FADE_TO_HSV,
        [
            unit_to_byte(degrees / 360.0),
            unit_to_byte(hsv.saturation),
            unit_to_byte(hsv.value),
        ],
    )
}
