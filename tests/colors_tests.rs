//! Integration tests for colors module

use ir_bridge::Srgb;
use ir_bridge::colors;
use ir_bridge::types::opcode;

fn colors_equal(a: Srgb, b: Srgb) -> bool {
    const EPSILON: f32 = 0.01;
    (a.red - b.red).abs() < EPSILON
        && (a.green - b.green).abs() < EPSILON
        && (a.blue - b.blue).abs() < EPSILON
}

#[test]
fn hsv_creates_primary_colors() {
    assert!(colors_equal(colors::hsv(0.0, 1.0, 1.0), Srgb::new(1.0, 0.0, 0.0)));
    assert!(colors_equal(colors::hsv(120.0, 1.0, 1.0), Srgb::new(0.0, 1.0, 0.0)));
    assert!(colors_equal(colors::hsv(240.0, 1.0, 1.0), Srgb::new(0.0, 0.0, 1.0)));
}

#[test]
fn rgb_commands_carry_byte_components() {
    let purple = Srgb::new(1.0, 0.0, 1.0);

    let now = colors::set_rgb(purple);
    assert_eq!(now.opcode, opcode::SET_RGB);
    assert_eq!(now.args, [0xFF, 0x00, 0xFF]);

    let fade = colors::fade_to_rgb(purple);
    assert_eq!(fade.opcode, opcode::FADE_TO_RGB);
    assert_eq!(fade.args, [0xFF, 0x00, 0xFF]);
}

#[test]
fn out_of_range_components_clamp() {
    assert_eq!(colors::to_rgb8(Srgb::new(1.5, -0.5, 0.0)), [255, 0, 0]);
}

#[test]
fn hsv_command_scales_hue_to_byte() {
    let blue = colors::fade_to_hsv(240.0, 1.0, 0.5);
    assert_eq!(blue.opcode, opcode::FADE_TO_HSV);
    assert_eq!(blue.args, [170, 255, 128]);

    // 360 degrees is red again
    assert_eq!(colors::fade_to_hsv(360.0, 1.0, 1.0).args[0], 0);
}
