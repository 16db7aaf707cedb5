use super::TokenKind;

/// Every surface form the resolver knows, used for "did you mean" hints.
pub const COMMAND_WORDS: &[&str] = &[
    "turn_on", "light_up", "on", "turn_off", "light_off", "off",
    "blink", "flash", "fade", "dim",
    "set_pin", "pin", "read_pin", "check_pin", "analog_read", "read_sensor",
    "move_servo", "turn_servo", "attach_servo", "connect_servo",
    "read_temperature", "temp", "temperature",
    "read_distance", "distance",
    "read_light", "light", "brightness",
    "beep", "buzz", "play_tone", "tone",
    "print_lcd", "lcd", "display", "clear_lcd", "clear_display",
    "print", "say",
    "wait", "delay", "pause",
    "repeat", "loop", "forever", "always",
    "if", "when", "while",
    "high", "low",
];

/// Map a lowercase word to its token kind.
///
/// Unknown words fall back to `PinRef`, and a fallback word made only of
/// digits is demoted to `Number`.
pub fn resolve(word: &str) -> TokenKind {
    match word {
        // LED
        "turn_on" | "light_up" | "on" => TokenKind::TurnOn,
        "turn_off" | "light_off" | "off" => TokenKind::TurnOff,
        "blink" | "flash" => TokenKind::Blink,
        "fade" | "dim" => TokenKind::Fade,
        // Pins
        "set_pin" | "pin" => TokenKind::SetPin,
        "read_pin" | "check_pin" => TokenKind::ReadPin,
        "analog_read" | "read_sensor" => TokenKind::AnalogRead,
        // Servo
        "move_servo" | "turn_servo" => TokenKind::MoveServo,
        "attach_servo" | "connect_servo" => TokenKind::AttachServo,
        // Sensors
        "read_temperature" | "temp" | "temperature" => TokenKind::ReadTemperature,
        "read_distance" | "distance" => TokenKind::ReadDistance,
        "read_light" | "light" | "brightness" => TokenKind::ReadLight,
        // Sound
        "beep" | "buzz" => TokenKind::Beep,
        "play_tone" | "tone" => TokenKind::PlayTone,
        // Display
        "print_lcd" | "lcd" | "display" => TokenKind::PrintLcd,
        "clear_lcd" | "clear_display" => TokenKind::ClearLcd,
        "print" | "say" => TokenKind::PrintSerial,
        // Control flow
        "wait" | "delay" | "pause" => TokenKind::Wait,
        "repeat" | "loop" => TokenKind::Repeat,
        "forever" | "always" => TokenKind::Forever,
        "if" | "when" => TokenKind::If,
        "while" => TokenKind::While,
        // Values
        "high" => TokenKind::High,
        "low" => TokenKind::Low,
        _ if !word.is_empty() && word.bytes().all(|b| b.is_ascii_digit()) => TokenKind::Number,
        _ => TokenKind::PinRef,
    }
}
