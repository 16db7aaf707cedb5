//! Compiler from a small kid-friendly hardware command language to Arduino sketches.
//!
//! ```text
//! turn_on 13
//! repeat 3 { beep 8 200 }
//! ```
//!
//! The pipeline is single pass: the lexer feeds the parser one token at a
//! time and every statement is emitted into the [`CodeGenerator`] as soon as
//! it has been read.

pub mod codegen;
pub mod config;
pub mod errors;
pub mod lexer;
pub mod parser;

use serde::Serialize;

pub use codegen::{CodeGenerator, Sketch, Subsystems};
pub use config::{Config, GeneratorConfig};
pub use errors::{CompileError, Diagnostic};

use parser::Parser;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub verbose: bool,
    pub generator: GeneratorConfig,
}

/// Result of one compilation. Output is always produced, even with diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct Compilation {
    pub code: String,
    pub pins: Vec<i64>,
    pub subsystems: Subsystems,
    #[serde(serialize_with = "serialize_diagnostics")]
    pub diagnostics: Vec<Diagnostic>,
    /// Diagnostics past the log cap that were not kept.
    pub dropped_diagnostics: usize,
}

impl Compilation {
    /// Diagnostics as `Line <n>, Col <m>: <message>` strings.
    pub fn diagnostic_messages(&self) -> Vec<String> {
        self.diagnostics.iter().map(|d| d.to_string()).collect()
    }
}

fn serialize_diagnostics<S: serde::Serializer>(
    diagnostics: &[Diagnostic],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(diagnostics.iter().map(|d| d.to_string()))
}

pub fn compile(source: &str, verbose: bool) -> Compilation {
    compile_with(source, &CompileOptions { verbose, ..Default::default() })
}

pub fn compile_with(source: &str, options: &CompileOptions) -> Compilation {
    let mut gen = CodeGenerator::new(&options.generator);
    let mut parser = Parser::new(source).with_verbose(options.verbose);
    parser.parse_program(&mut gen);

    let log = parser.into_diagnostics();
    let dropped_diagnostics = log.dropped();
    let Sketch { code, pins, subsystems } = gen.finish();

    Compilation {
        code,
        pins,
        subsystems,
        diagnostics: log.into_entries(),
        dropped_diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MAX_DIAGNOSTICS;

    const ROBOT: &str = "// Smart robot behavior\n\
        print \"Smart robot starting!\"\n\
        print_lcd \"Robot Active\"\n\
        repeat 3 {\n\
        \x20   turn_on 13\n\
        \x20   beep 8 300\n\
        \x20   read_distance 7 6\n\
        \x20   move_servo 9 45\n\
        \x20   wait 1000\n\
        \x20   turn_off 13\n\
        \x20   wait 500\n\
        }\n\
        print_lcd \"Mission Complete\"\n\
        print \"Robot program finished!\"";

    fn section_order(code: &str) -> Vec<usize> {
        ["#include", "Servo myServo;", "void setup()", "void loop()"]
            .iter()
            .map(|needle| code.find(needle).unwrap())
            .collect()
    }

    #[test]
    fn test_robot_program() {
        let result = compile(ROBOT, false);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostic_messages());
        assert_eq!(result.pins, vec![13, 8, 7, 6, 9]);
        assert_eq!(
            result.subsystems,
            Subsystems { servo: true, display: true, temperature: false, ultrasonic: true }
        );
        let order = section_order(&result.code);
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{:?}", order);
        assert!(result.code.starts_with("// Generated by sketchc\n"));
        assert!(result.code.ends_with("  delay(100);  // Small delay for stability\n}\n"));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(compile(ROBOT, false).code, compile(ROBOT, true).code);
    }

    #[test]
    fn test_whitespace_and_comments_do_not_change_output() {
        let plain = compile("blink 13 5", false);
        let spaced = compile("  // blink it\n\n\tblink   13\t5   // five times\n\n", false);
        assert_eq!(plain.code, spaced.code);
        assert!(spaced.diagnostics.is_empty());
    }

    #[test]
    fn test_blink_loop() {
        let result = compile("blink 13 5", false);
        assert!(result.code.contains("for(int i = 0; i < 5; i++) {"));
        let high = result.code.find("digitalWrite(13, HIGH);").unwrap();
        let low = result.code.find("digitalWrite(13, LOW);").unwrap();
        assert!(high < low);
        assert_eq!(result.code.matches("delay(500);").count(), 2);
    }

    #[test]
    fn test_subsystem_includes_appear_once() {
        let source = "read_temperature 2\nread_temperature 2\nlcd \"a\"\ndisplay \"b\"\n\
                      distance 7 6\ndistance 7 6\nturn_servo 9 10\nmove_servo 9 20\n";
        let result = compile(source, false);
        for needle in [
            "#include <DHT.h>",
            "dht.begin();",
            "#include <LiquidCrystal.h>",
            "lcd.begin(16, 2);",
            "#define TRIG_PIN",
            "#include <Servo.h>",
            "myServo.attach(9);",
        ] {
            assert_eq!(result.code.matches(needle).count(), 1, "{}", needle);
        }
        assert!(result.subsystems.temperature && result.subsystems.display);
    }

    #[test]
    fn test_pins_in_first_occurrence_order() {
        let result = compile("beep 8 10\nturn_on 13\nblink 8 2\nfade 3 100\nturn_off 13", false);
        assert_eq!(result.pins, vec![8, 13, 3]);
    }

    #[test]
    fn test_diagnostics_are_capped() {
        let source = "@".repeat(MAX_DIAGNOSTICS + 7);
        let result = compile(&source, false);
        assert_eq!(result.diagnostics.len(), MAX_DIAGNOSTICS);
        assert_eq!(result.dropped_diagnostics, 7);
        assert_eq!(result.diagnostic_messages()[1], "Line 1, Col 2: Unknown character '@'");
    }

    #[test]
    fn test_errors_still_produce_output() {
        let result = compile("turn_on 13\nrepeat 2 wait 5\nprint \"oops", false);
        assert_eq!(result.diagnostics.len(), 2);
        assert!(result.code.contains("digitalWrite(13, HIGH);"));
        assert!(result.code.contains("delay(5);"));
        assert!(result.code.ends_with("}\n"));
    }

    #[test]
    fn test_backslash_and_line_break_stay_inside_literal() {
        let result = compile("print \"C:\\\"\nsay \"two\nlines\"\nwait 1", false);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostic_messages());
        assert!(result.code.contains("  Serial.println(\"C:\\\\\");\n"));
        assert!(result.code.contains("  Serial.println(\"two\\nlines\");\n"));
        assert!(result.code.contains("  delay(1);"));
    }

    #[test]
    fn test_custom_generator_config() {
        let options = CompileOptions {
            verbose: false,
            generator: GeneratorConfig { baud_rate: 57600, loop_delay_ms: 5 },
        };
        let result = compile_with("wait 1", &options);
        assert!(result.code.contains("Serial.begin(57600);"));
        assert!(result.code.contains("delay(5);  // Small delay for stability"));
    }

    #[test]
    fn test_serializes_summary() {
        let result = compile("turn_on 13\nrepeat 1 wait 1", false);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["pins"], serde_json::json!([13]));
        assert_eq!(json["subsystems"]["servo"], serde_json::json!(false));
        assert_eq!(
            json["diagnostics"][0],
            serde_json::json!("Line 2, Col 10: Expected opening brace '{' after repeat count")
        );
    }
}
