use serde::Serialize;
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::parser::ast::*;

const HEADER: &str = "// Generated by sketchc\n";
const STARTUP_MESSAGE: &str = "Program starting!";

/// Optional hardware libraries referenced by the program.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Subsystems {
    pub servo: bool,
    pub display: bool,
    pub temperature: bool,
    pub ultrasonic: bool,
}

impl Subsystems {
    pub fn any(&self) -> bool {
        self.servo || self.display || self.temperature || self.ultrasonic
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum PinMode {
    Output,
    Input,
    Servo,
}

/// Finished sketch plus what the program touched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sketch {
    pub code: String,
    pub pins: Vec<i64>,
    pub subsystems: Subsystems,
}

/// Message text as the body of a C++ string literal. Source strings have no
/// escapes of their own, so every backslash is literal.
fn escape_string(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for c in message.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

pub struct CodeGenerator {
    preamble: String,
    globals: String,
    setup: String,
    loop_code: String,
    indent_level: usize,
    subsystems: Subsystems,
    pins: Vec<i64>,
    pin_modes: Vec<(i64, PinMode)>,
    loop_delay_ms: u32,
}

impl CodeGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        CodeGenerator {
            preamble: HEADER.to_string(),
            globals: String::new(),
            setup: format!("void setup() {{\n  Serial.begin({});\n", config.baud_rate),
            loop_code: "\nvoid loop() {\n".to_string(),
            indent_level: 1,
            subsystems: Subsystems::default(),
            pins: Vec::new(),
            pin_modes: Vec::new(),
            loop_delay_ms: config.loop_delay_ms,
        }
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level
    }

    fn setup_line(&mut self, code: &str) {
        self.setup.push_str("  ");
        self.setup.push_str(code);
        self.setup.push('\n');
    }

    fn loop_line(&mut self, code: &str) {
        for _ in 0..self.indent_level {
            self.loop_code.push_str("  ");
        }
        self.loop_code.push_str(code);
        self.loop_code.push('\n');
    }

    /// Record a pin for reporting. Missing arguments render as 0 and are not recorded.
    fn register_pin(&mut self, pin: Option<i64>) -> i64 {
        match pin {
            Some(p) => {
                if !self.pins.contains(&p) {
                    self.pins.push(p);
                }
                p
            }
            None => 0,
        }
    }

    /// Register the pin and emit its setup line the first time this mode is seen.
    fn configure_pin(&mut self, pin: Option<i64>, mode: PinMode) -> i64 {
        let p = self.register_pin(pin);
        if pin.is_some() && !self.pin_modes.contains(&(p, mode)) {
            self.pin_modes.push((p, mode));
            let line = match mode {
                PinMode::Output => format!("pinMode({}, OUTPUT);", p),
                PinMode::Input => format!("pinMode({}, INPUT);", p),
                PinMode::Servo => format!("myServo.attach({});", p),
            };
            self.setup_line(&line);
        }
        p
    }

    fn ensure_servo(&mut self) {
        if self.subsystems.servo {
            return;
        }
        debug!("initializing servo subsystem");
        self.preamble.push_str("#include <Servo.h>\n");
        self.globals.push_str("Servo myServo;\n\n");
        self.subsystems.servo = true;
    }

    fn ensure_display(&mut self) {
        if self.subsystems.display {
            return;
        }
        debug!("initializing display subsystem");
        self.preamble.push_str("#include <LiquidCrystal.h>\n");
        self.globals.push_str("LiquidCrystal lcd(12, 11, 5, 4, 3, 2);\n\n");
        self.setup_line("lcd.begin(16, 2);");
        self.subsystems.display = true;
    }

    fn ensure_temperature(&mut self, pin: i64) {
        if self.subsystems.temperature {
            return;
        }
        debug!("initializing temperature subsystem on pin {}", pin);
        self.preamble.push_str("#include <DHT.h>\n");
        self.preamble.push_str(&format!("#define DHT_PIN {}\n", pin));
        self.preamble.push_str("#define DHT_TYPE DHT22\n");
        self.preamble.push_str("DHT dht(DHT_PIN, DHT_TYPE);\n\n");
        self.setup_line("dht.begin();");
        self.subsystems.temperature = true;
    }

    fn ensure_ultrasonic(&mut self, trigger: i64, echo: i64) {
        if self.subsystems.ultrasonic {
            return;
        }
        debug!("initializing ultrasonic subsystem on pins {}/{}", trigger, echo);
        self.preamble.push_str(&format!("#define TRIG_PIN {}\n", trigger));
        self.preamble.push_str(&format!("#define ECHO_PIN {}\n\n", echo));
        self.setup_line("pinMode(TRIG_PIN, OUTPUT);");
        self.setup_line("pinMode(ECHO_PIN, INPUT);");
        self.subsystems.ultrasonic = true;
    }

    pub fn generate_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::LedOn { pin } => {
                let p = self.configure_pin(*pin, PinMode::Output);
                self.loop_line(&format!("digitalWrite({}, HIGH);  // Turn on pin {}", p, p));
                self.loop_line(&format!("Serial.println(\"Pin {} turned ON\");", p));
            }

            Statement::LedOff { pin } => {
                let p = self.configure_pin(*pin, PinMode::Output);
                self.loop_line(&format!("digitalWrite({}, LOW);  // Turn off pin {}", p, p));
                self.loop_line(&format!("Serial.println(\"Pin {} turned OFF\");", p));
            }

            Statement::Blink { pin, times } => {
                let p = self.configure_pin(*pin, PinMode::Output);
                self.loop_line(&format!("// Blink pin {} for {} times", p, times));
                self.loop_line(&format!("for(int i = 0; i < {}; i++) {{", times));
                self.indent_level += 1;
                self.loop_line(&format!("digitalWrite({}, HIGH);", p));
                self.loop_line("delay(500);");
                self.loop_line(&format!("digitalWrite({}, LOW);", p));
                self.loop_line("delay(500);");
                self.indent_level -= 1;
                self.loop_line("}");
                self.loop_line(&format!("Serial.println(\"Pin {} blinked {} times\");", p, times));
            }

            Statement::Fade { pin, level } => {
                let p = self.configure_pin(*pin, PinMode::Output);
                self.loop_line(&format!("analogWrite({}, {});  // Fade pin {} to {}", p, level, p, level));
                self.loop_line(&format!("Serial.println(\"Pin {} faded to {}\");", p, level));
            }

            Statement::SetPin { pin, high } => {
                let p = self.configure_pin(*pin, PinMode::Output);
                let level = if *high { "HIGH" } else { "LOW" };
                self.loop_line(&format!("digitalWrite({}, {});  // Set pin {} {}", p, level, p, level));
            }

            Statement::ReadPin { pin } => {
                let p = self.configure_pin(*pin, PinMode::Input);
                self.loop_line(&format!("Serial.print(\"Pin {} reads: \");", p));
                self.loop_line(&format!("Serial.println(digitalRead({}));", p));
            }

            Statement::AnalogRead { pin } => {
                let p = self.register_pin(*pin);
                self.loop_line(&format!("Serial.print(\"Sensor on pin {}: \");", p));
                self.loop_line(&format!("Serial.println(analogRead({}));", p));
            }

            Statement::ReadLight { pin } => {
                let p = self.register_pin(*pin);
                self.loop_line("Serial.print(\"Light level: \");");
                self.loop_line(&format!("Serial.println(analogRead({}));", p));
            }

            Statement::Beep { pin, duration_ms } => {
                let p = self.configure_pin(*pin, PinMode::Output);
                self.loop_line(&format!("tone({}, 1000, {});  // Beep on pin {}", p, duration_ms, p));
                self.loop_line(&format!("delay({});", duration_ms));
                self.loop_line(&format!("Serial.println(\"Beep on pin {} for {}ms\");", p, duration_ms));
            }

            Statement::PlayTone { pin, frequency } => {
                let p = self.configure_pin(*pin, PinMode::Output);
                self.loop_line(&format!("tone({}, {});  // Play {} Hz on pin {}", p, frequency, frequency, p));
                self.loop_line(&format!("Serial.println(\"Playing {} Hz on pin {}\");", frequency, p));
            }

            Statement::ReadTemperature { pin } => {
                let p = self.register_pin(*pin);
                self.ensure_temperature(p);
                self.loop_line("// Read temperature");
                self.loop_line("{");
                self.indent_level += 1;
                self.loop_line("float temperature = dht.readTemperature();");
                self.loop_line("if (!isnan(temperature)) {");
                self.indent_level += 1;
                self.loop_line("Serial.print(\"Temperature: \");");
                self.loop_line("Serial.print(temperature);");
                self.loop_line("Serial.println(\" C\");");
                self.indent_level -= 1;
                self.loop_line("} else {");
                self.indent_level += 1;
                self.loop_line("Serial.println(\"Temperature sensor error\");");
                self.indent_level -= 1;
                self.loop_line("}");
                self.indent_level -= 1;
                self.loop_line("}");
            }

            Statement::ReadDistance { trigger, echo } => {
                let t = self.register_pin(*trigger);
                let e = self.register_pin(*echo);
                self.ensure_ultrasonic(t, e);
                self.loop_line("// Read ultrasonic distance");
                self.loop_line("{");
                self.indent_level += 1;
                self.loop_line("digitalWrite(TRIG_PIN, LOW);");
                self.loop_line("delayMicroseconds(2);");
                self.loop_line("digitalWrite(TRIG_PIN, HIGH);");
                self.loop_line("delayMicroseconds(10);");
                self.loop_line("digitalWrite(TRIG_PIN, LOW);");
                self.loop_line("long duration = pulseIn(ECHO_PIN, HIGH);");
                self.loop_line("float distance = duration * 0.034 / 2;");
                self.loop_line("Serial.print(\"Distance: \");");
                self.loop_line("Serial.print(distance);");
                self.loop_line("Serial.println(\" cm\");");
                self.indent_level -= 1;
                self.loop_line("}");
            }

            Statement::MoveServo { pin, angle } => {
                self.ensure_servo();
                self.configure_pin(*pin, PinMode::Servo);
                self.loop_line(&format!("myServo.write({});  // Move servo to {} degrees", angle, angle));
                self.loop_line(&format!("Serial.println(\"Servo moved to {} degrees\");", angle));
            }

            Statement::AttachServo { pin } => {
                self.ensure_servo();
                self.configure_pin(*pin, PinMode::Servo);
            }

            Statement::PrintLcd { message } => {
                self.ensure_display();
                let text = escape_string(message);
                self.loop_line("lcd.clear();");
                self.loop_line(&format!("lcd.print(\"{}\");", text));
                self.loop_line(&format!("Serial.println(\"LCD: {}\");", text));
            }

            Statement::ClearLcd => {
                self.ensure_display();
                self.loop_line("lcd.clear();");
            }

            Statement::PrintSerial { message } => {
                self.loop_line(&format!("Serial.println(\"{}\");", escape_string(message)));
            }

            Statement::Wait { duration_ms } => {
                self.loop_line(&format!("delay({});  // Wait {} milliseconds", duration_ms, duration_ms));
            }
        }
    }

    fn render_operand(&mut self, operand: &Operand) -> String {
        match operand {
            Operand::Number(n) => n.to_string(),
            Operand::High => "HIGH".to_string(),
            Operand::Low => "LOW".to_string(),
            Operand::DigitalRead(pin) => {
                let p = self.configure_pin(*pin, PinMode::Input);
                format!("digitalRead({})", p)
            }
            Operand::AnalogRead(pin) => {
                let p = self.register_pin(*pin);
                format!("analogRead({})", p)
            }
        }
    }

    fn render_condition(&mut self, cond: &Condition) -> String {
        let left = self.render_operand(&cond.left);
        let right = self.render_operand(&cond.right);
        format!("{} {} {}", left, cond.op.as_str(), right)
    }

    /// Emit the opening line of a block and indent what follows.
    pub fn open_block(&mut self, header: &BlockHeader) {
        let line = match header {
            BlockHeader::Repeat { count } => format!("for(int i = 0; i < {}; i++) {{", count),
            BlockHeader::Forever => "while(true) {".to_string(),
            BlockHeader::If(cond) => format!("if ({}) {{", self.render_condition(cond)),
            BlockHeader::While(cond) => format!("while ({}) {{", self.render_condition(cond)),
        };
        self.loop_line(&line);
        self.indent_level += 1;
    }

    pub fn close_block(&mut self) {
        debug_assert!(self.indent_level > 1, "close_block without open_block");
        self.indent_level = self.indent_level.saturating_sub(1).max(1);
        self.loop_line("}");
    }

    /// Close both routines and assemble preamble, globals, setup and loop in that order.
    pub fn finish(mut self) -> Sketch {
        self.setup_line(&format!("Serial.println(\"{}\");", STARTUP_MESSAGE));
        self.setup.push_str("}\n");
        self.loop_code.push_str(&format!(
            "\n  delay({});  // Small delay for stability\n}}\n",
            self.loop_delay_ms
        ));

        let mut code = String::with_capacity(
            self.preamble.len() + self.globals.len() + self.setup.len() + self.loop_code.len(),
        );
        code.push_str(&self.preamble);
        code.push_str(&self.globals);
        code.push_str(&self.setup);
        code.push_str(&self.loop_code);

        Sketch {
            code,
            pins: self.pins,
            subsystems: self.subsystems,
        }
    }
}
