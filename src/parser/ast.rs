//! Per-statement command values. The parser builds one, hands it to the
//! code generator and drops it before reading the next statement.

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    LedOn { pin: Option<i64> },
    LedOff { pin: Option<i64> },
    Blink { pin: Option<i64>, times: i64 },
    Fade { pin: Option<i64>, level: i64 },
    SetPin { pin: Option<i64>, high: bool },
    ReadPin { pin: Option<i64> },
    AnalogRead { pin: Option<i64> },
    ReadLight { pin: Option<i64> },
    Beep { pin: Option<i64>, duration_ms: i64 },
    PlayTone { pin: Option<i64>, frequency: i64 },
    ReadTemperature { pin: Option<i64> },
    ReadDistance { trigger: Option<i64>, echo: Option<i64> },
    MoveServo { pin: Option<i64>, angle: i64 },
    AttachServo { pin: Option<i64> },
    PrintLcd { message: String },
    ClearLcd,
    PrintSerial { message: String },
    Wait { duration_ms: i64 },
}

/// Opening line of a brace-delimited block.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockHeader {
    Repeat { count: i64 },
    Forever,
    If(Condition),
    While(Condition),
}

impl BlockHeader {
    pub fn keyword(&self) -> &'static str {
        match self {
            BlockHeader::Repeat { .. } => "repeat",
            BlockHeader::Forever => "forever",
            BlockHeader::If(_) => "if",
            BlockHeader::While(_) => "while",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    Less,
    Equal,
    NotEqual,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::Greater => ">",
            Comparison::Less => "<",
            Comparison::Equal => "==",
            Comparison::NotEqual => "!=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(i64),
    High,
    Low,
    DigitalRead(Option<i64>),
    AnalogRead(Option<i64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub left: Operand,
    pub op: Comparison,
    pub right: Operand,
}
