pub mod ast;

use tracing::{debug, info, warn};

use crate::codegen::CodeGenerator;
use crate::errors::{suggest_command, CompileError, DiagnosticLog};
use crate::lexer::keywords::COMMAND_WORDS;
use crate::lexer::{Lexer, Token, TokenKind};
use ast::*;

/// Blocks nested deeper than this are skipped with a diagnostic.
pub const MAX_BLOCK_DEPTH: usize = 64;

/// Recursive-descent parser that emits each statement as soon as it is read.
///
/// Errors never stop the parse: they go to the lexer's diagnostic log and
/// parsing resumes at the next token.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    verbose: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(source),
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn into_diagnostics(self) -> DiagnosticLog {
        self.lexer.into_diagnostics()
    }

    pub fn parse_program(&mut self, gen: &mut CodeGenerator) {
        let start_indent = gen.indent_level();
        while self.lexer.peek_token().kind != TokenKind::Eof {
            self.parse_statement(gen);
        }
        debug_assert_eq!(gen.indent_level(), start_indent, "unbalanced block nesting");
    }

    /// Parse statements up to and including the closing brace of a block
    /// whose opening brace was already consumed.
    pub fn parse_block(&mut self, gen: &mut CodeGenerator, opener: &Token, opened_by: &'static str) {
        loop {
            match self.lexer.peek_token().kind {
                TokenKind::RBrace => {
                    self.lexer.next_token();
                    return;
                }
                TokenKind::Eof => {
                    self.lexer.report(
                        opener.line,
                        opener.column,
                        CompileError::UnterminatedBlock { opened_by },
                    );
                    return;
                }
                _ => self.parse_statement(gen),
            }
        }
    }

    pub fn parse_statement(&mut self, gen: &mut CodeGenerator) {
        let token = self.lexer.next_token();
        self.trace(&token);

        let cmd = token.text.as_str();
        let stmt = match token.kind {
            TokenKind::TurnOn => Statement::LedOn { pin: self.pin_argument(cmd) },
            TokenKind::TurnOff => Statement::LedOff { pin: self.pin_argument(cmd) },
            TokenKind::Blink => {
                let pin = self.pin_argument(cmd);
                let times = self.number_argument(cmd, "blink count").unwrap_or(0);
                Statement::Blink { pin, times }
            }
            TokenKind::Fade => {
                let pin = self.pin_argument(cmd);
                let level = self.number_argument(cmd, "brightness level").unwrap_or(0);
                Statement::Fade { pin, level }
            }
            TokenKind::SetPin => {
                let pin = self.pin_argument(cmd);
                let high = self.level_argument(cmd);
                Statement::SetPin { pin, high }
            }
            TokenKind::ReadPin => Statement::ReadPin { pin: self.pin_argument(cmd) },
            TokenKind::AnalogRead => Statement::AnalogRead { pin: self.pin_argument(cmd) },
            TokenKind::ReadLight => Statement::ReadLight { pin: self.pin_argument(cmd) },
            TokenKind::Beep => {
                let pin = self.pin_argument(cmd);
                let duration_ms = self.number_argument(cmd, "duration in milliseconds").unwrap_or(0);
                Statement::Beep { pin, duration_ms }
            }
            TokenKind::PlayTone => {
                let pin = self.pin_argument(cmd);
                let frequency = self.number_argument(cmd, "frequency").unwrap_or(0);
                Statement::PlayTone { pin, frequency }
            }
            TokenKind::ReadTemperature => Statement::ReadTemperature { pin: self.pin_argument(cmd) },
            TokenKind::ReadDistance => {
                let trigger = self.number_argument(cmd, "trigger pin");
                let echo = self.number_argument(cmd, "echo pin");
                Statement::ReadDistance { trigger, echo }
            }
            TokenKind::MoveServo => {
                let pin = self.pin_argument(cmd);
                let angle = self.number_argument(cmd, "angle").unwrap_or(0);
                Statement::MoveServo { pin, angle }
            }
            TokenKind::AttachServo => Statement::AttachServo { pin: self.pin_argument(cmd) },
            TokenKind::PrintLcd => Statement::PrintLcd { message: self.string_argument(cmd) },
            TokenKind::ClearLcd => Statement::ClearLcd,
            TokenKind::PrintSerial => Statement::PrintSerial { message: self.string_argument(cmd) },
            TokenKind::Wait => Statement::Wait {
                duration_ms: self.number_argument(cmd, "duration in milliseconds").unwrap_or(0),
            },

            TokenKind::Repeat => {
                let count = self.number_argument(cmd, "repeat count").unwrap_or(0);
                // without a brace the block is dropped, not the command after it
                if self.expect_open_brace("repeat count") {
                    self.parse_block_statement(gen, &token, BlockHeader::Repeat { count });
                }
                return;
            }
            TokenKind::Forever => {
                if self.expect_open_brace("forever") {
                    self.parse_block_statement(gen, &token, BlockHeader::Forever);
                }
                return;
            }
            TokenKind::If | TokenKind::While => {
                let keyword = if token.kind == TokenKind::If { "if" } else { "while" };
                let Some(cond) = self.parse_condition(keyword) else {
                    return;
                };
                if self.expect_open_brace(keyword) {
                    let header = if token.kind == TokenKind::If {
                        BlockHeader::If(cond)
                    } else {
                        BlockHeader::While(cond)
                    };
                    self.parse_block_statement(gen, &token, header);
                }
                return;
            }

            TokenKind::PinRef => {
                self.warn_unknown_word(&token);
                return;
            }
            // Newlines, stray values and delimiters are no-ops
            _ => return,
        };

        gen.generate_statement(&stmt);
    }

    fn parse_block_statement(&mut self, gen: &mut CodeGenerator, opener: &Token, header: BlockHeader) {
        // indent level 1 is the body of loop()
        if gen.indent_level() > MAX_BLOCK_DEPTH {
            self.lexer.report(
                opener.line,
                opener.column,
                CompileError::NestingTooDeep { opened_by: header.keyword(), limit: MAX_BLOCK_DEPTH },
            );
            self.skip_block(opener, header.keyword());
            return;
        }
        gen.open_block(&header);
        self.parse_block(gen, opener, header.keyword());
        gen.close_block();
    }

    /// Drop tokens up to the brace matching an already consumed `{`, without recursing.
    fn skip_block(&mut self, opener: &Token, opened_by: &'static str) {
        let mut depth = 1usize;
        loop {
            match self.lexer.next_token().kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                TokenKind::Eof => {
                    self.lexer.report(
                        opener.line,
                        opener.column,
                        CompileError::UnterminatedBlock { opened_by },
                    );
                    return;
                }
                _ => {}
            }
        }
    }

    fn trace(&self, token: &Token) {
        if matches!(token.kind, TokenKind::Newline | TokenKind::Eof) {
            return;
        }
        if self.verbose {
            info!("line {}: {}", token.line, token.text);
        } else {
            debug!("line {}: {:?} '{}'", token.line, token.kind, token.text);
        }
    }

    fn warn_unknown_word(&self, token: &Token) {
        match suggest_command(&token.text, COMMAND_WORDS) {
            Some(suggestion) => warn!(
                "line {}: ignoring unknown word '{}' (did you mean '{}'?)",
                token.line, token.text, suggestion
            ),
            None => warn!("line {}: ignoring unknown word '{}'", token.line, token.text),
        }
    }

    /// Log a missing argument at the offending token, leaving it unconsumed.
    /// Error tokens were already reported by the lexer.
    fn missing_argument(&mut self, command: &str, expected: &'static str) {
        let next = self.lexer.peek_token();
        if next.kind == TokenKind::Error {
            return;
        }
        let (line, column) = (next.line, next.column);
        self.lexer.report(
            line,
            column,
            CompileError::MissingArgument { command: command.to_string(), expected },
        );
    }

    fn number_argument(&mut self, command: &str, expected: &'static str) -> Option<i64> {
        if self.lexer.peek_token().kind == TokenKind::Number {
            return self.lexer.next_token().value;
        }
        self.missing_argument(command, expected);
        None
    }

    fn pin_argument(&mut self, command: &str) -> Option<i64> {
        self.number_argument(command, "pin number")
    }

    fn string_argument(&mut self, command: &str) -> String {
        if self.lexer.peek_token().kind == TokenKind::Str {
            return self.lexer.next_token().text;
        }
        self.missing_argument(command, "quoted message");
        String::new()
    }

    /// `high`/`on` or a non-zero number mean HIGH; `low`/`off` or zero mean LOW.
    fn level_argument(&mut self, command: &str) -> bool {
        let next = self.lexer.peek_token();
        let level = match next.kind {
            TokenKind::High | TokenKind::TurnOn => Some(true),
            TokenKind::Low | TokenKind::TurnOff => Some(false),
            TokenKind::Number => Some(next.value.unwrap_or(0) != 0),
            _ => None,
        };
        match level {
            Some(high) => {
                self.lexer.next_token();
                high
            }
            None => {
                self.missing_argument(command, "HIGH or LOW value");
                false
            }
        }
    }

    /// Consume the `{` that opens a block, skipping newlines before it.
    /// Anything else is left in place and parsed as the next statement.
    fn expect_open_brace(&mut self, after: &'static str) -> bool {
        while self.lexer.peek_token().kind == TokenKind::Newline {
            self.lexer.next_token();
        }
        let next = self.lexer.peek_token();
        if next.kind == TokenKind::LBrace {
            self.lexer.next_token();
            return true;
        }
        let (line, column) = (next.line, next.column);
        self.lexer.report(line, column, CompileError::ExpectedOpenBrace { after });
        false
    }

    fn parse_condition(&mut self, keyword: &'static str) -> Option<Condition> {
        let left = self.parse_operand(keyword);

        let next = self.lexer.peek_token();
        let op = match next.kind {
            TokenKind::Greater => Comparison::Greater,
            TokenKind::Less => Comparison::Less,
            TokenKind::Equals => Comparison::Equal,
            TokenKind::NotEquals => Comparison::NotEqual,
            _ => {
                let (line, column) = (next.line, next.column);
                self.lexer.report(line, column, CompileError::ExpectedComparison { after: keyword });
                return None;
            }
        };
        self.lexer.next_token();

        let right = self.parse_operand(keyword);
        Some(Condition { left, op, right })
    }

    fn parse_operand(&mut self, keyword: &'static str) -> Operand {
        let next = self.lexer.peek_token();
        match next.kind {
            TokenKind::Number => Operand::Number(self.lexer.next_token().value.unwrap_or(0)),
            TokenKind::High => {
                self.lexer.next_token();
                Operand::High
            }
            TokenKind::Low => {
                self.lexer.next_token();
                Operand::Low
            }
            TokenKind::ReadPin => {
                let token = self.lexer.next_token();
                Operand::DigitalRead(self.pin_argument(&token.text))
            }
            TokenKind::AnalogRead | TokenKind::ReadLight => {
                let token = self.lexer.next_token();
                Operand::AnalogRead(self.pin_argument(&token.text))
            }
            _ => {
                self.missing_argument(keyword, "comparison operand");
                Operand::Number(0)
            }
        }
    }
}
