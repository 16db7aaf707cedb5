pub mod keywords;

use std::iter::Peekable;
use std::str::Chars;

use crate::errors::{CompileError, Diagnostic, DiagnosticLog};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // LED
    TurnOn, TurnOff, Blink, Fade,

    // Pins
    SetPin, ReadPin, AnalogRead,

    // Servo
    MoveServo, AttachServo,

    // Sensors
    ReadTemperature, ReadDistance, ReadLight,

    // Sound
    Beep, PlayTone,

    // Display
    PrintLcd, ClearLcd, PrintSerial,

    // Control flow
    Wait, Repeat, Forever, If, While,

    // Comparisons
    Greater, Less, Equals, NotEquals,

    // Values
    Number, Str, High, Low, PinRef,

    // Delimiters
    LBrace, RBrace, LParen, RParen, Comma, Semicolon,

    // Special
    Newline, Eof, Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub value: Option<i64>,
    pub line: usize,
    pub column: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Token { kind, text: text.into(), value: None, line, column }
    }
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    peeked: Option<Token>,
    diagnostics: DiagnosticLog,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input: input.chars().peekable(),
            line: 1,
            column: 1,
            peeked: None,
            diagnostics: DiagnosticLog::new(),
        }
    }

    pub fn report(&mut self, line: usize, column: usize, error: CompileError) {
        self.diagnostics.push(Diagnostic::new(line, column, error));
    }

    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> DiagnosticLog {
        self.diagnostics
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token {
        match self.peeked.take() {
            Some(token) => token,
            None => self.scan(),
        }
    }

    /// Look at the next token without consuming it.
    pub fn peek_token(&mut self) -> &Token {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.scan(),
        };
        self.peeked.insert(token)
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.next();
        if let Some(c) = ch {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        ch
    }

    fn peek(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.input.clone();
        ahead.next();
        ahead.next()
    }

    /// Skip blanks and `//` comments. Newlines are left for the scanner.
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() && ch != '\n' {
                self.advance();
            } else if ch == '/' && self.peek_second() == Some('/') {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn scan(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        let line = self.line;
        let column = self.column;

        let Some(ch) = self.peek() else {
            return Token::new(TokenKind::Eof, "", line, column);
        };

        if ch.is_ascii_digit() {
            return self.read_number(line, column);
        }
        if ch == '"' {
            return self.read_string(line, column);
        }
        if ch.is_ascii_alphabetic() || ch == '_' {
            return self.read_word(line, column);
        }

        let pair = match (ch, self.peek_second()) {
            ('=', Some('=')) => Some((TokenKind::Equals, "==")),
            ('!', Some('=')) => Some((TokenKind::NotEquals, "!=")),
            _ => None,
        };
        if let Some((kind, text)) = pair {
            self.advance();
            self.advance();
            return Token::new(kind, text, line, column);
        }

        self.advance();
        let kind = match ch {
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '<' => TokenKind::Less,
            '>' => TokenKind::Greater,
            '\n' => TokenKind::Newline,
            other => {
                self.report(line, column, CompileError::UnknownCharacter(other));
                TokenKind::Error
            }
        };
        Token::new(kind, ch.to_string(), line, column)
    }

    fn read_number(&mut self, line: usize, column: usize) -> Token {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.advance();
        }

        match digits.parse::<i64>() {
            Ok(n) => Token {
                kind: TokenKind::Number,
                text: digits,
                value: Some(n),
                line,
                column,
            },
            Err(_) => {
                self.report(line, column, CompileError::IntegerOutOfRange(digits.clone()));
                Token::new(TokenKind::Error, digits, line, column)
            }
        }
    }

    /// No escape processing: content runs to the next double quote.
    fn read_string(&mut self, line: usize, column: usize) -> Token {
        self.advance();
        let mut content = String::new();
        loop {
            match self.advance() {
                Some('"') => {
                    return Token::new(TokenKind::Str, content, line, column);
                }
                Some(c) => content.push(c),
                None => {
                    self.report(line, column, CompileError::UnterminatedString);
                    return Token::new(TokenKind::Error, content, line, column);
                }
            }
        }
    }

    fn read_word(&mut self, line: usize, column: usize) -> Token {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            word.push(c);
            self.advance();
        }

        let kind = keywords::resolve(&word.to_ascii_lowercase());
        let value = if kind == TokenKind::Number {
            word.parse::<i64>().ok()
        } else {
            None
        };
        Token { kind, text: word, value, line, column }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_command_with_arguments() {
        let tokens = Lexer::new("blink 13 5").tokenize();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].kind, TokenKind::Blink);
        assert_eq!(tokens[1].kind, TokenKind::Number);
        assert_eq!(tokens[1].value, Some(13));
        assert_eq!(tokens[2].value, Some(5));
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let tokens = Lexer::new("Turn_On 13").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::TurnOn);
        assert_eq!(tokens[0].text, "Turn_On");
    }

    #[test]
    fn test_positions() {
        let tokens = Lexer::new("wait 10\n  beep 8 200").tokenize();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 6));
        assert_eq!(tokens[2].kind, TokenKind::Newline);
        assert_eq!((tokens[3].line, tokens[3].column), (2, 3));
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("// say hi\nwait 5 // trailing\n"),
            vec![
                TokenKind::Newline,
                TokenKind::Wait,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_literal_has_no_escapes() {
        let tokens = Lexer::new(r#"print "a\nb""#).tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Str);
        assert_eq!(tokens[1].text, r"a\nb");
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("print \"hello");
        let tokens = lexer.tokenize();
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Str));
        assert_eq!(tokens[1].kind, TokenKind::Error);
        let diags = lexer.diagnostics().entries();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].error, CompileError::UnterminatedString);
        assert_eq!(diags[0].to_string(), "Line 1, Col 7: Unterminated string");
    }

    #[test]
    fn test_operators_and_delimiters() {
        assert_eq!(
            kinds("== != < > { } ( ) , ;"),
            vec![
                TokenKind::Equals,
                TokenKind::NotEquals,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unknown_character_recovers() {
        let mut lexer = Lexer::new("wait @ 10");
        assert_eq!(
            lexer.tokenize().into_iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::Wait, TokenKind::Error, TokenKind::Number, TokenKind::Eof]
        );
        assert_eq!(lexer.diagnostics().entries()[0].error, CompileError::UnknownCharacter('@'));
    }

    #[test]
    fn test_lone_equals_and_bang_are_unknown() {
        let mut lexer = Lexer::new("= !");
        let tokens = lexer.tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(lexer.diagnostics().entries().len(), 2);
    }

    #[test]
    fn test_multibyte_input_advances_by_char() {
        let mut lexer = Lexer::new("wait é 5");
        let tokens = lexer.tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[2].value, Some(5));
        assert_eq!(tokens[2].column, 8);
    }

    #[test]
    fn test_integer_overflow_is_reported() {
        let mut lexer = Lexer::new("wait 99999999999999999999");
        let tokens = lexer.tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert!(matches!(
            lexer.diagnostics().entries()[0].error,
            CompileError::IntegerOutOfRange(_)
        ));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::new("beep 8");
        assert_eq!(lexer.peek_token().kind, TokenKind::Beep);
        assert_eq!(lexer.peek_token().kind, TokenKind::Beep);
        assert_eq!(lexer.next_token().kind, TokenKind::Beep);
        assert_eq!(lexer.next_token().value, Some(8));
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_peek_after_next_scans_fresh_token() {
        let mut lexer = Lexer::new("wait 5\nbeep");
        assert_eq!(lexer.next_token().kind, TokenKind::Wait);
        assert_eq!(lexer.peek_token().value, Some(5));
        assert_eq!(lexer.next_token().value, Some(5));
        assert_eq!(lexer.peek_token().kind, TokenKind::Newline);
        assert_eq!(lexer.next_token().kind, TokenKind::Newline);
        assert_eq!(lexer.peek_token().kind, TokenKind::Beep);
        assert_eq!(lexer.peek_token().line, 2);
    }
}
