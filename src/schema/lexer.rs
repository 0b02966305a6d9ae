use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Lowercase identifier or keyword, with any trailing `?` / `!`.
    Ident(String),
    /// Capitalized constant (`ActiveRecord`).
    Const(String),
    /// `:name` or `:"name"`.
    Sym(String),
    Str(String),
    /// Numeric literal as written (`7.1`, `2024_01_01_000000`).
    Num(String),
    /// Hash label `name:` (keyword argument key).
    Label(String),

    LParen,     // (
    RParen,     // )
    LBracket,   // [
    RBracket,   // ]
    LBrace,     // {
    RBrace,     // }
    Comma,      // ,
    Dot,        // .
    Pipe,       // |
    Arrow,      // =>
    ColonColon, // ::
    Eq,         // =
    Newline,    // \n or ;

    /// Anything else, passed through for the interpreter to skip.
    Other(char),
    Eof,
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("unterminated string starting on line {0}")]
    UnterminatedString(usize),
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn skip_blanks_and_comments(&mut self) {
        loop {
            match self.chars.peek() {
                Some('\n') => break,
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('\\') => {
                    // Explicit line continuation.
                    self.bump();
                    if self.chars.peek() == Some(&'\n') {
                        self.bump();
                    }
                }
                Some('#') => {
                    while let Some(&c) = self.chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_word(&mut self, first: char) -> String {
        let mut s = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if let Some(&c) = self.chars.peek() {
            if c == '?' || c == '!' {
                s.push(c);
                self.bump();
            }
        }
        s
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.line;
        let mut s = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(s),
                Some('\\') => match self.bump() {
                    Some('n') if quote == '"' => s.push('\n'),
                    Some('t') if quote == '"' => s.push('\t'),
                    Some(c) if quote == '"' || c == quote || c == '\\' => s.push(c),
                    Some(c) => {
                        s.push('\\');
                        s.push(c);
                    }
                    None => return Err(LexError::UnterminatedString(start)),
                },
                Some(c) => s.push(c),
                None => return Err(LexError::UnterminatedString(start)),
            }
        }
    }

    fn read_number(&mut self, first: char) -> String {
        let mut s = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || c == '_' {
                s.push(c);
                self.bump();
            } else if c == '.' {
                // `1.5` is a float, `1.days` is a call on an integer.
                let mut ahead = self.chars.clone();
                ahead.next();
                if ahead.peek().is_some_and(|d| d.is_ascii_digit()) {
                    s.push(c);
                    self.bump();
                } else {
                    break;
                }
            } else {
                break;
            }
        }
        s
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_blanks_and_comments();

        let Some(c) = self.bump() else {
            return Ok(Token::Eof);
        };

        let tok = match c {
            '\n' | ';' => Token::Newline,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ',' => Token::Comma,
            '.' => Token::Dot,
            '|' => Token::Pipe,
            '=' => {
                if self.chars.peek() == Some(&'>') {
                    self.bump();
                    Token::Arrow
                } else {
                    Token::Eq
                }
            }
            ':' => match self.chars.peek().copied() {
                Some(':') => {
                    self.bump();
                    Token::ColonColon
                }
                Some(q @ ('"' | '\'')) => {
                    self.bump();
                    Token::Sym(self.read_string(q)?)
                }
                Some(n) if n.is_alphabetic() || n == '_' => {
                    self.bump();
                    Token::Sym(self.read_word(n))
                }
                _ => Token::Other(':'),
            },
            '"' | '\'' => {
                let s = self.read_string(c)?;
                // `"key": value` hash label
                if self.chars.peek() == Some(&':') {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.peek() != Some(&':') {
                        self.bump();
                        return Ok(Token::Label(s));
                    }
                }
                Token::Str(s)
            }
            c if c.is_ascii_digit() => Token::Num(self.read_number(c)),
            c if c.is_alphabetic() || c == '_' => {
                let word = self.read_word(c);
                if self.chars.peek() == Some(&':') {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.peek() != Some(&':') {
                        self.bump();
                        return Ok(Token::Label(word));
                    }
                }
                if c.is_uppercase() {
                    Token::Const(word)
                } else {
                    Token::Ident(word)
                }
            }
            other => Token::Other(other),
        };

        Ok(tok)
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            if tok == Token::Eof {
                tokens.push(tok);
                break;
            }
            tokens.push(tok);
        }
        Ok(tokens)
    }
}
