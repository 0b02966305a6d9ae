//! Tolerant interpreter for schema.rb text the line reader cannot handle.
//!
//! The input is tokenized and walked as a sequence of method calls. Only a
//! closed set of calls has an effect; everything else, including unknown
//! table helpers and whole `if`/`def`/`class` bodies, is skipped. Results go
//! straight into the caller's [`Collected`].

use regex::Regex;
use std::sync::OnceLock;

use super::collect::{Collected, Reference};
use super::lexer::{LexError, Lexer, Token};
use super::types::{column_type, mapped_type};

#[derive(Debug, thiserror::Error)]
pub enum InterpError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("unexpected end of input inside `{0}` block")]
    UnclosedBlock(String),
}

/// Strip constructs the interpreter does not need: the versioned
/// `ActiveRecord::Schema[7.1]` receiver and whole index/constraint lines.
pub fn sanitize(text: &str) -> String {
    static VERSIONED: OnceLock<Regex> = OnceLock::new();
    let re = VERSIONED.get_or_init(|| {
        Regex::new(r"ActiveRecord::Schema\[[^\]]*\]").expect("schema version pattern must compile")
    });
    let text = re.replace_all(text, "ActiveRecord::Schema");

    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let t = line.trim_start();
        if ["t.index", "add_index", "t.check_constraint", "check_constraint"]
            .iter()
            .any(|p| t.starts_with(p))
        {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Sanitize, tokenize and interpret `text` into `out`.
pub fn run(text: &str, out: &mut Collected) -> Result<(), InterpError> {
    let tokens = Lexer::new(&sanitize(text)).tokenize()?;
    Interpreter::new(tokens, out).program()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Sym(String),
    Num(String),
    Bool(bool),
    Nil,
    Array(Vec<Value>),
    Hash(Vec<(String, Value)>),
    /// Bare identifier or constant (a variable or a nullary call).
    Ident(String),
    /// Anything the interpreter does not evaluate.
    Other,
}

impl Value {
    /// Literal name: a string or a symbol.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Sym(s) => Some(s),
            _ => None,
        }
    }

    pub fn truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Hash(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Call {
    /// Dotted receiver path (`t`, `ActiveRecord::Schema`).
    pub receiver: Option<String>,
    pub method: String,
    pub args: Vec<Value>,
    pub options: Vec<(String, Value)>,
}

impl Call {
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn flag(&self, key: &str) -> bool {
        self.option(key).is_some_and(Value::truthy)
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter_map(Value::as_name)
    }
}

/// Applies `t.<method>` calls of one `create_table` block.
pub struct TableBuilder<'a> {
    table: &'a str,
    out: &'a mut Collected,
}

impl<'a> TableBuilder<'a> {
    pub fn new(table: &'a str, out: &'a mut Collected) -> Self {
        Self { table, out }
    }

    pub fn apply(&mut self, call: &Call) {
        match call.method.as_str() {
            "column" => {
                if let (Some(name), Some(typ)) = (
                    call.args.first().and_then(Value::as_name),
                    call.args.get(1).and_then(Value::as_name),
                ) {
                    self.out.add_column(self.table, name, &column_type(typ));
                }
            }
            "references" | "belongs_to" => self.references(call),
            "timestamps" => self.out.add_timestamps(self.table),
            "index" | "check_constraint" => {}
            method => {
                if let Some(typ) = mapped_type(method) {
                    for name in call.names() {
                        self.out.add_column(self.table, name, typ);
                    }
                }
            }
        }
    }

    fn references(&mut self, call: &Call) {
        let fk = call.option("foreign_key");
        let unique = call.flag("unique")
            || call
                .option("index")
                .and_then(|v| v.get("unique"))
                .is_some_and(Value::truthy);
        for name in call.names() {
            self.out.add_reference(
                self.table,
                &Reference {
                    name,
                    foreign_key: fk.is_some_and(Value::truthy),
                    to_table: fk.and_then(|v| v.get("to_table")).and_then(Value::as_name),
                    polymorphic: call.flag("polymorphic"),
                    unique,
                },
            );
        }
    }
}

#[derive(Debug, Clone)]
enum Scope {
    TopLevel,
    Table { name: String, param: Option<String> },
    Skip,
}

/// Where a call's block body is interpreted.
enum Body {
    TopLevel,
    Table(String),
    Skip,
}

#[derive(Clone, Copy, PartialEq)]
enum Terminator {
    Eof,
    End,
    Brace,
}

/// Keywords that open a body closed by `end` when they lead a statement.
const BLOCK_KEYWORDS: &[&str] = &[
    "if", "unless", "while", "until", "case", "begin", "def", "class", "module",
];

/// Keywords that end an unparenthesized argument list.
const ARG_STOPS: &[&str] = &["do", "end", "if", "unless", "while", "until", "and", "or", "then"];

struct Interpreter<'a> {
    tokens: Vec<Token>,
    pos: usize,
    out: &'a mut Collected,
}

impl<'a> Interpreter<'a> {
    fn new(tokens: Vec<Token>, out: &'a mut Collected) -> Self {
        Self {
            tokens,
            pos: 0,
            out,
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&Token::Eof)
    }

    fn prev(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        self.pos += 1;
        tok
    }

    fn check_ident(&self, name: &str) -> bool {
        matches!(self.peek(), Token::Ident(s) if s == name)
    }

    fn skip_newlines(&mut self) {
        while *self.peek() == Token::Newline {
            self.advance();
        }
    }

    fn program(&mut self) -> Result<(), InterpError> {
        self.statements(&Scope::TopLevel, Terminator::Eof, "program")
    }

    fn statements(
        &mut self,
        scope: &Scope,
        until: Terminator,
        owner: &str,
    ) -> Result<(), InterpError> {
        loop {
            self.skip_newlines();
            match self.peek() {
                Token::Eof => {
                    return match until {
                        Terminator::Eof => Ok(()),
                        _ => Err(InterpError::UnclosedBlock(owner.to_string())),
                    };
                }
                Token::Ident(s) if s == "end" => {
                    self.advance();
                    if until == Terminator::End {
                        return Ok(());
                    }
                    // stray `end` at top level
                }
                Token::RBrace => {
                    self.advance();
                    if until == Terminator::Brace {
                        return Ok(());
                    }
                }
                Token::Ident(s) if BLOCK_KEYWORDS.contains(&s.as_str()) => {
                    self.skip_to_end()?;
                }
                _ => self.statement(scope)?,
            }
        }
    }

    fn statement(&mut self, scope: &Scope) -> Result<(), InterpError> {
        let Some(call) = self.call() else {
            self.skip_statement();
            return Ok(());
        };

        let body = self.apply(&call, scope);

        let until = if self.check_ident("do") {
            Terminator::End
        } else if *self.peek() == Token::LBrace {
            Terminator::Brace
        } else {
            self.skip_statement();
            return Ok(());
        };
        self.advance();
        let param = self.block_param();
        let inner = match body {
            Body::TopLevel => Scope::TopLevel,
            Body::Table(name) => Scope::Table { name, param },
            Body::Skip => Scope::Skip,
        };
        self.statements(&inner, until, &call.method)?;
        self.skip_statement();
        Ok(())
    }

    /// Perform the call's effect and decide how its block body is read.
    fn apply(&mut self, call: &Call, scope: &Scope) -> Body {
        match scope {
            Scope::TopLevel => self.apply_top_level(call),
            Scope::Table { name, param } => {
                let receiver_matches = match (param, &call.receiver) {
                    (Some(p), Some(r)) => p == r,
                    (None, Some(_)) => true,
                    (_, None) => false,
                };
                if receiver_matches {
                    TableBuilder::new(name, self.out).apply(call);
                }
                Body::Skip
            }
            Scope::Skip => Body::Skip,
        }
    }

    fn apply_top_level(&mut self, call: &Call) -> Body {
        let name_at = |i: usize| call.args.get(i).and_then(Value::as_name);
        match call.method.as_str() {
            "create_table" => match name_at(0) {
                Some(name) => {
                    self.out.open_table(name);
                    Body::Table(name.to_string())
                }
                None => Body::Skip,
            },
            "add_foreign_key" => {
                if let (Some(from), Some(to)) = (name_at(0), name_at(1)) {
                    let column = call.option("column").and_then(Value::as_name);
                    self.out.add_foreign_key(from, to, column);
                }
                Body::Skip
            }
            "add_reference" | "add_belongs_to" => {
                if let Some(table) = name_at(0) {
                    let rest = Call {
                        receiver: None,
                        method: "references".to_string(),
                        args: call.args.iter().skip(1).cloned().collect(),
                        options: call.options.clone(),
                    };
                    TableBuilder::new(table, self.out).apply(&rest);
                }
                Body::Skip
            }
            "add_column" => {
                if let (Some(table), Some(column), Some(typ)) = (name_at(0), name_at(1), name_at(2)) {
                    self.out.add_column(table, column, &column_type(typ));
                }
                Body::Skip
            }
            "add_timestamps" => {
                if let Some(table) = name_at(0) {
                    self.out.add_timestamps(table);
                }
                Body::Skip
            }
            // `define`, `change` and any other block owner: read the body as
            // more top-level statements.
            _ => Body::TopLevel,
        }
    }

    /// Parse `receiver.method args`; `None` when the statement does not
    /// start with a callable path or is an assignment.
    fn call(&mut self) -> Option<Call> {
        let mut segments: Vec<String> = Vec::new();
        loop {
            match self.peek() {
                Token::Ident(s) | Token::Const(s) => {
                    segments.push(s.clone());
                    self.advance();
                }
                _ => break,
            }
            if *self.peek() == Token::LBracket && segments.len() == 1 {
                self.skip_balanced();
            }
            match (self.peek(), self.peek_at(1)) {
                (Token::Dot, Token::Ident(_) | Token::Const(_)) => {
                    self.advance();
                }
                (Token::ColonColon, Token::Const(_) | Token::Ident(_)) => {
                    self.advance();
                }
                _ => break,
            }
        }
        let method = segments.pop()?;
        if *self.peek() == Token::Eq {
            return None;
        }

        let mut call = Call {
            receiver: (!segments.is_empty()).then(|| segments.join(".")),
            method,
            ..Default::default()
        };

        if *self.peek() == Token::LParen {
            self.advance();
            self.arguments(&mut call, true);
            if *self.peek() == Token::RParen {
                self.advance();
            }
        } else if self.starts_argument() {
            self.arguments(&mut call, false);
        }
        Some(call)
    }

    fn starts_argument(&self) -> bool {
        match self.peek() {
            Token::Str(_)
            | Token::Sym(_)
            | Token::Num(_)
            | Token::Label(_)
            | Token::Const(_)
            | Token::LBracket
            | Token::Other(_) => true,
            Token::Ident(s) => !ARG_STOPS.contains(&s.as_str()),
            _ => false,
        }
    }

    fn at_argument_end(&self, parenthesized: bool) -> bool {
        match self.peek() {
            Token::Eof | Token::RParen => true,
            Token::Newline | Token::RBrace | Token::RBracket => !parenthesized,
            Token::Ident(s) => !parenthesized && ARG_STOPS.contains(&s.as_str()),
            _ => false,
        }
    }

    fn arguments(&mut self, call: &mut Call, parenthesized: bool) {
        loop {
            if parenthesized {
                self.skip_newlines();
            }
            if self.at_argument_end(parenthesized) {
                return;
            }
            if let Token::Label(key) = self.peek().clone() {
                self.advance();
                let value = self.value();
                call.options.push((key, value));
            } else {
                let value = self.value();
                if *self.peek() == Token::Arrow {
                    self.advance();
                    let v = self.value();
                    call.options
                        .push((value.as_name().unwrap_or_default().to_string(), v));
                } else if let Value::Hash(entries) = value {
                    call.options.extend(entries);
                } else {
                    call.args.push(value);
                }
            }
            if *self.peek() == Token::Comma {
                self.advance();
                self.skip_newlines();
            } else if !parenthesized {
                return;
            } else if *self.peek() != Token::RParen {
                // Unmodeled syntax inside the parentheses.
                self.advance();
            }
        }
    }

    /// One argument value; always consumes at least one token.
    fn value(&mut self) -> Value {
        let value = match self.advance() {
            Token::Str(s) => Value::Str(s),
            Token::Sym(s) => Value::Sym(s),
            Token::Num(n) => Value::Num(n),
            Token::Ident(s) => match s.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "nil" => Value::Nil,
                _ => Value::Ident(s),
            },
            Token::Const(s) => Value::Ident(s),
            Token::LBracket => Value::Array(self.array()),
            Token::LBrace => Value::Hash(self.hash()),
            _ => Value::Other,
        };
        self.skip_continuation();
        value
    }

    fn array(&mut self) -> Vec<Value> {
        let mut items = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek() {
                Token::RBracket => {
                    self.advance();
                    break;
                }
                Token::Eof => break,
                _ => {}
            }
            items.push(self.value());
            self.skip_newlines();
            if *self.peek() == Token::Comma {
                self.advance();
            }
        }
        items
    }

    fn hash(&mut self) -> Vec<(String, Value)> {
        let mut entries = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek().clone() {
                Token::RBrace => {
                    self.advance();
                    break;
                }
                Token::Eof => break,
                Token::Label(key) => {
                    self.advance();
                    let v = self.value();
                    entries.push((key, v));
                }
                _ => {
                    let key = self.value();
                    if *self.peek() == Token::Arrow {
                        self.advance();
                        let v = self.value();
                        entries.push((key.as_name().unwrap_or_default().to_string(), v));
                    }
                }
            }
            self.skip_newlines();
            if *self.peek() == Token::Comma {
                self.advance();
            }
        }
        entries
    }

    /// Consume the rest of an expression (`Time.now`, `-> { ... }`, `5 * 2`).
    fn skip_continuation(&mut self) {
        loop {
            match self.peek() {
                Token::Comma
                | Token::Newline
                | Token::Eof
                | Token::RParen
                | Token::RBracket
                | Token::RBrace
                | Token::Arrow
                | Token::Label(_) => return,
                Token::Ident(s) if ARG_STOPS.contains(&s.as_str()) => return,
                Token::LParen | Token::LBracket | Token::LBrace => self.skip_balanced(),
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip a bracketed group starting at the current opening token.
    fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.advance() {
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                Token::Eof => {
                    self.pos -= 1;
                    return;
                }
                _ => {}
            }
        }
    }

    /// `|t|` or `|t, extra|` after `do` / `{`; returns the first name.
    fn block_param(&mut self) -> Option<String> {
        if *self.peek() != Token::Pipe {
            return None;
        }
        self.advance();
        let mut first = None;
        loop {
            match self.advance() {
                Token::Pipe | Token::Eof | Token::Newline => break,
                Token::Ident(s) if first.is_none() => first = Some(s),
                _ => {}
            }
        }
        first
    }

    /// Skip a keyword-led body up to its matching `end`.
    fn skip_to_end(&mut self) -> Result<(), InterpError> {
        let keyword = match self.advance() {
            Token::Ident(s) => s,
            _ => String::new(),
        };
        let mut depth = 1usize;
        let mut at_statement_start = false;
        loop {
            let after_dot = self.prev() == Some(&Token::Dot);
            let tok = self.advance();
            match &tok {
                Token::Eof => return Err(InterpError::UnclosedBlock(keyword)),
                Token::Ident(s) if !after_dot => match s.as_str() {
                    "end" => {
                        depth -= 1;
                        if depth == 0 {
                            return Ok(());
                        }
                    }
                    "do" | "case" | "begin" | "def" | "class" | "module" => depth += 1,
                    "if" | "unless" | "while" | "until" if at_statement_start => depth += 1,
                    _ => {}
                },
                _ => {}
            }
            at_statement_start = tok == Token::Newline;
        }
    }

    /// Drop what is left of the current statement, stopping before a
    /// closing `end` or `}` that belongs to an enclosing block.
    fn skip_statement(&mut self) {
        loop {
            match self.peek() {
                Token::Newline => {
                    self.advance();
                    return;
                }
                Token::Eof | Token::RBrace => return,
                Token::Ident(s) if s == "end" => return,
                Token::LParen | Token::LBracket | Token::LBrace => self.skip_balanced(),
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;

    fn interpret(text: &str) -> Collected {
        let mut out = Collected::default();
        run(text, &mut out).unwrap();
        out
    }

    #[test]
    fn test_sanitize() {
        let s = sanitize(
            "ActiveRecord::Schema[7.1].define(version: 1) do\n  t.index [\"a\"]\n  add_index \"x\", \"y\"\n  t.string \"a\"\nend\n",
        );
        assert_eq!(
            s,
            "ActiveRecord::Schema.define(version: 1) do\n  t.string \"a\"\nend\n"
        );
    }

    #[test]
    fn test_parenthesized_schema() {
        let out = interpret(
            r#"
ActiveRecord::Schema[7.1].define(version: 2024_05_01_000000) do
  create_table("users", force: :cascade) do |t|
    t.string("email", null: false)
    t.integer "age", default: 0
    t.timestamps(null: false)
  end

  create_table("posts") do |t|
    t.references(:user, foreign_key: true)
    t.text :body
  end

  add_foreign_key("posts", "users", column: "editor_id")
end
"#,
        );
        assert_eq!(
            out.tables["users"],
            vec![
                Column::new("email", "varchar"),
                Column::new("age", "int"),
                Column::new("created_at", "datetime"),
                Column::new("updated_at", "datetime"),
            ]
        );
        assert_eq!(
            out.tables["posts"],
            vec![Column::new("user_id", "int"), Column::new("body", "text")]
        );
        assert_eq!(out.edges.len(), 2);
        assert_eq!(out.edges[0].to, "users");
        assert_eq!(out.edges[1].column.as_deref(), Some("editor_id"));
    }

    #[test]
    fn test_keyword_bodies_are_skipped() {
        let out = interpret(
            r#"
if ENV["X"]
  create_table "ghosts" do |t|
  end
end
def helper
  [1, 2].each do |i|
    puts i
  end
end
create_table "real" do |t|
  t.string "name"
end
"#,
        );
        assert!(!out.tables.contains_key("ghosts"));
        assert_eq!(out.tables["real"], vec![Column::new("name", "varchar")]);
    }

    #[test]
    fn test_unknown_helpers_ignored() {
        let out = interpret(
            r#"
create_table :events, id: :uuid do |t|
  t.citext :slug
  t.string :title, default: -> { "now()" }, limit: 5 * 2
  t.string :a, :b
  t.foo
  t.column :score, :decimal
end
"#,
        );
        assert_eq!(
            out.tables["events"],
            vec![
                Column::new("title", "varchar"),
                Column::new("a", "varchar"),
                Column::new("b", "varchar"),
                Column::new("score", "decimal"),
            ]
        );
    }

    #[test]
    fn test_reference_options() {
        let out = interpret(
            r#"
create_table "profiles" do |t|
  t.belongs_to :owner, :foreign_key => { :to_table => :users }, index: { unique: true }
  t.references :imageable, polymorphic: true
end
"#,
        );
        assert_eq!(out.edges.len(), 1);
        assert_eq!(out.edges[0].to, "users");
        assert!(out.edges[0].unique);
        assert_eq!(out.tables["profiles"].len(), 3);
    }

    #[test]
    fn test_brace_block_and_other_receiver() {
        let out = interpret("create_table(\"a\") { |t| t.string \"x\"; u.string \"y\" }\n");
        assert_eq!(out.tables["a"], vec![Column::new("x", "varchar")]);
    }

    #[test]
    fn test_migration_style_calls() {
        let out = interpret(
            "add_reference :posts, :author, foreign_key: { to_table: :users }\nadd_column :posts, :rating, :integer\n",
        );
        assert_eq!(
            out.tables["posts"],
            vec![Column::new("author_id", "int"), Column::new("rating", "int")]
        );
        assert_eq!(out.edges[0].to, "users");
    }

    #[test]
    fn test_unclosed_block() {
        let mut out = Collected::default();
        let err = run("create_table(\"a\") do |t|\n  t.string \"x\"\n", &mut out).unwrap_err();
        assert!(matches!(err, InterpError::UnclosedBlock(m) if m == "create_table"));
    }

    #[test]
    fn test_unterminated_string() {
        let mut out = Collected::default();
        let err = run("create_table(\"a) do |t|\nend\n", &mut out).unwrap_err();
        assert!(matches!(err, InterpError::Lex(_)));
    }

    #[test]
    fn test_value_helpers() {
        let hash = Value::Hash(vec![("to_table".into(), Value::Sym("users".into()))]);
        assert_eq!(hash.get("to_table").and_then(Value::as_name), Some("users"));
        assert!(hash.truthy());
        assert!(!Value::Nil.truthy());
        assert!(!Value::Bool(false).truthy());
    }
}
