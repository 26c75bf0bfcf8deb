//! restricted literal grammar
//!
//! Host variable values starting with `[` or `{` are parsed as literals:
//!
//! ```text
//! Literal := String | Number | Bool | None | List | Dict
//! List    := '[' (Literal (',' Literal)* ','?)? ']'
//! Dict    := '{' (Literal ':' Literal (',' Literal ':' Literal)* ','?)? '}'
//! ```
//!
//! Strings may be quoted with `'` or `"`. Booleans are `True`/`False`, null is `None`.
//! The lowercase spellings `true`/`false`/`none`/`null` are accepted as well since the
//! template engine prints nested values that way.
//!
//! ```
//! # use yaosadis::{literal, value::Value};
//! let value = literal::parse("[1, 2, 'x']").unwrap();
//! assert_eq!(value, Value::from(vec![Value::Integer(1), Value::Integer(2), Value::from("x")]));
//! ```
use crate::value::Value;

/// Turns the right hand side of a `key=value` host variable into a [Value]
///
/// Fragments starting with `[` or `{` must be valid literals, everything else stays a
/// string (`"42"` is not converted to a number).
pub fn coerce(fragment: &str) -> Result<Value, LiteralError> {
    if fragment.starts_with(['[', '{']) {
        parse(fragment)
    } else {
        Ok(Value::from(fragment))
    }
}

/// Parse a complete literal. Anything but whitespace after the literal is an error.
pub fn parse(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser::new(input);
    let value = parser.literal()?;

    parser.skip_whitespace();
    if parser.pos < input.len() {
        return Err(parser.error(ErrorKind::TrailingCharacters));
    }

    Ok(value)
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("{kind} at offset {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub kind: ErrorKind,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unknown name '{0}'")]
    UnknownName(String),
    #[error("{0} can not be used as a mapping key")]
    UnhashableKey(&'static str),
    #[error("unexpected trailing characters")]
    TrailingCharacters,
    #[error("nested deeper than {MAX_DEPTH} levels")]
    TooDeep,
}

/// Nesting limit for lists and dicts
pub const MAX_DEPTH: usize = 200;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self, kind: ErrorKind) -> LiteralError {
        LiteralError {
            offset: self.pos,
            kind,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(ErrorKind::UnexpectedCharacter(c))),
            None => Err(self.error(ErrorKind::UnexpectedEnd)),
        }
    }

    fn literal(&mut self) -> Result<Value, LiteralError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.error(ErrorKind::UnexpectedEnd)),
            Some('[') => self.list(),
            Some('{') => self.dict(),
            Some('\'' | '"') => self.strings(),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.name(),
            Some(c) => Err(self.error(ErrorKind::UnexpectedCharacter(c))),
        }
    }

    /// Parses comma separated items until `close`, allowing a trailing comma
    fn items(
        &mut self,
        close: char,
        mut item: impl FnMut(&mut Self) -> Result<(), LiteralError>,
    ) -> Result<(), LiteralError> {
        if self.depth == MAX_DEPTH {
            return Err(self.error(ErrorKind::TooDeep));
        }
        self.depth += 1;
        let result = self.items_at_depth(close, &mut item);
        self.depth -= 1;
        result
    }

    fn items_at_depth(
        &mut self,
        close: char,
        item: &mut impl FnMut(&mut Self) -> Result<(), LiteralError>,
    ) -> Result<(), LiteralError> {
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(());
            }

            item(self)?;

            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(c) if c == close => return Ok(()),
                Some(c) => {
                    self.pos -= c.len_utf8();
                    return Err(self.error(ErrorKind::UnexpectedCharacter(c)));
                }
                None => return Err(self.error(ErrorKind::UnexpectedEnd)),
            }
        }
    }

    fn list(&mut self) -> Result<Value, LiteralError> {
        self.expect('[')?;

        let mut elements = vec![];
        self.items(']', |parser| {
            elements.push(parser.literal()?);
            Ok(())
        })?;

        Ok(Value::Array(elements))
    }

    fn dict(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;

        let mut entries = indexmap::IndexMap::new();
        self.items('}', |parser| {
            parser.skip_whitespace();
            let key_offset = parser.pos;
            let key = parser.literal()?;
            let key = mapping_key(key).map_err(|kind| LiteralError {
                offset: key_offset,
                kind,
            })?;

            parser.expect(':')?;
            let value = parser.literal()?;
            entries.insert(key, value);
            Ok(())
        })?;

        Ok(Value::Object(entries))
    }

    /// One or more adjacent string literals, concatenated
    fn strings(&mut self) -> Result<Value, LiteralError> {
        let mut out = self.string()?;

        loop {
            let before = self.pos;
            self.skip_whitespace();
            if matches!(self.peek(), Some('\'' | '"')) {
                out.push_str(&self.string()?);
            } else {
                self.pos = before;
                return Ok(Value::String(out));
            }
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        let Some(quote) = self.bump() else {
            return Err(self.error(ErrorKind::UnexpectedEnd));
        };

        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    self.pos = start;
                    return Err(self.error(ErrorKind::UnterminatedString));
                }
                Some(c) if c == quote => return Ok(out),
                Some('\\') => out.push(self.escape()?),
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char, LiteralError> {
        let escape_start = self.pos - 1;
        let invalid = |parser: &mut Self| {
            parser.pos = escape_start;
            parser.error(ErrorKind::InvalidEscape)
        };

        let c = match self.bump() {
            Some('\\') => '\\',
            Some('\'') => '\'',
            Some('"') => '"',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('0') => '\0',
            Some('x') => return self.hex_escape(2).ok_or_else(|| invalid(self)),
            Some('u') if self.peek() == Some('{') => {
                self.bump();
                let digits_start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                    self.bump();
                }
                let digits = &self.input[digits_start..self.pos];
                if self.bump() != Some('}') || digits.is_empty() || digits.len() > 6 {
                    return Err(invalid(self));
                }
                return u32::from_str_radix(digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| invalid(self));
            }
            Some('u') => return self.hex_escape(4).ok_or_else(|| invalid(self)),
            _ => return Err(invalid(self)),
        };

        Ok(c)
    }

    fn hex_escape(&mut self, len: usize) -> Option<char> {
        let digits = self.input.get(self.pos..self.pos + len)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        self.pos += len;
        u32::from_str_radix(digits, 16).ok().and_then(char::from_u32)
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let is_sign_after_exponent = matches!(c, '+' | '-')
                && matches!(self.input[start..self.pos].chars().last(), Some('e' | 'E'));
            let is_leading_sign = matches!(c, '+' | '-') && self.pos == start;

            if c.is_ascii_digit()
                || matches!(c, '.' | 'e' | 'E' | '_')
                || is_leading_sign
                || is_sign_after_exponent
            {
                self.bump();
            } else {
                break;
            }
        }

        let text = &self.input[start..self.pos];
        let invalid = || LiteralError {
            offset: start,
            kind: ErrorKind::InvalidNumber(text.to_string()),
        };

        let digits = text.replace('_', "");
        if text.starts_with('_') || text.ends_with('_') || text.contains("__") {
            return Err(invalid());
        }

        let is_integer = !digits.contains(['.', 'e', 'E']);
        if is_integer {
            if let Ok(int) = digits.parse::<i64>() {
                return Ok(Value::Integer(int));
            }
        }

        match digits.parse::<f64>() {
            Ok(decimal) if decimal.is_finite() => Ok(Value::Decimal(decimal)),
            _ => Err(invalid()),
        }
    }

    fn name(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.bump();
        }

        match &self.input[start..self.pos] {
            "True" | "true" => Ok(Value::Boolean(true)),
            "False" | "false" => Ok(Value::Boolean(false)),
            "None" | "none" | "null" => Ok(Value::Null),
            other => Err(LiteralError {
                offset: start,
                kind: ErrorKind::UnknownName(other.to_string()),
            }),
        }
    }
}

/// Converts a literal key into an object key the way a JSON encoder would
fn mapping_key(key: Value) -> Result<String, ErrorKind> {
    match key {
        Value::String(s) => Ok(s),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Decimal(d) => Ok(serde_json::Number::from_f64(d)
            .map(|n| n.to_string())
            .unwrap_or_else(|| d.to_string())),
        Value::Boolean(true) => Ok("true".to_string()),
        Value::Boolean(false) => Ok("false".to_string()),
        Value::Null => Ok("null".to_string()),
        other @ (Value::Array(_) | Value::Object(_)) => {
            Err(ErrorKind::UnhashableKey(other.type_name()))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn object<const N: usize>(entries: [(&str, Value); N]) -> Value {
        entries.into_iter().collect()
    }

    #[test]
    fn coerce_only_parses_containers() {
        assert_eq!(coerce("hello").unwrap(), Value::from("hello"));
        assert_eq!(coerce("42").unwrap(), Value::from("42"));
        assert_eq!(coerce("True").unwrap(), Value::from("True"));
        assert_eq!(
            coerce("{'a': 1}").unwrap(),
            object([("a", Value::Integer(1))])
        );
        assert!(coerce("[1, 2").is_err());
    }

    #[test]
    fn list_of_mixed_scalars() {
        assert_eq!(
            parse("[1, 2, 'x']").unwrap(),
            Value::from(vec![Value::Integer(1), Value::Integer(2), Value::from("x")])
        );
    }

    #[test]
    fn dict_with_single_quoted_keys() {
        assert_eq!(
            parse("{'a': 1}").unwrap(),
            object([("a", Value::Integer(1))])
        );
    }

    #[test]
    fn python_and_json_keywords() {
        assert_eq!(
            parse("[True, False, None, true, false, none, null]").unwrap(),
            Value::from(vec![
                Value::Boolean(true),
                Value::Boolean(false),
                Value::Null,
                Value::Boolean(true),
                Value::Boolean(false),
                Value::Null,
                Value::Null,
            ])
        );
    }

    #[test]
    fn nested_containers_keep_key_order() {
        let value = parse(r#"{"z": [1, {"b": 'c'}], 'a': {}, "l": []}"#).unwrap();

        assert_eq!(
            value,
            object([
                (
                    "z",
                    Value::from(vec![Value::Integer(1), object([("b", Value::from("c"))])])
                ),
                ("a", object([])),
                ("l", Value::Array(vec![])),
            ])
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            parse("[-3, +4, 1.5, 2e3, .5, 1_000, 99999999999999999999]").unwrap(),
            Value::from(vec![
                Value::Integer(-3),
                Value::Integer(4),
                Value::Decimal(1.5),
                Value::Decimal(2000.0),
                Value::Decimal(0.5),
                Value::Integer(1000),
                Value::Decimal(1e20),
            ])
        );
    }

    #[test]
    fn string_escapes_and_concatenation() {
        assert_eq!(
            parse(r#"['it\'s', "a\tb\n", '\x41é\u{1F600}', 'con' "cat"]"#).unwrap(),
            Value::from(vec![
                Value::from("it's"),
                Value::from("a\tb\n"),
                Value::from("Aé😀"),
                Value::from("concat"),
            ])
        );
    }

    #[test]
    fn trailing_commas() {
        assert_eq!(
            parse("[1, 2,]").unwrap(),
            Value::from(vec![Value::Integer(1), Value::Integer(2)])
        );
        assert_eq!(
            parse("{'a': 1,}").unwrap(),
            object([("a", Value::Integer(1))])
        );
    }

    #[test]
    fn non_string_keys_are_stringified() {
        assert_eq!(
            parse("{1: 'a', True: 'b', None: 'c', 1.5: 'd'}").unwrap(),
            object([
                ("1", Value::from("a")),
                ("true", Value::from("b")),
                ("null", Value::from("c")),
                ("1.5", Value::from("d")),
            ])
        );
        assert_eq!(
            parse("{2e3: 'a', 1.0: 'b'}").unwrap(),
            object([("2000.0", Value::from("a")), ("1.0", Value::from("b"))])
        );
    }

    #[test]
    fn nesting_is_limited() {
        let nested = |depth: usize| format!("{}{}", "[".repeat(depth), "]".repeat(depth));

        assert!(parse(&nested(MAX_DEPTH)).is_ok());
        assert_eq!(
            parse(&nested(MAX_DEPTH + 1)).unwrap_err().kind,
            ErrorKind::TooDeep
        );
        assert_eq!(
            coerce(&format!("{{'a': {}}}", nested(200_000))).unwrap_err().kind,
            ErrorKind::TooDeep
        );
    }

    #[test]
    fn errors() {
        assert_eq!(
            parse("[1, 2").unwrap_err().kind,
            ErrorKind::UnexpectedEnd
        );
        assert_eq!(
            parse("['abc]").unwrap_err(),
            LiteralError {
                offset: 1,
                kind: ErrorKind::UnterminatedString
            }
        );
        assert_eq!(
            parse("[1] extra").unwrap_err().kind,
            ErrorKind::TrailingCharacters
        );
        assert_eq!(
            parse("[1 2]").unwrap_err().kind,
            ErrorKind::UnexpectedCharacter('2')
        );
        assert_eq!(
            parse("[os.system]").unwrap_err().kind,
            ErrorKind::UnknownName("os".to_string())
        );
        assert_eq!(
            parse("{[1]: 2}").unwrap_err(),
            LiteralError {
                offset: 1,
                kind: ErrorKind::UnhashableKey("array")
            }
        );
        assert_eq!(
            parse(r"['\q']").unwrap_err().kind,
            ErrorKind::InvalidEscape
        );
        assert_eq!(
            parse("[1.2.3]").unwrap_err().kind,
            ErrorKind::InvalidNumber("1.2.3".to_string())
        );
        assert_eq!(
            parse("{'a' 1}").unwrap_err().kind,
            ErrorKind::UnexpectedCharacter('1')
        );
    }
}
