//! Single-pass recursive descent reader
//!
//! Recursion only happens on `{` and `[`, and every level is counted against
//! `max_depth`, so the stack stays bounded whatever the input looks like.

use super::{DecodeError, DecodedValue, DecoderOptions};
use serde_json::{Map, Number, Value};

const REPLACEMENT: char = '\u{FFFD}';

pub(crate) struct Reader<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
    options: &'a DecoderOptions,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(src: &'a str, options: &'a DecoderOptions) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            depth: 0,
            options,
        }
    }

    pub(crate) fn read_document(mut self) -> Result<DecodedValue, DecodeError> {
        self.skip_trivia()?;
        if self.peek().is_none() {
            return Err(self.syntax("empty input"));
        }

        let value = self.read_value()?;

        self.skip_trivia()?;
        if self.peek().is_some() {
            return Err(self.syntax("trailing characters after value"));
        }

        Ok(value)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn position(&self) -> (usize, usize) {
        let consumed = &self.src[..self.pos.min(self.src.len())];
        let line = consumed.matches('\n').count() + 1;
        let line_start = consumed.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = consumed[line_start..].chars().count() + 1;
        (line, column)
    }

    fn syntax(&self, message: impl Into<String>) -> DecodeError {
        let (line, column) = self.position();
        DecodeError::Syntax {
            message: message.into(),
            line,
            column,
        }
    }

    fn unexpected(&self, expected: &str) -> DecodeError {
        match self.peek_char() {
            Some(c) => self.syntax(format!("expected {}, found {:?}", expected, c)),
            None => self.syntax(format!("expected {}, found end of input", expected)),
        }
    }

    /// Skip whitespace and comments
    fn skip_trivia(&mut self) -> Result<(), DecodeError> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c) => self.pos += 1,
                Some(b'/') => match self.peek_at(1) {
                    Some(b'/') => {
                        self.pos += 2;
                        while let Some(b) = self.peek() {
                            if b == b'\n' {
                                break;
                            }
                            self.pos += 1;
                        }
                    }
                    Some(b'*') => {
                        let start = self.pos;
                        match self.src[self.pos + 2..].find("*/") {
                            Some(offset) => self.pos += 2 + offset + 2,
                            None => {
                                self.pos = start;
                                return Err(self.syntax("unterminated block comment"));
                            }
                        }
                    }
                    _ => return Ok(()),
                },
                Some(b) if b >= 0x80 => match self.peek_char() {
                    Some(c) if c.is_whitespace() || c == '\u{FEFF}' => {
                        self.pos += c.len_utf8()
                    }
                    _ => return Ok(()),
                },
                _ => return Ok(()),
            }
        }
    }

    fn read_value(&mut self) -> Result<Value, DecodeError> {
        match self.peek() {
            Some(b'{') => self.read_object(),
            Some(b'[') => self.read_array(),
            Some(quote @ (b'"' | b'\'')) => self.read_string(quote).map(Value::String),
            Some(b'-' | b'+' | b'.' | b'0'..=b'9') => self.read_number(),
            Some(_) if self.at_identifier_start() => {
                let start = self.pos;
                let word = self.read_identifier();
                match word {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" => Ok(Value::Null),
                    "Infinity" | "NaN" => {
                        self.pos = start;
                        Err(self.syntax("non-finite numbers are not supported"))
                    }
                    other => {
                        let message = format!("unexpected identifier {:?}", other);
                        self.pos = start;
                        Err(self.syntax(message))
                    }
                }
            }
            _ => Err(self.unexpected("a value")),
        }
    }

    fn enter(&mut self) -> Result<(), DecodeError> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            let (line, column) = self.position();
            return Err(DecodeError::TooDeep {
                limit: self.options.max_depth,
                line,
                column,
            });
        }
        Ok(())
    }

    fn read_object(&mut self) -> Result<Value, DecodeError> {
        self.enter()?;
        self.pos += 1;

        let mut map = Map::new();
        self.skip_trivia()?;
        if self.peek() == Some(b'}') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(Value::Object(map));
        }

        loop {
            let key = match self.peek() {
                Some(quote @ (b'"' | b'\'')) => self.read_string(quote)?,
                Some(_) if self.at_identifier_start() => self.read_identifier().to_string(),
                _ => return Err(self.unexpected("an object key")),
            };

            self.skip_trivia()?;
            if self.peek() != Some(b':') {
                return Err(self.unexpected("':' after object key"));
            }
            self.pos += 1;
            self.skip_trivia()?;

            let value = self.read_value()?;
            map.insert(key, value);

            self.skip_trivia()?;
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_trivia()?;
                    if self.peek() == Some(b'}') {
                        self.pos += 1;
                        break;
                    }
                }
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.unexpected("',' or '}'")),
            }
        }

        self.depth -= 1;
        Ok(Value::Object(map))
    }

    fn read_array(&mut self) -> Result<Value, DecodeError> {
        self.enter()?;
        self.pos += 1;

        let mut items = Vec::new();
        self.skip_trivia()?;
        if self.peek() == Some(b']') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(Value::Array(items));
        }

        loop {
            items.push(self.read_value()?);

            self.skip_trivia()?;
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_trivia()?;
                    if self.peek() == Some(b']') {
                        self.pos += 1;
                        break;
                    }
                }
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.unexpected("',' or ']'")),
            }
        }

        self.depth -= 1;
        Ok(Value::Array(items))
    }

    fn read_string(&mut self, quote: u8) -> Result<String, DecodeError> {
        let open = self.pos;
        self.pos += 1;

        let mut out = String::new();
        let mut run_start = self.pos;

        loop {
            let Some(b) = self.peek() else {
                self.pos = open;
                return Err(self.syntax("unterminated string"));
            };

            if b == quote {
                out.push_str(&self.src[run_start..self.pos]);
                self.pos += 1;
                return Ok(out);
            }

            if b == b'\\' {
                out.push_str(&self.src[run_start..self.pos]);
                self.pos += 1;
                self.read_escape(&mut out)?;
                run_start = self.pos;
                continue;
            }

            if b < 0x20 && !self.options.allow_control_characters {
                return Err(self.syntax(format!(
                    "control character U+{:04X} inside string",
                    b
                )));
            }

            self.pos += 1;
        }
    }

    /// Decode one escape sequence; `pos` is just past the backslash
    fn read_escape(&mut self, out: &mut String) -> Result<(), DecodeError> {
        let Some(b) = self.peek() else {
            return Err(self.syntax("unterminated escape sequence"));
        };

        match b {
            b'b' => out.push('\u{0008}'),
            b'f' => out.push('\u{000C}'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'v' => out.push('\u{000B}'),
            b'0' => out.push('\0'),
            b'\n' => {}
            b'\r' => {
                if self.peek_at(1) == Some(b'\n') {
                    self.pos += 1;
                }
            }
            b'x' => {
                self.pos += 1;
                let code = self.read_hex(2)?;
                out.push(char::from_u32(code).unwrap_or(REPLACEMENT));
                return Ok(());
            }
            b'u' => {
                self.pos += 1;
                let decoded = self.read_unicode_escape()?;
                out.push(decoded);
                return Ok(());
            }
            b if b < 0x80 => out.push(b as char),
            _ => {
                // Escaped non-ASCII character: the character itself, except
                // for the JSON5 line continuations U+2028 and U+2029.
                if let Some(c) = self.peek_char() {
                    if c != '\u{2028}' && c != '\u{2029}' {
                        out.push(c);
                    }
                    self.pos += c.len_utf8();
                }
                return Ok(());
            }
        }

        self.pos += 1;
        Ok(())
    }

    fn read_hex(&mut self, digits: usize) -> Result<u32, DecodeError> {
        let end = self.pos + digits;
        let hex = self
            .src
            .get(self.pos..end)
            .filter(|s| s.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| self.syntax(format!("expected {} hex digits in escape", digits)))?;
        let code = u32::from_str_radix(hex, 16)
            .map_err(|_| self.syntax("invalid hex digits in escape"))?;
        self.pos = end;
        Ok(code)
    }

    /// `\uXXXX`, combining surrogate pairs; `pos` is just past the `u`
    fn read_unicode_escape(&mut self) -> Result<char, DecodeError> {
        let first = self.read_hex(4)?;

        if (0xD800..=0xDBFF).contains(&first) {
            if self.peek() == Some(b'\\') && self.peek_at(1) == Some(b'u') {
                let saved = self.pos;
                self.pos += 2;
                let second = self.read_hex(4)?;
                if (0xDC00..=0xDFFF).contains(&second) {
                    let combined = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
                    return Ok(char::from_u32(combined).unwrap_or(REPLACEMENT));
                }
                self.pos = saved;
            }
            return Ok(REPLACEMENT);
        }

        Ok(char::from_u32(first).unwrap_or(REPLACEMENT))
    }

    fn read_number(&mut self) -> Result<Value, DecodeError> {
        let start = self.pos;
        let negative = match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                true
            }
            Some(b'+') => {
                self.pos += 1;
                false
            }
            _ => false,
        };

        if self.at_identifier_start() {
            let word = self.read_identifier();
            let message = if word == "Infinity" || word == "NaN" {
                "non-finite numbers are not supported".to_string()
            } else {
                format!("invalid number {:?}", &self.src[start..self.pos])
            };
            self.pos = start;
            return Err(self.syntax(message));
        }

        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x' | b'X')) {
            return self.read_hex_number(start, negative);
        }

        let digits_start = self.pos;
        let int_digits = self.skip_digits();
        let mut is_integer = true;
        let mut frac_digits = 0;

        if self.peek() == Some(b'.') {
            is_integer = false;
            self.pos += 1;
            frac_digits = self.skip_digits();
        }

        if int_digits == 0 && frac_digits == 0 {
            self.pos = start;
            return Err(self.syntax("invalid number"));
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            is_integer = false;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.skip_digits() == 0 {
                return Err(self.syntax("missing exponent digits"));
            }
        }

        let body = &self.src[digits_start..self.pos];

        if is_integer {
            let signed = if negative {
                format!("-{}", body)
            } else {
                body.to_string()
            };
            if let Ok(n) = signed.parse::<i64>() {
                return Ok(Value::Number(n.into()));
            }
            if !negative {
                if let Ok(n) = body.parse::<u64>() {
                    return Ok(Value::Number(n.into()));
                }
            }
        }

        let parsed = body
            .parse::<f64>()
            .ok()
            .map(|f| if negative { -f } else { f })
            .and_then(Number::from_f64);

        match parsed {
            Some(n) => Ok(Value::Number(n)),
            None => {
                self.pos = start;
                Err(self.syntax("number out of range"))
            }
        }
    }

    fn read_hex_number(&mut self, start: usize, negative: bool) -> Result<Value, DecodeError> {
        self.pos += 2;
        let digits_start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_hexdigit()) {
            self.pos += 1;
        }

        let digits = &self.src[digits_start..self.pos];
        if digits.is_empty() {
            return Err(self.syntax("missing hex digits"));
        }

        let magnitude = match u64::from_str_radix(digits, 16) {
            Ok(m) => m,
            Err(_) => {
                self.pos = start;
                return Err(self.syntax("hex number out of range"));
            }
        };

        if !negative {
            return Ok(Value::Number(magnitude.into()));
        }

        match i64::try_from(magnitude) {
            Ok(m) => Ok(Value::Number((-m).into())),
            Err(_) => {
                self.pos = start;
                Err(self.syntax("hex number out of range"))
            }
        }
    }

    fn skip_digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn at_identifier_start(&self) -> bool {
        match self.peek() {
            Some(b) if b.is_ascii_alphabetic() || b == b'_' || b == b'$' => true,
            Some(b) if b >= 0x80 => self.peek_char().is_some_and(char::is_alphabetic),
            _ => false,
        }
    }

    fn read_identifier(&mut self) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'$' {
                self.pos += 1;
            } else if b >= 0x80 {
                match self.peek_char() {
                    Some(c) if c.is_alphanumeric() => self.pos += c.len_utf8(),
                    _ => break,
                }
            } else {
                break;
            }
        }
        &src[start..self.pos]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read(text: &str) -> Result<Value, DecodeError> {
        let options = DecoderOptions::default();
        Reader::new(text, &options).read_document()
    }

    #[test]
    fn test_escapes() {
        let value = read(r#"["a\"b", 'c\'d', "\n\t\\\/", "\u00e9", "\x41", "\v\0"]"#).unwrap();
        assert_eq!(
            value,
            json!(["a\"b", "c'd", "\n\t\\/", "é", "A", "\u{000B}\u{0000}"])
        );
    }

    #[test]
    fn test_surrogate_pairs() {
        assert_eq!(read(r#""\ud83d\ude00""#).unwrap(), json!("😀"));
        assert_eq!(read(r#""\ud83dx""#).unwrap(), json!("\u{FFFD}x"));
        assert_eq!(read(r#""\ude00""#).unwrap(), json!("\u{FFFD}"));
    }

    #[test]
    fn test_unknown_escape_is_literal() {
        assert_eq!(read(r#""\q""#).unwrap(), json!("q"));
    }

    #[test]
    fn test_line_continuation() {
        assert_eq!(read("'one \\\ntwo'").unwrap(), json!("one two"));
    }

    #[test]
    fn test_non_ascii_text_and_keys() {
        let value = read("{città: 'Zürich — 東京'}").unwrap();
        assert_eq!(value["città"], "Zürich — 東京");
    }

    #[test]
    fn test_numbers() {
        let value = read("[0, -7, +3, 1.5, .25, 4., 1e3, -2.5E-2, 0x1F, -0xA]").unwrap();
        assert_eq!(
            value,
            json!([0, -7, 3, 1.5, 0.25, 4.0, 1000.0, -0.025, 31, -10])
        );
    }

    #[test]
    fn test_large_integers() {
        let value = read("[18446744073709551615, -9223372036854775808, 1e400]");
        assert!(value.is_err());

        let value = read("[18446744073709551615, -9223372036854775808]").unwrap();
        assert_eq!(value[0].as_u64(), Some(u64::MAX));
        assert_eq!(value[1].as_i64(), Some(i64::MIN));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(read("NaN").is_err());
        assert!(read("-Infinity").is_err());
        assert!(read("{n: Infinity}").is_err());
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(read("-").is_err());
        assert!(read(".").is_err());
        assert!(read("1e").is_err());
        assert!(read("0x").is_err());
    }

    #[test]
    fn test_comments_everywhere() {
        let value = read("/*a*/{/*b*/k/*c*/:/*d*/1/*e*/,//f\n}//g").unwrap();
        assert_eq!(value, json!({"k": 1}));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = read("{a: 1} /* open").unwrap_err();
        assert!(err.to_string().contains("unterminated block comment"));
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let value = read("{a: 1, b: 2, a: 3}").unwrap();
        assert_eq!(value, json!({"a": 3, "b": 2}));
        let first_key = value.as_object().unwrap().keys().next().unwrap().clone();
        assert_eq!(first_key, "a");
    }

    #[test]
    fn test_structural_errors() {
        assert!(read("").is_err());
        assert!(read("   // only a comment").is_err());
        assert!(read("{a 1}").is_err());
        assert!(read("{,}").is_err());
        assert!(read("[1 2]").is_err());
        assert!(read("[,]").is_err());
        assert!(read("{a: 1} extra").is_err());
        assert!(read("{a: undefined}").is_err());
        assert!(read("'open").is_err());
    }

    #[test]
    fn test_unicode_whitespace() {
        let value = read("\u{FEFF}\u{00A0}{a:\u{2003}1}").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }
}
