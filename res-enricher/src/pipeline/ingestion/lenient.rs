//! Lenient parser for the raw search-log literal syntax.
//!
//! The upstream logger emits one record per line using non-canonical tokens:
//! single-quoted strings, capitalized `True`/`False` and `None`. String
//! values may themselves contain quote characters, so the literal syntax is
//! scanned directly into a `serde_json::Value` rather than text-patched into
//! standard JSON first.

use serde_json::{Map, Number, Value};

/// Parse one log line into a JSON value. Accepts both standard JSON tokens
/// and the lenient variants side by side.
pub fn parse_line(input: &str) -> Result<Value, String> {
    let mut scanner = Scanner::new(input);
    scanner.skip_whitespace();
    let value = scanner.parse_value()?;
    scanner.skip_whitespace();
    if !scanner.at_end() {
        return Err(format!("trailing characters at offset {}", scanner.pos));
    }
    Ok(value)
}

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn parse_value(&mut self) -> Result<Value, String> {
        match self.peek() {
            Some(b'{') => self.parse_object(),
            Some(b'[') => self.parse_array(),
            Some(b'\'' | b'"') => self.parse_string().map(Value::String),
            Some(b'-') | Some(b'0'..=b'9') => self.parse_number(),
            Some(_) => self.parse_word(),
            None => Err("unexpected end of input".to_string()),
        }
    }

    fn parse_object(&mut self) -> Result<Value, String> {
        self.expect(b'{')?;
        let mut map = Map::new();
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Value::Object(map));
        }
        loop {
            self.skip_whitespace();
            let key = match self.peek() {
                Some(b'\'' | b'"') => self.parse_string()?,
                _ => return Err(format!("expected object key at offset {}", self.pos)),
            };
            self.skip_whitespace();
            self.expect(b':')?;
            self.skip_whitespace();
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_whitespace();
            match self.bump() {
                Some(b',') => continue,
                Some(b'}') => return Ok(Value::Object(map)),
                _ => return Err(format!("expected ',' or '}}' at offset {}", self.pos)),
            }
        }
    }

    fn parse_array(&mut self) -> Result<Value, String> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Value::Array(items));
        }
        loop {
            self.skip_whitespace();
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.bump() {
                Some(b',') => continue,
                Some(b']') => return Ok(Value::Array(items)),
                _ => return Err(format!("expected ',' or ']' at offset {}", self.pos)),
            }
        }
    }

    /// Strings may be delimited by either quote character; the other quote is
    /// legal unescaped inside. Backslash escapes cover both quote kinds plus
    /// the usual JSON set.
    fn parse_string(&mut self) -> Result<String, String> {
        let quote = self.bump().ok_or("unexpected end of input")?;
        let mut out = Vec::new();
        loop {
            match self.bump() {
                None => return Err("unterminated string".to_string()),
                Some(b) if b == quote => break,
                Some(b'\\') => match self.bump() {
                    Some(b'\'') => out.push(b'\''),
                    Some(b'"') => out.push(b'"'),
                    Some(b'\\') => out.push(b'\\'),
                    Some(b'/') => out.push(b'/'),
                    Some(b'n') => out.push(b'\n'),
                    Some(b't') => out.push(b'\t'),
                    Some(b'r') => out.push(b'\r'),
                    Some(b'b') => out.push(0x08),
                    Some(b'f') => out.push(0x0c),
                    Some(b'u') => {
                        let code = self.parse_unicode_escape()?;
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(code.encode_utf8(&mut buf).as_bytes());
                    }
                    other => return Err(format!("invalid escape: {:?}", other.map(char::from))),
                },
                Some(b) => out.push(b),
            }
        }
        String::from_utf8(out).map_err(|_| "invalid UTF-8 in string".to_string())
    }

    fn parse_unicode_escape(&mut self) -> Result<char, String> {
        let mut code: u32 = 0;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|b| (b as char).to_digit(16))
                .ok_or("invalid \\u escape")?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| "invalid \\u escape".to_string())
    }

    fn parse_number(&mut self) -> Result<Value, String> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        let mut is_float = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => self.pos += 1,
                b'.' | b'e' | b'E' | b'+' | b'-' => {
                    is_float = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or("");
        if !is_float {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Value::Number(Number::from(n)));
            }
        }
        let f: f64 = text
            .parse()
            .map_err(|_| format!("invalid number '{}' at offset {}", text, start))?;
        Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| format!("non-finite number '{}' at offset {}", text, start))
    }

    fn parse_word(&mut self) -> Result<Value, String> {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let word = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or("");
        match word {
            "true" | "True" => Ok(Value::Bool(true)),
            "false" | "False" => Ok(Value::Bool(false)),
            "null" | "None" => Ok(Value::Null),
            _ => Err(format!("unexpected token '{}' at offset {}", word, start)),
        }
    }

    fn expect(&mut self, expected: u8) -> Result<(), String> {
        if self.bump() == Some(expected) {
            Ok(())
        } else {
            Err(format!(
                "expected '{}' at offset {}",
                char::from(expected),
                self.pos
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_lenient_record() {
        let line = "{'date': '2021-04-20', 'areaIDs': [2006, 2007], 'newDevelopment': False, 'garage': True, 'brokerID': None}";
        let value = parse_line(line).unwrap();
        assert_eq!(value["date"], json!("2021-04-20"));
        assert_eq!(value["areaIDs"], json!([2006, 2007]));
        assert_eq!(value["newDevelopment"], json!(false));
        assert_eq!(value["garage"], json!(true));
        assert_eq!(value["brokerID"], json!(null));
    }

    #[test]
    fn test_parses_standard_json() {
        let line = r#"{"category": "residential", "priceLow": 9, "ok": true, "x": null}"#;
        let value = parse_line(line).unwrap();
        assert_eq!(value["category"], json!("residential"));
        assert_eq!(value["priceLow"], json!(9));
    }

    #[test]
    fn test_apostrophe_survives_inside_value() {
        // The failure mode of replace("'", "\"") normalization.
        let value = parse_line(r"{'name': 'Agios O\'Brien'}").unwrap();
        assert_eq!(value["name"], json!("Agios O'Brien"));

        let value = parse_line(r#"{'name': "O'Brien"}"#).unwrap();
        assert_eq!(value["name"], json!("O'Brien"));
    }

    #[test]
    fn test_double_quote_inside_single_quoted_string() {
        let value = parse_line(r#"{'note': 'he said "hi"'}"#).unwrap();
        assert_eq!(value["note"], json!(r#"he said "hi""#));
    }

    #[test]
    fn test_numbers() {
        let value = parse_line("{'a': -5, 'b': 3.25, 'c': 99999999}").unwrap();
        assert_eq!(value["a"], json!(-5));
        assert_eq!(value["b"], json!(3.25));
        assert_eq!(value["c"], json!(99999999));
    }

    #[test]
    fn test_unicode_escape_and_utf8() {
        let value = parse_line("{'city': '\\u0391θήνα'}").unwrap();
        assert_eq!(value["city"], json!("Αθήνα"));
    }

    #[test]
    fn test_malformed_lines_are_errors() {
        assert!(parse_line("{'a': }").is_err());
        assert!(parse_line("{'a': 1").is_err());
        assert!(parse_line("{'a': 1} extra").is_err());
        assert!(parse_line("not a record").is_err());
        assert!(parse_line("{'a': 'unterminated}").is_err());
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(parse_line("{}").unwrap(), json!({}));
        assert_eq!(parse_line("{'xs': []}").unwrap(), json!({"xs": []}));
    }
}
