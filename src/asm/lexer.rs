//! Line tokenizer.
//!
//! One source line is at most `label:`, a mnemonic or directive, and a
//! comma-separated operand list; `#` starts a comment. The lexer keeps a
//! 1-based column for every token so errors can point into the source.

use super::error::{AsmError, AsmErrorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandKind<'a> {
    /// A register name or label reference.
    Ident(&'a str),
    Number(i64),
    Str(Vec<u8>),
    /// Displacement form `offset(reg)`.
    Disp { offset: i64, reg: &'a str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand<'a> {
    pub kind: OperandKind<'a>,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine<'a> {
    pub number: usize,
    pub label: Option<(&'a str, usize)>,
    pub op: Option<(&'a str, usize)>,
    pub operands: Vec<Operand<'a>>,
}

impl<'a> SourceLine<'a> {
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.op.is_none()
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

/// Parses a decimal or `0x` hexadecimal literal with optional sign.
pub fn parse_number(text: &str) -> Option<i64> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if body.is_empty() {
        return None;
    }
    let value = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()? as i64
    } else {
        body.parse::<i64>().ok()?
    };
    Some(if negative { value.wrapping_neg() } else { value })
}

/// Strips a trailing comment, honoring `#` inside string literals.
fn strip_comment(text: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '#' if !in_string => return &text[..i],
            _ => {}
        }
    }
    text
}

fn parse_string(line: usize, col: usize, text: &str) -> Result<Vec<u8>, AsmError> {
    let body = &text[1..];
    let mut bytes = Vec::new();
    let mut chars = body.chars();
    loop {
        match chars.next() {
            None => return Err(AsmError::new(line, col, AsmErrorKind::UnterminatedString)),
            Some('"') => break,
            Some('\\') => {
                let esc = chars
                    .next()
                    .ok_or_else(|| AsmError::new(line, col, AsmErrorKind::UnterminatedString))?;
                bytes.push(match esc {
                    'n' => b'\n',
                    't' => b'\t',
                    '0' => 0,
                    '\\' => b'\\',
                    '"' => b'"',
                    other => return Err(AsmError::new(line, col, AsmErrorKind::BadEscape(other))),
                });
            }
            Some(ch) => bytes.extend_from_slice(ch.to_string().as_bytes()),
        }
    }
    if chars.next().is_some() {
        return Err(AsmError::new(
            line,
            col,
            AsmErrorKind::BadOperand(text.to_string()),
        ));
    }
    Ok(bytes)
}

fn parse_operand<'a>(line: usize, col: usize, text: &'a str) -> Result<Operand<'a>, AsmError> {
    let kind = if text.starts_with('"') {
        OperandKind::Str(parse_string(line, col, text)?)
    } else if let Some(open) = text.find('(') {
        if !text.ends_with(')') {
            return Err(AsmError::new(
                line,
                col,
                AsmErrorKind::BadOperand(text.to_string()),
            ));
        }
        let offset_text = text[..open].trim();
        let offset = if offset_text.is_empty() {
            0
        } else {
            parse_number(offset_text).ok_or_else(|| {
                AsmError::new(line, col, AsmErrorKind::BadNumber(offset_text.to_string()))
            })?
        };
        let reg = text[open + 1..text.len() - 1].trim();
        OperandKind::Disp { offset, reg }
    } else if text.starts_with(|ch: char| ch.is_ascii_digit() || ch == '-' || ch == '+') {
        OperandKind::Number(
            parse_number(text)
                .ok_or_else(|| AsmError::new(line, col, AsmErrorKind::BadNumber(text.to_string())))?,
        )
    } else {
        OperandKind::Ident(text)
    };
    Ok(Operand { kind, col })
}

/// Splits an operand list on top-level commas, keeping each piece's column.
fn split_operands(text: &str, base: usize) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            ',' if !in_string => {
                pieces.push((start, &text[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push((start, &text[start..]));
    pieces
        .into_iter()
        .map(|(offset, piece)| {
            let lead = piece.len() - piece.trim_start().len();
            (base + offset + lead + 1, piece.trim())
        })
        .collect()
}

/// Tokenizes one line. `number` is the 1-based source line.
pub fn lex_line<'a>(number: usize, raw: &'a str) -> Result<SourceLine<'a>, AsmError> {
    let text = strip_comment(raw);
    let mut line = SourceLine {
        number,
        label: None,
        op: None,
        operands: Vec::new(),
    };

    let mut pos = text.len() - text.trim_start().len();

    // Optional `label:` prefix.
    let word_end = text[pos..]
        .find(|ch: char| !is_word_char(ch))
        .map_or(text.len(), |i| pos + i);
    if word_end > pos && text[word_end..].starts_with(':') {
        line.label = Some((&text[pos..word_end], pos + 1));
        pos = word_end + 1;
        pos += text[pos..].len() - text[pos..].trim_start().len();
    }

    if pos >= text.len() || text[pos..].trim().is_empty() {
        return Ok(line);
    }

    // Mnemonic or directive.
    let op_end = text[pos..]
        .find(|ch: char| !is_word_char(ch))
        .map_or(text.len(), |i| pos + i);
    if op_end == pos {
        return Err(AsmError::new(
            number,
            pos + 1,
            AsmErrorKind::BadOperand(text[pos..].trim_end().to_string()),
        ));
    }
    line.op = Some((&text[pos..op_end], pos + 1));
    pos = op_end;

    let rest = &text[pos..];
    if rest.trim().is_empty() {
        return Ok(line);
    }
    for (col, piece) in split_operands(rest, pos) {
        if piece.is_empty() {
            return Err(AsmError::new(
                number,
                col,
                AsmErrorKind::ExpectedOperand("operand before or after `,`"),
            ));
        }
        line.operands.push(parse_operand(number, col, piece)?);
    }
    Ok(line)
}
