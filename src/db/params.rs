//! Query parameters and placeholder rewriting
//!
//! Report queries are written with named positional placeholders
//! (`@param0`, `@param1`, ...). PostgreSQL wants `$1`, `$2`, ... so the
//! driver rewrites placeholder *names* before preparing the statement.
//! Values are always sent as bind parameters, never spliced into the text.

use crate::error::{DbError, DbResult};
use bytes::BytesMut;
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt;
use std::str::FromStr;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

type BoxError = Box<dyn Error + Sync + Send>;

/// A single bind value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::Null => write!(f, "NULL"),
            SqlParam::Bool(b) => write!(f, "{}", b),
            SqlParam::Int(n) => write!(f, "{}", n),
            SqlParam::Float(x) => write!(f, "{}", x),
            SqlParam::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        SqlParam::Bool(v)
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        SqlParam::Int(v as i64)
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        SqlParam::Float(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlParam::Null, Into::into)
    }
}

/// Binds against whatever type the server inferred for the placeholder.
///
/// Integers are narrowed or widened to the column width, text is parsed when
/// the column is numeric or boolean.
impl ToSql for SqlParam {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            SqlParam::Null => Ok(IsNull::Yes),
            SqlParam::Bool(b) => match *ty {
                Type::BOOL => b.to_sql(ty, out),
                _ if is_text(ty) => b.to_string().as_str().to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            SqlParam::Int(n) => int_to_sql(*n, ty, out).unwrap_or_else(|| Err(mismatch(self, ty))),
            SqlParam::Float(x) => match *ty {
                Type::FLOAT4 => (*x as f32).to_sql(ty, out),
                Type::FLOAT8 => x.to_sql(ty, out),
                Type::NUMERIC => Decimal::try_from(*x)?.to_sql(ty, out),
                _ if is_text(ty) => x.to_string().as_str().to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            SqlParam::Text(s) => match *ty {
                Type::INT2 | Type::INT4 | Type::INT8 => {
                    let n: i64 = s.trim().parse()?;
                    int_to_sql(n, ty, out).unwrap_or_else(|| Err(mismatch(self, ty)))
                }
                Type::FLOAT4 => s.trim().parse::<f32>()?.to_sql(ty, out),
                Type::FLOAT8 => s.trim().parse::<f64>()?.to_sql(ty, out),
                Type::NUMERIC => Decimal::from_str(s.trim())?.to_sql(ty, out),
                Type::BOOL => parse_bool(s)
                    .ok_or_else(|| mismatch(self, ty))?
                    .to_sql(ty, out),
                _ => s.as_str().to_sql(ty, out),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn int_to_sql(n: i64, ty: &Type, out: &mut BytesMut) -> Option<Result<IsNull, BoxError>> {
    let result = match *ty {
        Type::INT2 => i16::try_from(n)
            .map_err(BoxError::from)
            .and_then(|v| v.to_sql(ty, out)),
        Type::INT4 => i32::try_from(n)
            .map_err(BoxError::from)
            .and_then(|v| v.to_sql(ty, out)),
        Type::INT8 => n.to_sql(ty, out),
        Type::FLOAT4 => (n as f32).to_sql(ty, out),
        Type::FLOAT8 => (n as f64).to_sql(ty, out),
        Type::NUMERIC => Decimal::from(n).to_sql(ty, out),
        _ if is_text(ty) => n.to_string().as_str().to_sql(ty, out),
        _ => return None,
    };
    Some(result)
}

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    )
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" => Some(true),
        "0" | "f" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn mismatch(param: &SqlParam, ty: &Type) -> BoxError {
    format!("cannot bind {} to a {} parameter", param, ty.name()).into()
}

/// Rewrite `@paramN` placeholders into PostgreSQL's `$N+1` form.
///
/// Placeholders inside string literals (including `E'...'` escape strings
/// and `$tag$...$tag$` dollar quoting), quoted identifiers and comments are
/// left alone. Every placeholder must refer to an existing value and every
/// value must be referenced at least once.
pub fn rewrite_placeholders(sql: &str, param_count: usize) -> DbResult<String> {
    const MARKER: &str = "@param";

    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut used = vec![false; param_count];
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'E' | b'e' if bytes.get(i + 1) == Some(&b'\'') && !follows_ident(bytes, i) => {
                i = skip_escape_string(bytes, i + 1);
            }
            quote @ (b'\'' | b'"') => i = skip_quoted(bytes, i, quote),
            b'$' => match dollar_tag(sql, i) {
                Some(tag) => {
                    let body = i + tag.len();
                    i = sql[body..].find(tag).map_or(bytes.len(), |n| body + n + tag.len());
                }
                None => i += 1,
            },
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = sql[i..].find('\n').map_or(bytes.len(), |n| i + n + 1);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..].find("*/").map_or(bytes.len(), |n| i + 2 + n + 2);
            }
            b'@' if sql[i..].starts_with(MARKER) => {
                let start = i + MARKER.len();
                let end = start
                    + bytes[start..]
                        .iter()
                        .take_while(|b| b.is_ascii_digit())
                        .count();
                let boundary = bytes
                    .get(end)
                    .is_none_or(|b| !(b.is_ascii_alphanumeric() || *b == b'_'));

                if end == start || !boundary {
                    i += 1;
                    continue;
                }

                let index: usize = sql[start..end]
                    .parse()
                    .map_err(|_| DbError::Binding(format!("bad placeholder {}", &sql[i..end])))?;
                if index >= param_count {
                    return Err(DbError::Binding(format!(
                        "placeholder @param{} has no value ({} given)",
                        index, param_count
                    )));
                }
                used[index] = true;

                out.push_str(&sql[copied..i]);
                out.push('$');
                out.push_str(&(index + 1).to_string());
                copied = end;
                i = end;
            }
            _ => i += 1,
        }
    }
    out.push_str(&sql[copied..]);

    if let Some(unused) = used.iter().position(|u| !u) {
        return Err(DbError::Binding(format!(
            "value for @param{} is never referenced",
            unused
        )));
    }
    Ok(out)
}

/// Index just past the closing quote; doubled quotes are escapes
fn skip_quoted(bytes: &[u8], open: usize, quote: u8) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Index just past the closing quote of an `E'...'` string, where a
/// backslash escapes the next byte
fn skip_escape_string(bytes: &[u8], open: usize) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\'' if bytes.get(i + 1) == Some(&b'\'') => i += 2,
            b'\'' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// The `$tag$` delimiter opening at `open`, if any
fn dollar_tag(sql: &str, open: usize) -> Option<&str> {
    let bytes = sql.as_bytes();
    if follows_ident(bytes, open) {
        return None;
    }
    let rest = &bytes[open + 1..];
    if rest.first().is_some_and(|b| b.is_ascii_digit()) {
        return None;
    }
    let len = rest.iter().take_while(|b| is_ident_byte(**b)).count();
    (rest.get(len) == Some(&b'$')).then(|| &sql[open..open + len + 2])
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Whether the byte before `i` continues an identifier
fn follows_ident(bytes: &[u8], i: usize) -> bool {
    i > 0 && (is_ident_byte(bytes[i - 1]) || bytes[i - 1] == b'$')
}
