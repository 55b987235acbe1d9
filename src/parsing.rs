//! Token parsing and number rendering helpers for command lines.
//!
//! ACC command lines are whitespace-separated ASCII. These helpers turn the
//! positional tokens into typed values (reporting a command-specific
//! [`UsageError`] on failure) and render numbers back into the decimal text
//! the devices expect.

use crate::error::UsageError;

/// Split a raw command line into tokens.
///
/// Returns an empty vector for blank input.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Check that `tokens` (including the command name) carries exactly
/// `expected` arguments.
pub fn expect_arity(tokens: &[&str], expected: usize) -> Result<(), UsageError> {
    let got = tokens.len().saturating_sub(1);
    if got == expected {
        Ok(())
    } else {
        Err(UsageError::Arity {
            command: command_name(tokens),
            expected,
            got,
        })
    }
}

/// Parse an integer argument.
pub fn parse_int(command: &str, token: &str) -> Result<i64, UsageError> {
    token.parse().map_err(|_| UsageError::Number {
        command: command.to_string(),
        token: token.to_string(),
        kind: "integer",
    })
}

/// Parse a floating-point argument.
///
/// Non-finite values (`nan`, `inf`) are rejected; they would produce a
/// program the controller cannot interpret.
pub fn parse_float(command: &str, token: &str) -> Result<f64, UsageError> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(UsageError::Number {
            command: command.to_string(),
            token: token.to_string(),
            kind: "number",
        }),
    }
}

/// Render a number the way the device firmware expects to read it.
///
/// Values are rounded to 12 significant digits, which hides binary
/// representation noise (`1.2 / 0.3` renders as `4.0`, not
/// `3.9999999999999996`). Integral values keep a trailing `.0`.
///
/// ```
/// use feanta_bridge::parsing::decimal;
///
/// assert_eq!(decimal(12.5), "12.5");
/// assert_eq!(decimal(1.2 / 0.3), "4.0");
/// assert_eq!(decimal(-2121054.0), "-2121054.0");
/// ```
pub fn decimal(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded: f64 = format!("{:.11e}", value).parse().unwrap_or(value);
    let mut text = rounded.to_string();
    if !text.contains(['.', 'e', 'E']) {
        text.push_str(".0");
    }
    text
}

/// Strip a trailing two-byte line terminator and trim whitespace from a
/// device reply.
pub fn reply_text(reply: &[u8]) -> String {
    let body = &reply[..reply.len().saturating_sub(2)];
    String::from_utf8_lossy(body).trim().to_string()
}

fn command_name(tokens: &[&str]) -> String {
    tokens.first().copied().unwrap_or_default().to_string()
}
