//! printf-style formatting and scanning.
//!
//! Verbs: `%d %s %v %f %e %g %x %X %o %b %t %q %c %%`, with the flags `-+ 0`, a width
//! and a `.precision`. A verb that does not fit its argument renders as
//! `%!verb(TYPE=value)`; a verb without an argument renders as `%!verb(MISSING)`.
//! `sscanf` reads the same verbs back, without flags or widths.

use crate::interpreter::value::Object;

use super::{Arity, Registry};

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    minus: bool,
    plus: bool,
    zero: bool,
    space: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

impl Spec {
    /// Pad `body` to the width. Zero padding goes after the sign.
    fn pad(&self, body: String, numeric: bool) -> String {
        let width = match self.width {
            Some(width) if body.chars().count() < width => width,
            _ => return body,
        };
        let fill = width - body.chars().count();
        if self.minus {
            return format!("{}{}", body, " ".repeat(fill));
        }
        if self.zero && numeric {
            let (sign, digits) = match body.chars().next() {
                Some(c @ ('-' | '+' | ' ')) => (c.to_string(), body[1..].to_string()),
                _ => (String::new(), body),
            };
            return format!("{}{}{}", sign, "0".repeat(fill), digits);
        }
        format!("{}{}", " ".repeat(fill), body)
    }

    fn signed(&self, negative: bool, magnitude: String) -> String {
        if negative {
            format!("-{}", magnitude)
        } else if self.plus {
            format!("+{}", magnitude)
        } else if self.space {
            format!(" {}", magnitude)
        } else {
            magnitude
        }
    }
}

fn bad_verb(verb: char, arg: &Object) -> String {
    format!("%!{}({}={})", verb, arg.type_tag(), arg.inspect())
}

fn as_float(arg: &Object) -> Option<f64> {
    match arg {
        Object::Integer(n) => Some(*n as f64),
        Object::UInteger(n) => Some(*n as f64),
        Object::Float(f) => Some(*f),
        Object::Decimal(d) => Some(d.to_f64()),
        _ => None,
    }
}

/// Exponent form with a signed, at least two digit exponent: 1.500000e+00.
fn exponent_form(value: f64, precision: usize) -> String {
    let text = format!("{:.*e}", precision, value.abs());
    match text.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => text,
    }
}

fn integer_radix(spec: &Spec, verb: char, arg: &Object) -> Option<String> {
    let (negative, magnitude): (bool, u64) = match arg {
        Object::Integer(n) => (*n < 0, n.unsigned_abs()),
        Object::UInteger(n) => (false, *n),
        Object::Boolean(_) | Object::Float(_) | Object::Decimal(_) => return None,
        Object::String(s) if matches!(verb, 'x' | 'X') => {
            let hex: String = s.bytes().map(|b| format!("{:02x}", b)).collect();
            return Some(if verb == 'X' { hex.to_uppercase() } else { hex });
        }
        _ => return None,
    };
    let digits = match verb {
        'd' => magnitude.to_string(),
        'x' => format!("{:x}", magnitude),
        'X' => format!("{:X}", magnitude),
        'o' => format!("{:o}", magnitude),
        'b' => format!("{:b}", magnitude),
        _ => return None,
    };
    Some(spec.signed(negative, digits))
}

fn render(spec: &Spec, verb: char, arg: &Object) -> String {
    match verb {
        's' | 'v' => {
            let mut text = arg.inspect();
            if let Some(precision) = spec.precision {
                text = text.chars().take(precision).collect();
            }
            spec.pad(text, false)
        }
        'd' | 'x' | 'X' | 'o' | 'b' => match integer_radix(spec, verb, arg) {
            Some(text) => spec.pad(text, true),
            None => bad_verb(verb, arg),
        },
        'f' | 'F' => match arg {
            Object::Decimal(d) => {
                let text = match spec.precision {
                    Some(p) => d.string_fixed(p as i32),
                    None => d.to_string(),
                };
                let negative = text.starts_with('-');
                let magnitude = text.trim_start_matches('-').to_string();
                spec.pad(spec.signed(negative, magnitude), true)
            }
            other => match as_float(other) {
                Some(f) => {
                    let magnitude = format!("{:.*}", spec.precision.unwrap_or(6), f.abs());
                    spec.pad(spec.signed(f.is_sign_negative() && f != 0.0, magnitude), true)
                }
                None => bad_verb(verb, arg),
            },
        },
        'e' | 'E' => match as_float(arg) {
            Some(f) => {
                let mut magnitude = exponent_form(f, spec.precision.unwrap_or(6));
                if verb == 'E' {
                    magnitude = magnitude.to_uppercase();
                }
                spec.pad(spec.signed(f < 0.0, magnitude), true)
            }
            None => bad_verb(verb, arg),
        },
        'g' | 'G' => match as_float(arg) {
            Some(f) => {
                let magnitude = Object::Float(f.abs()).inspect();
                spec.pad(spec.signed(f < 0.0, magnitude), true)
            }
            None => bad_verb(verb, arg),
        },
        't' => match arg {
            Object::Boolean(b) => spec.pad(b.to_string(), false),
            _ => bad_verb(verb, arg),
        },
        'q' => match arg {
            Object::String(s) => spec.pad(format!("{:?}", s), false),
            Object::Integer(n) => match u32::try_from(*n).ok().and_then(char::from_u32) {
                Some(c) => spec.pad(format!("{:?}", c), false),
                None => bad_verb(verb, arg),
            },
            _ => bad_verb(verb, arg),
        },
        'c' => match arg.as_int().and_then(|n| u32::try_from(n).ok()).and_then(char::from_u32) {
            Some(c) => spec.pad(c.to_string(), false),
            None => bad_verb(verb, arg),
        },
        other => format!("%!{}({}={})", other, arg.type_tag(), arg.inspect()),
    }
}

/// Expand `template` against `args`.
pub fn sprintf(template: &str, args: &[Object]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_arg = 0;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.minus = true,
                '+' => spec.plus = true,
                '0' => spec.zero = true,
                ' ' => spec.space = true,
                _ => break,
            }
            chars.next();
        }
        let mut width = String::new();
        while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
            width.push(d);
            chars.next();
        }
        spec.width = width.parse().ok();
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut precision = String::new();
            while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                precision.push(d);
                chars.next();
            }
            spec.precision = Some(precision.parse().unwrap_or(0));
        }
        let verb = match chars.next() {
            Some(verb) => verb,
            None => {
                out.push_str("%!(NOVERB)");
                break;
            }
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        match args.get(next_arg) {
            Some(arg) => out.push_str(&render(&spec, verb, arg)),
            None => out.push_str(&format!("%!{}(MISSING)", verb)),
        }
        next_arg += 1;
    }

    if next_arg < args.len() {
        let extra: Vec<String> = args[next_arg..]
            .iter()
            .map(|arg| format!("{}={}", arg.type_tag(), arg.inspect()))
            .collect();
        out.push_str(&format!("%!(EXTRA {})", extra.join(", ")));
    }
    out
}

/// Longest non-empty prefix of `input` whose characters satisfy `accept`.
fn token(input: &str, accept: impl Fn(usize, char) -> bool) -> Option<(&str, &str)> {
    let end = input
        .char_indices()
        .find(|&(i, c)| !accept(i, c))
        .map(|(i, _)| i)
        .unwrap_or(input.len());
    if end == 0 {
        return None;
    }
    Some(input.split_at(end))
}

fn scan_integer(input: &str, radix: u32) -> Option<(Object, &str)> {
    let (text, rest) = token(input, |i, c| c.is_digit(radix) || (i == 0 && (c == '-' || c == '+')))?;
    let value = i64::from_str_radix(text, radix).ok()?;
    Some((Object::Integer(value), rest))
}

fn scan_verb(verb: char, input: &str) -> Option<(Object, &str)> {
    match verb {
        'd' => scan_integer(input, 10),
        'x' | 'X' => scan_integer(input, 16),
        'o' => scan_integer(input, 8),
        'b' => scan_integer(input, 2),
        'f' | 'F' | 'e' | 'E' | 'g' | 'G' => {
            let (text, rest) = token(input, |_, c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))?;
            Some((Object::Float(text.parse().ok()?), rest))
        }
        't' => {
            if let Some(rest) = input.strip_prefix("true") {
                Some((Object::Boolean(true), rest))
            } else {
                input.strip_prefix("false").map(|rest| (Object::Boolean(false), rest))
            }
        }
        's' | 'v' => {
            let (text, rest) = token(input, |_, c| !c.is_whitespace())?;
            Some((Object::string(text), rest))
        }
        'q' => {
            let body = input.strip_prefix('"')?;
            let end = body.find('"')?;
            Some((Object::string(&body[..end]), &body[end + 1..]))
        }
        'c' => {
            let c = input.chars().next()?;
            Some((Object::String(c.to_string()), &input[c.len_utf8()..]))
        }
        _ => None,
    }
}

/// Read `input` against `template`: one value per verb, `None` on the first
/// mismatch. Whitespace in the template matches any run of whitespace; verbs
/// other than `%c` skip leading whitespace.
pub fn sscanf(input: &str, template: &str) -> Option<Vec<Object>> {
    let mut values = Vec::new();
    let mut rest = input;
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            rest = rest.trim_start();
            continue;
        }
        if c != '%' {
            rest = rest.strip_prefix(c)?;
            continue;
        }
        let verb = chars.next()?;
        if verb == '%' {
            rest = rest.strip_prefix('%')?;
            continue;
        }
        if verb != 'c' {
            rest = rest.trim_start();
        }
        let (value, remaining) = scan_verb(verb, rest)?;
        values.push(value);
        rest = remaining;
    }
    Some(values)
}

/// Register printf, sprintf and sscanf.
pub fn register_format_builtins(registry: &mut Registry) {
    // printf(format, ...) - writes and returns the number of bytes written
    registry.define("printf", |ctx, args| {
        ctx.check_arity(Arity::AtLeast(1), &args)?;
        let template = ctx.string_arg(&args, 0)?;
        let text = sprintf(&template, &args[1..]);
        ctx.write(&text)?;
        Ok(Object::Integer(text.len() as i64))
    });

    registry.define("sprintf", |ctx, args| {
        ctx.check_arity(Arity::AtLeast(1), &args)?;
        let template = ctx.string_arg(&args, 0)?;
        Ok(Object::String(sprintf(&template, &args[1..])))
    });

    // sscanf(input, format) - array of scanned values, nil when the input does not match
    registry.define("sscanf", |ctx, args| {
        ctx.check_arity(Arity::Exact(2), &args)?;
        let input = ctx.string_arg(&args, 0)?;
        let template = ctx.string_arg(&args, 1)?;
        Ok(sscanf(&input, &template).map(Object::array).unwrap_or(Object::Nil))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Decimal;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn test_basic_verbs() {
        let args = vec![Object::Integer(42), Object::string("hi"), Object::Boolean(true)];
        assert_eq!(sprintf("%d %s %t", &args), "42 hi true");
        assert_eq!(sprintf("100%%", &[]), "100%");
    }

    #[test]
    fn test_width_and_precision() {
        assert_eq!(sprintf("%5d|%-5d|%05d", &[Object::Integer(7), Object::Integer(7), Object::Integer(-7)]), "    7|7    |-0007");
        assert_eq!(sprintf("%.2f", &[Object::Float(3.14159)]), "3.14");
        assert_eq!(sprintf("%8.3f", &[Object::Float(-1.5)]), "  -1.500");
        assert_eq!(sprintf("%.3s", &[Object::string("abcdef")]), "abc");
    }

    #[test]
    fn test_radix_verbs() {
        assert_eq!(sprintf("%x %X %o %b", &[Object::Integer(255), Object::Integer(255), Object::Integer(8), Object::Integer(5)]), "ff FF 10 101");
        assert_eq!(sprintf("%x", &[Object::string("AB")]), "4142");
    }

    #[test]
    fn test_exponent_and_decimal() {
        assert_eq!(sprintf("%e", &[Object::Float(1500.0)]), "1.500000e+03");
        let d = Decimal::from_str("2.345").unwrap();
        assert_eq!(sprintf("%.2f", &[Object::Decimal(d)]), "2.35");
    }

    #[test]
    fn test_mismatches() {
        assert_eq!(sprintf("%d", &[Object::string("x")]), "%!d(STRING=x)");
        assert_eq!(sprintf("%d %d", &[Object::Integer(1)]), "1 %!d(MISSING)");
        assert_eq!(sprintf("%d", &[Object::Integer(1), Object::Integer(2)]), "1%!(EXTRA INTEGER=2)");
        assert_eq!(sprintf("%q %c", &[Object::string("a\"b"), Object::Integer(65)]), "\"a\\\"b\" A");
    }

    #[test]
    fn test_scan_verbs() {
        assert_eq!(
            sscanf("id=42 name=bolt price=0.25 ok=true", "id=%d name=%s price=%f ok=%t"),
            Some(vec![
                Object::Integer(42),
                Object::string("bolt"),
                Object::Float(0.25),
                Object::Boolean(true),
            ])
        );
        assert_eq!(sscanf("ff -7 \"a b\"", "%x %d %q"), Some(vec![Object::Integer(255), Object::Integer(-7), Object::string("a b")]));
        assert_eq!(sscanf("100%", "%d%%"), Some(vec![Object::Integer(100)]));
    }

    #[test]
    fn test_scan_mismatch_is_none() {
        assert_eq!(sscanf("abc", "%d"), None);
        assert_eq!(sscanf("x=1", "y=%d"), None);
        assert_eq!(sscanf("1", "%d %d"), None);
    }
}
