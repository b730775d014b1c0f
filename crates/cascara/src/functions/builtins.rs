//! Bundled function set discovered at registry construction

use super::{FunctionConstructor, FunctionModule, StyleFunction};
use crate::environment::Environment;
use crate::error::{EvalError, Result};
use crate::value::Value;

/// The function module bundled with the compiler.
///
/// Registries created with [`super::FunctionRegistry::with_builtins`] discover
/// this module; user modules layer on top and may override any of its names.
#[derive(Debug, Default)]
pub struct CoreFunctions;

impl FunctionModule for CoreFunctions {
    fn implementations(&self) -> Vec<(&'static str, FunctionConstructor)> {
        vec![
            ("CeilFunction", construct::<CeilFunction>),
            ("FloorFunction", construct::<FloorFunction>),
            ("PercentageFunction", construct::<PercentageFunction>),
            ("UnitFunction", construct::<UnitFunction>),
            ("EscapeFunction", construct::<EscapeFunction>),
            ("DarkenFunction", construct::<DarkenFunction>),
            ("LightenFunction", construct::<LightenFunction>),
            ("IsNumberFunction", construct::<IsNumberFunction>),
            ("IsColorFunction", construct::<IsColorFunction>),
        ]
    }
}

/// Constructor for the C-style format function, registered under the literal
/// `%` token rather than a derived name.
pub(crate) fn format_function() -> Box<dyn StyleFunction> {
    Box::new(FormatFunction)
}

fn construct<F: StyleFunction + Default + 'static>() -> Box<dyn StyleFunction> {
    Box::new(F::default())
}

// ═══════════════════════════════════════════════════════════════════════
// String Functions
// ═══════════════════════════════════════════════════════════════════════

/// `%("…%s…", args…)`: C-style substitution into a quoted template.
///
/// `%s` inserts the argument's text content (quotes stripped), `%d` the
/// argument rounded to an integer, `%a` the argument's full CSS form, and
/// `%%` a literal percent sign.
#[derive(Debug, Default)]
struct FormatFunction;

impl StyleFunction for FormatFunction {
    fn call(&mut self, _env: &Environment, args: &[Value]) -> Result<Value> {
        let template = match args.first() {
            Some(Value::Quoted(s)) => s,
            Some(other) => {
                return Err(bad("%", format!("expected a quoted template, got `{}`", other)))
            }
            None => return Err(arity("%", 1, 0)),
        };

        let mut out = String::with_capacity(template.len());
        let mut next = 1;
        let mut chars = template.chars();
        while let Some(ch) = chars.next() {
            if ch != '%' {
                out.push(ch);
                continue;
            }
            match chars.next() {
                Some('%') => out.push('%'),
                Some(directive) if matches!(directive, 's' | 'd' | 'a') => {
                    let arg = args
                        .get(next)
                        .ok_or_else(|| arity("%", next + 1, args.len()))?;
                    next += 1;
                    match directive {
                        's' => match arg {
                            Value::Quoted(s) => out.push_str(s),
                            other => out.push_str(&other.to_string()),
                        },
                        'd' => {
                            let (value, _) = arg.as_number().ok_or_else(|| {
                                bad("%", format!("`%d` expects a number, got `{}`", arg))
                            })?;
                            out.push_str(&(value.round() as i64).to_string());
                        }
                        _ => out.push_str(&arg.to_string()),
                    }
                }
                Some(other) => {
                    return Err(bad("%", format!("unknown directive `%{}`", other)));
                }
                None => return Err(bad("%", "dangling `%` at end of template".to_string())),
            }
        }
        Ok(Value::Quoted(out))
    }
}

/// `escape(text)`: percent-encode text for use inside a URL.
#[derive(Debug, Default)]
struct EscapeFunction;

impl StyleFunction for EscapeFunction {
    fn call(&mut self, _env: &Environment, args: &[Value]) -> Result<Value> {
        let text = text_argument("escape", args)?;
        let mut out = String::with_capacity(text.len());
        for byte in text.bytes() {
            match byte {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    out.push(byte as char)
                }
                _ => out.push_str(&format!("%{:02X}", byte)),
            }
        }
        Ok(Value::Keyword(out))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Number Functions
// ═══════════════════════════════════════════════════════════════════════

/// `unit(number)` strips the unit; `unit(number, u)` replaces it with `u`.
#[derive(Debug, Default)]
struct UnitFunction;

impl StyleFunction for UnitFunction {
    fn call(&mut self, _env: &Environment, args: &[Value]) -> Result<Value> {
        if args.len() > 2 {
            return Err(arity("unit", 2, args.len()));
        }
        let (value, _) = number_argument("unit", args, 0)?;
        match args.get(1) {
            None => Ok(Value::number(value)),
            Some(unit) => {
                let text = unit.as_text().ok_or_else(|| {
                    bad("unit", format!("expected a unit identifier, got `{}`", unit))
                })?;
                Ok(Value::dimension(value, text))
            }
        }
    }
}

/// `percentage(number)`: `0.5` becomes `50%`.
#[derive(Debug, Default)]
struct PercentageFunction;

impl StyleFunction for PercentageFunction {
    fn call(&mut self, _env: &Environment, args: &[Value]) -> Result<Value> {
        let (value, _) = number_argument("percentage", args, 0)?;
        Ok(Value::dimension(value * 100.0, "%"))
    }
}

/// `ceil(number)`, unit preserved.
#[derive(Debug, Default)]
struct CeilFunction;

impl StyleFunction for CeilFunction {
    fn call(&mut self, _env: &Environment, args: &[Value]) -> Result<Value> {
        let (value, unit) = number_argument("ceil", args, 0)?;
        Ok(Value::Number {
            value: value.ceil(),
            unit: unit.map(str::to_owned),
        })
    }
}

/// `floor(number)`, unit preserved.
#[derive(Debug, Default)]
struct FloorFunction;

impl StyleFunction for FloorFunction {
    fn call(&mut self, _env: &Environment, args: &[Value]) -> Result<Value> {
        let (value, unit) = number_argument("floor", args, 0)?;
        Ok(Value::Number {
            value: value.floor(),
            unit: unit.map(str::to_owned),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Color Functions
// ═══════════════════════════════════════════════════════════════════════

/// `darken(color, amount)`: decrease HSL lightness by `amount` points.
#[derive(Debug, Default)]
struct DarkenFunction;

impl StyleFunction for DarkenFunction {
    fn call(&mut self, _env: &Environment, args: &[Value]) -> Result<Value> {
        adjust_lightness("darken", args, -1.0)
    }
}

/// `lighten(color, amount)`: increase HSL lightness by `amount` points.
#[derive(Debug, Default)]
struct LightenFunction;

impl StyleFunction for LightenFunction {
    fn call(&mut self, _env: &Environment, args: &[Value]) -> Result<Value> {
        adjust_lightness("lighten", args, 1.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Type Predicates
// ═══════════════════════════════════════════════════════════════════════

/// `isnumber(value)` / `is-number(value)`.
#[derive(Debug, Default)]
struct IsNumberFunction;

impl StyleFunction for IsNumberFunction {
    fn call(&mut self, _env: &Environment, args: &[Value]) -> Result<Value> {
        match args.first() {
            Some(value) => Ok(Value::Bool(value.is_number())),
            None => Err(arity("is-number", 1, 0)),
        }
    }
}

/// `iscolor(value)` / `is-color(value)`.
#[derive(Debug, Default)]
struct IsColorFunction;

impl StyleFunction for IsColorFunction {
    fn call(&mut self, _env: &Environment, args: &[Value]) -> Result<Value> {
        match args.first() {
            Some(value) => Ok(Value::Bool(value.is_color())),
            None => Err(arity("is-color", 1, 0)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Argument and Color Helpers
// ═══════════════════════════════════════════════════════════════════════

fn bad(function: &'static str, reason: String) -> EvalError {
    EvalError::BadArgument { function, reason }
}

fn arity(function: &'static str, expected: usize, got: usize) -> EvalError {
    EvalError::WrongArgumentCount {
        function,
        expected,
        got,
    }
}

fn number_argument<'a>(
    function: &'static str,
    args: &'a [Value],
    index: usize,
) -> Result<(f64, Option<&'a str>)> {
    match args.get(index) {
        Some(value) => value
            .as_number()
            .ok_or_else(|| bad(function, format!("expected a number, got `{}`", value))),
        None => Err(arity(function, index + 1, args.len())),
    }
}

fn text_argument<'a>(function: &'static str, args: &'a [Value]) -> Result<&'a str> {
    match args.first() {
        Some(value) => value
            .as_text()
            .ok_or_else(|| bad(function, format!("expected text, got `{}`", value))),
        None => Err(arity(function, 1, 0)),
    }
}

fn adjust_lightness(function: &'static str, args: &[Value], sign: f64) -> Result<Value> {
    let (r, g, b, alpha) = match args.first() {
        Some(Value::Color { r, g, b, alpha }) => (*r, *g, *b, *alpha),
        Some(other) => return Err(bad(function, format!("expected a color, got `{}`", other))),
        None => return Err(arity(function, 2, 0)),
    };
    let (amount, _) = number_argument(function, args, 1)?;

    let (h, s, l) = rgb_to_hsl(r, g, b);
    let l = (l + sign * amount / 100.0).clamp(0.0, 1.0);
    let (r, g, b) = hsl_to_rgb(h, s, l);
    Ok(Value::Color { r, g, b, alpha })
}

fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let d = max - min;
    if d < f64::EPSILON {
        return (0.0, 0.0, l);
    }
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if (max - r).abs() < f64::EPSILON {
        ((g - b) / d).rem_euclid(6.0)
    } else if (max - g).abs() < f64::EPSILON {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h * 60.0, s, l)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (channel(r1), channel(g1), channel(b1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value> {
        let env = Environment::new();
        let mut function = env.function(name).expect("builtin is registered");
        function.call(&env, args)
    }

    #[test]
    fn test_format_directives() {
        let result = call(
            "%",
            &[
                Value::quoted("repeating-linear-gradient(%s %d%%)"),
                Value::quoted("red"),
                Value::number(25.4),
            ],
        )
        .unwrap();
        assert_eq!(result, Value::quoted("repeating-linear-gradient(red 25%)"));
    }

    #[test]
    fn test_format_a_keeps_quotes() {
        let result = call("%", &[Value::quoted("%a"), Value::quoted("x")]).unwrap();
        assert_eq!(result, Value::quoted("\"x\""));
    }

    #[test]
    fn test_format_missing_argument() {
        let err = call("%", &[Value::quoted("%s %s"), Value::quoted("only")]).unwrap_err();
        assert!(matches!(err, EvalError::WrongArgumentCount { .. }));
    }

    #[test]
    fn test_format_rejects_unquoted_template() {
        let err = call("%", &[Value::keyword("nope")]).unwrap_err();
        assert!(matches!(err, EvalError::BadArgument { .. }));
    }

    #[test]
    fn test_escape_reserved_characters() {
        let result = call("escape", &[Value::quoted("a=1 b=2")]).unwrap();
        assert_eq!(result, Value::keyword("a%3D1%20b%3D2"));
    }

    #[test]
    fn test_unit_strip_and_replace() {
        assert_eq!(
            call("unit", &[Value::dimension(5.0, "px")]).unwrap(),
            Value::number(5.0)
        );
        assert_eq!(
            call("unit", &[Value::number(5.0), Value::keyword("em")]).unwrap(),
            Value::dimension(5.0, "em")
        );
    }

    #[test]
    fn test_percentage() {
        assert_eq!(
            call("percentage", &[Value::number(0.5)]).unwrap(),
            Value::dimension(50.0, "%")
        );
    }

    #[test]
    fn test_ceil_floor_preserve_unit() {
        assert_eq!(
            call("ceil", &[Value::dimension(2.1, "px")]).unwrap(),
            Value::dimension(3.0, "px")
        );
        assert_eq!(
            call("floor", &[Value::dimension(2.9, "px")]).unwrap(),
            Value::dimension(2.0, "px")
        );
    }

    #[test]
    fn test_darken_white_by_half() {
        let result = call(
            "darken",
            &[Value::rgb(255, 255, 255), Value::dimension(50.0, "%")],
        )
        .unwrap();
        assert_eq!(result, Value::rgb(128, 128, 128));
    }

    #[test]
    fn test_lighten_black_fully() {
        let result = call(
            "lighten",
            &[Value::rgb(0, 0, 0), Value::dimension(100.0, "%")],
        )
        .unwrap();
        assert_eq!(result, Value::rgb(255, 255, 255));
    }

    #[test]
    fn test_predicates() {
        assert_eq!(
            call("is-number", &[Value::number(1.0)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            call("isnumber", &[Value::keyword("x")]).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            call("iscolor", &[Value::rgb(1, 2, 3)]).unwrap(),
            Value::Bool(true)
        );
    }
}
