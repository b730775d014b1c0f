//! Evaluated value representation

use std::fmt;

/// An evaluated style-sheet value.
///
/// This is the currency of the environment: variable bindings hold values,
/// and callable functions consume and produce them. The set is closed over
/// what evaluation can reduce an expression to; unevaluated AST never
/// appears here.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A number with an optional unit, e.g. `12px` or `1.5`
    Number {
        /// Numeric magnitude
        value: f64,
        /// CSS unit, if any (`px`, `%`, `em`, ...)
        unit: Option<String>,
    },

    /// An RGBA color
    Color {
        /// Red channel, 0-255
        r: u8,
        /// Green channel, 0-255
        g: u8,
        /// Blue channel, 0-255
        b: u8,
        /// Alpha, 0.0-1.0
        alpha: f64,
    },

    /// A quoted string; the text excludes the quotes
    Quoted(String),

    /// An unquoted identifier, e.g. `solid` or `inherit`
    Keyword(String),

    /// A comma-separated list of values
    List(Vec<Value>),

    /// A boolean, produced by guards and predicate functions
    Bool(bool),
}

impl Value {
    /// A unitless number.
    pub fn number(value: f64) -> Self {
        Value::Number { value, unit: None }
    }

    /// A number carrying a unit.
    pub fn dimension(value: f64, unit: impl Into<String>) -> Self {
        Value::Number {
            value,
            unit: Some(unit.into()),
        }
    }

    /// An opaque RGB color.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Value::Color { r, g, b, alpha: 1.0 }
    }

    /// A quoted string value.
    pub fn quoted(text: impl Into<String>) -> Self {
        Value::Quoted(text.into())
    }

    /// An unquoted keyword value.
    pub fn keyword(text: impl Into<String>) -> Self {
        Value::Keyword(text.into())
    }

    /// The numeric magnitude and unit, if this is a number.
    pub fn as_number(&self) -> Option<(f64, Option<&str>)> {
        match self {
            Value::Number { value, unit } => Some((*value, unit.as_deref())),
            _ => None,
        }
    }

    /// The string content, if this is quoted text or a keyword.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Quoted(s) | Value::Keyword(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value is a number.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number { .. })
    }

    /// Whether this value is a color.
    pub fn is_color(&self) -> bool {
        matches!(self, Value::Color { .. })
    }
}

impl fmt::Display for Value {
    /// Renders the CSS text form of the value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number { value, unit } => {
                write_number(f, *value)?;
                if let Some(unit) = unit {
                    write!(f, "{}", unit)?;
                }
                Ok(())
            }
            Value::Color { r, g, b, alpha } => {
                if (*alpha - 1.0).abs() < f64::EPSILON {
                    write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
                } else {
                    write!(f, "rgba({}, {}, {}, ", r, g, b)?;
                    write_number(f, *alpha)?;
                    write!(f, ")")
                }
            }
            Value::Quoted(s) => write!(f, "\"{}\"", s),
            Value::Keyword(s) => write!(f, "{}", s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Write a number without a trailing `.0` on whole values.
fn write_number(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_finite() && value == value.trunc() {
        write!(f, "{}", value as i64)
    } else {
        write!(f, "{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_number_trims_whole_values() {
        assert_eq!(Value::number(4.0).to_string(), "4");
        assert_eq!(Value::number(1.5).to_string(), "1.5");
        assert_eq!(Value::dimension(12.0, "px").to_string(), "12px");
    }

    #[test]
    fn test_display_color_forms() {
        assert_eq!(Value::rgb(255, 0, 16).to_string(), "#ff0010");
        let translucent = Value::Color {
            r: 0,
            g: 0,
            b: 0,
            alpha: 0.5,
        };
        assert_eq!(translucent.to_string(), "rgba(0, 0, 0, 0.5)");
    }

    #[test]
    fn test_display_quoted_and_keyword() {
        assert_eq!(Value::quoted("a b").to_string(), "\"a b\"");
        assert_eq!(Value::keyword("solid").to_string(), "solid");
    }

    #[test]
    fn test_display_list() {
        let list = Value::List(vec![Value::keyword("a"), Value::number(2.0)]);
        assert_eq!(list.to_string(), "a, 2");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(
            Value::dimension(3.0, "em").as_number(),
            Some((3.0, Some("em")))
        );
        assert_eq!(Value::keyword("x").as_number(), None);
        assert!(Value::rgb(0, 0, 0).is_color());
        assert!(!Value::Bool(true).is_number());
    }
}
