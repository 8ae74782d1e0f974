//! Read-only state inspection.
//!
//! Debuggers and tests look inside the platform through string paths
//! rather than reaching into private fields. Queries never affect
//! emulation state.

use std::fmt;

/// A dynamically-typed value returned by a state query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    String(String),
    /// Ordered list, e.g. the eight PSG-port interrupt inputs.
    Array(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v:#04X}"),
            Value::U16(v) => write!(f, "{v:#06X}"),
            Value::U32(v) => write!(f, "{v:#010X}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from!(bool => Bool, u8 => U8, u16 => U16, u32 => U32, u64 => U64, String => String);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

/// A component whose state can be inspected.
pub trait Observable {
    /// Query a property by dotted path, e.g. `fdc.track` or
    /// `interrupts.mask`. Returns `None` for unknown paths.
    fn query(&self, path: &str) -> Option<Value>;

    /// Every path `query()` answers.
    fn query_paths(&self) -> &'static [&'static str];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_by_width() {
        assert_eq!(Value::U8(0x95).to_string(), "0x95");
        assert_eq!(Value::U16(0x00C0).to_string(), "0x00C0");
        assert_eq!(Value::U64(262).to_string(), "262");
    }

    #[test]
    fn display_array() {
        let v = Value::Array(vec![Value::Bool(true), Value::U8(1)]);
        assert_eq!(v.to_string(), "[true, 0x01]");
    }

    #[test]
    fn from_conversions() {
        assert_eq!(Value::from(7u8), Value::U8(7));
        assert_eq!(Value::from("idle"), Value::String("idle".into()));
    }
}
