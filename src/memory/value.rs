//! Typed value representation
//!
//! This module defines [`Value`], the owned scalar stored in the stack, BSS and
//! DATA regions, and [`ValueRef`], a borrowed view of one.
//!
//! # Value Kinds
//!
//! - [`Value::Float`]: 32-bit float
//! - [`Value::Int`]: 32-bit signed integer
//! - [`Value::Char`]: single character
//! - [`Value::Str`]: owned string
//! - [`Value::Byte`]: raw byte
//! - [`Value::None`]: absent payload
//!
//! # Terminated Arrays
//!
//! Value arrays produced by the loader end with a [`Value::None`] entry.
//! [`terminated`] returns the prefix before that sentinel.

use std::fmt;

/// Runtime values held by the value regions
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    Float(f32),
    Int(i32),
    Char(char),
    Str(String),
    Byte(u8),
    #[default]
    None, // Terminator / null entry
}

/// The kind tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Float,
    Int,
    Char,
    String,
    Byte,
    None,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Float => "FLOAT",
            ValueKind::Int => "INT",
            ValueKind::Char => "CHAR",
            ValueKind::String => "STRING",
            ValueKind::Byte => "BYTE",
            ValueKind::None => "VOID",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Int(_) => ValueKind::Int,
            Value::Char(_) => ValueKind::Char,
            Value::Str(_) => ValueKind::String,
            Value::Byte(_) => ValueKind::Byte,
            Value::None => ValueKind::None,
        }
    }

    /// Check if this value is the `None` sentinel
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Borrow this value as a non-owning view
    pub fn view(&self) -> ValueRef<'_> {
        match self {
            Value::Float(v) => ValueRef::Float(*v),
            Value::Int(v) => ValueRef::Int(*v),
            Value::Char(v) => ValueRef::Char(*v),
            Value::Str(s) => ValueRef::Str(s),
            Value::Byte(v) => ValueRef::Byte(*v),
            Value::None => ValueRef::None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.view().fmt(f)
    }
}

/// Non-owning view of a [`Value`]
///
/// Copying a view copies the handle only; the payload stays with the owning
/// [`Value`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    Float(f32),
    Int(i32),
    Char(char),
    Str(&'a str),
    Byte(u8),
    None,
}

impl ValueRef<'_> {
    pub fn kind(&self) -> ValueKind {
        match self {
            ValueRef::Float(_) => ValueKind::Float,
            ValueRef::Int(_) => ValueKind::Int,
            ValueRef::Char(_) => ValueKind::Char,
            ValueRef::Str(_) => ValueKind::String,
            ValueRef::Byte(_) => ValueKind::Byte,
            ValueRef::None => ValueKind::None,
        }
    }

    /// Produce an owned copy of the viewed value
    pub fn to_value(self) -> Value {
        match self {
            ValueRef::Float(v) => Value::Float(v),
            ValueRef::Int(v) => Value::Int(v),
            ValueRef::Char(v) => Value::Char(v),
            ValueRef::Str(s) => Value::Str(s.to_string()),
            ValueRef::Byte(v) => Value::Byte(v),
            ValueRef::None => Value::None,
        }
    }
}

impl fmt::Display for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRef::Float(v) => write!(f, "{:.6}", v),
            ValueRef::Int(v) => write!(f, "{}", v),
            ValueRef::Char(c) => write!(f, "{}", c),
            ValueRef::Str(s) => f.write_str(s),
            ValueRef::Byte(b) => write!(f, "0x{:x}", b),
            ValueRef::None => f.write_str("NULL"),
        }
    }
}

/// Return the entries of a `None`-terminated array, excluding the terminator.
///
/// A slice without a terminator is taken whole.
pub fn terminated(values: &[Value]) -> &[Value] {
    let end = values
        .iter()
        .position(Value::is_none)
        .unwrap_or(values.len());
    &values[..end]
}
