// SPDX-License-Identifier: Apache-2.0

/// A JSON number, kept as an integer when the source text is integral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    /// The value as an `i64`, when it is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(v) => Some(*v),
            Number::Float(_) => None,
        }
    }

    /// The value as an `f64`. Integers convert losslessly up to 2^53.
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(v) => *v as f64,
            Number::Float(v) => *v,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Integer(v)
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Number::Integer(v as i64)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Float(v)
    }
}
