//! Primitive widening for the binary reader: a persisted numeric value
//! converts into whichever of the four primitive slots the caller asked
//! for. Int/uint/float convert by numeric cast, any numeric reads as
//! `true` when non-zero, and bool reads as 0/1.

use crate::binary::headers::ElementType;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Numeric {
    Int(i32),
    UInt(u32),
    Float(f32),
    Bool(bool),
}

impl Numeric {
    /// Decode the body of a numeric-typed element. Non-numeric element
    /// types have no conversion and yield `None`, which leaves the
    /// caller's slot untouched.
    pub(crate) fn decode(ty: ElementType, body: &[u8]) -> Option<Numeric> {
        match ty {
            ElementType::Int => Some(Numeric::Int(i32::from_ne_bytes(read4(body)?))),
            ElementType::UInt => Some(Numeric::UInt(u32::from_ne_bytes(read4(body)?))),
            ElementType::Float => Some(Numeric::Float(f32::from_ne_bytes(read4(body)?))),
            ElementType::Bool => Some(Numeric::Bool(*body.first()? != 0)),
            _ => None,
        }
    }

    pub(crate) fn to_i32(self) -> i32 {
        match self {
            Numeric::Int(v) => v,
            Numeric::UInt(v) => v as i32,
            Numeric::Float(v) => v as i32,
            Numeric::Bool(v) => v as i32,
        }
    }

    pub(crate) fn to_u32(self) -> u32 {
        match self {
            Numeric::Int(v) => v as u32,
            Numeric::UInt(v) => v,
            Numeric::Float(v) => v as u32,
            Numeric::Bool(v) => v as u32,
        }
    }

    pub(crate) fn to_f32(self) -> f32 {
        match self {
            Numeric::Int(v) => v as f32,
            Numeric::UInt(v) => v as f32,
            Numeric::Float(v) => v,
            Numeric::Bool(v) => v as u32 as f32,
        }
    }

    pub(crate) fn to_bool(self) -> bool {
        match self {
            Numeric::Int(v) => v != 0,
            Numeric::UInt(v) => v != 0,
            Numeric::Float(v) => v != 0.0,
            Numeric::Bool(v) => v,
        }
    }
}

fn read4(body: &[u8]) -> Option<[u8; 4]> {
    body.get(..4)?.try_into().ok()
}

/// Primitive slot types a [`Numeric`] widens into.
pub(crate) trait Widen: Copy {
    fn from_numeric(n: Numeric) -> Self;
}

impl Widen for i32 {
    fn from_numeric(n: Numeric) -> Self {
        n.to_i32()
    }
}

impl Widen for u32 {
    fn from_numeric(n: Numeric) -> Self {
        n.to_u32()
    }
}

impl Widen for f32 {
    fn from_numeric(n: Numeric) -> Self {
        n.to_f32()
    }
}

impl Widen for bool {
    fn from_numeric(n: Numeric) -> Self {
        n.to_bool()
    }
}
