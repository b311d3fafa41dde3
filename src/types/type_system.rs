//! Type System for C.SHORT
//!
//! Five primitive types, one-dimensional arrays of them, and a poisoned
//! `Error` type produced by ill-typed operators.

use std::fmt;

use serde::{Serialize, Serializer};

/// Primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Int,
    Float,
    Char,
    Bool,
    Void,
}

impl PrimitiveType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Char => "char",
            Self::Bool => "bool",
            Self::Void => "void",
        }
    }

    /// Check if this type takes part in arithmetic and relational operators
    pub fn is_integral(&self) -> bool {
        matches!(self, Self::Int | Self::Char)
    }
}

/// Type of a declaration or of an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CType {
    Primitive(PrimitiveType),
    Array(PrimitiveType),
    /// Result of an ill-typed operation; compatible with nothing
    Error,
}

impl CType {
    // Constants for common types
    pub const INT: Self = Self::Primitive(PrimitiveType::Int);
    pub const FLOAT: Self = Self::Primitive(PrimitiveType::Float);
    pub const CHAR: Self = Self::Primitive(PrimitiveType::Char);
    pub const BOOL: Self = Self::Primitive(PrimitiveType::Bool);
    pub const VOID: Self = Self::Primitive(PrimitiveType::Void);
    pub const STRING: Self = Self::Array(PrimitiveType::Char);

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    pub fn is_void(&self) -> bool {
        *self == Self::VOID
    }

    /// Type seen through an index: arrays expose their base type
    pub fn element(&self) -> CType {
        match self {
            Self::Array(base) => Self::Primitive(*base),
            other => *other,
        }
    }

    fn integral(&self) -> Option<PrimitiveType> {
        match self {
            Self::Primitive(p) if p.is_integral() => Some(*p),
            _ => None,
        }
    }

    /// Can a value of type `value` be stored into a location of type `self`?
    ///
    /// Identical types match, `int`/`char` and `bool`/`int` are
    /// interchangeable, arrays need the same base type. `Error` never matches.
    pub fn accepts(&self, value: &CType) -> bool {
        use PrimitiveType::*;
        match (self, value) {
            (Self::Error, _) | (_, Self::Error) => false,
            (Self::Primitive(a), Self::Primitive(b)) => {
                a == b || matches!((a, b), (Int, Char) | (Char, Int) | (Bool, Int) | (Int, Bool))
            }
            (Self::Array(a), Self::Array(b)) => a == b,
            _ => false,
        }
    }

    /// Result of `+ - * /`: int dominates char; anything else is poisoned
    pub fn arithmetic(left: CType, right: CType) -> CType {
        match (left.integral(), right.integral()) {
            (Some(PrimitiveType::Char), Some(PrimitiveType::Char)) => Self::CHAR,
            (Some(_), Some(_)) => Self::INT,
            _ => Self::Error,
        }
    }

    /// Result of a unary sign
    pub fn signed(operand: CType) -> CType {
        match operand.integral() {
            Some(p) => Self::Primitive(p),
            None => Self::Error,
        }
    }

    /// Result of `&&`, `||`
    pub fn logical(left: CType, right: CType) -> CType {
        if left == Self::BOOL && right == Self::BOOL {
            Self::BOOL
        } else {
            Self::Error
        }
    }

    /// Result of `!`
    pub fn negated(operand: CType) -> CType {
        if operand == Self::BOOL {
            Self::BOOL
        } else {
            Self::Error
        }
    }

    /// Result of `== != < > <= >=`
    pub fn relational(left: CType, right: CType) -> CType {
        match (left.integral(), right.integral()) {
            (Some(_), Some(_)) => Self::BOOL,
            _ => Self::Error,
        }
    }
}

impl From<PrimitiveType> for CType {
    fn from(p: PrimitiveType) -> Self {
        Self::Primitive(p)
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "{}", p.name()),
            Self::Array(p) => write!(f, "{}[]", p.name()),
            Self::Error => write!(f, "error"),
        }
    }
}

// Reports show types the way diagnostics print them ("int[]")
impl Serialize for CType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_promotion() {
        assert_eq!(CType::arithmetic(CType::INT, CType::CHAR), CType::INT);
        assert_eq!(CType::arithmetic(CType::CHAR, CType::INT), CType::INT);
        assert_eq!(CType::arithmetic(CType::CHAR, CType::CHAR), CType::CHAR);
        assert_eq!(CType::arithmetic(CType::INT, CType::INT), CType::INT);
    }

    #[test]
    fn test_arithmetic_poisons_on_arrays_and_floats() {
        let int_array = CType::Array(PrimitiveType::Int);
        assert_eq!(CType::arithmetic(int_array, CType::INT), CType::Error);
        assert_eq!(CType::arithmetic(CType::FLOAT, CType::INT), CType::Error);
        assert_eq!(CType::arithmetic(CType::BOOL, CType::INT), CType::Error);
        assert_eq!(CType::signed(int_array), CType::Error);
        assert!(!CType::INT.accepts(&CType::arithmetic(int_array, CType::INT)));
    }

    #[test]
    fn test_assignment_matrix() {
        let int_array = CType::Array(PrimitiveType::Int);
        let float_array = CType::Array(PrimitiveType::Float);

        assert!(CType::BOOL.accepts(&CType::INT));
        assert!(CType::INT.accepts(&CType::BOOL));
        assert!(CType::INT.accepts(&CType::CHAR));
        assert!(CType::CHAR.accepts(&CType::INT));
        assert!(CType::FLOAT.accepts(&CType::FLOAT));
        assert!(!CType::FLOAT.accepts(&CType::INT));
        assert!(!CType::INT.accepts(&CType::FLOAT));
        assert!(!CType::BOOL.accepts(&CType::CHAR));
        assert!(int_array.accepts(&int_array));
        assert!(!int_array.accepts(&float_array));
        assert!(!int_array.accepts(&CType::INT));
        assert!(!CType::Error.accepts(&CType::Error));
    }

    #[test]
    fn test_logical_and_relational() {
        assert_eq!(CType::logical(CType::BOOL, CType::BOOL), CType::BOOL);
        assert_eq!(CType::logical(CType::BOOL, CType::INT), CType::Error);
        assert_eq!(CType::negated(CType::INT), CType::Error);
        assert_eq!(CType::relational(CType::INT, CType::CHAR), CType::BOOL);
        assert_eq!(CType::relational(CType::BOOL, CType::BOOL), CType::Error);
        assert_eq!(CType::relational(CType::FLOAT, CType::FLOAT), CType::Error);
    }

    #[test]
    fn test_display() {
        assert_eq!(CType::INT.to_string(), "int");
        assert_eq!(CType::STRING.to_string(), "char[]");
        assert_eq!(CType::Error.to_string(), "error");
        assert_eq!(CType::Array(PrimitiveType::Float).element(), CType::FLOAT);
    }
}
