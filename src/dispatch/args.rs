//! Argument extraction helpers for handlers

use super::HandlerError;
use crate::osc::{TypeTag, TypedValue};

/// Read argument `index` as an int32
pub fn expect_i32(args: &[TypedValue], index: usize) -> Result<i32, HandlerError> {
    match args.get(index) {
        Some(TypedValue::Int32(n)) => Ok(*n),
        Some(other) => Err(HandlerError::WrongType {
            index,
            expected: TypeTag::Int32,
            actual: other.tag(),
        }),
        None => Err(HandlerError::MissingArgument {
            index,
            expected: TypeTag::Int32,
        }),
    }
}

/// Read argument `index` as a string
pub fn expect_str(args: &[TypedValue], index: usize) -> Result<&str, HandlerError> {
    match args.get(index) {
        Some(TypedValue::String(s)) => Ok(s),
        Some(other) => Err(HandlerError::WrongType {
            index,
            expected: TypeTag::String,
            actual: other.tag(),
        }),
        None => Err(HandlerError::MissingArgument {
            index,
            expected: TypeTag::String,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_helpers() {
        let args = vec![TypedValue::Int32(2), TypedValue::from("Bonjour")];

        assert_eq!(expect_i32(&args, 0), Ok(2));
        assert_eq!(expect_str(&args, 1), Ok("Bonjour"));
        assert_eq!(
            expect_i32(&args, 1),
            Err(HandlerError::WrongType {
                index: 1,
                expected: TypeTag::Int32,
                actual: TypeTag::String,
            })
        );
        assert_eq!(
            expect_str(&args, 2),
            Err(HandlerError::MissingArgument {
                index: 2,
                expected: TypeTag::String,
            })
        );
    }
}
