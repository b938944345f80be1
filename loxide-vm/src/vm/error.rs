// loxide-vm - Bytecode compiler and virtual machine for the Loxide scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Runtime errors and the interpret result surface.

use std::fmt;

/// Runtime error during VM execution.
///
/// The display strings are the language's user-facing diagnostics; the
/// VM prints them followed by a stack trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Unary '-' on a non-number.
    OperandMustBeNumber,
    /// Arithmetic or comparison on non-numbers.
    OperandsMustBeNumbers,
    /// '+' on anything but two numbers or two strings.
    OperandsMustBeAddable,
    /// Read or write of a global that was never defined.
    UndefinedVariable(String),
    /// Call of a value that is not a function.
    NotCallable,
    /// Call with the wrong number of arguments.
    ArityMismatch { expected: u8, got: u8 },
    /// Too many nested call frames.
    StackOverflow,
    /// Value stack underflow; a malformed chunk, not a user error.
    StackUnderflow,
    /// Internal error.
    Internal(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::OperandMustBeNumber => write!(f, "Operand must be a number."),
            RuntimeError::OperandsMustBeNumbers => write!(f, "Operands must be numbers."),
            RuntimeError::OperandsMustBeAddable => {
                write!(f, "Operands must be two numbers or two strings.")
            }
            RuntimeError::UndefinedVariable(name) => {
                write!(f, "Undefined variable '{}'.", name)
            }
            RuntimeError::NotCallable => write!(f, "Can only call functions and classes."),
            RuntimeError::ArityMismatch { expected, got } => {
                write!(f, "Expected {} arguments but got {}", expected, got)
            }
            RuntimeError::StackOverflow => write!(f, "Stack overflow."),
            RuntimeError::StackUnderflow => write!(f, "Stack underflow"),
            RuntimeError::Internal(message) => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for VM operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// How an `interpret` call failed. Diagnostics have already been
/// written to stderr by the time this surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretError {
    /// The source did not compile.
    Compile,
    /// Execution aborted with a runtime error.
    Runtime,
}

impl fmt::Display for InterpretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpretError::Compile => write!(f, "compile error"),
            InterpretError::Runtime => write!(f, "runtime error"),
        }
    }
}

impl std::error::Error for InterpretError {}
