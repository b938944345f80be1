// loxide-vm - Common test utilities
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared test helpers for Loxide integration tests.
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Available Helpers
//!
//! - [`run`] - Interpret source in a fresh VM, returning captured stdout
//! - [`run_with_vm`] - Interpret source in an existing VM
//! - [`new_vm`] - Create a VM wired to a capture buffer
//!
//! # Macros
//!
//! - [`assert_prints!`] - Assert that a program writes the expected lines
//! - [`assert_compile_err!`] - Assert that a program fails to compile
//! - [`assert_runtime_err!`] - Assert that a program fails at runtime

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

pub use loxide_vm::{InterpretError, VM};

/// A `Write` target that several owners can read back.
#[derive(Clone, Default)]
pub struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl SharedOutput {
    /// Everything written so far, as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Create a VM whose `print` output lands in the returned buffer.
pub fn new_vm() -> (VM, SharedOutput) {
    let output = SharedOutput::default();
    let vm = VM::with_output(Box::new(output.clone()));
    (vm, output)
}

/// Interpret `source` in a fresh VM.
///
/// # Returns
///
/// Captured stdout on success, or the interpret error.
pub fn run(source: &str) -> Result<String, InterpretError> {
    let (mut vm, output) = new_vm();
    vm.interpret(source)?;
    Ok(output.contents())
}

/// Interpret `source` in an existing VM, returning what this call
/// appended to the capture buffer.
#[allow(dead_code)]
pub fn run_with_vm(
    vm: &mut VM,
    output: &SharedOutput,
    source: &str,
) -> Result<String, InterpretError> {
    let before = output.contents().len();
    vm.interpret(source)?;
    Ok(output.contents()[before..].to_string())
}

/// Assert that a program runs successfully and prints exactly the
/// given output (joined lines, trailing newline implied).
///
/// # Example
///
/// ```ignore
/// assert_prints!("print 1 + 2;", "3");
/// ```
#[macro_export]
macro_rules! assert_prints {
    ($source:expr, $($line:expr),+ $(,)?) => {
        let result = $crate::common::run($source);
        assert!(
            result.is_ok(),
            "Failed to interpret {:?}: {:?}",
            $source,
            result.err()
        );
        let expected = [$($line),+].join("\n") + "\n";
        assert_eq!(
            result.unwrap(),
            expected,
            "Output of {:?} did not match expected",
            $source
        );
    };
}

/// Assert that a program fails to compile.
#[macro_export]
macro_rules! assert_compile_err {
    ($source:expr) => {
        let result = $crate::common::run($source);
        assert_eq!(
            result.err(),
            Some($crate::common::InterpretError::Compile),
            "Expected compile error for {:?}",
            $source
        );
    };
}

/// Assert that a program compiles but fails at runtime.
#[macro_export]
macro_rules! assert_runtime_err {
    ($source:expr) => {
        let result = $crate::common::run($source);
        assert_eq!(
            result.err(),
            Some($crate::common::InterpretError::Runtime),
            "Expected runtime error for {:?}",
            $source
        );
    };
}
