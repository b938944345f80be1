// loxide-vm - Bytecode compiler and virtual machine for the Loxide scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The runtime object system.
//!
//! All heap objects live in a single owning arena ([`Heap`]) and are
//! addressed by stable [`ObjRef`] indices; values carry indices, never
//! pointers. Objects are dropped wholesale when the heap is dropped.
//! Every string created through the heap's string APIs is interned, so
//! two strings with equal contents share one `ObjRef`.

use std::rc::Rc;

use crate::chunk::Chunk;
use crate::table::Table;
use crate::value::Value;
use crate::vm::VM;

/// Index of an object in the [`Heap`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjRef(u32);

impl ObjRef {
    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A heap-allocated object.
#[derive(Debug)]
pub enum Obj {
    String(ObjString),
    Function(ObjFunction),
    Native(ObjNative),
    Closure(ObjClosure),
    Upvalue(ObjUpvalue),
}

/// An interned immutable string with its precomputed FNV-1a hash.
#[derive(Debug)]
pub struct ObjString {
    pub chars: String,
    pub hash: u32,
}

/// A compiled function prototype.
#[derive(Debug)]
pub struct ObjFunction {
    /// Number of declared parameters.
    pub arity: u8,
    /// Number of variables captured from enclosing functions.
    pub upvalue_count: usize,
    /// The function's bytecode. Shared with call frames; never mutated
    /// after compilation.
    pub chunk: Rc<Chunk>,
    /// Function name, or `None` for the top-level script.
    pub name: Option<ObjRef>,
}

/// A native function implemented in Rust and installed as a global.
pub type NativeFn = fn(&mut VM, &[Value]) -> Value;

#[derive(Debug)]
pub struct ObjNative {
    pub function: NativeFn,
}

/// A function together with the upvalues it captured.
#[derive(Debug)]
pub struct ObjClosure {
    pub function: ObjRef,
    pub upvalues: Vec<ObjRef>,
}

/// An upvalue: the indirection that lets a closure outlive the stack
/// slot it captured.
///
/// While the variable is still on the value stack the upvalue is
/// `Open` and holds the slot index; when the slot is about to leave
/// the stack the VM closes it, copying the value into the upvalue's
/// own storage.
#[derive(Debug)]
pub enum ObjUpvalue {
    Open(usize),
    Closed(Value),
}

/// FNV-1a over the string's bytes (32-bit).
pub fn hash_string(chars: &str) -> u32 {
    let mut hash = 2166136261u32;
    for byte in chars.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

/// The owning arena for all runtime objects, plus the string intern
/// table.
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Obj>,
    strings: Table,
}

impl Heap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            strings: Table::new(),
        }
    }

    /// The raw arena, for table probes that compare key contents.
    pub fn objects(&self) -> &[Obj] {
        &self.objects
    }

    /// Add an object to the arena and return its index.
    pub fn alloc(&mut self, obj: Obj) -> ObjRef {
        let index = self.objects.len();
        self.objects.push(obj);
        ObjRef(index as u32)
    }

    /// Intern a string, copying the characters.
    ///
    /// Returns the existing object when an equal string has been
    /// interned before.
    pub fn intern(&mut self, chars: &str) -> ObjRef {
        let hash = hash_string(chars);
        if let Some(existing) = self.strings.find_string(&self.objects, chars, hash) {
            return existing;
        }
        self.intern_new(chars.to_string(), hash)
    }

    /// Intern a string, taking ownership of an already-built buffer.
    ///
    /// Used by concatenation, which has just allocated the buffer; if
    /// an equal string exists the buffer is discarded.
    pub fn take_string(&mut self, chars: String) -> ObjRef {
        let hash = hash_string(&chars);
        if let Some(existing) = self.strings.find_string(&self.objects, &chars, hash) {
            return existing;
        }
        self.intern_new(chars, hash)
    }

    fn intern_new(&mut self, chars: String, hash: u32) -> ObjRef {
        let r = self.alloc(Obj::String(ObjString { chars, hash }));
        self.strings.set(&self.objects, r, Value::Nil);
        r
    }

    /// Add a function object.
    pub fn alloc_function(&mut self, function: ObjFunction) -> ObjRef {
        self.alloc(Obj::Function(function))
    }

    /// Add a native function object.
    pub fn alloc_native(&mut self, function: NativeFn) -> ObjRef {
        self.alloc(Obj::Native(ObjNative { function }))
    }

    /// Add a closure over the given function.
    pub fn alloc_closure(&mut self, function: ObjRef, upvalues: Vec<ObjRef>) -> ObjRef {
        self.alloc(Obj::Closure(ObjClosure { function, upvalues }))
    }

    /// Add an open upvalue pointing at a stack slot.
    pub fn alloc_upvalue(&mut self, slot: usize) -> ObjRef {
        self.alloc(Obj::Upvalue(ObjUpvalue::Open(slot)))
    }

    /// Borrow any object.
    pub fn get(&self, r: ObjRef) -> &Obj {
        &self.objects[r.index()]
    }

    /// Borrow an object known to be a string.
    pub fn string(&self, r: ObjRef) -> &ObjString {
        match &self.objects[r.index()] {
            Obj::String(s) => s,
            other => unreachable!("expected string object, found {:?}", other),
        }
    }

    /// Borrow an object known to be a function.
    pub fn function(&self, r: ObjRef) -> &ObjFunction {
        match &self.objects[r.index()] {
            Obj::Function(f) => f,
            other => unreachable!("expected function object, found {:?}", other),
        }
    }

    /// Borrow an object known to be a closure.
    pub fn closure(&self, r: ObjRef) -> &ObjClosure {
        match &self.objects[r.index()] {
            Obj::Closure(c) => c,
            other => unreachable!("expected closure object, found {:?}", other),
        }
    }

    /// Borrow an object known to be an upvalue.
    pub fn upvalue(&self, r: ObjRef) -> &ObjUpvalue {
        match &self.objects[r.index()] {
            Obj::Upvalue(u) => u,
            other => unreachable!("expected upvalue object, found {:?}", other),
        }
    }

    /// Mutably borrow an object known to be an upvalue.
    pub fn upvalue_mut(&mut self, r: ObjRef) -> &mut ObjUpvalue {
        match &mut self.objects[r.index()] {
            Obj::Upvalue(u) => u,
            other => unreachable!("expected upvalue object, found {:?}", other),
        }
    }
}
