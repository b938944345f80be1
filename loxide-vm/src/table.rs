// loxide-vm - Bytecode compiler and virtual machine for the Loxide scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Open-addressed hash table keyed by interned strings.
//!
//! Linear probing with tombstones, growing at a 0.75 load factor.
//! Keys compare by identity (`ObjRef`); interning guarantees that is
//! equivalent to content equality. The one content-comparing operation
//! is [`Table::find_string`], which the intern table itself uses to
//! decide whether a string already exists.
//!
//! Because keys live in the heap arena, operations that need a key's
//! hash or characters borrow the arena slice.

use crate::object::{Obj, ObjRef};
use crate::value::Value;

const MAX_LOAD_NUMERATOR: usize = 3;
const MAX_LOAD_DENOMINATOR: usize = 4;

/// One slot: a live entry, an empty slot, or a tombstone.
///
/// Empty is `(None, Nil)`; a tombstone is `(None, Bool(true))` and
/// keeps probe sequences intact after a deletion.
#[derive(Debug, Clone, Copy)]
struct Entry {
    key: Option<ObjRef>,
    value: Value,
}

impl Entry {
    const EMPTY: Entry = Entry {
        key: None,
        value: Value::Nil,
    };

    fn is_tombstone(&self) -> bool {
        self.key.is_none() && !matches!(self.value, Value::Nil)
    }
}

/// Hash table mapping interned strings to values.
#[derive(Debug, Default)]
pub struct Table {
    /// Live entries plus tombstones.
    count: usize,
    entries: Vec<Entry>,
}

fn key_hash(objects: &[Obj], key: ObjRef) -> u32 {
    match &objects[key.index()] {
        Obj::String(s) => s.hash,
        other => unreachable!("table key must be a string, found {:?}", other),
    }
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            count: 0,
            entries: Vec::new(),
        }
    }

    fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Probe for `key`. Returns the slot holding it, or the slot an
    /// insertion should use (the first tombstone seen, else the empty
    /// slot that ended the probe).
    fn find_entry(entries: &[Entry], objects: &[Obj], key: ObjRef) -> usize {
        let capacity = entries.len();
        let mut index = key_hash(objects, key) as usize % capacity;
        let mut tombstone: Option<usize> = None;

        loop {
            let entry = &entries[index];
            match entry.key {
                None => {
                    if entry.is_tombstone() {
                        if tombstone.is_none() {
                            tombstone = Some(index);
                        }
                    } else {
                        return tombstone.unwrap_or(index);
                    }
                }
                Some(existing) if existing == key => return index,
                Some(_) => {}
            }
            index = (index + 1) % capacity;
        }
    }

    fn adjust_capacity(&mut self, objects: &[Obj], capacity: usize) {
        let mut entries = vec![Entry::EMPTY; capacity];

        // Rebuild from live entries only; tombstones are discarded and
        // the count re-derived.
        self.count = 0;
        for entry in &self.entries {
            if let Some(key) = entry.key {
                let dest = Self::find_entry(&entries, objects, key);
                entries[dest] = *entry;
                self.count += 1;
            }
        }

        self.entries = entries;
    }

    /// Insert or overwrite. Returns `true` when the key was not
    /// already present.
    pub fn set(&mut self, objects: &[Obj], key: ObjRef, value: Value) -> bool {
        if (self.count + 1) * MAX_LOAD_DENOMINATOR > self.capacity() * MAX_LOAD_NUMERATOR {
            let capacity = if self.capacity() < 8 {
                8
            } else {
                self.capacity() * 2
            };
            self.adjust_capacity(objects, capacity);
        }

        let index = Self::find_entry(&self.entries, objects, key);
        let entry = &mut self.entries[index];
        let is_new_key = entry.key.is_none();
        // A reused tombstone is already counted.
        if is_new_key && !entry.is_tombstone() {
            self.count += 1;
        }

        entry.key = Some(key);
        entry.value = value;
        is_new_key
    }

    /// Overwrite an existing entry. Returns `false`, without
    /// inserting, when the key is not present.
    pub fn update(&mut self, objects: &[Obj], key: ObjRef, value: Value) -> bool {
        if self.count == 0 {
            return false;
        }
        let index = Self::find_entry(&self.entries, objects, key);
        let entry = &mut self.entries[index];
        if entry.key.is_none() {
            return false;
        }
        entry.value = value;
        true
    }

    /// Look up a key.
    pub fn get(&self, objects: &[Obj], key: ObjRef) -> Option<Value> {
        if self.count == 0 {
            return None;
        }
        let index = Self::find_entry(&self.entries, objects, key);
        let entry = &self.entries[index];
        entry.key.map(|_| entry.value)
    }

    /// Remove a key, leaving a tombstone. Returns `false` when the key
    /// was not present.
    pub fn delete(&mut self, objects: &[Obj], key: ObjRef) -> bool {
        if self.count == 0 {
            return false;
        }
        let index = Self::find_entry(&self.entries, objects, key);
        let entry = &mut self.entries[index];
        if entry.key.is_none() {
            return false;
        }

        entry.key = None;
        entry.value = Value::Bool(true);
        true
    }

    /// Probe for a string by contents rather than identity: same hash,
    /// same length, same bytes. This is how interning finds an
    /// existing string before one exists to compare identities with.
    pub fn find_string(&self, objects: &[Obj], chars: &str, hash: u32) -> Option<ObjRef> {
        if self.count == 0 {
            return None;
        }

        let capacity = self.capacity();
        let mut index = hash as usize % capacity;
        loop {
            let entry = &self.entries[index];
            match entry.key {
                None => {
                    // A truly empty slot ends the probe; tombstones do not.
                    if !entry.is_tombstone() {
                        return None;
                    }
                }
                Some(key) => {
                    if let Obj::String(s) = &objects[key.index()] {
                        if s.hash == hash && s.chars == chars {
                            return Some(key);
                        }
                    }
                }
            }
            index = (index + 1) % capacity;
        }
    }
}
