// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Symbol table for constants visible to constant expressions.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum SymbolTableResult {
    Ok,
    Duplicate,
}

#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    entries: HashMap<String, i64>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `name`. Symbol names are case-sensitive.
    pub fn add(&mut self, name: &str, value: i64) -> SymbolTableResult {
        if self.entries.contains_key(name) {
            return SymbolTableResult::Duplicate;
        }
        self.entries.insert(name.to_string(), value);
        SymbolTableResult::Ok
    }

    #[must_use]
    pub fn entry(&self, name: &str) -> Option<i64> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{SymbolTable, SymbolTableResult};

    #[test]
    fn add_and_lookup() {
        let mut symbols = SymbolTable::new();
        assert_eq!(symbols.add("WIDTH", 40), SymbolTableResult::Ok);
        assert_eq!(symbols.entry("WIDTH"), Some(40));
        assert_eq!(symbols.entry("width"), None);
    }

    #[test]
    fn duplicate_is_rejected() {
        let mut symbols = SymbolTable::new();
        assert_eq!(symbols.add("X", 1), SymbolTableResult::Ok);
        assert_eq!(symbols.add("X", 2), SymbolTableResult::Duplicate);
        assert_eq!(symbols.entry("X"), Some(1));
        assert_eq!(symbols.len(), 1);
    }
}
