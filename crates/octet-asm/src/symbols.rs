//! Label table built during pass one.

use std::collections::HashMap;

use crate::errors::{AssembleError, AssembleErrorKind};

/// A declared label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// Byte offset of the next emitted instruction.
    pub offset: usize,
    /// Source line of the declaration.
    pub defined_at: usize,
}

/// Label names mapped to their declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name` at `offset`.
    ///
    /// # Errors
    ///
    /// [`AssembleErrorKind::DuplicateLabel`] if `name` is already declared.
    pub fn define(&mut self, name: &str, offset: usize, line: usize) -> Result<(), AssembleError> {
        if let Some(existing) = self.symbols.get(name) {
            return Err(AssembleError::new(
                line,
                AssembleErrorKind::DuplicateLabel {
                    name: name.to_string(),
                    first_line: existing.defined_at,
                },
            ));
        }
        self.symbols.insert(
            name.to_string(),
            Symbol {
                offset,
                defined_at: line,
            },
        );
        Ok(())
    }

    /// Looks up a declaration.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true if no label is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Labels sorted by offset, then name.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, Symbol)> {
        let mut entries: Vec<_> = self
            .symbols
            .iter()
            .map(|(name, symbol)| (name.as_str(), *symbol))
            .collect();
        entries.sort_by(|a, b| a.1.offset.cmp(&b.1.offset).then(a.0.cmp(b.0)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::SymbolTable;
    use crate::errors::AssembleErrorKind;

    #[test]
    fn duplicate_definition_is_rejected() {
        let mut table = SymbolTable::new();
        table.define("start", 0, 1).expect("first definition");

        let err = table.define("start", 4, 6).expect_err("second definition");

        assert_eq!(err.line, 6);
        assert_eq!(
            err.kind,
            AssembleErrorKind::DuplicateLabel {
                name: "start".to_string(),
                first_line: 1
            }
        );
        assert_eq!(table.get("start").map(|s| s.offset), Some(0));
    }

    #[test]
    fn sorted_orders_by_offset() {
        let mut table = SymbolTable::new();
        table.define("b", 8, 3).expect("define");
        table.define("a", 2, 1).expect("define");
        table.define("c", 2, 2).expect("define");

        let names: Vec<_> = table.sorted().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "c", "b"]);
    }
}
