use crate::core::elements::PeriodicTable;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Either element numbers or element symbols must be supplied")]
    Missing,
    #[error("Element numbers and element symbols are mutually exclusive; supply only one")]
    Ambiguous,
    #[error("Element selection must contain at least one element")]
    Empty,
    #[error("Unknown element symbol: '{0}'")]
    UnknownSymbol(String),
    #[error("Unknown atomic number: {0}")]
    UnknownNumber(u8),
    #[error("Element '{0}' is listed more than once")]
    Duplicate(&'static str),
}

/// The ordered set of elements whose atom counts define a composition.
///
/// Numbers and symbols are always kept in sync; whichever the caller supplied,
/// the other is derived from the [`PeriodicTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSelection {
    numbers: Vec<u8>,
    symbols: Vec<&'static str>,
}

impl ElementSelection {
    pub fn from_numbers(numbers: &[u8], table: &PeriodicTable) -> Result<Self, SelectionError> {
        let symbols = numbers
            .iter()
            .map(|&z| table.symbol(z).ok_or(SelectionError::UnknownNumber(z)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::checked(numbers.to_vec(), symbols)
    }

    pub fn from_symbols<S: AsRef<str>>(
        symbols: &[S],
        table: &PeriodicTable,
    ) -> Result<Self, SelectionError> {
        let numbers = symbols
            .iter()
            .map(|s| {
                table
                    .number(s.as_ref())
                    .ok_or_else(|| SelectionError::UnknownSymbol(s.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_numbers(&numbers, table)
    }

    /// Builds a selection from exactly one of the two selectors.
    pub fn resolve<S: AsRef<str>>(
        numbers: Option<&[u8]>,
        symbols: Option<&[S]>,
        table: &PeriodicTable,
    ) -> Result<Self, SelectionError> {
        match (numbers, symbols) {
            (Some(numbers), None) => Self::from_numbers(numbers, table),
            (None, Some(symbols)) => Self::from_symbols(symbols, table),
            (Some(_), Some(_)) => Err(SelectionError::Ambiguous),
            (None, None) => Err(SelectionError::Missing),
        }
    }

    fn checked(numbers: Vec<u8>, symbols: Vec<&'static str>) -> Result<Self, SelectionError> {
        if numbers.is_empty() {
            return Err(SelectionError::Empty);
        }
        for (i, z) in numbers.iter().enumerate() {
            if numbers[..i].contains(z) {
                return Err(SelectionError::Duplicate(symbols[i]));
            }
        }
        Ok(Self { numbers, symbols })
    }

    pub fn numbers(&self) -> &[u8] {
        &self.numbers
    }

    pub fn symbols(&self) -> &[&'static str] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Binary systems (exactly two tracked elements) get pivoted report tables.
    pub fn is_binary(&self) -> bool {
        self.numbers.len() == 2
    }

    /// Counts the atoms of each tracked element, in selection order.
    ///
    /// Atoms of untracked elements are ignored.
    pub fn composition_of(&self, atomic_numbers: &[u8]) -> CompositionKey {
        CompositionKey(
            self.numbers
                .iter()
                .map(|z| atomic_numbers.iter().filter(|&&a| a == *z).count())
                .collect(),
        )
    }
}

/// Per-element atom counts identifying one composition group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositionKey(Vec<usize>);

impl CompositionKey {
    pub fn new(counts: Vec<usize>) -> Self {
        Self(counts)
    }

    pub fn counts(&self) -> &[usize] {
        &self.0
    }

    /// Chemical formula in selection order, e.g. `C6H12`. Zero counts are omitted.
    pub fn formula(&self, selection: &ElementSelection) -> String {
        selection
            .symbols()
            .iter()
            .zip(&self.0)
            .filter(|(_, n)| **n > 0)
            .map(|(sym, n)| format!("{sym}{n}"))
            .collect()
    }
}

impl fmt::Display for CompositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, n) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{n}")?;
        }
        write!(f, ")")
    }
}
