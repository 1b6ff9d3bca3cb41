use thiserror::Error;

use crate::constants::{Address, Word};

/// Represents errors related to memory manipulations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The address is past the end of the memory
    #[error("address {address} out of bounds (memory has {size} cells)")]
    OutOfBounds { address: Address, size: usize },

    /// A cell used as an address holds a negative value
    #[error("negative address {0}")]
    Negative(Word),
}

/// Holds the cells of a machine.
///
/// The size is fixed once the memory is built: there is no way to grow it, and every access
/// outside of it is an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Memory {
    inner: Vec<Word>,
}

impl From<Vec<Word>> for Memory {
    fn from(inner: Vec<Word>) -> Self {
        Self { inner }
    }
}

impl From<&[Word]> for Memory {
    fn from(cells: &[Word]) -> Self {
        Self {
            inner: cells.to_vec(),
        }
    }
}

impl FromIterator<Word> for Memory {
    fn from_iter<T: IntoIterator<Item = Word>>(iter: T) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl Memory {
    /// Number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get the value of the cell at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn get(&self, address: Address) -> Result<Word, MemoryError> {
        self.inner
            .get(address)
            .copied()
            .ok_or(MemoryError::OutOfBounds {
                address,
                size: self.inner.len(),
            })
    }

    /// Get a mutable reference to the cell at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn get_mut(&mut self, address: Address) -> Result<&mut Word, MemoryError> {
        let size = self.inner.len();
        self.inner
            .get_mut(address)
            .ok_or(MemoryError::OutOfBounds { address, size })
    }

    /// Interpret a word as an address of this memory
    ///
    /// # Errors
    ///
    /// It fails if the word is negative or does not point inside the memory.
    pub fn address(&self, word: Word) -> Result<Address, MemoryError> {
        let address = Address::try_from(word).map_err(|_| MemoryError::Negative(word))?;
        if address < self.inner.len() {
            Ok(address)
        } else {
            Err(MemoryError::OutOfBounds {
                address,
                size: self.inner.len(),
            })
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Word] {
        &self.inner
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<Word> {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_test() {
        let memory = Memory::from(vec![1, 2, 3]);
        assert_eq!(memory.get(0), Ok(1));
        assert_eq!(memory.get(2), Ok(3));
        assert_eq!(
            memory.get(3),
            Err(MemoryError::OutOfBounds {
                address: 3,
                size: 3
            })
        );
    }

    #[test]
    fn get_mut_test() {
        let mut memory = Memory::from(vec![0; 4]);
        *memory.get_mut(3).unwrap() = 42;
        assert_eq!(memory.as_slice(), &[0, 0, 0, 42]);
        assert!(memory.get_mut(4).is_err());
    }

    #[test]
    fn address_test() {
        let memory = Memory::from(vec![0; 10]);
        assert_eq!(memory.address(0), Ok(0));
        assert_eq!(memory.address(9), Ok(9));
        assert_eq!(
            memory.address(10),
            Err(MemoryError::OutOfBounds {
                address: 10,
                size: 10
            })
        );
        assert_eq!(memory.address(-1), Err(MemoryError::Negative(-1)));
    }
}
