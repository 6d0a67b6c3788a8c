use std::fs::File;
use std::io::{self, Read};
use std::ops::{Index, IndexMut};
use std::path::Path;

/// Errors from loading program text into memory.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("error reading program: {0}")]
    Io(#[from] io::Error),
    #[error("invalid integer {token:?} at position {index}")]
    InvalidInteger { index: usize, token: String },
    #[error("program is empty")]
    Empty,
}

/// Largest number of words memory may grow to.
pub const MAX_ADDRESS: usize = 1 << 24;

/// A write beyond `MAX_ADDRESS`, or one the allocator refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("write to address {0} exceeds memory limit")]
pub struct AddressError(pub usize);

/// Intcode memory. Grows with zeros on writes past the end, reads past the
/// end yield 0 without growing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memory(Vec<i64>);

static ZERO: i64 = 0;

impl Memory {
    pub fn new() -> Memory {
        Memory(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, addr: usize) -> i64 {
        self.0.get(addr).copied().unwrap_or(0)
    }

    /// Writes `value`, growing memory with zeros up to `addr`. Leaves
    /// memory untouched on failure.
    pub fn set(&mut self, addr: usize, value: i64) -> Result<(), AddressError> {
        if addr >= self.0.len() {
            if addr >= MAX_ADDRESS {
                return Err(AddressError(addr));
            }
            self.0.try_reserve(addr + 1 - self.0.len()).map_err(|_| AddressError(addr))?;
            trace!("Growing memory from {} to {} words", self.0.len(), addr + 1);
            self.0.resize(addr + 1, 0);
        }
        self.0[addr] = value;
        Ok(())
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<i64> {
        self.0
    }

    pub fn pointer(&self, addr: usize) -> Pointer<'_> {
        Pointer { mem: self, addr }
    }
}

impl From<&[i64]> for Memory {
    fn from(words: &[i64]) -> Memory {
        Memory(words.to_vec())
    }
}

impl From<Vec<i64>> for Memory {
    fn from(words: Vec<i64>) -> Memory {
        Memory(words)
    }
}

impl Index<usize> for Memory {
    type Output = i64;

    fn index(&self, addr: usize) -> &i64 {
        self.0.get(addr).unwrap_or(&ZERO)
    }
}

impl IndexMut<usize> for Memory {
    fn index_mut(&mut self, addr: usize) -> &mut i64 {
        if addr >= MAX_ADDRESS {
            panic!("Write memory access out of bounds! ({} >= {})", addr, MAX_ADDRESS);
        }
        if addr >= self.0.len() {
            trace!("Growing memory from {} to {} words", self.0.len(), addr + 1);
            self.0.resize(addr + 1, 0);
        }
        &mut self.0[addr]
    }
}

/// Fetch cursor used while decoding an instruction.
pub struct Pointer<'a> {
    mem: &'a Memory,
    addr: usize,
}

impl<'a> Pointer<'a> {
    pub fn addr(&self) -> usize {
        self.addr
    }

    pub fn next(&mut self) -> i64 {
        let word = self.mem.get(self.addr);
        self.addr += 1;
        word
    }
}

impl Memory {
    /// Parses comma-separated program text, e.g. `1,0,0,3,99`.
    pub fn parse(text: &str) -> Result<Memory, ParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseError::Empty);
        }
        text.split(',')
            .enumerate()
            .map(|(index, token)| {
                let token = token.trim();
                token.parse::<i64>().map_err(|_| ParseError::InvalidInteger {
                    index,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Memory)
    }

    pub fn load<R: Read>(mut reader: R) -> Result<Memory, ParseError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Memory::parse(&text)
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Memory, ParseError> {
        Memory::load(File::open(path)?)
    }
}
