//! Managed runtime object layouts.
//!
//! The game runs on .NET, so most interesting state lives in managed objects:
//! strings, arrays, `List<T>` and `Dictionary<K, V>`. Their field offsets only
//! depend on the pointer width of the process, which is why a single
//! `ManagedLayout` per bitness is enough to decode them.

use encoding_rs::UTF_16LE;

use super::ReadMemory;
use crate::error::{Error, Result};

/// Longest string (in UTF-16 units) accepted by `read_sharp_string`.
pub const MAX_STRING_LENGTH: i32 = 4096;

/// Longest list accepted by the list helpers.
pub const MAX_LIST_LENGTH: i32 = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedLayout {
    pub pointer_size: usize,
    pub string_length: u64,
    pub string_chars: u64,
    pub array_length: u64,
    pub array_data: u64,
    pub list_items: u64,
    pub list_size: u64,
    pub dictionary_entries: u64,
    pub dictionary_count: u64,
    pub dictionary_stride: u64,
}

impl ManagedLayout {
    /// 32-bit runtime (stable client).
    pub const X86: ManagedLayout = ManagedLayout {
        pointer_size: 4,
        string_length: 0x4,
        string_chars: 0x8,
        array_length: 0x4,
        array_data: 0x8,
        list_items: 0x4,
        list_size: 0xC,
        dictionary_entries: 0x8,
        dictionary_count: 0x1C,
        dictionary_stride: 0x10,
    };

    /// 64-bit runtime (lazer client).
    pub const X64: ManagedLayout = ManagedLayout {
        pointer_size: 8,
        string_length: 0x8,
        string_chars: 0xC,
        array_length: 0x8,
        array_data: 0x10,
        list_items: 0x8,
        list_size: 0x10,
        dictionary_entries: 0x10,
        dictionary_count: 0x38,
        dictionary_stride: 0x18,
    };
}

/// A memory reader bound to a managed layout.
///
/// Wraps any `ReadMemory` source and adds pointer-width aware reads plus
/// decoders for the runtime's string and collection types.
#[derive(Debug)]
pub struct ManagedReader<R> {
    inner: R,
    layout: ManagedLayout,
}

impl<R: ReadMemory> ManagedReader<R> {
    pub fn new(inner: R, layout: ManagedLayout) -> Self {
        Self { inner, layout }
    }

    pub fn x86(inner: R) -> Self {
        Self::new(inner, ManagedLayout::X86)
    }

    pub fn x64(inner: R) -> Self {
        Self::new(inner, ManagedLayout::X64)
    }

    pub fn layout(&self) -> &ManagedLayout {
        &self.layout
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Read a pointer-sized value.
    pub fn read_ptr(&self, address: u64) -> Result<u64> {
        if self.layout.pointer_size == 8 {
            self.inner.read_u64(address)
        } else {
            self.inner.read_u32(address).map(u64::from)
        }
    }

    /// Follow a static slot: the pattern resolves to an instruction operand that
    /// holds the address of the slot, and the slot holds the object.
    pub fn read_pointer(&self, address: u64) -> Result<u64> {
        let slot = self.read_ptr(address)?;
        self.read_ptr(slot)
    }

    /// Decode a managed string given the object pointer.
    ///
    /// A null pointer decodes to an empty string. Lengths outside
    /// `0..=MAX_STRING_LENGTH` are treated as garbage and decode to an empty string.
    pub fn read_sharp_string(&self, pointer: u64) -> Result<String> {
        if pointer == 0 {
            return Ok(String::new());
        }

        let length = self.inner.read_i32(field(pointer, self.layout.string_length)?)?;
        if !(0..=MAX_STRING_LENGTH).contains(&length) {
            return Ok(String::new());
        }
        if length == 0 {
            return Ok(String::new());
        }

        let bytes = self
            .inner
            .read_bytes(field(pointer, self.layout.string_chars)?, length as usize * 2)?;
        let (text, _, had_errors) = UTF_16LE.decode(&bytes);
        if had_errors {
            return Err(Error::EncodingError(format!(
                "Invalid UTF-16 string at {:#x}",
                pointer
            )));
        }
        Ok(text.into_owned())
    }

    /// Decode the string whose pointer is stored at `address`.
    pub fn read_string_at(&self, address: u64) -> Result<String> {
        let pointer = self.read_ptr(address)?;
        self.read_sharp_string(pointer)
    }

    /// Element count of a managed array.
    pub fn read_array_length(&self, array: u64) -> Result<i32> {
        self.inner.read_i32(field(array, self.layout.array_length)?)
    }

    /// Address of element `index` in an array of `stride`-sized elements.
    pub fn array_element(&self, array: u64, index: usize, stride: u64) -> Result<u64> {
        let data = field(array, self.layout.array_data)?;
        let offset = stride.checked_mul(index as u64).ok_or_else(|| Error::MemoryReadFailed {
            address: array,
            message: format!("Element {} overflows the address space", index),
        })?;
        field(data, offset)
    }

    /// Backing array and size of a `List<T>`.
    pub fn read_list_header(&self, list: u64) -> Result<(u64, i32)> {
        let items = self.read_ptr(field(list, self.layout.list_items)?)?;
        let size = self.inner.read_i32(field(list, self.layout.list_size)?)?;
        Ok((items, size))
    }

    /// Element pointers of a `List<T>` where `T` is a reference type.
    pub fn read_list_pointers(&self, list: u64) -> Result<Vec<u64>> {
        let (items, size) = self.read_list_header(list)?;
        if items == 0 || size <= 0 {
            return Ok(Vec::new());
        }
        let size = checked_len(list, size)?;

        let stride = self.layout.pointer_size;
        let raw = self
            .inner
            .read_bytes(self.array_element(items, 0, stride as u64)?, size * stride)?;
        Ok(raw
            .chunks_exact(stride)
            .map(|chunk| {
                if stride == 8 {
                    u64::from_le_bytes([
                        chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6],
                        chunk[7],
                    ])
                } else {
                    u64::from(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                }
            })
            .collect())
    }

    /// Values of a `List<int>`, starting at `from`.
    pub fn read_i32_list(&self, list: u64, from: usize) -> Result<Vec<i32>> {
        let (items, size) = self.read_list_header(list)?;
        if items == 0 || size <= 0 {
            return Ok(Vec::new());
        }
        let size = checked_len(list, size)?;
        if from >= size {
            return Ok(Vec::new());
        }

        let raw = self
            .inner
            .read_bytes(self.array_element(items, from, 4)?, (size - from) * 4)?;
        Ok(raw
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    /// Values of a `float[]`.
    pub fn read_f32_array(&self, array: u64) -> Result<Vec<f32>> {
        let length = self.read_array_length(array)?;
        if length <= 0 {
            return Ok(Vec::new());
        }
        let length = checked_len(array, length)?;

        let raw = self
            .inner
            .read_bytes(self.array_element(array, 0, 4)?, length * 4)?;
        Ok(raw
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    /// Entry addresses of a `Dictionary<K, V>`.
    pub fn read_dictionary_entries(&self, dictionary: u64) -> Result<Vec<u64>> {
        let entries = self.read_ptr(field(dictionary, self.layout.dictionary_entries)?)?;
        let count = self
            .inner
            .read_i32(field(dictionary, self.layout.dictionary_count)?)?;
        if entries == 0 || count <= 0 {
            return Ok(Vec::new());
        }
        let count = checked_len(dictionary, count)?;

        (0..count)
            .map(|i| self.array_element(entries, i, self.layout.dictionary_stride))
            .collect()
    }
}

impl<R: ReadMemory> ReadMemory for ManagedReader<R> {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.inner.read_bytes(address, size)
    }
}

/// `object + offset`, failing on pointers near the top of the address space.
fn field(object: u64, offset: u64) -> Result<u64> {
    object.checked_add(offset).ok_or_else(|| Error::MemoryReadFailed {
        address: object,
        message: format!("Field offset {:#x} overflows the address space", offset),
    })
}

fn checked_len(address: u64, length: i32) -> Result<usize> {
    if length > MAX_LIST_LENGTH {
        return Err(Error::MemoryReadFailed {
            address,
            message: format!("Implausible collection length {}", length),
        });
    }
    Ok(length as usize)
}
