// Copyright 2017 The Postfx Developers.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Host-side storage of uniform values.
//!
//! Every constant buffer of an effect has a byte array backing it. Slot 0 belongs to the
//! global buffer holding loose uniforms, the remaining slots to uniform blocks in declaration
//! order. Values are packed with the Direct3D 10 rule that nothing straddles a 16 byte
//! register boundary.

use std::mem;

/// Host storage grows in steps of this many bytes.
pub const STORAGE_GRANULARITY: usize = 128;

/// Size in bytes of a single register.
pub const REGISTER_SIZE: usize = 16;

/// Round a byte size up to the next register boundary.
pub fn round_up(size: usize) -> usize {
    (size + REGISTER_SIZE - 1) / REGISTER_SIZE * REGISTER_SIZE
}

/// Element class of a uniform.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UniformClass {
    Bool,
    Int,
    Uint,
    Float,
    /// A uniform block, spanning a whole constant buffer.
    Struct,
}

/// Byte size of a value with `rows * cols` components, `elements` of them if it is an array.
///
/// Array elements after the first start on a register boundary.
pub fn value_size(rows: u32, cols: u32, elements: u32) -> usize {
    let element = (rows * cols.max(1)) as usize * 4;
    if elements > 1 {
        (elements as usize - 1) * round_up(element) + element
    } else {
        element
    }
}

/// Place a value of `size` bytes after `used` bytes, returning `(offset, used)`.
pub fn pack(used: usize, size: usize) -> (usize, usize) {
    let alignment = REGISTER_SIZE - used % REGISTER_SIZE;
    let total = if size > alignment && (alignment != REGISTER_SIZE || size <= REGISTER_SIZE) {
        used + size + alignment
    } else {
        used + size
    };
    (total - size, total)
}

#[derive(Clone, Debug, Default)]
struct Slot {
    bytes: Vec<u8>,
    used: usize,
}

/// Packed host copies of every constant buffer of an effect.
#[derive(Clone, Debug)]
pub struct UniformStore {
    slots: Vec<Slot>,
    dirty: bool,
}

impl Default for UniformStore {
    fn default() -> UniformStore {
        UniformStore::new()
    }
}

impl UniformStore {
    /// A store with the global slot allocated and empty.
    pub fn new() -> UniformStore {
        UniformStore {
            slots: vec![Slot::default()],
            dirty: false,
        }
    }

    /// Number of slots, the global one included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Add a slot for a uniform block and return its index.
    pub fn add_slot(&mut self) -> usize {
        self.slots.push(Slot::default());
        self.slots.len() - 1
    }

    /// Reserve room for a value in a slot and return its offset.
    ///
    /// The value starts out as `initial`, truncated or zero padded to `size`.
    pub fn place(&mut self, slot: usize, size: usize, initial: Option<&[u8]>) -> usize {
        let slot = &mut self.slots[slot];
        let (offset, total) = pack(slot.used, size);
        slot.used = total;
        while slot.bytes.len() < total {
            let len = slot.bytes.len();
            slot.bytes.resize(len + STORAGE_GRANULARITY, 0);
        }
        let target = &mut slot.bytes[offset .. offset + size];
        match initial {
            Some(data) => {
                let n = data.len().min(size);
                target[.. n].copy_from_slice(&data[.. n]);
                for b in &mut target[n ..] {
                    *b = 0;
                }
            }
            None => {
                for b in target.iter_mut() {
                    *b = 0;
                }
            }
        }
        offset
    }

    /// Bytes consumed by the packed values of a slot.
    pub fn used(&self, slot: usize) -> usize {
        self.slots[slot].used
    }

    /// Contents of a slot, padded to a register boundary.
    pub fn contents(&self, slot: usize) -> &[u8] {
        let slot = &self.slots[slot];
        &slot.bytes[.. round_up(slot.used)]
    }

    /// Whether any value changed since the last `take_dirty`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag, returning its previous value.
    pub fn take_dirty(&mut self) -> bool {
        mem::replace(&mut self.dirty, false)
    }

    /// Overwrite up to `size` bytes at `offset` of a slot. Extra input is ignored.
    /// The store only becomes dirty when the bytes actually change.
    pub fn write(&mut self, slot: usize, offset: usize, size: usize, data: &[u8]) {
        let n = data.len().min(size);
        let target = &mut self.slots[slot].bytes[offset .. offset + n];
        if target != &data[.. n] {
            target.copy_from_slice(&data[.. n]);
            self.dirty = true;
        }
    }

    /// Copy up to `size` bytes at `offset` of a slot into `out`, returning the count.
    pub fn read(&self, slot: usize, offset: usize, size: usize, out: &mut [u8]) -> usize {
        let n = out.len().min(size);
        out[.. n].copy_from_slice(&self.slots[slot].bytes[offset .. offset + n]);
        n
    }
}

/// Encode typed values as the 4 byte components of a uniform of the given class.
pub trait Component: Copy {
    /// Native-endian bytes when stored into a uniform of `class`.
    fn encode(self, class: UniformClass) -> [u8; 4];
    /// Value read back from a component of a uniform of `class`.
    fn decode(bytes: [u8; 4], class: UniformClass) -> Self;
}

impl Component for bool {
    fn encode(self, class: UniformClass) -> [u8; 4] {
        match class {
            UniformClass::Float => (self as u32 as f32).to_ne_bytes(),
            _ => (self as u32).to_ne_bytes(),
        }
    }
    fn decode(bytes: [u8; 4], class: UniformClass) -> bool {
        match class {
            UniformClass::Float => f32::from_ne_bytes(bytes) != 0.0,
            _ => u32::from_ne_bytes(bytes) != 0,
        }
    }
}

impl Component for i32 {
    fn encode(self, class: UniformClass) -> [u8; 4] {
        match class {
            UniformClass::Bool => ((self != 0) as u32).to_ne_bytes(),
            UniformClass::Float => (self as f32).to_ne_bytes(),
            _ => self.to_ne_bytes(),
        }
    }
    fn decode(bytes: [u8; 4], class: UniformClass) -> i32 {
        match class {
            UniformClass::Bool => (u32::from_ne_bytes(bytes) != 0) as i32,
            UniformClass::Float => f32::from_ne_bytes(bytes) as i32,
            _ => i32::from_ne_bytes(bytes),
        }
    }
}

impl Component for u32 {
    fn encode(self, class: UniformClass) -> [u8; 4] {
        match class {
            UniformClass::Bool => ((self != 0) as u32).to_ne_bytes(),
            UniformClass::Float => (self as f32).to_ne_bytes(),
            _ => self.to_ne_bytes(),
        }
    }
    fn decode(bytes: [u8; 4], class: UniformClass) -> u32 {
        match class {
            UniformClass::Bool => (u32::from_ne_bytes(bytes) != 0) as u32,
            UniformClass::Float => f32::from_ne_bytes(bytes) as u32,
            _ => u32::from_ne_bytes(bytes),
        }
    }
}

impl Component for f32 {
    fn encode(self, class: UniformClass) -> [u8; 4] {
        match class {
            UniformClass::Bool => ((self != 0.0) as u32).to_ne_bytes(),
            UniformClass::Int => (self as i32).to_ne_bytes(),
            UniformClass::Uint => (self as u32).to_ne_bytes(),
            _ => self.to_ne_bytes(),
        }
    }
    fn decode(bytes: [u8; 4], class: UniformClass) -> f32 {
        match class {
            UniformClass::Bool => (u32::from_ne_bytes(bytes) != 0) as u32 as f32,
            UniformClass::Int => i32::from_ne_bytes(bytes) as f32,
            UniformClass::Uint => u32::from_ne_bytes(bytes) as f32,
            _ => f32::from_ne_bytes(bytes),
        }
    }
}

/// Encode values for a uniform of `class`, at most `size / 4` of them.
pub fn encode<T: Component>(values: &[T], class: UniformClass, size: usize) -> Vec<u8> {
    values.iter()
          .take(size / 4)
          .flat_map(|v| v.encode(class).to_vec())
          .collect()
}

/// Decode the components in `bytes` into `out`, returning how many were written.
pub fn decode<T: Component>(bytes: &[u8], class: UniformClass, out: &mut [T]) -> usize {
    let mut count = 0;
    for (chunk, slot) in bytes.chunks(4).zip(out.iter_mut()) {
        if chunk.len() < 4 {
            break;
        }
        *slot = T::decode([chunk[0], chunk[1], chunk[2], chunk[3]], class);
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_share_a_register() {
        let mut store = UniformStore::new();
        assert_eq!(store.place(0, 4, None), 0);
        assert_eq!(store.place(0, 4, None), 4);
        assert_eq!(store.place(0, 8, None), 8);
        assert_eq!(store.used(0), 16);
    }

    #[test]
    fn values_do_not_straddle_registers() {
        let mut store = UniformStore::new();
        assert_eq!(store.place(0, 4, None), 0);
        assert_eq!(store.place(0, 16, None), 16);
        assert_eq!(store.place(0, 12, None), 32);
        assert_eq!(store.place(0, 8, None), 48);
        assert_eq!(store.used(0), 56);
        assert_eq!(store.contents(0).len(), 64);
    }

    #[test]
    fn large_values_stay_aligned() {
        let mut store = UniformStore::new();
        assert_eq!(store.place(0, 64, None), 0);
        assert_eq!(store.place(0, 4, None), 64);
        assert_eq!(store.place(0, 64, None), 80);
    }

    #[test]
    fn storage_grows_in_steps() {
        let mut store = UniformStore::new();
        store.place(0, 64, None);
        store.place(0, 64, None);
        store.place(0, 16, None);
        assert_eq!(store.used(0), 144);
        assert_eq!(store.slots[0].bytes.len(), 256);
    }

    #[test]
    fn initial_value_is_copied() {
        let mut store = UniformStore::new();
        let one = 1.0f32.to_ne_bytes();
        let offset = store.place(0, 8, Some(&one));
        let mut out = [0u8; 8];
        assert_eq!(store.read(0, offset, 8, &mut out), 8);
        assert_eq!(&out[.. 4], &one);
        assert_eq!(&out[4 ..], &[0; 4]);
    }

    #[test]
    fn writes_mark_dirty() {
        let mut store = UniformStore::new();
        let offset = store.place(0, 4, None);
        assert!(!store.is_dirty());
        store.write(0, offset, 4, &7u32.to_ne_bytes());
        assert!(store.take_dirty());
        assert!(!store.is_dirty());
        store.write(0, offset, 4, &7u32.to_ne_bytes());
        assert!(!store.is_dirty());
    }

    #[test]
    fn array_elements_start_on_registers() {
        assert_eq!(value_size(1, 1, 0), 4);
        assert_eq!(value_size(1, 1, 3), 36);
        assert_eq!(value_size(4, 1, 2), 32);
        assert_eq!(value_size(4, 4, 0), 64);
    }

    #[test]
    fn typed_conversion() {
        let bytes = encode(&[true, false], UniformClass::Float, 8);
        let mut out = [0.0f32; 2];
        assert_eq!(decode(&bytes, UniformClass::Float, &mut out), 2);
        assert_eq!(out, [1.0, 0.0]);

        let bytes = encode(&[2.75f32], UniformClass::Int, 4);
        let mut out = [0i32; 1];
        decode(&bytes, UniformClass::Int, &mut out);
        assert_eq!(out, [2]);

        let bytes = encode(&[1u32, 2, 3], UniformClass::Uint, 8);
        assert_eq!(bytes.len(), 8);
    }
}
