//! The open-addressed hash table from spec §4.3.
//!
//! Serves two roles at the type level:
//! - `Vm::globals: Table<Value>` — the globals map.
//! - `Heap`'s intern set, `Table<()>` — a set keyed by string content.
//!
//! clox encodes "truly empty" vs. "tombstone" by overloading the `NIL`/
//! `TRUE` sentinel values of a key-less entry. That trick doesn't translate
//! to a generic `Table<V>`, so the two empty states are a real `Slot<V>`
//! enum instead — same probing algorithm, same tombstone-reuse behavior,
//! without relying on a stand-in value living in the the `V` type.

use crate::object::StringId;

const MAX_LOAD: f64 = 0.75;

enum Slot<V> {
   Empty,
   Tombstone,
   Occupied(StringId, u32, V),
}

/// An open-addressed, linearly-probed hash table keyed by interned string
/// handles.
pub struct Table<V> {
   entries: Vec<Slot<V>>,
   /// Occupied *or* tombstoned slots — tracked for load-factor purposes,
   /// exactly as clox's `Table.count` is (see spec §4.3).
   count: usize,
}

impl<V> Table<V> {
   pub fn new() -> Self {
      Self {
         entries: Vec::new(),
         count: 0,
      }
   }

   pub fn capacity(&self) -> usize {
      self.entries.len()
   }

   pub fn get(&self, key: StringId, hash: u32) -> Option<&V> {
      if self.count == 0 {
         return None;
      }
      match &self.entries[probe(&self.entries, hash, |k| *k == key)] {
         Slot::Occupied(_, _, value) => Some(value),
         _ => None,
      }
   }

   /// Inserts or overwrites `key`. Returns `true` iff `key` was not already
   /// present (spec §4.3: "`set`... Returns `true` iff the key was not
   /// already present").
   pub fn set(&mut self, key: StringId, hash: u32, value: V) -> bool {
      if self.capacity() == 0 || (self.count + 1) as f64 > self.capacity() as f64 * MAX_LOAD {
         let new_capacity = if self.capacity() == 0 { 8 } else { self.capacity() * 2 };
         self.adjust_capacity(new_capacity);
      }

      let idx = probe(&self.entries, hash, |k| *k == key);
      let is_new_key = !matches!(self.entries[idx], Slot::Occupied(..));
      if matches!(self.entries[idx], Slot::Empty) {
         self.count += 1;
      }
      self.entries[idx] = Slot::Occupied(key, hash, value);
      is_new_key
   }

   /// Deletes `key`, leaving a tombstone behind so later probes for other
   /// keys don't stop short. Returns whether the key was present.
   pub fn delete(&mut self, key: StringId, hash: u32) -> bool {
      if self.count == 0 {
         return false;
      }
      let idx = probe(&self.entries, hash, |k| *k == key);
      if matches!(self.entries[idx], Slot::Occupied(..)) {
         self.entries[idx] = Slot::Tombstone;
         true
      } else {
         false
      }
   }

   /// `findString` from spec §4.3: used exclusively by `Heap` interning.
   /// Probes by content (via `same_content`, which compares the candidate
   /// bytes against an existing handle's characters) rather than by handle.
   pub fn find_by_content(&self, hash: u32, same_content: impl Fn(StringId) -> bool) -> Option<StringId> {
      if self.capacity() == 0 {
         return None;
      }
      let mut index = hash as usize % self.capacity();
      loop {
         match &self.entries[index] {
            Slot::Empty => return None,
            Slot::Tombstone => {}
            Slot::Occupied(k, _, _) => {
               if same_content(*k) {
                  return Some(*k);
               }
            }
         }
         index = (index + 1) % self.capacity();
      }
   }

   /// Reallocates to `new_capacity`, rehashing every live entry from the
   /// *old* array into the new one before the old array is dropped. This is
   /// the fix for the clox `adjustCapacity` bug noted in spec §9.5 — there
   /// is no way to zero `table->capacity` before the rehash loop here,
   /// because both arrays are alive as ordinary owned values until the
   /// `mem::replace` below hands the old one back to be consumed.
   fn adjust_capacity(&mut self, new_capacity: usize) {
      let fresh = (0..new_capacity).map(|_| Slot::Empty).collect();
      let old_entries = std::mem::replace(&mut self.entries, fresh);

      self.count = 0;
      for slot in old_entries {
         if let Slot::Occupied(key, hash, value) = slot {
            let idx = probe(&self.entries, hash, |k| *k == key);
            self.entries[idx] = Slot::Occupied(key, hash, value);
            self.count += 1;
         }
      }
   }
}

impl<V> Default for Table<V> {
   fn default() -> Self {
      Self::new()
   }
}

/// `findEntry` from spec §4.3: linear-probes from `hash mod capacity`,
/// remembering the first tombstone seen so a later truly-empty slot can
/// report the tombstone for reuse instead.
fn probe<V>(entries: &[Slot<V>], hash: u32, same: impl Fn(&StringId) -> bool) -> usize {
   let capacity = entries.len();
   let mut index = hash as usize % capacity;
   let mut tombstone = None;

   loop {
      match &entries[index] {
         Slot::Empty => return tombstone.unwrap_or(index),
         Slot::Tombstone => {
            if tombstone.is_none() {
               tombstone = Some(index);
            }
         }
         Slot::Occupied(k, _, _) => {
            if same(k) {
               return index;
            }
         }
      }
      index = (index + 1) % capacity;
   }
}
