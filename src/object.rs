//! Heap-allocated objects.
//!
//! Spec §3 describes object lifetime as an intrusive list rooted in the VM,
//! freed wholesale on shutdown. Per the re-architecture guidance in spec §9
//! ("replace the intrusive object list with a single owning container keyed
//! by small indices"), that list is a `Heap`: a `Vec<StringObject>` owned by
//! the `Vm`. A `StringId` is just an index into it — `Copy`, and equal iff
//! the two handles name the same slot, which (thanks to interning) is
//! exactly when the two strings have equal content.

use crate::table::Table;

/// A handle to an interned string living in a `Heap`.
///
/// Two `StringId`s compare equal iff they were produced by interning equal
/// content through the same `Heap` — this is the "intern-table invariant"
/// from spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringId(u32);

/// A heap-allocated string: owned character data plus its cached hash.
pub struct StringObject {
   pub chars: Box<str>,
   pub hash: u32,
}

/// Owns every string object allocated during one `interpret` call, and the
/// intern table that guarantees equal-content strings share one handle.
///
/// Dropping the `Heap` frees every object it owns in one shot — the "O(1)
/// free-all" spec §9 asks for in place of walking an intrusive list.
pub struct Heap {
   objects: Vec<StringObject>,
   strings: Table<()>,
}

/// Computes the 32-bit FNV-1a hash of a byte string, as spec §3 requires
/// for the cached hash carried by every string object.
pub fn fnv1a_hash(bytes: &[u8]) -> u32 {
   const FNV_OFFSET_BASIS: u32 = 2166136261;
   const FNV_PRIME: u32 = 16777619;

   let mut hash = FNV_OFFSET_BASIS;
   for &byte in bytes {
      hash ^= byte as u32;
      hash = hash.wrapping_mul(FNV_PRIME);
   }
   hash
}

impl Heap {
   pub fn new() -> Self {
      Self {
         objects: Vec::new(),
         strings: Table::new(),
      }
   }

   pub fn chars(&self, id: StringId) -> &str {
      &self.objects[id.0 as usize].chars
   }

   pub fn hash_of(&self, id: StringId) -> u32 {
      self.objects[id.0 as usize].hash
   }

   /// Interns `s`, copying it into a freshly owned buffer if it isn't
   /// already present. Used by the compiler for string literals and
   /// identifier constants (clox's `copyString`).
   pub fn copy_string(&mut self, s: &str) -> StringId {
      let hash = fnv1a_hash(s.as_bytes());
      if let Some(id) = self.find_string(s, hash) {
         return id;
      }
      self.allocate(s.into(), hash)
   }

   /// Interns an owned buffer, reusing it directly if it is not already
   /// present (clox's `takeString`) — used for concatenation results, so
   /// the freshly built buffer is consumed rather than copied again when
   /// it turns out to be new.
   pub fn take_string(&mut self, s: String) -> StringId {
      let hash = fnv1a_hash(s.as_bytes());
      if let Some(id) = self.find_string(&s, hash) {
         return id;
      }
      self.allocate(s.into_boxed_str(), hash)
   }

   fn allocate(&mut self, chars: Box<str>, hash: u32) -> StringId {
      let id = StringId(self.objects.len() as u32);
      self.objects.push(StringObject { chars, hash });
      self.strings.set(id, ());
      id
   }

   /// `findString` from spec §4.3: probes by content (length, cached hash,
   /// then the bytes themselves) rather than by handle, since at this point
   /// we don't have a handle for the candidate yet.
   fn find_string(&self, s: &str, hash: u32) -> Option<StringId> {
      self.strings.find_by_content(hash, |id| self.chars(id) == s)
   }
}

impl Default for Heap {
   fn default() -> Self {
      Self::new()
   }
}

#[cfg(test)]
impl Heap {
   /// Looks up an already-interned string by content without interning a
   /// new copy, for tests that need to recover a handle after a compile.
   pub(crate) fn find_interned(&self, s: &str) -> Option<StringId> {
      self.find_string(s, fnv1a_hash(s.as_bytes()))
   }
}
