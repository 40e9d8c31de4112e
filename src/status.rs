//! Status vector storage and the raw wire view.
//!
//! Three shapes of the same data live here:
//!
//! - [`RawStatus`]: a borrowed view over words produced by the native library,
//!   plus the [`StringTable`] that string handles are resolved against.
//! - [`StatusVector`]: owned storage. Inline for up to [`STATUS_LENGTH`] words,
//!   spills to the heap for long chains.
//! - [`FixedStatusBuffer`]: a call-site supplied word slice and string arena.
//!   Writes never go past either, and the words are always `ARG_END` terminated.
//!
//! Producers write through [`StatusSink`], so an exception can serialize
//! itself into any of the owned shapes.

use crate::codes::{ArgKind, StatusWord, markers};
use crate::record::ErrorRecord;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use zeroize::Zeroize;

/// Inline capacity of a status vector (`ISC_STATUS_LENGTH`).
pub const STATUS_LENGTH: usize = 20;

// ============================================================================
// String Side-Table
// ============================================================================

/// Resolves the string handles embedded in a status vector.
pub trait StringTable {
    /// Look up a handle. Unknown or negative handles yield `None`.
    fn resolve(&self, handle: StatusWord) -> Option<&str>;
}

fn lookup<'t>(table: &'t [&str], handle: StatusWord) -> Option<&'t str> {
    usize::try_from(handle).ok().and_then(|i| table.get(i)).copied()
}

impl StringTable for &[&str] {
    fn resolve(&self, handle: StatusWord) -> Option<&str> {
        lookup(self, handle)
    }
}

impl<const N: usize> StringTable for [&str; N] {
    fn resolve(&self, handle: StatusWord) -> Option<&str> {
        lookup(self, handle)
    }
}

impl StringTable for Vec<&str> {
    fn resolve(&self, handle: StatusWord) -> Option<&str> {
        lookup(self, handle)
    }
}

impl StringTable for Vec<String> {
    fn resolve(&self, handle: StatusWord) -> Option<&str> {
        usize::try_from(handle)
            .ok()
            .and_then(|i| self.get(i))
            .map(String::as_str)
    }
}

/// A side-table that resolves nothing, for vectors without string arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStrings;

impl StringTable for NoStrings {
    fn resolve(&self, _handle: StatusWord) -> Option<&str> {
        None
    }
}

// ============================================================================
// Raw View
// ============================================================================

/// Borrowed view over a native status vector.
///
/// The view never reads past `words`; an `ARG_END` marker or the end of the
/// slice both terminate it.
#[derive(Clone, Copy)]
pub struct RawStatus<'a> {
    words: &'a [StatusWord],
    strings: &'a dyn StringTable,
}

impl<'a> RawStatus<'a> {
    #[inline]
    pub fn new(words: &'a [StatusWord], strings: &'a dyn StringTable) -> Self {
        Self { words, strings }
    }

    /// View over a vector that carries no string arguments.
    #[inline]
    pub fn codes_only(words: &'a [StatusWord]) -> Self {
        Self {
            words,
            strings: &NoStrings,
        }
    }

    /// An empty (success) view.
    #[inline]
    pub fn empty() -> RawStatus<'static> {
        RawStatus::codes_only(&[])
    }

    #[inline]
    pub fn words(&self) -> &'a [StatusWord] {
        self.words
    }

    #[inline]
    pub fn strings(&self) -> &'a dyn StringTable {
        self.strings
    }

    /// Whether the vector carries no error code.
    ///
    /// `[]`, `[ARG_END, ..]` and `[ARG_GDS, 0, ..]` mean success, as does a
    /// vector of warnings only. A nonzero `ARG_GDS` anywhere in the decodable
    /// part is an error, even when warnings come first.
    pub fn is_success(&self) -> bool {
        use markers::*;
        match self.words {
            [] | [ARG_END, ..] | [ARG_GDS, 0] => return true,
            [ARG_GDS, 0, next, ..] if !matches!(*next, ARG_END | ARG_WARNING) => return false,
            [ARG_GDS, 0, ..] | [ARG_WARNING, ..] => {}
            _ => return false,
        }
        !self
            .entries()
            .any(|entry| entry.kind == ArgKind::Code && entry.value() != 0)
    }

    /// Iterate over complete entries.
    #[inline]
    pub fn entries(&self) -> RawEntries<'a> {
        RawEntries {
            words: self.words,
            position: 0,
            truncated: false,
            finished: false,
        }
    }

    /// Split into the error part and the warning part at the first warning marker.
    pub fn split_warnings(&self) -> (RawStatus<'a>, RawStatus<'a>) {
        for entry in self.entries() {
            if entry.kind == ArgKind::Warning {
                let (errors, warnings) = self.words.split_at(entry.offset);
                return (
                    RawStatus::new(errors, self.strings),
                    RawStatus::new(warnings, self.strings),
                );
            }
        }
        (*self, RawStatus::new(&[], self.strings))
    }
}

impl fmt::Debug for RawStatus<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawStatus")
            .field("words", &self.words)
            .field("strings", &"<side-table>")
            .finish()
    }
}

/// One complete entry of a raw vector: marker plus its value words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEntry<'a> {
    pub kind: ArgKind,
    pub values: &'a [StatusWord],
    /// Index of the marker word inside the vector.
    pub offset: usize,
}

impl RawEntry<'_> {
    /// The single value word (the handle for counted strings).
    #[inline]
    pub fn value(&self) -> StatusWord {
        self.values.last().copied().unwrap_or(0)
    }
}

/// Entry iterator that fails closed.
///
/// Stops at `ARG_END`, at the end of the slice, at an unknown marker, or at an
/// entry whose value words are missing. The last two set [`is_truncated`].
///
/// [`is_truncated`]: RawEntries::is_truncated
#[derive(Debug, Clone)]
pub struct RawEntries<'a> {
    words: &'a [StatusWord],
    position: usize,
    truncated: bool,
    finished: bool,
}

impl RawEntries<'_> {
    /// Whether iteration stopped on a malformed or cut-off entry.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    fn stop(&mut self, truncated: bool) {
        self.finished = true;
        self.truncated |= truncated;
    }
}

impl<'a> Iterator for RawEntries<'a> {
    type Item = RawEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let offset = self.position;
        let Some(&marker) = self.words.get(offset) else {
            self.stop(false);
            return None;
        };
        let Some(kind) = ArgKind::from_marker(marker) else {
            self.stop(true);
            return None;
        };
        if kind == ArgKind::End {
            self.stop(false);
            return None;
        }
        let start = offset + 1;
        let end = start + kind.width();
        let Some(values) = self.words.get(start..end) else {
            self.stop(true);
            return None;
        };
        self.position = end;
        Some(RawEntry {
            kind,
            values,
            offset,
        })
    }
}

// ============================================================================
// Sink
// ============================================================================

/// Destination for serialized status entries.
///
/// Each push appends one whole entry or nothing. A `false` return means the
/// sink is out of room and the entry was dropped.
pub trait StatusSink {
    /// Append a marker with one numeric value word.
    fn push_word(&mut self, marker: StatusWord, value: StatusWord) -> bool;

    /// Append a string-carrying marker (`ARG_STRING`, `ARG_INTERPRETED`, `ARG_SQL_STATE`).
    fn push_str(&mut self, marker: StatusWord, value: &str) -> bool;

    /// Append a string that lives for the whole process.
    ///
    /// Sinks that can keep a reference instead of copying override this.
    fn push_static_str(&mut self, marker: StatusWord, value: &'static str) -> bool {
        self.push_str(marker, value)
    }
}

// ============================================================================
// Owned Vector
// ============================================================================

/// Owned status vector with inline storage for the common case.
///
/// String arguments are kept in a side-table owned by the vector; the word
/// after a string marker is an index into it. Static strings are borrowed, so
/// serializing literal-only errors does not touch the heap while the vector
/// stays inline.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StatusVector {
    words: SmallVec<[StatusWord; STATUS_LENGTH]>,
    strings: SmallVec<[Cow<'static, str>; 4]>,
}

impl StatusVector {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy a raw vector, resolving and owning its strings.
    ///
    /// Counted strings are normalized to `ARG_STRING`. Copying stops where
    /// the raw view stops.
    pub fn from_raw(raw: RawStatus<'_>) -> Self {
        let mut vector = Self::new();
        vector.append_raw(raw);
        vector
    }

    /// Append every complete entry of `raw`. Returns `false` if the source was truncated.
    pub fn append_raw(&mut self, raw: RawStatus<'_>) -> bool {
        let mut entries = raw.entries();
        for entry in entries.by_ref() {
            match entry.kind {
                ArgKind::Str | ArgKind::Interpreted | ArgKind::SqlState => {
                    let Some(text) = raw.strings().resolve(entry.value()) else {
                        return false;
                    };
                    self.push_str(marker_of(entry.kind), text);
                }
                ArgKind::CStr => {
                    let Some(text) = resolve_counted(raw.strings(), entry.values) else {
                        return false;
                    };
                    self.push_str(markers::ARG_STRING, text);
                }
                _ => {
                    self.push_word(marker_of(entry.kind), entry.value());
                }
            }
        }
        !entries.is_truncated()
    }

    /// Words without the trailing `ARG_END`.
    #[inline]
    pub fn words(&self) -> &[StatusWord] {
        &self.words
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whether both words and strings still fit the inline storage.
    #[inline]
    pub fn is_inline(&self) -> bool {
        !self.words.spilled() && !self.strings.spilled()
    }

    #[inline]
    pub fn as_raw(&self) -> RawStatus<'_> {
        RawStatus::new(&self.words, self)
    }

    /// Words followed by `ARG_END`, as handed to C callers.
    pub fn to_terminated(&self) -> Vec<StatusWord> {
        let mut words = Vec::with_capacity(self.words.len() + 1);
        words.extend_from_slice(&self.words);
        words.push(markers::ARG_END);
        words
    }

    /// Decode into an owned record.
    #[inline]
    pub fn to_record(&self) -> ErrorRecord {
        ErrorRecord::parse(self.as_raw())
    }

    pub fn clear(&mut self) {
        self.zeroize();
    }

    pub(crate) fn push_cow(&mut self, marker: StatusWord, value: Cow<'static, str>) -> bool {
        let handle = self.strings.len() as StatusWord;
        self.strings.push(value);
        self.words.push(marker);
        self.words.push(handle);
        true
    }
}

impl StringTable for StatusVector {
    fn resolve(&self, handle: StatusWord) -> Option<&str> {
        usize::try_from(handle)
            .ok()
            .and_then(|i| self.strings.get(i))
            .map(|s| s.as_ref())
    }
}

impl StatusSink for StatusVector {
    fn push_word(&mut self, marker: StatusWord, value: StatusWord) -> bool {
        self.words.push(marker);
        self.words.push(value);
        true
    }

    fn push_str(&mut self, marker: StatusWord, value: &str) -> bool {
        self.push_cow(marker, Cow::Owned(value.to_owned()))
    }

    fn push_static_str(&mut self, marker: StatusWord, value: &'static str) -> bool {
        self.push_cow(marker, Cow::Borrowed(value))
    }
}

impl Zeroize for StatusVector {
    fn zeroize(&mut self) {
        for s in self.strings.iter_mut() {
            if let Cow::Owned(owned) = s {
                owned.zeroize();
            }
        }
        self.strings.clear();
        self.words.clear();
    }
}

impl Drop for StatusVector {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for StatusVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusVector")
            .field("words", &self.words.as_slice())
            .field("strings", &self.strings.len())
            .field("inline", &self.is_inline())
            .finish()
    }
}

// ============================================================================
// Fixed Buffer
// ============================================================================

/// Status output over memory owned by the call site.
///
/// Strings are copied into `arena` NUL-terminated; the value word after a
/// string marker is the byte offset of the copy. A string holding a NUL byte
/// is cut there, as a C caller would read it, and the buffer is flagged as
/// truncated. One word is always reserved for `ARG_END`. Entries that do not
/// fit are dropped whole and the buffer is flagged as truncated. Nothing here
/// allocates.
pub struct FixedStatusBuffer<'b> {
    words: &'b mut [StatusWord],
    len: usize,
    arena: &'b mut [u8],
    arena_len: usize,
    truncated: bool,
}

impl<'b> FixedStatusBuffer<'b> {
    pub fn new(words: &'b mut [StatusWord], arena: &'b mut [u8]) -> Self {
        let mut buffer = Self {
            words,
            len: 0,
            arena,
            arena_len: 0,
            truncated: false,
        };
        buffer.terminate();
        buffer
    }

    /// Words written so far, without the terminator.
    #[inline]
    pub fn words(&self) -> &[StatusWord] {
        &self.words[..self.len]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether any entry or string byte was dropped for lack of room.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.words.len()
    }

    #[inline]
    pub fn as_raw(&self) -> RawStatus<'_> {
        RawStatus::new(&self.words[..self.len], self)
    }

    pub fn clear(&mut self) {
        self.arena[..self.arena_len].fill(0);
        self.len = 0;
        self.arena_len = 0;
        self.truncated = false;
        self.terminate();
    }

    fn terminate(&mut self) {
        if let Some(slot) = self.words.get_mut(self.len) {
            *slot = markers::ARG_END;
        }
    }

    fn has_room(&mut self) -> bool {
        // marker + value + terminator
        if self.len + 3 <= self.words.len() {
            true
        } else {
            self.truncated = true;
            false
        }
    }

    fn write_pair(&mut self, marker: StatusWord, value: StatusWord) {
        self.words[self.len] = marker;
        self.words[self.len + 1] = value;
        self.len += 2;
        self.terminate();
    }

    fn copy_str(&mut self, value: &str) -> Option<StatusWord> {
        let free = self.arena.len().saturating_sub(self.arena_len);
        if free == 0 {
            self.truncated = true;
            return None;
        }
        // The copy is NUL-terminated, so text stops at an interior NUL.
        let text_len = value.find('\0').unwrap_or(value.len());
        let mut take = text_len.min(free - 1);
        while take > 0 && !value.is_char_boundary(take) {
            take -= 1;
        }
        if take < value.len() {
            self.truncated = true;
        }
        let offset = self.arena_len;
        self.arena[offset..offset + take].copy_from_slice(&value.as_bytes()[..take]);
        self.arena[offset + take] = 0;
        self.arena_len += take + 1;
        Some(offset as StatusWord)
    }
}

impl StatusSink for FixedStatusBuffer<'_> {
    fn push_word(&mut self, marker: StatusWord, value: StatusWord) -> bool {
        if !self.has_room() {
            return false;
        }
        self.write_pair(marker, value);
        true
    }

    fn push_str(&mut self, marker: StatusWord, value: &str) -> bool {
        if !self.has_room() {
            return false;
        }
        let Some(handle) = self.copy_str(value) else {
            return false;
        };
        self.write_pair(marker, handle);
        true
    }
}

impl StringTable for FixedStatusBuffer<'_> {
    fn resolve(&self, handle: StatusWord) -> Option<&str> {
        let start = usize::try_from(handle).ok()?;
        let used = self.arena.get(start..self.arena_len)?;
        let end = used.iter().position(|b| *b == 0)?;
        std::str::from_utf8(&used[..end]).ok()
    }
}

impl fmt::Debug for FixedStatusBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedStatusBuffer")
            .field("words", &self.words())
            .field("capacity", &self.words.len())
            .field("arena_used", &self.arena_len)
            .field("truncated", &self.truncated)
            .finish()
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub(crate) const fn marker_of(kind: ArgKind) -> StatusWord {
    use markers::*;
    match kind {
        ArgKind::End => ARG_END,
        ArgKind::Code => ARG_GDS,
        ArgKind::Warning => ARG_WARNING,
        ArgKind::Str => ARG_STRING,
        ArgKind::CStr => ARG_CSTRING,
        ArgKind::Number => ARG_NUMBER,
        ArgKind::Interpreted => ARG_INTERPRETED,
        ArgKind::SqlState => ARG_SQL_STATE,
        ArgKind::Os(os) => os.marker(),
    }
}

/// Resolve an `ARG_CSTRING` payload (`[length, handle]`), clamping to the
/// declared length on a character boundary.
pub(crate) fn resolve_counted<'t>(table: &'t dyn StringTable, values: &[StatusWord]) -> Option<&'t str> {
    let [length, handle] = values else {
        return None;
    };
    let length = usize::try_from(*length).ok()?;
    let text = table.resolve(*handle)?;
    let mut end = length.min(text.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    Some(&text[..end])
}
