//! Documents and tape navigation.
//!
//! A document is a tape plus a string buffer. Navigation is a family of
//! zero-copy views over that pair: [`Element`] is a cursor at one tape word,
//! [`Array`] and [`Object`] wrap container cursors and iterate children by
//! jumping over nested containers via the open/close payloads. Views never
//! allocate and never mutate; they are invalidated (by the borrow checker)
//! when the owning parser parses again.

#[cfg(not(test))]
use alloc::vec::Vec;

use core::fmt;
use core::str;

use crate::error::Error;
use crate::tape::{payload, tag};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A parsed, owned document.
///
/// Produced by [`crate::Parser::parse_owned`] or the crate-level
/// [`crate::parse`]; owns its tape and string buffer outright.
pub struct Document {
    pub(crate) tape: Vec<u64>,
    pub(crate) strings: Vec<u8>,
}

impl Document {
    /// Borrow this document as a [`DocumentRef`].
    pub fn as_ref(&self) -> DocumentRef<'_> {
        DocumentRef {
            tape: &self.tape,
            strings: &self.strings,
        }
    }

    /// The root element.
    pub fn root(&self) -> Element<'_> {
        self.as_ref().root()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt(f)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt_tape(f)
    }
}

/// A borrowed view of a parsed document.
///
/// Returned by [`crate::Parser::parse`]; valid until the parser is mutated
/// again.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DocumentRef<'a> {
    pub(crate) tape: &'a [u64],
    pub(crate) strings: &'a [u8],
}

impl<'a> DocumentRef<'a> {
    /// The root element.
    pub fn root(self) -> Element<'a> {
        // the word after the opening root sentinel
        Element { doc: self, index: 1 }
    }

    /// Number of 64-bit words on the tape.
    pub fn tape_len(self) -> usize {
        self.tape.len()
    }

    /// The raw tape words. Low-level access for tooling and invariant checks.
    pub fn raw_tape(self) -> &'a [u64] {
        self.tape
    }

    fn fmt_tape(self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut index = 0;
        while index < self.tape.len() {
            let word = self.tape[index];
            let t = tag(word);
            write!(f, "{index} : {}", t as char)?;
            match t {
                b'l' => {
                    write!(f, " {}", self.tape[index + 1] as i64)?;
                    index += 1;
                }
                b'u' => {
                    write!(f, " {}", self.tape[index + 1])?;
                    index += 1;
                }
                b'd' => {
                    write!(f, " {:?}", f64::from_bits(self.tape[index + 1]))?;
                    index += 1;
                }
                b'"' => write!(f, " string_buf[{}]", payload(word))?,
                b'r' | b'{' | b'}' | b'[' | b']' => write!(f, " -> {}", payload(word))?,
                _ => {}
            }
            writeln!(f)?;
            index += 1;
        }
        Ok(())
    }
}

impl fmt::Display for DocumentRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root().fmt(f)
    }
}

impl fmt::Debug for DocumentRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tape(f)
    }
}

/// The JSON type of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ElementType {
    Null,
    Bool,
    Int64,
    UInt64,
    Double,
    String,
    Array,
    Object,
}

/// A cursor at one element of a document.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    doc: DocumentRef<'a>,
    index: usize,
}

impl<'a> Element<'a> {
    #[inline]
    fn word(&self) -> u64 {
        self.doc.tape[self.index]
    }

    #[inline]
    fn tag(&self) -> u8 {
        tag(self.word())
    }

    #[inline]
    fn next_word(&self) -> u64 {
        self.doc.tape[self.index + 1]
    }

    /// Tape index just past this element and everything it contains.
    #[inline]
    pub(crate) fn end_index(&self) -> usize {
        match self.tag() {
            b'{' | b'[' => payload(self.word()) as usize + 1,
            b'l' | b'u' | b'd' => self.index + 2,
            _ => self.index + 1,
        }
    }

    /// The JSON type of this element.
    pub fn element_type(&self) -> ElementType {
        match self.tag() {
            b'l' => ElementType::Int64,
            b'u' => ElementType::UInt64,
            b'd' => ElementType::Double,
            b'"' => ElementType::String,
            b'[' => ElementType::Array,
            b'{' => ElementType::Object,
            b't' | b'f' => ElementType::Bool,
            _ => ElementType::Null,
        }
    }

    /// Whether this element is a JSON `null`.
    pub fn is_null(&self) -> bool {
        self.tag() == b'n'
    }

    /// Whether this element is `true` or `false`.
    pub fn is_bool(&self) -> bool {
        matches!(self.tag(), b't' | b'f')
    }

    /// Whether this element is any number (`1`, `-1`, `2.5`, `1e2`).
    pub fn is_number(&self) -> bool {
        matches!(self.tag(), b'l' | b'u' | b'd')
    }

    /// Whether this element is an integer (`1`, `-1`, but not `1.0`).
    pub fn is_integer(&self) -> bool {
        matches!(self.tag(), b'l' | b'u')
    }

    /// Whether this element is a string.
    pub fn is_string(&self) -> bool {
        self.tag() == b'"'
    }

    /// Whether this element is an array.
    pub fn is_array(&self) -> bool {
        self.tag() == b'['
    }

    /// Whether this element is an object.
    pub fn is_object(&self) -> bool {
        self.tag() == b'{'
    }

    /// Read this element as a boolean.
    pub fn as_bool(&self) -> Result<bool, Error> {
        match self.tag() {
            b't' => Ok(true),
            b'f' => Ok(false),
            _ => Err(Error::UnexpectedType),
        }
    }

    /// Read this element as a signed 64-bit integer.
    ///
    /// Fails with [`Error::NumberOutOfRange`] for a `u64` value above
    /// `i64::MAX`.
    pub fn as_i64(&self) -> Result<i64, Error> {
        match self.tag() {
            b'l' => Ok(self.next_word() as i64),
            b'u' => {
                let value = self.next_word();
                if value > i64::MAX as u64 {
                    Err(Error::NumberOutOfRange)
                } else {
                    Ok(value as i64)
                }
            }
            _ => Err(Error::UnexpectedType),
        }
    }

    /// Read this element as an unsigned 64-bit integer.
    ///
    /// Fails with [`Error::NumberOutOfRange`] for negative values.
    pub fn as_u64(&self) -> Result<u64, Error> {
        match self.tag() {
            b'u' => Ok(self.next_word()),
            b'l' => {
                let value = self.next_word() as i64;
                if value < 0 {
                    Err(Error::NumberOutOfRange)
                } else {
                    Ok(value as u64)
                }
            }
            _ => Err(Error::UnexpectedType),
        }
    }

    /// Read this element as a double, converting integers.
    pub fn as_f64(&self) -> Result<f64, Error> {
        match self.tag() {
            b'd' => Ok(f64::from_bits(self.next_word())),
            b'l' => Ok(self.next_word() as i64 as f64),
            b'u' => Ok(self.next_word() as f64),
            _ => Err(Error::UnexpectedType),
        }
    }

    /// Read this element as a string slice into the string buffer.
    pub fn as_str(&self) -> Result<&'a str, Error> {
        if self.tag() != b'"' {
            return Err(Error::UnexpectedType);
        }
        let at = payload(self.word()) as usize;
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&self.doc.strings[at..at + 4]);
        let len = u32::from_le_bytes(len_bytes) as usize;
        let bytes = &self.doc.strings[at + 4..at + 4 + len];
        str::from_utf8(bytes).map_err(|_| Error::Utf8Error)
    }

    /// Read this element as an array.
    pub fn as_array(&self) -> Result<Array<'a>, Error> {
        if self.tag() != b'[' {
            return Err(Error::UnexpectedType);
        }
        Ok(Array { element: *self })
    }

    /// Read this element as an object.
    pub fn as_object(&self) -> Result<Object<'a>, Error> {
        if self.tag() != b'{' {
            return Err(Error::UnexpectedType);
        }
        Ok(Object { element: *self })
    }

    /// Look up a key in this element, which must be an object.
    ///
    /// The key is matched byte-wise against the *decoded* field name, so a
    /// field written `"a\n"` in the JSON is found with a key containing a
    /// real line feed.
    pub fn get(&self, key: &str) -> Result<Element<'a>, Error> {
        self.as_object()?.get(key)
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in text.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\u{8}' => f.write_str("\\b")?,
            '\u{c}' => f.write_str("\\f")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for Element<'_> {
    /// Re-emit this element as minified JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag() {
            b'n' => f.write_str("null"),
            b't' => f.write_str("true"),
            b'f' => f.write_str("false"),
            b'l' => write!(f, "{}", self.next_word() as i64),
            b'u' => write!(f, "{}", self.next_word()),
            // {:?} keeps a fraction or exponent, so the text reparses as a double
            b'd' => write!(f, "{:?}", f64::from_bits(self.next_word())),
            b'"' => write_escaped(f, self.as_str().map_err(|_| fmt::Error)?),
            b'[' => {
                f.write_str("[")?;
                for (i, element) in self.as_array().map_err(|_| fmt::Error)?.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    element.fmt(f)?;
                }
                f.write_str("]")
            }
            b'{' => {
                f.write_str("{")?;
                for (i, (key, value)) in
                    self.as_object().map_err(|_| fmt::Error)?.iter().enumerate()
                {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_escaped(f, key)?;
                    f.write_str(":")?;
                    value.fmt(f)?;
                }
                f.write_str("}")
            }
            _ => Err(fmt::Error),
        }
    }
}

/// An array element.
#[derive(Debug, Clone, Copy)]
pub struct Array<'a> {
    element: Element<'a>,
}

impl<'a> Array<'a> {
    /// Iterate over the elements in document order.
    pub fn iter(&self) -> ArrayIter<'a> {
        ArrayIter {
            doc: self.element.doc,
            pos: self.element.index + 1,
            end: payload(self.element.word()) as usize,
        }
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        payload(self.element.word()) as usize == self.element.index + 1
    }
}

impl<'a> IntoIterator for Array<'a> {
    type Item = Element<'a>;
    type IntoIter = ArrayIter<'a>;

    fn into_iter(self) -> ArrayIter<'a> {
        self.iter()
    }
}

/// Iterator over array elements.
#[derive(Debug, Clone)]
pub struct ArrayIter<'a> {
    doc: DocumentRef<'a>,
    pos: usize,
    end: usize,
}

impl<'a> Iterator for ArrayIter<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Element<'a>> {
        if self.pos >= self.end {
            return None;
        }
        let element = Element {
            doc: self.doc,
            index: self.pos,
        };
        self.pos = element.end_index();
        Some(element)
    }
}

/// An object element.
#[derive(Debug, Clone, Copy)]
pub struct Object<'a> {
    element: Element<'a>,
}

impl<'a> Object<'a> {
    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> ObjectIter<'a> {
        ObjectIter {
            doc: self.element.doc,
            pos: self.element.index + 1,
            end: payload(self.element.word()) as usize,
        }
    }

    /// Whether the object has no fields.
    pub fn is_empty(&self) -> bool {
        payload(self.element.word()) as usize == self.element.index + 1
    }

    /// Look up a field by its decoded key; the first match wins.
    pub fn get(&self, key: &str) -> Result<Element<'a>, Error> {
        for (field_key, value) in self.iter() {
            if field_key == key {
                return Ok(value);
            }
        }
        Err(Error::NoSuchField)
    }
}

impl<'a> IntoIterator for Object<'a> {
    type Item = (&'a str, Element<'a>);
    type IntoIter = ObjectIter<'a>;

    fn into_iter(self) -> ObjectIter<'a> {
        self.iter()
    }
}

/// Iterator over object fields.
#[derive(Debug, Clone)]
pub struct ObjectIter<'a> {
    doc: DocumentRef<'a>,
    pos: usize,
    end: usize,
}

impl<'a> Iterator for ObjectIter<'a> {
    type Item = (&'a str, Element<'a>);

    fn next(&mut self) -> Option<(&'a str, Element<'a>)> {
        if self.pos >= self.end {
            return None;
        }
        let key_element = Element {
            doc: self.doc,
            index: self.pos,
        };
        let key = key_element.as_str().ok()?;
        let value = Element {
            doc: self.doc,
            index: self.pos + 1,
        };
        self.pos = value.end_index();
        Some((key, value))
    }
}
