//! Path keys: structural addresses into a tree, encoded as flat-record keys.
//!
//! Grammar:
//!
//! - fields are joined with `.` (no leading `.` at the root)
//! - sequence positions follow their parent as `[n]`, with no separator
//! - the reserved last segment `@class` addresses the type hint of its parent
//!
//! Inside a field name the characters `\`, `.`, `[` and `]` are escaped with a
//! backslash, as is a leading `@`, so no field can be mistaken for the hint
//! segment. [`PathKey::parse`] and `Display` are exact inverses.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{PathError, PathResult};

/// The reserved segment holding a type hint.
pub const HINT_SEGMENT: &str = "@class";

const ESCAPED: &[char] = &['\\', '.', '[', ']'];

/// One step of a path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    Field(String),
    Index(usize),
    Hint,
}

/// A parsed path key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PathKey {
    segments: Vec<Segment>,
}

impl PathKey {
    /// The empty path addressing the root node.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn pop(&mut self) -> Option<Segment> {
        self.segments.pop()
    }

    /// The key of the type hint attached to the node at this path.
    pub fn hint_key(&self) -> PathKey {
        let mut key = self.clone();
        key.push(Segment::Hint);
        key
    }

    /// Returns `true` if this key addresses a type hint.
    pub fn is_hint(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Hint))
    }

    /// Parses a flat-record key.
    ///
    /// The empty string is the root path.
    ///
    /// # Examples
    ///
    /// ```
    /// use flathash_path::{PathKey, Segment};
    ///
    /// let key = PathKey::parse("persons[1].first").unwrap();
    /// assert_eq!(
    ///     key.segments(),
    ///     &[
    ///         Segment::Field("persons".into()),
    ///         Segment::Index(1),
    ///         Segment::Field("first".into()),
    ///     ]
    /// );
    /// assert!(PathKey::parse("items[01]").is_err());
    /// ```
    pub fn parse(key: &str) -> PathResult<PathKey> {
        let mut segments = Vec::new();
        let mut chars = key.chars().peekable();

        while let Some(&next) = chars.peek() {
            if segments.last() == Some(&Segment::Hint) {
                return Err(malformed(key, "`@class` must be the last segment"));
            }
            match next {
                '[' => {
                    chars.next();
                    segments.push(Segment::Index(parse_index(key, &mut chars)?));
                }
                '.' => {
                    if segments.is_empty() {
                        return Err(malformed(key, "leading '.'"));
                    }
                    chars.next();
                    segments.push(parse_field(key, &mut chars)?);
                }
                _ => {
                    if !segments.is_empty() {
                        return Err(malformed(key, "expected '.' or '[' between segments"));
                    }
                    segments.push(parse_field(key, &mut chars)?);
                }
            }
        }

        Ok(PathKey { segments })
    }
}

fn malformed(key: &str, reason: impl Into<String>) -> PathError {
    PathError::MalformedKey {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn parse_index(key: &str, chars: &mut Peekable<Chars<'_>>) -> PathResult<usize> {
    let mut digits = String::new();
    loop {
        match chars.next() {
            Some(']') => break,
            Some(c) if c.is_ascii_digit() => digits.push(c),
            Some(c) => return Err(malformed(key, format!("unexpected {c:?} in index"))),
            None => return Err(malformed(key, "unterminated index")),
        }
    }
    if digits.is_empty() {
        return Err(malformed(key, "empty index"));
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(malformed(key, format!("index {digits} has a leading zero")));
    }
    digits
        .parse()
        .map_err(|_| malformed(key, format!("index {digits} is out of range")))
}

fn parse_field(key: &str, chars: &mut Peekable<Chars<'_>>) -> PathResult<Segment> {
    let mut name = String::new();
    let mut escaped_at = false;

    while let Some(&c) = chars.peek() {
        match c {
            '.' | '[' => break,
            ']' => return Err(malformed(key, "unescaped ']' in field name")),
            '\\' => {
                chars.next();
                match chars.next() {
                    Some('@') if name.is_empty() => {
                        escaped_at = true;
                        name.push('@');
                    }
                    Some(e) if ESCAPED.contains(&e) => name.push(e),
                    Some(e) => return Err(malformed(key, format!("invalid escape \\{e}"))),
                    None => return Err(malformed(key, "dangling '\\'")),
                }
            }
            _ => {
                chars.next();
                name.push(c);
            }
        }
    }

    if name.is_empty() {
        return Err(malformed(key, "empty field name"));
    }
    if !escaped_at && name.starts_with('@') {
        if name == HINT_SEGMENT {
            return Ok(Segment::Hint);
        }
        return Err(malformed(key, format!("reserved segment {name:?}")));
    }
    Ok(Segment::Field(name))
}

fn write_field(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    for (i, c) in name.chars().enumerate() {
        if ESCAPED.contains(&c) || (i == 0 && c == '@') {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Index(n) => write!(f, "[{n}]")?,
                Segment::Field(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    write_field(f, name)?;
                }
                Segment::Hint => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(HINT_SEGMENT)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => write!(f, "field {name:?}"),
            Segment::Index(n) => write!(f, "index {n}"),
            Segment::Hint => write!(f, "type hint"),
        }
    }
}

impl From<Vec<Segment>> for PathKey {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn field(name: &str) -> Segment {
        Segment::Field(name.to_string())
    }

    #[test]
    fn parse_nested_key() {
        let key = PathKey::parse("nested[0].persons.1.@class").unwrap();
        assert_eq!(
            key.segments(),
            &[
                field("nested"),
                Segment::Index(0),
                field("persons"),
                field("1"),
                Segment::Hint,
            ]
        );
        assert!(key.is_hint());
    }

    #[test]
    fn root_forms() {
        assert!(PathKey::parse("").unwrap().is_root());
        assert_eq!(PathKey::parse("@class").unwrap().segments(), &[Segment::Hint]);
        assert_eq!(
            PathKey::parse("[2].@class").unwrap().segments(),
            &[Segment::Index(2), Segment::Hint]
        );
    }

    #[test]
    fn escaped_field_names() {
        let key = PathKey::from(vec![field("a.b"), field("@class"), field("x[1]\\")]);
        let text = key.to_string();
        assert_eq!(text, r"a\.b.\@class.x\[1\]\\");
        assert_eq!(PathKey::parse(&text).unwrap(), key);
    }

    #[test]
    fn at_sign_is_only_escaped_when_leading() {
        let key = PathKey::from(vec![field("user@host")]);
        assert_eq!(key.to_string(), "user@host");
    }

    #[test]
    fn rejects_malformed_keys() {
        for bad in [
            ".a", "a.", "a..b", "a[", "a[]", "a[x]", "a[01]", "a]b", "a[0]b", r"a\q", "a\\",
            "@class.a", "@other", "a.@class[0]",
        ] {
            assert!(
                matches!(PathKey::parse(bad), Err(PathError::MalformedKey { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn index_overflow_is_malformed() {
        let err = PathKey::parse("a[99999999999999999999999]").unwrap_err();
        assert!(matches!(err, PathError::MalformedKey { .. }));
    }

    fn arb_segment() -> impl Strategy<Value = Segment> {
        prop_oneof![
            "[a-z@.\\[\\]\\\\0-9]{1,8}".prop_map(Segment::Field),
            (0usize..1000).prop_map(Segment::Index),
        ]
    }

    proptest! {
        #[test]
        fn display_and_parse_are_inverse(
            segments in prop::collection::vec(arb_segment(), 0..6),
            hinted in any::<bool>(),
        ) {
            let mut key = PathKey::from(segments);
            if hinted {
                key = key.hint_key();
            }
            let text = key.to_string();
            prop_assert_eq!(PathKey::parse(&text).unwrap(), key);
        }
    }
}
