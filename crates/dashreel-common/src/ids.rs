//! Validated identifiers for routes and segments.
//!
//! Both identifiers end up as directory names and process arguments, so the
//! only way to obtain one is through parsing. Every part is restricted to ASCII
//! alphanumerics, `-` and `_`, which rules out path separators, `.`/`..`
//! sequences, NUL bytes and the `|` separator used by the concat protocol.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Exact length of a route identifier, in characters.
pub const ROUTE_ID_LEN: usize = 20;

/// Separator between the parts of a segment identifier.
pub const SEGMENT_SEPARATOR: &str = "--";

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Check a single `--`-delimited part of a segment name.
fn is_valid_part(part: &str) -> bool {
    !part.is_empty()
        && part.chars().all(is_id_char)
        && !part.starts_with('-')
        && !part.ends_with('-')
}

/// Identifier of a recorded drive: `<boot-session>--<route-suffix>`, always
/// [`ROUTE_ID_LEN`] characters long.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(String);

impl RouteId {
    /// Validate a route identifier.
    ///
    /// The length check runs first; a wrong length is reported as
    /// [`Error::RouteNotFound`] since no route of that shape can exist.
    pub fn parse(s: &str) -> Result<Self> {
        if s.chars().count() != ROUTE_ID_LEN {
            return Err(Error::route_not_found(s));
        }
        if !s.chars().all(is_id_char) {
            return Err(Error::invalid_route(s));
        }
        Ok(Self(s.to_string()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RouteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for RouteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for RouteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Identifier of one fixed-duration slice of a route:
/// `<boot-session>--<route-suffix>--<index>`.
///
/// Segments order by route name, then by numeric index, so `--10` sorts after
/// `--9`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentId {
    session: String,
    suffix: String,
    index: u32,
}

impl SegmentId {
    /// Validate a segment identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use dashreel_common::SegmentId;
    ///
    /// let seg = SegmentId::parse("2024-05-01--12-30-00--7").unwrap();
    /// assert_eq!(seg.route_name(), "2024-05-01--12-30-00");
    /// assert_eq!(seg.index(), 7);
    ///
    /// assert!(SegmentId::parse("a--b").is_err());
    /// assert!(SegmentId::parse("a--b--x").is_err());
    /// assert!(SegmentId::parse("a/..--b--0").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(SEGMENT_SEPARATOR).collect();
        let [session, suffix, index] = parts.as_slice() else {
            return Err(Error::invalid_segment(s));
        };

        if !is_valid_part(session) || !is_valid_part(suffix) {
            return Err(Error::invalid_segment(s));
        }

        // u32::from_str accepts a leading '+', so check digits explicitly.
        // Leading zeros are rejected so the id prints back to the same name.
        if index.is_empty()
            || !index.bytes().all(|b| b.is_ascii_digit())
            || (index.len() > 1 && index.starts_with('0'))
        {
            return Err(Error::invalid_segment(s));
        }
        let index = index
            .parse::<u32>()
            .map_err(|_| Error::invalid_segment(s))?;

        Ok(Self {
            session: session.to_string(),
            suffix: suffix.to_string(),
            index,
        })
    }

    /// Boot session part.
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Route suffix part.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Position of the segment within its route.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// `<boot-session>--<route-suffix>`, the name shared by every segment of a route.
    pub fn route_name(&self) -> String {
        format!("{}{SEGMENT_SEPARATOR}{}", self.session, self.suffix)
    }

    /// Whether this segment was recorded as part of `route`.
    ///
    /// A route id with `--` names `<boot-session>--<route-suffix>`; one
    /// without names the route suffix alone. A 20-character id can only be
    /// one of the two, so both forms are accepted.
    pub fn belongs_to(&self, route: &RouteId) -> bool {
        let route = route.as_str();
        if route.contains(SEGMENT_SEPARATOR) {
            self.route_name() == route
        } else {
            self.suffix == route
        }
    }

    /// Directory name of the segment in the log archive.
    pub fn dir_name(&self) -> String {
        self.to_string()
    }
}

impl FromStr for SegmentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEGMENT_SEPARATOR}{}{SEGMENT_SEPARATOR}{}",
            self.session, self.suffix, self.index
        )
    }
}

impl Ord for SegmentId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.session
            .cmp(&other.session)
            .then_with(|| self.suffix.cmp(&other.suffix))
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for SegmentId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for SegmentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
