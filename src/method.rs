//! HTTP verbs the router dispatches on.
//!
//! The set is fixed. A request whose method token is anything else still
//! reaches the router, which answers `501 Not Implemented` for it.

use std::fmt;
use std::str::FromStr;

/// A verb a [`Handler`](crate::Handler) can implement.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Delete,
    Get,
    Head,
    Post,
    Put,
    Options,
    Patch,
}

impl Method {
    /// Every verb, in dispatch-table order.
    pub const ALL: [Method; 7] = [
        Self::Delete,
        Self::Get,
        Self::Head,
        Self::Post,
        Self::Put,
        Self::Options,
        Self::Patch,
    ];

    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Error returned when a method token is outside the dispatchable set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedMethod(pub String);

impl fmt::Display for UnsupportedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported method `{}`", self.0)
    }
}

impl std::error::Error for UnsupportedMethod {}

/// Parses an uppercase method token. Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DELETE"  => Ok(Self::Delete),
            "GET"     => Ok(Self::Get),
            "HEAD"    => Ok(Self::Head),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            "OPTIONS" => Ok(Self::Options),
            "PATCH"   => Ok(Self::Patch),
            other     => Err(UnsupportedMethod(other.to_owned())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
