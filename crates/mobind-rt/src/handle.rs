use std::fmt;

/// Opaque identifier of an object shared across the boundary.
///
/// Handles of source objects exposed to a target are positive, handles of
/// target objects imported by the source are negative. Zero is null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Handle(i64);

impl Handle {
    pub const NULL: Handle = Handle(0);

    pub fn from_raw(raw: i64) -> Self {
        Handle(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    pub fn side(self) -> Option<Side> {
        match self.0 {
            0 => None,
            n if n > 0 => Some(Side::Exported),
            _ => Some(Side::Imported),
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which runtime owns the objects of a reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Source objects referenced by target proxies.
    Exported,
    /// Target objects referenced by source wrappers.
    Imported,
}

impl Side {
    /// Turns the n-th allocation (starting at 1) into a handle of this side.
    pub(crate) fn handle(self, n: i64) -> Handle {
        match self {
            Side::Exported => Handle(n),
            Side::Imported => Handle(-n),
        }
    }
}
