//! Collection lifecycle status.

use serde::Serialize;
use std::fmt;

/// Lifecycle status of a collection.
///
/// ```text
/// NewBorn | Unloaded | Unloading --load--> Loaded
/// Loaded --begin_unload--> Unloading --complete_unload--> Unloaded
/// anything but Deleted --mark_corrupted--> Corrupted
/// anything --drop--> Deleted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CollectionStatus {
    /// The store reported an unrecoverable fault.
    Corrupted = 0,
    /// Created, never loaded.
    #[serde(rename = "new born")]
    NewBorn = 1,
    /// Index entries released; definitions kept.
    Unloaded = 2,
    /// Serving reads and writes.
    Loaded = 3,
    /// Unload requested but not yet completed.
    Unloading = 4,
    /// Dropped. Terminal.
    Deleted = 5,
}

impl CollectionStatus {
    /// Returns the numeric status code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns the status for a numeric code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Corrupted),
            1 => Some(Self::NewBorn),
            2 => Some(Self::Unloaded),
            3 => Some(Self::Loaded),
            4 => Some(Self::Unloading),
            5 => Some(Self::Deleted),
            _ => None,
        }
    }

    /// Returns the display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Corrupted => "corrupted",
            Self::NewBorn => "new born",
            Self::Unloaded => "unloaded",
            Self::Loaded => "loaded",
            Self::Unloading => "unloading",
            Self::Deleted => "deleted",
        }
    }

    /// Returns true if the status admits a move to `target`.
    ///
    /// `Loaded -> Loaded` and `Deleted -> Deleted` are accepted as no-ops
    /// by the collection before this is consulted.
    #[must_use]
    pub const fn can_become(self, target: Self) -> bool {
        match target {
            Self::Loaded => matches!(self, Self::NewBorn | Self::Unloaded | Self::Unloading),
            Self::Unloading => matches!(self, Self::Loaded),
            Self::Unloaded => matches!(self, Self::Unloading),
            Self::Corrupted => !matches!(self, Self::Deleted),
            Self::Deleted => true,
            Self::NewBorn => false,
        }
    }
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
