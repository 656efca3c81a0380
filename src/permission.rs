//! Access levels and type-safe permission tokens.
//!
//! [`AccessLevel`] is the runtime ordering used by every authorization
//! decision. The [`Level`] trait and the marker types in [`level`] lift the
//! same ordering to the type level, so an operation can demand proof that a
//! check was made.
//!
//! # Example
//!
//! ```ignore
//! use folio::level::Write;
//!
//! // Permission<L> can only be obtained by passing a permission check
//! let perm = evaluator
//!     .require::<Write>(&user_id, &doc_id, ResourceType::Document, &tenant_id)
//!     .await?;
//!
//! // Operations require specific permission levels
//! documents::rename(&store, perm, "Q3 report").await?;  // Compiler enforces Write
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::effective::EffectivePermission;
use crate::error::Error;

/// Access granted on a folder or document.
///
/// Variants are declared in ascending order, so the derived `Ord` matches
/// [`AccessLevel::rank`]: `Read < Write < Admin`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessLevel {
    Read,
    Write,
    Admin,
}

impl AccessLevel {
    /// All levels, lowest first.
    pub const ALL: [AccessLevel; 3] = [AccessLevel::Read, AccessLevel::Write, AccessLevel::Admin];

    /// Ordinal value for runtime comparison.
    /// Higher rank = more permissive.
    pub const fn rank(self) -> u8 {
        match self {
            AccessLevel::Read => 1,
            AccessLevel::Write => 2,
            AccessLevel::Admin => 3,
        }
    }

    /// Whether holding `self` is enough for an operation requiring `required`.
    pub const fn satisfies(self, required: AccessLevel) -> bool {
        self.rank() >= required.rank()
    }

    /// Canonical upper-case name, as stored and serialized.
    pub const fn as_str(self) -> &'static str {
        match self {
            AccessLevel::Read => "READ",
            AccessLevel::Write => "WRITE",
            AccessLevel::Admin => "ADMIN",
        }
    }
}

/// `rank(actual) >= rank(required)`.
pub fn satisfies(actual: AccessLevel, required: AccessLevel) -> bool {
    actual.satisfies(required)
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "READ" => Ok(AccessLevel::Read),
            "WRITE" => Ok(AccessLevel::Write),
            "ADMIN" => Ok(AccessLevel::Admin),
            other => Err(Error::InvalidArgument(format!(
                "Unknown access level: {other}"
            ))),
        }
    }
}

/// Marker trait for permission levels.
///
/// Implementors name the runtime [`AccessLevel`] they stand for.
/// Standard levels: Read (1) < Write (2) < Admin (3)
pub trait Level: Clone + Copy + PartialEq + Eq + fmt::Debug + Send + Sync + 'static {
    /// Runtime level a holder must satisfy.
    const ACCESS: AccessLevel;
}

/// Standard permission levels (Read < Write < Admin).
pub mod level {
    use super::{AccessLevel, Level};

    /// Read-only access level.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Read;

    impl Level for Read {
        const ACCESS: AccessLevel = AccessLevel::Read;
    }

    /// Content editing access level.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Write;

    impl Level for Write {
        const ACCESS: AccessLevel = AccessLevel::Write;
    }

    /// Administrative access level.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Admin;

    impl Level for Admin {
        const ACCESS: AccessLevel = AccessLevel::Admin;
    }
}

/// Proof that a user holds at least `L` on a resource.
///
/// Only [`PermissionEvaluator::require`](crate::PermissionEvaluator::require)
/// constructs one.
#[derive(Debug, Clone)]
pub struct Permission<L: Level> {
    effective: EffectivePermission,
    _level: PhantomData<L>,
}

impl<L: Level> Permission<L> {
    pub(crate) fn new(effective: EffectivePermission) -> Self {
        Self {
            effective,
            _level: PhantomData,
        }
    }

    /// The resolution that satisfied the check.
    pub fn effective(&self) -> &EffectivePermission {
        &self.effective
    }

    /// The level the user actually holds, which may exceed `L`.
    pub fn granted(&self) -> AccessLevel {
        self.effective.access_level()
    }

    /// Weaken the proof to a level `L` already covers.
    ///
    /// Fails with `Forbidden` when `M` ranks above `L`; a token can only be
    /// narrowed, never widened, even when the user actually holds more.
    pub fn downgrade<M: Level>(self) -> Result<Permission<M>, Error> {
        if !L::ACCESS.satisfies(M::ACCESS) {
            return Err(Error::Forbidden {
                resource: self.effective.source_resource_id().to_string(),
                required: M::ACCESS,
            });
        }
        Ok(Permission::new(self.effective))
    }
}
