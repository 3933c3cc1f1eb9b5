//! Identifiers carried by every signal.

use std::fmt;

use uuid::Uuid;

/// Opaque identifier of one compiled code unit (e.g. a script block).
///
/// Assigned once by the engine when the unit is compiled. The tracing core only
/// compares and hashes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CodeUnitId(Uuid);

impl CodeUnitId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an identifier assigned elsewhere.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// The nil identifier (all zero bits).
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for CodeUnitId {
    fn default() -> Self {
        Self::nil()
    }
}

impl From<Uuid> for CodeUnitId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for CodeUnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

/// A reachable location inside a code unit, numbered by the engine's compiler.
///
/// Only meaningful together with the [`CodeUnitId`] it was emitted with.
/// Engines number points from zero upwards, so negative values never occur.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequencePoint(pub u32);

impl From<u32> for SequencePoint {
    fn from(point: u32) -> Self {
        Self(point)
    }
}

impl fmt::Display for SequencePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_unit_ids_are_unique() {
        let a = CodeUnitId::new();
        let b = CodeUnitId::new();
        assert_ne!(a, b);
        assert_ne!(a, CodeUnitId::nil());
    }

    #[test]
    fn test_code_unit_id_display_is_hyphenated_uuid() {
        let uuid = Uuid::from_u128(0x092a_e15a_d5fb_5d8d_9ffd_6889_1d24_c5f6);
        let unit = CodeUnitId::from_uuid(uuid);
        assert_eq!(unit.to_string(), "092ae15a-d5fb-5d8d-9ffd-68891d24c5f6");
        assert_eq!(unit.as_uuid(), &uuid);
    }

    #[test]
    fn test_code_unit_id_default_is_nil() {
        assert_eq!(CodeUnitId::default(), CodeUnitId::nil());
        assert_eq!(CodeUnitId::default(), CodeUnitId::default());
    }

    #[test]
    fn test_sequence_point_covers_full_range() {
        assert_eq!(SequencePoint::default(), SequencePoint(0));
        assert!(SequencePoint(0) < SequencePoint(u32::MAX));
        assert_eq!(SequencePoint::from(u32::MAX).to_string(), "#4294967295");
    }

    #[test]
    fn test_sequence_point_from_u32() {
        let point: SequencePoint = 7.into();
        assert_eq!(point, SequencePoint(7));
        assert_eq!(point.to_string(), "#7");
    }
}
