//! Newtype IDs for type-safe identification of annotation classes.
//!
//! CityPersons stores the class label as the first numeric column of each
//! record. Wrapping it keeps class ids from being confused with instance ids
//! or coordinates once the row has been unpacked.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An integer CityPersons class id (e.g. 1 = pedestrian, 0 = ignore region).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub u32);

impl ClassId {
    /// Creates a new ClassId.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value.
    #[inline]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for ClassId {
    fn from(id: u32) -> Self {
        ClassId::new(id)
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_equality_and_ordering() {
        assert_eq!(ClassId(1), ClassId(1));
        assert_ne!(ClassId(1), ClassId(2));
        assert!(ClassId(0) < ClassId(5));
    }

    #[test]
    fn test_id_formatting() {
        assert_eq!(format!("{}", ClassId(3)), "3");
        assert_eq!(format!("{:?}", ClassId(3)), "ClassId(3)");
    }

    #[test]
    fn test_id_serializes_transparently() {
        let json = serde_json::to_string(&ClassId(4)).unwrap();
        assert_eq!(json, "4");
    }
}
