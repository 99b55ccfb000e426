//! Class map: what to do with each CityPersons class id.
//!
//! The map is resolved once when configuration is loaded. In YAML each id
//! maps to a class name, to the literal `ignore`, or to `null` (drop).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::ids::ClassId;

/// Class name that marks an ignore region.
pub const IGNORE_NAME: &str = "ignore";

/// The resolved action for one class id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassAction {
    /// Keep the object and write it under this name.
    Keep(String),
    /// Remove the object before anything else looks at it.
    Drop,
    /// Ignore region: written as `ignore`, optionally exempt from filtering.
    Ignore,
}

impl ClassAction {
    /// Name written to VOC `<name>`, or `None` for dropped classes.
    pub fn voc_name(&self) -> Option<&str> {
        match self {
            ClassAction::Keep(name) => Some(name),
            ClassAction::Ignore => Some(IGNORE_NAME),
            ClassAction::Drop => None,
        }
    }
}

impl fmt::Display for ClassAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassAction::Keep(name) => write!(f, "{name}"),
            ClassAction::Drop => write!(f, "<drop>"),
            ClassAction::Ignore => write!(f, "{IGNORE_NAME}"),
        }
    }
}

/// Mapping from class id to [`ClassAction`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<u32, Option<String>>",
    into = "BTreeMap<u32, Option<String>>"
)]
pub struct ClassMap {
    actions: BTreeMap<ClassId, ClassAction>,
}

impl ClassMap {
    /// Builds a class map from resolved actions.
    pub fn new(actions: impl IntoIterator<Item = (ClassId, ClassAction)>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
        }
    }

    /// The CityPersons mapping: pedestrians and riders become `ped`; sitting
    /// persons, other person-like objects, groups and the `0` label become
    /// ignore regions.
    pub fn citypersons_default() -> Self {
        let ped = || ClassAction::Keep("ped".to_string());
        Self::new([
            (ClassId(0), ClassAction::Ignore),
            (ClassId(1), ped()),
            (ClassId(2), ped()),
            (ClassId(3), ClassAction::Ignore),
            (ClassId(4), ClassAction::Ignore),
            (ClassId(5), ClassAction::Ignore),
        ])
    }

    /// Looks up the action for a class id.
    pub fn get(&self, id: ClassId) -> Option<&ClassAction> {
        self.actions.get(&id)
    }

    /// Returns true if the id is mapped to [`ClassAction::Drop`].
    pub fn is_drop(&self, id: ClassId) -> bool {
        matches!(self.get(id), Some(ClassAction::Drop))
    }

    /// Returns true if the id is mapped to [`ClassAction::Ignore`].
    pub fn is_ignore(&self, id: ClassId) -> bool {
        matches!(self.get(id), Some(ClassAction::Ignore))
    }

    /// All ids mapped to ignore regions.
    pub fn ignore_ids(&self) -> BTreeSet<ClassId> {
        self.ids_where(|action| matches!(action, ClassAction::Ignore))
    }

    /// All ids mapped to drop.
    pub fn drop_ids(&self) -> BTreeSet<ClassId> {
        self.ids_where(|action| matches!(action, ClassAction::Drop))
    }

    /// Iterates over `(id, action)` in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &ClassAction)> {
        self.actions.iter().map(|(id, action)| (*id, action))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn ids_where(&self, pred: impl Fn(&ClassAction) -> bool) -> BTreeSet<ClassId> {
        self.actions
            .iter()
            .filter(|(_, action)| pred(action))
            .map(|(id, _)| *id)
            .collect()
    }
}

impl Default for ClassMap {
    fn default() -> Self {
        Self::citypersons_default()
    }
}

impl TryFrom<BTreeMap<u32, Option<String>>> for ClassMap {
    type Error = String;

    fn try_from(raw: BTreeMap<u32, Option<String>>) -> Result<Self, Self::Error> {
        let mut actions = BTreeMap::new();
        for (id, name) in raw {
            let action = match name.as_deref().map(str::trim) {
                None => ClassAction::Drop,
                Some("") => {
                    return Err(format!(
                        "class {id} has an empty name; use null to drop the class"
                    ))
                }
                Some(IGNORE_NAME) => ClassAction::Ignore,
                Some(other) => ClassAction::Keep(other.to_string()),
            };
            actions.insert(ClassId::new(id), action);
        }
        Ok(Self { actions })
    }
}

impl From<ClassMap> for BTreeMap<u32, Option<String>> {
    fn from(map: ClassMap) -> Self {
        map.actions
            .into_iter()
            .map(|(id, action)| (id.as_u32(), action.voc_name().map(str::to_string)))
            .collect()
    }
}

impl fmt::Display for ClassMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .iter()
            .map(|(id, action)| format!("{id}: {action}"))
            .collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}
