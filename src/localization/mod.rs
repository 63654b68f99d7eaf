pub mod pairs;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

pub use pairs::Pair;

/// Coordinate frames a contact can be located in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CoordinateSpace {
    /// Native MRI space of the subject's T1.
    #[serde(rename = "t1_mri")]
    Scanner,
    /// The subject's own surface reconstruction.
    #[serde(rename = "fs")]
    Surface,
    /// Group-average surface template.
    #[serde(rename = "fsaverage")]
    SurfaceAverage,
}

impl CoordinateSpace {
    pub fn label(&self) -> &'static str {
        match self {
            CoordinateSpace::Scanner => "t1_mri",
            CoordinateSpace::Surface => "fs",
            CoordinateSpace::SurfaceAverage => "fsaverage",
        }
    }
}

impl fmt::Display for CoordinateSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateType {
    #[default]
    Raw,
    Corrected,
}

impl CoordinateType {
    pub fn label(&self) -> &'static str {
        match self {
            CoordinateType::Raw => "raw",
            CoordinateType::Corrected => "corrected",
        }
    }
}

impl fmt::Display for CoordinateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of writing a contact coordinate.
///
/// An unknown contact is an expected outcome of ingesting external files,
/// so it is a variant here rather than an error.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Written,
    UnknownContact,
}

#[derive(Debug, Error, PartialEq)]
pub enum LocalizationError {
    #[error("unknown lead '{0}'")]
    UnknownLead(String),
    #[error("contact '{contact}' already belongs to lead '{lead}'")]
    DuplicateContact { contact: String, lead: String },
}

/// Read/write surface of the contact localization record.
///
/// Components receive the store as an explicit `&mut` dependency; nothing
/// reaches it through global state.
pub trait LocalizationStore {
    fn set_contact_coordinate(
        &mut self,
        space: CoordinateSpace,
        contact: &str,
        coordinate: [f64; 3],
        kind: CoordinateType,
    ) -> SetOutcome;

    fn get_contact_coordinate(
        &self,
        space: CoordinateSpace,
        contact: &str,
        kind: CoordinateType,
    ) -> Option<[f64; 3]>;

    /// Contact names, in lead order then contact order.
    fn contacts(&self) -> Vec<String>;

    fn lead_names(&self) -> Vec<String>;

    fn pairs(&self, leads: &[String]) -> Result<Vec<Pair>, LocalizationError>;

    /// Recomputes and stores coordinates for `pairs` in `space`.
    ///
    /// Returns the pairs that received a coordinate together with it; a pair
    /// missing either contact coordinate is left without one.
    fn pair_coordinates(
        &mut self,
        space: CoordinateSpace,
        pairs: &[Pair],
        kind: CoordinateType,
    ) -> Vec<(Pair, [f64; 3])>;
}

/// Coordinates of a single contact or pair, keyed by space then type.
pub type CoordinateMap = BTreeMap<CoordinateSpace, BTreeMap<CoordinateType, [f64; 3]>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    #[serde(default)]
    pub coordinate_spaces: CoordinateMap,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            coordinate_spaces: CoordinateMap::new(),
        }
    }

    pub fn coordinate(&self, space: CoordinateSpace, kind: CoordinateType) -> Option<[f64; 3]> {
        self.coordinate_spaces
            .get(&space)
            .and_then(|by_type| by_type.get(&kind))
            .copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub name: String,
    /// Lead type tag from the implant record ("D" depth, "S" strip, "G" grid).
    #[serde(rename = "type", default)]
    pub lead_type: String,
    pub contacts: Vec<Contact>,
}

/// In-memory localization record for one subject.
#[derive(Debug, Clone, Default)]
pub struct Localization {
    leads: Vec<Lead>,
    // contact name -> (lead index, contact index)
    index: HashMap<String, (usize, usize)>,
    pair_coordinates: BTreeMap<Pair, CoordinateMap>,
}

impl Localization {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_leads(leads: Vec<Lead>) -> Result<Self, LocalizationError> {
        let mut localization = Self::new();
        for lead in leads {
            localization.add_lead(lead)?;
        }
        Ok(localization)
    }

    pub fn add_lead(&mut self, lead: Lead) -> Result<(), LocalizationError> {
        let lead_idx = self.leads.len();
        let mut added: HashMap<String, (usize, usize)> = HashMap::new();
        for (contact_idx, contact) in lead.contacts.iter().enumerate() {
            let owner = match self.index.get(&contact.name) {
                Some(&(other, _)) => Some(self.leads[other].name.clone()),
                None if added.contains_key(&contact.name) => Some(lead.name.clone()),
                None => None,
            };
            if let Some(lead) = owner {
                return Err(LocalizationError::DuplicateContact {
                    contact: contact.name.clone(),
                    lead,
                });
            }
            added.insert(contact.name.clone(), (lead_idx, contact_idx));
        }
        self.index.extend(added);
        self.leads.push(lead);
        Ok(())
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn lead(&self, name: &str) -> Option<&Lead> {
        self.leads.iter().find(|l| l.name == name)
    }

    pub fn contact(&self, name: &str) -> Option<&Contact> {
        self.index
            .get(name)
            .map(|&(l, c)| &self.leads[l].contacts[c])
    }

    pub fn pair_coordinate(
        &self,
        pair: &Pair,
        space: CoordinateSpace,
        kind: CoordinateType,
    ) -> Option<[f64; 3]> {
        self.pair_coordinates
            .get(pair)
            .and_then(|spaces| spaces.get(&space))
            .and_then(|by_type| by_type.get(&kind))
            .copied()
    }

    pub fn pair_coordinate_map(&self, pair: &Pair) -> Option<&CoordinateMap> {
        self.pair_coordinates.get(pair)
    }
}

impl LocalizationStore for Localization {
    fn set_contact_coordinate(
        &mut self,
        space: CoordinateSpace,
        contact: &str,
        coordinate: [f64; 3],
        kind: CoordinateType,
    ) -> SetOutcome {
        let Some(&(l, c)) = self.index.get(contact) else {
            return SetOutcome::UnknownContact;
        };
        self.leads[l].contacts[c]
            .coordinate_spaces
            .entry(space)
            .or_default()
            .insert(kind, coordinate);
        SetOutcome::Written
    }

    fn get_contact_coordinate(
        &self,
        space: CoordinateSpace,
        contact: &str,
        kind: CoordinateType,
    ) -> Option<[f64; 3]> {
        self.contact(contact)
            .and_then(|c| c.coordinate(space, kind))
    }

    fn contacts(&self) -> Vec<String> {
        self.leads
            .iter()
            .flat_map(|lead| lead.contacts.iter().map(|c| c.name.clone()))
            .collect()
    }

    fn lead_names(&self) -> Vec<String> {
        self.leads.iter().map(|l| l.name.clone()).collect()
    }

    fn pairs(&self, leads: &[String]) -> Result<Vec<Pair>, LocalizationError> {
        let mut all = Vec::new();
        for name in leads {
            let lead = self
                .lead(name)
                .ok_or_else(|| LocalizationError::UnknownLead(name.clone()))?;
            all.extend(pairs::adjacent_pairs(lead));
        }
        Ok(all)
    }

    fn pair_coordinates(
        &mut self,
        space: CoordinateSpace,
        pairs: &[Pair],
        kind: CoordinateType,
    ) -> Vec<(Pair, [f64; 3])> {
        let mut computed = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let first = self.get_contact_coordinate(space, &pair.first, kind);
            let second = self.get_contact_coordinate(space, &pair.second, kind);
            let slot = self.pair_coordinates.entry(pair.clone()).or_default();
            match (first, second) {
                (Some(a), Some(b)) => {
                    let mid = pairs::midpoint(a, b);
                    slot.entry(space).or_default().insert(kind, mid);
                    computed.push((pair.clone(), mid));
                }
                _ => {
                    // stale values from an earlier pass must not survive
                    if let Some(by_type) = slot.get_mut(&space) {
                        by_type.remove(&kind);
                    }
                    tracing::debug!("Pair {} has no {} {} coordinate", pair, space, kind);
                }
            }
        }
        computed
    }
}
