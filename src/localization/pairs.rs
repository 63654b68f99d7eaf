use super::Lead;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Two neighbouring contacts on the same lead, used for bipolar referencing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pair {
    pub first: String,
    pub second: String,
}

impl Pair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

/// Consecutive contacts of a lead, in lead order.
pub fn adjacent_pairs(lead: &Lead) -> Vec<Pair> {
    lead.contacts
        .windows(2)
        .map(|w| Pair::new(w[0].name.clone(), w[1].name.clone()))
        .collect()
}

pub fn midpoint(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        (a[0] + b[0]) / 2.0,
        (a[1] + b[1]) / 2.0,
        (a[2] + b[2]) / 2.0,
    ]
}
