use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type BatchId = u64;

/// Identifies one unit of presentable/computable work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemAddress {
    category: String,
    item_name: String,
}

impl ItemAddress {
    pub fn new(category: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            item_name: item_name.into(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    /// Human readable store key, `C_{category}--I_{item_name}`.
    pub fn store_key(&self) -> String {
        format!("C_{}--I_{}", self.category, self.item_name)
    }
}

impl fmt::Display for ItemAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.item_name)
    }
}

/// A batch of addresses that still need computation.
///
/// Construction drops duplicate addresses, keeping the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputationPlan {
    batch_id: BatchId,
    addresses: Vec<ItemAddress>,
}

impl ComputationPlan {
    pub fn new(batch_id: BatchId, addresses: impl IntoIterator<Item = ItemAddress>) -> Self {
        Self {
            batch_id,
            addresses: dedupe(addresses),
        }
    }

    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    pub fn addresses(&self) -> &[ItemAddress] {
        &self.addresses
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Addresses completed by one batch, in completion order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComputedResult {
    pub batch_id: BatchId,
    pub addresses: Vec<ItemAddress>,
}

impl ComputedResult {
    pub fn new(batch_id: BatchId) -> Self {
        Self {
            batch_id,
            addresses: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextColor {
    #[default]
    Black,
    Red,
    Blue,
}

impl TextColor {
    pub const ALL: [TextColor; 3] = [TextColor::Black, TextColor::Red, TextColor::Blue];

    pub fn as_str(self) -> &'static str {
        match self {
            TextColor::Black => "black",
            TextColor::Red => "red",
            TextColor::Blue => "blue",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|color| color.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

/// What the presentation collaborator should show.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PresentationConfig {
    pub text_color: TextColor,
    pub addresses: Vec<ItemAddress>,
}

/// Snapshot taken by the polling reconciler.
///
/// Equality only looks at the missing addresses, so two ticks that observe the
/// same store state compare equal regardless of which plan produced them.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct ResultPollingState {
    pub compute_timestamp: BatchId,
    pub missing: Vec<ItemAddress>,
}

impl PartialEq for ResultPollingState {
    fn eq(&self, other: &Self) -> bool {
        self.missing == other.missing
    }
}

pub(crate) fn dedupe(addresses: impl IntoIterator<Item = ItemAddress>) -> Vec<ItemAddress> {
    let mut seen = HashSet::new();
    addresses
        .into_iter()
        .filter(|addr| seen.insert(addr.clone()))
        .collect()
}
