//! Items: the typed, valued units that flow between buildings.
//!
//! An [`Item`] keeps its [`ItemId`] for its whole life. Processing either
//! rewrites the item in place (smelting, forging, washing) or consumes the
//! inputs and creates a fresh item (alloying, crafting). At any moment an
//! item lives in exactly one slot of exactly one building.

use crate::id::ItemId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Resources and forms
// ---------------------------------------------------------------------------

/// Primary materials that can be mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Copper,
    Iron,
    Gold,
}

impl ResourceType {
    /// All resource types, in declaration order.
    pub fn all() -> [ResourceType; 3] {
        [ResourceType::Copper, ResourceType::Iron, ResourceType::Gold]
    }

    /// Value of a freshly mined ore of this resource.
    pub fn base_value(self) -> u32 {
        match self {
            ResourceType::Copper => 1,
            ResourceType::Iron => 2,
            ResourceType::Gold => 3,
        }
    }
}

/// Processing stage of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemForm {
    Ore,
    Ingot,
    Plate,
    Bolt,
    ReinforcedPlate,
}

/// What an item is made of: a single resource or an alloy of two.
///
/// Two items share a material iff they can be combined in a
/// homogeneous recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Material {
    pub primary: ResourceType,
    pub secondary: Option<ResourceType>,
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// A single unit of production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub resource: ResourceType,
    /// Present exactly when the item is an alloy.
    pub secondary_resource: Option<ResourceType>,
    pub form: ItemForm,
    pub value: u32,
    pub is_washed: bool,
}

impl Item {
    /// A freshly mined ore at its resource's base value.
    pub fn ore(id: ItemId, resource: ResourceType) -> Self {
        Self {
            id,
            resource,
            secondary_resource: None,
            form: ItemForm::Ore,
            value: resource.base_value(),
            is_washed: false,
        }
    }

    /// An alloy ingot made from two ingots. Takes the primary resource of
    /// `first`, the primary resource of `second` as its secondary, and the
    /// sum of both values.
    pub fn alloy(id: ItemId, first: &Item, second: &Item) -> Self {
        Self {
            id,
            resource: first.resource,
            secondary_resource: Some(second.resource),
            form: ItemForm::Ingot,
            value: first.value + second.value,
            is_washed: false,
        }
    }

    pub fn is_alloy(&self) -> bool {
        self.secondary_resource.is_some()
    }

    pub fn material(&self) -> Material {
        Material {
            primary: self.resource,
            secondary: self.secondary_resource,
        }
    }
}

/// Value of an ore after washing: `ceil(value * 1.5)`.
pub fn washed_value(value: u32) -> u32 {
    (value * 3).div_ceil(2)
}

// ---------------------------------------------------------------------------
// Id allocation
// ---------------------------------------------------------------------------

/// Hands out item ids. Ids are never reused within one simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemIds {
    next: u64,
}

impl ItemIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> ItemId {
        let id = ItemId(self.next);
        self.next += 1;
        id
    }

    /// The id the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> ItemId {
        ItemId(self.next)
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next
    }
}
