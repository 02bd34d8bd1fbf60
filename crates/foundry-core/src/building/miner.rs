use super::TickContext;
use crate::event::Event;
use crate::fixed::Fixed64;
use crate::item::{Item, ResourceType};
use serde::{Deserialize, Serialize};

/// Extracts ore from the resource node under it. Never accepts items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Miner {
    pub(crate) resource: ResourceType,
    pub(crate) timer: Fixed64,
}

impl Miner {
    pub(crate) fn new(resource: ResourceType) -> Self {
        Self {
            resource,
            timer: Fixed64::ZERO,
        }
    }

    /// The resource of the node this miner is bound to.
    pub fn resource(&self) -> ResourceType {
        self.resource
    }

    pub fn timer(&self) -> Fixed64 {
        self.timer
    }

    /// Mining only runs while the output slot is empty.
    pub(crate) fn advance(&mut self, output: &mut Option<Item>, ctx: &mut TickContext<'_>) {
        if output.is_some() {
            return;
        }
        self.timer = self.timer.saturating_add(ctx.dt);
        if self.timer < ctx.config.mine_time {
            return;
        }
        self.timer = Fixed64::ZERO;
        let ore = Item::ore(ctx.item_ids.next_id(), self.resource);
        ctx.events.emit(Event::ItemCreated {
            item: ore.id,
            position: ctx.position,
            tick: ctx.tick,
        });
        *output = Some(ore);
    }
}
