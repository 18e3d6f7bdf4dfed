//! Staticness observer registry.
//!
//! Explicit subscribe/unsubscribe bookkeeping for "vehicle became static"
//! notifications. The session dispatches each change only to the units
//! that are currently subscribed to that vehicle.

use std::collections::HashMap;

use hecs::Entity;

use crate::host::{StaticChangeSource, SubscriptionId};

#[derive(Debug, Default)]
pub struct StaticObservers {
    next_id: u64,
    by_vehicle: HashMap<Entity, Vec<(SubscriptionId, Entity)>>,
}

impl StaticObservers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Units subscribed to a vehicle, in subscription order.
    pub fn subscribers(&self, vehicle: Entity) -> Vec<Entity> {
        self.by_vehicle
            .get(&vehicle)
            .map(|subs| subs.iter().map(|(_, unit)| *unit).collect())
            .unwrap_or_default()
    }

    /// Total live subscriptions.
    pub fn len(&self) -> usize {
        self.by_vehicle.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every subscription on a vehicle, returning how many were removed.
    pub fn clear_vehicle(&mut self, vehicle: Entity) -> usize {
        self.by_vehicle.remove(&vehicle).map_or(0, |subs| subs.len())
    }
}

impl StaticChangeSource for StaticObservers {
    fn subscribe(&mut self, vehicle: Entity, subscriber: Entity) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId::new(self.next_id);
        self.by_vehicle
            .entry(vehicle)
            .or_default()
            .push((id, subscriber));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let mut emptied = None;
        let mut removed = false;
        for (vehicle, subs) in self.by_vehicle.iter_mut() {
            if let Some(pos) = subs.iter().position(|(sub, _)| *sub == id) {
                subs.remove(pos);
                removed = true;
                if subs.is_empty() {
                    emptied = Some(*vehicle);
                }
                break;
            }
        }
        if let Some(vehicle) = emptied {
            self.by_vehicle.remove(&vehicle);
        }
        removed
    }
}
