//! # Shop
//!
//! Merchant stock for shop rooms. Buying costs the marked-up price,
//! selling pays half the item's value.

use crate::{shop_price, ActionResult, EntityId, Item, Player};
use serde::{Deserialize, Serialize};

/// An item for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopEntry {
    pub item: Item,
    pub price: u32,
}

impl ShopEntry {
    /// Lists an item at its standard marked-up price.
    pub fn new(item: Item) -> Self {
        let price = shop_price(&item);
        Self { item, price }
    }
}

/// A merchant's remaining stock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopStock {
    pub entries: Vec<ShopEntry>,
}

impl ShopStock {
    pub fn new(entries: Vec<ShopEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Buys the entry at `index`.
    pub fn buy(&mut self, index: usize, player: &mut Player) -> ActionResult {
        let Some(entry) = self.entries.get(index) else {
            return ActionResult::rejected("The merchant has no such item");
        };
        if player.gold < entry.price {
            return ActionResult::rejected(format!(
                "{} costs {} gold, you have {}",
                entry.item.name, entry.price, player.gold
            ));
        }

        let entry = self.entries.remove(index);
        player.gold -= entry.price;
        let message = format!("Bought {} for {} gold", entry.item.name, entry.price);
        player.add_item(entry.item);
        ActionResult::success(message)
    }
}

/// Sells an inventory item for half its value.
pub fn sell_item(player: &mut Player, item_id: EntityId) -> ActionResult {
    let Some(item) = player.take_item(item_id) else {
        return ActionResult::rejected("Item not found in inventory");
    };
    let price = item.sell_price();
    player.gold += price;
    ActionResult::success(format!("Sold {} for {} gold", item.name, price))
}
