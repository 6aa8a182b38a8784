//! Gold economy: sell prices and the per-map merchant.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::*;
use crate::equipment::{Item, RarityTable};
use crate::error::ActionRejected;
use crate::loot::ItemGenerator;
use crate::player::PlayerState;

/// Gold paid for an item.
///
/// Falls back from the rarity budget, to half the merchant price, to half
/// of [`FALLBACK_ITEM_VALUE`].
pub fn sell_price(item: &Item, rarities: &RarityTable) -> u64 {
    if let Some(config) = rarities.get(item.rarity) {
        return u64::from(config.budget) * 2 / 2;
    }
    match item.price {
        Some(price) => price / 2,
        None => FALLBACK_ITEM_VALUE / 2,
    }
}

/// Asking price for merchant stock
pub fn merchant_price(item: &Item, rarities: &RarityTable) -> u64 {
    let budget = rarities
        .get(item.rarity)
        .map(|c| u64::from(c.budget))
        .unwrap_or(FALLBACK_ITEM_VALUE);
    budget * 4 + u64::from(item.level) * 5
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    pub stock: Vec<Item>,
}

impl Merchant {
    /// Fresh stock for a map, ids drawn from `next_id`
    pub fn stocked<R: Rng + ?Sized>(
        generator: &ItemGenerator<'_>,
        rarities: &RarityTable,
        player_level: u32,
        mut next_id: impl FnMut() -> u64,
        rng: &mut R,
    ) -> Self {
        let stock = (0..MERCHANT_STOCK)
            .map(|_| {
                let mut item = generator.generate(next_id(), player_level, 0.0, None, rng);
                item.price = Some(merchant_price(&item, rarities));
                item
            })
            .collect();
        Self { stock }
    }

    /// Move stock item `index` into the player's inventory for its price
    pub fn buy_item(&mut self, index: usize, player: &mut PlayerState) -> Result<usize, ActionRejected> {
        let item = self.stock.get(index).ok_or(ActionRejected::NoSuchStock(index))?;
        let price = item.price.unwrap_or(FALLBACK_ITEM_VALUE);
        if player.gold < price {
            return Err(ActionRejected::NotEnoughGold {
                needed: price,
                available: player.gold,
            });
        }
        if player.inventory.is_full() {
            return Err(ActionRejected::InventoryFull);
        }
        let item = self.stock.remove(index);
        let name = item.name.clone();
        let slot = player
            .inventory
            .add(item)
            .map_err(|_| ActionRejected::InventoryFull)?;
        player.gold -= price;
        info!(item = %name, price, "item bought");
        Ok(slot)
    }

    /// Sell inventory item `index`. The merchant restocks it at its asking price.
    pub fn sell_item(
        &mut self,
        index: usize,
        player: &mut PlayerState,
        rarities: &RarityTable,
    ) -> Result<u64, ActionRejected> {
        let mut item = player
            .inventory
            .remove(index)
            .ok_or(ActionRejected::NoSuchItem(index))?;
        let gold = sell_price(&item, rarities);
        player.gold += gold;
        info!(item = %item.name, gold, "item sold");
        item.price = Some(merchant_price(&item, rarities));
        self.stock.push(item);
        Ok(gold)
    }
}
