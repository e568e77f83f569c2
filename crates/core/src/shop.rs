//! Coin wallet and the skin shop.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skin {
    pub id: &'static str,
    pub name: &'static str,
    pub price: u64,
}

pub const CATALOG: &[Skin] = &[
    Skin { id: "default", name: "Classic Slug", price: 0 },
    Skin { id: "speedy", name: "Speedy Slug", price: 100 },
    Skin { id: "rainbow", name: "Rainbow Slug", price: 250 },
    Skin { id: "golden", name: "Golden Slug", price: 500 },
    Skin { id: "cosmic", name: "Cosmic Slug", price: 1000 },
];

fn skin(id: &str) -> Option<&'static Skin> {
    CATALOG.iter().find(|s| s.id == id)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ShopError {
    #[error("no such skin: {0}")]
    UnknownSkin(String),
    #[error("skin already owned: {0}")]
    AlreadyOwned(String),
    #[error("not enough coins: need {needed}, have {available}")]
    InsufficientCoins { needed: u64, available: u64 },
    #[error("skin not owned: {0}")]
    NotOwned(String),
}

/// A player's coins and skins.
#[derive(Debug, Clone)]
pub struct Locker {
    coins: u64,
    owned: BTreeSet<&'static str>,
    active: &'static str,
}

impl Locker {
    /// Everyone starts with the free classic skin equipped.
    pub fn new() -> Self {
        Locker {
            coins: 0,
            owned: BTreeSet::from(["default"]),
            active: "default",
        }
    }

    pub fn coins(&self) -> u64 {
        self.coins
    }

    pub fn active_skin(&self) -> &'static str {
        self.active
    }

    pub fn owns(&self, id: &str) -> bool {
        self.owned.contains(id)
    }

    /// Bank coins earned during a run.
    pub fn deposit(&mut self, coins: u64) {
        self.coins += coins;
    }

    pub fn purchase(&mut self, id: &str) -> Result<(), ShopError> {
        let skin = skin(id).ok_or_else(|| ShopError::UnknownSkin(id.to_string()))?;
        if self.owned.contains(skin.id) {
            return Err(ShopError::AlreadyOwned(id.to_string()));
        }
        if self.coins < skin.price {
            return Err(ShopError::InsufficientCoins {
                needed: skin.price,
                available: self.coins,
            });
        }
        self.coins -= skin.price;
        self.owned.insert(skin.id);
        Ok(())
    }

    pub fn equip(&mut self, id: &str) -> Result<(), ShopError> {
        let skin = skin(id).ok_or_else(|| ShopError::UnknownSkin(id.to_string()))?;
        if !self.owned.contains(skin.id) {
            return Err(ShopError::NotOwned(id.to_string()));
        }
        self.active = skin.id;
        Ok(())
    }
}

impl Default for Locker {
    fn default() -> Self {
        Self::new()
    }
}
