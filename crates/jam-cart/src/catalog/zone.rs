//! Delivery zones.

use crate::ids::ZoneId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A delivery zone the marketplace ships to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    /// Flat shipping fee for the zone.
    pub shipping_fee: Money,
    pub active: bool,
}
