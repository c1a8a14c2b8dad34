//! Order (transaction) entity and the coupon accrual rules.
//! Item snapshots are copied from the catalog when the order is placed and are
//! never touched again, so later product edits do not change an order.

use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use super::product::Product;
use super::user::{Role, User};

/// Every full step of the grand total is worth one coupon.
pub const COUPON_TOTAL_STEP: i64 = 100_000;

/// Orders older than this are reported as closed in the history view.
pub const HISTORY_OPEN_WINDOW_HOURS: i64 = 3;

/// Exclusive price band; an item priced strictly inside it earns one coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouponBand {
    pub floor: i64,
    pub ceiling: i64,
}

impl CouponBand {
    pub fn contains(&self, price: &BigDecimal) -> bool {
        *price > BigDecimal::from(self.floor) && *price < BigDecimal::from(self.ceiling)
    }
}

/// Band for the estimate returned to the buyer when the order is placed.
pub const ORDER_ESTIMATE_BAND: CouponBand = CouponBand {
    floor: 49_999,
    ceiling: 99_999,
};

/// Band for the authoritative count stored when the seller accepts.
pub const ACCEPTANCE_BAND: CouponBand = CouponBand {
    floor: 50_000,
    ceiling: 100_000,
};

/// `floor(grand_total / COUPON_TOTAL_STEP)`; totals are never negative.
pub fn total_bonus(grand_total: &BigDecimal) -> i32 {
    let whole = grand_total.with_scale(0).to_i64().unwrap_or(0).max(0);
    i32::try_from(whole / COUPON_TOTAL_STEP).unwrap_or(i32::MAX)
}

pub fn count_coupons<'a, I>(prices: I, grand_total: &BigDecimal, band: CouponBand) -> i32
where
    I: IntoIterator<Item = &'a BigDecimal>,
{
    let banded = prices.into_iter().filter(|price| band.contains(price)).count();
    i32::try_from(banded)
        .unwrap_or(i32::MAX)
        .saturating_add(total_bonus(grand_total))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TransactionStatus {
    Pending,
    Accepted,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Accepted => "accepted",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Pending => f.write_str("Pending"),
            TransactionStatus::Accepted => f.write_str("Accepted"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(TransactionStatus::Pending),
            "accepted" => Ok(TransactionStatus::Accepted),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ItemSnapshot {
    #[serde(rename = "ID")]
    pub id: i64,
    pub name: String,
    pub description: String,
    #[schema(value_type = String)]
    pub price: BigDecimal,
}

impl From<&Product> for ItemSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Transaction {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "BuyerID")]
    pub buyer_id: i64,
    #[serde(rename = "SellerID")]
    pub seller_id: i64,
    #[schema(value_type = String)]
    pub grand_total: BigDecimal,
    pub status: TransactionStatus,
    pub coupons: i32,
    pub items: Vec<ItemSnapshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Coupons recomputed from the stored snapshots at acceptance time.
    pub fn accepted_coupons(&self) -> i32 {
        count_coupons(
            self.items.iter().map(|item| &item.price),
            &self.grand_total,
            ACCEPTANCE_BAND,
        )
    }
}

/// A transaction listed together with the public identity of both parties.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct TransactionDetail {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub seller: User,
    pub buyer: User,
}

/// Pending order ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub buyer_id: i64,
    pub seller_id: i64,
    pub grand_total: BigDecimal,
    pub items: Vec<ItemSnapshot>,
}

impl NewTransaction {
    /// Snapshots `products` in order and sums their prices.
    pub fn snapshot(buyer_id: i64, seller_id: i64, products: &[Product]) -> Self {
        let items: Vec<ItemSnapshot> = products.iter().map(ItemSnapshot::from).collect();
        let grand_total = items
            .iter()
            .fold(BigDecimal::zero(), |acc, item| acc + &item.price);

        Self {
            buyer_id,
            seller_id,
            grand_total,
            items,
        }
    }

    /// Estimate returned to the buyer; superseded on acceptance.
    pub fn estimated_coupons(&self) -> i32 {
        count_coupons(
            self.items.iter().map(|item| &item.price),
            &self.grand_total,
            ORDER_ESTIMATE_BAND,
        )
    }
}

/// Listing filter. `None` fields are not constrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub buyer_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub status: Option<TransactionStatus>,
}

impl TransactionFilter {
    /// Buyers see what they bought, sellers what they sold.
    pub fn for_party(user_id: i64, role: Role) -> Self {
        match role {
            Role::Buyer => Self {
                buyer_id: Some(user_id),
                ..Self::default()
            },
            Role::Seller => Self {
                seller_id: Some(user_id),
                ..Self::default()
            },
        }
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.buyer_id.map_or(true, |id| transaction.buyer_id == id)
            && self.seller_id.map_or(true, |id| transaction.seller_id == id)
            && self.status.map_or(true, |status| transaction.status == status)
    }
}

/// Presentation-only label of an accepted order in the history view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum HistoryState {
    Open,
    Closed,
}

impl HistoryState {
    pub fn at(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now - created_at > Duration::hours(HISTORY_OPEN_WINDOW_HOURS) {
            HistoryState::Closed
        } else {
            HistoryState::Open
        }
    }
}
