//! # Costing Engine
//!
//! Pure, side-effect-free costing math: weighted-average cost on purchase,
//! cost-of-goods-sold snapshot on sale, quantity-only adjustments.
//!
//! ## Weighted-Average Costing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  How the Average Moves                                  │
//! │                                                                         │
//! │  Tank: 1000 L @ Rs 100                                                 │
//! │       │                                                                 │
//! │       ▼  purchase 500 L @ Rs 110                                        │
//! │  new_avg = (1000·100 + 500·110) / 1500 = 103.33...                     │
//! │       │                                                                 │
//! │       ▼  sell 200 L @ Rs 120                                            │
//! │  cogs_per_unit = 103.33... (snapshot - the average does NOT move)      │
//! │  gross_profit  = (120 − 103.33...) × 200                               │
//! │       │                                                                 │
//! │       ▼  adjustment −3 L (evaporation)                                  │
//! │  quantity only - the average does NOT move                             │
//! │                                                                         │
//! │  ONLY PURCHASES PERTURB THE AVERAGE.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is deterministic over `rust_decimal` values and
//! carries full precision; callers round for display, never for the books.

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Results
// =============================================================================

/// Outcome of applying a purchase to a product's costing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostedPurchase {
    /// Stock after the purchase.
    pub new_stock: Decimal,
    /// Quantity-weighted mean unit cost after the purchase.
    pub new_avg_cost: Money,
    /// `new_stock × new_avg_cost`.
    pub new_stock_value: Money,
}

/// Outcome of applying a sale to a product's costing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostedSale {
    /// Stock after the sale.
    pub new_stock: Decimal,
    /// Cost snapshot per unit sold (the pre-sale average, unchanged).
    pub cogs_per_unit: Money,
    /// `cogs_per_unit × quantity sold`.
    pub cogs_total: Money,
    /// `new_stock × avg_cost` (average itself is untouched by sales).
    pub new_stock_value: Money,
}

// =============================================================================
// Operations
// =============================================================================

/// Derived stock value for a (stock, average cost) pair.
#[inline]
pub fn stock_value(stock: Decimal, avg_cost: Money) -> Money {
    avg_cost * stock
}

/// Applies a purchase of `qty` units at `unit_price` to a product currently
/// holding `stock` units at `avg_cost`.
///
/// ## Math
/// `new_avg = (stock·avg + qty·price) / (stock + qty)` when the result
/// quantity is positive, else `unit_price` (first fill of an empty tank).
///
/// ## Errors
/// - [`CoreError::InvalidQuantity`] when `qty ≤ 0`
/// - [`CoreError::InvalidUnitPrice`] when `unit_price < 0`
pub fn apply_purchase(
    stock: Decimal,
    avg_cost: Money,
    qty: Decimal,
    unit_price: Money,
) -> CoreResult<CostedPurchase> {
    if qty <= Decimal::ZERO {
        return Err(CoreError::InvalidQuantity { quantity: qty });
    }
    if unit_price.is_negative() {
        return Err(CoreError::InvalidUnitPrice { price: unit_price });
    }

    let new_stock = stock + qty;
    let new_avg_cost = if new_stock > Decimal::ZERO {
        let prior_value = avg_cost * stock;
        let incoming_value = unit_price * qty;
        Money::new((prior_value + incoming_value).amount() / new_stock)
    } else {
        unit_price
    };

    Ok(CostedPurchase {
        new_stock,
        new_avg_cost,
        new_stock_value: stock_value(new_stock, new_avg_cost),
    })
}

/// Applies a sale of `qty` units to a product currently holding `stock`
/// units at `avg_cost`.
///
/// The cost of goods sold is the *pre-sale* weighted average; sales never
/// move the average. Selling more than is in the tank is rejected outright,
/// never clamped.
///
/// ## Errors
/// - [`CoreError::InvalidQuantity`] when `qty ≤ 0`
/// - [`CoreError::InsufficientStock`] when `qty > stock`
pub fn apply_sale(stock: Decimal, avg_cost: Money, qty: Decimal) -> CoreResult<CostedSale> {
    if qty <= Decimal::ZERO {
        return Err(CoreError::InvalidQuantity { quantity: qty });
    }
    if qty > stock {
        return Err(CoreError::InsufficientStock {
            available: stock,
            requested: qty,
        });
    }

    let new_stock = stock - qty;
    Ok(CostedSale {
        new_stock,
        cogs_per_unit: avg_cost,
        cogs_total: avg_cost * qty,
        new_stock_value: stock_value(new_stock, avg_cost),
    })
}

/// Applies a signed quantity adjustment (dip-stick correction, spillage,
/// evaporation). The weighted-average cost is left unchanged: adjustments
/// correct quantity, not cost basis.
///
/// ## Errors
/// - [`CoreError::InvalidQuantity`] when `signed_qty == 0`
/// - [`CoreError::InsufficientStock`] when the adjustment would drive the
///   stock negative
pub fn apply_adjustment(stock: Decimal, signed_qty: Decimal) -> CoreResult<Decimal> {
    if signed_qty.is_zero() {
        return Err(CoreError::InvalidQuantity {
            quantity: signed_qty,
        });
    }
    let new_stock = stock + signed_qty;
    if new_stock < Decimal::ZERO {
        return Err(CoreError::InsufficientStock {
            available: stock,
            requested: -signed_qty,
        });
    }
    Ok(new_stock)
}

/// Gross profit on a sale: `(selling_price − cogs_per_unit) × qty`.
#[inline]
pub fn gross_profit(selling_price: Money, cogs_per_unit: Money, qty: Decimal) -> Money {
    (selling_price - cogs_per_unit) * qty
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_first_purchase_sets_average() {
        // Empty tank, buy 1000 L @ Rs 100
        let costed =
            apply_purchase(Decimal::ZERO, Money::zero(), dec("1000"), money("100")).unwrap();
        assert_eq!(costed.new_stock, dec("1000"));
        assert_eq!(costed.new_avg_cost, money("100"));
        assert_eq!(costed.new_stock_value, money("100000"));
    }

    #[test]
    fn test_second_purchase_blends_average() {
        // 1000 L @ Rs 100, buy 500 L @ Rs 110 → 1500 L @ 103.33...
        let costed = apply_purchase(dec("1000"), money("100"), dec("500"), money("110")).unwrap();
        assert_eq!(costed.new_stock, dec("1500"));
        assert_eq!(costed.new_avg_cost.rounded(), money("103.33"));
        // Exact identity: avg × qty reproduces the blended value
        assert_eq!(
            (costed.new_avg_cost * dec("1500")).rounded(),
            money("155000")
        );
    }

    #[test]
    fn test_purchase_rejects_bad_inputs() {
        assert!(matches!(
            apply_purchase(dec("10"), money("100"), Decimal::ZERO, money("5")),
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            apply_purchase(dec("10"), money("100"), dec("-1"), money("5")),
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            apply_purchase(dec("10"), money("100"), dec("1"), money("-5")),
            Err(CoreError::InvalidUnitPrice { .. })
        ));
    }

    #[test]
    fn test_free_stock_purchase_drags_average_down() {
        // unit_price of zero is legal (promotional stock); average dilutes
        let costed = apply_purchase(dec("100"), money("100"), dec("100"), Money::zero()).unwrap();
        assert_eq!(costed.new_avg_cost, money("50"));
    }

    #[test]
    fn test_sale_snapshots_cogs_and_keeps_average() {
        // 1500 L @ 103.33..., sell 200 L @ Rs 120
        let avg = apply_purchase(dec("1000"), money("100"), dec("500"), money("110"))
            .unwrap()
            .new_avg_cost;

        let costed = apply_sale(dec("1500"), avg, dec("200")).unwrap();
        assert_eq!(costed.new_stock, dec("1300"));
        assert_eq!(costed.cogs_per_unit, avg);
        assert_eq!(costed.cogs_per_unit.rounded(), money("103.33"));

        // The sale record snapshots the average rounded to the paisa:
        // gross profit = (120 − 103.33) × 200 = 3334
        let profit = gross_profit(money("120"), costed.cogs_per_unit.rounded(), dec("200"));
        assert_eq!(profit, money("3334"));
    }

    #[test]
    fn test_sale_rejects_overdraw() {
        let err = apply_sale(dec("1300"), money("103.33"), dec("2000")).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                available,
                requested,
            } => {
                assert_eq!(available, dec("1300"));
                assert_eq!(requested, dec("2000"));
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_sale_can_empty_the_tank() {
        let costed = apply_sale(dec("50"), money("100"), dec("50")).unwrap();
        assert_eq!(costed.new_stock, Decimal::ZERO);
        assert_eq!(costed.new_stock_value, Money::zero());
    }

    #[test]
    fn test_adjustment_moves_quantity_only() {
        assert_eq!(apply_adjustment(dec("100"), dec("-3")).unwrap(), dec("97"));
        assert_eq!(apply_adjustment(dec("100"), dec("25")).unwrap(), dec("125"));
    }

    #[test]
    fn test_adjustment_rejects_negative_result() {
        assert!(matches!(
            apply_adjustment(dec("10"), dec("-11")),
            Err(CoreError::InsufficientStock { .. })
        ));
        // exactly to zero is fine
        assert_eq!(apply_adjustment(dec("10"), dec("-10")).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_adjustment_rejects_zero() {
        assert!(matches!(
            apply_adjustment(dec("10"), Decimal::ZERO),
            Err(CoreError::InvalidQuantity { .. })
        ));
    }

    /// Weighted-average law: for any purchase sequence into an empty tank,
    /// the final average equals Σ(qᵢ·pᵢ) / Σqᵢ.
    #[test]
    fn test_weighted_average_law_over_sequences() {
        // Deterministic pseudo-random sequences (LCG), several seeds
        for seed in [1u64, 7, 42, 1234, 99991] {
            let mut state = seed;
            let mut next = || {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                state >> 33
            };

            let mut stock = Decimal::ZERO;
            let mut avg = Money::zero();
            let mut value_sum = Decimal::ZERO;
            let mut qty_sum = Decimal::ZERO;

            for _ in 0..50 {
                // qty in (0, 1000] with 2 dp, price in [0, 500) with 2 dp
                let qty = Decimal::new((next() % 100_000 + 1) as i64, 2);
                let price = Money::new(Decimal::new((next() % 50_000) as i64, 2));

                let costed = apply_purchase(stock, avg, qty, price).unwrap();
                stock = costed.new_stock;
                avg = costed.new_avg_cost;

                value_sum += price.amount() * qty;
                qty_sum += qty;
            }

            let expected = value_sum / qty_sum;
            let diff = (avg.amount() - expected).abs();
            assert!(
                diff < Decimal::new(1, 10),
                "seed {seed}: avg {} vs expected {}",
                avg.amount(),
                expected
            );
        }
    }
}
