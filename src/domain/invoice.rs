//! Invoice arithmetic and side effects
//!
//! Everything in this module is pure. Handlers load the current state, price
//! the requested lines here, ask [`InvoiceEffects::between`] what has to move,
//! and apply the result inside a single transaction.
//!
//! Three aggregates depend on invoices:
//! - each line's `total` (GST-inclusive, rounded to paise)
//! - each item's `stock` (reduced by every live line of that item)
//! - each party's `balance` (increased by every live invoice billed to it)

use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::DomainError;
use super::values::{round_money, Money, Percent, Quantity};

/// Invoice numbers are zero-padded to this width
const INVOICE_NO_WIDTH: usize = 4;

/// One line as requested by the client.
///
/// Missing `rate`/`cgst`/`sgst` fall back to the item's catalog values; a
/// missing quantity counts as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    #[serde(alias = "itemId")]
    pub item_id: Uuid,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub rate: Option<Decimal>,
    #[serde(default)]
    pub cgst: Option<Decimal>,
    #[serde(default)]
    pub sgst: Option<Decimal>,
}

impl LineRequest {
    pub fn new(item_id: Uuid, quantity: Decimal) -> Self {
        Self {
            item_id,
            quantity: Some(quantity),
            rate: None,
            cgst: None,
            sgst: None,
        }
    }

    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_taxes(mut self, cgst: Decimal, sgst: Decimal) -> Self {
        self.cgst = Some(cgst);
        self.sgst = Some(sgst);
        self
    }
}

/// Catalog defaults for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogPrice {
    pub item_id: Uuid,
    pub unit_price: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
}

/// A line with every value resolved and its total computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PricedLine {
    pub item_id: Uuid,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub total: Decimal,
}

/// Distinct item ids in first-seen order.
pub fn unique_item_ids(lines: &[LineRequest]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    lines
        .iter()
        .map(|line| line.item_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Price a single line against its catalog entry.
///
/// `total = round2(q * r + q * r * (cgst + sgst) / 100)`
pub fn price_line(request: &LineRequest, catalog: &CatalogPrice) -> Result<PricedLine, DomainError> {
    let quantity = Quantity::new(request.quantity.unwrap_or(Decimal::ZERO))?;
    let rate = Money::new("rate", request.rate.unwrap_or(catalog.unit_price))?;
    let cgst = Percent::new("cgst", request.cgst.unwrap_or(catalog.cgst))?;
    let sgst = Percent::new("sgst", request.sgst.unwrap_or(catalog.sgst))?;

    let base = quantity.value() * rate.value();
    let gst = base * (cgst.value() + sgst.value()) / Decimal::ONE_HUNDRED;
    let total = Money::new("line total", round_money(base + gst))?;

    Ok(PricedLine {
        item_id: request.item_id,
        quantity: quantity.value(),
        rate: rate.value(),
        cgst: cgst.value(),
        sgst: sgst.value(),
        total: total.value(),
    })
}

/// Price every requested line.
///
/// Fails with [`DomainError::UnknownItems`] naming every id that has no
/// catalog entry, before any line is priced.
pub fn price_lines(
    requests: &[LineRequest],
    catalog: &HashMap<Uuid, CatalogPrice>,
) -> Result<Vec<PricedLine>, DomainError> {
    let missing: Vec<Uuid> = unique_item_ids(requests)
        .into_iter()
        .filter(|id| !catalog.contains_key(id))
        .collect();
    if !missing.is_empty() {
        return Err(DomainError::unknown_items(missing));
    }

    requests
        .iter()
        .map(|request| {
            let price = catalog
                .get(&request.item_id)
                .ok_or_else(|| DomainError::unknown_items(vec![request.item_id]))?;
            price_line(request, price)
        })
        .collect()
}

/// Sum of the already-rounded line totals.
pub fn invoice_total(lines: &[PricedLine]) -> Result<Decimal, DomainError> {
    let total: Decimal = lines.iter().map(|line| line.total).sum();
    Ok(Money::new("invoice total", total)?.value())
}

/// Number for the next invoice of an owner, given their latest one.
///
/// `None -> "0001"`, `"0041" -> "0042"`, `"9999" -> "10000"`.
pub fn next_invoice_no(last: Option<&str>) -> Result<String, DomainError> {
    let next = match last {
        None => 1,
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| DomainError::InvalidInvoiceNumber(raw.to_string()))?,
    };

    Ok(format!("{:0width$}", next, width = INVOICE_NO_WIDTH))
}

/// The parts of an invoice that other aggregates depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceSnapshot {
    pub party_id: Uuid,
    pub total: Decimal,
    /// `(item_id, quantity)` per line; an item may appear more than once
    pub quantities: Vec<(Uuid, Decimal)>,
}

impl InvoiceSnapshot {
    pub fn new(party_id: Uuid, total: Decimal, quantities: Vec<(Uuid, Decimal)>) -> Self {
        Self {
            party_id,
            total,
            quantities,
        }
    }

    /// Snapshot of a freshly priced invoice.
    pub fn from_lines(party_id: Uuid, lines: &[PricedLine]) -> Result<Self, DomainError> {
        Ok(Self {
            party_id,
            total: invoice_total(lines)?,
            quantities: lines.iter().map(|l| (l.item_id, l.quantity)).collect(),
        })
    }
}

/// Signed change to an item's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockMovement {
    pub item_id: Uuid,
    pub delta: Decimal,
}

/// Signed change to a party's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceMovement {
    pub party_id: Uuid,
    pub delta: Decimal,
}

/// Everything that must change outside the invoice rows themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceEffects {
    /// Ordered by item id so concurrent writers lock rows in the same order
    pub stock: Vec<StockMovement>,
    /// Ordered by party id for the same reason
    pub balances: Vec<BalanceMovement>,
}

impl InvoiceEffects {
    /// Effects of moving an invoice from `previous` to `next`.
    ///
    /// `None -> Some` is a creation, `Some -> None` a deletion, `Some -> Some`
    /// an update. Zero movements are dropped.
    pub fn between(previous: Option<&InvoiceSnapshot>, next: Option<&InvoiceSnapshot>) -> Self {
        Self {
            stock: stock_movements(previous, next),
            balances: balance_movements(previous, next),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stock.is_empty() && self.balances.is_empty()
    }

    /// Net stock change for one item.
    pub fn stock_delta(&self, item_id: Uuid) -> Decimal {
        self.stock
            .iter()
            .filter(|m| m.item_id == item_id)
            .map(|m| m.delta)
            .sum()
    }

    /// Net balance change for one party.
    pub fn balance_delta(&self, party_id: Uuid) -> Decimal {
        self.balances
            .iter()
            .filter(|m| m.party_id == party_id)
            .map(|m| m.delta)
            .sum()
    }
}

fn stock_movements(
    previous: Option<&InvoiceSnapshot>,
    next: Option<&InvoiceSnapshot>,
) -> Vec<StockMovement> {
    let mut deltas: BTreeMap<Uuid, Decimal> = BTreeMap::new();

    // Quantities on the old invoice go back on the shelf...
    if let Some(previous) = previous {
        for (item_id, quantity) in &previous.quantities {
            *deltas.entry(*item_id).or_default() += *quantity;
        }
    }
    // ...and quantities on the new one leave it.
    if let Some(next) = next {
        for (item_id, quantity) in &next.quantities {
            *deltas.entry(*item_id).or_default() -= *quantity;
        }
    }

    deltas
        .into_iter()
        .filter(|(_, delta)| !delta.is_zero())
        .map(|(item_id, delta)| StockMovement { item_id, delta })
        .collect()
}

fn balance_movements(
    previous: Option<&InvoiceSnapshot>,
    next: Option<&InvoiceSnapshot>,
) -> Vec<BalanceMovement> {
    let movements = match (previous, next) {
        (None, None) => Vec::new(),
        (None, Some(next)) => vec![(next.party_id, next.total)],
        (Some(previous), None) => vec![(previous.party_id, -previous.total)],
        (Some(previous), Some(next)) if previous.party_id == next.party_id => {
            vec![(next.party_id, next.total - previous.total)]
        }
        (Some(previous), Some(next)) => vec![
            (previous.party_id, -previous.total),
            (next.party_id, next.total),
        ],
    };

    let mut movements: Vec<BalanceMovement> = movements
        .into_iter()
        .filter(|(_, delta)| !delta.is_zero())
        .map(|(party_id, delta)| BalanceMovement { party_id, delta })
        .collect();
    movements.sort_by_key(|m| m.party_id);
    movements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::values::ValueError;
    use rust_decimal_macros::dec;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn catalog(entries: &[(u128, Decimal, Decimal, Decimal)]) -> HashMap<Uuid, CatalogPrice> {
        entries
            .iter()
            .map(|(n, unit_price, cgst, sgst)| {
                (
                    id(*n),
                    CatalogPrice {
                        item_id: id(*n),
                        unit_price: *unit_price,
                        cgst: *cgst,
                        sgst: *sgst,
                    },
                )
            })
            .collect()
    }

    // =========================================================================
    // Pricing
    // =========================================================================

    #[test]
    fn test_price_line_uses_catalog_defaults() {
        let prices = catalog(&[(1, dec!(100), dec!(9), dec!(9))]);
        let line = price_line(&LineRequest::new(id(1), dec!(2)), &prices[&id(1)]).unwrap();

        assert_eq!(line.rate, dec!(100));
        assert_eq!(line.cgst, dec!(9));
        assert_eq!(line.sgst, dec!(9));
        // 200 + 18% GST
        assert_eq!(line.total, dec!(236.00));
    }

    #[test]
    fn test_price_line_overrides_win() {
        let prices = catalog(&[(1, dec!(100), dec!(9), dec!(9))]);
        let request = LineRequest::new(id(1), dec!(3))
            .with_rate(dec!(50))
            .with_taxes(dec!(2.5), dec!(2.5));

        let line = price_line(&request, &prices[&id(1)]).unwrap();

        assert_eq!(line.rate, dec!(50));
        assert_eq!(line.total, dec!(157.50));
    }

    #[test]
    fn test_price_line_rounds_half_away_from_zero() {
        // 1 * 0.05 * 1.10 = 0.055 -> 0.06
        let prices = catalog(&[(1, dec!(0.05), dec!(5), dec!(5))]);
        let line = price_line(&LineRequest::new(id(1), dec!(1)), &prices[&id(1)]).unwrap();
        assert_eq!(line.total, dec!(0.06));
    }

    #[test]
    fn test_missing_quantity_counts_as_zero() {
        let prices = catalog(&[(1, dec!(10), dec!(0), dec!(0))]);
        let request = LineRequest {
            item_id: id(1),
            quantity: None,
            rate: None,
            cgst: None,
            sgst: None,
        };

        let line = price_line(&request, &prices[&id(1)]).unwrap();
        assert_eq!(line.quantity, Decimal::ZERO);
        assert_eq!(line.total, Decimal::ZERO);
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let prices = catalog(&[(1, dec!(10), dec!(0), dec!(0))]);
        let err = price_line(&LineRequest::new(id(1), dec!(-1)), &prices[&id(1)]).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidValue(ValueError::Negative { field: "quantity", .. })
        ));
    }

    #[test]
    fn test_price_line_accepts_fine_grained_rates() {
        let prices = catalog(&[(1, dec!(10), dec!(9), dec!(9))]);
        let request = LineRequest::new(id(1), dec!(3)).with_rate(dec!(33.333));

        let line = price_line(&request, &prices[&id(1)]).unwrap();

        assert_eq!(line.rate, dec!(33.333));
        // 99.999 * 1.18 = 117.99882
        assert_eq!(line.total, dec!(118.00));
    }

    #[test]
    fn test_price_line_accepts_fractional_quantities_and_taxes() {
        let prices = catalog(&[(1, dec!(200), dec!(0), dec!(0))]);
        let request = LineRequest::new(id(1), dec!(0.0125)).with_taxes(dec!(2.125), dec!(2.125));

        let line = price_line(&request, &prices[&id(1)]).unwrap();

        // 2.5 + 4.25% = 2.60625
        assert_eq!(line.quantity, dec!(0.0125));
        assert_eq!(line.total, dec!(2.61));
    }

    #[test]
    fn test_tax_above_hundred_rejected() {
        let prices = catalog(&[(1, dec!(10), dec!(0), dec!(0))]);
        let request = LineRequest::new(id(1), dec!(1)).with_taxes(dec!(101), dec!(0));
        assert!(price_line(&request, &prices[&id(1)]).is_err());
    }

    #[test]
    fn test_price_lines_reports_every_missing_item() {
        let prices = catalog(&[(1, dec!(10), dec!(0), dec!(0))]);
        let requests = vec![
            LineRequest::new(id(3), dec!(1)),
            LineRequest::new(id(1), dec!(1)),
            LineRequest::new(id(2), dec!(1)),
            LineRequest::new(id(3), dec!(1)),
        ];

        let err = price_lines(&requests, &prices).unwrap_err();
        assert_eq!(
            err,
            DomainError::UnknownItems {
                missing: vec![id(2), id(3)]
            }
        );
    }

    #[test]
    fn test_price_lines_allows_repeated_items() {
        let prices = catalog(&[(1, dec!(10), dec!(0), dec!(0))]);
        let requests = vec![
            LineRequest::new(id(1), dec!(1)),
            LineRequest::new(id(1), dec!(2)),
        ];

        let lines = price_lines(&requests, &prices).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(invoice_total(&lines).unwrap(), dec!(30));
    }

    #[test]
    fn test_invoice_total_sums_rounded_lines() {
        // Each line rounds 0.055 up to 0.06, so the invoice is 0.12, not round(0.11)
        let prices = catalog(&[(1, dec!(0.05), dec!(5), dec!(5))]);
        let requests = vec![
            LineRequest::new(id(1), dec!(1)),
            LineRequest::new(id(1), dec!(1)),
        ];

        let lines = price_lines(&requests, &prices).unwrap();
        assert_eq!(invoice_total(&lines).unwrap(), dec!(0.12));
    }

    #[test]
    fn test_unique_item_ids_keeps_first_seen_order() {
        let requests = vec![
            LineRequest::new(id(2), dec!(1)),
            LineRequest::new(id(1), dec!(1)),
            LineRequest::new(id(2), dec!(5)),
        ];
        assert_eq!(unique_item_ids(&requests), vec![id(2), id(1)]);
    }

    #[test]
    fn test_line_request_accepts_camel_case_item_id() {
        let json = r#"{"itemId": "00000000-0000-0000-0000-000000000001", "quantity": "1.5"}"#;
        let request: LineRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.item_id, id(1));
        assert_eq!(request.quantity, Some(dec!(1.5)));
    }

    #[test]
    fn test_line_request_deserialize_partial() {
        let json = r#"{"item_id": "00000000-0000-0000-0000-000000000001", "quantity": 2}"#;
        let request: LineRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.quantity, Some(dec!(2)));
        assert!(request.rate.is_none());
        assert!(request.cgst.is_none());
    }

    // =========================================================================
    // Invoice numbers
    // =========================================================================

    #[test]
    fn test_first_invoice_number() {
        assert_eq!(next_invoice_no(None).unwrap(), "0001");
    }

    #[test]
    fn test_next_invoice_number_is_padded() {
        assert_eq!(next_invoice_no(Some("0041")).unwrap(), "0042");
        assert_eq!(next_invoice_no(Some("0999")).unwrap(), "1000");
    }

    #[test]
    fn test_invoice_number_grows_past_width() {
        assert_eq!(next_invoice_no(Some("9999")).unwrap(), "10000");
    }

    #[test]
    fn test_unparsable_invoice_number() {
        assert!(matches!(
            next_invoice_no(Some("INV-7")),
            Err(DomainError::InvalidInvoiceNumber(_))
        ));
    }

    // =========================================================================
    // Effects
    // =========================================================================

    fn snapshot(party: u128, total: Decimal, quantities: &[(u128, Decimal)]) -> InvoiceSnapshot {
        InvoiceSnapshot::new(
            id(party),
            total,
            quantities.iter().map(|(item, q)| (id(*item), *q)).collect(),
        )
    }

    #[test]
    fn test_create_consumes_stock_and_charges_party() {
        let new = snapshot(100, dec!(236), &[(1, dec!(2)), (2, dec!(1)), (1, dec!(3))]);
        let effects = InvoiceEffects::between(None, Some(&new));

        assert_eq!(
            effects.stock,
            vec![
                StockMovement { item_id: id(1), delta: dec!(-5) },
                StockMovement { item_id: id(2), delta: dec!(-1) },
            ]
        );
        assert_eq!(
            effects.balances,
            vec![BalanceMovement { party_id: id(100), delta: dec!(236) }]
        );
    }

    #[test]
    fn test_delete_restores_stock_and_reverses_balance() {
        let old = snapshot(100, dec!(50), &[(1, dec!(4))]);
        let effects = InvoiceEffects::between(Some(&old), None);

        assert_eq!(effects.stock_delta(id(1)), dec!(4));
        assert_eq!(effects.balance_delta(id(100)), dec!(-50));
    }

    #[test]
    fn test_update_diffs_quantities() {
        let old = snapshot(100, dec!(80), &[(1, dec!(5)), (2, dec!(2))]);
        let new = snapshot(100, dec!(95), &[(1, dec!(3)), (3, dec!(1))]);
        let effects = InvoiceEffects::between(Some(&old), Some(&new));

        // Sold 2 fewer of item 1, dropped item 2, added item 3
        assert_eq!(effects.stock_delta(id(1)), dec!(2));
        assert_eq!(effects.stock_delta(id(2)), dec!(2));
        assert_eq!(effects.stock_delta(id(3)), dec!(-1));
        assert_eq!(
            effects.balances,
            vec![BalanceMovement { party_id: id(100), delta: dec!(15) }]
        );
    }

    #[test]
    fn test_unchanged_update_has_no_effects() {
        let old = snapshot(100, dec!(80), &[(1, dec!(5))]);
        let effects = InvoiceEffects::between(Some(&old), Some(&old.clone()));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_update_merges_split_lines() {
        let old = snapshot(100, dec!(30), &[(1, dec!(3))]);
        let new = snapshot(100, dec!(30), &[(1, dec!(1)), (1, dec!(2))]);
        let effects = InvoiceEffects::between(Some(&old), Some(&new));
        assert!(effects.stock.is_empty());
    }

    #[test]
    fn test_party_change_moves_full_amounts() {
        let old = snapshot(100, dec!(80), &[(1, dec!(1))]);
        let new = snapshot(200, dec!(95), &[(1, dec!(1))]);
        let effects = InvoiceEffects::between(Some(&old), Some(&new));

        assert_eq!(
            effects.balances,
            vec![
                BalanceMovement { party_id: id(100), delta: dec!(-80) },
                BalanceMovement { party_id: id(200), delta: dec!(95) },
            ]
        );
        assert!(effects.stock.is_empty());
    }

    #[test]
    fn test_party_change_orders_balances_by_party_id() {
        let old = snapshot(200, dec!(80), &[(1, dec!(1))]);
        let new = snapshot(100, dec!(95), &[(1, dec!(1))]);

        let forward = InvoiceEffects::between(Some(&old), Some(&new));
        let back = InvoiceEffects::between(Some(&new), Some(&old));

        assert_eq!(
            forward.balances,
            vec![
                BalanceMovement { party_id: id(100), delta: dec!(95) },
                BalanceMovement { party_id: id(200), delta: dec!(-80) },
            ]
        );
        let order: Vec<Uuid> = back.balances.iter().map(|m| m.party_id).collect();
        assert_eq!(order, vec![id(100), id(200)]);
    }

    #[test]
    fn test_zero_total_invoice_leaves_balance_alone() {
        let new = snapshot(100, Decimal::ZERO, &[(1, Decimal::ZERO)]);
        let effects = InvoiceEffects::between(None, Some(&new));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_snapshot_from_lines() {
        let prices = catalog(&[(1, dec!(10), dec!(6), dec!(6))]);
        let lines = price_lines(&[LineRequest::new(id(1), dec!(2))], &prices).unwrap();
        let snap = InvoiceSnapshot::from_lines(id(100), &lines).unwrap();

        assert_eq!(snap.total, dec!(22.40));
        assert_eq!(snap.quantities, vec![(id(1), dec!(2))]);
    }

    mod composition {
        use super::*;
        use proptest::prelude::*;

        fn arb_snapshot() -> impl Strategy<Value = InvoiceSnapshot> {
            (
                0u128..3,
                0i64..100_000,
                prop::collection::vec((0u128..4, 0i64..50), 0..6),
            )
                .prop_map(|(party, total_paise, lines)| {
                    InvoiceSnapshot::new(
                        Uuid::from_u128(100 + party),
                        Decimal::new(total_paise, 2),
                        lines
                            .into_iter()
                            .map(|(item, q)| (Uuid::from_u128(item), Decimal::from(q)))
                            .collect(),
                    )
                })
        }

        fn ids() -> (Vec<Uuid>, Vec<Uuid>) {
            (
                (0u128..4).map(Uuid::from_u128).collect(),
                (0u128..3).map(|p| Uuid::from_u128(100 + p)).collect(),
            )
        }

        proptest! {
            #[test]
            fn effects_compose_across_updates(
                a in arb_snapshot(),
                b in arb_snapshot(),
                c in arb_snapshot(),
            ) {
                let ab = InvoiceEffects::between(Some(&a), Some(&b));
                let bc = InvoiceEffects::between(Some(&b), Some(&c));
                let ac = InvoiceEffects::between(Some(&a), Some(&c));
                let (items, parties) = ids();

                for item in items {
                    prop_assert_eq!(ab.stock_delta(item) + bc.stock_delta(item), ac.stock_delta(item));
                }
                for party in parties {
                    prop_assert_eq!(ab.balance_delta(party) + bc.balance_delta(party), ac.balance_delta(party));
                }
            }

            #[test]
            fn create_then_delete_nets_to_zero(a in arb_snapshot()) {
                let created = InvoiceEffects::between(None, Some(&a));
                let deleted = InvoiceEffects::between(Some(&a), None);
                let (items, parties) = ids();

                for item in items {
                    prop_assert_eq!(created.stock_delta(item) + deleted.stock_delta(item), Decimal::ZERO);
                }
                for party in parties {
                    prop_assert_eq!(created.balance_delta(party) + deleted.balance_delta(party), Decimal::ZERO);
                }
            }
        }
    }
}
