//! Session-held cart mirror.
//!
//! The remote cart is authoritative; this mirror exists so quantity edits
//! can be validated and applied locally before each mutation is pushed
//! upstream, and so a failed push can be reverted by re-fetching.
//!
//! Removal is local-only: the upstream API exposes no line-delete call, so a
//! removed line disappears from this mirror but resurfaces on the next
//! authoritative fetch.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use mobistore_core::{CartLineId, VariantId, Vnd};

use crate::commerce::types::CartLine;

/// What a quantity edit should do, decided before any network traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityPlan {
    /// Invalid edit (quantity below one, or unknown line); nothing is sent
    /// upstream and the mirror stays unchanged.
    Rejected,
    /// Apply locally, then push `{variant_id, quantity}` to the remote cart.
    Push {
        variant_id: VariantId,
        quantity: u32,
    },
}

/// The per-session mirror of the remote cart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartMirror {
    lines: Vec<CartLine>,
}

impl CartMirror {
    /// Mirror a freshly fetched authoritative cart.
    #[must_use]
    pub const fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// The mirrored lines.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Decide what a quantity edit should do.
    ///
    /// Quantities below one are rejected here, before any network call.
    #[must_use]
    pub fn plan_quantity_update(&self, line_id: CartLineId, quantity: i64) -> QuantityPlan {
        if quantity < 1 {
            return QuantityPlan::Rejected;
        }
        let Ok(quantity) = u32::try_from(quantity) else {
            return QuantityPlan::Rejected;
        };
        match self.lines.iter().find(|line| line.id == line_id) {
            Some(line) => QuantityPlan::Push {
                variant_id: line.variant.id,
                quantity,
            },
            None => QuantityPlan::Rejected,
        }
    }

    /// Apply a planned quantity edit to the mirror.
    pub fn set_quantity(&mut self, line_id: CartLineId, quantity: u32) {
        if let Some(line) = self.lines.iter_mut().find(|line| line.id == line_id) {
            line.quantity = quantity;
        }
    }

    /// Remove a line from the mirror only; the remote cart keeps it.
    ///
    /// Returns whether the line was present.
    pub fn remove(&mut self, line_id: CartLineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != line_id);
        self.lines.len() != before
    }

    /// Sum of `price × quantity` over every line.
    #[must_use]
    pub fn subtotal(&self) -> Vnd {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of `price × quantity` over the lines in `selection`.
    #[must_use]
    pub fn selected_subtotal(&self, selection: &HashSet<CartLineId>) -> Vnd {
        self.lines
            .iter()
            .filter(|line| selection.contains(&line.id))
            .map(CartLine::line_total)
            .sum()
    }

    /// Keep only selection ids that actually name a mirrored line.
    #[must_use]
    pub fn known_selection(&self, selection: &[CartLineId]) -> Vec<CartLineId> {
        let present: HashSet<CartLineId> = self.lines.iter().map(|line| line.id).collect();
        selection
            .iter()
            .copied()
            .filter(|id| present.contains(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commerce::types::{CatalogItem, VariantSummary};
    use mobistore_core::ProductId;

    fn line(id: i64, price: i64, quantity: u32) -> CartLine {
        CartLine {
            id: CartLineId::new(id),
            catalog_item: CatalogItem {
                id: ProductId::new(id * 10),
                name: format!("Product {id}"),
                price: Vnd::new(price),
                base_price: Vnd::new(price),
                image: None,
            },
            variant: VariantSummary {
                id: VariantId::new(id * 100),
                color: Some("Black".to_string()),
                images: Vec::new(),
            },
            quantity,
        }
    }

    #[test]
    fn test_quantity_below_one_is_rejected_without_side_effects() {
        let mirror = CartMirror::new(vec![line(1, 10_000, 2)]);

        assert_eq!(mirror.plan_quantity_update(CartLineId::new(1), 0), QuantityPlan::Rejected);
        assert_eq!(
            mirror.plan_quantity_update(CartLineId::new(1), -3),
            QuantityPlan::Rejected
        );
        // The mirror is untouched by planning.
        assert_eq!(mirror.lines()[0].quantity, 2);
    }

    #[test]
    fn test_quantity_update_plans_push_with_variant_id() {
        let mirror = CartMirror::new(vec![line(1, 10_000, 2)]);

        assert_eq!(
            mirror.plan_quantity_update(CartLineId::new(1), 5),
            QuantityPlan::Push {
                variant_id: VariantId::new(100),
                quantity: 5
            }
        );
    }

    #[test]
    fn test_unknown_line_is_rejected() {
        let mirror = CartMirror::new(vec![line(1, 10_000, 2)]);
        assert_eq!(
            mirror.plan_quantity_update(CartLineId::new(99), 2),
            QuantityPlan::Rejected
        );
    }

    #[test]
    fn test_selected_subtotal_sums_only_selection() {
        let mirror = CartMirror::new(vec![line(1, 10_000, 2), line(2, 5_000, 1)]);

        let only_first: HashSet<CartLineId> = [CartLineId::new(1)].into_iter().collect();
        assert_eq!(mirror.selected_subtotal(&only_first), Vnd::new(20_000));

        let both: HashSet<CartLineId> = [CartLineId::new(1), CartLineId::new(2)]
            .into_iter()
            .collect();
        assert_eq!(mirror.selected_subtotal(&both), Vnd::new(25_000));

        assert_eq!(mirror.selected_subtotal(&HashSet::new()), Vnd::ZERO);
    }

    #[test]
    fn test_remove_is_local_only() {
        let mut mirror = CartMirror::new(vec![line(1, 10_000, 2), line(2, 5_000, 1)]);

        assert!(mirror.remove(CartLineId::new(1)));
        assert_eq!(mirror.lines().len(), 1);
        assert!(!mirror.remove(CartLineId::new(1)));
    }

    #[test]
    fn test_known_selection_filters_stale_ids() {
        let mirror = CartMirror::new(vec![line(1, 10_000, 2)]);
        let kept = mirror.known_selection(&[CartLineId::new(1), CartLineId::new(7)]);
        assert_eq!(kept, vec![CartLineId::new(1)]);
    }
}
