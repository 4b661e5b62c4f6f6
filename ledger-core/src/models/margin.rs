//! The margin calculator: agency profit for a budget under one of several
//! configurable policies.

use super::{BudgetSnapshot, LedgerFailure, money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which policy produced a profit figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginPolicy {
    /// A percentage applied to the budget subtotal.
    GlobalPercentage,
    /// A fixed profit amount set on the budget.
    GlobalFixed,
    /// The sum of per-line margins from the referenced catalog items.
    PerItem,
    /// No margin information on the budget at all.
    None,
}

/// The result of a margin computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginBreakdown {
    /// Agency profit for the budget, rounded to currency scale.
    pub profit: Decimal,
    /// The policy that produced it.
    pub policy: MarginPolicy,
    /// Human-readable account of the computation.
    pub detail: String,
}

/// Compute agency profit for a budget snapshot.
///
/// Policy precedence:
/// 1. use-global with a percentage: `profit = subtotal × pct / 100`. A
///    fixed override present alongside the percentage wins outright; it
///    lets a human reconcile a computed figure against reality.
/// 2. use-global with only a fixed amount: that amount.
/// 3. otherwise, with line items: `Σ line_total × item margin pct / 100`.
/// 4. otherwise zero.
pub fn agency_profit(budget: &BudgetSnapshot) -> MarginBreakdown {
    if budget.use_global_margin {
        if let Some(pct) = budget.global_margin_pct {
            if let Some(fixed) = budget.global_fixed_profit {
                return MarginBreakdown {
                    profit: money::round(fixed),
                    policy: MarginPolicy::GlobalFixed,
                    detail: format!("fixed override {fixed} (wins over {pct}%)"),
                };
            }
            return MarginBreakdown {
                profit: money::apply_percentage(budget.subtotal, pct),
                policy: MarginPolicy::GlobalPercentage,
                detail: format!("{pct}% of subtotal {}", budget.subtotal),
            };
        }
        if let Some(fixed) = budget.global_fixed_profit {
            return MarginBreakdown {
                profit: money::round(fixed),
                policy: MarginPolicy::GlobalFixed,
                detail: format!("fixed profit {fixed}"),
            };
        }
    }

    if !budget.lines.is_empty() {
        let profit = money::sum(budget.lines.iter().map(|line| {
            Some(money::apply_percentage(line.line_total(), line.margin_pct))
        }));
        return MarginBreakdown {
            profit,
            policy: MarginPolicy::PerItem,
            detail: format!("per-item margins over {} lines", budget.lines.len()),
        };
    }

    MarginBreakdown {
        profit: Decimal::ZERO,
        policy: MarginPolicy::None,
        detail: "no margin policy configured".into(),
    }
}

/// Validate a budget's global margin settings.
///
/// The percentage must sit in [0, 100] and the fixed override must be
/// non-negative. An override exceeding the subtotal is allowed (agencies
/// may legitimately book profit above cost) but is logged.
pub fn validate_global_margin(
    pct: Option<Decimal>,
    fixed: Option<Decimal>,
    subtotal: Decimal,
) -> Result<(), LedgerFailure> {
    if let Some(pct) = pct {
        if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
            return Err(LedgerFailure::invalid(format!(
                "margin percentage must be within [0, 100], got {pct}"
            )));
        }
    }
    if let Some(fixed) = fixed {
        if fixed < Decimal::ZERO {
            return Err(LedgerFailure::invalid(format!(
                "fixed profit must be non-negative, got {fixed}"
            )));
        }
        if fixed > subtotal {
            warn!(%fixed, %subtotal, "fixed profit override exceeds budget subtotal");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BudgetId, BudgetLine, BudgetStatus, CurrencyCode, ItemId, ItemKind, ItemRef,
    };
    use time::macros::datetime;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn line(unit_price: &str, quantity: &str, margin_pct: &str) -> BudgetLine {
        BudgetLine {
            item: ItemRef {
                kind: ItemKind::Product,
                id: ItemId::generate(),
            },
            description: String::new(),
            quantity: dec(quantity),
            unit_price: dec(unit_price),
            margin_pct: dec(margin_pct),
            provider: None,
            provider_cost: Decimal::ZERO,
        }
    }

    fn budget(lines: Vec<BudgetLine>) -> BudgetSnapshot {
        let subtotal = crate::models::money::sum(lines.iter().map(|l| Some(l.line_total())));
        BudgetSnapshot {
            id: BudgetId::generate(),
            currency: CurrencyCode::new("ARS").unwrap(),
            subtotal,
            tax_amount: Decimal::ZERO,
            total: subtotal,
            status: BudgetStatus::Approved,
            use_global_margin: false,
            global_margin_pct: None,
            global_fixed_profit: None,
            created_at: datetime!(2026-01-15 12:00 UTC),
            lines,
        }
    }

    #[test]
    fn fixed_override_wins_over_percentage() {
        let mut b = budget(vec![line("1000", "1", "0")]);
        b.use_global_margin = true;
        b.global_margin_pct = Some(dec("20"));
        b.global_fixed_profit = Some(dec("500"));

        let breakdown = agency_profit(&b);
        assert_eq!(breakdown.profit, dec("500.00"));
        assert_eq!(breakdown.policy, MarginPolicy::GlobalFixed);
    }

    #[test]
    fn global_percentage_applies_to_subtotal() {
        let mut b = budget(vec![line("1000", "1", "0")]);
        b.use_global_margin = true;
        b.global_margin_pct = Some(dec("20"));

        let breakdown = agency_profit(&b);
        assert_eq!(breakdown.profit, dec("200.00"));
        assert_eq!(breakdown.policy, MarginPolicy::GlobalPercentage);
    }

    #[test]
    fn fixed_only_global_policy() {
        let mut b = budget(vec![line("1000", "1", "30")]);
        b.use_global_margin = true;
        b.global_fixed_profit = Some(dec("150"));

        let breakdown = agency_profit(&b);
        assert_eq!(breakdown.profit, dec("150.00"));
        assert_eq!(breakdown.policy, MarginPolicy::GlobalFixed);
    }

    #[test]
    fn per_item_margins_sum_over_lines() {
        // (100 × 2) × 30% + (50 × 1) × 10% = 60 + 5 = 65
        let b = budget(vec![line("100", "2", "30"), line("50", "1", "10")]);

        let breakdown = agency_profit(&b);
        assert_eq!(breakdown.profit, dec("65.00"));
        assert_eq!(breakdown.policy, MarginPolicy::PerItem);
    }

    #[test]
    fn use_global_without_values_falls_back_to_lines() {
        let mut b = budget(vec![line("100", "2", "30")]);
        b.use_global_margin = true;

        let breakdown = agency_profit(&b);
        assert_eq!(breakdown.policy, MarginPolicy::PerItem);
        assert_eq!(breakdown.profit, dec("60.00"));
    }

    #[test]
    fn empty_budget_has_no_profit() {
        let breakdown = agency_profit(&budget(Vec::new()));
        assert_eq!(breakdown.profit, Decimal::ZERO);
        assert_eq!(breakdown.policy, MarginPolicy::None);
    }

    #[test]
    fn validation_bounds() {
        assert!(validate_global_margin(Some(dec("50")), None, dec("1000")).is_ok());
        assert!(validate_global_margin(Some(dec("101")), None, dec("1000")).is_err());
        assert!(validate_global_margin(Some(dec("-1")), None, dec("1000")).is_err());
        assert!(validate_global_margin(None, Some(dec("-10")), dec("1000")).is_err());
        // Over-subtotal override is allowed, only logged.
        assert!(validate_global_margin(None, Some(dec("2000")), dec("1000")).is_ok());
    }
}
