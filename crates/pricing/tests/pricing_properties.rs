//! Catalog-wide properties of the quote engine.

use pricing::{CatalogError, Money, PricingCatalog, PricingEngine, PricingSelection};
use rust_decimal::Decimal;

fn engines() -> Vec<PricingEngine> {
    vec![
        PricingEngine::new(PricingCatalog::job()),
        PricingEngine::new(PricingCatalog::salon()),
    ]
}

/// Every subset of the add-ons a tier allows.
fn add_on_subsets(engine: &PricingEngine, tier: &pricing::PricingTier) -> Vec<PricingSelection> {
    let allowed: Vec<_> = tier.allowed_add_ons.iter().cloned().collect();
    let durations: Vec<u32> = engine.catalog().allowed_durations().collect();
    let mut selections = Vec::new();
    for months in durations {
        for mask in 0..(1u32 << allowed.len()) {
            let mut selection = PricingSelection::new(tier.id.clone(), months);
            for (i, add_on) in allowed.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    selection.add_ons.insert(add_on.clone());
                }
            }
            selections.push(selection);
        }
    }
    selections
}

#[test]
fn test_paid_totals_are_non_negative_with_two_places() {
    for engine in engines() {
        for tier in engine.catalog().tiers().iter().filter(|t| !t.is_free()) {
            for selection in add_on_subsets(&engine, tier) {
                let quote = engine.quote(&selection).unwrap();
                assert!(quote.total >= Money::zero());
                assert_eq!(quote.total.to_decimal().scale(), 2);
                assert_eq!(
                    Decimal::from(quote.amount_cents()),
                    quote.total.to_decimal() * Decimal::ONE_HUNDRED
                );
            }
        }
    }
}

#[test]
fn test_effective_monthly_rate_never_increases_with_duration() {
    for engine in engines() {
        for tier in engine.catalog().tiers().iter().filter(|t| !t.is_free()) {
            let add_on_sets: Vec<_> = add_on_subsets(&engine, tier)
                .into_iter()
                .filter(|s| s.duration_months == 1)
                .map(|s| s.add_ons)
                .collect();

            for add_ons in add_on_sets {
                let mut previous: Option<Decimal> = None;
                for months in [1u32, 3, 6, 12] {
                    let selection = PricingSelection {
                        tier: tier.id.clone(),
                        duration_months: months,
                        add_ons: add_ons.clone(),
                    };
                    let quote = engine.quote(&selection).unwrap();
                    let monthly = quote.total.to_decimal() / Decimal::from(months);
                    if let Some(prev) = previous {
                        assert!(
                            monthly <= prev,
                            "tier {} at {} months: {} > {}",
                            tier.id,
                            months,
                            monthly,
                            prev
                        );
                    }
                    previous = Some(monthly);
                }
            }
        }
    }
}

#[test]
fn test_free_tier_is_zero_for_any_duration_and_add_ons() {
    for engine in engines() {
        for months in [0u32, 1, 2, 6, 12, 99] {
            let selection = PricingSelection::new("free", months)
                .with_add_on("featured")
                .with_add_on("nationwide")
                .with_add_on("auto-renew");
            let quote = engine.quote(&selection).unwrap();
            assert!(quote.total.is_zero());
        }
    }
}

#[test]
fn test_disallowed_add_on_never_yields_a_price() {
    for engine in engines() {
        let result = engine.quote(&PricingSelection::new("diamond", 6).with_add_on("featured"));
        assert!(matches!(result, Err(CatalogError::AddOnNotAllowed { .. })));
    }
}

#[test]
fn test_salon_gold_quote() {
    // 79.99 * 3 = 239.97; * 0.90 = 215.973; + 10 = 225.973
    let engine = PricingEngine::new(PricingCatalog::salon());
    let quote = engine
        .quote(&PricingSelection::new("gold", 3).with_add_on("featured"))
        .unwrap();
    assert_eq!(quote.total, Money::from_cents(22597));
}
