use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Amounts are kept to the cent.
pub const AMOUNT_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProrationError {
    #[error("cannot prorate against a total quantity of {0}")]
    EmptyQuantity(Decimal),
    #[error("cannot prorate a negative amount {0}")]
    NegativeAmount(Decimal),
    #[error("no parts to prorate across")]
    NoParts,
    #[error("part #{index} has non-positive quantity {quantity}")]
    NonPositivePart { index: usize, quantity: Decimal },
    #[error("parts total {requested} exceeds available quantity {available}")]
    ExceedsTotal {
        requested: Decimal,
        available: Decimal,
    },
    #[error("prorating {amount} by {quantity} overflows")]
    Overflow { amount: Decimal, quantity: Decimal },
}

/// Result of splitting an amount across consecutive parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proration {
    pub amounts: Vec<Decimal>,
    pub allocated_quantity: Decimal,
    pub allocated_amount: Decimal,
}

/// Rounds to two decimal places, half away from zero.
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    // pad to the cent so "200" renders as "200.00"
    rounded.rescale(AMOUNT_SCALE);
    rounded
}

fn check_totals(total_amount: Decimal, total_quantity: Decimal) -> Result<(), ProrationError> {
    if total_quantity <= Decimal::ZERO {
        return Err(ProrationError::EmptyQuantity(total_quantity));
    }
    if total_amount < Decimal::ZERO {
        return Err(ProrationError::NegativeAmount(total_amount));
    }
    Ok(())
}

/// `round2(amount * quantity / whole)` without panicking on overflow.
fn share(amount: Decimal, quantity: Decimal, whole: Decimal) -> Result<Decimal, ProrationError> {
    amount
        .checked_mul(quantity)
        .and_then(|product| product.checked_div(whole))
        .map(round2)
        .ok_or(ProrationError::Overflow { amount, quantity })
}

/// Splits `total_amount * sum(quantities) / total_quantity` across the parts.
///
/// Every part but the last is rounded independently; the last one absorbs the
/// residual so the parts always add up to the rounded allocated total. When
/// the leading parts round up far enough to push that residual below zero,
/// each part instead takes the difference of the rounded cumulative shares,
/// which keeps the same total with no negative part.
pub fn prorate(
    total_amount: Decimal,
    total_quantity: Decimal,
    quantities: &[Decimal],
) -> Result<Proration, ProrationError> {
    check_totals(total_amount, total_quantity)?;
    if quantities.is_empty() {
        return Err(ProrationError::NoParts);
    }
    for (index, quantity) in quantities.iter().enumerate() {
        if *quantity <= Decimal::ZERO {
            return Err(ProrationError::NonPositivePart {
                index,
                quantity: *quantity,
            });
        }
    }

    let allocated_quantity: Decimal = quantities.iter().sum();
    if allocated_quantity > total_quantity {
        return Err(ProrationError::ExceedsTotal {
            requested: allocated_quantity,
            available: total_quantity,
        });
    }
    let allocated_amount = share(total_amount, allocated_quantity, total_quantity)?;

    let leading = &quantities[..quantities.len() - 1];
    let mut amounts = Vec::with_capacity(quantities.len());
    let mut running = Decimal::ZERO;
    for quantity in leading {
        let amount = share(total_amount, *quantity, total_quantity)?;
        running += amount;
        amounts.push(amount);
    }
    let residual = round2(allocated_amount - running);
    if residual < Decimal::ZERO {
        amounts = cumulative_shares(total_amount, total_quantity, quantities)?;
    } else {
        amounts.push(residual);
    }

    Ok(Proration {
        amounts,
        allocated_quantity,
        allocated_amount,
    })
}

fn cumulative_shares(
    total_amount: Decimal,
    total_quantity: Decimal,
    quantities: &[Decimal],
) -> Result<Vec<Decimal>, ProrationError> {
    let mut amounts = Vec::with_capacity(quantities.len());
    let mut cumulative_quantity = Decimal::ZERO;
    let mut previous = Decimal::ZERO;
    for quantity in quantities {
        cumulative_quantity += *quantity;
        let reached = share(total_amount, cumulative_quantity, total_quantity)?;
        amounts.push(round2(reached - previous));
        previous = reached;
    }
    Ok(amounts)
}

/// Two-way split of `amount` into the share of `part` out of `whole` and the
/// residual.
pub fn split_amount(
    amount: Decimal,
    part: Decimal,
    whole: Decimal,
) -> Result<(Decimal, Decimal), ProrationError> {
    check_totals(amount, whole)?;
    if part <= Decimal::ZERO {
        return Err(ProrationError::NonPositivePart {
            index: 0,
            quantity: part,
        });
    }
    if part > whole {
        return Err(ProrationError::ExceedsTotal {
            requested: part,
            available: whole,
        });
    }
    let kept = share(amount, part, whole)?;
    Ok((kept, amount - kept))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn round2_is_half_away_from_zero() {
        assert_eq!(round2(dec("0.125")), dec("0.13"));
        assert_eq!(round2(dec("0.135")), dec("0.14"));
        assert_eq!(round2(dec("0.124")), dec("0.12"));
        assert_eq!(round2(dec("-0.125")), dec("-0.13"));
        assert_eq!(round2(dec("2.5")), dec("2.50"));
    }

    #[test]
    fn single_part_takes_the_whole_allocated_amount() {
        let p = prorate(dec("100.00"), dec("3"), &[dec("1")]).unwrap();
        assert_eq!(p.amounts, vec![dec("33.33")]);
        assert_eq!(p.allocated_amount, dec("33.33"));
    }

    #[test]
    fn last_part_absorbs_the_residual() {
        // 100 / 3 per unit: 33.33 + 33.33 would drift, the last part settles at 33.34
        let p = prorate(dec("100.00"), dec("3"), &[dec("1"), dec("1"), dec("1")]).unwrap();
        assert_eq!(p.amounts, vec![dec("33.33"), dec("33.33"), dec("33.34")]);
        assert_eq!(p.allocated_amount, dec("100.00"));
    }

    #[test]
    fn zero_amount_prorates_to_zeros() {
        let p = prorate(Decimal::ZERO, dec("4"), &[dec("2"), dec("1")]).unwrap();
        assert!(p.amounts.iter().all(|a| a.is_zero()));
    }

    #[test]
    fn rejects_degenerate_inputs() {
        assert_eq!(
            prorate(dec("10"), Decimal::ZERO, &[dec("1")]),
            Err(ProrationError::EmptyQuantity(Decimal::ZERO))
        );
        assert_eq!(
            prorate(dec("-10"), dec("2"), &[dec("1")]),
            Err(ProrationError::NegativeAmount(dec("-10")))
        );
        assert_eq!(prorate(dec("10"), dec("2"), &[]), Err(ProrationError::NoParts));
        assert!(matches!(
            prorate(dec("10"), dec("2"), &[dec("1"), dec("2")]),
            Err(ProrationError::ExceedsTotal { .. })
        ));
        assert!(matches!(
            prorate(dec("10"), dec("2"), &[dec("0")]),
            Err(ProrationError::NonPositivePart { index: 0, .. })
        ));
    }

    #[test]
    fn residual_never_goes_negative() {
        // four leading half-cent shares each round up; the literal residual would be -0.01
        let p = prorate(dec("0.03"), dec("6"), &[dec("1"); 5]).unwrap();
        assert_eq!(
            p.amounts,
            vec![dec("0.01"), dec("0.00"), dec("0.01"), dec("0.00"), dec("0.01")]
        );
        assert_eq!(p.allocated_amount, dec("0.03"));
        assert!(p.amounts.iter().all(|a| *a >= Decimal::ZERO));
    }

    #[test]
    fn overflow_is_an_error() {
        assert!(matches!(
            prorate(Decimal::MAX, dec("5"), &[dec("2"), dec("1")]),
            Err(ProrationError::Overflow { .. })
        ));
        assert!(matches!(
            split_amount(Decimal::MAX, dec("4"), dec("10")),
            Err(ProrationError::Overflow { .. })
        ));
    }

    #[test]
    fn split_amount_keeps_rounded_share() {
        let (kept, rest) = split_amount(dec("1000.00"), dec("4"), dec("10")).unwrap();
        assert_eq!(kept, dec("400.00"));
        assert_eq!(rest, dec("600.00"));

        let (kept, rest) = split_amount(dec("100.00"), dec("1"), dec("3")).unwrap();
        assert_eq!(kept, dec("33.33"));
        assert_eq!(rest, dec("66.67"));
    }
}
