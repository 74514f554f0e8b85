//! Money and tax arithmetic.
//!
//! All amounts are exact decimals. Percentages are expressed as whole numbers (`5` is 5%).
//! Nothing here clamps or rejects negative input; that is validation's job.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::LineAmounts;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Aggregate amounts for a set of lines plus a flat shipping fee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub shipping_fee: Decimal,
    pub grand_total: Decimal,
}

/// `quantity * unit_price`, before tax. `None` when the product does not fit a [`Decimal`].
pub fn net_amount<L: LineAmounts + ?Sized>(line: &L) -> Option<Decimal> {
    line.quantity().checked_mul(line.unit_price())
}

pub fn tax_amount<L: LineAmounts + ?Sized>(line: &L) -> Option<Decimal> {
    net_amount(line)?
        .checked_mul(line.tax_percent())?
        .checked_div(HUNDRED)
}

/// `quantity * unit_price * (1 + tax_percent / 100)`.
pub fn line_total<L: LineAmounts + ?Sized>(line: &L) -> Option<Decimal> {
    net_amount(line)?.checked_add(tax_amount(line)?)
}

/// Sums every line plus shipping. `None` if any intermediate amount overflows.
pub fn compute_totals<L: LineAmounts>(lines: &[L], shipping_fee: Decimal) -> Option<Totals> {
    let (subtotal, tax_total) =
        lines
            .iter()
            .try_fold((Decimal::ZERO, Decimal::ZERO), |(net, tax), line| {
                Some((
                    net.checked_add(net_amount(line)?)?,
                    tax.checked_add(tax_amount(line)?)?,
                ))
            })?;

    Some(Totals {
        subtotal,
        tax_total,
        shipping_fee,
        grand_total: subtotal.checked_add(tax_total)?.checked_add(shipping_fee)?,
    })
}
