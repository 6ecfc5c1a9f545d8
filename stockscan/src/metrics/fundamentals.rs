//! Statement-based metrics.

use super::Metric;
use crate::data::{FinancialStatement, LineItem};

/// Cash return on invested capital, in percent.
///
/// `(operating cash flow - capital expenditures) / (equity + total debt)`
/// for the most recent cash flow period. Balance sheet items are read at the
/// same period. Any missing item leaves the result undefined.
pub fn croci(cash_flow: &FinancialStatement, balance_sheet: &FinancialStatement) -> Metric {
    let Some(period) = cash_flow.row(LineItem::OperatingCashFlow).first().map(|(p, _)| *p) else {
        return Metric::Undefined;
    };

    let values = (
        cash_flow.value_at(LineItem::OperatingCashFlow, period),
        cash_flow.value_at(LineItem::CapitalExpenditures, period),
        balance_sheet.value_at(LineItem::StockholderEquity, period),
        balance_sheet.value_at(LineItem::TotalDebt, period),
    );

    match values {
        (Some(cfo), Some(capex), Some(equity), Some(debt)) => {
            Metric::new((cfo - capex) / (equity + debt) * 100.0)
        }
        _ => Metric::Undefined,
    }
}

/// Year-over-year growth of a line item, in percent.
///
/// Compares the two most recent periods. Undefined with fewer than two
/// periods or when the previous value is zero.
pub fn yoy_growth(statement: &FinancialStatement, item: LineItem) -> Metric {
    match statement.latest_two(item) {
        Some((latest, previous)) => Metric::new((latest - previous) / previous.abs() * 100.0),
        None => Metric::Undefined,
    }
}
