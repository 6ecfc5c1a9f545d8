//! Financial statement tables.
//!
//! A statement is a sparse table keyed by (line item, period). Providers fill
//! only the line items they know; everything else is absent, never zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which statement a table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Income,
    CashFlow,
    BalanceSheet,
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Income => write!(f, "income statement"),
            Self::CashFlow => write!(f, "cash flow"),
            Self::BalanceSheet => write!(f, "balance sheet"),
        }
    }
}

/// Line items consulted by the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineItem {
    TotalRevenue,
    DilutedEps,
    OperatingCashFlow,
    CapitalExpenditures,
    StockholderEquity,
    TotalDebt,
}

impl LineItem {
    pub const ALL: [LineItem; 6] = [
        Self::TotalRevenue,
        Self::DilutedEps,
        Self::OperatingCashFlow,
        Self::CapitalExpenditures,
        Self::StockholderEquity,
        Self::TotalDebt,
    ];

    /// Human-readable statement row name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::TotalRevenue => "Total Revenue",
            Self::DilutedEps => "Diluted EPS",
            Self::OperatingCashFlow => "Total Cash From Operating Activities",
            Self::CapitalExpenditures => "Capital Expenditures",
            Self::StockholderEquity => "Total Stockholder Equity",
            Self::TotalDebt => "Total Debt",
        }
    }

    /// Statement the line item belongs to.
    pub fn statement(&self) -> StatementKind {
        match self {
            Self::TotalRevenue | Self::DilutedEps => StatementKind::Income,
            Self::OperatingCashFlow | Self::CapitalExpenditures => StatementKind::CashFlow,
            Self::StockholderEquity | Self::TotalDebt => StatementKind::BalanceSheet,
        }
    }
}

impl std::fmt::Display for LineItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A sparse financial statement table.
///
/// Each row holds `(period_end, value)` pairs ordered newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub kind: StatementKind,
    rows: HashMap<LineItem, Vec<(NaiveDate, f64)>>,
}

impl FinancialStatement {
    pub fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            rows: HashMap::new(),
        }
    }

    /// Record a value. A second value for the same (item, period) replaces the first.
    pub fn insert(&mut self, item: LineItem, period: NaiveDate, value: f64) {
        let row = self.rows.entry(item).or_default();
        row.retain(|(p, _)| *p != period);
        row.push((period, value));
        row.sort_by(|a, b| b.0.cmp(&a.0));
    }

    /// Builder-style insert.
    pub fn with(mut self, item: LineItem, period: NaiveDate, value: f64) -> Self {
        self.insert(item, period, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.values().all(Vec::is_empty)
    }

    pub fn contains(&self, item: LineItem) -> bool {
        self.rows.get(&item).is_some_and(|r| !r.is_empty())
    }

    /// Row for a line item, newest period first.
    pub fn row(&self, item: LineItem) -> &[(NaiveDate, f64)] {
        self.rows.get(&item).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Value of a line item at a specific period.
    pub fn value_at(&self, item: LineItem, period: NaiveDate) -> Option<f64> {
        self.row(item)
            .iter()
            .find(|(p, _)| *p == period)
            .map(|(_, v)| *v)
    }

    /// Most recent value of a line item.
    pub fn latest(&self, item: LineItem) -> Option<f64> {
        self.row(item).first().map(|(_, v)| *v)
    }

    /// The two most recent values `(latest, previous)` of a line item.
    pub fn latest_two(&self, item: LineItem) -> Option<(f64, f64)> {
        match self.row(item) {
            [(_, latest), (_, previous), ..] => Some((*latest, *previous)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year_end(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 12, 31).unwrap()
    }

    #[test]
    fn test_rows_are_newest_first() {
        let stmt = FinancialStatement::new(StatementKind::Income)
            .with(LineItem::TotalRevenue, year_end(2022), 100.0)
            .with(LineItem::TotalRevenue, year_end(2024), 130.0)
            .with(LineItem::TotalRevenue, year_end(2023), 110.0);

        assert_eq!(stmt.latest(LineItem::TotalRevenue), Some(130.0));
        assert_eq!(stmt.latest_two(LineItem::TotalRevenue), Some((130.0, 110.0)));
    }

    #[test]
    fn test_insert_replaces_same_period() {
        let mut stmt = FinancialStatement::new(StatementKind::CashFlow);
        stmt.insert(LineItem::OperatingCashFlow, year_end(2024), 1.0);
        stmt.insert(LineItem::OperatingCashFlow, year_end(2024), 2.0);
        assert_eq!(stmt.row(LineItem::OperatingCashFlow).len(), 1);
        assert_eq!(stmt.latest(LineItem::OperatingCashFlow), Some(2.0));
    }

    #[test]
    fn test_missing_items() {
        let stmt = FinancialStatement::new(StatementKind::BalanceSheet)
            .with(LineItem::TotalDebt, year_end(2024), 50.0);

        assert!(!stmt.contains(LineItem::StockholderEquity));
        assert_eq!(stmt.latest(LineItem::StockholderEquity), None);
        assert_eq!(stmt.latest_two(LineItem::TotalDebt), None);
        assert_eq!(stmt.value_at(LineItem::TotalDebt, year_end(2023)), None);
        assert!(FinancialStatement::new(StatementKind::Income).is_empty());
    }

    #[test]
    fn test_line_item_statement_mapping() {
        assert_eq!(LineItem::DilutedEps.statement(), StatementKind::Income);
        assert_eq!(LineItem::CapitalExpenditures.statement(), StatementKind::CashFlow);
        assert_eq!(LineItem::TotalDebt.statement(), StatementKind::BalanceSheet);
        assert_eq!(LineItem::OperatingCashFlow.to_string(), "Total Cash From Operating Activities");
    }
}
