use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::ledger::LedgerView;

/// Running totals for a set of transactions, kept in hundredths.
///
/// Every measurement is stored at 2-decimal scale, so sums of hundredths are
/// exact and aggregates merge to the same totals in any order. Averages only
/// exist on the rendered [`Summary`], derived from the merged sums.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub count: u64,
    pub empty_vehicle_weight: i64,
    pub gross_weight: i64,
    pub net_weight: i64,
    pub birds: i64,
    pub rate: i64,
    pub total_amount: i64,
    pub amount_paid: i64,
    pub balance: i64,
    pub first_date: Option<DateTime<Utc>>,
    pub last_date: Option<DateTime<Utc>>,
}

fn to_hundredths(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

fn from_hundredths(value: i64) -> f64 {
    value as f64 / 100.0
}

impl Aggregate {
    pub fn push(&mut self, view: &LedgerView) {
        let record = &view.record;
        let total_amount = to_hundredths(record.total_amount);
        let amount_paid = to_hundredths(record.amount_paid);

        self.count += 1;
        self.empty_vehicle_weight += to_hundredths(record.empty_vehicle_weight);
        self.gross_weight += to_hundredths(record.gross_weight);
        self.net_weight += to_hundredths(record.net_weight);
        self.birds += i64::from(record.number_of_birds);
        self.rate += to_hundredths(record.rate);
        self.total_amount += total_amount;
        self.amount_paid += amount_paid;
        self.balance += total_amount - amount_paid;
        self.widen_dates(Some(record.date), Some(record.date));
    }

    pub fn merge(&mut self, other: &Aggregate) {
        self.count += other.count;
        self.empty_vehicle_weight += other.empty_vehicle_weight;
        self.gross_weight += other.gross_weight;
        self.net_weight += other.net_weight;
        self.birds += other.birds;
        self.rate += other.rate;
        self.total_amount += other.total_amount;
        self.amount_paid += other.amount_paid;
        self.balance += other.balance;
        self.widen_dates(other.first_date, other.last_date);
    }

    fn widen_dates(&mut self, first: Option<DateTime<Utc>>, last: Option<DateTime<Utc>>) {
        self.first_date = match (self.first_date, first) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.last_date = match (self.last_date, last) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    /// Mean of a hundredths sum, rounded half away from zero to 2 decimals.
    fn average(&self, sum: i64) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        from_hundredths((sum as f64 / self.count as f64).round() as i64)
    }

    pub fn summary(&self) -> Summary {
        Summary {
            total_transactions: self.count,
            total_empty_vehicle_weight: from_hundredths(self.empty_vehicle_weight),
            total_gross_weight: from_hundredths(self.gross_weight),
            total_net_weight: from_hundredths(self.net_weight),
            total_birds: self.birds,
            total_rate: from_hundredths(self.rate),
            total_amount: from_hundredths(self.total_amount),
            total_paid: from_hundredths(self.amount_paid),
            total_balance: from_hundredths(self.balance),
            average_rate: self.average(self.rate),
            average_net_weight: self.average(self.net_weight),
            average_birds: self.average(self.birds * 100),
            date_range: SummaryDateRange {
                from: self.first_date,
                to: self.last_date,
            },
        }
    }
}

impl<'a> FromIterator<&'a LedgerView> for Aggregate {
    fn from_iter<I: IntoIterator<Item = &'a LedgerView>>(iter: I) -> Self {
        let mut aggregate = Aggregate::default();
        for view in iter {
            aggregate.push(view);
        }
        aggregate
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_transactions: u64,
    pub total_empty_vehicle_weight: f64,
    pub total_gross_weight: f64,
    pub total_net_weight: f64,
    pub total_birds: i64,
    pub total_rate: f64,
    pub total_amount: f64,
    pub total_paid: f64,
    pub total_balance: f64,
    pub average_rate: f64,
    pub average_net_weight: f64,
    pub average_birds: f64,
    pub date_range: SummaryDateRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryDateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}
