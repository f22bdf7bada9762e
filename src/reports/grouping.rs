//! Runs the composed query, derives `balance`, partitions rows by the
//! requested dimension and aggregates each partition.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::dtos::report::{parse_flag, ReportQuery};
use crate::models::ledger::LedgerView;
use crate::reports::date_range::DateRange;
use crate::reports::filter::FilterCriteria;
use crate::reports::summary::Aggregate;
use crate::store::LedgerStore;

pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const MAX_PAGE_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Buyer,
    Farm,
    Flock,
    Shed,
    Driver,
    Accountant,
    Date,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Id(i64),
    Name(String),
    /// Missing (`null`) sorts before any present name
    OptionalName(Option<String>),
    Day(NaiveDate),
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroupInfo {
    Buyer { name: Option<String>, contact: Option<String> },
    Farm { name: Option<String>, location: Option<String> },
    Flock { name: Option<String>, breed: Option<String> },
    Shed { name: Option<String>, capacity: Option<i32> },
    Driver { name: String, contact: Option<String> },
    Accountant { name: Option<String> },
    Date { date: NaiveDate },
    All,
}

/// Key and descriptor extraction for one grouping dimension.
#[derive(Clone, Copy)]
pub struct GroupStrategy {
    pub key: fn(&LedgerView) -> GroupKey,
    pub describe: fn(&LedgerView) -> GroupInfo,
}

const NO_GROUPING: GroupStrategy = GroupStrategy {
    key: |_| GroupKey::All,
    describe: |_| GroupInfo::All,
};

const GROUPINGS: [(&str, GroupBy, GroupStrategy); 8] = [
    (
        "buyer",
        GroupBy::Buyer,
        GroupStrategy {
            key: |v| GroupKey::Id(v.record.buyer_id),
            describe: |v| GroupInfo::Buyer {
                name: v.buyer.as_ref().map(|b| b.name.clone()),
                contact: v.buyer.as_ref().and_then(|b| b.contact.clone()),
            },
        },
    ),
    (
        "farm",
        GroupBy::Farm,
        GroupStrategy {
            key: |v| GroupKey::Id(v.record.farm_id),
            describe: |v| GroupInfo::Farm {
                name: v.farm.as_ref().map(|f| f.name.clone()),
                location: v.farm.as_ref().and_then(|f| f.location.clone()),
            },
        },
    ),
    (
        "flock",
        GroupBy::Flock,
        GroupStrategy {
            key: |v| GroupKey::Id(v.record.flock_id),
            describe: |v| GroupInfo::Flock {
                name: v.flock.as_ref().map(|f| f.name.clone()),
                breed: v.flock.as_ref().and_then(|f| f.breed.clone()),
            },
        },
    ),
    (
        "shed",
        GroupBy::Shed,
        GroupStrategy {
            key: |v| GroupKey::Id(v.record.shed_id),
            describe: |v| GroupInfo::Shed {
                name: v.shed.as_ref().map(|s| s.name.clone()),
                capacity: v.shed.as_ref().and_then(|s| s.capacity),
            },
        },
    ),
    (
        "driver",
        GroupBy::Driver,
        GroupStrategy {
            key: |v| GroupKey::Name(v.record.driver_name.clone()),
            describe: |v| GroupInfo::Driver {
                name: v.record.driver_name.clone(),
                contact: v.record.driver_contact.clone(),
            },
        },
    ),
    (
        "accountant",
        GroupBy::Accountant,
        GroupStrategy {
            key: |v| GroupKey::OptionalName(v.record.accountant_name.clone()),
            describe: |v| GroupInfo::Accountant {
                name: v.record.accountant_name.clone(),
            },
        },
    ),
    (
        "date",
        GroupBy::Date,
        GroupStrategy {
            key: |v| GroupKey::Day(v.record.date.date_naive()),
            describe: |v| GroupInfo::Date {
                date: v.record.date.date_naive(),
            },
        },
    ),
    ("none", GroupBy::None, NO_GROUPING),
];

impl GroupBy {
    /// Unknown or missing values fall back to [`GroupBy::None`].
    pub fn from_param(raw: Option<&str>) -> Self {
        let tag = raw.map(|v| v.trim().to_ascii_lowercase()).unwrap_or_default();
        GROUPINGS
            .iter()
            .find(|(name, _, _)| *name == tag)
            .map(|(_, group_by, _)| *group_by)
            .unwrap_or(GroupBy::None)
    }

    pub fn strategy(self) -> GroupStrategy {
        GROUPINGS
            .iter()
            .find(|(_, group_by, _)| *group_by == self)
            .map(|(_, _, strategy)| *strategy)
            .unwrap_or(NO_GROUPING)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Date,
    TotalAmount,
    AmountPaid,
    NetWeight,
    NumberOfBirds,
    Rate,
    VehicleNumber,
    DriverName,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "date" => Some(SortField::Date),
            "totalAmount" => Some(SortField::TotalAmount),
            "amountPaid" => Some(SortField::AmountPaid),
            "netWeight" => Some(SortField::NetWeight),
            "numberOfBirds" => Some(SortField::NumberOfBirds),
            "rate" => Some(SortField::Rate),
            "vehicleNumber" => Some(SortField::VehicleNumber),
            "driverName" => Some(SortField::DriverName),
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" => Some(SortField::UpdatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub descending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec { field: SortField::Date, descending: true }
    }
}

impl SortSpec {
    /// A field outside the allow-list resets to `date desc`, whatever the
    /// requested order.
    pub fn from_params(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        match sort_by.and_then(SortField::parse) {
            Some(field) => SortSpec {
                field,
                descending: !sort_order.is_some_and(|o| o.trim().eq_ignore_ascii_case("asc")),
            },
            None => SortSpec::default(),
        }
    }

    pub fn compare(&self, a: &LedgerView, b: &LedgerView) -> Ordering {
        let (a, b) = (&a.record, &b.record);
        let ordering = match self.field {
            SortField::Date => a.date.cmp(&b.date),
            SortField::TotalAmount => a.total_amount.total_cmp(&b.total_amount),
            SortField::AmountPaid => a.amount_paid.total_cmp(&b.amount_paid),
            SortField::NetWeight => a.net_weight.total_cmp(&b.net_weight),
            SortField::NumberOfBirds => a.number_of_birds.cmp(&b.number_of_birds),
            SortField::Rate => a.rate.total_cmp(&b.rate),
            SortField::VehicleNumber => a.vehicle_number.cmp(&b.vehicle_number),
            SortField::DriverName => a.driver_name.cmp(&b.driver_name),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
        .then_with(|| a.id.cmp(&b.id));

        if self.descending { ordering.reverse() } else { ordering }
    }
}

/// 1-based page of `limit` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
}

impl PageWindow {
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<u32>().ok())
            .filter(|l| *l > 0)
            .map(|l| l.min(MAX_PAGE_LIMIT))
            .unwrap_or(DEFAULT_PAGE_LIMIT);
        PageWindow { page, limit }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    fn slice<T>(&self, rows: Vec<T>) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        rows.into_iter().skip(start).take(self.limit as usize).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingOptions {
    pub group_by: GroupBy,
    pub sort: SortSpec,
    pub window: PageWindow,
    /// Keep every transaction instead of the page window (exports).
    pub full_detail: bool,
    /// When false, grouped output carries summaries only.
    pub include_details: bool,
}

impl GroupingOptions {
    pub fn from_query(query: &ReportQuery) -> Self {
        GroupingOptions {
            group_by: GroupBy::from_param(query.group_by.as_deref()),
            sort: SortSpec::from_params(query.sort_by.as_deref(), query.sort_order.as_deref()),
            window: PageWindow::from_params(query.page.as_deref(), query.limit.as_deref()),
            full_detail: parse_flag(query.for_export.as_deref()).unwrap_or(false),
            include_details: parse_flag(query.include_details.as_deref()).unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupResult {
    pub group_id: GroupKey,
    pub group_info: GroupInfo,
    pub aggregate: Aggregate,
    pub transactions: Vec<LedgerView>,
}

pub async fn run_grouping<S>(
    store: &S,
    range: &DateRange,
    criteria: &FilterCriteria,
    options: &GroupingOptions,
) -> Result<Vec<GroupResult>, sqlx::Error>
where
    S: LedgerStore + ?Sized,
{
    let rows = store.query_ledgers(range, criteria).await?;
    let views = rows.into_iter().map(LedgerView::from).collect();
    Ok(group_records(views, options))
}

pub fn group_records(views: Vec<LedgerView>, options: &GroupingOptions) -> Vec<GroupResult> {
    let strategy = options.group_by.strategy();

    let mut partitions: BTreeMap<GroupKey, GroupResult> = BTreeMap::new();
    for view in views {
        let group = partitions
            .entry((strategy.key)(&view))
            .or_insert_with_key(|key| GroupResult {
                group_id: key.clone(),
                group_info: (strategy.describe)(&view),
                aggregate: Aggregate::default(),
                transactions: Vec::new(),
            });
        group.transactions.push(view);
    }

    let mut groups: Vec<GroupResult> = partitions.into_values().collect();
    for group in &mut groups {
        group.aggregate = group.transactions.iter().collect();
        group.transactions.sort_by(|a, b| options.sort.compare(a, b));
        if !options.full_detail {
            group.transactions = options.window.slice(std::mem::take(&mut group.transactions));
        }
    }

    match options.group_by {
        // Newest day first
        GroupBy::Date => groups.reverse(),
        _ => groups.sort_by(|a, b| {
            b.aggregate
                .total_amount
                .cmp(&a.aggregate.total_amount)
                .then_with(|| a.group_id.cmp(&b.group_id))
        }),
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::sample_view;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn options(group_by: GroupBy) -> GroupingOptions {
        GroupingOptions {
            group_by,
            sort: SortSpec::default(),
            window: PageWindow { page: 1, limit: 50 },
            full_detail: false,
            include_details: true,
        }
    }

    fn rows() -> Vec<LedgerView> {
        let specs = [
            (1, 1, 10, 120.0, "Ravi"),
            (2, 2, 11, 80.0, "Ravi"),
            (3, 1, 11, 300.0, "Imran"),
            (4, 2, 12, 50.0, "Imran"),
        ];
        specs
            .into_iter()
            .map(|(id, buyer, day, total, driver)| {
                let mut view = sample_view(Utc.with_ymd_and_hms(2025, 5, day, 9, 0, 0).unwrap());
                view.record.id = id;
                view.record.buyer_id = buyer;
                view.record.total_amount = total;
                view.record.driver_name = driver.to_string();
                view.buyer.as_mut().unwrap().id = buyer;
                view
            })
            .collect()
    }

    impl GroupResult {
        fn summary_total(&self) -> f64 {
            self.aggregate.summary().total_amount
        }
    }

    #[test]
    fn unknown_dimension_means_none() {
        assert_eq!(GroupBy::from_param(Some("weather")), GroupBy::None);
        assert_eq!(GroupBy::from_param(None), GroupBy::None);
        assert_eq!(GroupBy::from_param(Some(" Buyer ")), GroupBy::Buyer);
    }

    #[test]
    fn every_dimension_has_a_strategy() {
        let view = &rows()[0];
        for (tag, group_by, _) in GROUPINGS {
            assert_eq!(GroupBy::from_param(Some(tag)), group_by);
            let strategy = group_by.strategy();
            let key = (strategy.key)(view);
            match group_by {
                GroupBy::None => assert_eq!(key, GroupKey::All),
                GroupBy::Date => assert!(matches!(key, GroupKey::Day(_))),
                GroupBy::Driver => assert!(matches!(key, GroupKey::Name(_))),
                GroupBy::Accountant => assert!(matches!(key, GroupKey::OptionalName(Some(_)))),
                _ => assert!(matches!(key, GroupKey::Id(_))),
            }
        }
    }

    #[test]
    fn buyer_groups_carry_descriptor_and_totals() {
        let groups = group_records(rows(), &options(GroupBy::Buyer));
        assert_eq!(groups.len(), 2);

        // Buyer 1 has the larger total so it comes first
        assert_eq!(groups[0].group_id, GroupKey::Id(1));
        assert_eq!(groups[0].aggregate.count, 2);
        assert_eq!(groups[0].summary_total(), 420.0);
        assert_eq!(
            serde_json::to_value(&groups[0].group_info).unwrap(),
            json!({ "name": "Fresh Poultry Traders", "contact": "9000000001" })
        );
    }

    #[test]
    fn date_groups_are_newest_first() {
        let groups = group_records(rows(), &options(GroupBy::Date));
        let days: Vec<_> = groups.iter().map(|g| g.group_id.clone()).collect();
        assert_eq!(
            days,
            vec![
                GroupKey::Day(NaiveDate::from_ymd_opt(2025, 5, 12).unwrap()),
                GroupKey::Day(NaiveDate::from_ymd_opt(2025, 5, 11).unwrap()),
                GroupKey::Day(NaiveDate::from_ymd_opt(2025, 5, 10).unwrap()),
            ]
        );
        assert_eq!(groups[1].aggregate.count, 2);
    }

    #[test]
    fn driver_groups_key_on_name() {
        let groups = group_records(rows(), &options(GroupBy::Driver));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_id, GroupKey::Name("Imran".into()));
        assert_eq!(groups[0].summary_total(), 350.0);
    }

    #[test]
    fn missing_and_blank_accountants_are_separate_groups() {
        let mut views = rows();
        views[0].record.accountant_name = None;
        views[1].record.accountant_name = Some(String::new());
        views[2].record.accountant_name = None;

        let groups = group_records(views, &options(GroupBy::Accountant));
        assert_eq!(groups.len(), 3);

        let missing = groups
            .iter()
            .find(|g| g.group_id == GroupKey::OptionalName(None))
            .unwrap();
        assert_eq!(missing.aggregate.count, 2);
        assert_eq!(missing.group_info, GroupInfo::Accountant { name: None });
        assert_eq!(serde_json::to_value(&missing.group_id).unwrap(), serde_json::Value::Null);

        let blank = groups
            .iter()
            .find(|g| g.group_id == GroupKey::OptionalName(Some(String::new())))
            .unwrap();
        assert_eq!(blank.group_info, GroupInfo::Accountant { name: Some(String::new()) });
    }

    #[test]
    fn sorts_within_group_and_falls_back_to_date_desc() {
        let mut opts = options(GroupBy::None);
        opts.sort = SortSpec::from_params(Some("totalAmount"), Some("asc"));
        let groups = group_records(rows(), &opts);
        let totals: Vec<f64> = groups[0].transactions.iter().map(|t| t.record.total_amount).collect();
        assert_eq!(totals, vec![50.0, 80.0, 120.0, 300.0]);

        opts.sort = SortSpec::from_params(Some("password"), Some("asc"));
        assert_eq!(opts.sort, SortSpec { field: SortField::Date, descending: true });
        let groups = group_records(rows(), &opts);
        let ids: Vec<i64> = groups[0].transactions.iter().map(|t| t.record.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn slices_to_page_unless_exporting() {
        let mut opts = options(GroupBy::None);
        opts.window = PageWindow { page: 2, limit: 3 };
        let groups = group_records(rows(), &opts);
        assert_eq!(groups[0].transactions.len(), 1);
        assert_eq!(groups[0].aggregate.count, 4);

        opts.full_detail = true;
        let groups = group_records(rows(), &opts);
        assert_eq!(groups[0].transactions.len(), 4);
    }

    #[test]
    fn page_window_defaults_and_clamps() {
        assert_eq!(PageWindow::from_params(None, None), PageWindow { page: 1, limit: DEFAULT_PAGE_LIMIT });
        assert_eq!(PageWindow::from_params(Some("0"), Some("abc")), PageWindow { page: 1, limit: DEFAULT_PAGE_LIMIT });
        assert_eq!(PageWindow::from_params(Some("3"), Some("5000")).limit, MAX_PAGE_LIMIT);
        assert_eq!(PageWindow { page: 3, limit: 20 }.offset(), 40);
    }
}
