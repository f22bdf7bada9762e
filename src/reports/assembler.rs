use serde::Serialize;

use crate::models::ledger::LedgerView;
use crate::reports::date_range::DateRange;
use crate::reports::grouping::{GroupBy, GroupInfo, GroupKey, GroupResult, GroupingOptions};
use crate::reports::summary::{Aggregate, Summary};

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReportData {
    Flat(FlatReport),
    Grouped(GroupedReport),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatReport {
    pub report_title: String,
    pub date_range: DateRange,
    pub summary: Summary,
    pub transactions: Vec<LedgerView>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedReport {
    pub report_title: String,
    pub date_range: DateRange,
    pub summary: Summary,
    pub grouped_results: Vec<GroupEntry>,
    pub group_by: GroupBy,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupEntry {
    pub group_id: GroupKey,
    pub group_info: GroupInfo,
    pub summary: Summary,
    pub transactions: Vec<LedgerView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

/// Sum of the groups' aggregates. Averages are taken from these merged sums
/// when the summary is rendered, never from per-group averages.
pub fn overall(groups: &[GroupResult]) -> Aggregate {
    let mut total = Aggregate::default();
    for group in groups {
        total.merge(&group.aggregate);
    }
    total
}

pub fn assemble(range: DateRange, groups: Vec<GroupResult>, options: &GroupingOptions) -> ReportData {
    let totals = overall(&groups);
    let title = range.title.clone();

    if options.group_by == GroupBy::None {
        let total_count = totals.count;
        let window = options.window;
        let limit = u64::from(window.limit);

        let transactions = groups.into_iter().flat_map(|g| g.transactions).collect();

        return ReportData::Flat(FlatReport {
            report_title: title,
            date_range: range,
            summary: totals.summary(),
            transactions,
            pagination: Pagination {
                page: window.page,
                limit: window.limit,
                total_count,
                total_pages: total_count.div_ceil(limit),
                has_more: total_count > window.offset() + limit,
            },
        });
    }

    let grouped_results = groups
        .into_iter()
        .map(|group| GroupEntry {
            summary: group.aggregate.summary(),
            group_id: group.group_id,
            group_info: group.group_info,
            transactions: if options.include_details { group.transactions } else { Vec::new() },
        })
        .collect();

    ReportData::Grouped(GroupedReport {
        report_title: title,
        date_range: range,
        summary: totals.summary(),
        grouped_results,
        group_by: options.group_by,
    })
}
