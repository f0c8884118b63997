//! Report ordering.

use common::RankedEdgeReport;

/// Sort by largest absolute edge, then by number of contributing sources,
/// both descending. Stable: equal keys keep their input order.
pub fn rank(mut reports: Vec<RankedEdgeReport>) -> Vec<RankedEdgeReport> {
    reports.sort_by(|a, b| {
        b.max_edge
            .abs()
            .total_cmp(&a.max_edge.abs())
            .then_with(|| b.sources_count.cmp(&a.sources_count))
    });
    reports
}
