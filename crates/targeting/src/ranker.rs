//! Priority ranker.

use listing_ads_core::types::MatchResult;

/// Order by tier ascending. Same-tier entries keep their input order;
/// callers pre-sort by any secondary business key they want honoured.
pub fn rank(mut results: Vec<MatchResult>) -> Vec<MatchResult> {
    // `sort_by_key` is stable.
    results.sort_by_key(|r| r.tier);
    results
}
