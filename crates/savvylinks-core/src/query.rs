//! Search over the cached links
//!
//! A record matches when the search fuzzily matches its name or its private
//! name, ignoring case. Matches keep snapshot order; results are filtered,
//! not ranked.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher as _;
use serde::Serialize;

use crate::cache::Snapshot;
use crate::models::LinkRecord;

/// Outcome of scoring one candidate string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchScore {
    score: Option<i64>,
    min_score: i64,
}

impl MatchScore {
    pub fn new(score: Option<i64>, min_score: i64) -> Self {
        Self { score, min_score }
    }

    /// Score that never meets precision
    pub fn no_match() -> Self {
        Self::new(None, 0)
    }

    pub fn score(&self) -> Option<i64> {
        self.score
    }

    /// Whether the candidate is close enough to be shown
    pub fn is_precision_met(&self) -> bool {
        self.score.is_some_and(|s| s >= self.min_score)
    }
}

/// Scores how well a search string matches a candidate
pub trait FuzzyMatcher: Send + Sync {
    fn score(&self, search: &str, target: &str) -> MatchScore;
}

/// Skim-style fuzzy matcher with a minimum score
pub struct SkimScorer {
    matcher: SkimMatcherV2,
    min_score: i64,
}

impl SkimScorer {
    pub fn new(min_score: i64) -> Self {
        Self {
            matcher: SkimMatcherV2::default().ignore_case(),
            min_score,
        }
    }
}

impl Default for SkimScorer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl FuzzyMatcher for SkimScorer {
    fn score(&self, search: &str, target: &str) -> MatchScore {
        if target.is_empty() {
            return MatchScore::no_match();
        }
        MatchScore::new(self.matcher.fuzzy_match(target, search), self.min_score)
    }
}

/// Filter a snapshot by search text
///
/// Blank search returns every record.
pub fn query(search: &str, snapshot: &Snapshot, matcher: &dyn FuzzyMatcher) -> Vec<LinkRecord> {
    let search = search.trim();
    if search.is_empty() {
        return snapshot.records.clone();
    }

    snapshot
        .records
        .iter()
        .filter(|record| {
            matcher.score(search, &record.name).is_precision_met()
                || matcher
                    .score(search, &record.private_name)
                    .is_precision_met()
        })
        .cloned()
        .collect()
}

/// A search result as presented to the host
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResultItem {
    /// Display name
    pub title: String,
    /// Private name (may be empty)
    pub subtitle: String,
    /// Record the result's actions operate on
    pub record: LinkRecord,
}

impl From<LinkRecord> for ResultItem {
    fn from(record: LinkRecord) -> Self {
        Self {
            title: record.name.clone(),
            subtitle: record.private_name.clone(),
            record,
        }
    }
}

/// Run [`query`] and wrap the matches for presentation
pub fn query_items(
    search: &str,
    snapshot: &Snapshot,
    matcher: &dyn FuzzyMatcher,
) -> Vec<ResultItem> {
    query(search, snapshot, matcher)
        .into_iter()
        .map(ResultItem::from)
        .collect()
}
