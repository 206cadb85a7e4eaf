//! Fuzzy search over the explorer's search index using nucleo.
//!
//! - Multi-term search (whitespace splits terms, ALL must match)
//! - Weighted field scoring (key > summary > status / type)
//! - Smart case handling

use crate::data::Issue;
use nucleo::{
    pattern::{CaseMatching, Normalization, Pattern},
    Config, Matcher, Utf32Str,
};

/// A matched issue and the field that matched best.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub index: usize,
    pub score: u32,
    pub matched_field: &'static str,
}

/// Fuzzy searcher with multi-term support
pub struct IssueSearch {
    matcher: Matcher,
}

impl Default for IssueSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl IssueSearch {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(Config::DEFAULT),
        }
    }

    /// Match a single term against text, return score if matched
    fn match_term(&mut self, term: &str, haystack: &str) -> Option<u32> {
        if term.is_empty() || haystack.is_empty() {
            return if term.is_empty() { Some(0) } else { None };
        }

        let pattern = Pattern::parse(term, CaseMatching::Ignore, Normalization::Smart);
        let mut haystack_buf = Vec::new();
        let haystack_utf32 = Utf32Str::new(haystack, &mut haystack_buf);

        pattern.score(haystack_utf32, &mut self.matcher)
    }

    /// Multi-term search: split query on whitespace, ALL terms must match (AND semantics)
    pub fn multi_term_match(&mut self, query: &str, haystack: &str) -> Option<u32> {
        let mut total_score = 0u32;
        for term in query.split_whitespace() {
            let score = self.match_term(term, haystack)?;
            total_score = total_score.saturating_add(score);
        }
        Some(total_score)
    }

    fn score_issue(&mut self, issue: &Issue, query: &str) -> Option<(u32, &'static str)> {
        let fields: [(&str, u32, &'static str); 4] = [
            (&issue.key, 10, "key"),
            (&issue.summary, 8, "summary"),
            (&issue.status, 3, "status"),
            (&issue.issue_type, 3, "type"),
        ];

        let mut best: Option<(u32, &'static str)> = None;
        for (text, weight, name) in fields {
            if let Some(score) = self.multi_term_match(query, text) {
                let weighted = score.saturating_mul(weight);
                if best.map_or(true, |(s, _)| weighted > s) {
                    best = Some((weighted, name));
                }
            }
        }
        best
    }

    /// Best matches first; ties keep index order. An empty query matches nothing.
    pub fn search(&mut self, issues: &[Issue], query: &str) -> Vec<SearchHit> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = issues
            .iter()
            .enumerate()
            .filter_map(|(index, issue)| {
                self.score_issue(issue, query)
                    .map(|(score, matched_field)| SearchHit {
                        index,
                        score,
                        matched_field,
                    })
            })
            .collect();

        hits.sort_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));
        hits
    }
}
