//! Boolean query - combines clauses with AND, OR, NOT semantics

use serde::{Deserialize, Serialize};

use crate::query::ast::Query;

/// How a clause participates in a boolean query
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occur {
    Must,
    Should,
    MustNot,
}

/// Boolean query combining multiple clauses
///
/// - `must`: all clauses must match (AND). Contributes to score.
/// - `should`: at least one clause should match (OR) when there is no
///   `must` clause; otherwise they only add to the score.
/// - `must_not`: no clause may match (NOT). Does not contribute to score.
///
/// A bool query made only of `must_not` clauses matches every document
/// except the excluded ones.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolQuery {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Query>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Query>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<Query>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a must clause
    pub fn must(mut self, query: impl Into<Query>) -> Self {
        self.must.push(query.into());
        self
    }

    /// Add a should clause
    pub fn should(mut self, query: impl Into<Query>) -> Self {
        self.should.push(query.into());
        self
    }

    /// Add a must_not clause
    pub fn must_not(mut self, query: impl Into<Query>) -> Self {
        self.must_not.push(query.into());
        self
    }

    /// Add a clause in place
    pub fn add(&mut self, occur: Occur, query: impl Into<Query>) {
        let query = query.into();
        match occur {
            Occur::Must => self.must.push(query),
            Occur::Should => self.should.push(query),
            Occur::MustNot => self.must_not.push(query),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty()
    }

    pub fn clause_count(&self) -> usize {
        self.must.len() + self.should.len() + self.must_not.len()
    }

    /// All clauses with their occurrence, must first
    pub fn clauses(&self) -> impl Iterator<Item = (Occur, &Query)> {
        self.must
            .iter()
            .map(|q| (Occur::Must, q))
            .chain(self.should.iter().map(|q| (Occur::Should, q)))
            .chain(self.must_not.iter().map(|q| (Occur::MustNot, q)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::nodes::TermQuery;

    #[test]
    fn test_builder() {
        let query = BoolQuery::new()
            .must(TermQuery::new("fulltext", "garlic"))
            .must_not(TermQuery::new("ingredients", "egg"));

        assert_eq!(query.clause_count(), 2);
        assert!(!query.is_empty());
        assert_eq!(query.clauses().next().map(|(occur, _)| occur), Some(Occur::Must));
    }

    #[test]
    fn test_add() {
        let mut query = BoolQuery::new();
        assert!(query.is_empty());

        query.add(Occur::Should, TermQuery::new("fulltext", "basil"));
        assert_eq!(query.should.len(), 1);
    }

    #[test]
    fn test_empty_clauses_are_not_serialized() {
        let query = BoolQuery::new().must(TermQuery::new("fulltext", "garlic"));
        let json = serde_json::to_value(&query).unwrap();

        assert!(json.get("must").is_some());
        assert!(json.get("should").is_none());
    }
}
