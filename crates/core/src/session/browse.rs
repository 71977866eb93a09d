use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductId};

/// Similar-product carousel opened after a search with no exact match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseSession {
    pub original_query: String,
    candidates: Vec<Product>,
    cursor: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BrowseStep {
    Show { product: Product, has_next: bool },
    AllQuoted,
    Exhausted,
}

impl BrowseSession {
    pub fn new(original_query: impl Into<String>, candidates: Vec<Product>) -> Self {
        Self { original_query: original_query.into(), candidates, cursor: 0 }
    }

    pub fn candidates(&self) -> &[Product] {
        &self.candidates
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&Product> {
        self.candidates.get(self.cursor)
    }

    pub fn contains(&self, product_id: ProductId) -> bool {
        self.candidates.iter().any(|candidate| candidate.id == product_id)
    }

    /// Moves past the candidate currently shown.
    pub fn advance(&mut self) {
        if self.cursor < self.candidates.len() {
            self.cursor += 1;
        }
    }

    /// Skips candidates already on the quotation and returns the first one
    /// left to show. Visits each candidate at most once.
    pub fn next_unquoted(&mut self, is_quoted: impl Fn(ProductId) -> bool) -> BrowseStep {
        let mut skipped = false;
        while let Some(candidate) = self.candidates.get(self.cursor) {
            if !is_quoted(candidate.id) {
                return BrowseStep::Show {
                    product: candidate.clone(),
                    has_next: self.cursor + 1 < self.candidates.len(),
                };
            }
            skipped = true;
            self.cursor += 1;
        }

        if skipped {
            BrowseStep::AllQuoted
        } else {
            BrowseStep::Exhausted
        }
    }
}
