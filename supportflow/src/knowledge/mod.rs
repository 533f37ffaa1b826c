//! Knowledge-base search collaborator.
//!
//! This module provides:
//! - The [`KnowledgeBase`] interface the search abilities call
//! - An in-memory keyword-overlap implementation with a sample FAQ

use crate::errors::KnowledgeBaseError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A single ranked knowledge-base hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbHit {
    /// The FAQ question.
    pub question: String,
    /// The FAQ answer.
    pub answer: String,
    /// Where the entry came from.
    pub source: String,
}

impl KbHit {
    /// Creates a new hit.
    #[must_use]
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            source: source.into(),
        }
    }
}

/// Ranked lookup over a support knowledge base.
///
/// Implementations return an empty list when nothing matches and an error
/// only when the backing index cannot be queried at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Returns up to `top_k` hits for `query`, best first.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<KbHit>, KnowledgeBaseError>;
}

const STOPWORDS: [&str; 16] = [
    "the", "and", "for", "you", "your", "has", "hasn", "have", "haven", "what", "how", "can",
    "with", "why", "isn", "not",
];

/// An in-memory knowledge base ranked by query-term overlap.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKnowledgeBase {
    entries: Vec<KbHit>,
}

impl InMemoryKnowledgeBase {
    /// Creates a knowledge base from entries.
    #[must_use]
    pub fn from_entries(entries: Vec<KbHit>) -> Self {
        Self { entries }
    }

    /// Loads entries from a JSON array of `{question, answer, source}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, KnowledgeBaseError> {
        let content = fs::read_to_string(path)?;
        let entries: Vec<KbHit> = serde_json::from_str(&content)?;
        Ok(Self::from_entries(entries))
    }

    /// A small customer-support FAQ.
    #[must_use]
    pub fn sample() -> Self {
        Self::from_entries(vec![
            KbHit::new(
                "Where is my order?",
                "Orders usually arrive within 5-7 business days. You can track your order from the link in your confirmation email, and if it has not arrived after 7 days we will ship a replacement.",
                "faq/shipping",
            ),
            KbHit::new(
                "My delivery is delayed. What can I do?",
                "Delivery delays are usually caused by the carrier. Check the tracking page for your order; we reship any order delayed by more than a week.",
                "faq/shipping",
            ),
            KbHit::new(
                "What is your return policy?",
                "You can return any item within 30 days of delivery for a full refund, provided it is unused and in its original packaging.",
                "faq/returns",
            ),
            KbHit::new(
                "How do I request a refund?",
                "Refunds are issued to the original payment method within 5 business days after we receive the returned item.",
                "faq/returns",
            ),
            KbHit::new(
                "How can I download my invoice?",
                "Invoices are available under Account > Orders. Select the order and choose Download invoice.",
                "faq/billing",
            ),
            KbHit::new(
                "How do I reset my password?",
                "Use the Forgot password link on the sign-in page and follow the emailed instructions.",
                "faq/account",
            ),
        ])
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ranks entries for `query`, dropping entries that share no terms.
    #[must_use]
    pub fn rank(&self, query: &str, top_k: usize) -> Vec<KbHit> {
        let terms = query_terms(query);
        if terms.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(f64, &KbHit)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let score = relevance_score(entry, &terms);
                (score > 0.0).then_some((score, entry))
            })
            .collect();

        // stable sort keeps insertion order on ties
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(top_k)
            .map(|(_, entry)| entry.clone())
            .collect()
    }
}

#[async_trait]
impl KnowledgeBase for InMemoryKnowledgeBase {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<KbHit>, KnowledgeBaseError> {
        Ok(self.rank(query, top_k))
    }
}

fn query_terms(query: &str) -> HashSet<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|term| term.len() >= 3 && !STOPWORDS.contains(term))
        .map(String::from)
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn relevance_score(entry: &KbHit, terms: &HashSet<String>) -> f64 {
    let content = format!("{} {}", entry.question, entry.answer).to_lowercase();
    let matches = terms.iter().filter(|term| content.contains(term.as_str())).count();
    matches as f64 / terms.len() as f64
}
