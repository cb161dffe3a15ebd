//! Email alias expansion across equivalent domains.
//!
//! Organizations that renamed their mail domain keep records under both
//! names. Each configured pair declares two domains equivalent; expansion
//! follows pairs transitively.

use std::collections::BTreeSet;

use gatekeep_core::{DomainError, DomainResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasDomains {
    /// Lowercased domain pairs.
    pairs: Vec<(String, String)>,
}

impl AliasDomains {
    pub fn new<A, B>(pairs: impl IntoIterator<Item = (A, B)>) -> Self
    where
        A: AsRef<str>,
        B: AsRef<str>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(a, b)| (a.as_ref().to_ascii_lowercase(), b.as_ref().to_ascii_lowercase()))
                .collect(),
        }
    }

    /// Parse `a=b,c=d`. Blank input yields no pairs.
    pub fn parse(input: &str) -> DomainResult<Self> {
        let mut pairs = Vec::new();
        for item in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (a, b) = item
                .split_once('=')
                .map(|(a, b)| (a.trim(), b.trim()))
                .filter(|(a, b)| !a.is_empty() && !b.is_empty() && !a.contains('@') && !b.contains('@'))
                .ok_or_else(|| DomainError::validation(format!("invalid alias domain pair {item:?}")))?;
            pairs.push((a, b));
        }
        Ok(Self::new(pairs))
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// All addresses equivalent to `email`, sorted, including `email` itself.
    ///
    /// Only the whole domain after the last `@` is compared (ASCII
    /// case-insensitively). A configured domain occurring inside a longer
    /// domain is never rewritten. Every equivalent domain, the input's own
    /// included, also appears in lowercase.
    pub fn expand(&self, email: &str) -> BTreeSet<String> {
        let mut out = BTreeSet::from([email.to_string()]);
        let Some((local, domain)) = email.rsplit_once('@') else {
            return out;
        };

        let mut domains = vec![domain.to_ascii_lowercase()];
        let mut i = 0;
        while i < domains.len() {
            for (a, b) in &self.pairs {
                let other = if *a == domains[i] {
                    b
                } else if *b == domains[i] {
                    a
                } else {
                    continue;
                };
                if !domains.contains(other) {
                    domains.push(other.clone());
                }
            }
            i += 1;
        }

        for alias in &domains {
            out.insert(format!("{local}@{alias}"));
        }
        out
    }
}
