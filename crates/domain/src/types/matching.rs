//! Outcome of correlating an idempotency key with remote records

/// Zero, one or many remote identifiers correlated with one idempotency key.
///
/// Two or more candidates are never narrowed down automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult<Id> {
    NotFound,
    Found(Id),
    Ambiguous(Vec<Id>),
}

impl<Id> MatchResult<Id> {
    /// Classify a candidate list returned by a remote lookup.
    pub fn from_candidates(mut candidates: Vec<Id>) -> Self {
        match candidates.len() {
            0 => Self::NotFound,
            1 => match candidates.pop() {
                Some(only) => Self::Found(only),
                None => Self::NotFound,
            },
            _ => Self::Ambiguous(candidates),
        }
    }

    /// Number of candidates; an ambiguous result reports all of them.
    pub fn match_count(&self) -> usize {
        match self {
            Self::NotFound => 0,
            Self::Found(_) => 1,
            Self::Ambiguous(candidates) => candidates.len(),
        }
    }
}
