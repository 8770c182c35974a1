//! Create/update/reject decision
//!
//! The reconciler never picks among several candidates: two or more matches
//! always reject the run and no write is attempted.

use taskbridge_domain::MatchResult;

/// What to do with a normalized record given its matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<Id> {
    Create,
    Update(Id),
    Reject { match_count: usize },
}

pub fn decide<Id>(matches: MatchResult<Id>) -> Decision<Id> {
    let match_count = matches.match_count();
    match matches {
        MatchResult::NotFound => Decision::Create,
        MatchResult::Found(id) => Decision::Update(id),
        MatchResult::Ambiguous(_) => Decision::Reject { match_count },
    }
}
