pub mod aggregator;
pub mod score;

pub use aggregator::{
    Ballot, BatchOutcome, CastOutcome, FreeVoteState, ReputationAggregator, RowError,
    VoteTransition,
};
pub use score::tally;
