//! Remaining-match calculation
//!
//! Every unordered pair of roster names is a pairing to be played. Singles
//! pairings drop out once a match between the two has been recorded; doubles
//! pairings once one team has won the series.

pub mod remaining;

pub use remaining::{
    all_pairings, remaining, remaining_series, remaining_singles, RemainingMatches,
};
