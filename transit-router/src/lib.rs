//! Multimodal transit routing.
//!
//! Answers "how do I get from here to there?" over a timetabled network
//! with Range-RAPTOR, then moves each path's transfers to the points a rider
//! would prefer: facilitated transfers first, then the most comfortable
//! waits.

pub mod domain;
pub mod optimize;
pub mod raptor;
pub mod router;
pub mod transit;
