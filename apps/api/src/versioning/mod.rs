// Version history for prompts and assets.
// Implements: tag ordering, latest resolution, line diffs, compare selection,
// reference tokens and the marketplace publication lifecycle.

pub mod compare;
pub mod diff;
pub mod extract;
pub mod handlers;
pub mod latest;
pub mod marketplace;
pub mod optimistic;
pub mod reference;
pub mod tag;
pub mod validation;
