//! Widget logic that does not depend on the terminal.

pub(crate) mod numeric;
pub(crate) mod stars;
pub(crate) mod tags;
pub(crate) mod theme;
