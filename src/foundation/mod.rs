pub(crate) mod clock;
pub(crate) mod error;
pub(crate) mod math;
