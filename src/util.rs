pub(crate) mod duration_millis;
pub(crate) mod maybe_split_once;
