pub(crate) trait MaybeSplitOnce {
    /// Splits the string at the first occurrence of `split`. If it doesn't occur, the whole string is returned with
    /// nothing after it.
    fn maybe_split_once(&self, split: char) -> (&str, Option<&str>);
}

impl MaybeSplitOnce for str {
    fn maybe_split_once(&self, split: char) -> (&str, Option<&str>) {
        match self.split_once(split) {
            Some((left, right)) => (left, Some(right)),
            None => (self, None),
        }
    }
}
