/// Options controlling validation behavior.
///
/// Defaults are the strict settings; setters follow the builder idiom
/// and later assignments win.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions {
    /// Skip leafref targets that resolve to no populated value, instead
    /// of reporting them. Useful when validating a fragment without its
    /// full referenced context. A target that is populated but matches
    /// nothing is always an error.
    pub ignore_missing_data: bool,

    /// Accept data fields with no schema counterpart instead of
    /// reporting them.
    pub allow_unknown_fields: bool,
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore_missing_data(mut self, value: bool) -> Self {
        self.ignore_missing_data = value;
        self
    }

    pub fn allow_unknown_fields(mut self, value: bool) -> Self {
        self.allow_unknown_fields = value;
        self
    }
}
