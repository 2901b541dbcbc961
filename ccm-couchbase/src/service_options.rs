use std::fmt;
use std::ops::BitOr;

/// Bit-set of the service roles a cluster node can run.
///
/// The bit-set is the canonical in-memory representation; the comma-separated
/// short-code string (`kv,index,n1ql,fts`) understood by the admin API is
/// purely a wire format, produced by [`fmt::Display`] and consumed by
/// [`ServiceOptions::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServiceOptions(u8);

impl ServiceOptions {
    pub const DATA: ServiceOptions = ServiceOptions(1 << 0);
    pub const INDEX: ServiceOptions = ServiceOptions(1 << 1);
    pub const QUERY: ServiceOptions = ServiceOptions(1 << 2);
    pub const FULL_TEXT_SEARCH: ServiceOptions = ServiceOptions(1 << 3);
    pub const ALL: ServiceOptions = ServiceOptions(0b1111);

    pub const fn empty() -> Self {
        ServiceOptions(0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: ServiceOptions) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: ServiceOptions) {
        self.0 |= other.0;
    }

    /// Parse the loose role vocabulary used in service labels
    /// (`data`≡`kv`, `query`≡`n1ql`, `fullTextSearch`≡`fts`).
    /// Unknown tokens are ignored, not errors.
    pub fn parse(value: &str) -> Self {
        let mut options = ServiceOptions::empty();

        for token in value.split(',') {
            match token.trim() {
                "kv" | "data" => options.insert(Self::DATA),
                "index" => options.insert(Self::INDEX),
                "n1ql" | "query" => options.insert(Self::QUERY),
                "fts" | "fullTextSearch" => options.insert(Self::FULL_TEXT_SEARCH),
                _ => continue,
            }
        }

        options
    }
}

impl BitOr for ServiceOptions {
    type Output = ServiceOptions;

    fn bitor(self, rhs: ServiceOptions) -> ServiceOptions {
        ServiceOptions(self.0 | rhs.0)
    }
}

impl fmt::Display for ServiceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut options = Vec::new();

        if self.contains(Self::DATA) {
            options.push("kv");
        }
        if self.contains(Self::INDEX) {
            options.push("index");
        }
        if self.contains(Self::QUERY) {
            options.push("n1ql");
        }
        if self.contains(Self::FULL_TEXT_SEARCH) {
            options.push("fts");
        }

        write!(f, "{}", options.join(","))
    }
}
