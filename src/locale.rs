//! The configured locale set and its fallback order.

/// Supported locale codes plus the default locale.
///
/// The enumeration order is significant: it is the order in which the
/// remaining locales are tried once the requested and default locale have
/// both failed. Keeping it fixed (rather than following JSON key order)
/// makes every fallback decision reproducible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locales {
    all: Vec<String>,
    default: String,
}

impl Locales {
    /// `default` is expected to be a member of `all`; config validation
    /// guarantees it for loaded configs.
    pub fn new(all: Vec<String>, default: String) -> Self {
        Self { all, default }
    }

    pub fn all(&self) -> &[String] {
        &self.all
    }

    pub fn default_locale(&self) -> &str {
        &self.default
    }

    pub fn is_known(&self, code: &str) -> bool {
        self.all.iter().any(|l| l == code)
    }

    /// Locales to try for `requested`, in order, without repeats:
    /// requested → default → the remaining locales in enumeration order.
    ///
    /// `requested` does not need to be a configured locale; it is still
    /// tried first.
    pub fn fallback_chain<'a>(&'a self, requested: &'a str) -> Vec<&'a str> {
        let mut chain: Vec<&str> = Vec::with_capacity(self.all.len() + 1);
        for code in [requested, self.default.as_str()]
            .into_iter()
            .chain(self.all.iter().map(String::as_str))
        {
            if !chain.contains(&code) {
                chain.push(code);
            }
        }
        chain
    }
}
