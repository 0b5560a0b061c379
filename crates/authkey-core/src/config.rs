//! Protocol configuration shared by every signing and verification operation.
//!
//! The configuration is assembled once at construction and never re-read.
//! Accessors apply the documented defaults, so an empty field can never
//! surface on the wire.

/// AuthKey protocol configuration.
///
/// # Examples
///
/// ```
/// use authkey_core::AuthConfig;
///
/// let config = AuthConfig::default();
/// assert_eq!(config.header_name(), "Auth-Key");
/// assert_eq!(config.prefix(), "x-mac-");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthConfig {
    /// Name of the auth header on the wire.
    pub name: String,
    /// Scheme token carried in the auth header and the canonical string.
    pub scheme: String,
    /// Source name for the extension-header prefix (normalized to `x-<name>-`).
    pub xname: String,
    /// Replay window in seconds.
    pub interval: u64,
}

impl AuthConfig {
    /// Default auth header name.
    pub const DEF_NAME: &str = "Auth-Key";
    /// Default scheme token.
    pub const DEF_SCHEME: &str = "MAC";
    /// Default extension-header prefix source name.
    pub const DEF_XNAME: &str = "mac";
    /// Default replay window in seconds.
    pub const DEF_INTERVAL: u64 = 600;

    /// Create a configuration, falling back to defaults for empty values.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        scheme: impl Into<String>,
        xname: impl Into<String>,
        interval: u64,
    ) -> Self {
        Self {
            name: name.into(),
            scheme: scheme.into(),
            xname: xname.into(),
            interval,
        }
    }

    /// Load configuration from environment variables, overriding defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("AUTHKEY_NAME") {
            config.name = v;
        }
        if let Ok(v) = std::env::var("AUTHKEY_SCHEME") {
            config.scheme = v;
        }
        if let Ok(v) = std::env::var("AUTHKEY_XNAME") {
            config.xname = v;
        }
        if let Ok(v) = std::env::var("AUTHKEY_INTERVAL") {
            if let Ok(n) = v.parse() {
                config.interval = n;
            }
        }

        config
    }

    /// The auth header name, never empty.
    #[must_use]
    pub fn header_name(&self) -> &str {
        if self.name.is_empty() {
            Self::DEF_NAME
        } else {
            &self.name
        }
    }

    /// The scheme token, never empty.
    #[must_use]
    pub fn scheme(&self) -> &str {
        if self.scheme.is_empty() {
            Self::DEF_SCHEME
        } else {
            &self.scheme
        }
    }

    /// The replay window in seconds, never zero.
    #[must_use]
    pub fn interval(&self) -> u64 {
        if self.interval == 0 {
            Self::DEF_INTERVAL
        } else {
            self.interval
        }
    }

    /// The normalized extension-header prefix: `x-<name>-`, lower case.
    ///
    /// Normalization strips a leading `x` plus hyphens from `xname`,
    /// truncates at the first remaining hyphen and lower-cases the result.
    ///
    /// # Examples
    ///
    /// ```
    /// use authkey_core::AuthConfig;
    ///
    /// assert_eq!(AuthConfig::new("", "", "ms", 0).prefix(), "x-ms-");
    /// assert_eq!(AuthConfig::new("", "", "x-fred-", 0).prefix(), "x-fred-");
    /// ```
    #[must_use]
    pub fn prefix(&self) -> String {
        let xname = if self.xname.is_empty() {
            Self::DEF_XNAME
        } else {
            &self.xname
        };

        // Deconstruct and reconstruct: strip any initial `x` + hyphens,
        // then truncate at the first remaining hyphen.
        let stripped = strip_x_prefix(xname);
        let base = stripped.find('-').map_or(stripped, |i| &stripped[..i]);
        let base = if base.is_empty() { Self::DEF_XNAME } else { base };

        format!("x-{}-", base.to_lowercase())
    }

    /// The auth header name in CGI variable form (`HTTP_AUTH_KEY`).
    #[must_use]
    pub fn cgi_header_name(&self) -> String {
        cgi_name(self.header_name())
    }

    /// The extension-header prefix in CGI variable form (`HTTP_X_MAC_`).
    #[must_use]
    pub fn cgi_prefix(&self) -> String {
        cgi_name(&self.prefix())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            name: Self::DEF_NAME.to_owned(),
            scheme: Self::DEF_SCHEME.to_owned(),
            xname: Self::DEF_XNAME.to_owned(),
            interval: Self::DEF_INTERVAL,
        }
    }
}

/// Map a wire header name to its CGI variable form: `HTTP_` prefix,
/// upper-cased, hyphens replaced with underscores.
#[must_use]
pub fn cgi_name(name: &str) -> String {
    format!("HTTP_{}", name.to_uppercase().replace('-', "_"))
}

/// Strip a leading `x` (case-insensitive) followed by one or more hyphens.
fn strip_x_prefix(name: &str) -> &str {
    let Some(rest) = name.strip_prefix('x').or_else(|| name.strip_prefix('X')) else {
        return name;
    };
    if !rest.starts_with('-') {
        return name;
    }
    rest.trim_start_matches('-')
}
