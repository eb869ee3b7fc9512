//! Parsing of fully qualified RPC method names.

/// A method name split into its dotted full name and its service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodName {
    /// Dotted method name used for rule matching, e.g. `pkg.Service.Method`.
    pub full: String,
    /// Dotted service name, e.g. `pkg.Service`.
    pub service: String,
}

impl MethodName {
    /// Parse a gRPC style `/pkg.Service/Method` path or an already dotted name.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim_start_matches('/');
        if let Some((service, method)) = trimmed.rsplit_once('/') {
            return Self {
                full: format!("{service}.{method}"),
                service: service.to_string(),
            };
        }
        let service = trimmed
            .rsplit_once('.')
            .map_or("", |(service, _)| service);
        Self {
            full: trimmed.to_string(),
            service: service.to_string(),
        }
    }
}
