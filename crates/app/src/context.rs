use thiserror::Error;

/// Environment variable holding the secret the gate compares against.
pub const ACCESS_KEY_ENV: &str = "FOLIO_ACCESS_KEY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("access denied: wrong or missing password")]
    NotAuthenticated,
    #[error("an operator name is required")]
    MissingOperator,
}

/// Who is acting in one invocation, and whether they passed the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub operator: String,
    pub authenticated: bool,
}

impl RequestContext {
    /// The operator name, if this context may run operations.
    pub fn require(&self) -> Result<&str, AccessError> {
        if !self.authenticated {
            return Err(AccessError::NotAuthenticated);
        }
        if self.operator.is_empty() {
            return Err(AccessError::MissingOperator);
        }
        Ok(&self.operator)
    }
}

/// Shared-secret check. With no secret configured nobody gets in.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    secret: Option<String>,
}

impl AccessGate {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret: secret.filter(|s| !s.is_empty()) }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var(ACCESS_KEY_ENV).ok())
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    pub fn authenticate(&self, operator: &str, password: Option<&str>) -> RequestContext {
        let authenticated = match (&self.secret, password) {
            (Some(secret), Some(given)) => secret == given,
            _ => false,
        };
        RequestContext { operator: operator.trim().to_string(), authenticated }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_password_authenticates() {
        let gate = AccessGate::new(Some("s3cret".into()));
        let ctx = gate.authenticate(" ana ", Some("s3cret"));
        assert!(ctx.authenticated);
        assert_eq!(ctx.require(), Ok("ana"));
    }

    #[test]
    fn wrong_or_missing_password_is_denied() {
        let gate = AccessGate::new(Some("s3cret".into()));
        assert_eq!(gate.authenticate("ana", Some("nope")).require(), Err(AccessError::NotAuthenticated));
        assert_eq!(gate.authenticate("ana", None).require(), Err(AccessError::NotAuthenticated));
    }

    #[test]
    fn unconfigured_gate_fails_closed() {
        for gate in [AccessGate::new(None), AccessGate::new(Some(String::new()))] {
            assert!(!gate.is_configured());
            assert!(!gate.authenticate("ana", Some("")).authenticated);
            assert!(!gate.authenticate("ana", Some("anything")).authenticated);
        }
    }

    #[test]
    fn blank_operator_is_rejected() {
        let gate = AccessGate::new(Some("k".into()));
        assert_eq!(gate.authenticate("   ", Some("k")).require(), Err(AccessError::MissingOperator));
    }
}
