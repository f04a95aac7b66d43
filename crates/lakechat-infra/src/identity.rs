//! Configured identity source.

use lakechat_core::identity::IdentityProvider;
use lakechat_types::config::ClientConfig;

/// Identity fixed at startup from configuration.
///
/// An empty or whitespace-only id counts as signed out.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user_id: Option<String>,
}

impl StaticIdentity {
    pub fn new(user_id: Option<String>) -> Self {
        let user_id = user_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        Self { user_id }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.user_id.clone())
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_in_user_is_returned() {
        let identity = StaticIdentity::new(Some(" acme-co ".to_string()));
        assert_eq!(identity.current_user_id().as_deref(), Some("acme-co"));
    }

    #[test]
    fn blank_user_is_signed_out() {
        assert!(StaticIdentity::new(Some("  ".to_string())).current_user_id().is_none());
        assert!(StaticIdentity::new(None).current_user_id().is_none());
    }

    #[test]
    fn from_config_reads_user_id() {
        let config = ClientConfig {
            user_id: Some("globex".to_string()),
            ..ClientConfig::default()
        };
        assert_eq!(
            StaticIdentity::from_config(&config).current_user_id().as_deref(),
            Some("globex")
        );
    }
}
