pub const DEFAULT_PROFILE: &str = "default";

const MASTERY_KEY: &str = "vocab-mastery";
const STATS_KEY: &str = "vocab-stats";

/// Storage keys for one learner. The default profile uses the bare keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileKeys {
    profile: String,
}

impl ProfileKeys {
    pub fn new(profile: Option<&str>) -> Self {
        let profile = profile
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PROFILE);
        Self {
            profile: profile.to_string(),
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn mastery(&self) -> String {
        self.scoped(MASTERY_KEY)
    }

    pub fn stats(&self) -> String {
        self.scoped(STATS_KEY)
    }

    fn scoped(&self, key: &str) -> String {
        if self.profile == DEFAULT_PROFILE {
            key.to_string()
        } else {
            format!("profile:{}:{}", self.profile, key)
        }
    }
}

impl Default for ProfileKeys {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_uses_bare_keys() {
        let keys = ProfileKeys::new(Some("  "));
        assert_eq!(keys.profile(), "default");
        assert_eq!(keys.mastery(), "vocab-mastery");
        assert_eq!(keys.stats(), "vocab-stats");
    }

    #[test]
    fn named_profile_is_prefixed() {
        let keys = ProfileKeys::new(Some("yuki"));
        assert_eq!(keys.mastery(), "profile:yuki:vocab-mastery");
        assert_eq!(keys.stats(), "profile:yuki:vocab-stats");
    }
}
