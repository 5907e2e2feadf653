//! Optional matcher capabilities.
//!
//! The optional collaborator set is fixed: manual resolution and logging.
//! Cascade behavior does not depend on which of them are registered; only
//! whether the manual stage runs does.

/// Optional collaborator a matcher may have registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatcherCapability {
    ManualResolve,
    Log,
}

/// Stable string value for manual resolution.
pub const MATCHER_CAPABILITY_MANUAL_RESOLVE: &str = "manual_resolve";
/// Stable string value for logging.
pub const MATCHER_CAPABILITY_LOG: &str = "log";

impl MatcherCapability {
    /// Every capability, in declaration order.
    pub const ALL: [MatcherCapability; 2] = [Self::ManualResolve, Self::Log];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManualResolve => MATCHER_CAPABILITY_MANUAL_RESOLVE,
            Self::Log => MATCHER_CAPABILITY_LOG,
        }
    }

    /// User-facing short description.
    pub fn description(self) -> &'static str {
        match self {
            Self::ManualResolve => {
                "Ask a human to pick among remaining candidates before the external classifier."
            }
            Self::Log => "Receive one diagnostic line per cascade stage outcome.",
        }
    }
}
