//! Navigation modes
//!
//! There is no one-to-one correspondence between FSM states and navigation
//! modes: several states configure a hold, for example. A state's entry
//! action sets the mode and the matching targets; the per-tick dispatch then
//! farms the work out to the corresponding control strategy.

/// Control strategy selected by the active FSM state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavMode {
    /// Hold at the configured location
    Hold,
    /// Fly the configured path
    Path,
    /// Land at the configured location
    Land,
    /// No mode configured; no control action
    #[default]
    Idle,
}

impl NavMode {
    /// Return variant name as a static string (usable with defmt on embedded)
    pub fn as_str(&self) -> &'static str {
        match self {
            NavMode::Hold => "Hold",
            NavMode::Path => "Path",
            NavMode::Land => "Land",
            NavMode::Idle => "Idle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_idle() {
        assert_eq!(NavMode::default(), NavMode::Idle);
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(NavMode::Hold.as_str(), "Hold");
        assert_eq!(NavMode::Idle.as_str(), "Idle");
    }
}
