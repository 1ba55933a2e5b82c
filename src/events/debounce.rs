// Debounce gate
// Single global cooldown between dispatches, regardless of event kind

/// Cooldown applied when none is configured
pub const DEFAULT_COOLDOWN_MS: i64 = 5000;

/// Suppresses repeated firings within a cooldown window
/// One gate is shared by all kinds: a fire alarm right after a doorbell is
/// suppressed too.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    cooldown_ms: i64,
    last_fired_at: Option<i64>,
}

impl DebounceGate {
    pub fn new(cooldown_ms: i64) -> Self {
        DebounceGate {
            cooldown_ms,
            last_fired_at: None,
        }
    }

    /// Returns true and records `now_ms` if the cooldown has elapsed
    pub fn allow(&mut self, now_ms: i64) -> bool {
        let open = match self.last_fired_at {
            None => true,
            Some(last) => now_ms - last > self.cooldown_ms,
        };
        if open {
            self.last_fired_at = Some(now_ms);
        }
        open
    }

    pub fn last_fired_at(&self) -> Option<i64> {
        self.last_fired_at
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_firing_is_allowed() {
        let mut gate = DebounceGate::default();
        assert!(gate.allow(0));
        assert_eq!(gate.last_fired_at(), Some(0));
    }

    #[test]
    fn test_within_cooldown_is_suppressed() {
        let mut gate = DebounceGate::default();
        assert!(gate.allow(1_000));
        assert!(!gate.allow(4_000));
        // Suppressed attempts do not extend the cooldown
        assert_eq!(gate.last_fired_at(), Some(1_000));
        assert!(gate.allow(7_000));
    }

    #[test]
    fn test_cooldown_boundary_is_exclusive() {
        let mut gate = DebounceGate::default();
        assert!(gate.allow(10_000));
        assert!(!gate.allow(15_000));
        assert!(gate.allow(15_001));
    }
}
