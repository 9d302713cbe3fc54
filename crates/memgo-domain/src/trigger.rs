//! Trigger module - origins of a reclamation request

/// Source of a reclamation request
///
/// Ordered by priority: when several sources are ready at once, a manual
/// request is served before a threshold breach, and a threshold breach before
/// a scheduled tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Trigger {
    /// Operator asked for a clean
    Manual,

    /// A sample crossed the usage threshold
    Threshold,

    /// The wall-clock schedule fired
    Scheduled,
}

impl Trigger {
    /// Get the trigger name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Manual => "manual",
            Trigger::Threshold => "threshold",
            Trigger::Scheduled => "scheduled",
        }
    }

    /// All triggers in priority order
    pub fn all() -> [Trigger; 3] {
        [Trigger::Manual, Trigger::Threshold, Trigger::Scheduled]
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert!(Trigger::Manual < Trigger::Threshold);
        assert!(Trigger::Threshold < Trigger::Scheduled);

        let mut shuffled = vec![Trigger::Scheduled, Trigger::Manual, Trigger::Threshold];
        shuffled.sort();
        assert_eq!(shuffled, Trigger::all().to_vec());
    }

    #[test]
    fn test_as_str() {
        assert_eq!(Trigger::Manual.as_str(), "manual");
        assert_eq!(Trigger::Threshold.to_string(), "threshold");
        assert_eq!(Trigger::Scheduled.to_string(), "scheduled");
    }
}
