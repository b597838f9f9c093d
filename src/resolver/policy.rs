//! Reconciliation knobs: how backup counts combine, the last-resort
//! constant, and whether airing estimates are capped at the planned total.

use serde::{Deserialize, Serialize};

use crate::models::{ResolvedAvailability, SourceEstimate};

/// Fallback for a currently-airing show nobody could count
pub const DEFAULT_FALLBACK_EPISODES: u32 = 6;

/// How to pick one count out of several backup estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupPolicy {
    /// Smallest count. Backups tend to report the planned total, not what aired.
    #[default]
    Minimum,
    /// Largest count
    Maximum,
    /// Highest-priority source that answered
    First,
}

impl BackupPolicy {
    /// Combine ordered estimates. Non-positive counts are ignored; ties go
    /// to the earlier (higher-priority) estimate.
    pub fn combine(&self, estimates: &[SourceEstimate]) -> Option<SourceEstimate> {
        let mut positive = estimates.iter().copied().filter(|e| e.episodes > 0);

        match self {
            BackupPolicy::First => positive.next(),
            BackupPolicy::Minimum => positive.fold(None, |best, e| match best {
                Some(b) if b.episodes <= e.episodes => Some(b),
                _ => Some(e),
            }),
            BackupPolicy::Maximum => positive.fold(None, |best, e| match best {
                Some(b) if b.episodes >= e.episodes => Some(b),
                _ => Some(e),
            }),
        }
    }
}

/// Full resolver policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverPolicy {
    pub backup: BackupPolicy,
    pub fallback_episodes: u32,
    pub clamp_to_planned: bool,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            backup: BackupPolicy::default(),
            fallback_episodes: DEFAULT_FALLBACK_EPISODES,
            clamp_to_planned: true,
        }
    }
}

impl ResolverPolicy {
    /// Cap an airing estimate at a known, positive planned total
    pub fn clamp(&self, mut resolved: ResolvedAvailability, planned_total: Option<u32>) -> ResolvedAvailability {
        if !self.clamp_to_planned {
            return resolved;
        }
        if let Some(total) = planned_total.filter(|&t| t > 0) {
            if resolved.episodes > total {
                resolved.episodes = total;
                resolved.clamped = true;
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Provenance, SourceKind};

    fn est(source: SourceKind, episodes: u32) -> SourceEstimate {
        SourceEstimate::new(source, episodes)
    }

    #[test]
    fn test_minimum_picks_smallest() {
        let estimates = [est(SourceKind::Jikan, 10), est(SourceKind::Kitsu, 7)];
        let picked = BackupPolicy::Minimum.combine(&estimates).unwrap();
        assert_eq!(picked, est(SourceKind::Kitsu, 7));
    }

    #[test]
    fn test_ties_go_to_priority() {
        let estimates = [est(SourceKind::Jikan, 7), est(SourceKind::Kitsu, 7)];
        assert_eq!(
            BackupPolicy::Minimum.combine(&estimates).unwrap().source,
            SourceKind::Jikan
        );
        assert_eq!(
            BackupPolicy::Maximum.combine(&estimates).unwrap().source,
            SourceKind::Jikan
        );
    }

    #[test]
    fn test_maximum_and_first() {
        let estimates = [
            est(SourceKind::Jikan, 0),
            est(SourceKind::Kitsu, 12),
            est(SourceKind::MalSync, 20),
        ];
        assert_eq!(BackupPolicy::Maximum.combine(&estimates).unwrap().episodes, 20);
        assert_eq!(BackupPolicy::First.combine(&estimates).unwrap().episodes, 12);
    }

    #[test]
    fn test_nothing_positive() {
        assert!(BackupPolicy::Minimum.combine(&[]).is_none());
        assert!(BackupPolicy::Minimum
            .combine(&[est(SourceKind::Kitsu, 0)])
            .is_none());
    }

    #[test]
    fn test_clamp() {
        let policy = ResolverPolicy::default();
        let raw = ResolvedAvailability::new(30, Provenance::Fallback);

        let clamped = policy.clamp(raw, Some(24));
        assert_eq!(clamped.episodes, 24);
        assert!(clamped.clamped);

        // Unknown or zero totals leave the estimate alone
        assert_eq!(policy.clamp(raw, None).episodes, 30);
        assert_eq!(policy.clamp(raw, Some(0)).episodes, 30);

        let off = ResolverPolicy {
            clamp_to_planned: false,
            ..Default::default()
        };
        assert_eq!(off.clamp(raw, Some(24)).episodes, 30);
    }
}
