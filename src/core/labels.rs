//! Activity labels and the label-selection rule.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classifier output: label code (e.g. `"wlk"`) to probability.
pub type ClassProbabilities = BTreeMap<String, f64>;

/// Label published before any prediction, or when no label can be selected.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// The activities the classifier distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActivityLabel {
    Downstairs,
    Upstairs,
    Sitting,
    Standing,
    Walking,
    Jogging,
}

impl ActivityLabel {
    /// All labels in model output order.
    pub const ALL: [ActivityLabel; 6] = [
        ActivityLabel::Downstairs,
        ActivityLabel::Upstairs,
        ActivityLabel::Sitting,
        ActivityLabel::Standing,
        ActivityLabel::Walking,
        ActivityLabel::Jogging,
    ];

    /// Short code used as the classifier output key.
    pub fn code(self) -> &'static str {
        match self {
            ActivityLabel::Downstairs => "dws",
            ActivityLabel::Upstairs => "ups",
            ActivityLabel::Sitting => "sit",
            ActivityLabel::Standing => "std",
            ActivityLabel::Walking => "wlk",
            ActivityLabel::Jogging => "jog",
        }
    }

    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            ActivityLabel::Downstairs => "Downstairs",
            ActivityLabel::Upstairs => "Upstairs",
            ActivityLabel::Sitting => "Sitting",
            ActivityLabel::Standing => "Standing",
            ActivityLabel::Walking => "Walking",
            ActivityLabel::Jogging => "Jogging",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.code() == code)
    }
}

impl std::fmt::Display for ActivityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Pick the label with the highest probability.
///
/// Returns `None` when the mapping is empty, the maximum is shared by more
/// than one label, the maximum is not a finite number, or the winning code
/// is not a known activity.
pub fn select_label(probabilities: &ClassProbabilities) -> Option<ActivityLabel> {
    let mut best: Option<(&str, f64)> = None;
    let mut tied = false;

    for (code, &p) in probabilities {
        if p.is_nan() {
            continue;
        }
        match best {
            Some((_, best_p)) if p < best_p => {}
            Some((_, best_p)) if p == best_p => tied = true,
            _ => {
                best = Some((code.as_str(), p));
                tied = false;
            }
        }
    }

    let (code, p) = best?;
    if tied || !p.is_finite() {
        return None;
    }
    ActivityLabel::from_code(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probs(entries: &[(&str, f64)]) -> ClassProbabilities {
        entries.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_codes_round_trip() {
        for label in ActivityLabel::ALL {
            assert_eq!(ActivityLabel::from_code(label.code()), Some(label));
        }
        assert_eq!(ActivityLabel::from_code("run"), None);
    }

    #[test]
    fn test_selects_maximum() {
        let p = probs(&[("sit", 0.1), ("wlk", 0.7), ("jog", 0.2)]);
        let label = select_label(&p);
        assert_eq!(label, Some(ActivityLabel::Walking));
        assert_eq!(label.map(|l| l.display_name()), Some("Walking"));
    }

    #[test]
    fn test_empty_mapping_is_unknown() {
        assert_eq!(select_label(&ClassProbabilities::new()), None);
    }

    #[test]
    fn test_tied_maximum_is_unknown() {
        let p = probs(&[("sit", 0.4), ("std", 0.4), ("wlk", 0.2)]);
        assert_eq!(select_label(&p), None);
    }

    #[test]
    fn test_tie_below_maximum_is_ignored() {
        let p = probs(&[("sit", 0.1), ("std", 0.1), ("jog", 0.8)]);
        assert_eq!(select_label(&p), Some(ActivityLabel::Jogging));
    }

    #[test]
    fn test_unknown_code_is_unknown() {
        let p = probs(&[("fly", 0.9), ("wlk", 0.1)]);
        assert_eq!(select_label(&p), None);
    }

    #[test]
    fn test_nan_entries_are_skipped() {
        let p = probs(&[("dws", f64::NAN), ("ups", 0.6), ("wlk", 0.4)]);
        assert_eq!(select_label(&p), Some(ActivityLabel::Upstairs));
    }
}
