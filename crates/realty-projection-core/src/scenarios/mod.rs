pub mod orchestrator;
pub mod presets;

use serde::{Deserialize, Serialize};

use crate::types::push_warning;

/// Named parameter bundle a projection can be run under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Baseline,
    Conservative,
    Optimistic,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] = [
        ScenarioKind::Baseline,
        ScenarioKind::Conservative,
        ScenarioKind::Optimistic,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ScenarioKind::Baseline => "Baseline",
            ScenarioKind::Conservative => "Conservative",
            ScenarioKind::Optimistic => "Optimistic",
        }
    }
}

/// Which scenarios a projection is run under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "scenarios", rename_all = "snake_case")]
pub enum ScenarioSelection {
    Single(ScenarioKind),
    AllScenarios,
    Selected(Vec<ScenarioKind>),
}

impl Default for ScenarioSelection {
    fn default() -> Self {
        ScenarioSelection::Single(ScenarioKind::Baseline)
    }
}

impl ScenarioSelection {
    /// Scenarios to run, in request order without repeats. An empty
    /// selection falls back to the baseline.
    pub fn resolve(&self, warnings: &mut Vec<String>) -> Vec<ScenarioKind> {
        match self {
            ScenarioSelection::Single(s) => vec![*s],
            ScenarioSelection::AllScenarios => ScenarioKind::ALL.to_vec(),
            ScenarioSelection::Selected(list) if list.is_empty() => {
                push_warning(
                    warnings,
                    "No scenarios selected; running the baseline scenario".into(),
                );
                vec![ScenarioKind::Baseline]
            }
            ScenarioSelection::Selected(list) => {
                let mut resolved = Vec::with_capacity(list.len());
                for s in list {
                    if !resolved.contains(s) {
                        resolved.push(*s);
                    }
                }
                resolved
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_scenarios_in_order() {
        let resolved = ScenarioSelection::AllScenarios.resolve(&mut Vec::new());
        assert_eq!(resolved, ScenarioKind::ALL.to_vec());
    }

    #[test]
    fn test_empty_selection_falls_back_to_baseline() {
        let mut warnings = Vec::new();
        let resolved = ScenarioSelection::Selected(vec![]).resolve(&mut warnings);
        assert_eq!(resolved, vec![ScenarioKind::Baseline]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_selected_drops_repeats() {
        let sel = ScenarioSelection::Selected(vec![
            ScenarioKind::Optimistic,
            ScenarioKind::Baseline,
            ScenarioKind::Optimistic,
        ]);
        assert_eq!(
            sel.resolve(&mut Vec::new()),
            vec![ScenarioKind::Optimistic, ScenarioKind::Baseline]
        );
    }

    #[test]
    fn test_selection_json_shape() {
        let sel: ScenarioSelection =
            serde_json::from_str(r#"{"mode":"single","scenarios":"conservative"}"#).unwrap();
        assert_eq!(sel, ScenarioSelection::Single(ScenarioKind::Conservative));
        let all: ScenarioSelection = serde_json::from_str(r#"{"mode":"all_scenarios"}"#).unwrap();
        assert_eq!(all, ScenarioSelection::AllScenarios);
    }
}
