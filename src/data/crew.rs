use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::skill::{Skill, SkillValue};

/// One roster member as handed over by the roster provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub skills: BTreeMap<Skill, SkillValue>,
    #[serde(default)]
    pub traits: Vec<String>,
}

impl CrewRecord {
    pub fn skill(&self, skill: Skill) -> Option<&SkillValue> {
        self.skills.get(&skill)
    }

    pub fn has_skill(&self, skill: Skill) -> bool {
        self.skills.contains_key(&skill)
    }

    pub fn has_trait(&self, wanted: &str) -> bool {
        self.traits
            .iter()
            .any(|candidate| candidate.trim().eq_ignore_ascii_case(wanted.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crew_record_parses_skill_map_and_traits() {
        let raw = r#"{
            "id": "spock",
            "name": "Spock",
            "skills": {
                "science_skill": { "core": 1200, "range_min": 150, "range_max": 400 },
                "cmd": { "core": 600 }
            },
            "traits": ["Vulcan", "Federation"]
        }"#;
        let crew: CrewRecord = serde_json::from_str(raw).expect("crew should parse");
        assert_eq!(crew.skills.len(), 2);
        assert_eq!(crew.skill(Skill::Command).map(|v| v.core), Some(600.0));
        assert!(crew.has_trait("vulcan"));
        assert!(!crew.has_trait("romulan"));
    }
}
