use std::collections::HashSet;
use std::fmt;

use crate::data::crew::CrewRecord;
use crate::data::skill::Skill;
use crate::data::voyage::{VoyageConfig, SEAT_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == ValidationSeverity::Error)
    }
}

/// Structural checks on the voyage alone. These are the ones the optimizer refuses to run past.
pub fn validate_voyage(voyage: &VoyageConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if voyage.seats.len() != SEAT_COUNT {
        report.push(
            ValidationSeverity::Error,
            "voyage.seats",
            format!("expected {SEAT_COUNT} seats, found {}", voyage.seats.len()),
        );
    }

    for skill in Skill::ALL {
        let count = voyage.seats_for(skill).len();
        if count != 2 {
            report.push(
                ValidationSeverity::Error,
                "voyage.seats",
                format!("{skill} must be required by exactly 2 seats, found {count}"),
            );
        }
    }

    if voyage.skills.primary == voyage.skills.secondary {
        report.push(
            ValidationSeverity::Error,
            "voyage.skills",
            format!("primary and secondary are both {}", voyage.skills.primary),
        );
    }

    for (index, seat) in voyage.seats.iter().enumerate() {
        if seat.bonus_trait.trim().is_empty() {
            report.push(
                ValidationSeverity::Warning,
                format!("voyage.seats[{index}]"),
                "bonus trait is empty; no crew can be ideal here",
            );
        }
    }

    if voyage.ship_antimatter <= 0 {
        report.push(
            ValidationSeverity::Warning,
            "voyage.ship_antimatter",
            format!("ship antimatter is {}", voyage.ship_antimatter),
        );
    }

    report
}

/// Full request check used by the `validate` command: voyage structure plus roster sanity.
pub fn validate_roster(voyage: &VoyageConfig, crew: &[CrewRecord]) -> ValidationReport {
    let mut report = validate_voyage(voyage);

    if crew.len() < SEAT_COUNT {
        report.push(
            ValidationSeverity::Error,
            "crew",
            format!("at least {SEAT_COUNT} crew are required, found {}", crew.len()),
        );
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for (index, member) in crew.iter().enumerate() {
        let context = format!("crew[{index}] '{}'", member.id);
        if member.id.trim().is_empty() {
            report.push(ValidationSeverity::Error, &context, "id must not be empty");
        } else if !seen.insert(member.id.as_str()) {
            report.push(ValidationSeverity::Error, &context, "duplicate crew id");
        }
        if member.skills.is_empty() {
            report.push(
                ValidationSeverity::Warning,
                &context,
                "no voyage skills; crew will never be seated",
            );
        }
        for (skill, value) in &member.skills {
            if value.core < 0.0 || value.range_min < 0.0 || value.range_max < 0.0 {
                report.push(
                    ValidationSeverity::Error,
                    &context,
                    format!("{skill} has negative values"),
                );
            }
            if value.range_max < value.range_min {
                report.push(
                    ValidationSeverity::Error,
                    &context,
                    format!(
                        "{skill} range_max {} is below range_min {}",
                        value.range_max, value.range_min
                    ),
                );
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::skill::SkillValue;
    use crate::data::voyage::fixtures::standard_voyage;

    #[test]
    fn standard_voyage_is_valid() {
        let voyage = standard_voyage(Skill::Command, Skill::Science, 2500);
        assert!(!validate_voyage(&voyage).has_errors());
    }

    #[test]
    fn missing_seat_and_equal_skills_are_errors() {
        let mut voyage = standard_voyage(Skill::Medicine, Skill::Medicine, 2500);
        voyage.seats.pop();
        let report = validate_voyage(&voyage);
        assert!(report.has_errors());
        assert!(report.errors().count() >= 3, "{:?}", report.diagnostics);
    }

    #[test]
    fn roster_errors_cover_duplicates_and_inverted_ranges() {
        let voyage = standard_voyage(Skill::Command, Skill::Science, 2500);
        let mut skills = std::collections::BTreeMap::new();
        skills.insert(
            Skill::Command,
            SkillValue {
                core: 100.0,
                range_min: 50.0,
                range_max: 10.0,
            },
        );
        let member = CrewRecord {
            id: "kirk".to_string(),
            name: "Kirk".to_string(),
            skills,
            traits: vec![],
        };
        let report = validate_roster(&voyage, &[member.clone(), member]);
        let messages: Vec<String> = report.errors().map(|d| d.message.clone()).collect();
        assert!(messages.iter().any(|m| m.contains("duplicate crew id")));
        assert!(messages.iter().any(|m| m.contains("range_max")));
        assert!(messages.iter().any(|m| m.contains("at least 12 crew")));
    }
}
