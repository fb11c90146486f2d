#![allow(dead_code)]

use std::collections::BTreeMap;

use voyager::data::{CrewRecord, SeatConfig, Skill, SkillValue, VoyageConfig, VoyageSkills};
use voyager::optimizer::{AssemblerKind, OptimizationRequest, OptimizeOptions};

pub const SEAT_TRAITS: [&str; 12] = [
    "cultural_figure",
    "diplomat",
    "engineer",
    "doctor",
    "scientist",
    "marksman",
    "pilot",
    "hero",
    "telepath",
    "federation",
    "tactician",
    "civilian",
];

/// Two seats per skill in canonical order.
pub fn voyage(primary: Skill, secondary: Skill, ship_antimatter: i32) -> VoyageConfig {
    VoyageConfig {
        skills: VoyageSkills { primary, secondary },
        seats: (0..12)
            .map(|seat| SeatConfig {
                required_skill: Skill::ALL[seat / 2],
                bonus_trait: SEAT_TRAITS[seat].to_string(),
            })
            .collect(),
        ship_antimatter,
    }
}

pub fn crew(id: &str, skills: &[(Skill, f64)], traits: &[&str]) -> CrewRecord {
    CrewRecord {
        id: id.to_string(),
        name: id.to_uppercase(),
        skills: skills
            .iter()
            .map(|(skill, core)| {
                (
                    *skill,
                    SkillValue {
                        core: *core,
                        range_min: core * 0.05,
                        range_max: core * 0.3,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>(),
        traits: traits.iter().map(|t| t.to_string()).collect(),
    }
}

/// A roster of `size` crew with two or three skills each and scattered traits.
pub fn roster(size: usize) -> Vec<CrewRecord> {
    (0..size)
        .map(|i| {
            let main = Skill::ALL[i % 6];
            let side = Skill::ALL[(i + 1 + i / 6) % 6];
            let third = Skill::ALL[(i + 3) % 6];
            let mut skills = vec![(main, 900.0 + 41.0 * ((i * 7) % 13) as f64)];
            if side != main {
                skills.push((side, 300.0 + 17.0 * i as f64));
            }
            if i % 3 == 0 && third != main && third != side {
                skills.push((third, 150.0 + 9.0 * i as f64));
            }
            let traits: Vec<&str> = SEAT_TRAITS
                .iter()
                .enumerate()
                .filter(|(seat, _)| (seat + i) % 5 == 0)
                .map(|(_, name)| *name)
                .collect();
            crew(&format!("crew{i:02}"), &skills, &traits)
        })
        .collect()
}

pub fn request(strategy: AssemblerKind, size: usize) -> OptimizationRequest {
    OptimizationRequest {
        strategy,
        voyage: voyage(Skill::Command, Skill::Science, 2500),
        crew: roster(size),
        options: OptimizeOptions {
            simulations: Some(80),
            seed: Some(1701),
            workers: Some(2),
            ..OptimizeOptions::default()
        },
    }
}
