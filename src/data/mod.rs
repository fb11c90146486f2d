pub mod crew;
pub mod loader;
pub mod skill;
pub mod validate;
pub mod voyage;

pub use crew::CrewRecord;
pub use skill::{Skill, SkillValue, SKILL_COUNT};
pub use voyage::{SeatConfig, SkillRole, VoyageConfig, VoyageSkills, SEAT_COUNT};
