use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::GhAssessError;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// The professional viewpoint the model writes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Persona {
    #[default]
    PublicHealthRecruiter,
    SiliconValleyVc,
    SeniorStaffEngineer,
    OpenSourceMaintainer,
    HrComplianceOfficer,
}

impl Persona {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PublicHealthRecruiter => "public-health-recruiter",
            Self::SiliconValleyVc => "silicon-valley-vc",
            Self::SeniorStaffEngineer => "senior-staff-engineer",
            Self::OpenSourceMaintainer => "open-source-maintainer",
            Self::HrComplianceOfficer => "hr-compliance-officer",
        }
    }

    fn voice(self) -> &'static str {
        match self {
            Self::PublicHealthRecruiter => {
                "You are a recruiter for a public health agency who has wandered into the \
                 world of software. You judge every developer by whether their work could \
                 plausibly help run a vaccination campaign, track an outbreak or keep a \
                 county clinic's spreadsheets alive. You are earnest, a little confused by \
                 tech jargon, and you keep relating things back to epidemiology."
            }
            Self::SiliconValleyVc => {
                "You are a Silicon Valley venture capitalist reviewing a founder's GitHub \
                 before a seed meeting. You speak in terms of traction, moats, market size \
                 and whether this person could be the next unicorn CTO. You are enthusiastic \
                 about anything that smells like AI and skeptical of anything that doesn't \
                 scale."
            }
            Self::SeniorStaffEngineer => {
                "You are a senior staff engineer doing a hiring-committee review. You care \
                 about code quality signals, consistency, commit hygiene, project scope and \
                 technical depth. You have seen every framework come and go and are hard to \
                 impress."
            }
            Self::OpenSourceMaintainer => {
                "You are a long-time open source maintainer sizing up a potential \
                 contributor. You look at what they build, what they star, how they write \
                 commit messages and whether they would be pleasant to review pull requests \
                 from."
            }
            Self::HrComplianceOfficer => {
                "You are an HR compliance officer asked to assess a candidate's public \
                 GitHub activity. You are procedural and cautious, fixated on policy, \
                 professionalism and anything in a commit message that could become a \
                 workplace incident."
            }
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assessment intensity, always within 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Intensity(u8);

impl Intensity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn temperature(self) -> f32 {
        temperature_for(self.0)
    }

    fn verbosity(self) -> &'static str {
        match self.0 {
            1 => "Keep it gentle and brief: two or three sentences at most.",
            2 => "Keep it light: one short paragraph.",
            4 => "Be pointed and specific: three or four paragraphs.",
            5 => {
                "Hold nothing back: a long, theatrical assessment of five or more \
                 paragraphs that digs into every detail you found."
            }
            _ => "Be balanced: two paragraphs.",
        }
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for Intensity {
    type Error = GhAssessError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(GhAssessError::InvalidArgument(format!(
                "intensity must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )))
        }
    }
}

impl From<Intensity> for u8 {
    fn from(value: Intensity) -> Self {
        value.0
    }
}

/// Sampling temperature for an intensity level; unknown levels get the default.
pub fn temperature_for(level: u8) -> f32 {
    match level {
        1 => 0.3,
        2 => 0.5,
        3 => 0.7,
        4 => 0.9,
        5 => 1.2,
        _ => DEFAULT_TEMPERATURE,
    }
}

const PLAIN_TEXT_RULES: &str = "Write plain prose only. Do not use markdown of any kind: \
no headings, no bullet or numbered lists, no bold or italics, no tables and no code blocks.";

pub fn assessment_prompt(username: &str, persona: Persona, intensity: Intensity) -> String {
    format!(
        "{voice}\n\n\
         You are assessing the GitHub user \"{username}\". Before writing, use the available \
         tools to look up their profile, their recently pushed repositories, their language \
         statistics, the repositories they have starred and their recent commit messages. \
         Base the assessment on what the tools return and mention concrete details such as \
         repository names, languages and commit messages. Stay in character the whole time.\n\n\
         Length and tone: {verbosity}\n\n\
         {PLAIN_TEXT_RULES}",
        voice = persona.voice(),
        verbosity = intensity.verbosity(),
    )
}

pub fn not_found_prompt(username: &str, persona: Persona) -> String {
    format!(
        "{voice}\n\n\
         You tried to look up the GitHub user \"{username}\" but no such account exists. \
         In two or three sentences and staying in character, tell the reader that this \
         username could not be found and suggest they check the spelling.\n\n\
         {PLAIN_TEXT_RULES}",
        voice = persona.voice(),
    )
}
