//! The system instruction sent with every model session.
//!
//! It embeds today's date, so a session built yesterday is stale today.

use crate::error::ChatError;
use askama::Template;
use chrono::NaiveDate;
use config::Profile;

struct RoleLine<'a> {
    title: &'a str,
    company: &'a str,
    started: String,
    intern: bool,
}

#[derive(Template)]
#[template(path = "system_instruction.txt", escape = "none")]
struct SystemInstructionTemplate<'a> {
    owner: &'a str,
    today: String,
    roles: Vec<RoleLine<'a>>,
    context_document: &'a str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SystemInstruction {
    date: NaiveDate,
    text: String,
}

impl SystemInstruction {
    pub fn build(profile: &Profile, today: NaiveDate) -> Result<Self, ChatError> {
        let template = SystemInstructionTemplate {
            owner: &profile.owner_name,
            today: today.format("%B %-d, %Y").to_string(),
            roles: profile
                .roles
                .iter()
                .map(|role| RoleLine {
                    title: &role.title,
                    company: &role.company,
                    started: role.started.format("%B %-d, %Y").to_string(),
                    intern: role.intern,
                })
                .collect(),
            context_document: &profile.context_document,
        };
        Ok(Self {
            date: today,
            text: template.render()?,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::RoleStart;

    fn profile() -> Profile {
        Profile {
            owner_name: "Ada Lovelace".into(),
            context_document: "### Skills\n- Rust & <Go>".into(),
            roles: vec![
                RoleStart {
                    title: "Engineer".into(),
                    company: "Acme".into(),
                    started: NaiveDate::from_ymd_opt(2023, 7, 3).unwrap(),
                    intern: false,
                },
                RoleStart {
                    title: "Intern".into(),
                    company: "Initech".into(),
                    started: NaiveDate::from_ymd_opt(2022, 1, 10).unwrap(),
                    intern: true,
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_embeds_date_roles_and_document() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let instruction = SystemInstruction::build(&profile(), today).unwrap();
        let text = instruction.text();

        assert!(text.starts_with("You are a helpful and friendly AI assistant representing Ada Lovelace."));
        assert!(text.contains("The current date is March 9, 2025."));
        assert!(text.contains("Engineer at Acme, started July 3, 2023\n"));
        assert!(text.contains("Intern at Initech, started January 10, 2022 (Intern)"));
        assert!(text.contains("full-time experience"));
        assert!(text.trim_end().ends_with("### Skills\n- Rust & <Go>"));
        assert_eq!(instruction.date(), today);
    }

    #[test]
    fn test_profile_without_roles_omits_start_dates() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let instruction = SystemInstruction::build(&Profile::default(), day).unwrap();
        assert!(!instruction.text().contains("Role start dates"));
        assert!(instruction.text().contains("representing the site owner."));
    }
}
