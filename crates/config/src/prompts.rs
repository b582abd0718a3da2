//! Response template catalog
//!
//! Every line the agent speaks comes from a template in this catalog.
//! Templates are grouped by [`ResponseCategory`]; the dialogue layer picks
//! one template per category per turn and renders it against the
//! appointment snapshot and persona.
//!
//! A catalog file lists templates under a `templates` key:
//!
//! ```yaml
//! templates:
//!   - id: confirm.warm
//!     category: confirmation
//!     text: "Perfect! We'll see you {date} at {time}."
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use receptionist_core::AppointmentDetail;

use crate::ConfigError;

/// Placeholder names a template may reference
pub const KNOWN_PLACEHOLDERS: &[&str] = &[
    "agent_name",
    "agent_role",
    "time_of_day",
    "date",
    "time",
    "service",
    "provider",
    "location",
    "customer_name",
];

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\w+)\}").unwrap());

/// What a template is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCategory {
    Greeting,
    Confirmation,
    RescheduleNextSteps,
    CancellationAck,
    /// Who is calling and why, for a confused customer
    Explanation,
    /// The "can you still make it?" question on its own
    ConfirmationPrompt,
    DetailDate,
    DetailTime,
    DetailService,
    DetailProvider,
    DetailLocation,
    DetailAll,
    WrongPerson,
    /// First escalation tier
    ClarifyRepeat,
    /// Second escalation tier
    ClarifyBroader,
    /// Third and later tiers
    ClarifyRestate,
    SilenceReprompt,
    /// Spoken before hanging up on an unresolved call
    AbandonApology,
}

impl ResponseCategory {
    /// Categories a catalog must populate
    pub const ALL: [ResponseCategory; 18] = [
        ResponseCategory::Greeting,
        ResponseCategory::Confirmation,
        ResponseCategory::RescheduleNextSteps,
        ResponseCategory::CancellationAck,
        ResponseCategory::Explanation,
        ResponseCategory::ConfirmationPrompt,
        ResponseCategory::DetailDate,
        ResponseCategory::DetailTime,
        ResponseCategory::DetailService,
        ResponseCategory::DetailProvider,
        ResponseCategory::DetailLocation,
        ResponseCategory::DetailAll,
        ResponseCategory::WrongPerson,
        ResponseCategory::ClarifyRepeat,
        ResponseCategory::ClarifyBroader,
        ResponseCategory::ClarifyRestate,
        ResponseCategory::SilenceReprompt,
        ResponseCategory::AbandonApology,
    ];

    pub fn for_detail(detail: AppointmentDetail) -> Self {
        match detail {
            AppointmentDetail::Date => ResponseCategory::DetailDate,
            AppointmentDetail::Time => ResponseCategory::DetailTime,
            AppointmentDetail::Service => ResponseCategory::DetailService,
            AppointmentDetail::Provider => ResponseCategory::DetailProvider,
            AppointmentDetail::Location => ResponseCategory::DetailLocation,
            AppointmentDetail::All => ResponseCategory::DetailAll,
        }
    }

    /// Clarification wording for the given (1-based) attempt number
    pub fn for_clarification(attempt: u32) -> Self {
        match attempt {
            0 | 1 => ResponseCategory::ClarifyRepeat,
            2 => ResponseCategory::ClarifyBroader,
            _ => ResponseCategory::ClarifyRestate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCategory::Greeting => "greeting",
            ResponseCategory::Confirmation => "confirmation",
            ResponseCategory::RescheduleNextSteps => "reschedule_next_steps",
            ResponseCategory::CancellationAck => "cancellation_ack",
            ResponseCategory::Explanation => "explanation",
            ResponseCategory::ConfirmationPrompt => "confirmation_prompt",
            ResponseCategory::DetailDate => "detail_date",
            ResponseCategory::DetailTime => "detail_time",
            ResponseCategory::DetailService => "detail_service",
            ResponseCategory::DetailProvider => "detail_provider",
            ResponseCategory::DetailLocation => "detail_location",
            ResponseCategory::DetailAll => "detail_all",
            ResponseCategory::WrongPerson => "wrong_person",
            ResponseCategory::ClarifyRepeat => "clarify_repeat",
            ResponseCategory::ClarifyBroader => "clarify_broader",
            ResponseCategory::ClarifyRestate => "clarify_restate",
            ResponseCategory::SilenceReprompt => "silence_reprompt",
            ResponseCategory::AbandonApology => "abandon_apology",
        }
    }
}

impl std::fmt::Display for ResponseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One phrasing of one kind of response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseTemplate {
    pub id: String,
    pub category: ResponseCategory,
    pub text: String,
    /// `{name}` markers found in `text`, in order of first appearance
    pub placeholders: Vec<String>,
}

impl ResponseTemplate {
    pub fn new(id: impl Into<String>, category: ResponseCategory, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut placeholders: Vec<String> = Vec::new();
        for cap in PLACEHOLDER_RE.captures_iter(&text) {
            let name = &cap[1];
            if !placeholders.iter().any(|p| p == name) {
                placeholders.push(name.to_string());
            }
        }

        Self {
            id: id.into(),
            category,
            text,
            placeholders,
        }
    }

    /// Substitute placeholders; markers without a value are left as-is
    pub fn render(&self, vars: &HashMap<&str, String>) -> String {
        PLACEHOLDER_RE
            .replace_all(&self.text, |caps: &regex::Captures<'_>| {
                vars.get(&caps[1])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

#[derive(Debug, Deserialize)]
struct TemplateEntry {
    id: String,
    category: ResponseCategory,
    text: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    templates: Vec<TemplateEntry>,
}

/// Immutable set of response templates
#[derive(Debug, Clone)]
pub struct ResponseCatalog {
    templates: Vec<ResponseTemplate>,
}

impl ResponseCatalog {
    pub fn from_templates(templates: Vec<ResponseTemplate>) -> Self {
        Self { templates }
    }

    /// Load from a YAML, TOML or JSON file, chosen by extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::ParseError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let file: CatalogFile = match extension.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| ConfigError::ParseError(format!("Invalid catalog YAML: {}", e)))?,
            "toml" => toml::from_str(&content)
                .map_err(|e| ConfigError::ParseError(format!("Invalid catalog TOML: {}", e)))?,
            "json" => serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(format!("Invalid catalog JSON: {}", e)))?,
            other => {
                return Err(ConfigError::ParseError(format!(
                    "Unsupported catalog format '{}' for {}",
                    other,
                    path.display()
                )))
            }
        };

        let templates = file
            .templates
            .into_iter()
            .map(|t| ResponseTemplate::new(t.id, t.category, t.text))
            .collect::<Vec<_>>();

        tracing::info!(
            path = %path.display(),
            templates = templates.len(),
            "Loaded response catalog"
        );

        Ok(Self { templates })
    }

    /// Reject unknown placeholders, duplicate ids and empty categories
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for template in &self.templates {
            if template.id.trim().is_empty() {
                return Err(ConfigError::InvalidCatalog(format!(
                    "template with empty id in category {}",
                    template.category
                )));
            }
            if !seen.insert(template.id.as_str()) {
                return Err(ConfigError::InvalidCatalog(format!(
                    "duplicate template id '{}'",
                    template.id
                )));
            }
            if let Some(unknown) = template
                .placeholders
                .iter()
                .find(|p| !KNOWN_PLACEHOLDERS.contains(&p.as_str()))
            {
                return Err(ConfigError::InvalidCatalog(format!(
                    "template '{}' uses unknown placeholder {{{}}}",
                    template.id, unknown
                )));
            }
        }

        for category in ResponseCategory::ALL {
            if !self.templates.iter().any(|t| t.category == category) {
                return Err(ConfigError::InvalidCatalog(format!(
                    "no templates for category {}",
                    category
                )));
            }
        }

        Ok(())
    }

    pub fn by_category(&self, category: ResponseCategory) -> Vec<&ResponseTemplate> {
        self.templates
            .iter()
            .filter(|t| t.category == category)
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&ResponseTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResponseTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for ResponseCatalog {
    fn default() -> Self {
        use ResponseCategory::*;

        let entries: &[(&str, ResponseCategory, &str)] = &[
            (
                "greeting.formal",
                Greeting,
                "Good {time_of_day}! This is {agent_name} calling from {location}. I'm calling to confirm your appointment with {provider} {date} at {time} for your {service}. Are you still able to make it?",
            ),
            (
                "greeting.warm",
                Greeting,
                "Hi, good {time_of_day}! It's {agent_name} from {location}. Just a quick reminder that you're booked for a {service} with {provider} {date} at {time}. Will you still be able to come in?",
            ),
            (
                "greeting.brief",
                Greeting,
                "Good {time_of_day}, this is {agent_name}, the {agent_role} at {location}. You have a {service} with {provider} {date} at {time}. Can you still make it?",
            ),
            (
                "confirmation.warm",
                Confirmation,
                "Perfect! I have you confirmed. We'll see you {date} at {time} for your {service}. Thank you so much, and have a wonderful rest of your day!",
            ),
            (
                "confirmation.brief",
                Confirmation,
                "Wonderful, you're all set for {date} at {time} with {provider}. Thanks so much, and take care!",
            ),
            (
                "confirmation.reminder",
                Confirmation,
                "Great, I've marked you as confirmed. See you {date} at {time} at {location}. Thank you, and have a lovely {time_of_day}!",
            ),
            (
                "reschedule.call_back",
                RescheduleNextSteps,
                "I understand you need to reschedule. I've made a note of that, and someone from {location} will call you back to find a time that works better. Thank you for letting us know!",
            ),
            (
                "reschedule.front_desk",
                RescheduleNextSteps,
                "No problem at all, I'll flag your {service} for rescheduling. Our front desk will be in touch with some other times, or you're welcome to call {location} whenever suits you. Thanks so much!",
            ),
            (
                "cancellation.ack",
                CancellationAck,
                "I understand. I'll go ahead and cancel your appointment {date} at {time}. If you'd like to book again, just give {location} a call. Take care!",
            ),
            (
                "cancellation.gentle",
                CancellationAck,
                "Of course, I've noted that you'd like to cancel your {service} with {provider}. Whenever you're ready to come in, we'd be happy to help. Have a good {time_of_day}!",
            ),
            (
                "explanation.who",
                Explanation,
                "Sorry for the confusion! My name is {agent_name}, I'm the {agent_role} at {location}. I'm calling because you have a {service} booked with {provider} {date} at {time}, and I just wanted to check you can still make it.",
            ),
            (
                "explanation.reminder",
                Explanation,
                "Of course, let me explain. This is {agent_name} from {location}. We have you down for a {service} with {provider} {date} at {time}, and I'm calling ahead to confirm. Will you be able to attend?",
            ),
            (
                "prompt.still_coming",
                ConfirmationPrompt,
                "Are you still able to make it?",
            ),
            (
                "prompt.will_attend",
                ConfirmationPrompt,
                "Will you be able to come in?",
            ),
            (
                "prompt.does_that_work",
                ConfirmationPrompt,
                "Does that still work for you?",
            ),
            ("detail.date", DetailDate, "Your appointment is {date}."),
            (
                "detail.date_time",
                DetailDate,
                "It's booked for {date}, at {time}.",
            ),
            ("detail.time", DetailTime, "Your appointment is at {time}, {date}."),
            (
                "detail.time_short",
                DetailTime,
                "We have you down for {time} {date}.",
            ),
            (
                "detail.service",
                DetailService,
                "You're scheduled for a {service} with {provider}.",
            ),
            (
                "detail.provider",
                DetailProvider,
                "Your appointment is with {provider}.",
            ),
            (
                "detail.location",
                DetailLocation,
                "The appointment is at {location}.",
            ),
            (
                "detail.all",
                DetailAll,
                "Let me confirm all the details for you. You have a {service} with {provider} at {location}, {date} at {time}.",
            ),
            (
                "wrong_person.ask",
                WrongPerson,
                "Oh, I apologize! I'm looking for {customer_name}, about an appointment at {location}. Could you let them know we called? Thank you, and sorry to bother you!",
            ),
            (
                "wrong_person.callback",
                WrongPerson,
                "I'm so sorry for the mix-up. Could you please ask {customer_name} to give {location} a call back about their appointment {date}? Thanks so much!",
            ),
            (
                "clarify.repeat",
                ClarifyRepeat,
                "Sorry, could you repeat that?",
            ),
            (
                "clarify.missed",
                ClarifyRepeat,
                "I'm sorry, I didn't quite catch that. Could you say it again?",
            ),
            (
                "clarify.pardon",
                ClarifyRepeat,
                "Pardon me, could you say that once more?",
            ),
            (
                "clarify.broader",
                ClarifyBroader,
                "I'm sorry, I'm having a little trouble hearing you. I'm calling about your {service} {date} at {time}. Could you tell me again?",
            ),
            (
                "clarify.line",
                ClarifyBroader,
                "Apologies, the line seems a bit unclear. This is {agent_name} from {location}, about your appointment {date}. Could you repeat that for me?",
            ),
            (
                "clarify.restate",
                ClarifyRestate,
                "Let me ask a different way. Will you be able to come to your {service} with {provider} {date} at {time}? A simple yes or no is perfect.",
            ),
            (
                "clarify.yes_no",
                ClarifyRestate,
                "Just so I have it right: are you still coming in {date} at {time}, yes or no?",
            ),
            ("silence.still_there", SilenceReprompt, "Hello, are you still there?"),
            (
                "silence.hear_me",
                SilenceReprompt,
                "Hi, can you hear me okay?",
            ),
            (
                "silence.no_rush",
                SilenceReprompt,
                "Sorry, I didn't hear anything. Are you still with me?",
            ),
            (
                "abandon.apology",
                AbandonApology,
                "I'm sorry, I'm having trouble understanding. We'll try you again later, or feel free to call {location} directly. Goodbye!",
            ),
            (
                "abandon.call_back",
                AbandonApology,
                "I apologize, I don't think I'm hearing you clearly. Please give {location} a call when it's convenient. Have a good {time_of_day}, goodbye!",
            ),
        ];

        Self {
            templates: entries
                .iter()
                .map(|(id, category, text)| ResponseTemplate::new(*id, *category, *text))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = ResponseCatalog::default();
        catalog.validate().unwrap();

        for category in ResponseCategory::ALL {
            assert!(!catalog.by_category(category).is_empty(), "{category}");
        }
        assert!(catalog.by_category(ResponseCategory::Greeting).len() >= 2);
        assert!(catalog.by_category(ResponseCategory::ClarifyRepeat).len() >= 2);
    }

    #[test]
    fn test_placeholders_extracted() {
        let t = ResponseTemplate::new(
            "t",
            ResponseCategory::Greeting,
            "Good {time_of_day}, {agent_name} here. {agent_name} again.",
        );
        assert_eq!(t.placeholders, vec!["time_of_day", "agent_name"]);
    }

    #[test]
    fn test_render() {
        let t = ResponseTemplate::new("t", ResponseCategory::DetailTime, "At {time} on {date}, {unknown}.");
        let mut vars = HashMap::new();
        vars.insert("time", "2:30 PM".to_string());
        vars.insert("date", "Tuesday".to_string());
        assert_eq!(t.render(&vars), "At 2:30 PM on Tuesday, {unknown}.");
    }

    #[test]
    fn test_validate_rejects_unknown_placeholder() {
        let mut templates: Vec<ResponseTemplate> = ResponseCatalog::default().iter().cloned().collect();
        templates.push(ResponseTemplate::new(
            "bad",
            ResponseCategory::Confirmation,
            "See you, {nickname}!",
        ));
        let err = ResponseCatalog::from_templates(templates).validate().unwrap_err();
        assert!(err.to_string().contains("nickname"));
    }

    #[test]
    fn test_validate_rejects_duplicate_id() {
        let mut templates: Vec<ResponseTemplate> = ResponseCatalog::default().iter().cloned().collect();
        templates.push(ResponseTemplate::new(
            "greeting.formal",
            ResponseCategory::Greeting,
            "Hello!",
        ));
        let err = ResponseCatalog::from_templates(templates).validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_validate_rejects_empty_category() {
        let templates = ResponseCatalog::default()
            .iter()
            .filter(|t| t.category != ResponseCategory::SilenceReprompt)
            .cloned()
            .collect();
        let err = ResponseCatalog::from_templates(templates).validate().unwrap_err();
        assert!(err.to_string().contains("silence_reprompt"));
    }

    #[test]
    fn test_clarification_tiers() {
        assert_eq!(ResponseCategory::for_clarification(1), ResponseCategory::ClarifyRepeat);
        assert_eq!(ResponseCategory::for_clarification(2), ResponseCategory::ClarifyBroader);
        assert_eq!(ResponseCategory::for_clarification(3), ResponseCategory::ClarifyRestate);
        assert_eq!(ResponseCategory::for_clarification(7), ResponseCategory::ClarifyRestate);
    }

    #[test]
    fn test_load_yaml_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(
            &path,
            r#"
templates:
  - id: confirm.short
    category: confirmation
    text: "See you {date}!"
  - id: silence.one
    category: silence_reprompt
    text: "Still there?"
"#,
        )
        .unwrap();

        let catalog = ResponseCatalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        let t = catalog.get("confirm.short").unwrap();
        assert_eq!(t.category, ResponseCategory::Confirmation);
        assert_eq!(t.placeholders, vec!["date"]);

        // Partial catalogs load but fail validation
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_load_toml_and_json_catalogs() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("catalog.toml");
        std::fs::write(
            &toml_path,
            "[[templates]]\nid = \"a\"\ncategory = \"greeting\"\ntext = \"Hi from {location}\"\n",
        )
        .unwrap();
        assert_eq!(ResponseCatalog::load(&toml_path).unwrap().len(), 1);

        let json_path = dir.path().join("catalog.json");
        std::fs::write(
            &json_path,
            r#"{"templates":[{"id":"b","category":"wrong_person","text":"Is {customer_name} home?"}]}"#,
        )
        .unwrap();
        let catalog = ResponseCatalog::load(&json_path).unwrap();
        assert_eq!(catalog.by_category(ResponseCategory::WrongPerson).len(), 1);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ResponseCatalog::load(dir.path().join("missing.yaml")),
            Err(ConfigError::FileNotFound(_))
        ));

        let ini = dir.path().join("catalog.ini");
        std::fs::write(&ini, "templates=").unwrap();
        assert!(matches!(
            ResponseCatalog::load(&ini),
            Err(ConfigError::ParseError(_))
        ));
    }
}
