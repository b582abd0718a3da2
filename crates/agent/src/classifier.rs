//! Keyword intent classifier
//!
//! Default [`IntentClassifier`]: compiled patterns per category plus
//! example-phrase overlap. A pattern hit scores 0.9, an example that
//! equals the whole utterance scores 1.0, an example contained in it 0.9,
//! and word overlap with at least half of an example scales up to 0.8.
//! When nothing matches the result is `other` at 0.0.
//!
//! Confirmation cues that are negated ("definitely not", "won't be there")
//! or hedged ("not sure", "maybe") never count as a confirmation.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

use receptionist_core::{
    Appointment, AppointmentDetail, Classification, ClassificationError, IntentCategory,
    IntentClassifier,
};

struct IntentRule {
    category: IntentCategory,
    pattern: Regex,
    examples: &'static [&'static str],
}

impl IntentRule {
    fn new(category: IntentCategory, pattern: &str, examples: &'static [&'static str]) -> Self {
        Self {
            category,
            pattern: Regex::new(pattern).unwrap(),
            examples,
        }
    }
}

fn detail(detail: AppointmentDetail) -> IntentCategory {
    IntentCategory::AskDetail { detail }
}

// Earlier rules win ties.
static RULES: Lazy<Vec<IntentRule>> = Lazy::new(|| {
    vec![
        IntentRule::new(
            IntentCategory::WrongPerson,
            r"\bwrong (number|person)\b|\b(is not|isn't|are not|aren't) (here|home|available|in)\b|\b(he|she|they)('s| is| are) (out|away)\b|\b(no one|nobody) (by|named|called) that\b|\bthis (is not|isn't) (him|her|them)\b|\byou have the wrong\b",
            &["wrong number", "you have the wrong person", "she's not here", "he is not home"],
        ),
        IntentRule::new(
            IntentCategory::Cancel,
            r"\bcancel(l?ed|l?ing)?\b|\bcall it off\b|\bdon't need (it|the appointment) anymore\b",
            &["cancel it", "please cancel my appointment", "i want to cancel"],
        ),
        IntentRule::new(
            IntentCategory::Reschedule,
            r"\bre-?schedule\b|\b(can't|cannot|can not|won't be able to|will not be able to|couldn't) (make it|come|attend|be there)\b|\b(another|different|other) (time|day|date)\b|\bmove (it|my appointment|the appointment)\b|\bsomething (came|has come) up\b",
            &["i can't make it", "i need to reschedule", "can we do another day", "no"],
        ),
        IntentRule::new(
            IntentCategory::Confused,
            r"\bwhat appointment\b|\bwho (is this|are you|is calling)\b|\bwhat is this (about|regarding)\b|\bwhat('s| is) this\b|\bwhat do you mean\b|\bi don't (understand|know what)\b|\bi'm confused\b|\bwhich appointment\b",
            &["what appointment", "who is this", "i don't understand", "what is this about"],
        ),
        IntentRule::new(
            detail(AppointmentDetail::All),
            r"\b(what are|tell me|remind me of|repeat|go over) (all )?the details\b|\ball the details\b|\bremind me\b",
            &["what are the details", "can you remind me", "repeat the details"],
        ),
        IntentRule::new(
            detail(AppointmentDetail::Time),
            r"\bwhat time\b|\bat what time\b|\bwhich time\b|\bhow early\b",
            &["what time is it at", "what time was that"],
        ),
        IntentRule::new(
            detail(AppointmentDetail::Date),
            r"\bwhat (day|date)\b|\bwhich (day|date)\b|\bwhen is (it|that|the appointment|my appointment)\b",
            &["what day is it", "when is it", "which date"],
        ),
        IntentRule::new(
            detail(AppointmentDetail::Location),
            r"\bwhere\b|\bwhat (address|location|clinic|office)\b|\bwhich (location|office|clinic|branch)\b",
            &["where is it", "what's the address", "which office"],
        ),
        IntentRule::new(
            detail(AppointmentDetail::Provider),
            r"\bwho (is it with|am i seeing|will i see|is the (doctor|dentist|provider))\b|\bwhich (doctor|dentist|provider)\b|\bwith whom\b",
            &["who is it with", "which doctor"],
        ),
        IntentRule::new(
            detail(AppointmentDetail::Service),
            r"\bwhat (is it|is the appointment|was it) for\b|\bwhat (service|kind of appointment|type of appointment)\b|\bwhat am i (coming|going) in for\b",
            &["what is it for", "what kind of appointment"],
        ),
        IntentRule::new(
            IntentCategory::Confirm,
            r"\b(yes|yeah|yep|yup|sure|absolutely|definitely|correct|confirmed?)\b|\bof course\b|\bi('ll| will) be there\b|\bsee you (then|tomorrow)\b|\bsounds good\b|\bthat works\b|\bstill (coming|on)\b",
            &["yes", "yes i'll be there", "i will be there", "that works for me"],
        ),
    ]
});

// Negation right before a confirmation cue, a cue negated after the fact,
// or a hedge. Any hit disqualifies Confirm.
static NEGATED_CONFIRM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(not|never|no|won't|can't|cannot|don't|isn't)\W+(\w+\W+)?(yes|yeah|yep|sure|certain|absolutely|definitely|correct|confirm\w*|be there|make it|come|coming|work|works|good)\b|\b(absolutely|definitely|certainly|of course|sure)\W+not\b|\bmaybe\b|\bprobably\b|\bperhaps\b|\bi don't know\b|\bnot (really|yet)\b",
    )
    .unwrap()
});

/// Pattern and example-phrase intent classifier
#[derive(Debug, Default, Clone)]
pub struct KeywordIntentClassifier;

impl KeywordIntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core of [`IntentClassifier::classify`]
    pub fn detect(&self, text: &str) -> Classification {
        let text = normalize(text);
        if text.is_empty() {
            return Classification::other();
        }

        let negated = NEGATED_CONFIRM.is_match(&text);

        let mut best: Option<(IntentCategory, f32)> = None;
        for rule in RULES.iter() {
            if negated && rule.category == IntentCategory::Confirm {
                continue;
            }
            let score = score_rule(&text, rule);
            if score > best.map(|(_, s)| s).unwrap_or(0.0) {
                best = Some((rule.category, score));
            }
        }

        match best {
            Some((category, score)) => Classification::new(category, score),
            None => Classification::other(),
        }
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

fn score_rule(text: &str, rule: &IntentRule) -> f32 {
    let mut score: f32 = 0.0;

    if rule.pattern.is_match(text) {
        score = 0.9;
    }

    let text_words: HashSet<&str> = text.unicode_words().collect();
    for example in rule.examples {
        if text == *example {
            return 1.0;
        }

        if text.contains(example) && example.len() > 3 {
            score = score.max(0.9);
        }

        let example_words: HashSet<&str> = example.unicode_words().collect();
        let overlap = example_words.intersection(&text_words).count();
        let overlap_score = overlap as f32 / example_words.len().max(1) as f32;
        // A single shared filler word is not a match
        if overlap_score >= 0.5 {
            score = score.max(overlap_score * 0.8);
        }
    }

    score
}

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    async fn classify(
        &self,
        text: &str,
        _appointment: &Appointment,
    ) -> Result<Classification, ClassificationError> {
        Ok(self.detect(text))
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(text: &str) -> IntentCategory {
        KeywordIntentClassifier::new().detect(text).category
    }

    #[test]
    fn test_confirm() {
        assert_eq!(category("Yes, I'll be there"), IntentCategory::Confirm);
        assert_eq!(category("yeah that works"), IntentCategory::Confirm);
        assert_eq!(category("Of course!"), IntentCategory::Confirm);
    }

    #[test]
    fn test_exact_example_scores_one() {
        let c = KeywordIntentClassifier::new().detect("yes");
        assert_eq!(c.category, IntentCategory::Confirm);
        assert_eq!(c.confidence, 1.0);
    }

    #[test]
    fn test_reschedule_beats_leading_yes() {
        assert_eq!(
            category("yes but I need to reschedule"),
            IntentCategory::Reschedule
        );
        assert_eq!(category("I can't make it tomorrow"), IntentCategory::Reschedule);
        assert_eq!(category("No."), IntentCategory::Reschedule);
    }

    #[test]
    fn test_cancel() {
        assert_eq!(category("Please cancel it"), IntentCategory::Cancel);
        assert_eq!(category("I'd like to cancel"), IntentCategory::Cancel);
    }

    #[test]
    fn test_confused() {
        assert_eq!(category("what appointment?"), IntentCategory::Confused);
        assert_eq!(category("Sorry, who is this?"), IntentCategory::Confused);
    }

    #[test]
    fn test_wrong_person() {
        assert_eq!(category("You have the wrong number"), IntentCategory::WrongPerson);
        assert_eq!(category("She's not here right now"), IntentCategory::WrongPerson);
    }

    #[test]
    fn test_ask_detail() {
        assert_eq!(category("What time is it at?"), detail(AppointmentDetail::Time));
        assert_eq!(category("Where is that again?"), detail(AppointmentDetail::Location));
        assert_eq!(category("Which doctor is it?"), detail(AppointmentDetail::Provider));
        assert_eq!(category("what is it for?"), detail(AppointmentDetail::Service));
        assert_eq!(category("what day is it"), detail(AppointmentDetail::Date));
        assert_eq!(category("can you remind me"), detail(AppointmentDetail::All));
    }

    #[test]
    fn test_curly_apostrophe() {
        assert_eq!(category("I\u{2019}ll be there"), IntentCategory::Confirm);
    }

    #[test]
    fn test_negated_confirm_is_not_a_confirmation() {
        for text in [
            "Definitely not",
            "Absolutely not",
            "Of course not!",
            "I won't be there",
            "I will not be there",
            "No, that doesn't work, not good for me",
        ] {
            assert_ne!(category(text), IntentCategory::Confirm, "{text}");
        }
    }

    #[test]
    fn test_hedged_answer_is_other() {
        for text in [
            "I'm not sure I can come",
            "Not sure, sorry",
            "Maybe, I'll have to check",
            "Perhaps, let me check",
        ] {
            assert_eq!(category(text), IntentCategory::Other, "{text}");
        }
    }

    #[test]
    fn test_negation_elsewhere_keeps_confirm() {
        assert_eq!(category("Yes, no problem"), IntentCategory::Confirm);
        assert_eq!(category("Sure thing, see you then"), IntentCategory::Confirm);
    }

    #[test]
    fn test_no_match_is_other() {
        let c = KeywordIntentClassifier::new().detect("the weather is lovely");
        assert_eq!(c.category, IntentCategory::Other);
        assert_eq!(c.confidence, 0.0);

        assert_eq!(category("   "), IntentCategory::Other);
    }

    #[tokio::test]
    async fn test_trait_impl() {
        let classifier = KeywordIntentClassifier::new();
        let appt = Appointment::new("tomorrow", "9 AM", "check-up", "Dr. Lee", "Oak Clinic");
        let c = classifier.classify("sure", &appt).await.unwrap();
        assert_eq!(c.category, IntentCategory::Confirm);
        assert_eq!(classifier.name(), "keyword");
    }
}
