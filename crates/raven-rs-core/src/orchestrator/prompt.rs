//! Response prompt assembly from notes and recent turns.

use raven_rs_memory::{MemoryRecord, SpeakerLabels, render_transcript_as};

/// Persona, notes, recent conversation, then the agent's speaker tag.
pub const RESPONSE_TEMPLATE: &str = "I am a chatbot named <<AGENT>>. My goals are to reduce suffering, increase prosperity, and increase understanding. I will read the conversation notes and recent messages, and then I will provide a long, verbose, detailed answer.\n\n\n\nThe following are notes from earlier conversations with <<USER>>:\n<<NOTES>>\n\n\n\nThe following are the most recent messages in the conversation:\n<<CONVERSATION>>\n\n\n\nI will now provide a long, detailed, verbose response:\n<<AGENT>>:";

const AGENT_PLACEHOLDER: &str = "<<AGENT>>";
const USER_PLACEHOLDER: &str = "<<USER>>";
const NOTES_PLACEHOLDER: &str = "<<NOTES>>";
const CONVERSATION_PLACEHOLDER: &str = "<<CONVERSATION>>";

/// Fills the response template.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    template: String,
    labels: SpeakerLabels,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(RESPONSE_TEMPLATE)
    }
}

impl PromptComposer {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            labels: SpeakerLabels::default(),
        }
    }

    pub fn with_names(mut self, agent_name: impl Into<String>, user_name: impl Into<String>) -> Self {
        self.labels = SpeakerLabels::new(user_name, agent_name);
        self
    }

    /// Speaker names used for the persona line and transcript lines.
    pub fn labels(&self) -> &SpeakerLabels {
        &self.labels
    }

    /// Render recent records with the composer's speaker names.
    pub fn render_conversation(&self, records: &[MemoryRecord]) -> String {
        render_transcript_as(records, &self.labels)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Names are substituted before notes and conversation, so placeholder-like
    /// text inside either is left untouched.
    pub fn compose(&self, notes: &str, conversation: &str) -> String {
        let scaffold = self
            .template
            .replace(AGENT_PLACEHOLDER, &self.labels.agent)
            .replace(USER_PLACEHOLDER, &self.labels.user);
        match scaffold.split_once(NOTES_PLACEHOLDER) {
            Some((head, tail)) => format!(
                "{}{notes}{}",
                head.replace(CONVERSATION_PLACEHOLDER, conversation),
                tail.replace(CONVERSATION_PLACEHOLDER, conversation)
            ),
            None => scaffold.replace(CONVERSATION_PLACEHOLDER, conversation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PromptComposer, RESPONSE_TEMPLATE};
    use pretty_assertions::assert_eq;
    use raven_rs_memory::{MemoryRecord, Speaker};

    #[test]
    fn default_template_renders_full_prompt() {
        let prompt = PromptComposer::default().compose("- likes ravens", "USER: hello");
        assert_eq!(
            prompt,
            "I am a chatbot named RAVEN. My goals are to reduce suffering, increase prosperity, and increase understanding. I will read the conversation notes and recent messages, and then I will provide a long, verbose, detailed answer.\n\n\n\nThe following are notes from earlier conversations with USER:\n- likes ravens\n\n\n\nThe following are the most recent messages in the conversation:\nUSER: hello\n\n\n\nI will now provide a long, detailed, verbose response:\nRAVEN:"
        );
    }

    #[test]
    fn names_are_configurable() {
        let prompt = PromptComposer::new(RESPONSE_TEMPLATE)
            .with_names("ECHO", "ALICE")
            .compose("", "");
        assert!(prompt.starts_with("I am a chatbot named ECHO."));
        assert!(prompt.contains("conversations with ALICE:"));
        assert!(prompt.ends_with("\nECHO:"));
    }

    #[test]
    fn placeholders_inside_notes_are_not_expanded() {
        let prompt = PromptComposer::new("<<NOTES>>|<<CONVERSATION>>")
            .compose("<<CONVERSATION>>", "USER: hi");
        assert_eq!(prompt, "<<CONVERSATION>>|USER: hi");
    }

    #[test]
    fn conversation_lines_follow_configured_names() {
        let composer = PromptComposer::default().with_names("ECHO", "ALICE");
        let records = vec![
            MemoryRecord::at(Speaker::User, "hello", vec![1.0], 1.0),
            MemoryRecord::at(Speaker::Agent, "hi there", vec![1.0], 2.0),
        ];

        assert_eq!(
            composer.render_conversation(&records),
            "ALICE: hello\n\nECHO: hi there"
        );
    }
}
