//! Prompts using Handlebars for templating. Handlebars adds
//! additional security controls since it can't do much out of the box
//! without registering your own helpers. User text is passed in as
//! data, never as a template, so it can't inject template syntax.

use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeZone, Timelike};
use chrono_tz::Tz;
use handlebars::Handlebars;
use serde_json::json;

use super::models::{GenerationRequest, JSON_MIME_TYPE, Part, TEMPERATURE, UserImage};

#[derive(Debug, Clone, Copy)]
pub enum Prompt {
    Context,
    CalendarInstructions,
    SchedulingInstructions,
    Request,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

const CONTEXT_PROMPT: &str = "Current datetime is {{now}} ({{timezone}}).";

// Text only requests
const CALENDAR_INSTRUCTIONS_PROMPT: &str = r#"You are a calendar assistant.

Convert the user's instruction into STRICT JSON ONLY (no markdown, no explanation).

Return exactly this shape:
{
  "actions": [
    {
      "type": "create",
      "title": "string",
      "start": "ISO8601 datetime with timezone offset",
      "end": "ISO8601 datetime with timezone offset",
      "location": "string",
      "repeat": "none|daily|weekly",
      "count": 1
    }
  ]
}

Rules:
- Use {{timezone}} timezone.
- Interpret relative dates like "today", "tomorrow", "next Monday" using the provided current datetime.
- If end time missing, assume 1 hour duration.
- If location missing, use empty string.
- If repeat missing, use "none".
- If count missing, use 1.
- Only return JSON."#;

// Requests that may include a photo of a flyer or timetable
const SCHEDULING_INSTRUCTIONS_PROMPT: &str = r#"You are a scheduling assistant. 

Instructions:
1. Analyze the user's request AND any provided image (e.g., a flyer or timetable).
2. Extract all event details (Title, Start Time, End Time, Location).
3. Return a valid JSON object with an 'actions' list.
4. Do NOT use Markdown or explanations. Return ONLY the JSON.

JSON Schema:
{
  "actions": [
    {
      "type": "create",
      "title": "string",
      "start": "ISO8601 datetime (YYYY-MM-DDTHH:MM:SS)",
      "end": "ISO8601 datetime (YYYY-MM-DDTHH:MM:SS)",
      "location": "string",
      "repeat": "none|daily|weekly",
      "count": 1
    }
  ]
}

Rules:
- Use {{timezone}} timezone.
- Interpret relative dates (e.g., "today", "tomorrow", "next Monday") using the provided current datetime.
- If end time missing, assume 1 hour duration.
- If location missing, use empty string.
- If repeat missing, use "none".
- If count missing, use 1."#;

const REQUEST_PROMPT: &str = "{{context}}\n\n{{instructions}}\n\n{{label}}: {{text}}";

pub fn templates<'a>() -> Handlebars<'a> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    // Prompts are plain text, HTML escaping would mangle user input
    registry.register_escape_fn(handlebars::no_escape);
    registry
        .register_template_string(&Prompt::Context.to_string(), CONTEXT_PROMPT)
        .expect("Failed to register template");
    registry
        .register_template_string(
            &Prompt::CalendarInstructions.to_string(),
            CALENDAR_INSTRUCTIONS_PROMPT,
        )
        .expect("Failed to register template");
    registry
        .register_template_string(
            &Prompt::SchedulingInstructions.to_string(),
            SCHEDULING_INSTRUCTIONS_PROMPT,
        )
        .expect("Failed to register template");
    registry
        .register_template_string(&Prompt::Request.to_string(), REQUEST_PROMPT)
        .expect("Failed to register template");
    registry
}

/// ISO-8601 with the zone's offset. Fractional seconds are only shown
/// when there are any, at microsecond precision.
pub fn format_now(now: &DateTime<Tz>) -> String {
    let precision = if now.nanosecond() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    now.to_rfc3339_opts(precision, false)
}

/// Assembles the model input for a scheduling request. Building is a
/// pure function of its inputs, `now` included, so the same request
/// always produces the same prompt.
#[derive(Clone, Debug)]
pub struct PromptBuilder {
    timezone: Tz,
    supports_image: bool,
    templates: Handlebars<'static>,
}

impl PromptBuilder {
    pub fn new(timezone: Tz, supports_image: bool) -> Self {
        Self {
            timezone,
            supports_image,
            templates: templates(),
        }
    }

    pub fn supports_image(&self) -> bool {
        self.supports_image
    }

    /// The line that anchors relative dates, e.g. `Current datetime is
    /// 2024-05-01T09:00:00+08:00 (Asia/Kuala_Lumpur).`
    pub fn context_line<T: TimeZone>(&self, now: &DateTime<T>) -> String {
        let local = now.with_timezone(&self.timezone);
        self.render(
            Prompt::Context,
            &json!({
                "now": format_now(&local),
                "timezone": self.timezone.name(),
            }),
        )
    }

    pub fn instructions(&self) -> String {
        let prompt = if self.supports_image {
            Prompt::SchedulingInstructions
        } else {
            Prompt::CalendarInstructions
        };
        self.render(prompt, &json!({ "timezone": self.timezone.name() }))
    }

    /// Build the request sent to the model. An image is attached as
    /// its own part after the text, and only when images are
    /// supported. Empty text is passed through as is.
    pub fn build<T: TimeZone>(
        &self,
        now: &DateTime<T>,
        text: &str,
        image: Option<&UserImage>,
    ) -> GenerationRequest {
        let label = if self.supports_image {
            "User Request"
        } else {
            "User"
        };
        let prompt = self.render(
            Prompt::Request,
            &json!({
                "context": self.context_line(now),
                "instructions": self.instructions(),
                "label": label,
                "text": text,
            }),
        );

        let mut parts = vec![Part::Text(prompt)];
        if let Some(image) = image.filter(|_| self.supports_image) {
            parts.push(Part::InlineData(image.clone()));
        }

        GenerationRequest {
            parts,
            temperature: TEMPERATURE,
            response_mime_type: JSON_MIME_TYPE.to_string(),
        }
    }

    fn render(&self, prompt: Prompt, data: &serde_json::Value) -> String {
        // Every template is registered in `templates` and each call
        // site supplies all of the variables it references
        self.templates
            .render(&prompt.to_string(), data)
            .expect("Failed to render prompt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-05-01T09:00:00+08:00").unwrap()
    }

    #[test]
    fn it_renders_the_context_line() {
        let builder = PromptBuilder::new(chrono_tz::Asia::Kuala_Lumpur, true);
        assert_eq!(
            builder.context_line(&now()),
            "Current datetime is 2024-05-01T09:00:00+08:00 (Asia/Kuala_Lumpur)."
        );
    }

    #[test]
    fn it_converts_now_into_the_configured_zone() {
        let builder = PromptBuilder::new(chrono_tz::Asia::Kuala_Lumpur, false);
        let utc = now().with_timezone(&Utc);
        assert_eq!(
            builder.context_line(&utc),
            "Current datetime is 2024-05-01T09:00:00+08:00 (Asia/Kuala_Lumpur)."
        );
    }

    #[test]
    fn it_shows_fractional_seconds_in_micros() {
        let builder = PromptBuilder::new(chrono_tz::Asia::Kuala_Lumpur, false);
        let now = DateTime::parse_from_rfc3339("2024-05-01T09:00:00.123456789+08:00").unwrap();
        assert_eq!(
            builder.context_line(&now),
            "Current datetime is 2024-05-01T09:00:00.123456+08:00 (Asia/Kuala_Lumpur)."
        );
    }

    #[test]
    fn it_is_a_pure_function_of_its_inputs() {
        let builder = PromptBuilder::new(chrono_tz::Asia::Kuala_Lumpur, true);
        let image = UserImage::jpeg(vec![0xff, 0xd8, 0xff]);
        let first = builder.build(&now(), "lunch with Sam tomorrow at noon", Some(&image));
        let second = builder.build(&now(), "lunch with Sam tomorrow at noon", Some(&image));
        assert_eq!(first, second);
    }

    #[test]
    fn it_assembles_context_instructions_and_user_text() {
        let builder = PromptBuilder::new(chrono_tz::Asia::Kuala_Lumpur, true);
        let request = builder.build(&now(), "lunch with Sam tomorrow at noon", None);
        let text = request.text().unwrap();

        assert!(text.starts_with(
            "Current datetime is 2024-05-01T09:00:00+08:00 (Asia/Kuala_Lumpur).\n\nYou are a scheduling assistant."
        ));
        assert!(text.ends_with("\n\nUser Request: lunch with Sam tomorrow at noon"));
        assert!(text.contains("- Use Asia/Kuala_Lumpur timezone."));
        assert!(text.contains("If end time missing, assume 1 hour duration."));
        assert_eq!(request.parts.len(), 1);
        assert_eq!(request.temperature, 0.2);
        assert_eq!(request.response_mime_type, "application/json");
    }

    #[test]
    fn it_keeps_the_scheduling_wording_verbatim() {
        let builder = PromptBuilder::new(chrono_tz::Asia::Kuala_Lumpur, true);
        let instructions = builder.instructions();

        assert!(instructions.starts_with("You are a scheduling assistant. \n\nInstructions:\n"));
        assert!(instructions.contains(
            "2. Extract all event details (Title, Start Time, End Time, Location).\n"
        ));
    }

    #[test]
    fn it_uses_the_calendar_wording_for_text_only() {
        let builder = PromptBuilder::new(chrono_tz::Asia::Kuala_Lumpur, false);
        let request = builder.build(&now(), "gym every morning", None);
        let text = request.text().unwrap();

        assert!(text.contains("You are a calendar assistant."));
        assert!(text.contains("ISO8601 datetime with timezone offset"));
        assert!(text.ends_with("\n\nUser: gym every morning"));
    }

    #[test]
    fn it_keeps_the_image_as_a_separate_part() {
        let builder = PromptBuilder::new(chrono_tz::Asia::Kuala_Lumpur, true);
        let image = UserImage::jpeg(vec![1, 2, 3]);
        let request = builder.build(&now(), "add these", Some(&image));

        assert_eq!(request.parts.len(), 2);
        assert!(matches!(request.parts[0], Part::Text(_)));
        assert_eq!(request.parts[1], Part::InlineData(image));
        assert!(!request.text().unwrap().contains("AQID"));
    }

    #[test]
    fn it_ignores_images_when_unsupported() {
        let builder = PromptBuilder::new(chrono_tz::Asia::Kuala_Lumpur, false);
        let image = UserImage::jpeg(vec![1, 2, 3]);
        let request = builder.build(&now(), "add these", Some(&image));
        assert_eq!(request.images().count(), 0);
    }

    #[test]
    fn it_passes_user_text_through_unescaped() {
        let builder = PromptBuilder::new(chrono_tz::Asia::Kuala_Lumpur, false);
        let request = builder.build(&now(), "dinner @ Tom & Jerry's <rooftop> {{now}}", None);
        assert!(
            request
                .text()
                .unwrap()
                .ends_with("User: dinner @ Tom & Jerry's <rooftop> {{now}}")
        );

        let empty = builder.build(&now(), "", None);
        assert!(empty.text().unwrap().ends_with("User: "));
    }
}
