//! The fixed instruction sent with every extraction request.

/// System instruction for event extraction.
///
/// The five keys here must match the fields of [`crate::EventRecord`].
pub const SYSTEM_PROMPT: &str = r#"Your goal is to extract the information needed to add one event to a calendar.

Extract the following fields from the text and output them as JSON:

- title: the title of the calendar entry, about 10 characters
- description: a short description of the event, about 50 characters
- date: the date of the event, normalized to YYYY-MM-DD
- time: the start time of the event, converted to the 24-hour HH:MM format (e.g. 3 PM -> 15:00)
- location: the full address or place name, as detailed as possible

Output only a JSON object in exactly this shape. Do not include explanations or sentences.

{
  "title": "",
  "description": "",
  "date": "",
  "time": "",
  "location": ""
}

Follow these rules:
1. Skip any links contained in the text.
2. Extract only the scheduling information from the text."#;
