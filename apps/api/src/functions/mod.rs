// Thin proxy functions in front of the AI provider: content enhancement and
// text-to-speech. The realtime voice bridge lives in `realtime`.

pub mod enhance;
pub mod handlers;
pub mod prompts;
pub mod tts;
