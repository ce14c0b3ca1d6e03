//! Call-control instruction documents
//!
//! An `Instruction` is the ordered list of verbs returned to the gateway.
//! It renders to TwiML, the XML dialect Twilio expects from voice webhooks.

use std::fmt::Write;

/// Single call-control verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    /// Play an audio file
    Play { url: String },

    /// Record the caller and request a transcription
    Record {
        /// Where the gateway posts when recording finishes
        action: String,
        /// Seconds of silence that end the recording
        timeout_secs: u32,
        /// Hard cap on recording length in seconds
        max_length_secs: u32,
        play_beep: bool,
        /// Where the gateway posts the transcription result
        transcribe_callback: String,
    },

    /// Continue the call at another webhook
    Redirect { url: String },

    /// Speak text with the gateway's own TTS
    Say { text: String, voice: Option<String> },

    Hangup,
}

/// Ordered verb sequence for one gateway turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instruction {
    verbs: Vec<Verb>,
}

impl Instruction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Play { url: url.into() });
        self
    }

    pub fn record(
        mut self,
        action: impl Into<String>,
        timeout_secs: u32,
        max_length_secs: u32,
        transcribe_callback: impl Into<String>,
    ) -> Self {
        self.verbs.push(Verb::Record {
            action: action.into(),
            timeout_secs,
            max_length_secs,
            play_beep: true,
            transcribe_callback: transcribe_callback.into(),
        });
        self
    }

    pub fn redirect(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Redirect { url: url.into() });
        self
    }

    pub fn say(mut self, text: impl Into<String>, voice: Option<String>) -> Self {
        self.verbs.push(Verb::Say {
            text: text.into(),
            voice,
        });
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    /// Whether the document ends the call
    pub fn hangs_up(&self) -> bool {
        self.verbs.iter().any(|v| matches!(v, Verb::Hangup))
    }

    /// Render as a TwiML `<Response>` document
    pub fn to_twiml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
        for verb in &self.verbs {
            write_verb(&mut xml, verb);
        }
        xml.push_str("</Response>");
        xml
    }
}

fn write_verb(xml: &mut String, verb: &Verb) {
    // Writing to a String cannot fail
    let _ = match verb {
        Verb::Play { url } => write!(xml, "<Play>{}</Play>", escape(url)),
        Verb::Record {
            action,
            timeout_secs,
            max_length_secs,
            play_beep,
            transcribe_callback,
        } => write!(
            xml,
            r#"<Record action="{}" method="POST" timeout="{}" maxLength="{}" playBeep="{}" transcribe="true" transcribeCallback="{}"/>"#,
            escape(action),
            timeout_secs,
            max_length_secs,
            play_beep,
            escape(transcribe_callback),
        ),
        Verb::Redirect { url } => write!(xml, r#"<Redirect method="POST">{}</Redirect>"#, escape(url)),
        Verb::Say { text, voice } => match voice {
            Some(voice) => write!(xml, r#"<Say voice="{}">{}</Say>"#, escape(voice), escape(text)),
            None => write!(xml, "<Say>{}</Say>", escape(text)),
        },
        Verb::Hangup => write!(xml, "<Hangup/>"),
    };
}

/// Escape text for use in XML content and double-quoted attributes
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
