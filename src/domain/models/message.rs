#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Author;

/// Which inference engine produced an assistant reply.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Origin {
    Internal,
    External,
}

impl Origin {
    pub fn from_preference(use_external: bool) -> Origin {
        if use_external {
            return Origin::External;
        }

        return Origin::Internal;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub author: Author,
    pub text: String,
    pub origin: Option<Origin>,
}

/// A message reduced to what the backend receives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub sender: String,
    pub text: String,
}

impl Message {
    pub fn new(author: Author, text: &str) -> Message {
        return Message {
            author,
            text: text.to_string(),
            origin: None,
        };
    }

    pub fn new_with_origin(author: Author, text: &str, origin: Option<Origin>) -> Message {
        return Message {
            author,
            text: text.to_string(),
            origin,
        };
    }

    pub fn to_wire(&self) -> WireMessage {
        return WireMessage {
            sender: self.author.sender().to_string(),
            text: self.text.to_string(),
        };
    }

    pub fn as_string_lines(&self, line_max_width: usize) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        let text = self.text.replace('\t', "  ");

        for full_line in text.split('\n') {
            if full_line.trim().is_empty() {
                lines.push(" ".to_string());
                continue;
            }

            let mut char_count = 0;
            let mut current_lines: Vec<&str> = vec![];

            for word in full_line.split(' ') {
                if !current_lines.is_empty() && word.len() + char_count + 1 > line_max_width {
                    lines.push(current_lines.join(" ").trim_end().to_string());
                    current_lines = vec![word];
                    char_count = word.len() + 1;
                } else {
                    current_lines.push(word);
                    char_count += word.len() + 1;
                }
            }
            if !current_lines.is_empty() {
                lines.push(current_lines.join(" ").trim_end().to_string());
            }
        }

        return lines;
    }
}
