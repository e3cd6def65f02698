//! Command source: turns user input into engine commands.
//!
//! Two collaborators feed the engine: a keyword matcher for speech-like
//! transcripts and touch zones for pointer presses. Anything they do not
//! recognize stops here.

use crate::config::Keywords;
use crate::engine::Command;

/// Matches transcripts against the configured keywords.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    table: Vec<(Command, Vec<String>)>,
}

impl KeywordMatcher {
    pub fn new(keywords: &Keywords) -> Self {
        let table = Command::ALL
            .iter()
            .map(|&command| {
                let words = keywords
                    .for_command(command)
                    .iter()
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect();
                (command, words)
            })
            .collect();
        KeywordMatcher { table }
    }

    /// The command whose keyword appears in `transcript`. Commands are checked
    /// in the order Jump, Shoot, Explode.
    pub fn match_transcript(&self, transcript: &str) -> Option<Command> {
        let text = transcript.to_lowercase();
        self.table
            .iter()
            .find(|(_, words)| words.iter().any(|w| text.contains(w.as_str())))
            .map(|(command, _)| *command)
    }

    /// Every command found across a recognizer's alternative transcripts, in
    /// order.
    pub fn match_alternatives<'a>(
        &self,
        alternatives: impl IntoIterator<Item = &'a str>,
    ) -> Vec<Command> {
        alternatives
            .into_iter()
            .filter_map(|alt| self.match_transcript(alt))
            .collect()
    }
}

/// Splits the view into three equal columns: Jump, Shoot, Explode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchZones {
    pub width: f32,
}

impl TouchZones {
    pub fn command_at(&self, x: f32) -> Option<Command> {
        if !(x >= 0.0 && x < self.width) {
            return None;
        }
        let zone = (x / self.width * 3.0) as usize;
        Command::ALL.get(zone).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> KeywordMatcher {
        KeywordMatcher::new(&Keywords::default())
    }

    #[test]
    fn keywords_match_case_insensitively() {
        let m = matcher();
        assert_eq!(m.match_transcript("HOP!"), Some(Command::Jump));
        assert_eq!(m.match_transcript("il saute"), Some(Command::Jump));
        assert_eq!(m.match_transcript("pan pan"), Some(Command::Shoot));
        assert_eq!(m.match_transcript("Boom"), Some(Command::Explode));
        assert_eq!(m.match_transcript("bonjour"), None);
        assert_eq!(m.match_transcript(""), None);
    }

    #[test]
    fn jump_wins_over_later_commands() {
        assert_eq!(matcher().match_transcript("paf hop boum"), Some(Command::Jump));
    }

    #[test]
    fn every_matching_alternative_issues_a_command() {
        let m = matcher();
        let commands = m.match_alternatives(["hop", "bof", "boum"]);
        assert_eq!(commands, vec![Command::Jump, Command::Explode]);
    }

    #[test]
    fn blank_keywords_are_ignored() {
        let keywords = Keywords {
            jump: vec!["  ".into()],
            ..Keywords::default()
        };
        let m = KeywordMatcher::new(&keywords);
        assert_eq!(m.match_transcript("anything"), None);
    }

    #[test]
    fn touch_zones_split_width_in_thirds() {
        let zones = TouchZones { width: 300.0 };
        assert_eq!(zones.command_at(0.0), Some(Command::Jump));
        assert_eq!(zones.command_at(99.9), Some(Command::Jump));
        assert_eq!(zones.command_at(100.0), Some(Command::Shoot));
        assert_eq!(zones.command_at(250.0), Some(Command::Explode));
        assert_eq!(zones.command_at(300.0), None);
        assert_eq!(zones.command_at(-1.0), None);
    }
}
