//! Minimal PGN reader: tag pairs and mainline SAN tokens, nothing else.
//!
//! Comments, variations, NAGs, move numbers, annotation glyphs and escape lines are skipped.
//! Moves stay as SAN text; turning them into moves needs a position and is the caller's job.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PgnGame {
    pub tags: Vec<(String, String)>,
    pub moves: Vec<String>,
}

impl PgnGame {
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Start position from the `FEN` tag, if the game does not begin from the initial setup.
    pub fn start_fen(&self) -> Option<&str> {
        self.tag("FEN")
    }
}

const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// Splits PGN text into games. Games without any moves are dropped.
pub fn read_games(text: &str) -> Vec<PgnGame> {
    let mut games = Vec::new();
    let mut current = PgnGame::default();
    let mut variation_depth = 0usize;
    let mut chars = text.chars().peekable();
    let mut at_line_start = true;

    while let Some(c) = chars.next() {
        let line_start = at_line_start;
        at_line_start = c == '\n';

        match c {
            '%' if line_start => skip_line(&mut chars, &mut at_line_start),
            ';' => skip_line(&mut chars, &mut at_line_start),
            '{' => {
                for inner in chars.by_ref() {
                    if inner == '}' {
                        break;
                    }
                }
            }
            '(' => variation_depth += 1,
            ')' => variation_depth = variation_depth.saturating_sub(1),
            '[' if variation_depth == 0 => {
                if !current.moves.is_empty() {
                    games.push(std::mem::take(&mut current));
                }
                let mut raw = String::new();
                for inner in chars.by_ref() {
                    if inner == ']' {
                        break;
                    }
                    raw.push(inner);
                }
                if let Some(tag) = parse_tag(&raw) {
                    current.tags.push(tag);
                }
            }
            c if c.is_whitespace() => {}
            first => {
                let mut token = String::from(first);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || "{}();[".contains(next) {
                        break;
                    }
                    token.push(next);
                    chars.next();
                }
                if variation_depth > 0 {
                    continue;
                }
                if RESULTS.contains(&token.as_str()) {
                    if !current.moves.is_empty() {
                        games.push(std::mem::take(&mut current));
                    } else {
                        current = PgnGame::default();
                    }
                    continue;
                }
                if let Some(san) = clean_move_token(&token) {
                    current.moves.push(san);
                }
            }
        }
    }

    if !current.moves.is_empty() {
        games.push(current);
    }
    games
}

fn skip_line(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, at_line_start: &mut bool) {
    for inner in chars.by_ref() {
        if inner == '\n' {
            *at_line_start = true;
            break;
        }
    }
}

fn parse_tag(raw: &str) -> Option<(String, String)> {
    let raw = raw.trim();
    let (name, rest) = raw.split_once(char::is_whitespace)?;
    let value = rest.trim().strip_prefix('"')?.strip_suffix('"')?;
    Some((name.to_string(), value.replace("\\\"", "\"")))
}

/// Strips move numbers ("12.", "12...") and glyphs ("!?"). NAGs ("$3") yield nothing.
fn clean_move_token(token: &str) -> Option<String> {
    if token.starts_with('$') {
        return None;
    }
    let token = token.trim_end_matches(['!', '?']);
    // Castling written with zeros
    if token.starts_with("0-0") {
        return Some(token.replace('0', "O"));
    }
    let token = token.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.');
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_game_with_tags() {
        let text = r#"[Event "Casual"]
[White "A"]
[Black "B"]

1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 1-0
"#;
        let games = read_games(text);
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].tag("event"), Some("Casual"));
        assert_eq!(games[0].moves, vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"]);
    }

    #[test]
    fn test_skips_comments_variations_and_nags() {
        let text = "1. e4 {best by test} e5 (1... c5 2. Nf3) 2. Nf3!? $1 Nc6?? ; trailing\n3. Bc4 *";
        let games = read_games(text);
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].moves, vec!["e4", "e5", "Nf3", "Nc6", "Bc4"]);
    }

    #[test]
    fn test_zero_castling_normalised() {
        let games = read_games("1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. 0-0+ *");
        assert_eq!(games[0].moves.last().map(String::as_str), Some("O-O+"));
    }

    #[test]
    fn test_multiple_games_and_black_move_numbers() {
        let text = "[Event \"1\"]\n1.d4 d5 2.c4 1/2-1/2\n\n[Event \"2\"]\n1. e4 1... c5 0-1\n";
        let games = read_games(text);
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].moves, vec!["d4", "d5", "c4"]);
        assert_eq!(games[1].moves, vec!["e4", "c5"]);
        assert_eq!(games[1].tag("Event"), Some("2"));
    }

    #[test]
    fn test_fen_tag() {
        let text = "[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/4P3/4K3 w - - 0 1\"]\n1. e4 Kd7 *";
        let games = read_games(text);
        assert_eq!(games[0].start_fen(), Some("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1"));
    }

    #[test]
    fn test_escape_lines_and_empty_games() {
        let text = "% generated\n[Event \"empty\"]\n*\n[Event \"real\"]\n1. c4 *";
        let games = read_games(text);
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].moves, vec!["c4"]);
        assert_eq!(games[0].tag("Event"), Some("real"));
    }
}
