//! Text front end: board rendering, event messages and move input

use std::io::{self, BufRead, Write};

use krojanty_core::{Color, GameState, MatchEvent, Square, BOARD_SIZE};
use krojanty_net::{parse_square, Token};

/// One line of player input
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Full move in token notation, e.g. `B7B5`
    Move(Token),
    /// Show where the piece on this cell can go
    Select(Square),
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => return Ok(Command::Quit),
        "h" | "help" | "?" => return Ok(Command::Help),
        _ => {}
    }
    match line.len() {
        2 => parse_square(line).map(Command::Select).map_err(|e| e.to_string()),
        _ => line.parse::<Token>().map(Command::Move).map_err(|e| e.to_string()),
    }
}

const HELP: &str = "Enter a move as four characters (B7B5), a cell (B7) to see its moves, or 'quit'.";

/// Cell glyph: piece symbol, then highlight, then city or control
fn glyph(state: &GameState, square: Square, highlights: &[Square]) -> char {
    let board = state.board();
    if let Some(piece) = board.piece_at(square) {
        return piece.symbol();
    }
    if highlights.contains(&square) {
        return '*';
    }
    if square.is_city() {
        return '#';
    }
    match board.control(square) {
        Some(Color::Blue) => '+',
        Some(Color::Red) => '-',
        None => '.',
    }
}

/// Board with file letters on top and ranks on the left, plus a status line
pub fn render_board(state: &GameState, highlights: &[Square]) -> String {
    let mut out = String::from("   ");
    for col in 0..BOARD_SIZE {
        out.push(' ');
        out.push((b'A' + col) as char);
    }
    out.push('\n');

    for row in 0..BOARD_SIZE {
        out.push_str(&format!(" {} ", BOARD_SIZE - row));
        for col in 0..BOARD_SIZE {
            out.push(' ');
            if let Some(square) = Square::new(row, col) {
                out.push(glyph(state, square, highlights));
            }
        }
        out.push('\n');
    }

    out.push_str(&status_line(state));
    out.push('\n');
    out
}

pub fn status_line(state: &GameState) -> String {
    let scores = state.scores();
    let head = match state.outcome() {
        Some(outcome) => format!("Game over: {}", outcome),
        None => format!(
            "Turn {}/{} - {} to move",
            state.turn(),
            state.max_turn(),
            state.to_move()
        ),
    };
    format!(
        "{} | Blue {} ({} pieces)  Red {} ({} pieces)",
        head, scores.blue, scores.blue_pieces, scores.red, scores.red_pieces
    )
}

/// Human-readable lines for a batch of match events
pub fn describe_events(events: &[MatchEvent]) -> Vec<String> {
    let mut lines = Vec::new();
    for event in events {
        match event {
            MatchEvent::Moved { mv, captures } => {
                lines.push(format!("Move {}", mv));
                for capture in captures {
                    lines.push(format!(
                        "  {} {} on {} captured ({})",
                        capture.piece.color,
                        if capture.piece.is_king() { "king" } else { "soldier" },
                        capture.piece.square,
                        capture.rule
                    ));
                }
            }
            MatchEvent::ScoreChanged(_) => {}
            MatchEvent::GameOver(outcome) => lines.push(format!("Game over: {}", outcome)),
        }
    }
    lines
}

/// Console wrapper, generic so tests can script it
pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn show_board(&mut self, state: &GameState, highlights: &[Square]) -> io::Result<()> {
        write!(self.output, "\n{}", render_board(state, highlights))?;
        self.output.flush()
    }

    pub fn show_events(&mut self, events: &[MatchEvent]) -> io::Result<()> {
        for line in describe_events(events) {
            writeln!(self.output, "{}", line)?;
        }
        Ok(())
    }

    pub fn message(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)
    }

    /// Ask `color` for a command until one parses. End of input quits.
    pub fn prompt(&mut self, color: Color) -> io::Result<Command> {
        loop {
            write!(self.output, "{} > ", color)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(Command::Quit);
            }
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Ok(Command::Help) => writeln!(self.output, "{}", HELP)?,
                Ok(command) => return Ok(command),
                Err(e) => writeln!(self.output, "Cannot read '{}': {}", line.trim(), e)?,
            }
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krojanty_core::MatchConfig;
    use std::io::Cursor;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("quit"), Ok(Command::Quit));
        assert_eq!(parse_command(" b8 "), Ok(Command::Select(Square::at(1, 1))));
        let Ok(Command::Move(token)) = parse_command("a9b9") else {
            panic!("expected a move");
        };
        assert_eq!(token.from(), Square::at(0, 0));
        assert!(parse_command("ABC").is_err());
        assert!(parse_command("Z1").is_err());
    }

    #[test]
    fn test_render_opening() {
        let state = GameState::standard(&MatchConfig::default());
        let text = render_board(&state, &[]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "    A B C D E F G H I");
        assert_eq!(lines[1], " 9  # S S S . . . . .");
        assert_eq!(lines[2], " 8  S K S . . . . . .");
        assert_eq!(lines[9], " 1  . . . . . s s s #");
        assert!(lines[10].starts_with("Turn 1/64 - Blue to move"));
    }

    #[test]
    fn test_highlights_shown() {
        let state = GameState::standard(&MatchConfig::default());
        let text = render_board(&state, &[Square::at(0, 0)]);
        assert!(text.lines().nth(1).unwrap().starts_with(" 9  * S"));
    }

    #[test]
    fn test_prompt_skips_bad_input() {
        let input = Cursor::new("\nnonsense\nhelp\nB8\n");
        let mut term = Terminal::new(input, Vec::new());
        let command = term.prompt(Color::Blue).unwrap();
        assert_eq!(command, Command::Select(Square::at(1, 1)));
        let output = String::from_utf8(term.into_output()).unwrap();
        assert!(output.contains("Cannot read 'nonsense'"));
        assert!(output.contains("Enter a move"));

        let mut done = Terminal::new(Cursor::new(""), Vec::new());
        assert_eq!(done.prompt(Color::Red).unwrap(), Command::Quit);
    }
}
