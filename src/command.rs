//! Classification and counting of path drawing commands
use std::fmt;

/// Kind of a drawing command or segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CommandKind {
    Move,
    Line,
    Cubic,
    Quadratic,
    Arc,
    Unrecognized,
}

impl CommandKind {
    /// Classify SVG command letter, case does not matter
    pub fn from_letter(letter: char) -> Self {
        match letter.to_ascii_lowercase() {
            'm' => CommandKind::Move,
            'l' | 'h' | 'v' => CommandKind::Line,
            'c' => CommandKind::Cubic,
            'q' => CommandKind::Quadratic,
            'a' => CommandKind::Arc,
            _ => CommandKind::Unrecognized,
        }
    }

    /// Classify whitespace separated token of the path data
    ///
    /// Returns `None` if the token does not start a new command, that is when it
    /// is longer than one character and its second character is not a digit
    /// (`L10,20` and `z` start commands, `C` followed by a letter does not).
    /// Tokens consisting of parameters only are accepted by this rule but are
    /// classified as [`CommandKind::Unrecognized`].
    pub fn from_token(token: &str) -> Option<Self> {
        let mut chars = token.chars();
        let first = chars.next()?;
        match chars.next() {
            Some(second) if !second.is_ascii_digit() => None,
            _ => Some(Self::from_letter(first)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Move => "move",
            CommandKind::Line => "line",
            CommandKind::Cubic => "cubic",
            CommandKind::Quadratic => "quadratic",
            CommandKind::Arc => "arc",
            CommandKind::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Number of drawing commands per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandCounts {
    pub all: usize,
    #[cfg_attr(feature = "serde", serde(rename = "move"))]
    pub moves: usize,
    #[cfg_attr(feature = "serde", serde(rename = "line"))]
    pub lines: usize,
    #[cfg_attr(feature = "serde", serde(rename = "cubic"))]
    pub cubics: usize,
    #[cfg_attr(feature = "serde", serde(rename = "quadratic"))]
    pub quadratics: usize,
    #[cfg_attr(feature = "serde", serde(rename = "arc"))]
    pub arcs: usize,
}

impl CommandCounts {
    /// Count commands of the raw path data
    pub fn from_path_data(data: &str) -> Self {
        let mut counts = Self::default();
        counts.count(data);
        counts
    }

    /// Count commands of the raw path data on top of already accumulated counts
    pub fn count(&mut self, data: &str) {
        for kind in data.split_whitespace().filter_map(CommandKind::from_token) {
            self.record(kind);
        }
    }

    /// Increment bucket of the command kind, unrecognized commands are ignored
    pub fn record(&mut self, kind: CommandKind) {
        let bucket = match kind {
            CommandKind::Move => &mut self.moves,
            CommandKind::Line => &mut self.lines,
            CommandKind::Cubic => &mut self.cubics,
            CommandKind::Quadratic => &mut self.quadratics,
            CommandKind::Arc => &mut self.arcs,
            CommandKind::Unrecognized => return,
        };
        *bucket += 1;
        self.all += 1;
    }

    pub fn get(&self, kind: CommandKind) -> usize {
        match kind {
            CommandKind::Move => self.moves,
            CommandKind::Line => self.lines,
            CommandKind::Cubic => self.cubics,
            CommandKind::Quadratic => self.quadratics,
            CommandKind::Arc => self.arcs,
            CommandKind::Unrecognized => 0,
        }
    }
}

impl fmt::Display for CommandCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "all: {} move: {} line: {} cubic: {} quadratic: {} arc: {}",
            self.all, self.moves, self.lines, self.cubics, self.quadratics, self.arcs
        )
    }
}
