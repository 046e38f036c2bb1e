//! # Terminal Mapping Prompt
//!
//! Asks the user, line by line, which column holds each role when a header
//! is not recognized.
//!
//! ```text
//! odd.json: header not recognized (missing: sku, price)
//!   [0] 编号   [1] 报价   [2] 备注
//! Type a column number, "-" for none, Enter to keep the guess, "skip" to skip the file.
//! sku [none]: 0
//! size [none]:
//! price [none]: 1
//! discount [none]: -
//! sales [none]:
//! ```

use std::io::{BufRead, Write};

use arb_core::{ColumnMapping, ColumnRole, MappingDecision, MappingRequest};

use crate::commands::ingest::MappingPrompt;

/// What one answer line means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Keep,
    Column(Option<usize>),
    Skip,
}

fn parse_answer(input: &str) -> Result<Answer, String> {
    match input.trim() {
        "" => Ok(Answer::Keep),
        "-" => Ok(Answer::Column(None)),
        s if s.eq_ignore_ascii_case("skip") => Ok(Answer::Skip),
        s => s
            .parse::<usize>()
            .map(|col| Answer::Column(Some(col)))
            .map_err(|_| format!("\"{}\" is not a column number", s)),
    }
}

fn describe(column: Option<usize>) -> String {
    column.map_or_else(|| "none".to_string(), |c| c.to_string())
}

/// Mapping prompt over any line reader and writer (stdin/stderr in the CLI).
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        TerminalPrompt { input, output }
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }

    fn ask_role(&mut self, role: ColumnRole, current: Option<usize>) -> Answer {
        loop {
            let _ = write!(self.output, "{} [{}]: ", role, describe(current));
            let _ = self.output.flush();

            // End of input: nobody is there to answer
            let Some(line) = self.read_line() else {
                return Answer::Skip;
            };
            match parse_answer(&line) {
                Ok(answer) => return answer,
                Err(reason) => {
                    let _ = writeln!(self.output, "{}", reason);
                }
            }
        }
    }
}

impl<R: BufRead, W: Write> MappingPrompt for TerminalPrompt<R, W> {
    fn decide(&mut self, request: &MappingRequest) -> MappingDecision {
        let missing: Vec<&str> = request.missing.iter().map(|r| r.as_str()).collect();
        let _ = writeln!(
            self.output,
            "{}: header not recognized (missing: {})",
            request.file_name,
            missing.join(", ")
        );
        let columns: Vec<String> = request
            .header
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("[{}] {}", i, cell))
            .collect();
        let _ = writeln!(self.output, "  {}", columns.join("   "));
        let _ = writeln!(
            self.output,
            "Type a column number, \"-\" for none, Enter to keep the guess, \"skip\" to skip the file."
        );

        let mut mapping: ColumnMapping = request.guess;
        for role in ColumnRole::ALL {
            match self.ask_role(role, mapping.get(role)) {
                Answer::Skip => return MappingDecision::Skip,
                Answer::Keep => {}
                Answer::Column(column) => mapping.set(role, column),
            }
        }
        MappingDecision::Confirm(mapping)
    }

    fn rejected(&mut self, reason: &str) {
        let _ = writeln!(self.output, "mapping refused: {}", reason);
    }
}
