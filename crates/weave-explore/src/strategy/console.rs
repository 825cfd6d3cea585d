use std::io::{BufRead, Write};

use log::warn;

use weave_trace::Operation;

use super::{ExplorationStrategy, IterationLifecycle};

/// Asks a human for every decision. Meant for manual debugging.
///
/// Invalid answers re-prompt. End of input (or a read error) resolves the
/// query to the first ready operation, `false`, or `0`.
pub struct ConsoleStrategy<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleStrategy<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Next trimmed input line, or `None` at end of input.
    fn read_answer(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                warn!("console strategy input failed: {e}");
                None
            }
        }
    }

    fn say(&mut self, text: &str) {
        // Write failures are ignored.
        let _ = write!(self.output, "{text}");
        let _ = self.output.flush();
    }

    fn list_operations(&mut self, ready: &[Operation]) {
        let mut listing = String::from("List of next operations:\n");
        for (i, op) in ready.iter().enumerate() {
            listing.push_str(&format!("{i}. {op}\n"));
        }
        self.say(&listing);
    }
}

impl<R: BufRead, W: Write> IterationLifecycle for ConsoleStrategy<R, W> {}

impl<R: BufRead, W: Write> ExplorationStrategy for ConsoleStrategy<R, W> {
    fn next_operation<'a>(
        &mut self,
        ready: &'a [Operation],
        _current: Option<&Operation>,
        _is_yielding: bool,
    ) -> &'a Operation {
        assert!(!ready.is_empty(), "next_operation called with an empty ready set");
        self.list_operations(ready);
        loop {
            self.say("Please select the next operation: ");
            let Some(answer) = self.read_answer() else {
                return &ready[0];
            };
            match answer.parse::<usize>() {
                Ok(idx) if idx < ready.len() => return &ready[idx],
                _ => {
                    self.say("Invalid input, try again. ");
                    self.list_operations(ready);
                }
            }
        }
    }

    fn next_boolean(&mut self, _current: Option<&Operation>) -> bool {
        let prompt = "Enter boolean for the next operation (0 for True, 1 for False): ";
        self.say(prompt);
        loop {
            let Some(answer) = self.read_answer() else {
                return false;
            };
            match answer.as_str() {
                "0" => return true,
                "1" => return false,
                _ => self.say(&format!("Invalid input, try again. {prompt}")),
            }
        }
    }

    fn next_integer(&mut self, _current: Option<&Operation>, bound: i64) -> i64 {
        if bound <= 0 {
            return 0;
        }
        let prompt = format!("Enter integer in the range [0, {bound}) for the next operation: ");
        self.say(&prompt);
        loop {
            let Some(answer) = self.read_answer() else {
                return 0;
            };
            match answer.parse::<i64>() {
                Ok(v) if (0..bound).contains(&v) => return v,
                _ => self.say(&format!("Invalid input, try again. {prompt}")),
            }
        }
    }

    fn name(&self) -> &str {
        "console"
    }
}
