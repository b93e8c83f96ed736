use std::io::{self, BufRead, StdinLock, Stdout, Write};

use canvas_ics_core::{
    Result,
    select::{Choice, Selector},
};

/// Numbered-list prompts on a terminal.
///
/// Multi-select answers are numbers and ranges (`1 3 5-7`, `2,4`) or `all`;
/// an empty line or end of input picks nothing.
pub struct TerminalSelector<R, W> {
    input: R,
    output: W,
}

impl TerminalSelector<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn show<T>(&mut self, message: &str, choices: &[Choice<T>]) -> io::Result<()> {
        writeln!(self.output, "\n{message}")?;
        for (index, choice) in choices.iter().enumerate() {
            writeln!(self.output, "  [{}] {}", index + 1, choice.label)?;
        }
        Ok(())
    }

    /// `None` at end of input.
    fn ask(&mut self, hint: &str) -> io::Result<Option<String>> {
        write!(self.output, "{hint}: ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Selector for TerminalSelector<R, W> {
    fn select_subset<T: Clone>(&mut self, message: &str, choices: &[Choice<T>]) -> Result<Vec<T>> {
        if choices.is_empty() {
            return Ok(Vec::new());
        }
        self.show(message, choices)?;
        loop {
            let Some(answer) = self.ask("Numbers (e.g. 1 3 5-7), 'all', or empty for none")?
            else {
                return Ok(Vec::new());
            };
            match parse_subset(&answer, choices.len()) {
                Ok(indices) => {
                    return Ok(indices.into_iter().map(|i| choices[i].value.clone()).collect());
                }
                Err(e) => writeln!(self.output, "{e}")?,
            }
        }
    }

    fn select_one<T: Clone>(&mut self, message: &str, choices: &[Choice<T>]) -> Result<Option<T>> {
        if choices.is_empty() {
            return Ok(None);
        }
        self.show(message, choices)?;
        loop {
            let Some(answer) = self.ask("Number (empty for default)")? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(None);
            }
            match parse_index(&answer, choices.len()) {
                Ok(index) => return Ok(Some(choices[index].value.clone())),
                Err(e) => writeln!(self.output, "{e}")?,
            }
        }
    }
}

/// Zero-based indices in ascending order without duplicates.
fn parse_subset(answer: &str, len: usize) -> std::result::Result<Vec<usize>, String> {
    if answer.eq_ignore_ascii_case("all") {
        return Ok((0..len).collect());
    }

    let mut picked = vec![false; len];
    for token in answer
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_index(start, len)?;
                let end = parse_index(end, len)?;
                if start > end {
                    return Err(format!("Invalid range: {token}"));
                }
                picked[start..=end].iter_mut().for_each(|p| *p = true);
            }
            None => picked[parse_index(token, len)?] = true,
        }
    }

    Ok(picked
        .into_iter()
        .enumerate()
        .filter_map(|(i, p)| p.then_some(i))
        .collect())
}

fn parse_index(token: &str, len: usize) -> std::result::Result<usize, String> {
    match token.trim().parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Ok(n - 1),
        _ => Err(format!("Please enter a number between 1 and {len}, got '{}'", token.trim())),
    }
}
