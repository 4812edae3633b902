//! Text rendering of databanks and query rows.
//!
//! Databanks print as N-Triples, one canonical triple per line. Query rows
//! print as a plain table with one column per variable.

use std::collections::BTreeSet;

use crate::id::TripleId;
use crate::pattern::Match;
use crate::pool::TermPool;

/// Pretty-print configuration
pub struct PrettyConfig {
    /// Spaces between table columns.
    pub gutter: usize,
    /// Printed for a variable the row leaves unbound.
    pub unbound: String,
}

impl Default for PrettyConfig {
    fn default() -> Self {
        Self {
            gutter: 2,
            unbound: "-".to_string(),
        }
    }
}

/// A pretty-printer accumulating into a string
pub struct Pretty {
    output: String,
    config: PrettyConfig,
}

impl Default for Pretty {
    fn default() -> Self {
        Self::new()
    }
}

impl Pretty {
    pub fn new() -> Self {
        Self::with_config(PrettyConfig::default())
    }

    pub fn with_config(config: PrettyConfig) -> Self {
        Self {
            output: String::new(),
            config,
        }
    }

    pub fn finish(self) -> String {
        self.output
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn writeln(&mut self, s: &str) {
        self.output.push_str(s);
        self.output.push('\n');
    }

    fn pad(&mut self, width: usize) {
        for _ in 0..width {
            self.output.push(' ');
        }
    }

    pub fn describe_bank(len: usize) -> String {
        format!("[Databank with {} triples]", len)
    }

    pub fn bank(&mut self, pool: &TermPool, triples: impl IntoIterator<Item = TripleId>) {
        for id in triples {
            self.writeln(&pool.triple_text(id));
        }
    }

    /// A header row of variable names, then one line per row.
    pub fn rows<'a>(&mut self, pool: &TermPool, rows: impl IntoIterator<Item = &'a Match> + Clone) {
        let vars: Vec<&str> = rows
            .clone()
            .into_iter()
            .flat_map(|row| row.bindings.keys().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if vars.is_empty() {
            return;
        }

        let cells: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| {
                vars.iter()
                    .map(|var| match row.get(var) {
                        Some(id) => pool.term(id).to_string(),
                        None => self.config.unbound.clone(),
                    })
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = vars
            .iter()
            .enumerate()
            .map(|(i, var)| {
                cells
                    .iter()
                    .map(|line| line[i].chars().count())
                    .chain([var.chars().count() + 1])
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<String> = vars.iter().map(|v| format!("?{}", v)).collect();
        self.line(&header, &widths);
        for line in &cells {
            self.line(line, &widths);
        }
    }

    fn line(&mut self, cells: &[String], widths: &[usize]) {
        for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
            self.write(cell);
            if i + 1 < cells.len() {
                self.pad(width - cell.chars().count() + self.config.gutter);
            }
        }
        self.output.push('\n');
    }
}
