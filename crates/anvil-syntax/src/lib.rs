//! Ninja build-file syntax writer.
//!
//! Emits the textual ninja grammar: variables (`name = value`), rules
//! (`rule name` with an indented `command =` block), build edges
//! (`build out: rule in | implicit || order-only`), comments, and defaults.
//! Paths are escaped (`$`, space and `:` become `$$`, `$ ` and `$:`) and
//! long lines are wrapped at word boundaries with ` $` continuations.
//!
//! The writer holds no graph state. Emission order is the caller's
//! contract: rules must be written before their first use and variables
//! before their first reference.

use std::io::{self, Write};

/// Maximum output line width before wrapping.
const LINE_WIDTH: usize = 78;

/// Optional attributes of a ninja rule declaration.
#[derive(Debug, Clone, Default)]
pub struct RuleOptions {
    /// Human-readable description shown by ninja while running the rule.
    pub description: Option<String>,
    /// Depfile path expression (e.g. `$out.d`).
    pub depfile: Option<String>,
    /// Dependency processing mode (`gcc` or `msvc`).
    pub deps: Option<String>,
    /// Re-stat outputs after running to prune unchanged downstream edges.
    pub restat: bool,
    /// Mark the rule as a generator rule (outputs are build files).
    pub generator: bool,
}

/// Escape a path for use in a build edge or default statement.
pub fn escape_path(path: &str) -> String {
    path.replace('$', "$$").replace(' ', "$ ").replace(':', "$:")
}

/// Writer emitting ninja syntax to an underlying `io::Write`.
#[derive(Debug)]
pub struct NinjaWriter<W: Write> {
    out: W,
    width: usize,
}

impl<W: Write> NinjaWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            width: LINE_WIDTH,
        }
    }

    /// Write a comment, wrapped to the line width.
    pub fn comment(&mut self, text: &str) -> io::Result<()> {
        let budget = self.width.saturating_sub(2);
        let mut line = String::new();
        for word in text.split_whitespace() {
            if !line.is_empty() && line.len() + 1 + word.len() > budget {
                writeln!(self.out, "# {line}")?;
                line.clear();
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        writeln!(self.out, "# {line}")
    }

    /// Write a global variable definition.
    pub fn variable(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.line(&format!("{name} = {value}"), 0)
    }

    /// Write a variable definition scoped under the preceding declaration.
    pub fn scoped_variable(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.line(&format!("{name} = {value}"), 1)
    }

    /// Write a rule declaration.
    pub fn rule(&mut self, name: &str, command: &str, options: &RuleOptions) -> io::Result<()> {
        self.line(&format!("rule {name}"), 0)?;
        self.scoped_variable("command", command)?;
        if let Some(description) = &options.description {
            self.scoped_variable("description", description)?;
        }
        if let Some(depfile) = &options.depfile {
            self.scoped_variable("depfile", depfile)?;
        }
        if let Some(deps) = &options.deps {
            self.scoped_variable("deps", deps)?;
        }
        if options.restat {
            self.scoped_variable("restat", "1")?;
        }
        if options.generator {
            self.scoped_variable("generator", "1")?;
        }
        Ok(())
    }

    /// Write a build edge.
    pub fn build(
        &mut self,
        outputs: &[String],
        rule: &str,
        inputs: &[String],
        implicit: &[String],
        order_only: &[String],
        variables: &[(String, String)],
    ) -> io::Result<()> {
        let outs: Vec<String> = outputs.iter().map(|p| escape_path(p)).collect();
        let mut ins: Vec<String> = inputs.iter().map(|p| escape_path(p)).collect();
        if !implicit.is_empty() {
            ins.push("|".to_string());
            ins.extend(implicit.iter().map(|p| escape_path(p)));
        }
        if !order_only.is_empty() {
            ins.push("||".to_string());
            ins.extend(order_only.iter().map(|p| escape_path(p)));
        }
        let head = format!("build {}: {} {}", outs.join(" "), rule, ins.join(" "));
        self.line(head.trim_end(), 0)?;
        for (name, value) in variables {
            self.scoped_variable(name, value)?;
        }
        Ok(())
    }

    /// Write a default-target statement.
    pub fn default(&mut self, targets: &[String]) -> io::Result<()> {
        let escaped: Vec<String> = targets.iter().map(|p| escape_path(p)).collect();
        self.line(&format!("default {}", escaped.join(" ")), 0)
    }

    /// Write a blank line.
    pub fn newline(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    /// Write a logical line, wrapping at unescaped spaces with ` $`
    /// continuations.
    fn line(&mut self, text: &str, indent: usize) -> io::Result<()> {
        let mut text = text.to_string();
        let mut leading = "  ".repeat(indent);
        while leading.len() + text.len() > self.width {
            // Leave room for the trailing ` $` continuation marker.
            let available = self.width - leading.len() - 2;
            let spaces = unescaped_spaces(&text);
            let space = match spaces
                .iter()
                .rev()
                .find(|&&i| i < available)
                .or_else(|| spaces.first())
            {
                Some(&idx) => idx,
                None => break,
            };
            writeln!(self.out, "{}{} $", leading, &text[..space])?;
            text = text[space + 1..].to_string();
            leading = "  ".repeat(indent + 2);
        }
        writeln!(self.out, "{leading}{text}")
    }
}

/// Byte offsets of spaces that are word separators rather than part of a
/// `$ ` escape. Tracks escape state so a space after `$$` still counts.
fn unescaped_spaces(text: &str) -> Vec<usize> {
    let mut spaces = Vec::new();
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '$' {
            escaped = true;
        } else if c == ' ' {
            spaces.push(i);
        }
    }
    spaces
}
