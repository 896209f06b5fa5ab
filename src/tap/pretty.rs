//! Human-readable rendering of a TAP stream.
//!
//! [`PrettySink`] consumes the same lines the reporter writes (or any nested
//! TAP 13 stream read from elsewhere) and prints subtest names as headings,
//! one `✔`/`✖` line per assertion, the details of each failure, and a final
//! tally. Result lines that close a subtest are folded into its heading.

use super::sink::LineSink;
use difference::{Changeset, Difference};
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line<'a> {
    Version,
    Subtest(&'a str),
    Result { ok: bool, name: &'a str },
    Plan,
    Comment(&'a str),
    BlockStart,
    BlockEnd,
    Other(&'a str),
}

fn classify(trimmed: &str) -> Line<'_> {
    if trimmed.starts_with("TAP version") {
        return Line::Version;
    }
    if let Some(name) = trimmed.strip_prefix("# Subtest: ") {
        return Line::Subtest(name);
    }
    if let Some(text) = trimmed.strip_prefix('#') {
        return Line::Comment(text.trim_start());
    }
    if trimmed == "---" {
        return Line::BlockStart;
    }
    if trimmed == "..." {
        return Line::BlockEnd;
    }
    if trimmed.starts_with("1..") {
        return Line::Plan;
    }
    let (ok, rest) = if let Some(rest) = trimmed.strip_prefix("not ok ") {
        (false, rest)
    } else if let Some(rest) = trimmed.strip_prefix("ok ") {
        (true, rest)
    } else {
        return Line::Other(trimmed);
    };
    let name = rest.split_once(" - ").map_or("", |(_, name)| name);
    Line::Result { ok, name }
}

pub struct PrettySink<W: WriteColor> {
    out: W,
    open_subtests: Vec<usize>,
    block: Option<(usize, Vec<String>)>,
    passed: usize,
    failed: usize,
}

impl PrettySink<StandardStream> {
    pub fn stdout(use_colors: bool) -> Self {
        let choice = if use_colors {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self::new(StandardStream::stdout(choice))
    }
}

impl<W: WriteColor> PrettySink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            open_subtests: Vec::new(),
            block: None,
            passed: 0,
            failed: 0,
        }
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn colored(&mut self, color: Option<Color>, bold: bool, text: &str) {
        let _ = self
            .out
            .set_color(ColorSpec::new().set_fg(color).set_bold(bold));
        let _ = write!(self.out, "{}", text);
        let _ = self.out.reset();
    }

    fn print(&mut self, level: usize, color: Option<Color>, bold: bool, text: &str) {
        let _ = write!(self.out, "{}", "  ".repeat(level + 1));
        self.colored(color, bold, text);
        let _ = writeln!(self.out);
    }

    fn finish_block(&mut self, indent: usize, lines: Vec<String>) {
        let level = indent / 4 + 2;
        let text = lines
            .iter()
            .map(|l| l.get(indent..).unwrap_or(l.trim_start()))
            .collect::<Vec<_>>()
            .join("\n");
        let Ok(doc) = serde_yaml::from_str::<serde_yaml::Value>(&text) else {
            for line in lines {
                self.print(level, Some(Color::Red), false, line.trim());
            }
            return;
        };

        let found = doc.get("found");
        let wanted = doc.get("wanted");
        match (found, wanted) {
            (Some(found), Some(wanted)) => {
                let render = |v: &serde_yaml::Value| {
                    serde_yaml::to_string(v).unwrap_or_default().trim_end().to_string()
                };
                let changeset = Changeset::new(&render(wanted), &render(found), "\n");
                for diff in changeset.diffs {
                    match diff {
                        Difference::Same(x) => {
                            for l in x.lines() {
                                self.print(level, None, false, &format!(" {}", l));
                            }
                        }
                        Difference::Rem(x) => {
                            for l in x.lines() {
                                self.print(level, Some(Color::Green), false, &format!("-{}", l));
                            }
                        }
                        Difference::Add(x) => {
                            for l in x.lines() {
                                self.print(level, Some(Color::Red), false, &format!("+{}", l));
                            }
                        }
                    }
                }
            }
            _ => {
                let stack = found
                    .and_then(|f| f.get("stack"))
                    .and_then(|s| s.as_str())
                    .map(str::to_string);
                match stack {
                    Some(stack) => {
                        for l in stack.lines() {
                            self.print(level, Some(Color::Red), false, l.trim());
                        }
                    }
                    None => {
                        for l in text.lines() {
                            self.print(level, Some(Color::Red), false, l);
                        }
                    }
                }
            }
        }
    }
}

impl<W: WriteColor> LineSink for PrettySink<W> {
    fn emit(&mut self, line: &str) {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        if let Some((block_indent, mut lines)) = self.block.take() {
            if classify(trimmed) == Line::BlockEnd {
                self.finish_block(block_indent, lines);
            } else {
                lines.push(line.to_string());
                self.block = Some((block_indent, lines));
            }
            return;
        }

        let level = indent / 4;
        match classify(trimmed) {
            Line::Version | Line::Plan | Line::BlockEnd => {}
            Line::Subtest(name) => {
                self.print(level, None, true, name);
                self.open_subtests.push(indent);
            }
            Line::Result { ok, name } => {
                if self.open_subtests.last() == Some(&indent) {
                    self.open_subtests.pop();
                    return;
                }
                if ok {
                    self.passed += 1;
                    self.print(level + 1, Some(Color::Green), false, &format!("✔ {}", name));
                } else {
                    self.failed += 1;
                    self.print(level + 1, Some(Color::Red), false, &format!("✖ {}", name));
                }
            }
            Line::Comment(text) if text.starts_with("failed ") => {}
            Line::Comment(text) => self.print(level + 1, Some(Color::Cyan), false, text),
            Line::BlockStart => self.block = Some((indent, Vec::new())),
            Line::Other(text) => self.print(level + 1, None, false, text),
        }
    }

    fn finish(&mut self) {
        let total = self.passed + self.failed;
        let _ = writeln!(self.out);
        self.print(0, None, true, &format!("total:     {}", total));
        self.print(0, Some(Color::Green), true, &format!("passing:   {}", self.passed));
        if self.failed > 0 {
            self.print(0, Some(Color::Red), true, &format!("failing:   {}", self.failed));
        }
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::NoColor;

    fn render(lines: &[&str]) -> (String, usize, usize) {
        let mut sink = PrettySink::new(NoColor::new(Vec::new()));
        for line in lines {
            sink.emit(line);
        }
        sink.finish();
        let (passed, failed) = (sink.passed(), sink.failed());
        let out = String::from_utf8(sink.into_inner().into_inner()).unwrap_or_default();
        (out, passed, failed)
    }

    #[test]
    fn subtest_results_fold_into_headings() {
        let (out, passed, failed) = render(&[
            "TAP version 13",
            "# Subtest: FOO",
            "    ok 1 - should be equivalent",
            "    1..1",
            "ok 1 - FOO",
            "1..1",
        ]);
        assert_eq!(passed, 1);
        assert_eq!(failed, 0);
        assert!(out.contains("  FOO\n"));
        assert!(out.contains("✔ should be equivalent"));
        assert!(!out.contains("✔ FOO"));
        assert!(out.contains("total:     1"));
    }

    #[test]
    fn failure_blocks_show_stack_lines() {
        let (out, _, failed) = render(&[
            "TAP version 13",
            "# Subtest: FOO",
            "    not ok 1 - foo error",
            "      ---",
            "      found:",
            "        name: Error",
            "        stack: |-",
            "          foo error",
            "            at src/lib.rs:1:1",
            "      ...",
            "    1..1",
            "    # failed 1 test",
            "not ok 1 - FOO",
            "1..1",
            "# failed 1 test",
        ]);
        assert_eq!(failed, 1);
        assert!(out.contains("✖ foo error"));
        assert!(out.contains("at src/lib.rs:1:1"));
        assert!(out.contains("failing:   1"));
        assert!(!out.contains("failed 1 test"));
    }

    #[test]
    fn comparisons_render_as_diff() {
        let (out, _, _) = render(&[
            "not ok 1 - should be equivalent",
            "  ---",
            "  found: 2.0",
            "  wanted: 1.0",
            "  compare: same",
            "  ...",
        ]);
        assert!(out.contains("-1.0"));
        assert!(out.contains("+2.0"));
    }

    #[test]
    fn classifies_result_lines() {
        assert_eq!(
            classify("not ok 3 - broken thing"),
            Line::Result { ok: false, name: "broken thing" }
        );
        assert_eq!(classify("ok 1 - fine"), Line::Result { ok: true, name: "fine" });
        assert_eq!(classify("1..4"), Line::Plan);
        assert_eq!(classify("# Subtest: X"), Line::Subtest("X"));
    }
}
