// ============================================================
// Layer 4 - Text Preprocessor
// ============================================================
// Normalises text loaded from disk BEFORE it is handed to the
// pipeline. The pipeline itself never rewrites its input, so
// every answer it returns is a substring of the cleaned text.
//
// Cleaning steps:
//   1. Unicode space variants, tabs and stray control
//      characters become plain spaces; \r\n and \r become \n
//   2. Runs of spaces collapse to one; lines are trimmed
//   3. At most one blank line survives between paragraphs
//      (blank lines are paragraph breaks for the segmenter)
//   4. Soft hyphenation at line ends ("exam-\nple") is joined

pub struct Preprocessor {
    /// Re-join words split by a hyphen at the end of a line
    join_hyphenated: bool,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self { join_hyphenated: true }
    }

    pub fn with_hyphen_joining(mut self, enabled: bool) -> Self {
        self.join_hyphenated = enabled;
        self
    }

    pub fn clean(&self, text: &str) -> String {
        let normalised = text.replace("\r\n", "\n").replace('\r', "\n");

        let chars: String = normalised
            .chars()
            .map(|c| match c {
                '\n' => '\n',
                '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_control() || c.is_whitespace() => ' ',
                c => c,
            })
            .collect();

        let lines: Vec<String> = chars
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect();

        let mut out   = String::with_capacity(chars.len());
        let mut blank = 0usize;
        for line in &lines {
            if line.is_empty() {
                blank += 1;
                continue;
            }
            if !out.is_empty() {
                if blank > 0 {
                    out.push_str("\n\n");
                } else if self.join_hyphenated && ends_with_soft_hyphen(&out) {
                    out.pop();
                } else {
                    out.push('\n');
                }
            }
            out.push_str(line);
            blank = 0;
        }

        out
    }
}

fn ends_with_soft_hyphen(text: &str) -> bool {
    let mut rev = text.chars().rev();
    matches!((rev.next(), rev.next()), (Some('-'), Some(c)) if c.is_alphabetic())
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
