//! Line-oriented merged artifacts (shell scripts, requirements).
//!
//! A [`ScriptArtifact`] keeps three named sections that are only joined in
//! [`ScriptArtifact::render`]:
//!
//! ```text
//! header   shebang and boilerplate, always first
//! prelude  blocks that must run before anything else (storage setup)
//! body     every other fragment, in merge order
//! ```

/// Number of leading lines of a base script that form its header.
pub const HEADER_LINES: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptArtifact {
    header: Vec<String>,
    prelude: String,
    body: String,
}

impl ScriptArtifact {
    /// Split a base script into header and body. Blank lines inside the header
    /// are dropped.
    pub fn parse(text: &str) -> Self {
        let mut lines = text.split_inclusive('\n');
        let header = lines
            .by_ref()
            .take(HEADER_LINES)
            .map(|line| line.trim_end_matches(['\n', '\r']).to_string())
            .filter(|line| !line.is_empty())
            .collect();
        Self {
            header,
            prelude: String::new(),
            body: lines.collect(),
        }
    }

    /// An artifact without a header (requirements files).
    pub fn headerless(text: &str) -> Self {
        Self {
            body: text.to_string(),
            ..Self::default()
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Splice a block directly after the header, ahead of the body.
    pub fn splice_prelude(&mut self, block: &str) {
        push_block(&mut self.prelude, block);
    }

    pub fn append(&mut self, block: &str) {
        push_block(&mut self.body, block);
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.header {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&self.prelude);
        out.push_str(&self.body);
        out
    }
}

fn push_block(section: &mut String, block: &str) {
    if block.is_empty() {
        return;
    }
    if !section.is_empty() && !section.ends_with('\n') {
        section.push('\n');
    }
    section.push_str(block);
    if !block.ends_with('\n') {
        section.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "#!/bin/bash\n\nset -e\n\necho base\n";

    #[test]
    fn header_is_first_four_lines_without_blanks() {
        let script = ScriptArtifact::parse(BASE);
        assert_eq!(script.header(), ["#!/bin/bash", "set -e"]);
        assert_eq!(script.render(), "#!/bin/bash\nset -e\necho base\n");
    }

    #[test]
    fn prelude_goes_between_header_and_body() {
        let mut script = ScriptArtifact::parse(BASE);
        script.append("echo analytics");
        script.append("echo api\n");
        script.splice_prelude("echo storage\n");
        script.splice_prelude("echo postgres");

        assert_eq!(
            script.render(),
            "#!/bin/bash\nset -e\necho storage\necho postgres\necho base\necho analytics\necho api\n"
        );
    }

    #[test]
    fn append_terminates_unterminated_body() {
        let mut script = ScriptArtifact::headerless("pandas");
        script.append("httpx");
        assert_eq!(script.render(), "pandas\nhttpx\n");
    }

    #[test]
    fn short_script_is_all_header() {
        let script = ScriptArtifact::parse("#!/bin/sh\n");
        assert_eq!(script.render(), "#!/bin/sh\n");
    }

    #[test]
    fn empty_blocks_are_ignored() {
        let mut script = ScriptArtifact::parse(BASE);
        script.append("");
        script.splice_prelude("");
        assert_eq!(script.render(), ScriptArtifact::parse(BASE).render());
    }
}
