//! Outline domain library for comment-prefix headings in plain-text source files.
//! Any language with a line-comment character can carry an org-style outline: a run
//! of comment characters at least `base_level` long opens a heading, the run length
//! encodes the logical level, and everything up to the next heading is the heading's
//! block. The document is the only persisted state; headings, levels, and block
//! regions are derived views recomputed by scanning, which is what keeps the
//! structure consistent under arbitrary live edits.

pub mod core {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Serialize};
    use std::path::PathBuf;
    use uuid::Uuid;

    /* ------------------------------- IDs ------------------------------- */

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct DocumentId(pub Uuid);

    impl DocumentId {
        pub fn new() -> Self {
            Self(Uuid::new_v4())
        }
    }

    /* --------------------------- Comment syntax --------------------------- */

    /// The single character that opens a line comment in the current document.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CommentSyntax(pub char);

    /* ------------------------------ Aggregate ------------------------------ */

    /// Aggregate root: one open text document.
    ///
    /// Lines are the only persisted state. The heading hierarchy is implicit and
    /// recoverable at any time by rescanning; nothing here caches structure.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Document {
        pub id: DocumentId,
        /// Optional filesystem path if the document originates from disk.
        pub path: Option<PathBuf>,
        lines: Vec<String>,
        /// Whether the source text ended with a newline; preserved on round-trip.
        trailing_newline: bool,
        /// Cached comment syntax. Invalidated only by `reset_syntax` (a language
        /// or mode change), never by edits.
        syntax: Option<CommentSyntax>,
    }

    impl Document {
        pub fn from_text(path: Option<PathBuf>, text: &str) -> Self {
            Self {
                id: DocumentId::new(),
                path,
                lines: text.lines().map(|l| l.to_string()).collect(),
                trailing_newline: text.is_empty() || text.ends_with('\n'),
                syntax: None,
            }
        }

        pub fn to_text(&self) -> String {
            let mut out = self.lines.join("\n");
            if self.trailing_newline && !self.lines.is_empty() {
                out.push('\n');
            }
            out
        }

        pub fn line_count(&self) -> usize {
            self.lines.len()
        }

        pub fn line(&self, idx: usize) -> Option<&str> {
            self.lines.get(idx).map(|s| s.as_str())
        }

        pub fn lines(&self) -> impl Iterator<Item = &str> {
            self.lines.iter().map(|s| s.as_str())
        }

        /* Whole-line edits; every structural operation reduces to these. */

        pub fn set_line(&mut self, idx: usize, text: String) -> Result<(), OutlineError> {
            match self.lines.get_mut(idx) {
                Some(slot) => {
                    *slot = text;
                    Ok(())
                }
                None => Err(OutlineError::LineOutOfBounds(idx)),
            }
        }

        pub fn insert_line(&mut self, idx: usize, text: String) -> Result<(), OutlineError> {
            if idx > self.lines.len() {
                return Err(OutlineError::LineOutOfBounds(idx));
            }
            self.lines.insert(idx, text);
            Ok(())
        }

        pub fn remove_line(&mut self, idx: usize) -> Result<String, OutlineError> {
            if idx >= self.lines.len() {
                return Err(OutlineError::LineOutOfBounds(idx));
            }
            Ok(self.lines.remove(idx))
        }

        /* Syntax cache. */

        pub fn comment_syntax(&self) -> Option<CommentSyntax> {
            self.syntax
        }

        pub fn set_comment_syntax(&mut self, syntax: Option<CommentSyntax>) {
            self.syntax = syntax;
        }

        /// Forget the cached comment syntax (language or mode change).
        pub fn reset_syntax(&mut self) {
            self.syntax = None;
        }

        /// The cached syntax, or the error every heading operation fails with
        /// before touching any text.
        pub fn require_syntax(&self) -> Result<CommentSyntax, OutlineError> {
            self.syntax.ok_or(OutlineError::NoCommentSyntax)
        }
    }

    /// A caret position: zero-based line and character column.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Point {
        pub line: usize,
        pub column: usize,
    }

    /* ------------------------------- Config ------------------------------- */

    /// Blank-line insertion policy for new headings.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum BlankLinePolicy {
        Always,
        Never,
        /// Mimic whatever the previous sibling heading at the same level does.
        #[default]
        Auto,
    }

    /// Which documents get block backgrounds painted.
    #[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum BlockFilter {
        #[default]
        AllFiles,
        /// Only documents whose file name appears in the list.
        Files(Vec<String>),
    }

    /// How heading faces are chosen.
    #[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum FaceStyle {
        /// Face name computed per level, cyclic over eight levels.
        #[default]
        ByLevel,
        /// One face for every heading.
        Fixed(String),
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct OutlineConfig {
        /// Minimum comment-run length that qualifies a line as a heading.
        #[serde(default = "OutlineConfig::default_base_level")]
        pub base_level: usize,
        /// Cyclic bullet glyphs indexed by level.
        #[serde(default = "OutlineConfig::default_bullets")]
        pub bullet_glyphs: Vec<char>,
        /// Ordered keyword ring; the empty "no keyword" state is implicit.
        #[serde(default = "OutlineConfig::default_keywords")]
        pub todo_keywords: Vec<String>,
        /// Keyword whose entry records a CLOSED timestamp. `None` means the last
        /// of `todo_keywords`.
        #[serde(default)]
        pub done_keyword: Option<String>,
        #[serde(default)]
        pub blank_line_policy: BlankLinePolicy,
        /// Trailing blank lines retained inside a block region.
        #[serde(default)]
        pub block_padding: usize,
        #[serde(default)]
        pub block_filter: BlockFilter,
        #[serde(default)]
        pub face_style: FaceStyle,
    }

    impl Default for OutlineConfig {
        fn default() -> Self {
            Self {
                base_level: Self::default_base_level(),
                bullet_glyphs: Self::default_bullets(),
                todo_keywords: Self::default_keywords(),
                done_keyword: None,
                blank_line_policy: BlankLinePolicy::default(),
                block_padding: 0,
                block_filter: BlockFilter::default(),
                face_style: FaceStyle::default(),
            }
        }
    }

    impl OutlineConfig {
        fn default_base_level() -> usize {
            3
        }

        fn default_bullets() -> Vec<char> {
            vec!['◉', '○', '✸', '◈']
        }

        fn default_keywords() -> Vec<String> {
            vec!["TODO".to_string(), "DONE".to_string()]
        }

        /* Level model: run length <-> logical level is a bijection on runs of
         * at least `base_level`. */

        pub fn logical_level(&self, run: usize) -> Option<usize> {
            (run >= self.base_level).then(|| run - self.base_level + 1)
        }

        /// Inverse of `logical_level` on the valid domain.
        pub fn run_for_level(&self, level: usize) -> usize {
            debug_assert!(level >= 1);
            self.base_level + level - 1
        }

        pub fn bullet_glyph(&self, level: usize) -> char {
            if self.bullet_glyphs.is_empty() {
                return '*';
            }
            self.bullet_glyphs[(level - 1) % self.bullet_glyphs.len()]
        }

        pub fn display_face(&self, level: usize) -> String {
            match &self.face_style {
                FaceStyle::Fixed(name) => name.clone(),
                FaceStyle::ByLevel => format!("level-{}", 1 + ((level - 1) % 8)),
            }
        }

        /// The keyword whose entry records a CLOSED timestamp.
        pub fn done_keyword(&self) -> Option<&str> {
            match &self.done_keyword {
                Some(k) => Some(k.as_str()),
                None => self.todo_keywords.last().map(|s| s.as_str()),
            }
        }

        pub fn is_keyword(&self, token: &str) -> bool {
            self.todo_keywords.iter().any(|k| k == token)
        }

        /// Whether block backgrounds are enabled for this document.
        pub fn blocks_enabled_for(&self, doc: &Document) -> bool {
            match &self.block_filter {
                BlockFilter::AllFiles => true,
                BlockFilter::Files(names) => doc
                    .path
                    .as_deref()
                    .and_then(|p| p.file_name())
                    .and_then(|n| n.to_str())
                    .map(|n| names.iter().any(|f| f == n))
                    .unwrap_or(false),
            }
        }
    }

    /* ---------------------------- Derived views ---------------------------- */

    /// One heading recognized in the document. A derived view: recomputed by
    /// scanning, never stored or mutated in place.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct HeadingLine {
        /// Zero-based line index.
        pub line: usize,
        /// Characters of leading horizontal whitespace.
        pub indent: usize,
        /// Comment-run length; always `>= base_level` for a scanned heading.
        pub run: usize,
        /// 1-based logical level, `run - base_level + 1`.
        pub level: usize,
        /// Keyword token, present only when it belongs to the configured set.
        pub keyword: Option<String>,
        pub title: String,
        /// Timestamp from a CLOSED line directly below, if any.
        pub closed: Option<NaiveDateTime>,
    }

    /// The body span owned by a heading, inclusive on both ends.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BlockRegion {
        pub start: usize,
        pub end: usize,
    }

    impl BlockRegion {
        pub fn contains(&self, line: usize) -> bool {
            self.start <= line && line <= self.end
        }
    }

    /* --------------------------- Errors (domain) --------------------------- */

    #[derive(Debug, thiserror::Error)]
    pub enum OutlineError {
        #[error("no comment syntax is known for this document")]
        NoCommentSyntax,
        #[error("line {0} is out of bounds")]
        LineOutOfBounds(usize),
        #[error("unknown document id")]
        UnknownDocument,
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn level_run_bijection() {
            let cfg = OutlineConfig::default();
            for run in cfg.base_level..cfg.base_level + 6 {
                let level = cfg.logical_level(run).expect("run at or above base");
                assert!(level >= 1);
                assert_eq!(cfg.run_for_level(level), run);
            }
            assert_eq!(cfg.logical_level(cfg.base_level - 1), None);
        }

        #[test]
        fn faces_cycle_over_eight_levels() {
            let cfg = OutlineConfig::default();
            assert_eq!(cfg.display_face(1), "level-1");
            assert_eq!(cfg.display_face(8), "level-8");
            assert_eq!(cfg.display_face(9), "level-1");

            let fixed = OutlineConfig {
                face_style: FaceStyle::Fixed("heading".into()),
                ..OutlineConfig::default()
            };
            assert_eq!(fixed.display_face(5), "heading");
        }

        #[test]
        fn done_keyword_defaults_to_last_configured() {
            let cfg = OutlineConfig::default();
            assert_eq!(cfg.done_keyword(), Some("DONE"));

            let explicit = OutlineConfig {
                done_keyword: Some("SHIPPED".into()),
                ..OutlineConfig::default()
            };
            assert_eq!(explicit.done_keyword(), Some("SHIPPED"));
        }

        #[test]
        fn text_round_trip_preserves_trailing_newline() {
            assert_eq!(Document::from_text(None, "a\nb\n").to_text(), "a\nb\n");
            assert_eq!(Document::from_text(None, "a\nb").to_text(), "a\nb");
        }
    }
}

pub mod syntax {
    //! Comment syntax detection.
    //!
    //! A document's outline syntax is one character. It comes from the language's
    //! declared comment-start token when there is one, otherwise from scanning the
    //! language's syntax table for a character classified as a comment starter.
    //! Plain text has neither; every downstream heading operation then refuses to
    //! run rather than match nothing.

    use super::core::{CommentSyntax, Document};
    use serde::{Deserialize, Serialize};
    use std::path::Path;

    /// Classification of a character in a language's syntax table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum CharClass {
        CommentStart,
        Punctuation,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SyntaxEntry {
        pub ch: char,
        pub class: CharClass,
    }

    /// What the host knows about the document's language.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LanguageHint {
        /// Declared comment-start token, e.g. `"// "` or `"#"`.
        pub comment_start: Option<String>,
        /// Syntax-table fallback when no comment-start token is declared.
        #[serde(default)]
        pub table: Vec<SyntaxEntry>,
    }

    impl LanguageHint {
        pub fn from_comment_start(token: &str) -> Self {
            Self {
                comment_start: Some(token.to_string()),
                table: vec![],
            }
        }

        /// Built-in extension table for file-based use. Unknown extensions get an
        /// empty hint, which `detect` resolves to `None`.
        pub fn for_path(path: &Path) -> Self {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            let token = match ext {
                "rs" | "c" | "h" | "cc" | "cpp" | "hpp" | "go" | "java" | "js" | "jsx" | "ts"
                | "tsx" | "swift" | "kt" | "scala" | "zig" | "cs" => Some("//"),
                "py" | "rb" | "sh" | "bash" | "zsh" | "pl" | "yml" | "yaml" | "toml" | "nix"
                | "mk" | "cmake" | "r" | "jl" => Some("#"),
                "el" | "lisp" | "clj" | "scm" | "rkt" => Some(";"),
                "lua" | "sql" | "hs" | "elm" => Some("--"),
                "tex" | "sty" | "bib" => Some("%"),
                "vim" => Some("\""),
                _ => None,
            };
            match token {
                Some(t) => Self::from_comment_start(t),
                None => Self::default(),
            }
        }
    }

    /// Resolve the comment-start character for a language, if any.
    pub fn detect(hint: &LanguageHint) -> Option<CommentSyntax> {
        if let Some(token) = &hint.comment_start {
            if let Some(ch) = token.trim().chars().next() {
                return Some(CommentSyntax(ch));
            }
        }
        hint.table
            .iter()
            .find(|e| e.class == CharClass::CommentStart)
            .map(|e| CommentSyntax(e.ch))
    }

    /// Detect and cache the document's comment syntax in one step.
    pub fn resolve(doc: &mut Document, hint: &LanguageHint) -> Option<CommentSyntax> {
        let found = detect(hint);
        doc.set_comment_syntax(found);
        found
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn declared_token_wins_over_table() {
            let hint = LanguageHint {
                comment_start: Some("// ".into()),
                table: vec![SyntaxEntry {
                    ch: '#',
                    class: CharClass::CommentStart,
                }],
            };
            assert_eq!(detect(&hint), Some(CommentSyntax('/')));
        }

        #[test]
        fn falls_back_to_syntax_table() {
            let hint = LanguageHint {
                comment_start: None,
                table: vec![
                    SyntaxEntry {
                        ch: '(',
                        class: CharClass::Punctuation,
                    },
                    SyntaxEntry {
                        ch: ';',
                        class: CharClass::CommentStart,
                    },
                ],
            };
            assert_eq!(detect(&hint), Some(CommentSyntax(';')));
        }

        #[test]
        fn plain_text_has_no_syntax() {
            assert_eq!(detect(&LanguageHint::default()), None);
            assert_eq!(
                detect(&LanguageHint::for_path(Path::new("notes.txt"))),
                None
            );
        }

        #[test]
        fn extension_table_covers_common_languages() {
            let rs = LanguageHint::for_path(Path::new("src/main.rs"));
            assert_eq!(detect(&rs), Some(CommentSyntax('/')));
            let py = LanguageHint::for_path(Path::new("tool.py"));
            assert_eq!(detect(&py), Some(CommentSyntax('#')));
        }
    }
}

pub mod scanner {
    //! Line-oriented document scanner built on `nom`.
    //!
    //! Heading recognition is prefix-driven: indentation, a run of the document's
    //! comment character, then a space (or the end of the line), an optional
    //! configured keyword, and the title. Scanning is a single top-to-bottom pass
    //! over whole lines; there are no runtime-built regular expressions, so a
    //! comment character like `*` needs no quoting anywhere. The scanner never
    //! mutates the document, and its output is a snapshot that goes stale on the
    //! next edit.

    use super::core::{CommentSyntax, Document, HeadingLine, OutlineConfig, OutlineError};
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use nom::{
        IResult,
        branch::alt,
        bytes::complete::{tag, take_while, take_while1},
        character::complete::{char, space0, space1},
        combinator::{eof, map_res, opt},
        error::{VerboseError, VerboseErrorKind},
        multi::many1_count,
        sequence::{preceded, tuple},
    };

    type PResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

    /* --------------------------- Line predicates --------------------------- */

    /// Characters of leading horizontal whitespace.
    pub fn indent_width(line: &str) -> usize {
        line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
    }

    /// Length of the maximal comment-character run after indentation, or `None`
    /// when the line does not start with the comment character.
    pub fn comment_run_length(line: &str, syntax: CommentSyntax) -> Option<usize> {
        let rest = line.trim_start_matches([' ', '\t']);
        let n = rest.chars().take_while(|c| *c == syntax.0).count();
        (n > 0).then_some(n)
    }

    pub fn is_blank(line: &str) -> bool {
        line.trim().is_empty()
    }

    /// A heading is a comment run of at least `base_level`, followed by a space
    /// or the end of the line. A run glued to other text (`////x`) is an
    /// ordinary comment.
    pub fn is_heading_line(line: &str, syntax: CommentSyntax, cfg: &OutlineConfig) -> bool {
        parse_heading_line(line, syntax, cfg).is_some_and(|raw| raw.run >= cfg.base_level)
    }

    /* ----------------------------- Headlines ----------------------------- */

    /// Headline parts before level interpretation. The run may still be shorter
    /// than `base_level`; the caller decides what qualifies.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RawHeadline {
        pub indent: usize,
        pub run: usize,
        pub keyword: Option<String>,
        pub title: String,
    }

    /// Parse one line as a headline, or `None` when it is not heading-shaped.
    pub fn parse_heading_line(
        line: &str,
        syntax: CommentSyntax,
        cfg: &OutlineConfig,
    ) -> Option<RawHeadline> {
        match headline(line, syntax.0, cfg) {
            Ok((_, raw)) => Some(raw),
            Err(_) => None,
        }
    }

    fn headline<'a>(line: &'a str, comment: char, cfg: &OutlineConfig) -> PResult<'a, RawHeadline> {
        let (i, ws) = space0::<_, VerboseError<&str>>(line)?;
        let (i, run) = many1_count(char(comment))(i)?;
        let (i, _) = alt((space1, eof))(i)?;
        let (rest, keyword) = opt(|i| keyword_token(i, cfg))(i)?;
        Ok((
            "",
            RawHeadline {
                indent: ws.chars().count(),
                run,
                keyword,
                title: rest.trim().to_string(),
            },
        ))
    }

    /// The first run of uppercase letters after the comment run, accepted only
    /// when it stands alone and belongs to the configured keyword set; anything
    /// else stays part of the title.
    fn keyword_token<'a>(i: &'a str, cfg: &OutlineConfig) -> PResult<'a, String> {
        let (rest, token) = take_while1(|c: char| c.is_ascii_uppercase())(i)?;
        let standalone = rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t');
        if !standalone || !cfg.is_keyword(token) {
            return Err(nom::Err::Error(VerboseError {
                errors: vec![(i, VerboseErrorKind::Context("keyword"))],
            }));
        }
        let (rest, _) = space0::<_, VerboseError<&str>>(rest)?;
        Ok((rest, token.to_string()))
    }

    /* ---------------------------- CLOSED lines ---------------------------- */

    /// `CLOSED: [2026-08-04 Tue 14:30]` under an exact two-comment-character
    /// prefix.
    pub fn parse_closed_line(line: &str, syntax: CommentSyntax) -> Option<NaiveDateTime> {
        match closed_line(line, syntax.0) {
            Ok((_, ts)) => Some(ts),
            Err(_) => None,
        }
    }

    pub fn is_closed_line(line: &str, syntax: CommentSyntax) -> bool {
        parse_closed_line(line, syntax).is_some()
    }

    fn closed_line(line: &str, comment: char) -> PResult<'_, NaiveDateTime> {
        let (i, _) = space0::<_, VerboseError<&str>>(line)?;
        let (i, _) = char(comment)(i)?;
        let (i, _) = char(comment)(i)?;
        let (i, _) = space1(i)?;
        let (i, _) = tag("CLOSED:")(i)?;
        let (i, _) = space1(i)?;
        let (i, _) = char('[')(i)?;
        let (i, date) = parse_date(i)?;
        let (i, _) = preceded(space1, take_while1(|c: char| c.is_alphabetic()))(i)?;
        let (i, time) = preceded(space1, parse_time)(i)?;
        let (i, _) = char(']')(i)?;
        Ok((i, date.and_time(time)))
    }

    fn parse_date(i: &str) -> PResult<'_, NaiveDate> {
        map_res(
            tuple((
                map_res(digits(4), |s: &str| s.parse::<i32>()),
                char('-'),
                map_res(digits(2), |s: &str| s.parse::<u32>()),
                char('-'),
                map_res(digits(2), |s: &str| s.parse::<u32>()),
            )),
            |(y, _, m, _, d)| NaiveDate::from_ymd_opt(y, m, d).ok_or("invalid date"),
        )(i)
    }

    fn parse_time(i: &str) -> PResult<'_, NaiveTime> {
        map_res(
            tuple((
                map_res(take_while1(|c: char| c.is_ascii_digit()), |s: &str| {
                    s.parse::<u32>()
                }),
                char(':'),
                map_res(digits(2), |s: &str| s.parse::<u32>()),
            )),
            |(h, _, m)| NaiveTime::from_hms_opt(h, m, 0).ok_or("invalid time"),
        )(i)
    }

    fn digits(n: usize) -> impl Fn(&str) -> PResult<'_, &str> {
        move |i: &str| {
            let (rest, out) = take_while(|c: char| c.is_ascii_digit())(i)?;
            if out.len() != n {
                return Err(nom::Err::Error(VerboseError {
                    errors: vec![(i, VerboseErrorKind::Context("digits"))],
                }));
            }
            Ok((rest, out))
        }
    }

    /* ------------------------------ Scanning ------------------------------ */

    /// Lazy, restartable pass over the document's heading lines.
    pub struct Headings<'a> {
        doc: &'a Document,
        cfg: &'a OutlineConfig,
        syntax: CommentSyntax,
        next: usize,
    }

    impl Iterator for Headings<'_> {
        type Item = HeadingLine;

        fn next(&mut self) -> Option<HeadingLine> {
            while self.next < self.doc.line_count() {
                let idx = self.next;
                self.next += 1;
                let line = self.doc.line(idx)?;
                let Some(raw) = parse_heading_line(line, self.syntax, self.cfg) else {
                    continue;
                };
                let Some(level) = self.cfg.logical_level(raw.run) else {
                    continue;
                };
                let closed = self
                    .doc
                    .line(idx + 1)
                    .and_then(|next_line| parse_closed_line(next_line, self.syntax));
                return Some(HeadingLine {
                    line: idx,
                    indent: raw.indent,
                    run: raw.run,
                    level,
                    keyword: raw.keyword,
                    title: raw.title,
                    closed,
                });
            }
            None
        }
    }

    /// Start a scan. Fails fast when the document has no comment syntax.
    pub fn scan<'a>(
        doc: &'a Document,
        cfg: &'a OutlineConfig,
    ) -> Result<Headings<'a>, OutlineError> {
        let syntax = doc.require_syntax()?;
        Ok(Headings {
            doc,
            cfg,
            syntax,
            next: 0,
        })
    }

    /// Collect the full outline snapshot.
    pub fn outline(doc: &Document, cfg: &OutlineConfig) -> Result<Vec<HeadingLine>, OutlineError> {
        Ok(scan(doc, cfg)?.collect())
    }

    /// Logical level of a single line, without a full scan.
    pub fn current_level(
        doc: &Document,
        cfg: &OutlineConfig,
        line: usize,
    ) -> Result<Option<usize>, OutlineError> {
        let syntax = doc.require_syntax()?;
        let Some(text) = doc.line(line) else {
            return Ok(None);
        };
        Ok(parse_heading_line(text, syntax, cfg).and_then(|raw| cfg.logical_level(raw.run)))
    }

    /// The heading on `line`, if that line is one.
    pub fn heading_at(
        doc: &Document,
        cfg: &OutlineConfig,
        line: usize,
    ) -> Result<Option<HeadingLine>, OutlineError> {
        let syntax = doc.require_syntax()?;
        let Some(text) = doc.line(line) else {
            return Ok(None);
        };
        let Some(raw) = parse_heading_line(text, syntax, cfg) else {
            return Ok(None);
        };
        let Some(level) = cfg.logical_level(raw.run) else {
            return Ok(None);
        };
        let closed = doc
            .line(line + 1)
            .and_then(|l| parse_closed_line(l, syntax));
        Ok(Some(HeadingLine {
            line,
            indent: raw.indent,
            run: raw.run,
            level,
            keyword: raw.keyword,
            title: raw.title,
            closed,
        }))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        fn doc(lines: &[&str]) -> Document {
            let mut d = Document::from_text(None, &lines.join("\n"));
            d.set_comment_syntax(Some(CommentSyntax('/')));
            d
        }

        #[test]
        fn scans_levels_and_titles() {
            let cfg = OutlineConfig::default();
            let d = doc(&["/// Title", "content", "//// Sub", "more"]);
            let outline = outline(&d, &cfg).expect("scan");
            assert_eq!(outline.len(), 2);
            assert_eq!((outline[0].line, outline[0].level), (0, 1));
            assert_eq!(outline[0].title, "Title");
            assert_eq!((outline[1].line, outline[1].level), (2, 2));
            assert_eq!(outline[1].title, "Sub");
        }

        #[test]
        fn keyword_must_belong_to_the_configured_set() {
            let cfg = OutlineConfig::default();
            let d = doc(&["/// TODO Ship it", "/// URGENT Ship it"]);
            let outline = outline(&d, &cfg).expect("scan");
            assert_eq!(outline[0].keyword.as_deref(), Some("TODO"));
            assert_eq!(outline[0].title, "Ship it");
            assert_eq!(outline[1].keyword, None);
            assert_eq!(outline[1].title, "URGENT Ship it");
        }

        #[test]
        fn short_runs_and_glued_runs_are_not_headings() {
            let cfg = OutlineConfig::default();
            let d = doc(&["// plain comment", "////x glued", "///"]);
            let outline = outline(&d, &cfg).expect("scan");
            assert_eq!(outline.len(), 1);
            assert_eq!(outline[0].line, 2);
            assert_eq!(outline[0].title, "");
        }

        #[test]
        fn closed_line_is_attached_to_the_heading_above() {
            let cfg = OutlineConfig::default();
            let d = doc(&["/// DONE Ship it", "  // CLOSED: [2026-08-04 Tue 14:30]"]);
            let outline = outline(&d, &cfg).expect("scan");
            assert_eq!(outline.len(), 1);
            let expected = NaiveDate::from_ymd_opt(2026, 8, 4)
                .and_then(|d| d.and_hms_opt(14, 30, 0))
                .expect("valid timestamp");
            assert_eq!(outline[0].closed, Some(expected));
        }

        #[test]
        fn closed_prefix_must_be_exactly_two_comment_chars() {
            let syntax = CommentSyntax('/');
            assert!(is_closed_line("  // CLOSED: [2026-08-04 Tue 14:30]", syntax));
            assert!(!is_closed_line("  /// CLOSED: [2026-08-04 Tue 14:30]", syntax));
            assert!(!is_closed_line("  // CLOSED [2026-08-04 Tue 14:30]", syntax));
        }

        #[test]
        fn scan_is_restartable() {
            let cfg = OutlineConfig::default();
            let d = doc(&["/// A", "/// B"]);
            let first: Vec<_> = scan(&d, &cfg).expect("scan").collect();
            let second: Vec<_> = scan(&d, &cfg).expect("scan").collect();
            assert_eq!(first, second);
        }

        #[test]
        fn current_level_matches_scan() {
            let cfg = OutlineConfig::default();
            let d = doc(&["/// A", "body", "//// B"]);
            assert_eq!(current_level(&d, &cfg, 0).expect("level"), Some(1));
            assert_eq!(current_level(&d, &cfg, 1).expect("level"), None);
            assert_eq!(current_level(&d, &cfg, 2).expect("level"), Some(2));
        }

        #[test]
        fn scan_without_syntax_fails_fast() {
            let cfg = OutlineConfig::default();
            let d = Document::from_text(None, "/// A\n");
            assert!(matches!(
                outline(&d, &cfg),
                Err(OutlineError::NoCommentSyntax)
            ));
        }
    }
}

pub mod regions {
    //! Block regions: the body lines each heading owns.

    use super::core::{BlockRegion, Document, OutlineConfig, OutlineError};
    use super::scanner;

    /// Compute every heading's block region, in document order.
    ///
    /// A block boundary is the next heading of any level. The region starts
    /// after the heading (skipping its CLOSED line), ends at the last content
    /// line plus up to `block_padding` retained blank lines, and is omitted
    /// entirely when nothing falls in between. Recomputed in full from document
    /// state on every call.
    pub fn compute_regions(
        doc: &Document,
        cfg: &OutlineConfig,
    ) -> Result<Vec<BlockRegion>, OutlineError> {
        let syntax = doc.require_syntax()?;
        let heads: Vec<usize> = scanner::scan(doc, cfg)?.map(|h| h.line).collect();
        let mut out = Vec::with_capacity(heads.len());
        for (i, &h) in heads.iter().enumerate() {
            let next = heads.get(i + 1).copied().unwrap_or(doc.line_count());
            let mut start = h + 1;
            if start < next
                && doc
                    .line(start)
                    .is_some_and(|l| scanner::is_closed_line(l, syntax))
            {
                start += 1;
            }
            let last_content = (start..next)
                .rev()
                .find(|&l| doc.line(l).is_some_and(|t| !scanner::is_blank(t)));
            // With no content at all, padding may still retain leading blanks.
            let base = match last_content {
                Some(l) => l as i64,
                None => start as i64 - 1,
            };
            let end = (base + cfg.block_padding as i64).min(next as i64 - 1);
            if (start as i64) <= end {
                out.push(BlockRegion {
                    start,
                    end: end as usize,
                });
            }
        }
        Ok(out)
    }

    /// The region containing `line`; regions are disjoint, so the first match is
    /// the only one.
    pub fn region_containing(regions: &[BlockRegion], line: usize) -> Option<&BlockRegion> {
        regions.iter().find(|r| r.contains(line))
    }

}

pub mod edit {
    //! Structural edits. Every operation is a sequence of whole-line edits that
    //! leaves the document immediately re-scannable; precondition failures skip
    //! without touching any text.

    use super::core::{
        BlankLinePolicy, CommentSyntax, Document, OutlineConfig, OutlineError, Point,
    };
    use super::scanner;
    use chrono::NaiveDateTime;

    /// What an interactive edit did. `Skipped` carries the user-facing message.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum EditOutcome {
        Edited,
        Skipped(&'static str),
    }

    /// Insertion commands land the caret somewhere new; skips carry a message.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum InsertOutcome {
        Inserted(Point),
        Skipped(&'static str),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum CycleDirection {
        Forward,
        Backward,
    }

    /* ----------------------------- Level edits ----------------------------- */

    /// Remove `n` comment characters, clamped so the run never drops below
    /// `base_level`.
    pub fn promote(
        doc: &mut Document,
        cfg: &OutlineConfig,
        line: usize,
        n: usize,
    ) -> Result<EditOutcome, OutlineError> {
        shift_run(doc, cfg, line, Shift::Promote(n))
    }

    /// Add `n` comment characters, one level deeper each.
    pub fn demote(
        doc: &mut Document,
        cfg: &OutlineConfig,
        line: usize,
        n: usize,
    ) -> Result<EditOutcome, OutlineError> {
        shift_run(doc, cfg, line, Shift::Demote(n))
    }

    #[derive(Debug, Clone, Copy)]
    enum Shift {
        Promote(usize),
        Demote(usize),
    }

    fn shift_run(
        doc: &mut Document,
        cfg: &OutlineConfig,
        line: usize,
        shift: Shift,
    ) -> Result<EditOutcome, OutlineError> {
        let syntax = doc.require_syntax()?;
        let text = doc
            .line(line)
            .ok_or(OutlineError::LineOutOfBounds(line))?;
        let Some(raw) = scanner::parse_heading_line(text, syntax, cfg) else {
            return Ok(EditOutcome::Skipped("point is not on a heading"));
        };
        if raw.run < cfg.base_level {
            return Ok(EditOutcome::Skipped("point is not on a heading"));
        }
        let new_run = match shift {
            Shift::Promote(n) => raw.run.saturating_sub(n).max(cfg.base_level),
            Shift::Demote(n) => raw.run + n,
        };
        if new_run == raw.run {
            let message = match shift {
                Shift::Promote(_) => "cannot promote further",
                Shift::Demote(_) => "nothing to demote",
            };
            return Ok(EditOutcome::Skipped(message));
        }
        // Rebuild the prefix in place; indentation and everything after the run
        // are untouched.
        let mut rebuilt = String::new();
        rebuilt.extend(text.chars().take(raw.indent));
        for _ in 0..new_run {
            rebuilt.push(syntax.0);
        }
        rebuilt.extend(text.chars().skip(raw.indent + raw.run));
        doc.set_line(line, rebuilt)?;
        Ok(EditOutcome::Edited)
    }

    /* ------------------------------ Insertion ------------------------------ */

    fn heading_prefix(syntax: CommentSyntax, cfg: &OutlineConfig, level: usize) -> String {
        let mut s = String::new();
        for _ in 0..cfg.run_for_level(level) {
            s.push(syntax.0);
        }
        s.push(' ');
        s
    }

    /// Insert a heading of `level` at or after `point`. With `respect_content`
    /// the heading lands past the end of the current subtree; otherwise text
    /// after the caret is split onto the new heading line. Returns the caret
    /// position on the new line.
    pub fn insert_heading(
        doc: &mut Document,
        cfg: &OutlineConfig,
        point: Point,
        level: usize,
        respect_content: bool,
    ) -> Result<Point, OutlineError> {
        let syntax = doc.require_syntax()?;
        let prefix = heading_prefix(syntax, cfg, level);
        let caret_col = prefix.chars().count();

        if doc.line_count() == 0 {
            doc.insert_line(0, prefix)?;
            return Ok(Point {
                line: 0,
                column: caret_col,
            });
        }
        if point.line >= doc.line_count() {
            return Err(OutlineError::LineOutOfBounds(point.line));
        }

        if respect_content {
            // Skip the current subtree: everything below that is not a heading
            // at `level` or shallower still belongs to it.
            let mut at = point.line + 1;
            while at < doc.line_count() {
                let lvl = doc
                    .line(at)
                    .and_then(|l| scanner::parse_heading_line(l, syntax, cfg))
                    .and_then(|raw| cfg.logical_level(raw.run));
                match lvl {
                    Some(l) if l <= level => break,
                    _ => at += 1,
                }
            }
            let at = apply_blank_policy(doc, cfg, syntax, level, at)?;
            doc.insert_line(at, prefix)?;
            return Ok(Point {
                line: at,
                column: caret_col,
            });
        }

        // Split the current line: text after the caret becomes the new title.
        let (left, right) = {
            let text = doc
                .line(point.line)
                .ok_or(OutlineError::LineOutOfBounds(point.line))?;
            let col = point.column.min(text.chars().count());
            let byte = text
                .char_indices()
                .nth(col)
                .map(|(b, _)| b)
                .unwrap_or(text.len());
            (
                text[..byte].trim_end().to_string(),
                text[byte..].trim_start().to_string(),
            )
        };
        let at = if right.is_empty() {
            apply_blank_policy(doc, cfg, syntax, level, point.line + 1)?
        } else {
            doc.set_line(point.line, left)?;
            point.line + 1
        };
        doc.insert_line(at, format!("{prefix}{right}"))?;
        Ok(Point {
            line: at,
            column: caret_col,
        })
    }

    /// Insert a heading one level deeper directly below the heading at `point`.
    pub fn insert_subheading(
        doc: &mut Document,
        cfg: &OutlineConfig,
        point: Point,
    ) -> Result<InsertOutcome, OutlineError> {
        let syntax = doc.require_syntax()?;
        let Some(h) = scanner::heading_at(doc, cfg, point.line)? else {
            return Ok(InsertOutcome::Skipped("point is not on a heading"));
        };
        let prefix = heading_prefix(syntax, cfg, h.level + 1);
        let caret_col = prefix.chars().count();
        // Land below the CLOSED line when one is attached.
        let mut at = point.line + 1;
        if doc
            .line(at)
            .is_some_and(|l| scanner::is_closed_line(l, syntax))
        {
            at += 1;
        }
        doc.insert_line(at, prefix)?;
        Ok(InsertOutcome::Inserted(Point {
            line: at,
            column: caret_col,
        }))
    }

    /// Apply the blank-line policy before inserting a heading at `at`; returns
    /// the adjusted insertion index.
    fn apply_blank_policy(
        doc: &mut Document,
        cfg: &OutlineConfig,
        syntax: CommentSyntax,
        level: usize,
        at: usize,
    ) -> Result<usize, OutlineError> {
        let preceded_by_content = at > 0
            && doc
                .line(at - 1)
                .is_some_and(|l| !scanner::is_blank(l));
        if !preceded_by_content {
            return Ok(at);
        }
        let want_blank = match cfg.blank_line_policy {
            BlankLinePolicy::Always => true,
            BlankLinePolicy::Never => false,
            BlankLinePolicy::Auto => sibling_has_blank_before(doc, cfg, syntax, level, at),
        };
        if want_blank {
            doc.insert_line(at, String::new())?;
            Ok(at + 1)
        } else {
            Ok(at)
        }
    }

    /// Whether the nearest heading at `level` above the insertion point is
    /// itself preceded by a blank line.
    fn sibling_has_blank_before(
        doc: &Document,
        cfg: &OutlineConfig,
        syntax: CommentSyntax,
        level: usize,
        at: usize,
    ) -> bool {
        let mut l = at.min(doc.line_count());
        while l > 0 {
            l -= 1;
            let lvl = doc
                .line(l)
                .and_then(|t| scanner::parse_heading_line(t, syntax, cfg))
                .and_then(|raw| cfg.logical_level(raw.run));
            if lvl == Some(level) {
                return l > 0 && doc.line(l - 1).is_some_and(scanner::is_blank);
            }
        }
        false
    }

    /* ----------------------------- TODO cycling ----------------------------- */

    /// Move the heading's keyword one step around the ring `["", kw1, …, kwk]`.
    ///
    /// Entering the done keyword records a CLOSED timestamp line below the
    /// heading; leaving it removes that line. At most one CLOSED line exists at
    /// a time.
    pub fn cycle_todo(
        doc: &mut Document,
        cfg: &OutlineConfig,
        line: usize,
        direction: CycleDirection,
        now: NaiveDateTime,
    ) -> Result<EditOutcome, OutlineError> {
        let syntax = doc.require_syntax()?;
        let Some(h) = scanner::heading_at(doc, cfg, line)? else {
            return Ok(EditOutcome::Skipped("point is not on a heading"));
        };
        let ring_len = cfg.todo_keywords.len() + 1;
        if ring_len == 1 {
            return Ok(EditOutcome::Skipped("no keywords configured"));
        }
        let current = match &h.keyword {
            None => 0,
            Some(k) => cfg
                .todo_keywords
                .iter()
                .position(|x| x == k)
                .map(|i| i + 1)
                .unwrap_or(0),
        };
        let next = match direction {
            CycleDirection::Forward => (current + 1) % ring_len,
            CycleDirection::Backward => (current + ring_len - 1) % ring_len,
        };
        let next_kw: Option<&str> = if next == 0 {
            None
        } else {
            Some(cfg.todo_keywords[next - 1].as_str())
        };

        let rebuilt = {
            let text = doc
                .line(line)
                .ok_or(OutlineError::LineOutOfBounds(line))?;
            let mut s = String::new();
            s.extend(text.chars().take(h.indent + h.run));
            s.push(' ');
            if let Some(kw) = next_kw {
                s.push_str(kw);
                if !h.title.is_empty() {
                    s.push(' ');
                }
            }
            s.push_str(&h.title);
            s.trim_end().to_string()
        };
        doc.set_line(line, rebuilt)?;

        let was_done = h.keyword.is_some() && h.keyword.as_deref() == cfg.done_keyword();
        let is_done = next_kw.is_some() && next_kw == cfg.done_keyword();
        let closed_at = line + 1;
        let has_closed = doc
            .line(closed_at)
            .is_some_and(|l| scanner::is_closed_line(l, syntax));
        if is_done {
            if has_closed {
                doc.remove_line(closed_at)?;
            }
            doc.insert_line(closed_at, closed_line_text(syntax, now))?;
        } else if was_done && has_closed {
            doc.remove_line(closed_at)?;
        }
        Ok(EditOutcome::Edited)
    }

    /// Fixed CLOSED line shape: two-space indent, two comment characters,
    /// `CLOSED: [YYYY-MM-DD Day HH:MM]`.
    pub fn closed_line_text(syntax: CommentSyntax, ts: NaiveDateTime) -> String {
        format!(
            "  {c}{c} CLOSED: [{}]",
            ts.format("%Y-%m-%d %a %H:%M"),
            c = syntax.0
        )
    }

}

pub mod fold {
    //! Local and global visibility cycling.
    //!
    //! Neither machine stores per-heading state. The only memory is which cycle
    //! phase the previous command left behind; every other command clears it, so
    //! the next cycle starts from what is actually visible.

    use super::core::{Document, HeadingLine, OutlineConfig, OutlineError};
    use super::render::RenderSurface;
    use super::scanner;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LocalFold {
        Folded,
        Children,
        Subtree,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum GlobalFold {
        Overview,
        Contents,
        All,
    }

    /// What the previous command left behind. This is the machines' entire
    /// memory; nothing is stored per heading.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum CommandMemory {
        #[default]
        None,
        LocalCycle {
            line: usize,
            phase: LocalFold,
        },
        GlobalCycle(GlobalFold),
    }

    impl CommandMemory {
        pub fn clear(&mut self) {
            *self = CommandMemory::None;
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FoldOutcome {
        Cycled(LocalFold),
        CycledAll(GlobalFold),
        /// Heading has no body to fold; shown as-is.
        Empty,
        NotOnHeading,
    }

    /* -------------------------- Structural queries -------------------------- */

    /// First line past the subtree rooted at `outline[idx]`: the next heading at
    /// the same or a shallower level, or the end of the document.
    pub fn subtree_end(outline: &[HeadingLine], idx: usize, line_count: usize) -> usize {
        let level = outline[idx].level;
        outline[idx + 1..]
            .iter()
            .find(|h| h.level <= level)
            .map(|h| h.line)
            .unwrap_or(line_count)
    }

    /* ----------------------------- Local cycle ----------------------------- */

    /// Cycle the heading at `line`: folded, direct children, full subtree. A
    /// childless heading toggles between folded and shown instead.
    pub fn cycle(
        doc: &Document,
        cfg: &OutlineConfig,
        line: usize,
        memory: &mut CommandMemory,
        surface: &mut dyn RenderSurface,
    ) -> Result<FoldOutcome, OutlineError> {
        let outline = scanner::outline(doc, cfg)?;
        let Some(idx) = outline.iter().position(|h| h.line == line) else {
            memory.clear();
            return Ok(FoldOutcome::NotOnHeading);
        };
        let end = subtree_end(&outline, idx, doc.line_count());
        if line + 1 >= end {
            memory.clear();
            return Ok(FoldOutcome::Empty);
        }
        let inner: Vec<&HeadingLine> = outline[idx + 1..]
            .iter()
            .take_while(|h| h.line < end)
            .collect();
        let has_children = !inner.is_empty();
        // Collapsed means the whole subtree body is hidden; a partially
        // revealed subtree collapses on a fresh invocation.
        let folded_now = (line + 1..end).all(|l| !surface.is_line_visible(l));

        let remembered = match *memory {
            CommandMemory::LocalCycle { line: l, phase } if l == line => Some(phase),
            _ => None,
        };

        let phase = match (remembered, has_children) {
            // Same command again: walk the three-state ring.
            (Some(LocalFold::Children), true) => {
                surface.show_lines(line + 1..end);
                LocalFold::Subtree
            }
            (Some(LocalFold::Subtree), _) => {
                surface.hide_lines(line + 1..end);
                LocalFold::Folded
            }
            // Fresh invocation (or remembered fold): toggle on what is visible.
            _ if folded_now && has_children => {
                reveal_children(&inner, line, end, surface);
                LocalFold::Children
            }
            _ if folded_now => {
                surface.show_lines(line + 1..end);
                LocalFold::Subtree
            }
            _ => {
                surface.hide_lines(line + 1..end);
                LocalFold::Folded
            }
        };
        *memory = CommandMemory::LocalCycle { line, phase };
        Ok(FoldOutcome::Cycled(phase))
    }

    /// Reveal only the shallowest headings inside the subtree, bodies folded.
    fn reveal_children(
        inner: &[&HeadingLine],
        line: usize,
        end: usize,
        surface: &mut dyn RenderSurface,
    ) {
        surface.hide_lines(line + 1..end);
        let Some(child_level) = inner.iter().map(|h| h.level).min() else {
            return;
        };
        for h in inner.iter().filter(|h| h.level == child_level) {
            surface.show_lines(h.line..h.line + 1);
        }
    }

    /* ----------------------------- Global cycle ----------------------------- */

    /// Cycle the whole document: Overview (top-level headings only), Contents
    /// (every heading line, bodies hidden), All. Any intervening command resets
    /// the next invocation to Overview.
    pub fn cycle_buffer(
        doc: &Document,
        cfg: &OutlineConfig,
        memory: &mut CommandMemory,
        surface: &mut dyn RenderSurface,
    ) -> Result<FoldOutcome, OutlineError> {
        let outline = scanner::outline(doc, cfg)?;
        let phase = match *memory {
            CommandMemory::GlobalCycle(GlobalFold::Overview) => GlobalFold::Contents,
            CommandMemory::GlobalCycle(GlobalFold::Contents) => GlobalFold::All,
            _ => GlobalFold::Overview,
        };
        match phase {
            GlobalFold::Overview => {
                surface.show_lines(0..doc.line_count());
                for (idx, h) in outline.iter().enumerate() {
                    if h.level == 1 {
                        let end = subtree_end(&outline, idx, doc.line_count());
                        surface.hide_lines(h.line + 1..end);
                    }
                }
            }
            GlobalFold::Contents => {
                surface.show_lines(0..doc.line_count());
                for (idx, h) in outline.iter().enumerate() {
                    let body_end = outline
                        .get(idx + 1)
                        .map(|n| n.line)
                        .unwrap_or(doc.line_count());
                    surface.hide_lines(h.line + 1..body_end);
                }
            }
            GlobalFold::All => surface.show_lines(0..doc.line_count()),
        }
        *memory = CommandMemory::GlobalCycle(phase);
        Ok(FoldOutcome::CycledAll(phase))
    }

}

pub mod navigate {
    //! Heading-to-heading motion, with the viewport policy for top-level
    //! landings.

    use super::core::{Document, HeadingLine, OutlineConfig, OutlineError, Point};
    use super::render::RenderSurface;
    use super::scanner;

    /// Motion result; `NoMore` means the caller's point stays untouched — a
    /// partial move never happens.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MoveOutcome {
        Moved(Point),
        NoMore(&'static str),
    }

    pub fn next_heading(
        doc: &Document,
        cfg: &OutlineConfig,
        from: Point,
        n: usize,
        surface: &mut dyn RenderSurface,
    ) -> Result<MoveOutcome, OutlineError> {
        let outline = scanner::outline(doc, cfg)?;
        let mut at = from.line;
        let mut landed: Option<&HeadingLine> = None;
        for _ in 0..n.max(1) {
            match outline.iter().find(|h| h.line > at) {
                Some(h) => {
                    at = h.line;
                    landed = Some(h);
                }
                None => return Ok(MoveOutcome::NoMore("no next heading")),
            }
        }
        Ok(finish(doc, &outline, landed, surface))
    }

    pub fn previous_heading(
        doc: &Document,
        cfg: &OutlineConfig,
        from: Point,
        n: usize,
        surface: &mut dyn RenderSurface,
    ) -> Result<MoveOutcome, OutlineError> {
        let outline = scanner::outline(doc, cfg)?;
        let mut at = from.line;
        let mut landed: Option<&HeadingLine> = None;
        for _ in 0..n.max(1) {
            match outline.iter().rev().find(|h| h.line < at) {
                Some(h) => {
                    at = h.line;
                    landed = Some(h);
                }
                None => return Ok(MoveOutcome::NoMore("no previous heading")),
            }
        }
        Ok(finish(doc, &outline, landed, surface))
    }

    fn finish(
        doc: &Document,
        outline: &[HeadingLine],
        landed: Option<&HeadingLine>,
        surface: &mut dyn RenderSurface,
    ) -> MoveOutcome {
        let Some(h) = landed else {
            return MoveOutcome::NoMore("no heading found");
        };
        if h.level == 1 {
            recenter(doc, outline, h, surface);
        }
        MoveOutcome::Moved(Point {
            line: h.line,
            column: 0,
        })
    }

    /// After landing on a top-level heading, make sure its whole section can be
    /// seen: if the section's last content line is off-screen, put the heading
    /// at the top of the viewport.
    fn recenter(
        doc: &Document,
        outline: &[HeadingLine],
        h: &HeadingLine,
        surface: &mut dyn RenderSurface,
    ) {
        let next_top = outline
            .iter()
            .find(|o| o.line > h.line && o.level == 1)
            .map(|o| o.line)
            .unwrap_or(doc.line_count());
        let last = (h.line + 1..next_top)
            .rev()
            .find(|&l| doc.line(l).is_some_and(|t| !scanner::is_blank(t)))
            .unwrap_or(h.line);
        if !surface.line_in_viewport(last) {
            surface.scroll_to_top(h.line);
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::core::CommentSyntax;
        use crate::render::testing::RecordingSurface;

        fn doc(lines: &[&str]) -> Document {
            let mut d = Document::from_text(None, &lines.join("\n"));
            d.set_comment_syntax(Some(CommentSyntax('/')));
            d
        }

        #[test]
        fn moves_across_headings_of_any_level() {
            let cfg = OutlineConfig::default();
            let d = doc(&["/// A", "body", "//// B", "more", "/// C"]);
            let mut surface = RecordingSurface::new(0..100);
            let from = Point { line: 0, column: 0 };

            let one = next_heading(&d, &cfg, from, 1, &mut surface).expect("move");
            assert_eq!(one, MoveOutcome::Moved(Point { line: 2, column: 0 }));
            let two = next_heading(&d, &cfg, from, 2, &mut surface).expect("move");
            assert_eq!(two, MoveOutcome::Moved(Point { line: 4, column: 0 }));

            let back = previous_heading(
                &d,
                &cfg,
                Point { line: 4, column: 0 },
                2,
                &mut surface,
            )
            .expect("move");
            assert_eq!(back, MoveOutcome::Moved(Point { line: 0, column: 0 }));
        }

        #[test]
        fn exhausted_searches_report_without_moving() {
            let cfg = OutlineConfig::default();
            let d = doc(&["/// A", "body", "/// B"]);
            let mut surface = RecordingSurface::new(0..100);

            let too_far = next_heading(&d, &cfg, Point { line: 0, column: 0 }, 5, &mut surface)
                .expect("move");
            assert_eq!(too_far, MoveOutcome::NoMore("no next heading"));

            let before_first =
                previous_heading(&d, &cfg, Point { line: 0, column: 0 }, 1, &mut surface)
                    .expect("move");
            assert_eq!(before_first, MoveOutcome::NoMore("no previous heading"));
        }

        #[test]
        fn landing_on_a_top_level_heading_scrolls_when_its_section_overflows() {
            let cfg = OutlineConfig::default();
            let d = doc(&[
                "/// A", "a1", "/// B", "b1", "b2", "b3", "b4", "", "/// C",
            ]);
            // Viewport covers the top of the file only.
            let mut surface = RecordingSurface::new(0..4);
            let outcome = next_heading(&d, &cfg, Point { line: 0, column: 0 }, 1, &mut surface)
                .expect("move");
            assert_eq!(outcome, MoveOutcome::Moved(Point { line: 2, column: 0 }));
            // B's last content line (6) is outside the viewport, so B goes to
            // the top.
            assert_eq!(surface.scrolled_to, Some(2));

            // A's section fits; no scroll request.
            let mut surface = RecordingSurface::new(0..4);
            let outcome =
                previous_heading(&d, &cfg, Point { line: 2, column: 0 }, 1, &mut surface)
                    .expect("move");
            assert_eq!(outcome, MoveOutcome::Moved(Point { line: 0, column: 0 }));
            assert_eq!(surface.scrolled_to, None);
        }
    }
}

pub mod render {
    //! Interface to the host editor's rendering substrate, plus the projector
    //! that turns headings into concrete decoration requests.

    use super::core::{BlockRegion, Document, HeadingLine, OutlineConfig, OutlineError};
    use super::regions;
    use super::scanner;
    use serde::{Deserialize, Serialize};
    use std::ops::Range;
    use tracing::debug;

    /// Everything the host editor must provide. Mark operations are
    /// fire-and-forget; the visibility and viewport calls are the only queries.
    pub trait RenderSurface {
        /// Visually collapse the columns `cols` of `line`.
        fn hide_columns(&mut self, line: usize, cols: Range<usize>);
        /// Replace the glyph at one column, keeping the underlying text.
        fn substitute(&mut self, line: usize, column: usize, glyph: char, face: &str);
        fn apply_face(&mut self, line: usize, cols: Range<usize>, face: &str);
        /// Remove decoration previously applied to `line`.
        fn clear_decor(&mut self, line: usize);
        /// Paint a block background over the inclusive line range.
        fn paint_block(&mut self, region: BlockRegion);
        fn clear_blocks(&mut self);
        fn hide_lines(&mut self, lines: Range<usize>);
        fn show_lines(&mut self, lines: Range<usize>);
        /// Whether the line is folded away.
        fn is_line_visible(&self, line: usize) -> bool;
        /// Whether the line is inside the current viewport.
        fn line_in_viewport(&self, line: usize) -> bool;
        fn scroll_to_top(&mut self, line: usize);
    }

    /* --------------------------- Decor projector --------------------------- */

    /// Decoration requests for one heading line: the bullet-substitution rule.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct HeadingDecor {
        pub line: usize,
        /// Comment characters hidden outright (all but the last of the run).
        pub hidden: Range<usize>,
        /// Column whose glyph is replaced by the level bullet.
        pub bullet_column: usize,
        pub bullet: char,
        pub face: String,
        pub face_span: Range<usize>,
        /// Span of the keyword token, when present.
        pub keyword_span: Option<Range<usize>>,
    }

    /// Compute the decoration for one heading. With indentation `i` and run `r`:
    /// columns `[i, i+r-1)` are hidden, the final run column carries the level
    /// bullet, and the level face covers the heading text.
    pub fn heading_decor(doc: &Document, cfg: &OutlineConfig, h: &HeadingLine) -> HeadingDecor {
        let line_len = doc.line(h.line).map(|t| t.chars().count()).unwrap_or(0);
        let keyword_span = h.keyword.as_ref().map(|kw| {
            let start = h.indent + h.run + 1;
            start..start + kw.chars().count()
        });
        HeadingDecor {
            line: h.line,
            hidden: h.indent..h.indent + h.run - 1,
            bullet_column: h.indent + h.run - 1,
            bullet: cfg.bullet_glyph(h.level),
            face: cfg.display_face(h.level),
            face_span: h.indent..line_len,
            keyword_span,
        }
    }

    fn apply_decor(surface: &mut dyn RenderSurface, decor: &HeadingDecor) {
        surface.clear_decor(decor.line);
        surface.hide_columns(decor.line, decor.hidden.clone());
        surface.substitute(decor.line, decor.bullet_column, decor.bullet, &decor.face);
        surface.apply_face(decor.line, decor.face_span.clone(), &decor.face);
        if let Some(span) = &decor.keyword_span {
            surface.apply_face(decor.line, span.clone(), "keyword");
        }
    }

    /* ------------------------------- Caching ------------------------------- */

    /// Lazily recomputed render state. Invalidation only marks it stale; the
    /// next access re-derives from the document.
    #[derive(Debug, Default)]
    pub struct RenderCache {
        decor: Option<Vec<HeadingDecor>>,
        regions: Option<Vec<BlockRegion>>,
    }

    impl RenderCache {
        pub fn invalidate(&mut self) {
            self.decor = None;
            self.regions = None;
        }

        pub fn decor(
            &mut self,
            doc: &Document,
            cfg: &OutlineConfig,
        ) -> Result<&[HeadingDecor], OutlineError> {
            if self.decor.is_none() {
                debug!("re-deriving heading decor");
                let outline = scanner::outline(doc, cfg)?;
                self.decor = Some(
                    outline
                        .iter()
                        .map(|h| heading_decor(doc, cfg, h))
                        .collect(),
                );
            }
            Ok(self.decor.as_deref().unwrap_or(&[]))
        }

        pub fn regions(
            &mut self,
            doc: &Document,
            cfg: &OutlineConfig,
        ) -> Result<&[BlockRegion], OutlineError> {
            if self.regions.is_none() {
                debug!("re-deriving block regions");
                self.regions = Some(regions::compute_regions(doc, cfg)?);
            }
            Ok(self.regions.as_deref().unwrap_or(&[]))
        }
    }

    /// Recompute and replay the full decoration for a document.
    pub fn decorate(
        doc: &Document,
        cfg: &OutlineConfig,
        cache: &mut RenderCache,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), OutlineError> {
        for decor in cache.decor(doc, cfg)? {
            apply_decor(surface, decor);
        }
        surface.clear_blocks();
        if cfg.blocks_enabled_for(doc) {
            for region in cache.regions(doc, cfg)? {
                surface.paint_block(*region);
            }
        }
        Ok(())
    }

    /* --------------------------- Edit notifications --------------------------- */

    /// A change notification from the host: `old_len` characters at
    /// `(line, column)` were replaced by `new_len` characters.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TextChange {
        pub line: usize,
        pub column: usize,
        pub old_len: usize,
        pub new_len: usize,
    }

    /// Handle a text change. Decoration is re-derived only when the change
    /// touches the line's heading-prefix columns; block regions always go stale
    /// and re-derive on the next query.
    pub fn text_changed(
        doc: &Document,
        cfg: &OutlineConfig,
        cache: &mut RenderCache,
        change: TextChange,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), OutlineError> {
        let syntax = doc.require_syntax()?;
        cache.regions = None;
        let Some(text) = doc.line(change.line) else {
            return Ok(());
        };
        let prefix_end = scanner::indent_width(text)
            + scanner::comment_run_length(text, syntax).unwrap_or(0)
            + 1;
        if change.column > prefix_end {
            debug!(line = change.line, "change outside heading prefix");
            return Ok(());
        }
        cache.decor = None;
        surface.clear_decor(change.line);
        if let Some(h) = scanner::heading_at(doc, cfg, change.line)? {
            apply_decor(surface, &heading_decor(doc, cfg, &h));
        }
        Ok(())
    }

    /// In-memory surface used by the fold, navigation, and render tests.
    #[cfg(test)]
    pub(crate) mod testing {
        use super::*;
        use std::collections::BTreeSet;

        #[derive(Debug)]
        pub struct RecordingSurface {
            pub hidden_lines: BTreeSet<usize>,
            pub decorated: BTreeSet<usize>,
            pub substitutions: Vec<(usize, usize, char, String)>,
            pub faces: Vec<(usize, Range<usize>, String)>,
            pub blocks: Vec<BlockRegion>,
            pub viewport: Range<usize>,
            pub scrolled_to: Option<usize>,
        }

        impl RecordingSurface {
            pub fn new(viewport: Range<usize>) -> Self {
                Self {
                    hidden_lines: BTreeSet::new(),
                    decorated: BTreeSet::new(),
                    substitutions: Vec::new(),
                    faces: Vec::new(),
                    blocks: Vec::new(),
                    viewport,
                    scrolled_to: None,
                }
            }
        }

        impl RenderSurface for RecordingSurface {
            fn hide_columns(&mut self, line: usize, _cols: Range<usize>) {
                self.decorated.insert(line);
            }

            fn substitute(&mut self, line: usize, column: usize, glyph: char, face: &str) {
                self.substitutions.push((line, column, glyph, face.to_string()));
            }

            fn apply_face(&mut self, line: usize, cols: Range<usize>, face: &str) {
                self.faces.push((line, cols, face.to_string()));
            }

            fn clear_decor(&mut self, line: usize) {
                self.decorated.remove(&line);
                self.substitutions.retain(|s| s.0 != line);
                self.faces.retain(|f| f.0 != line);
            }

            fn paint_block(&mut self, region: BlockRegion) {
                self.blocks.push(region);
            }

            fn clear_blocks(&mut self) {
                self.blocks.clear();
            }

            fn hide_lines(&mut self, lines: Range<usize>) {
                for l in lines {
                    self.hidden_lines.insert(l);
                }
            }

            fn show_lines(&mut self, lines: Range<usize>) {
                for l in lines {
                    self.hidden_lines.remove(&l);
                }
            }

            fn is_line_visible(&self, line: usize) -> bool {
                !self.hidden_lines.contains(&line)
            }

            fn line_in_viewport(&self, line: usize) -> bool {
                self.viewport.contains(&line)
            }

            fn scroll_to_top(&mut self, line: usize) {
                self.scrolled_to = Some(line);
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::testing::RecordingSurface;
        use super::*;
        use crate::core::CommentSyntax;

        fn doc(lines: &[&str]) -> Document {
            let mut d = Document::from_text(None, &lines.join("\n"));
            d.set_comment_syntax(Some(CommentSyntax('/')));
            d
        }

        #[test]
        fn decor_hides_the_run_and_substitutes_the_bullet() {
            let cfg = OutlineConfig::default();
            let d = doc(&["  //// TODO Ship it"]);
            let outline = scanner::outline(&d, &cfg).expect("scan");
            let decor = heading_decor(&d, &cfg, &outline[0]);
            assert_eq!(decor.hidden, 2..5);
            assert_eq!(decor.bullet_column, 5);
            assert_eq!(decor.bullet, cfg.bullet_glyph(2));
            assert_eq!(decor.face, "level-2");
            assert_eq!(decor.face_span, 2..19);
            assert_eq!(decor.keyword_span, Some(7..11));
        }

        #[test]
        fn decorate_paints_blocks_unless_filtered_out() {
            let cfg = OutlineConfig::default();
            let d = doc(&["/// A", "body"]);
            let mut cache = RenderCache::default();
            let mut surface = RecordingSurface::new(0..100);
            decorate(&d, &cfg, &mut cache, &mut surface).expect("decorate");
            assert_eq!(surface.blocks, vec![BlockRegion { start: 1, end: 1 }]);
            assert!(!surface.substitutions.is_empty());

            let filtered = OutlineConfig {
                block_filter: crate::core::BlockFilter::Files(vec!["other.rs".into()]),
                ..OutlineConfig::default()
            };
            let mut surface = RecordingSurface::new(0..100);
            let mut cache = RenderCache::default();
            decorate(&d, &filtered, &mut cache, &mut surface).expect("decorate");
            assert!(surface.blocks.is_empty());
        }

        #[test]
        fn changes_outside_the_prefix_leave_decor_alone() {
            let cfg = OutlineConfig::default();
            let d = doc(&["/// Title text"]);
            let mut cache = RenderCache::default();
            let mut surface = RecordingSurface::new(0..100);
            decorate(&d, &cfg, &mut cache, &mut surface).expect("decorate");
            let before = surface.substitutions.clone();

            // A change in the title, well past the prefix columns.
            text_changed(
                &d,
                &cfg,
                &mut cache,
                TextChange {
                    line: 0,
                    column: 10,
                    old_len: 0,
                    new_len: 1,
                },
                &mut surface,
            )
            .expect("notify");
            assert_eq!(surface.substitutions, before);

            // A change inside the prefix re-derives the line's decoration.
            text_changed(
                &d,
                &cfg,
                &mut cache,
                TextChange {
                    line: 0,
                    column: 1,
                    old_len: 1,
                    new_len: 2,
                },
                &mut surface,
            )
            .expect("notify");
            assert_eq!(surface.substitutions.len(), before.len());
        }

        #[test]
        fn cache_re_derives_after_invalidation() {
            let cfg = OutlineConfig::default();
            let mut d = doc(&["/// A", "body"]);
            let mut cache = RenderCache::default();
            assert_eq!(cache.decor(&d, &cfg).expect("decor").len(), 1);

            d.insert_line(2, "//// B".into()).expect("insert");
            // Stale until invalidated.
            assert_eq!(cache.decor(&d, &cfg).expect("decor").len(), 1);
            cache.invalidate();
            assert_eq!(cache.decor(&d, &cfg).expect("decor").len(), 2);
        }
    }
}

pub mod session {
    //! Session-level registry: one process, many open documents, one config.
    //!
    //! Configuration changes broadcast an invalidation to every open document's
    //! render cache; each document re-derives lazily on its next access. The
    //! mutating wrappers are what keep the derived views honest: every edit
    //! invalidates and replays the affected rendering before returning, and
    //! every non-cycle command clears the fold memory.

    use super::core::{Document, DocumentId, OutlineConfig, OutlineError, Point};
    use super::edit::{self, CycleDirection, EditOutcome, InsertOutcome};
    use super::fold::{self, CommandMemory, FoldOutcome};
    use super::navigate::{self, MoveOutcome};
    use super::render::{self, RenderCache, RenderSurface, TextChange};
    use chrono::NaiveDateTime;
    use indexmap::IndexMap;
    use tracing::debug;

    /// Everything the session tracks for one open document.
    #[derive(Debug)]
    pub struct DocumentState {
        pub document: Document,
        pub cache: RenderCache,
        pub memory: CommandMemory,
    }

    pub struct Session {
        config: OutlineConfig,
        docs: IndexMap<DocumentId, DocumentState>,
    }

    impl Session {
        pub fn new(config: OutlineConfig) -> Self {
            Self {
                config,
                docs: IndexMap::new(),
            }
        }

        pub fn config(&self) -> &OutlineConfig {
            &self.config
        }

        /// Apply a configuration change and push an invalidation to every open
        /// document.
        pub fn update_config(&mut self, apply: impl FnOnce(&mut OutlineConfig)) {
            apply(&mut self.config);
            debug!(documents = self.docs.len(), "configuration changed");
            for state in self.docs.values_mut() {
                state.cache.invalidate();
                state.memory.clear();
            }
        }

        pub fn open(&mut self, document: Document) -> DocumentId {
            let id = document.id;
            self.docs.insert(
                id,
                DocumentState {
                    document,
                    cache: RenderCache::default(),
                    memory: CommandMemory::default(),
                },
            );
            id
        }

        pub fn close(&mut self, id: DocumentId) -> Option<Document> {
            self.docs.shift_remove(&id).map(|s| s.document)
        }

        pub fn get(&self, id: DocumentId) -> Option<&DocumentState> {
            self.docs.get(&id)
        }

        pub fn get_mut(&mut self, id: DocumentId) -> Option<&mut DocumentState> {
            self.docs.get_mut(&id)
        }

        fn state_mut(
            &mut self,
            id: DocumentId,
        ) -> Result<(&OutlineConfig, &mut DocumentState), OutlineError> {
            let Self { config, docs } = self;
            docs.get_mut(&id)
                .map(|s| (&*config, s))
                .ok_or(OutlineError::UnknownDocument)
        }

        fn refresh(
            cfg: &OutlineConfig,
            state: &mut DocumentState,
            surface: &mut dyn RenderSurface,
        ) -> Result<(), OutlineError> {
            state.cache.invalidate();
            render::decorate(&state.document, cfg, &mut state.cache, surface)
        }

        /* Mutating wrappers: edit, then re-derive before returning. */

        pub fn promote(
            &mut self,
            id: DocumentId,
            line: usize,
            n: usize,
            surface: &mut dyn RenderSurface,
        ) -> Result<EditOutcome, OutlineError> {
            let (cfg, state) = self.state_mut(id)?;
            state.memory.clear();
            let outcome = edit::promote(&mut state.document, cfg, line, n)?;
            if outcome == EditOutcome::Edited {
                Self::refresh(cfg, state, surface)?;
            }
            Ok(outcome)
        }

        pub fn demote(
            &mut self,
            id: DocumentId,
            line: usize,
            n: usize,
            surface: &mut dyn RenderSurface,
        ) -> Result<EditOutcome, OutlineError> {
            let (cfg, state) = self.state_mut(id)?;
            state.memory.clear();
            let outcome = edit::demote(&mut state.document, cfg, line, n)?;
            if outcome == EditOutcome::Edited {
                Self::refresh(cfg, state, surface)?;
            }
            Ok(outcome)
        }

        pub fn cycle_todo(
            &mut self,
            id: DocumentId,
            line: usize,
            direction: CycleDirection,
            now: NaiveDateTime,
            surface: &mut dyn RenderSurface,
        ) -> Result<EditOutcome, OutlineError> {
            let (cfg, state) = self.state_mut(id)?;
            state.memory.clear();
            let outcome = edit::cycle_todo(&mut state.document, cfg, line, direction, now)?;
            if outcome == EditOutcome::Edited {
                Self::refresh(cfg, state, surface)?;
            }
            Ok(outcome)
        }

        pub fn insert_heading(
            &mut self,
            id: DocumentId,
            point: Point,
            level: usize,
            respect_content: bool,
            surface: &mut dyn RenderSurface,
        ) -> Result<Point, OutlineError> {
            let (cfg, state) = self.state_mut(id)?;
            state.memory.clear();
            let landed =
                edit::insert_heading(&mut state.document, cfg, point, level, respect_content)?;
            Self::refresh(cfg, state, surface)?;
            Ok(landed)
        }

        pub fn insert_subheading(
            &mut self,
            id: DocumentId,
            point: Point,
            surface: &mut dyn RenderSurface,
        ) -> Result<InsertOutcome, OutlineError> {
            let (cfg, state) = self.state_mut(id)?;
            state.memory.clear();
            let outcome = edit::insert_subheading(&mut state.document, cfg, point)?;
            if matches!(outcome, InsertOutcome::Inserted(_)) {
                Self::refresh(cfg, state, surface)?;
            }
            Ok(outcome)
        }

        /* Cycling and motion. */

        pub fn cycle(
            &mut self,
            id: DocumentId,
            line: usize,
            surface: &mut dyn RenderSurface,
        ) -> Result<FoldOutcome, OutlineError> {
            let (cfg, state) = self.state_mut(id)?;
            fold::cycle(&state.document, cfg, line, &mut state.memory, surface)
        }

        pub fn cycle_buffer(
            &mut self,
            id: DocumentId,
            surface: &mut dyn RenderSurface,
        ) -> Result<FoldOutcome, OutlineError> {
            let (cfg, state) = self.state_mut(id)?;
            fold::cycle_buffer(&state.document, cfg, &mut state.memory, surface)
        }

        pub fn next_heading(
            &mut self,
            id: DocumentId,
            from: Point,
            n: usize,
            surface: &mut dyn RenderSurface,
        ) -> Result<MoveOutcome, OutlineError> {
            let (cfg, state) = self.state_mut(id)?;
            state.memory.clear();
            navigate::next_heading(&state.document, cfg, from, n, surface)
        }

        pub fn previous_heading(
            &mut self,
            id: DocumentId,
            from: Point,
            n: usize,
            surface: &mut dyn RenderSurface,
        ) -> Result<MoveOutcome, OutlineError> {
            let (cfg, state) = self.state_mut(id)?;
            state.memory.clear();
            navigate::previous_heading(&state.document, cfg, from, n, surface)
        }

        /* Host notifications. */

        pub fn text_changed(
            &mut self,
            id: DocumentId,
            change: TextChange,
            surface: &mut dyn RenderSurface,
        ) -> Result<(), OutlineError> {
            let (cfg, state) = self.state_mut(id)?;
            state.memory.clear();
            render::text_changed(&state.document, cfg, &mut state.cache, change, surface)
        }

        pub fn decorate(
            &mut self,
            id: DocumentId,
            surface: &mut dyn RenderSurface,
        ) -> Result<(), OutlineError> {
            let (cfg, state) = self.state_mut(id)?;
            render::decorate(&state.document, cfg, &mut state.cache, surface)
        }
    }

}

pub use scanner::outline;
pub use session::Session;
