//! Parsing sessions over a fixed set of headers.

use crate::cache::{unix_secs, CacheBlob};
use crate::error::{SessionError, SessionResult};
use crate::options::{Replacement, SessionOptions};
use cheader_lexer::LineIndex;
use cheader_parser::{Grammar, GrammarBuilder, GrammarConfig, ParseReport};
use cheader_preprocess::{predefine, preprocess, PreprocessError};
use cheader_registry::{Definition, Registry};
use cheader_types::Type;
use indexmap::IndexMap;
use regex::Regex;
use smol_str::SmolStr;
use std::time::SystemTime;
use tracing::{debug, info, instrument, warn};

/// Raw content of one header as handed over by the caller
#[derive(Debug, Clone)]
struct HeaderSource {
    text: Option<String>,
    modified: u64,
}

/// Diagnostics collected while processing one header
#[derive(Debug, Clone, Default)]
pub struct FileReport {
    pub preprocess: Vec<PreprocessError>,
    pub parse: ParseReport,
}

impl FileReport {
    pub fn is_clean(&self) -> bool {
        self.preprocess.is_empty() && self.parse.is_clean()
    }
}

/// One occurrence found by [`HeaderSession::find_text`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatch {
    pub file: SmolStr,
    /// 0-based line
    pub line: usize,
    pub text: String,
}

/// Assembles a [`HeaderSession`]
#[derive(Debug, Default)]
pub struct SessionBuilder {
    config: GrammarConfig,
    options: SessionOptions,
    sources: IndexMap<SmolStr, HeaderSource>,
    imports: Vec<Registry>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grammar(mut self, config: GrammarConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a header. Headers are processed in the order they are added.
    pub fn header(self, name: &str, text: impl Into<String>) -> Self {
        self.header_modified(name, text, SystemTime::UNIX_EPOCH)
    }

    /// Add a header along with its modification time, used to decide
    /// whether a cache blob is stale
    pub fn header_modified(mut self, name: &str, text: impl Into<String>, modified: SystemTime) -> Self {
        self.add_source(name, Some(text.into()), unix_secs(modified));
        self
    }

    /// Declare a header whose content could not be loaded. Processing
    /// fails only if no valid cache stands in for it.
    pub fn missing_header(mut self, name: &str) -> Self {
        warn!(header = name, "header content missing");
        self.add_source(name, None, 0);
        self
    }

    fn add_source(&mut self, name: &str, text: Option<String>, modified: u64) {
        let name = SmolStr::new(name);
        if !self.options.files.contains(&name) {
            self.options.files.push(name.clone());
        }
        self.sources.insert(name, HeaderSource { text, modified });
    }

    /// Rewrite matches of `pattern` in raw header text, in `file` only or
    /// in every header
    pub fn replace(mut self, file: Option<&str>, pattern: &str, replacement: &str) -> Self {
        self.options.replacements.push(Replacement {
            file: file.map(SmolStr::new),
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
        });
        self
    }

    /// Predefine an object macro, as `-D name=body` would
    pub fn define(mut self, name: &str, body: &str) -> Self {
        self.options.macros.push((SmolStr::new(name), body.to_string()));
        self
    }

    /// Insert a built-in definition before any header is processed
    pub fn seed(mut self, name: &str, def: Definition) -> Self {
        self.options.seeds.push((SmolStr::new(name), def));
        self
    }

    /// Start from the definitions of a finished registry. Headers processed
    /// later override them.
    pub fn copy_from(mut self, registry: &Registry) -> Self {
        self.imports.push(registry.clone());
        self
    }

    #[instrument(skip_all)]
    pub fn build(self) -> SessionResult<HeaderSession> {
        let replacements = self
            .options
            .replacements
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern).map_err(|source| SessionError::InvalidReplacement {
                    pattern: rule.pattern.clone(),
                    source,
                })
            })
            .collect::<SessionResult<Vec<_>>>()?;

        let mut registry = Registry::new();
        for import in &self.imports {
            registry.import(import);
        }
        for (name, def) in &self.options.seeds {
            registry.insert(None, name.clone(), def.clone());
        }
        for (name, body) in &self.options.macros {
            for diag in predefine(&mut registry, name, body) {
                warn!(macro_name = %name, "{diag}");
            }
        }

        Ok(HeaderSession {
            grammar: GrammarBuilder::new(self.config).build(),
            options: self.options,
            sources: self.sources,
            replacements,
            registry,
            processed: false,
            preprocessed: IndexMap::new(),
            reports: IndexMap::new(),
        })
    }
}

/// A set of headers and the registry extracted from them.
///
/// ```
/// use cheader::SessionBuilder;
///
/// let mut session = SessionBuilder::new()
///     .header("limits.h", "#define MAX_NAME 32\nchar name[MAX_NAME + 1];")
///     .build()
///     .unwrap();
/// session.process_all().unwrap();
/// assert_eq!(session.render(&session.registry().variables()["name"].ty, Some("name")), "char name[33]");
/// ```
#[derive(Debug)]
pub struct HeaderSession {
    grammar: Grammar,
    options: SessionOptions,
    sources: IndexMap<SmolStr, HeaderSource>,
    /// Compiled patterns, parallel to `options.replacements`
    replacements: Vec<Regex>,
    registry: Registry,
    processed: bool,
    preprocessed: IndexMap<SmolStr, String>,
    reports: IndexMap<SmolStr, FileReport>,
}

impl HeaderSession {
    /// Preprocess and parse every header in order
    #[instrument(skip(self))]
    pub fn process_all(&mut self) -> SessionResult<()> {
        if self.processed {
            return Err(SessionError::AlreadyProcessed);
        }
        self.processed = true;

        let files: Vec<SmolStr> = self.options.files.clone();
        for file in &files {
            self.process_file(file)?;
        }
        info!(
            files = files.len(),
            definitions = self.registry.flat().len(),
            "headers processed"
        );
        Ok(())
    }

    fn process_file(&mut self, file: &SmolStr) -> SessionResult<()> {
        let raw = self
            .sources
            .get(file)
            .and_then(|s| s.text.as_deref())
            .ok_or_else(|| SessionError::MissingHeader(file.clone()))?;

        let mut text = raw.to_string();
        let rules = self.options.replacements.iter().zip(&self.replacements);
        for (rule, re) in rules.filter(|(rule, _)| rule.applies_to(file)) {
            text = re.replace_all(&text, rule.replacement.as_str()).into_owned();
        }

        let out = preprocess(&mut self.registry, file, &text);
        let parse = self.grammar.parse_file(&out.text, file, &out.packing, &mut self.registry);
        let report = FileReport {
            preprocess: out.diagnostics,
            parse,
        };
        if report.is_clean() {
            debug!(%file, "header processed");
        } else {
            warn!(
                %file,
                diagnostics = report.preprocess.len(),
                unparsed = report.parse.unparsed.len(),
                errors = report.parse.errors.len(),
                "header processed with problems"
            );
        }
        self.preprocessed.insert(file.clone(), out.text);
        self.reports.insert(file.clone(), report);
        Ok(())
    }

    /// Restore from `cache` if it is valid for this session, otherwise
    /// process every header. Returns whether the cache was used.
    pub fn process_all_cached(&mut self, cache: Option<&str>) -> SessionResult<bool> {
        if self.processed {
            return Err(SessionError::AlreadyProcessed);
        }
        if let Some(blob) = cache {
            if self.load_cache(blob, true) {
                return Ok(true);
            }
        }
        self.process_all()?;
        Ok(false)
    }

    /// Replace the registry with the one stored in `blob`. A blob that does
    /// not decode or has an older format is refused; with `check_validity`,
    /// so is one recorded with other options or older than any header.
    #[instrument(skip(self, blob))]
    pub fn load_cache(&mut self, blob: &str, check_validity: bool) -> bool {
        let cache = match CacheBlob::from_json(blob) {
            Ok(cache) => cache,
            Err(err) => {
                debug!(error = %err, "cache does not decode");
                return false;
            }
        };
        if !cache.is_supported() {
            debug!(version = cache.version, "cache format too old");
            return false;
        }
        if check_validity && !cache.is_valid_for(&self.options, self.newest_source()) {
            return false;
        }

        info!(files = cache.registry.files().count(), "registry restored from cache");
        self.registry = cache.registry;
        self.processed = true;
        true
    }

    /// Serialize the registry together with this session's options
    pub fn to_cache(&self) -> SessionResult<String> {
        Ok(CacheBlob::new(self.options.clone(), self.registry.clone()).to_json()?)
    }

    fn newest_source(&self) -> u64 {
        self.sources.values().map(|s| s.modified).max().unwrap_or(0)
    }

    /// Parse a type name or declaration and chase its typedefs down to a
    /// fundamental type
    pub fn resolve_type(&self, text: &str) -> SessionResult<Type> {
        let (_, ty) = self.grammar.parse_type(text)?;
        Ok(ty.resolve(&self.registry, self.grammar.vocabulary())?)
    }

    /// C declaration text for `ty`, declaring `name` if given
    pub fn render(&self, ty: &Type, name: Option<&str>) -> String {
        ty.c_repr(name)
    }

    /// Definition by category name, e.g. `lookup("structs", "point")`
    pub fn lookup(&self, category: &str, name: &str) -> SessionResult<Option<Definition>> {
        Ok(self.registry.lookup(category, name)?)
    }

    /// Lines of the raw headers containing `needle`
    pub fn find_text(&self, needle: &str) -> Vec<TextMatch> {
        let mut found = Vec::new();
        for (file, source) in &self.sources {
            let Some(text) = source.text.as_deref() else {
                continue;
            };
            let lines = LineIndex::new(text);
            let mut last_line = None;
            for (offset, _) in text.match_indices(needle) {
                let line = lines.line_of(offset);
                if last_line == Some(line) {
                    continue;
                }
                last_line = Some(line);
                found.push(TextMatch {
                    file: file.clone(),
                    line,
                    text: text.lines().nth(line).unwrap_or_default().to_string(),
                });
            }
        }
        found
    }

    /// Preprocessed text of `file`, once processed
    pub fn preprocessed(&self, file: &str) -> Option<&str> {
        self.preprocessed.get(file).map(String::as_str)
    }

    /// Diagnostics per processed header, in processing order
    pub fn reports(&self) -> impl Iterator<Item = (&str, &FileReport)> {
        self.reports.iter().map(|(file, report)| (file.as_str(), report))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// C listing of everything extracted, or of one header's share
    pub fn dump(&self, file: Option<&str>) -> String {
        self.registry.dump(file)
    }
}
