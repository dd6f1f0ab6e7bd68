mod go_build;
mod plus_build;

use crate::GocheckError;
use crate::preprocessor::go_build::GoBuildDirective;
use crate::preprocessor::plus_build::PlusBuildDirective;
use std::collections::HashMap;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js",
    "linux", "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips",
    "mipsle", "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le",
    "riscv", "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// A boolean build constraint over build tags
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintExpr {
    Tag(String),
    Not(Box<ConstraintExpr>),
    And(Box<ConstraintExpr>, Box<ConstraintExpr>),
    Or(Box<ConstraintExpr>, Box<ConstraintExpr>),
}

impl ConstraintExpr {
    pub fn eval(&self, ok: &dyn Fn(&str) -> bool) -> bool {
        match self {
            ConstraintExpr::Tag(tag) => ok(tag),
            ConstraintExpr::Not(inner) => !inner.eval(ok),
            ConstraintExpr::And(left, right) => left.eval(ok) && right.eval(ok),
            ConstraintExpr::Or(left, right) => left.eval(ok) || right.eval(ok),
        }
    }
}

/// The build configuration units are checked against
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
    pub compiler: String,
    pub cgo_enabled: bool,
    /// Minor version of the toolchain, `go1.1` up to `go1.N` are satisfied
    pub go_minor_version: u32,
    pub build_tags: Vec<String>,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self {
            goos: "linux".to_string(),
            goarch: "amd64".to_string(),
            compiler: "gc".to_string(),
            cgo_enabled: true,
            go_minor_version: 22,
            build_tags: Vec::new(),
        }
    }
}

impl BuildContext {
    pub fn matches_tag(&self, tag: &str) -> bool {
        if tag == self.goos || tag == self.goarch || tag == self.compiler {
            return true;
        }
        if tag == "cgo" {
            return self.cgo_enabled;
        }
        if tag == "unix" {
            return UNIX_OS.contains(&self.goos.as_str());
        }
        match (self.goos.as_str(), tag) {
            ("android", "linux") | ("illumos", "solaris") | ("ios", "darwin") => return true,
            _ => {}
        }
        if let Some(minor) = tag.strip_prefix("go1.") {
            if let Ok(minor) = minor.parse::<u32>() {
                return minor >= 1 && minor <= self.go_minor_version;
            }
        }
        self.build_tags.iter().any(|t| t == tag)
    }

    /// Whether a unit with this file name and header constraint is part of the build
    pub fn allows(&self, file_name: &str, constraint: Option<&ConstraintExpr>) -> bool {
        if !self.allows_file_name(file_name) {
            return false;
        }
        match constraint {
            Some(expr) => expr.eval(&|tag| self.matches_tag(tag)),
            None => true,
        }
    }

    /// Applies the `_GOOS`, `_GOARCH` and `_GOOS_GOARCH` file name suffix rules
    pub fn allows_file_name(&self, file_name: &str) -> bool {
        let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
        if base.starts_with('_') || base.starts_with('.') {
            return false;
        }

        let stem = base.strip_suffix(".go").unwrap_or(base);
        let stem = stem.strip_suffix("_test").unwrap_or(stem);
        let Some(first_sep) = stem.find('_') else {
            return true;
        };

        let parts: Vec<&str> = stem[first_sep..].split('_').collect();
        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.matches_tag(parts[n - 2]) && self.matches_tag(parts[n - 1]);
        }
        if n >= 1 && KNOWN_OS.contains(&parts[n - 1]) {
            return self.matches_tag(parts[n - 1]);
        }
        if n >= 1 && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.matches_tag(parts[n - 1]);
        }
        true
    }
}

pub struct Preprocessor {
    directives: HashMap<String, Box<dyn DirectiveHandler>>,
    state: PreprocessorState,
}

#[derive(Default)]
pub struct PreprocessorState {
    go_build: Option<ConstraintExpr>,
    plus_build: Vec<ConstraintExpr>,
}

impl Preprocessor {
    pub fn new() -> Self {
        let mut p = Preprocessor {
            directives: HashMap::new(),
            state: PreprocessorState::default(),
        };
        p.register_directive("go:build", Box::new(GoBuildDirective));
        p.register_directive("+build", Box::new(PlusBuildDirective));
        p
    }

    pub fn register_directive(&mut self, name: &str, handler: Box<dyn DirectiveHandler>) {
        self.directives.insert(name.to_string(), handler);
    }

    /// Reads the constraint lines of the file header, everything up to the package clause
    pub fn process(&mut self, input: &str) -> Result<Option<ConstraintExpr>, GocheckError> {
        let mut in_block_comment = false;
        for line in input.lines() {
            let trimmed_line = line.trim();
            if in_block_comment {
                if trimmed_line.contains("*/") {
                    in_block_comment = false;
                }
                continue;
            }
            if trimmed_line.is_empty() {
                continue;
            }
            if trimmed_line.starts_with("/*") {
                in_block_comment = !trimmed_line.contains("*/");
                continue;
            }
            let Some(comment) = trimmed_line.strip_prefix("//") else {
                break;
            };

            let directive_line = if comment.starts_with("go:build") {
                comment
            } else {
                comment.trim_start()
            };
            let (directive_name, rest) = directive_line
                .split_once(char::is_whitespace)
                .unwrap_or((directive_line, ""));
            if let Some(handler) = self.directives.get(directive_name) {
                handler.process(rest.trim(), &mut self.state)?;
            }
        }

        Ok(self.take_constraint())
    }

    fn take_constraint(&mut self) -> Option<ConstraintExpr> {
        let state = std::mem::take(&mut self.state);
        if state.go_build.is_some() {
            return state.go_build;
        }
        state
            .plus_build
            .into_iter()
            .reduce(|acc, expr| ConstraintExpr::And(Box::new(acc), Box::new(expr)))
    }
}

pub trait DirectiveHandler {
    fn process(&self, line: &str, state: &mut PreprocessorState) -> Result<(), GocheckError>;
}

/// Uses the modular `Preprocessor` to extract the header build constraint of a unit
pub fn read_build_constraint(input: &str) -> Result<Option<ConstraintExpr>, GocheckError> {
    let mut preprocessor = Preprocessor::new();
    preprocessor.process(input)
}
