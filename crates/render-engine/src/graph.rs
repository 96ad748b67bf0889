//! Filter graph IR.
//!
//! Graphs are assembled from typed chains and pads and only turned into
//! ffmpeg's `-filter_complex` syntax at the invocation boundary. This keeps
//! the path builders testable without matching on raw strings.

use std::collections::HashSet;
use std::fmt;

use shortsmith_common::error::{ShortsmithError, ShortsmithResult};

/// Kind of elementary stream selected from an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

/// A link point in the graph: either a stream of an input file or a
/// named intermediate label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pad {
    Stream { input: usize, kind: StreamKind },
    Label(String),
}

/// One filter argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterArg {
    Positional(String),
    Named(String, String),
}

/// A single filter such as `scale=1080:1920`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub name: String,
    pub args: Vec<FilterArg>,
}

/// A linear run of filters between input and output pads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub inputs: Vec<Pad>,
    pub filters: Vec<Filter>,
    pub outputs: Vec<Pad>,
}

/// A complete filter graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterGraph {
    pub chains: Vec<Chain>,
}

impl Pad {
    pub fn video(input: usize) -> Self {
        Pad::Stream {
            input,
            kind: StreamKind::Video,
        }
    }

    pub fn audio(input: usize) -> Self {
        Pad::Stream {
            input,
            kind: StreamKind::Audio,
        }
    }

    pub fn label(name: impl Into<String>) -> Self {
        Pad::Label(name.into())
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pad::Stream { input, kind } => {
                let kind = match kind {
                    StreamKind::Video => 'v',
                    StreamKind::Audio => 'a',
                };
                write!(f, "[{input}:{kind}]")
            }
            Pad::Label(name) => write!(f, "[{name}]"),
        }
    }
}

impl Filter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl ToString) -> Self {
        self.args.push(FilterArg::Positional(value.to_string()));
        self
    }

    /// Append a `key=value` argument.
    pub fn named(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.args
            .push(FilterArg::Named(key.into(), value.to_string()));
        self
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            f.write_str(if i == 0 { "=" } else { ":" })?;
            match arg {
                FilterArg::Positional(value) => f.write_str(&quote_value(value))?,
                FilterArg::Named(key, value) => write!(f, "{key}={}", quote_value(value))?,
            }
        }
        Ok(())
    }
}

/// Quote a filter argument when it contains graph metacharacters.
pub fn quote_value(value: &str) -> String {
    let needs_quotes = value
        .chars()
        .any(|c| matches!(c, ':' | ',' | ';' | '[' | ']' | '\'' | '\\') || c.is_whitespace());
    if needs_quotes {
        format!("'{}'", value.replace('\'', r"'\''"))
    } else {
        value.to_string()
    }
}

impl Chain {
    pub fn new(inputs: Vec<Pad>) -> Self {
        Self {
            inputs,
            filters: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn output(mut self, pad: Pad) -> Self {
        self.outputs.push(pad);
        self
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pad in &self.inputs {
            write!(f, "{pad}")?;
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{filter}")?;
        }
        for pad in &self.outputs {
            write!(f, "{pad}")?;
        }
        Ok(())
    }
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chain: Chain) {
        self.chains.push(chain);
    }

    /// Labels produced by some chain and never consumed: the graph's sinks.
    pub fn sink_labels(&self) -> Vec<String> {
        let consumed: HashSet<&str> = self
            .chains
            .iter()
            .flat_map(|c| &c.inputs)
            .filter_map(|pad| match pad {
                Pad::Label(name) => Some(name.as_str()),
                Pad::Stream { .. } => None,
            })
            .collect();

        self.chains
            .iter()
            .flat_map(|c| &c.outputs)
            .filter_map(|pad| match pad {
                Pad::Label(name) if !consumed.contains(name.as_str()) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Check that every label is produced exactly once, before it is
    /// consumed, and consumed at most once.
    pub fn validate(&self) -> ShortsmithResult<()> {
        let mut produced: HashSet<&str> = HashSet::new();
        let mut consumed: HashSet<&str> = HashSet::new();

        for chain in &self.chains {
            if chain.filters.is_empty() {
                return Err(ShortsmithError::render("Filter chain has no filters"));
            }
            for pad in &chain.inputs {
                if let Pad::Label(name) = pad {
                    if !produced.contains(name.as_str()) {
                        return Err(ShortsmithError::render(format!(
                            "Filter graph label [{name}] consumed before it is produced"
                        )));
                    }
                    if !consumed.insert(name.as_str()) {
                        return Err(ShortsmithError::render(format!(
                            "Filter graph label [{name}] consumed twice"
                        )));
                    }
                }
            }
            for pad in &chain.outputs {
                match pad {
                    Pad::Label(name) => {
                        if !produced.insert(name.as_str()) {
                            return Err(ShortsmithError::render(format!(
                                "Filter graph label [{name}] produced twice"
                            )));
                        }
                    }
                    Pad::Stream { .. } => {
                        return Err(ShortsmithError::render(
                            "Filter chain outputs must be labels",
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Serialize to ffmpeg's `-filter_complex` syntax.
    pub fn to_filter_complex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chain) in self.chains.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{chain}")?;
        }
        Ok(())
    }
}
