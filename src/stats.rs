use std::cmp::Ordering;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use ahash::AHashMap as HashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ProfileError, Result};

/// Identifies an instrumented call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FuncKey {
    pub file: String,
    pub line: u32,
    pub name: String,
}

impl FuncKey {
    pub fn new(file: impl Into<String>, line: u32, name: impl Into<String>) -> Self {
        FuncKey { file: file.into(), line, name: name.into() }
    }
}

impl fmt::Display for FuncKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}({})", self.file, self.line, self.name)
    }
}

/// Per call-site measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FuncStat {
    /// Every call, recursive ones included.
    pub ncalls: u64,
    /// Calls that were not already on the stack.
    pub pcalls: u64,
    /// Time spent in the site itself, excluding instrumented callees.
    pub tottime: Duration,
    /// Time spent in the site and its callees.
    pub cumtime: Duration,
}

impl FuncStat {
    fn merge(&mut self, other: &FuncStat) {
        self.ncalls += other.ncalls;
        self.pcalls += other.pcalls;
        self.tottime += other.tottime;
        self.cumtime += other.cumtime;
    }
}

/// Ordering criterion for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Calls,
    Cumulative,
    Filename,
    Line,
    Name,
    Nfl,
    PrimitiveCalls,
    StdName,
    Time,
}

impl SortKey {
    const KEYWORDS: [(&'static str, SortKey); 14] = [
        ("calls", SortKey::Calls),
        ("cumulative", SortKey::Cumulative),
        ("cumtime", SortKey::Cumulative),
        ("file", SortKey::Filename),
        ("filename", SortKey::Filename),
        ("line", SortKey::Line),
        ("module", SortKey::Filename),
        ("name", SortKey::Name),
        ("ncalls", SortKey::Calls),
        ("nfl", SortKey::Nfl),
        ("pcalls", SortKey::PrimitiveCalls),
        ("stdname", SortKey::StdName),
        ("time", SortKey::Time),
        ("tottime", SortKey::Time),
    ];

    pub fn description(self) -> &'static str {
        match self {
            SortKey::Calls => "call count",
            SortKey::Cumulative => "cumulative time",
            SortKey::Filename => "file name",
            SortKey::Line => "line number",
            SortKey::Name => "function name",
            SortKey::Nfl => "name/file/line",
            SortKey::PrimitiveCalls => "primitive call count",
            SortKey::StdName => "standard name",
            SortKey::Time => "internal time",
        }
    }

    fn compare(self, a: &(FuncKey, FuncStat), b: &(FuncKey, FuncStat)) -> Ordering {
        let ((ka, sa), (kb, sb)) = (a, b);
        match self {
            SortKey::Calls => sb.ncalls.cmp(&sa.ncalls),
            SortKey::Cumulative => sb.cumtime.cmp(&sa.cumtime),
            SortKey::Filename => ka.file.cmp(&kb.file),
            SortKey::Line => ka.line.cmp(&kb.line),
            SortKey::Name => ka.name.cmp(&kb.name),
            SortKey::Nfl => (&ka.name, &ka.file, ka.line).cmp(&(&kb.name, &kb.file, kb.line)),
            SortKey::PrimitiveCalls => sb.pcalls.cmp(&sa.pcalls),
            SortKey::StdName => ka.to_string().cmp(&kb.to_string()),
            SortKey::Time => sb.tottime.cmp(&sa.tottime),
        }
    }
}

impl FromStr for SortKey {
    type Err = ProfileError;

    /// Accepts a full keyword or any prefix that selects a single criterion.
    fn from_str(s: &str) -> Result<SortKey> {
        if let Some(&(_, key)) = Self::KEYWORDS.iter().find(|(word, _)| *word == s) {
            return Ok(key);
        }
        let matched: Vec<SortKey> = Self::KEYWORDS
            .iter()
            .filter(|(word, _)| !s.is_empty() && word.starts_with(s))
            .map(|&(_, key)| key)
            .collect();
        match matched.split_first() {
            Some((&first, rest)) if rest.iter().all(|&k| k == first) => Ok(first),
            _ => Err(ProfileError::UnknownSortKey(s.to_string())),
        }
    }
}

/// Limits applied, in order, to the rows of a printed report.
#[derive(Debug, Clone, PartialEq)]
pub enum Restriction {
    /// Keep the first `n` rows.
    Count(usize),
    /// Keep a leading fraction of the rows; only `0.0 <= f < 1.0` has an effect.
    Fraction(f64),
    /// Keep rows whose `file:line(name)` matches the regex.
    Pattern(String),
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Restriction::Count(n) => write!(f, "{n}"),
            Restriction::Fraction(x) => write!(f, "{x}"),
            Restriction::Pattern(p) => write!(f, "'{p}'"),
        }
    }
}

/// Table of call-site statistics captured by a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    entries: Vec<(FuncKey, FuncStat)>,
    #[serde(skip)]
    sort_keys: Vec<SortKey>,
}

impl Stats {
    pub fn from_entries(entries: Vec<(FuncKey, FuncStat)>) -> Self {
        Stats { entries, sort_keys: Vec::new() }
    }

    pub fn entries(&self) -> &[(FuncKey, FuncStat)] {
        &self.entries
    }

    pub fn total_calls(&self) -> u64 {
        self.entries.iter().map(|(_, s)| s.ncalls).sum()
    }

    pub fn primitive_calls(&self) -> u64 {
        self.entries.iter().map(|(_, s)| s.pcalls).sum()
    }

    /// Sum of internal times, i.e. the wall time covered by the outermost scopes.
    pub fn total_time(&self) -> Duration {
        self.entries.iter().map(|(_, s)| s.tottime).sum()
    }

    /// Write the raw table to `path`, replacing it atomically.
    pub fn dump(&self, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;
        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(&temp);
            bincode::serialize_into(&mut writer, self)?;
            writer.flush()?;
        }
        temp.persist(path).map_err(|e| e.error)?;
        debug!(path = %path.display(), sites = self.entries.len(), "dumped raw profile statistics");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Stats> {
        let reader = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(reader)?)
    }

    /// Drop directory components from file names, merging sites that collide.
    pub fn strip_dirs(&mut self) -> &mut Self {
        let mut index: HashMap<FuncKey, usize> = HashMap::new();
        let mut merged: Vec<(FuncKey, FuncStat)> = Vec::with_capacity(self.entries.len());
        for (key, stat) in self.entries.drain(..) {
            let file = Path::new(&key.file)
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or(key.file);
            let key = FuncKey { file, ..key };
            match index.get(&key) {
                Some(&i) => merged[i].1.merge(&stat),
                None => {
                    index.insert(key.clone(), merged.len());
                    merged.push((key, stat));
                }
            }
        }
        self.entries = merged;
        self
    }

    /// Stable sort by a composite of criteria. An empty list restores no
    /// particular order and leaves rows as they are.
    pub fn sort_stats<S: AsRef<str>>(&mut self, keys: &[S]) -> Result<&mut Self> {
        let keys = keys
            .iter()
            .map(|k| k.as_ref().parse::<SortKey>())
            .collect::<Result<Vec<_>>>()?;
        if !keys.is_empty() {
            self.entries.sort_by(|a, b| {
                keys.iter()
                    .map(|k| k.compare(a, b))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }
        self.sort_keys = keys;
        Ok(self)
    }

    fn select_rows(&self, restrictions: &[Restriction]) -> Result<(Vec<&(FuncKey, FuncStat)>, Vec<String>)> {
        let mut rows: Vec<&(FuncKey, FuncStat)> = self.entries.iter().collect();
        let mut notes = Vec::new();
        for r in restrictions {
            let before = rows.len();
            match r {
                Restriction::Count(n) => rows.truncate(*n),
                Restriction::Fraction(x) if (0.0..1.0).contains(x) => {
                    let keep = (before as f64 * x + 0.5) as usize;
                    rows.truncate(keep);
                }
                Restriction::Fraction(_) => {}
                Restriction::Pattern(p) => {
                    let re = Regex::new(p).map_err(|e| ProfileError::InvalidRestriction(e.to_string()))?;
                    rows.retain(|(k, _)| re.is_match(&k.to_string()));
                }
            }
            if rows.len() != before {
                notes.push(format!("   List reduced from {} to {} due to restriction <{}>", before, rows.len(), r));
            }
        }
        Ok((rows, notes))
    }

    /// Write a human-readable report of the (sorted) table.
    pub fn print_stats<W: Write>(&self, w: &mut W, restrictions: &[Restriction]) -> Result<()> {
        let (rows, notes) = self.select_rows(restrictions)?;

        let calls = self.total_calls();
        let prims = self.primitive_calls();
        write!(w, "{:>9}{} function calls", "", calls)?;
        if calls != prims {
            write!(w, " ({prims} primitive calls)")?;
        }
        writeln!(w, " in {:.3} seconds", self.total_time().as_secs_f64())?;
        writeln!(w)?;

        if self.sort_keys.is_empty() {
            writeln!(w, "   Random listing order was used")?;
        } else {
            let order: Vec<&str> = self.sort_keys.iter().map(|k| k.description()).collect();
            writeln!(w, "   Ordered by: {}", order.join(", "))?;
        }
        for note in &notes {
            writeln!(w, "{note}")?;
        }
        writeln!(w)?;

        if !rows.is_empty() {
            writeln!(w, "   ncalls  tottime  percall  cumtime  percall filename:lineno(function)")?;
            for (key, stat) in rows {
                print_line(w, key, stat)?;
            }
        }
        writeln!(w)?;
        writeln!(w)?;
        Ok(())
    }
}

fn per_call(total: Duration, calls: u64) -> String {
    if calls == 0 {
        " ".repeat(8)
    } else {
        format!("{:8.3}", total.as_secs_f64() / calls as f64)
    }
}

fn print_line<W: Write>(w: &mut W, key: &FuncKey, stat: &FuncStat) -> io::Result<()> {
    let calls = if stat.ncalls == stat.pcalls {
        stat.ncalls.to_string()
    } else {
        format!("{}/{}", stat.ncalls, stat.pcalls)
    };
    writeln!(
        w,
        "{:>9} {:8.3} {} {:8.3} {} {}",
        calls,
        stat.tottime.as_secs_f64(),
        per_call(stat.tottime, stat.ncalls),
        stat.cumtime.as_secs_f64(),
        per_call(stat.cumtime, stat.pcalls),
        key
    )
}
