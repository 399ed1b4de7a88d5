//! Wrap a callable in a profiling session and write a sorted report of what
//! it did to a file.
//!
//! Each call enables a [`Session`], runs the callable as the root entry,
//! dumps the raw [`Stats`] to the output path, reloads them from there and
//! overwrites the same path with the formatted report. The callable's own
//! return value is handed back untouched.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::panic::Location;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::session::{self, Session};
use crate::stats::{Restriction, Stats};

/// Report settings for a [`Profile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Report destination. `None` writes `<name>.prof` in the working directory.
    pub output_file: Option<PathBuf>,
    /// Sort criteria, applied in order.
    pub sort_by: Vec<String>,
    /// Keep only this many rows. `None` prints all of them.
    pub lines_to_print: Option<usize>,
    /// Show file names without their directories.
    pub strip_dirs: bool,
    /// Regex a row's `file:line(name)` must match to be printed.
    pub filter: Option<String>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        ProfileConfig {
            output_file: None,
            sort_by: vec!["cumulative".to_string()],
            lines_to_print: None,
            strip_dirs: false,
            filter: None,
        }
    }
}

impl ProfileConfig {
    fn restrictions(&self) -> Vec<Restriction> {
        let mut out = Vec::new();
        if let Some(pattern) = &self.filter {
            out.push(Restriction::Pattern(pattern.clone()));
        }
        if let Some(n) = self.lines_to_print {
            out.push(Restriction::Count(n));
        }
        out
    }
}

/// A named, configured profiler for one callable.
#[derive(Debug, Clone)]
pub struct Profile {
    name: &'static str,
    location: &'static Location<'static>,
    config: ProfileConfig,
}

impl Profile {
    /// The caller's location is reported as the root call site.
    #[track_caller]
    pub fn new(name: &'static str) -> Self {
        Self::with_config(name, ProfileConfig::default())
    }

    #[track_caller]
    pub fn with_config(name: &'static str, config: ProfileConfig) -> Self {
        Profile { name, location: Location::caller(), config }
    }

    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_file = Some(path.into());
        self
    }

    pub fn sort_by(mut self, key: impl Into<String>) -> Self {
        self.config.sort_by = vec![key.into()];
        self
    }

    pub fn sort_by_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.sort_by = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn lines_to_print(mut self, n: usize) -> Self {
        self.config.lines_to_print = Some(n);
        self
    }

    pub fn strip_dirs(mut self, strip: bool) -> Self {
        self.config.strip_dirs = strip;
        self
    }

    pub fn filter(mut self, pattern: impl Into<String>) -> Self {
        self.config.filter = Some(pattern.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    /// Where the report goes. Relative paths are resolved when written.
    pub fn output_path(&self) -> PathBuf {
        self.config
            .output_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.prof", self.name)))
    }

    /// Run `f` under a fresh session and write its report.
    ///
    /// A panic in `f` unwinds through here after the session is discarded.
    /// Fails with [`ProfileError::SessionActive`](crate::ProfileError) when
    /// called from inside another profiled call.
    pub fn call<T>(&self, f: impl FnOnce() -> T) -> Result<T> {
        let session = Session::enable()?;
        let retval = {
            let _root = session::scope_at(self.name, self.location);
            f()
        };
        let stats = session.disable();

        let path = self.output_path();
        stats.dump(&path)?;
        self.write_report(&path)?;
        Ok(retval)
    }

    /// Turn `f` into a function that is profiled on every call. Several
    /// arguments can be passed as a tuple.
    pub fn wrap<A, T, F>(self, f: F) -> impl Fn(A) -> Result<T>
    where
        F: Fn(A) -> T,
    {
        move |arg| self.call(|| f(arg))
    }

    fn write_report(&self, path: &Path) -> Result<()> {
        let mut stats = Stats::load(path)?;
        if self.config.strip_dirs {
            stats.strip_dirs();
        }
        stats.sort_stats(self.config.sort_by.as_slice())?;

        let mut writer = BufWriter::new(File::create(path)?);
        stats.print_stats(&mut writer, &self.config.restrictions())?;
        writer.flush()?;

        info!(
            profile = self.name,
            path = %path.display(),
            calls = stats.total_calls(),
            seconds = stats.total_time().as_secs_f64(),
            "wrote profile report"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_path_is_derived_from_name() {
        let p = Profile::new("product_counter_v1");
        assert_eq!(p.output_path(), PathBuf::from("product_counter_v1.prof"));
        let p = p.output_file("out/custom.txt");
        assert_eq!(p.output_path(), PathBuf::from("out/custom.txt"));
    }

    #[test]
    fn builder_sets_every_field() {
        let p = Profile::new("f")
            .sort_by_keys(["calls", "name"])
            .lines_to_print(5)
            .strip_dirs(true)
            .filter("core");
        let c = p.config();
        assert_eq!(c.sort_by, vec!["calls".to_string(), "name".to_string()]);
        assert_eq!(c.lines_to_print, Some(5));
        assert!(c.strip_dirs);
        assert_eq!(
            c.restrictions(),
            vec![Restriction::Pattern("core".into()), Restriction::Count(5)]
        );
    }

    #[test]
    fn root_location_is_the_construction_site() {
        let line = line!() + 1;
        let p = Profile::new("here");
        assert_eq!(p.location.line(), line);
        assert_eq!(p.name(), "here");
    }

    #[test]
    fn config_loads_from_json_with_defaults_for_missing_fields() {
        let c: ProfileConfig =
            serde_json::from_str(r#"{"lines_to_print": 10, "strip_dirs": true}"#).unwrap();
        assert_eq!(c.sort_by, vec!["cumulative".to_string()]);
        assert_eq!(c.lines_to_print, Some(10));
        assert!(c.strip_dirs);
        assert_eq!(c.output_file, None);

        let full = ProfileConfig { output_file: Some("r.prof".into()), filter: Some("core".into()), ..c };
        let back: ProfileConfig = serde_json::from_str(&serde_json::to_string(&full).unwrap()).unwrap();
        assert_eq!(back, full);
    }
}
