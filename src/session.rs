// Thread-local profiling session. Instrumented call sites open a `Scope`
// guard; while a `Session` is enabled on the same thread every scope is
// recorded with its call count, internal time and cumulative time. With no
// session enabled a scope costs one thread-local lookup.
use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::panic::Location;
use std::time::{Duration, Instant};

use ahash::AHashMap as HashMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::error::{ProfileError, Result};
use crate::stats::{FuncKey, FuncStat, Stats};

type SiteKey = (&'static str, u32, &'static str);

struct Frame {
    slot: usize,
    start: Instant,
    child: Duration,
    primitive: bool,
}

struct Recorder {
    epoch: u64,
    started: Instant,
    index: HashMap<SiteKey, usize>,
    sites: Vec<(SiteKey, FuncStat)>,
    stack: SmallVec<[Frame; 8]>,
}

impl Recorder {
    fn new(epoch: u64) -> Self {
        Recorder {
            epoch,
            started: Instant::now(),
            index: HashMap::new(),
            sites: Vec::new(),
            stack: SmallVec::new(),
        }
    }

    fn enter(&mut self, site: SiteKey) {
        let slot = match self.index.get(&site) {
            Some(&slot) => slot,
            None => {
                let slot = self.sites.len();
                self.sites.push((site, FuncStat::default()));
                self.index.insert(site, slot);
                slot
            }
        };
        let primitive = !self.stack.iter().any(|f| f.slot == slot);
        self.stack.push(Frame { slot, start: Instant::now(), child: Duration::ZERO, primitive });
    }

    fn exit(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let elapsed = frame.start.elapsed();
        let stat = &mut self.sites[frame.slot].1;
        stat.ncalls += 1;
        stat.tottime += elapsed.saturating_sub(frame.child);
        if frame.primitive {
            stat.pcalls += 1;
            stat.cumtime += elapsed;
        }
        if let Some(parent) = self.stack.last_mut() {
            parent.child += elapsed;
        }
    }

    fn into_stats(self) -> Stats {
        let entries = self
            .sites
            .into_iter()
            .map(|((file, line, name), stat)| (FuncKey::new(file, line, name), stat))
            .collect();
        Stats::from_entries(entries)
    }
}

thread_local! {
    static RECORDER: RefCell<Option<Recorder>> = const { RefCell::new(None) };
    static EPOCH: Cell<u64> = const { Cell::new(0) };
}

/// Whether a session is currently recording on this thread.
pub fn is_active() -> bool {
    RECORDER.with(|r| r.borrow().is_some())
}

/// An enabled profiling session. Only one may exist per thread; nesting is
/// rejected with [`ProfileError::SessionActive`].
pub struct Session {
    epoch: u64,
    disabled: bool,
    _thread_bound: PhantomData<*const ()>,
}

impl Session {
    pub fn enable() -> Result<Session> {
        let epoch = EPOCH.with(|e| {
            let next = e.get().wrapping_add(1);
            e.set(next);
            next
        });
        RECORDER.with(|r| {
            let mut slot = r.borrow_mut();
            if slot.is_some() {
                return Err(ProfileError::SessionActive);
            }
            *slot = Some(Recorder::new(epoch));
            Ok(())
        })?;
        debug!(epoch, "profiling session enabled");
        Ok(Session { epoch, disabled: false, _thread_bound: PhantomData })
    }

    /// Stop recording and hand back everything measured.
    pub fn disable(mut self) -> Stats {
        self.disabled = true;
        let recorder = RECORDER.with(|r| r.borrow_mut().take());
        match recorder {
            Some(rec) if rec.epoch == self.epoch => {
                if !rec.stack.is_empty() {
                    warn!(open = rec.stack.len(), "session disabled with scopes still open");
                }
                debug!(epoch = self.epoch, elapsed = ?rec.started.elapsed(), sites = rec.sites.len(), "profiling session disabled");
                rec.into_stats()
            }
            _ => Stats::default(),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.disabled {
            return;
        }
        // Reached when the profiled code unwinds; throw the partial data away.
        let _ = RECORDER.try_with(|r| {
            if let Ok(mut slot) = r.try_borrow_mut() {
                if slot.as_ref().is_some_and(|rec| rec.epoch == self.epoch) {
                    *slot = None;
                    debug!(epoch = self.epoch, "profiling session discarded");
                }
            }
        });
    }
}

/// Guard recording one call of an instrumented site. Created by [`scope`].
#[must_use = "a scope records nothing unless it is held for the duration of the call"]
pub struct Scope {
    epoch: Option<u64>,
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for Scope {
    fn drop(&mut self) {
        let Some(epoch) = self.epoch else {
            return;
        };
        let _ = RECORDER.try_with(|r| {
            if let Ok(mut slot) = r.try_borrow_mut() {
                match slot.as_mut() {
                    Some(rec) if rec.epoch == epoch => rec.exit(),
                    _ => warn!(epoch, "dropped a scope that outlived its session"),
                }
            }
        });
    }
}

/// Open a scope for the caller's location under `name`.
#[track_caller]
pub fn scope(name: &'static str) -> Scope {
    scope_at(name, Location::caller())
}

pub(crate) fn scope_at(name: &'static str, location: &'static Location<'static>) -> Scope {
    let epoch = RECORDER.with(|r| {
        let mut slot = r.borrow_mut();
        slot.as_mut().map(|rec| {
            rec.enter((location.file(), location.line(), name));
            rec.epoch
        })
    });
    Scope { epoch, _thread_bound: PhantomData }
}

/// Run `f` inside a scope named `name`.
#[track_caller]
pub fn record<T>(name: &'static str, f: impl FnOnce() -> T) -> T {
    let _scope = scope(name);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn leaf() {
        let _s = scope("leaf");
        sleep(Duration::from_millis(2));
    }

    fn recurse(depth: u32) {
        let _s = scope("recurse");
        if depth > 0 {
            recurse(depth - 1);
        }
    }

    fn stat_for<'a>(stats: &'a Stats, name: &str) -> &'a FuncStat {
        &stats.entries().iter().find(|(k, _)| k.name == name).unwrap().1
    }

    #[test]
    fn scopes_without_session_are_noops() {
        assert!(!is_active());
        leaf();
        let session = Session::enable().unwrap();
        let stats = session.disable();
        assert!(stats.entries().is_empty());
    }

    #[test]
    fn nested_scopes_split_internal_and_cumulative_time() {
        let session = Session::enable().unwrap();
        record("outer", || {
            leaf();
            leaf();
        });
        let stats = session.disable();
        assert!(!is_active());

        let outer = stat_for(&stats, "outer");
        let inner = stat_for(&stats, "leaf");
        assert_eq!(outer.ncalls, 1);
        assert_eq!(inner.ncalls, 2);
        assert!(outer.cumtime >= inner.cumtime);
        assert!(outer.tottime < outer.cumtime);
        assert!(inner.cumtime >= Duration::from_millis(4));
    }

    #[test]
    fn recursion_counts_primitive_calls_once() {
        let session = Session::enable().unwrap();
        recurse(3);
        let stats = session.disable();
        let r = stat_for(&stats, "recurse");
        assert_eq!(r.ncalls, 4);
        assert_eq!(r.pcalls, 1);
        assert_eq!(stats.total_calls(), 4);
        assert_eq!(stats.primitive_calls(), 1);
    }

    #[test]
    fn second_session_on_same_thread_is_rejected() {
        let first = Session::enable().unwrap();
        assert!(matches!(Session::enable(), Err(ProfileError::SessionActive)));
        drop(first);
        assert!(!is_active());
        Session::enable().unwrap().disable();
    }

    #[test]
    fn guard_outliving_its_session_is_ignored() {
        let session = Session::enable().unwrap();
        let stale = scope("stale");
        session.disable();

        let next = Session::enable().unwrap();
        drop(stale);
        record("fresh", || {});
        let stats = next.disable();
        assert_eq!(stats.entries().len(), 1);
        assert_eq!(stats.entries()[0].0.name, "fresh");
    }

    #[test]
    fn call_site_location_is_recorded() {
        let session = Session::enable().unwrap();
        let line = line!() + 1;
        let s = scope("here");
        drop(s);
        let stats = session.disable();
        let (key, _) = &stats.entries()[0];
        assert_eq!(key.line, line);
        assert!(key.file.ends_with("session.rs"));
    }
}
