use log::warn;
use parking_lot::Mutex;
use std::{collections::{HashMap, VecDeque}, time::Duration};

pub static STATISTICS: Mutex<Option<Statistic>> = Mutex::new(None);

const HISTORY_LENGTH: usize = 100;

/// Starts collecting statistics for a named session.
pub fn init_statistics(session: &'static str) {
    let mut statistics = STATISTICS.lock();
    if let Some(current) = statistics.as_ref() {
        warn!("Statistics already initialized for session \"{}\"", current.session);
    } else {
        *statistics = Some(Statistic {
            session,
            map: HashMap::new(),
        });
    }
}

/// Returns a summary of every recorded scope, most expensive (by total time) first.
/// - Empty when statistics were not initialized.
pub fn report() -> Vec<ScopeReport> {
    let statistics = STATISTICS.lock();
    let Some(current) = statistics.as_ref() else {
        return vec![];
    };

    let mut reports: Vec<ScopeReport> = current.map.iter()
        .map(|(name, record)| ScopeReport {
            name:    *name,
            pinned:  record.pinned,
            count:   record.count,
            total:   record.total_time,
            average: record.average(),
            min:     record.min_time,
            max:     record.max_time,
            latest:  record.latest(),
        })
        .collect();
    reports.sort_by(|a, b| b.total.cmp(&a.total));
    reports
}

#[derive(Debug, Clone)]
pub struct ScopeReport {
    pub name:    &'static str,
    pub pinned:  bool,
    pub count:   u32,
    pub total:   Duration,
    pub average: Duration,
    pub min:     Duration,
    pub max:     Duration,
    pub latest:  Duration,
}

pub struct Statistic {
    session: &'static str,
    map: HashMap<&'static str, StatisticRecord>,
}

#[derive(Clone, Debug)]
pub struct StatisticRecord {
    pub pinned: bool,
    pub count: u32,
    pub total_time: Duration,
    pub max_time: Duration,
    pub min_time: Duration,
    history: VecDeque<Duration>,
}

impl StatisticRecord {
    pub fn new(pinned: bool) -> Self {
        StatisticRecord {
            count: 0,
            pinned,
            total_time: Duration::ZERO,
            max_time: Duration::ZERO,
            min_time: Duration::MAX,
            history: VecDeque::with_capacity(HISTORY_LENGTH),
        }
    }

    pub fn add(&mut self, duration: Duration) {
        self.count += 1;
        self.total_time += duration;
        self.max_time = self.max_time.max(duration);
        self.min_time = self.min_time.min(duration);
        if self.history.len() == HISTORY_LENGTH {
            self.history.pop_front();
        }
        self.history.push_back(duration);
    }

    pub fn average(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        self.total_time / self.count
    }

    pub fn history(&self) -> impl Iterator<Item = &Duration> {
        self.history.iter()
    }

    pub fn latest(&self) -> Duration {
        self.history.back().copied().unwrap_or(Duration::ZERO)
    }
}

/// This is a guard that will be created when a scope is entered and on drop it will enter the measured time into the statistic.
pub struct TimedScope {
    name: &'static str,
    start: std::time::Instant,
    pinned: bool,
}

impl TimedScope {
    pub fn new(name: &'static str, pinned: bool) -> Self {
        TimedScope {
            name,
            start: std::time::Instant::now(),
            pinned,
        }
    }
}

impl Drop for TimedScope {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let mut statistics = STATISTICS.lock();
        if let Some(current) = statistics.as_mut() {
            let record = current.map.entry(self.name)
                .or_insert_with(|| StatisticRecord::new(self.pinned));
            record.add(duration);
        }
    }
}
