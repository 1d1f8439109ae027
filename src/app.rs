//! Session state for the interactive board.
//!
//! One owner thread applies [`AppEvent`]s; the clock ticker and fetch workers
//! only ever send events, they never touch the state directly.

use crate::error::{AppError, FetchError};
use crate::line::BusLine;
use crate::schedule::{self, DepartureBoard};
use chrono::Weekday;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Home,
    Lines,
    Schedule,
    About,
}

impl View {
    pub fn title(self) -> &'static str {
        match self {
            View::Home => "Início",
            View::Lines => "Linhas",
            View::Schedule => "Horários",
            View::About => "Sobre",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Failed(FetchError),
    Ready,
}

#[derive(Debug)]
pub enum AppEvent {
    LinesFetched {
        generation: u64,
        result: Result<Vec<BusLine>, FetchError>,
    },
    Tick(u32),
}

/// Period and clock state of the timetable page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleView {
    line_id: Option<String>,
    period: Option<String>,
    now: u32,
}

impl ScheduleView {
    pub fn new(now: u32) -> Self {
        Self {
            line_id: None,
            period: None,
            now,
        }
    }

    /// Track `line`; a different line resets the period to today's default.
    pub fn sync_line(&mut self, line: &BusLine, today: Weekday) {
        if self.line_id.as_deref() == Some(line.id.as_str()) {
            return;
        }
        self.line_id = Some(line.id.clone());
        self.period = schedule::select_default_period(line.periods(), today).map(str::to_owned);
        debug!(line = %line.id, period = ?self.period, "Period reset for line");
    }

    pub fn clear(&mut self) {
        self.line_id = None;
        self.period = None;
    }

    pub fn select_period(&mut self, line: &BusLine, label: &str) -> bool {
        if !line.schedules.contains_key(label) {
            return false;
        }
        self.period = Some(label.to_owned());
        true
    }

    pub fn period(&self) -> Option<&str> {
        self.period.as_deref()
    }

    pub fn now(&self) -> u32 {
        self.now
    }

    pub fn set_now(&mut self, now: u32) {
        self.now = now % schedule::MINUTES_PER_DAY;
    }

    pub fn board<'a>(&self, line: &'a BusLine) -> DepartureBoard<'a> {
        match self.period.as_deref() {
            Some(period) => DepartureBoard::resolve(line.rows(period), self.now),
            None => DepartureBoard::NoService,
        }
    }
}

pub struct App {
    view: View,
    load: LoadState,
    lines: Vec<BusLine>,
    selected: Option<String>,
    generation: u64,
    today: Weekday,
    schedule: ScheduleView,
}

impl App {
    pub fn new(now: u32, today: Weekday) -> Self {
        Self {
            view: View::default(),
            load: LoadState::Loading,
            lines: Vec::new(),
            selected: None,
            generation: 0,
            today,
            schedule: ScheduleView::new(now),
        }
    }

    /// Start a fresh fetch (initial load or retry). Results tagged with any
    /// older generation are ignored from now on.
    pub fn begin_fetch(&mut self) -> u64 {
        self.generation += 1;
        self.load = LoadState::Loading;
        self.generation
    }

    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::LinesFetched { generation, result } => {
                if generation != self.generation {
                    warn!(generation, current = self.generation, "Ignoring stale fetch result");
                    return;
                }
                match result {
                    Ok(lines) => {
                        info!(count = lines.len(), "Lines loaded");
                        self.lines = lines;
                        let still_there = self
                            .selected
                            .as_ref()
                            .is_some_and(|id| self.lines.iter().any(|l| &l.id == id));
                        if !still_there {
                            self.selected = self.lines.first().map(|l| l.id.clone());
                        }
                        self.load = LoadState::Ready;
                        self.sync_schedule();
                    }
                    Err(e) => {
                        warn!("Fetch failed: {}", e);
                        self.lines.clear();
                        self.selected = None;
                        self.schedule.clear();
                        self.load = LoadState::Failed(e);
                    }
                }
            }
            AppEvent::Tick(now) => self.schedule.set_now(now),
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn navigate(&mut self, view: View) {
        self.view = view;
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn lines(&self) -> &[BusLine] {
        &self.lines
    }

    pub fn today(&self) -> Weekday {
        self.today
    }

    pub fn set_today(&mut self, today: Weekday) {
        self.today = today;
    }

    pub fn schedule(&self) -> &ScheduleView {
        &self.schedule
    }

    /// The selected line, or the first one when nothing valid is selected.
    pub fn current_line(&self) -> Result<&BusLine, AppError> {
        self.selected
            .as_ref()
            .and_then(|id| self.lines.iter().find(|l| &l.id == id))
            .or_else(|| self.lines.first())
            .ok_or(AppError::NoLineAvailable)
    }

    /// Pick a line from the schedule page selector. Any known line is allowed.
    pub fn choose_line(&mut self, id: &str) -> Result<(), AppError> {
        if self.load != LoadState::Ready {
            return Err(AppError::NotLoaded);
        }
        if !self.lines.iter().any(|l| l.id == id) {
            return Err(AppError::UnknownLine(id.to_string()));
        }
        self.selected = Some(id.to_string());
        self.sync_schedule();
        Ok(())
    }

    /// Open a line from the lines list; suspended lines can't be opened.
    pub fn open_line(&mut self, id: &str) -> Result<(), AppError> {
        let line = self
            .lines
            .iter()
            .find(|l| l.id == id)
            .ok_or_else(|| AppError::UnknownLine(id.to_string()))?;
        if !line.is_selectable() {
            return Err(AppError::LineSuspended(line.number.clone()));
        }
        self.choose_line(id)?;
        self.navigate(View::Schedule);
        Ok(())
    }

    pub fn select_period(&mut self, label: &str) -> Result<bool, AppError> {
        let line = self
            .selected
            .as_ref()
            .and_then(|id| self.lines.iter().find(|l| &l.id == id))
            .or_else(|| self.lines.first())
            .ok_or(AppError::NoLineAvailable)?;
        Ok(self.schedule.select_period(line, label))
    }

    /// Like [`App::select_period`], but a label the line lacks is an error.
    pub fn choose_period(&mut self, label: &str) -> Result<(), AppError> {
        if self.select_period(label)? {
            Ok(())
        } else {
            Err(AppError::UnknownPeriod(label.to_string()))
        }
    }

    pub fn board(&self) -> Result<(&BusLine, DepartureBoard<'_>), AppError> {
        let line = self.current_line()?;
        Ok((line, self.schedule.board(line)))
    }

    fn sync_schedule(&mut self) {
        let today = self.today;
        let line = self
            .selected
            .as_ref()
            .and_then(|id| self.lines.iter().find(|l| &l.id == id))
            .or_else(|| self.lines.first());
        match line {
            Some(line) => self.schedule.sync_line(line, today),
            None => self.schedule.clear(),
        }
    }
}
