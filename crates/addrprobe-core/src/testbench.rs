//! Self-contained simulation: pipeline, watchdog and interconnect on one clock.

use crate::memory::WordMemory;
use crate::traffic::{TrafficChecker, TrafficWriter};
use crate::{
    new_adapter, ConfigError, EngineConfig, Interconnect, LatchedFault, Orchestrator, RunCounters,
    RunError, RunReport, SessionPlan, StageId, Termination, TraceEvent, TraceSink, Watchdog,
};

/// Drives one full pipeline pass to its termination.
///
/// Each [`Testbench::step`] is one clock: the orchestrator steps every stage,
/// scheduled corruptions land once writer-low ends, then the watchdog observes
/// the checker latches. The termination signal is asserted on exactly one step.
#[derive(Debug)]
pub struct Testbench {
    config: EngineConfig,
    plan: SessionPlan,
    orchestrator: Orchestrator,
    watchdog: Watchdog,
    interconnect: Interconnect,
    corruptions: Vec<(u64, u32)>,
    cycle: u64,
    termination: Option<Termination>,
}

impl Testbench {
    /// Validates `config` and builds the simulation.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] that prevents the run from starting.
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        let plan = config.validate()?;

        let mut memory = WordMemory::new();
        for region in plan.regions() {
            memory.map(region)?;
        }
        let interconnect = Interconnect::new(memory, config.timing)
            .with_address_bits(config.interconnect_address_bits)?;

        let writer = |stage: StageId| {
            let adapter = new_adapter(
                config.discipline,
                stage.port(),
                plan.mode,
                config.quiescent_cycles,
            );
            TrafficWriter::new(stage, *plan.session(stage), adapter).with_verbose(config.verbose)
        };
        let checker = |stage: StageId| {
            let adapter = new_adapter(config.discipline, stage.port(), plan.mode, 0);
            TrafficChecker::new(stage, *plan.session(stage), adapter).with_verbose(config.verbose)
        };
        let orchestrator = Orchestrator::new(
            [writer(StageId::WriterHigh), writer(StageId::WriterLow)],
            [checker(StageId::CheckerHigh), checker(StageId::CheckerLow)],
        );

        log::debug!(
            "testbench: {} bus, {} addressing, {} transfers per session",
            config.discipline.name(),
            plan.mode.name(),
            plan.high.transfer_count()
        );

        Ok(Self {
            config: *config,
            plan,
            orchestrator,
            watchdog: Watchdog::new(config.watchdog_window, config.address_width)?,
            interconnect,
            corruptions: Vec::new(),
            cycle: 0,
            termination: None,
        })
    }

    /// Overwrites the word at `byte_address` with `value` after both writers
    /// finish and before the first checker starts.
    pub fn schedule_corruption(&mut self, byte_address: u64, value: u32) {
        self.corruptions.push((byte_address, value));
    }

    /// Advances one clock and returns the termination on the step it is asserted.
    ///
    /// Steps after termination do nothing.
    pub fn step(&mut self, sink: &mut dyn TraceSink) -> Option<Termination> {
        if self.termination.is_some() {
            return None;
        }
        self.cycle += 1;

        let completed = self.orchestrator.step(&mut self.interconnect, sink);
        if self.orchestrator.ended(StageId::WriterLow) {
            self.apply_corruptions();
        }

        let latches = self.orchestrator.checker_latches();
        let timed_out = self.watchdog.observe(self.cycle, &latches, sink);
        let termination = timed_out.or_else(|| {
            (completed && !self.watchdog.is_armed()).then_some(Termination::Completed)
        })?;

        self.termination = Some(termination);
        sink.on_event(TraceEvent::Terminated {
            cycle: self.cycle,
            termination,
        });
        Some(termination)
    }

    /// Steps until termination.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::StepLimit`] when `step_limit` steps pass without
    /// termination.
    pub fn run(
        &mut self,
        step_limit: u64,
        sink: &mut dyn TraceSink,
    ) -> Result<RunReport, RunError> {
        while self.termination.is_none() {
            if self.cycle >= step_limit {
                return Err(RunError::StepLimit { limit: step_limit });
            }
            self.step(sink);
        }
        self.report().ok_or(RunError::StepLimit { limit: step_limit })
    }

    /// Report of the terminated run, or `None` while still running.
    #[must_use]
    pub fn report(&self) -> Option<RunReport> {
        let termination = self.termination?;
        let faults = self
            .orchestrator
            .checker_latches()
            .into_iter()
            .filter_map(|(stage, fault)| fault.map(|fault| LatchedFault { stage, fault }))
            .collect();
        Some(RunReport {
            termination,
            cycles: self.cycle,
            faults,
            counters: self.counters(),
        })
    }

    /// Activity counters so far.
    #[must_use]
    pub fn counters(&self) -> RunCounters {
        StageId::ORDER
            .into_iter()
            .map(|stage| {
                if stage.is_checker() {
                    let checker = self.orchestrator.checker(stage);
                    RunCounters {
                        reads: checker.reads(),
                        mismatches: checker.mismatches(),
                        ..RunCounters::default()
                    }
                } else {
                    RunCounters {
                        writes: self.orchestrator.writer(stage).writes(),
                        ..RunCounters::default()
                    }
                }
            })
            .fold(
                RunCounters {
                    cycles: self.cycle,
                    ..RunCounters::default()
                },
                RunCounters::merged,
            )
    }

    /// Steps simulated so far.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Termination, once asserted.
    #[must_use]
    pub const fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// Configuration the testbench was built from.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validated sessions.
    #[must_use]
    pub const fn plan(&self) -> &SessionPlan {
        &self.plan
    }

    /// Pipeline.
    #[must_use]
    pub const fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Watchdog.
    #[must_use]
    pub const fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    /// Interconnect and its memory.
    #[must_use]
    pub const fn interconnect(&self) -> &Interconnect {
        &self.interconnect
    }

    /// Interconnect, mutable for direct memory manipulation.
    pub fn interconnect_mut(&mut self) -> &mut Interconnect {
        &mut self.interconnect
    }

    fn apply_corruptions(&mut self) {
        for (byte_address, value) in self.corruptions.drain(..) {
            if self.interconnect.memory_mut().poke(byte_address, value) {
                log::info!("corrupted word at {byte_address:#x} with {value:#010x}");
            } else {
                log::warn!("corruption target {byte_address:#x} is not mapped");
            }
        }
    }
}
