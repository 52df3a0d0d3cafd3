//! Full-pipeline runs through the testbench and simulated interconnect.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::cast_possible_truncation,
    clippy::too_many_lines
)]

use addrprobe_core::{
    timing_profile, AddressingMode, BusDiscipline, DataFault, EngineConfig, NullSink,
    RecordingSink, SessionParams, StageId, Termination, Testbench, TraceEvent, DEFAULT_STEP_LIMIT,
    HIGH_REGION_SEED, LOW_REGION_SEED, TIMING_PROFILES,
};
use log as _;
use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

fn config(discipline: BusDiscipline, mode: AddressingMode) -> EngineConfig {
    EngineConfig {
        addressing: Some(mode),
        quiescent_cycles: 2,
        ..EngineConfig::for_discipline(discipline)
    }
}

#[test]
fn reference_run_fills_both_regions_and_passes() {
    let mut bench = Testbench::new(&EngineConfig::default()).expect("default config is valid");
    let report = bench
        .run(DEFAULT_STEP_LIMIT, &mut NullSink)
        .expect("reference run terminates");

    assert!(report.passed(), "{report:?}");
    assert_eq!(report.counters.writes, 128);
    assert_eq!(report.counters.reads, 128);
    assert_eq!(report.counters.mismatches, 0);

    let memory = bench.interconnect().memory();
    assert_eq!(memory.peek(0x4_0000_0000), Some(0x1234_5678));
    assert_eq!(memory.peek(0x4_0000_00FC), Some(0x1234_56B7));
    assert_eq!(memory.peek(0x2_0000), Some(0xCAFE_BEBE));
    assert_eq!(memory.peek(0x2_00FC), Some(0xCAFE_BEFD));
}

#[test]
fn word_addressed_low_session_walks_word_indices() {
    let mut bench = Testbench::new(&config(BusDiscipline::UnifiedChannel, AddressingMode::Word))
        .expect("valid");
    let low = *bench.plan().session(StageId::WriterLow);
    assert_eq!(low.initial_address(), 0x8000);
    assert_eq!(low.increment(), 1);
    assert_eq!(low.transfer_count(), 64);
    assert_eq!(low.final_address(), 0x803F);

    let report = bench.run(DEFAULT_STEP_LIMIT, &mut NullSink).expect("terminates");
    assert!(report.passed());

    let memory = bench.interconnect().memory();
    for (index, (address, value)) in low.expected_words().enumerate() {
        assert_eq!(address, 0x8000 + index as u64);
        assert_eq!(memory.peek(0x2_0000 + 4 * index as u64), Some(value));
    }
    assert_eq!(low.expected_words().last(), Some((0x803F, 0xCAFE_BEFD)));
}

#[rstest]
fn round_trip_never_latches(
    #[values(BusDiscipline::SplitChannel, BusDiscipline::UnifiedChannel)] discipline: BusDiscipline,
    #[values(AddressingMode::Byte, AddressingMode::Word)] mode: AddressingMode,
) {
    let mut bench = Testbench::new(&config(discipline, mode)).expect("valid");
    let report = bench.run(DEFAULT_STEP_LIMIT, &mut NullSink).expect("terminates");

    assert_eq!(report.termination, Termination::Completed);
    assert!(report.faults.is_empty());
    for stage in StageId::CHECKERS {
        assert!(!bench.orchestrator().checker(stage).latch().is_set());
    }
}

#[rstest]
fn every_timing_profile_passes(
    #[values(BusDiscipline::SplitChannel, BusDiscipline::UnifiedChannel)] discipline: BusDiscipline,
) {
    for (name, _) in TIMING_PROFILES {
        let config = EngineConfig {
            timing: timing_profile(name).expect("listed profile"),
            max_length: 0x40,
            ..config(discipline, discipline.default_addressing())
        };
        let mut bench = Testbench::new(&config).expect("valid");
        let report = bench.run(DEFAULT_STEP_LIMIT, &mut NullSink).expect("terminates");
        assert!(report.passed(), "{name}: {report:?}");
        assert_eq!(report.counters.reads, 32, "{name}");
    }
}

#[test]
fn single_corrupted_word_is_latched_and_times_out_one_window_later() {
    let config = EngineConfig::default();
    let mut bench = Testbench::new(&config).expect("valid");
    bench.schedule_corruption(0x4_0000_0000, 0x1234_5679);

    let mut sink = RecordingSink::default();
    let report = bench.run(DEFAULT_STEP_LIMIT, &mut sink).expect("terminates");

    let fault = DataFault {
        address: 0x4_0000_0000,
        expected: 0x1234_5678,
        observed: 0x1234_5679,
    };
    assert_eq!(
        report.termination,
        Termination::WatchdogTimeout {
            stage: StageId::CheckerHigh,
            fault,
        }
    );
    assert_eq!(report.faults.len(), 1);
    assert_eq!(report.faults[0].fault, fault);
    assert_eq!(report.counters.mismatches, 1);

    let armed_at = bench.watchdog().armed_at().expect("watchdog armed");
    assert_eq!(report.cycles, armed_at + config.watchdog_window);
    assert_eq!(bench.watchdog().deadline(), Some(report.cycles));

    let diagnostics: Vec<String> = sink
        .events()
        .iter()
        .filter_map(|event| match event {
            TraceEvent::DataError(record) => Some(record.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(
        diagnostics,
        ["[Checker High] Data Error @ 0x0000000400000000: 0x12345678 vs 0x12345679"]
    );

    let terminations: Vec<_> = sink
        .events()
        .iter()
        .filter(|event| matches!(event, TraceEvent::Terminated { .. }))
        .collect();
    assert_eq!(terminations.len(), 1);
}

#[rstest]
#[case(BusDiscipline::SplitChannel, AddressingMode::Byte)]
#[case(BusDiscipline::UnifiedChannel, AddressingMode::Word)]
fn truncated_interconnect_is_detected(
    #[case] discipline: BusDiscipline,
    #[case] mode: AddressingMode,
) {
    let config = EngineConfig {
        interconnect_address_bits: 32,
        watchdog_window: 16,
        ..config(discipline, mode)
    };
    let mut bench = Testbench::new(&config).expect("valid");
    let report = bench.run(DEFAULT_STEP_LIMIT, &mut NullSink).expect("terminates");

    assert!(report.termination.is_failure());
    assert_eq!(
        report.faults.first().map(|latched| (latched.stage, latched.fault)),
        Some((
            StageId::CheckerHigh,
            DataFault {
                address: mode.to_bus_address(0x4_0000_0000),
                expected: HIGH_REGION_SEED,
                observed: 0,
            }
        ))
    );
    assert_eq!(bench.interconnect().memory().peek(0x4_0000_0000), Some(0));
}

#[test]
fn stages_run_strictly_in_pipeline_order() {
    let config = EngineConfig {
        max_length: 0x10,
        ..EngineConfig::default()
    };
    let mut bench = Testbench::new(&config).expect("valid");
    let mut sink = RecordingSink::default();
    bench.run(DEFAULT_STEP_LIMIT, &mut sink).expect("terminates");

    let lifecycle: Vec<(StageId, bool)> = sink
        .into_events()
        .into_iter()
        .filter_map(|event| match event {
            TraceEvent::StageStarted { stage } => Some((stage, true)),
            TraceEvent::StageFinished { stage, .. } => Some((stage, false)),
            _ => None,
        })
        .collect();
    let expected: Vec<(StageId, bool)> = StageId::ORDER
        .into_iter()
        .flat_map(|stage| [(stage, true), (stage, false)])
        .collect();
    assert_eq!(lifecycle, expected);
    assert!(bench.orchestrator().ended(StageId::CheckerLow));
}

#[test]
fn verbose_run_reports_every_read_sample() {
    let config = EngineConfig {
        max_length: 0x10,
        verbose: true,
        ..EngineConfig::default()
    };
    let mut bench = Testbench::new(&config).expect("valid");
    let mut sink = RecordingSink::default();
    bench.run(DEFAULT_STEP_LIMIT, &mut sink).expect("terminates");

    let samples: Vec<(StageId, u64, u32)> = sink
        .events()
        .iter()
        .filter_map(|event| match *event {
            TraceEvent::ReadSample {
                stage,
                address,
                observed,
                ..
            } => Some((stage, address, observed)),
            _ => None,
        })
        .collect();
    assert_eq!(samples.len(), 8);
    assert_eq!(samples[0], (StageId::CheckerHigh, 0x4_0000_0000, HIGH_REGION_SEED));
    assert_eq!(samples[4], (StageId::CheckerLow, 0x2_0000, LOW_REGION_SEED));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn property_arbitrary_sessions_round_trip(
        high_word in 0x4000_0000u64..0x3FFF_0000_0000_0000,
        seed in any::<u32>(),
        words in 1u64..=8,
        word_mode in any::<bool>(),
        unified in any::<bool>(),
    ) {
        let mode = if word_mode { AddressingMode::Word } else { AddressingMode::Byte };
        let discipline = if unified {
            BusDiscipline::UnifiedChannel
        } else {
            BusDiscipline::SplitChannel
        };
        let config = EngineConfig {
            high: SessionParams { base_address: high_word * 4, seed },
            max_length: words * 4,
            ..config(discipline, mode)
        };

        let mut bench = Testbench::new(&config).expect("valid");
        let report = bench.run(DEFAULT_STEP_LIMIT, &mut NullSink).expect("terminates");
        prop_assert!(report.passed());
        prop_assert_eq!(report.counters.writes, 2 * words);

        let memory = bench.interconnect().memory();
        for index in 0..words {
            prop_assert_eq!(
                memory.peek(high_word * 4 + index * 4),
                Some(seed.wrapping_add(index as u32))
            );
        }
    }
}
