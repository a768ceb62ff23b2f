//! End-to-end decoding of the bundled management classes.
//!
//! The process fixture is a captured remote-agent response; the performance
//! counter rows are built in memory.

use chrono::{Datelike, Timelike};
use wmiquery_core::{
    classes::{Win32PerfRawDataPerfOsProcessor, Win32PerfRawDataTcpipNetworkInterface, Win32Process},
    create_query, decode, decode_json, Loader, MemoryRow, MemoryRowSource, MismatchMode,
    MismatchReason, QueryError, Value,
};

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn fixture(name: &str) -> Vec<u8> {
    let mut p = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("tests/fixtures");
    p.push(name);
    std::fs::read(&p).unwrap_or_else(|e| panic!("cannot read {}: {e}", p.display()))
}

fn processor(name: &str, idle: u64) -> MemoryRow {
    MemoryRow::new()
        .with("C1TransitionsPerSec", Value::String("1200331".into()))
        .with("C2TransitionsPerSec", Value::String("0".into()))
        .with("C3TransitionsPerSec", Value::String("0".into()))
        .with("Caption", Value::Null)
        .with("DPCRate", 3u32)
        .with("DPCsQueuedPerSec", 88u32)
        .with("Description", Value::Null)
        .with("Frequency_Object", Value::String("0".into()))
        .with("Frequency_PerfTime", Value::String("10000000".into()))
        .with("Frequency_Sys100NS", Value::String("10000000".into()))
        .with("InterruptsPerSec", 402u32)
        .with("Name", name)
        .with("PercentC1Time", Value::String("94812500".into()))
        .with("PercentC2Time", Value::String("0".into()))
        .with("PercentC3Time", Value::String("0".into()))
        .with("PercentDPCTime", Value::String("156250".into()))
        .with("PercentIdleTime", Value::String(idle.to_string()))
        .with("PercentInterruptTime", Value::String("312500".into()))
        .with("PercentPrivilegedTime", Value::String("4843750".into()))
        .with("PercentProcessorTime", Value::String("6250000".into()))
        .with("PercentUserTime", Value::String("1406250".into()))
        .with("Timestamp_Object", Value::String("0".into()))
        .with("Timestamp_PerfTime", Value::String("39371283771".into()))
        .with("Timestamp_Sys100NS", Value::String("133487174125310000".into()))
}

// ─── Win32_Process ────────────────────────────────────────────────────────────

#[test]
fn process_fixture_into_plain_vec() {
    let mut dst: Vec<Win32Process> = Vec::new();
    decode_json::<Win32Process>(&fixture("win32_process.json"), &mut dst).unwrap();
    assert_eq!(dst.len(), 2);

    let idle = &dst[0];
    assert_eq!(idle.name, "System Idle Process");
    assert_eq!(idle.kernel_mode_time, 1_234_567_890_123);
    assert_eq!(idle.command_line.as_deref(), Some(""));
    assert_eq!(idle.thread_count, 8);

    let svc = &dst[1];
    assert_eq!(svc.process_id, 812);
    assert_eq!(svc.parent_process_id, 668);
    assert_eq!(svc.peak_virtual_size, 2_203_467_776_000);
    assert_eq!(
        svc.executable_path.as_deref(),
        Some(r"C:\Windows\system32\svchost.exe")
    );
    assert_eq!(svc.maximum_working_set_size, Some(1380));

    let created = svc.creation_date.unwrap();
    assert_eq!((created.year(), created.month(), created.day()), (2024, 1, 2));
    assert_eq!(created.second(), 17);
    assert_eq!(created.nanosecond(), 254_896_000);
    assert_eq!(created.offset().local_minus_utc(), 3600);
}

#[test]
fn process_fixture_into_boxed_vec() {
    let mut dst: Vec<Box<Win32Process>> = Vec::new();
    decode_json::<Win32Process>(&fixture("win32_process.json"), &mut dst).unwrap();
    assert_eq!(dst.len(), 2);
    assert_eq!(dst[1].handle, "812");
}

#[test]
fn provider_error_is_returned_verbatim() {
    let mut dst: Vec<Win32Process> = Vec::new();
    let err = decode_json::<Win32Process>(
        br#"{"Error":"Invalid namespace","Response":null}"#,
        &mut dst,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Invalid namespace");
    assert!(dst.is_empty());
}

#[test]
fn projection_lists_every_process_property() {
    let query = create_query::<Win32Process>(" WHERE ProcessId = 812");
    assert!(query.starts_with("SELECT CSCreationClassName, CSName, Caption, "));
    assert!(query.ends_with(", WriteTransferCount FROM Win32_Process WHERE ProcessId = 812"));
}

// ─── Performance counters ─────────────────────────────────────────────────────

#[test]
fn processor_counters_from_strings() {
    let source: MemoryRowSource = vec![processor("0", 9_000_000), processor("_Total", 18_000_000)]
        .into_iter()
        .collect();
    let mut dst: Vec<Win32PerfRawDataPerfOsProcessor> = Vec::new();
    decode::<Win32PerfRawDataPerfOsProcessor>(&source, &mut dst).unwrap();

    assert_eq!(dst[1].name, "_Total");
    assert_eq!(dst[1].percent_idle_time, 18_000_000);
    assert_eq!(dst[0].timestamp_sys100_ns, 133_487_174_125_310_000);
    assert_eq!(dst[0].caption.as_deref(), Some(""));
}

#[test]
fn partial_interface_rows_are_still_loaded() {
    let source: MemoryRowSource = vec![
        MemoryRow::new()
            .with("Name", "Intel[R] Ethernet Connection")
            .with("BytesTotalPerSec", Value::String("889123".into()))
            .with("CurrentBandwidth", 1_000_000_000u32),
        MemoryRow::new()
            .with("Name", "Loopback")
            .with("BytesTotalPerSec", Value::String("12".into()))
            .with("CurrentBandwidth", Value::Boolean(true)),
    ]
    .into_iter()
    .collect();

    let mut dst: Vec<Win32PerfRawDataTcpipNetworkInterface> = Vec::new();
    let err = Loader::new()
        .mode(MismatchMode::Collect)
        .load::<Win32PerfRawDataTcpipNetworkInterface>(&source, &mut dst)
        .unwrap_err();

    assert_eq!(dst.len(), 2);
    assert_eq!(dst[0].current_bandwidth, 1_000_000_000);
    assert_eq!(dst[1].bytes_total_per_sec, 12);

    let QueryError::FieldMismatches(all) = err else {
        panic!("expected collected mismatches, got {err:?}");
    };
    // 23 absent properties per row plus one boolean bandwidth.
    assert_eq!(all.len(), 47);
    assert!(all.iter().any(|m| m.field == "CurrentBandwidth"
        && m.reason == MismatchReason::NotBoolean));
    assert!(all
        .iter()
        .all(|m| m.record == "Win32_PerfRawData_Tcpip_NetworkInterface"));
}
