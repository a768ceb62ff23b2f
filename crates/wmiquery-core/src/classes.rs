//! Well-known management classes.
//!
//! Optional fields are the properties providers commonly report as null
//! (dates that never happened, paths of protected processes, ...).

use crate::wmi_record;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

wmi_record! {
    /// A running process.
    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    pub struct Win32Process as "Win32_Process" {
        pub cs_creation_class_name: String = "CSCreationClassName",
        pub cs_name: String = "CSName",
        pub caption: String = "Caption",
        pub command_line: Option<String> = "CommandLine",
        pub creation_class_name: String = "CreationClassName",
        pub creation_date: Option<DateTime<FixedOffset>> = "CreationDate",
        pub description: String = "Description",
        pub executable_path: Option<String> = "ExecutablePath",
        pub execution_state: Option<u16> = "ExecutionState",
        pub handle: String = "Handle",
        pub handle_count: u32 = "HandleCount",
        pub install_date: Option<DateTime<FixedOffset>> = "InstallDate",
        pub kernel_mode_time: u64 = "KernelModeTime",
        pub maximum_working_set_size: Option<u32> = "MaximumWorkingSetSize",
        pub minimum_working_set_size: Option<u32> = "MinimumWorkingSetSize",
        pub name: String = "Name",
        pub os_creation_class_name: String = "OSCreationClassName",
        pub os_name: String = "OSName",
        pub other_operation_count: u64 = "OtherOperationCount",
        pub other_transfer_count: u64 = "OtherTransferCount",
        pub page_faults: u32 = "PageFaults",
        pub page_file_usage: u32 = "PageFileUsage",
        pub parent_process_id: u32 = "ParentProcessId",
        pub peak_page_file_usage: u32 = "PeakPageFileUsage",
        pub peak_virtual_size: u64 = "PeakVirtualSize",
        pub peak_working_set_size: u32 = "PeakWorkingSetSize",
        pub priority: u32 = "Priority",
        pub private_page_count: u64 = "PrivatePageCount",
        pub process_id: u32 = "ProcessId",
        pub quota_non_paged_pool_usage: u32 = "QuotaNonPagedPoolUsage",
        pub quota_paged_pool_usage: u32 = "QuotaPagedPoolUsage",
        pub quota_peak_non_paged_pool_usage: u32 = "QuotaPeakNonPagedPoolUsage",
        pub quota_peak_paged_pool_usage: u32 = "QuotaPeakPagedPoolUsage",
        pub read_operation_count: u64 = "ReadOperationCount",
        pub read_transfer_count: u64 = "ReadTransferCount",
        pub session_id: u32 = "SessionId",
        pub status: Option<String> = "Status",
        pub termination_date: Option<DateTime<FixedOffset>> = "TerminationDate",
        pub thread_count: u32 = "ThreadCount",
        pub user_mode_time: u64 = "UserModeTime",
        pub virtual_size: u64 = "VirtualSize",
        pub windows_version: String = "WindowsVersion",
        pub working_set_size: u64 = "WorkingSetSize",
        pub write_operation_count: u64 = "WriteOperationCount",
        pub write_transfer_count: u64 = "WriteTransferCount",
    }
}

wmi_record! {
    /// Raw per-processor performance counters.
    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    pub struct Win32PerfRawDataPerfOsProcessor as "Win32_PerfRawData_PerfOS_Processor" {
        pub c1_transitions_per_sec: u64 = "C1TransitionsPerSec",
        pub c2_transitions_per_sec: u64 = "C2TransitionsPerSec",
        pub c3_transitions_per_sec: u64 = "C3TransitionsPerSec",
        pub caption: Option<String> = "Caption",
        pub dpc_rate: u32 = "DPCRate",
        pub dpcs_queued_per_sec: u32 = "DPCsQueuedPerSec",
        pub description: Option<String> = "Description",
        pub frequency_object: u64 = "Frequency_Object",
        pub frequency_perf_time: u64 = "Frequency_PerfTime",
        pub frequency_sys100_ns: u64 = "Frequency_Sys100NS",
        pub interrupts_per_sec: u32 = "InterruptsPerSec",
        pub name: String = "Name",
        pub percent_c1_time: u64 = "PercentC1Time",
        pub percent_c2_time: u64 = "PercentC2Time",
        pub percent_c3_time: u64 = "PercentC3Time",
        pub percent_dpc_time: u64 = "PercentDPCTime",
        pub percent_idle_time: u64 = "PercentIdleTime",
        pub percent_interrupt_time: u64 = "PercentInterruptTime",
        pub percent_privileged_time: u64 = "PercentPrivilegedTime",
        pub percent_processor_time: u64 = "PercentProcessorTime",
        pub percent_user_time: u64 = "PercentUserTime",
        pub timestamp_object: u64 = "Timestamp_Object",
        pub timestamp_perf_time: u64 = "Timestamp_PerfTime",
        pub timestamp_sys100_ns: u64 = "Timestamp_Sys100NS",
    }
}

wmi_record! {
    /// Raw per-interface TCP/IP performance counters.
    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    pub struct Win32PerfRawDataTcpipNetworkInterface as "Win32_PerfRawData_Tcpip_NetworkInterface" {
        pub bytes_received_per_sec: u32 = "BytesReceivedPerSec",
        pub bytes_sent_per_sec: u32 = "BytesSentPerSec",
        pub bytes_total_per_sec: u64 = "BytesTotalPerSec",
        pub caption: Option<String> = "Caption",
        pub current_bandwidth: u32 = "CurrentBandwidth",
        pub description: Option<String> = "Description",
        pub frequency_object: u64 = "Frequency_Object",
        pub frequency_perf_time: u64 = "Frequency_PerfTime",
        pub frequency_sys100_ns: u64 = "Frequency_Sys100NS",
        pub name: String = "Name",
        pub output_queue_length: u32 = "OutputQueueLength",
        pub packets_outbound_discarded: u32 = "PacketsOutboundDiscarded",
        pub packets_outbound_errors: u32 = "PacketsOutboundErrors",
        pub packets_per_sec: u32 = "PacketsPerSec",
        pub packets_received_discarded: u32 = "PacketsReceivedDiscarded",
        pub packets_received_errors: u32 = "PacketsReceivedErrors",
        pub packets_received_non_unicast_per_sec: u32 = "PacketsReceivedNonUnicastPerSec",
        pub packets_received_per_sec: u32 = "PacketsReceivedPerSec",
        pub packets_received_unicast_per_sec: u32 = "PacketsReceivedUnicastPerSec",
        pub packets_received_unknown: u32 = "PacketsReceivedUnknown",
        pub packets_sent_non_unicast_per_sec: u32 = "PacketsSentNonUnicastPerSec",
        pub packets_sent_per_sec: u32 = "PacketsSentPerSec",
        pub packets_sent_unicast_per_sec: u32 = "PacketsSentUnicastPerSec",
        pub timestamp_object: u64 = "Timestamp_Object",
        pub timestamp_perf_time: u64 = "Timestamp_PerfTime",
        pub timestamp_sys100_ns: u64 = "Timestamp_Sys100NS",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    #[test]
    fn property_names_survive_the_rename() {
        let layout = Win32Process::layout();
        assert_eq!(layout.name(), "Win32_Process");
        assert_eq!(layout.fields().len(), 45);
        assert!(layout.field("CSCreationClassName").is_some());
        assert!(layout.field("QuotaPeakNonPagedPoolUsage").is_some());
        assert!(layout.field("TerminationDate").unwrap().optional);

        let cpu = Win32PerfRawDataPerfOsProcessor::layout();
        assert_eq!(cpu.fields().len(), 24);
        assert!(cpu.field("Frequency_Sys100NS").is_some());

        let net = Win32PerfRawDataTcpipNetworkInterface::layout();
        assert_eq!(net.fields().len(), 26);
        assert_eq!(net.fields()[0].name, "BytesReceivedPerSec");
    }
}
