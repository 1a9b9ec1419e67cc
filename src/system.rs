use sysinfo::System;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Memory and CPU report for the "system info" chat command.
///
/// CPU usage needs two refreshes a short interval apart to produce a
/// meaningful figure.
pub async fn system_report() -> String {
    let mut sys = System::new_all();
    sys.refresh_all();

    tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
    sys.refresh_cpu_usage();

    format_report(
        sys.total_memory() / BYTES_PER_MB,
        sys.used_memory() / BYTES_PER_MB,
        sys.global_cpu_usage(),
    )
}

fn format_report(total_mb: u64, used_mb: u64, cpu_percent: f32) -> String {
    format!(
        "System Info:\nTotal RAM: {total_mb} MB\nUsed RAM: {used_mb} MB\nCPU Usage: {cpu_percent:.1}%"
    )
}
