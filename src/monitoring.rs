//! Modulo per il monitoraggio del processo server
//!
//! Campiona a intervalli regolari l'utilizzo di CPU e memoria del processo
//! corrente (tramite `sysinfo`) insieme al numero di utenti connessi via
//! WebSocket e di stanze con un canale attivo, e logga il risultato con `tracing`.

use crate::AppState;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::time;
use tracing::{info, warn};

/// Configurazione del monitor
#[derive(Debug, Clone)]
pub struct ProcessMonitorConfig {
    /// Intervallo di logging in secondi
    pub interval_secs: u64,
}

impl Default for ProcessMonitorConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

/// Statistiche raccolte in un dato momento
#[derive(Debug, Clone)]
pub struct ProcessStats {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Percentuale di utilizzo CPU dall'ultimo campione
    pub cpu_percentage: f32,
    /// Memoria usata dal processo in MB
    pub memory_usage_mb: f64,
    pub online_users: usize,
    pub live_rooms: usize,
}

impl ProcessStats {
    /// Formatta le statistiche come stringa per il logging
    pub fn format_for_log(&self) -> String {
        format!(
            "[{}] CPU: {:.2}% | Memory: {:.2} MB | Online users: {} | Live rooms: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.cpu_percentage,
            self.memory_usage_mb,
            self.online_users,
            self.live_rooms
        )
    }
}

/// Task di monitoraggio che gira in background finché il processo è vivo
///
/// ```rust,no_run
/// # use quizwhiz::monitoring::{start_process_monitoring, ProcessMonitorConfig};
/// # async fn run(state: std::sync::Arc<quizwhiz::AppState>) {
/// tokio::spawn(start_process_monitoring(state, ProcessMonitorConfig { interval_secs: 60 }));
/// # }
/// ```
pub async fn start_process_monitoring(state: Arc<AppState>, config: ProcessMonitorConfig) {
    if config.interval_secs == 0 {
        warn!("Process monitor interval is zero, monitor not started");
        return;
    }
    info!("Starting process monitoring with interval: {} seconds", config.interval_secs);

    let mut sys = System::new();
    let current_pid = Pid::from_u32(std::process::id());
    info!("Monitoring process with PID: {}", current_pid);

    // il primo refresh serve solo da base per il calcolo della CPU
    sys.refresh_processes(ProcessesToUpdate::Some(&[current_pid]), true);

    let mut interval = time::interval(Duration::from_secs(config.interval_secs));
    // Salta il primo tick che avviene immediatamente
    interval.tick().await;

    loop {
        interval.tick().await;
        sys.refresh_processes(ProcessesToUpdate::Some(&[current_pid]), true);

        let Some(process) = sys.process(current_pid) else {
            warn!("Current process not found by sysinfo");
            continue;
        };

        let stats = ProcessStats {
            timestamp: chrono::Utc::now(),
            cpu_percentage: process.cpu_usage(),
            memory_usage_mb: process.memory() as f64 / (1024.0 * 1024.0),
            online_users: state.users_online.online_count(),
            live_rooms: state.rooms_online.live_count(),
        };
        info!("{}", stats.format_for_log());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_stats_format() {
        let stats = ProcessStats {
            timestamp: chrono::Utc::now(),
            cpu_percentage: 2.05,
            memory_usage_mb: 256.78,
            online_users: 3,
            live_rooms: 1,
        };

        let formatted = stats.format_for_log();
        assert!(formatted.contains("2.05%"));
        assert!(formatted.contains("256.78 MB"));
        assert!(formatted.contains("Online users: 3"));
        assert!(formatted.contains("Live rooms: 1"));
    }

    #[test]
    fn test_default_config() {
        let config = ProcessMonitorConfig::default();
        assert_eq!(config.interval_secs, 60);
    }
}
