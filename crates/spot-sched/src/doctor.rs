use anyhow::Result;

use crate::ScheduleConfig;

pub fn check_schedule(cfg: &ScheduleConfig) -> Result<()> {
    anyhow::ensure!(cfg.process_every_n_frames >= 1, "schedule.process_every_n_frames must be >= 1");
    anyhow::ensure!(cfg.history_capacity <= 120, "schedule.history_capacity unreasonably large");
    anyhow::ensure!(cfg.failure_grace_ticks <= 1, "schedule.failure_grace_ticks must be 0 or 1");
    anyhow::ensure!(cfg.refresh_ms >= 1 && cfg.refresh_ms <= 1000, "schedule.refresh_ms should be 1..1000");
    Ok(())
}
